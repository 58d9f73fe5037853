use std::ptr::NonNull;

use zfp_sys::{
    zfp_compress, zfp_decompress, zfp_read_header, zfp_stream, zfp_stream_close,
    zfp_stream_maximum_size, zfp_stream_open, zfp_stream_rewind, zfp_stream_set_accuracy,
    zfp_stream_set_bit_stream, zfp_stream_set_precision, zfp_stream_set_rate, zfp_type,
    zfp_write_header,
};

use super::{zfp_bitstream::ZfpBitstream, zfp_field::ZfpField};
use crate::ZfpyParams;

/// A zfp compressed stream.
pub(super) struct ZfpStream(NonNull<zfp_stream>);

impl Drop for ZfpStream {
    fn drop(&mut self) {
        unsafe {
            // SAFETY: the stream was opened by zfp_stream_open and is not used after this
            zfp_stream_close(self.0.as_ptr());
        }
    }
}

impl ZfpStream {
    /// Open a stream without a compression mode, to be set by reading a zfp header.
    pub(super) fn open() -> Option<Self> {
        let stream = unsafe {
            // SAFETY: a null bitstream is permitted, it is set before use
            zfp_stream_open(std::ptr::null_mut())
        };
        NonNull::new(stream).map(Self)
    }

    /// Open a stream compressing `dims` dimensional data of `zfp_type` with `params`.
    pub(super) fn new(params: &ZfpyParams, zfp_type: zfp_type, dims: usize) -> Option<Self> {
        let stream = Self::open()?;
        let dims = u32::try_from(dims).ok()?;
        unsafe {
            // SAFETY: the stream is valid
            match *params {
                ZfpyParams::FixedAccuracy { tolerance } => {
                    zfp_stream_set_accuracy(stream.as_zfp_stream(), tolerance);
                }
                ZfpyParams::FixedRate { rate } => {
                    zfp_stream_set_rate(stream.as_zfp_stream(), rate, zfp_type, dims, 0);
                }
                ZfpyParams::FixedPrecision { precision } => {
                    zfp_stream_set_precision(stream.as_zfp_stream(), precision);
                }
            }
        }
        Some(stream)
    }

    /// Attach `bitstream` and rewind to its start.
    pub(super) fn set_bit_stream(&mut self, bitstream: &ZfpBitstream) {
        unsafe {
            // SAFETY: the stream and bitstream are valid, callers keep the bitstream alive while the stream uses it
            zfp_stream_set_bit_stream(self.as_zfp_stream(), bitstream.as_bitstream());
            zfp_stream_rewind(self.as_zfp_stream());
        }
    }

    /// Returns the maximum size in bytes of `field` compressed by this stream, including a full header.
    pub(super) fn maximum_size(&self, field: &ZfpField) -> usize {
        unsafe {
            // SAFETY: the stream and field are valid, the field data is not accessed
            zfp_stream_maximum_size(self.as_zfp_stream(), field.as_zfp_field())
        }
    }

    /// Write a full header describing `field` and the compression mode.
    ///
    /// Returns [`None`] on failure.
    pub(super) fn write_header(&mut self, field: &ZfpField) -> Option<()> {
        let bits = unsafe {
            // SAFETY: the stream, its bitstream, and field are valid
            zfp_write_header(
                self.as_zfp_stream(),
                field.as_zfp_field(),
                zfp_sys::ZFP_HEADER_FULL,
            )
        };
        (bits != 0).then_some(())
    }

    /// Read a full header into `field` and set the compression mode.
    ///
    /// Returns [`None`] on failure.
    pub(super) fn read_header(&mut self, field: &mut ZfpField) -> Option<()> {
        let bits = unsafe {
            // SAFETY: the stream, its bitstream, and field are valid
            zfp_read_header(
                self.as_zfp_stream(),
                field.as_zfp_field(),
                zfp_sys::ZFP_HEADER_FULL,
            )
        };
        (bits != 0).then_some(())
    }

    /// Compress `field`, returning the total number of bytes written to the bitstream including any header.
    ///
    /// Returns [`None`] on failure.
    ///
    /// # Safety
    /// The data pointer of `field` must be valid.
    pub(super) unsafe fn compress(&mut self, field: &ZfpField) -> Option<usize> {
        let size = unsafe {
            // SAFETY: the stream and its bitstream are valid, the field data is valid by the caller
            zfp_compress(self.as_zfp_stream(), field.as_zfp_field())
        };
        (size != 0).then_some(size)
    }

    /// Decompress into the data of `field`.
    ///
    /// Returns [`None`] on failure.
    ///
    /// # Safety
    /// The data pointer of `field` must be valid for writes.
    pub(super) unsafe fn decompress(&mut self, field: &mut ZfpField) -> Option<()> {
        let size = unsafe {
            // SAFETY: the stream and its bitstream are valid, the field data is valid by the caller
            zfp_decompress(self.as_zfp_stream(), field.as_zfp_field())
        };
        (size != 0).then_some(())
    }

    pub(super) fn as_zfp_stream(&self) -> *mut zfp_stream {
        self.0.as_ptr()
    }
}
