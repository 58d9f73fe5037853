use std::ptr::NonNull;

use zfp_sys::{bitstream, stream_close, stream_open};

/// A zfp bitstream over an owned, word aligned buffer.
pub(super) struct ZfpBitstream {
    bitstream: NonNull<bitstream>,
    words: Vec<u64>,
}

impl Drop for ZfpBitstream {
    fn drop(&mut self) {
        unsafe {
            // SAFETY: the bitstream was opened by stream_open and is not used after this
            stream_close(self.bitstream.as_ptr());
        }
    }
}

impl ZfpBitstream {
    /// Create a zero-initialised bitstream with a capacity of at least `len` bytes.
    ///
    /// Returns [`None`] if the buffer cannot be allocated.
    pub(super) fn new(len: usize) -> Option<Self> {
        Self::from_words(zeroed_words(len)?)
    }

    /// Create a bitstream holding a copy of `bytes`, zero padded to a capacity of at least `len` bytes.
    ///
    /// zfp reads whole words, so the capacity always extends at least one word past the end of `bytes`.
    pub(super) fn from_bytes(bytes: &[u8], len: usize) -> Option<Self> {
        let len = len.max(bytes.len()).checked_add(size_of::<u64>())?;
        let mut words = zeroed_words(len)?;
        bytemuck::cast_slice_mut::<u64, u8>(&mut words)[..bytes.len()].copy_from_slice(bytes);
        Self::from_words(words)
    }

    fn from_words(mut words: Vec<u64>) -> Option<Self> {
        let bitstream = unsafe {
            // SAFETY: the buffer is word aligned, outlives the bitstream, and its heap allocation does not move
            stream_open(
                words.as_mut_ptr().cast::<std::ffi::c_void>(),
                words.len() * size_of::<u64>(),
            )
        };
        NonNull::new(bitstream).map(|bitstream| Self { bitstream, words })
    }

    pub(super) fn as_bitstream(&self) -> *mut bitstream {
        self.bitstream.as_ptr()
    }

    /// Close the bitstream and return the first `len` bytes of its buffer.
    pub(super) fn into_bytes(self, len: usize) -> Vec<u8> {
        let bytes: &[u8] = bytemuck::cast_slice(&self.words);
        bytes[..len.min(bytes.len())].to_vec()
    }
}

/// Allocate at least `len` zeroed bytes as whole words, without aborting on allocation failure.
fn zeroed_words(len: usize) -> Option<Vec<u64>> {
    let num_words = len.div_ceil(size_of::<u64>()).max(1);
    let mut words = Vec::new();
    words.try_reserve_exact(num_words).ok()?;
    words.resize(num_words, 0);
    Some(words)
}
