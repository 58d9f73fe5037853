use std::{ffi::c_void, ptr::NonNull};

use zfp_sys::{
    zfp_field, zfp_field_1d, zfp_field_2d, zfp_field_3d, zfp_field_4d, zfp_field_alloc,
    zfp_field_dimensionality, zfp_field_free, zfp_field_set_pointer, zfp_field_size,
    zfp_field_type, zfp_type,
};

/// A zfp field.
///
/// zfp orders dimensions from fastest to slowest varying, the reverse of a row-major shape.
pub(super) struct ZfpField(NonNull<zfp_field>);

impl Drop for ZfpField {
    fn drop(&mut self) {
        unsafe {
            // SAFETY: the field was allocated by zfp and is not used after this
            zfp_field_free(self.0.as_ptr());
        }
    }
}

impl ZfpField {
    /// Create a field describing a row-major array with `shape`.
    ///
    /// # Safety
    /// `pointer` must be null or point to a contiguous array of `shape` elements of `zfp_type` that outlives any use of the field by zfp.
    pub(super) unsafe fn new(
        pointer: *mut c_void,
        zfp_type: zfp_type,
        shape: &[usize],
    ) -> Option<Self> {
        let field = unsafe {
            // SAFETY: guaranteed by the caller
            match *shape {
                [nx] => zfp_field_1d(pointer, zfp_type, nx),
                [ny, nx] => zfp_field_2d(pointer, zfp_type, nx, ny),
                [nz, ny, nx] => zfp_field_3d(pointer, zfp_type, nx, ny, nz),
                [nw, nz, ny, nx] => zfp_field_4d(pointer, zfp_type, nx, ny, nz, nw),
                _ => std::ptr::null_mut(),
            }
        };
        NonNull::new(field).map(Self)
    }

    /// Create a field without a type, shape, or data, to be filled by reading a zfp header.
    pub(super) fn alloc() -> Option<Self> {
        let field = unsafe {
            // SAFETY: no preconditions
            zfp_field_alloc()
        };
        NonNull::new(field).map(Self)
    }

    /// Set the array the field reads from or writes to.
    ///
    /// # Safety
    /// `pointer` must point to a contiguous array matching the type and shape of the field that outlives any use of the field by zfp.
    pub(super) unsafe fn set_pointer(&mut self, pointer: *mut c_void) {
        unsafe {
            // SAFETY: guaranteed by the caller
            zfp_field_set_pointer(self.0.as_ptr(), pointer);
        }
    }

    pub(super) fn zfp_type(&self) -> zfp_type {
        unsafe {
            // SAFETY: the field is valid
            zfp_field_type(self.0.as_ptr())
        }
    }

    /// Returns the row-major shape of the field.
    pub(super) fn shape(&self) -> Vec<usize> {
        let mut size = [0usize; 4];
        let dimensionality = unsafe {
            // SAFETY: the field is valid and size holds the maximum of 4 dimensions
            zfp_field_size(self.0.as_ptr(), size.as_mut_ptr());
            zfp_field_dimensionality(self.0.as_ptr())
        };
        let dimensionality = usize::try_from(dimensionality).unwrap_or_default().min(4);
        size[..dimensionality].iter().rev().copied().collect()
    }

    pub(super) fn as_zfp_field(&self) -> *mut zfp_field {
        self.0.as_ptr()
    }
}
