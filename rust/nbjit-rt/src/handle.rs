//! Opaque host-runtime handles.

use std::ffi::c_void;
use std::fmt;

/// A value owned by the host runtime, passed through without interpretation.
///
/// Layout is identical to `void *`, so a `Handle` can sit directly in
/// `extern "C"` signatures. The binding layer never dereferences, copies the
/// pointee of, or frees a handle.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(*mut c_void);

// SAFETY: a handle is an address the host gave us; this crate never reads
// through it, so moving it between threads cannot race on the pointee.
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

impl Handle {
    pub const NULL: Handle = Handle(std::ptr::null_mut());

    pub const fn from_raw(ptr: *mut c_void) -> Self {
        Handle(ptr)
    }

    /// Build a handle from a plain address. Used by hosts and tests that mint
    /// handles as integers.
    pub fn from_addr(addr: usize) -> Self {
        Handle(addr as *mut c_void)
    }

    pub const fn as_ptr(self) -> *mut c_void {
        self.0
    }

    pub fn addr(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for Handle {
    fn default() -> Self {
        Handle::NULL
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.addr())
    }
}
