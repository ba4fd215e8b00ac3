//! Foreign object references and ownership
//!
//! The bridge never owns runtime objects; it is a borrower or new-reference
//! producer per call. [`ObjectRef`] records which of the two it was handed,
//! and releases the single reference-count contribution it is responsible
//! for exactly once.

use core::fmt;
use core::ptr::NonNull;

use crate::symbols::SymbolTable;

/// Opaque handle into the foreign runtime's managed heap
#[repr(C)]
pub struct PyObject {
    _private: [u8; 0],
}

/// Guard over a foreign object reference
///
/// `owned` guards hold a new reference per the runtime's ownership
/// convention and call the decrement entry point on drop; `borrowed` guards
/// never touch the reference count. Lifetime of the underlying object is
/// owned by the runtime's count, not by this guard.
pub struct ObjectRef<'t> {
    table: &'t SymbolTable,
    ptr: NonNull<PyObject>,
    owned: bool,
}

impl<'t> ObjectRef<'t> {
    /// Wrap a new reference; the guard becomes responsible for one decrement
    ///
    /// # Safety
    /// `raw` must be a new reference just produced by the runtime (or null).
    pub unsafe fn owned(table: &'t SymbolTable, raw: *mut PyObject) -> Option<Self> {
        NonNull::new(raw).map(|ptr| Self {
            table,
            ptr,
            owned: true,
        })
    }

    /// Wrap a borrowed reference; the guard never adjusts the count
    ///
    /// # Safety
    /// `raw` must stay valid for the guard's lifetime (or be null).
    pub unsafe fn borrowed(table: &'t SymbolTable, raw: *mut PyObject) -> Option<Self> {
        NonNull::new(raw).map(|ptr| Self {
            table,
            ptr,
            owned: false,
        })
    }

    /// Raw pointer, for handing back to the runtime
    #[inline]
    pub fn as_ptr(&self) -> *mut PyObject {
        self.ptr.as_ptr()
    }

    /// Whether this guard holds a decrement obligation
    #[inline]
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Release ownership without decrementing
    ///
    /// The caller takes over the reference-count contribution, if any.
    pub fn into_raw(self) -> *mut PyObject {
        let ptr = self.ptr.as_ptr();
        core::mem::forget(self);
        ptr
    }

    /// Produce an independent owned guard by incrementing the count
    pub fn clone_ref(&self) -> ObjectRef<'t> {
        // Only take on a decrement obligation if the increment happened.
        let owned = match self.table.incref {
            Some(incref) => {
                unsafe { incref(self.ptr.as_ptr()) };
                true
            }
            None => false,
        };
        ObjectRef {
            table: self.table,
            ptr: self.ptr,
            owned,
        }
    }
}

impl Drop for ObjectRef<'_> {
    fn drop(&mut self) {
        if self.owned {
            if let Some(decref) = self.table.decref {
                unsafe { decref(self.ptr.as_ptr()) };
            }
        }
    }
}

impl fmt::Debug for ObjectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("ptr", &self.ptr)
            .field("owned", &self.owned)
            .finish()
    }
}
