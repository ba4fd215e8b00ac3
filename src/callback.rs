//! Host-defined native callbacks
//!
//! Lets a native function be invoked as a function of the foreign runtime:
//! the runtime hands the callback its argument bundle, the body reads it
//! through [`crate::args::parse`] and answers through [`crate::value::wrap`].
//! Bodies reach the resolved table via [`crate::symbols::table`], since the
//! runtime passes no context of ours.

use core::ptr;
use std::os::raw::{c_char, c_int};

use crate::object::{ObjectRef, PyObject};
use crate::symbols::{required, SymbolTable};

/// Callback receives tuple-packed positional arguments
pub const METH_VARARGS: c_int = 0x0001;

/// Native callback signature: (self-or-data, argument bundle) -> new reference
pub type PyCFunction =
    unsafe extern "C" fn(*mut PyObject, *mut PyObject) -> *mut PyObject;

/// Mirror of the runtime's method descriptor
///
/// The runtime keeps the pointer it is given, so descriptors must live in a
/// `static`.
#[repr(C)]
pub struct PyMethodDef {
    pub ml_name: *const c_char,
    pub ml_meth: Option<PyCFunction>,
    pub ml_flags: c_int,
    pub ml_doc: *const c_char,
}

// Descriptors are immutable shared data once constructed.
unsafe impl Sync for PyMethodDef {}

impl PyMethodDef {
    /// Descriptor for a positional-arguments callback
    ///
    /// `name` must be NUL-terminated.
    pub const fn varargs(name: &'static [u8], meth: PyCFunction) -> Self {
        Self {
            ml_name: name.as_ptr().cast(),
            ml_meth: Some(meth),
            ml_flags: METH_VARARGS,
            ml_doc: ptr::null(),
        }
    }
}

/// Build a callable runtime object around a native callback
///
/// `data` is passed back to the callback as its first argument on every
/// invocation. The result is a new reference.
pub fn new_function<'t>(
    table: &'t SymbolTable,
    def: &'static PyMethodDef,
    data: Option<&ObjectRef<'_>>,
) -> Option<ObjectRef<'t>> {
    let new_fn = required(table.cfunction_new, "PyCFunction_NewEx");
    let data_ptr = data.map_or(ptr::null_mut(), |d| d.as_ptr());
    unsafe {
        ObjectRef::owned(
            table,
            new_fn(
                def as *const PyMethodDef as *mut PyMethodDef,
                data_ptr,
                ptr::null_mut(),
            ),
        )
    }
}
