//! Value wrapping - native values to new foreign object references
//!
//! Delegates to the runtime's variadic build entry point with the
//! one-character format code matching the input's native kind; booleans go
//! through the dedicated boolean constructor. Every returned reference is a
//! new reference: the caller's guard owns the decrement.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_long};
use tracing::error;

use crate::object::{ObjectRef, PyObject};
use crate::symbols::{required, SymbolTable};

/// Native value kinds the runtime can wrap
///
/// `Object` is a passthrough: the build call produces a fresh reference to
/// the same object. `Bool` is built from long truthiness via the boolean
/// constructor rather than a format code.
#[derive(Debug, Clone, Copy)]
pub enum NativeValue<'a> {
    Long(c_long),
    Double(f64),
    Str(&'a str),
    Object(*mut PyObject),
    Bool(bool),
}

impl NativeValue<'_> {
    /// NUL-terminated format code, `None` for the boolean constructor path
    pub const fn format(&self) -> Option<&'static [u8]> {
        match self {
            Self::Long(_) => Some(b"l\0"),
            Self::Double(_) => Some(b"d\0"),
            Self::Str(_) => Some(b"s\0"),
            Self::Object(_) => Some(b"O\0"),
            Self::Bool(_) => None,
        }
    }
}

/// Build a new foreign object reference from a native value
///
/// Returns `None` if the runtime failed to build the value (error state
/// pending) or if a string input contains an interior NUL.
pub fn wrap<'t>(table: &'t SymbolTable, value: NativeValue<'_>) -> Option<ObjectRef<'t>> {
    unsafe {
        match value {
            NativeValue::Long(v) => {
                let build = required(table.build_value, "Py_BuildValue");
                ObjectRef::owned(table, build(b"l\0".as_ptr().cast::<c_char>(), v))
            }
            NativeValue::Double(v) => {
                let build = required(table.build_value, "Py_BuildValue");
                ObjectRef::owned(table, build(b"d\0".as_ptr().cast::<c_char>(), v))
            }
            NativeValue::Str(s) => {
                let build = required(table.build_value, "Py_BuildValue");
                let cstr = CString::new(s).ok()?;
                ObjectRef::owned(table, build(b"s\0".as_ptr().cast::<c_char>(), cstr.as_ptr()))
            }
            NativeValue::Object(obj) => {
                let build = required(table.build_value, "Py_BuildValue");
                ObjectRef::owned(table, build(b"O\0".as_ptr().cast::<c_char>(), obj))
            }
            NativeValue::Bool(v) => {
                let from_long = required(table.bool_from_long, "PyBool_FromLong");
                ObjectRef::owned(table, from_long(v as c_long))
            }
        }
    }
}

/// Copy the utf8 contents of a runtime string object
///
/// # Safety
/// `obj` must be a valid reference to a runtime string object.
pub unsafe fn str_from_object(table: &SymbolTable, obj: *mut PyObject) -> Option<String> {
    let as_utf8 = required(table.unicode_as_utf8, "PyUnicode_AsUTF8");
    let ptr = as_utf8(obj);
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Build a runtime string object from native text
///
/// Runtimes too old to expose the string constructor cannot support this
/// bridge's callback machinery at all: that is reported as a diagnostic and
/// the process terminates (deliberate fail-fast for unsupported versions).
pub fn string_object<'t>(table: &'t SymbolTable, value: &str) -> Option<ObjectRef<'t>> {
    let from_string = match table.unicode_from_string {
        Some(f) => f,
        None => {
            error!("string construction is not available in this runtime version");
            eprintln!("string construction is not available in this runtime version");
            std::process::exit(1);
        }
    };
    let cstr = CString::new(value).ok()?;
    unsafe { ObjectRef::owned(table, from_string(cstr.as_ptr())) }
}
