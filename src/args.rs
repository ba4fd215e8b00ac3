//! Argument parsing - foreign argument bundles to native values
//!
//! An incoming call's argument bundle is extracted through the runtime's
//! single variadic parse entry point. Each target shape carries its fixed
//! format string; the codes are the runtime's own protocol and must be
//! preserved byte-for-byte since its parser depends on them positionally.

use core::ptr;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_long};

use crate::object::{ObjectRef, PyObject};
use crate::symbols::{required, SymbolTable};

/// Target shape of an argument bundle
///
/// Closed set: the runtime's format-code mini-language is not user-extensible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgShape {
    Str,
    Double,
    Long,
    Object,
    ObjectPair,
    ObjectTriple,
}

impl ArgShape {
    /// NUL-terminated format string handed to the parse entry point
    pub const fn format(self) -> &'static [u8] {
        match self {
            Self::Str => b"s\0",
            Self::Double => b"d\0",
            Self::Long => b"l\0",
            Self::Object => b"O\0",
            Self::ObjectPair => b"OO\0",
            Self::ObjectTriple => b"OOO\0",
        }
    }

    /// Format code without the terminator, for diagnostics
    pub const fn code(self) -> &'static str {
        match self {
            Self::Str => "s",
            Self::Double => "d",
            Self::Long => "l",
            Self::Object => "O",
            Self::ObjectPair => "OO",
            Self::ObjectTriple => "OOO",
        }
    }
}

/// Extracted native values, one variant per [`ArgShape`]
///
/// Object references are borrowed from the argument bundle: the runtime owns
/// them for the duration of the call.
#[derive(Debug)]
pub enum ArgValues<'t> {
    Str(String),
    Double(f64),
    Long(c_long),
    Object(ObjectRef<'t>),
    ObjectPair(ObjectRef<'t>, ObjectRef<'t>),
    ObjectTriple(ObjectRef<'t>, ObjectRef<'t>, ObjectRef<'t>),
}

/// Result of a parse call
///
/// `status` is the runtime's own status code, propagated verbatim (nonzero
/// means success by its convention; callers must not reinterpret it).
/// `values` is `Some` only on success; on failure the out-slots are never
/// read.
#[derive(Debug)]
pub struct ParseOutcome<'t> {
    pub status: c_int,
    pub values: Option<ArgValues<'t>>,
}

impl<'t> ParseOutcome<'t> {
    /// Success per the runtime's nonzero convention
    #[inline]
    pub fn ok(&self) -> bool {
        self.status != 0
    }

    pub fn into_values(self) -> Option<ArgValues<'t>> {
        self.values
    }
}

/// Extract `shape` from an argument bundle
///
/// Shape mismatch is reported through `status`, not as a native error.
///
/// # Safety
/// `bundle` must be a valid argument tuple handed in by the runtime.
pub unsafe fn parse<'t>(
    table: &'t SymbolTable,
    bundle: *mut PyObject,
    shape: ArgShape,
) -> ParseOutcome<'t> {
    let parse_tuple = required(table.parse_tuple, "PyArg_ParseTuple");
    let fmt = shape.format().as_ptr().cast::<c_char>();

    match shape {
        ArgShape::Str => {
            let mut out: *const c_char = ptr::null();
            let status = parse_tuple(bundle, fmt, &mut out as *mut *const c_char);
            let values = if status != 0 {
                Some(ArgValues::Str(copy_utf8(out)))
            } else {
                None
            };
            ParseOutcome { status, values }
        }
        ArgShape::Double => {
            let mut out: f64 = 0.0;
            let status = parse_tuple(bundle, fmt, &mut out as *mut f64);
            let values = (status != 0).then(|| ArgValues::Double(out));
            ParseOutcome { status, values }
        }
        ArgShape::Long => {
            let mut out: c_long = 0;
            let status = parse_tuple(bundle, fmt, &mut out as *mut c_long);
            let values = (status != 0).then(|| ArgValues::Long(out));
            ParseOutcome { status, values }
        }
        ArgShape::Object => {
            let mut out: *mut PyObject = ptr::null_mut();
            let status = parse_tuple(bundle, fmt, &mut out as *mut *mut PyObject);
            let values = if status != 0 {
                ObjectRef::borrowed(table, out).map(ArgValues::Object)
            } else {
                None
            };
            ParseOutcome { status, values }
        }
        ArgShape::ObjectPair => {
            let mut a: *mut PyObject = ptr::null_mut();
            let mut b: *mut PyObject = ptr::null_mut();
            let status = parse_tuple(
                bundle,
                fmt,
                &mut a as *mut *mut PyObject,
                &mut b as *mut *mut PyObject,
            );
            let values = if status != 0 {
                match (ObjectRef::borrowed(table, a), ObjectRef::borrowed(table, b)) {
                    (Some(a), Some(b)) => Some(ArgValues::ObjectPair(a, b)),
                    _ => None,
                }
            } else {
                None
            };
            ParseOutcome { status, values }
        }
        ArgShape::ObjectTriple => {
            let mut a: *mut PyObject = ptr::null_mut();
            let mut b: *mut PyObject = ptr::null_mut();
            let mut c: *mut PyObject = ptr::null_mut();
            let status = parse_tuple(
                bundle,
                fmt,
                &mut a as *mut *mut PyObject,
                &mut b as *mut *mut PyObject,
                &mut c as *mut *mut PyObject,
            );
            let values = if status != 0 {
                match (
                    ObjectRef::borrowed(table, a),
                    ObjectRef::borrowed(table, b),
                    ObjectRef::borrowed(table, c),
                ) {
                    (Some(a), Some(b), Some(c)) => Some(ArgValues::ObjectTriple(a, b, c)),
                    _ => None,
                }
            } else {
                None
            };
            ParseOutcome { status, values }
        }
    }
}

/// Copy a borrowed utf8 buffer out of the bundle before it can move
unsafe fn copy_utf8(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}
