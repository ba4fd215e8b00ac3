//! Entry-point resolution - the bridge's typed function table
//!
//! One slot per foreign entry point, resolved by name exactly once and
//! treated as immutable read-only state afterwards. Each slot's native
//! signature reproduces the runtime's documented C ABI bit-for-bit; there is
//! no compile-time check against the real library, so the signatures here are
//! the wire-level contract.

use core::ffi::c_void;
use once_cell::sync::OnceCell;
use std::os::raw::{c_char, c_int, c_long};
use tracing::debug;

use crate::callback::PyMethodDef;
use crate::library::Library;
use crate::object::PyObject;

/// Variadic argument extraction (`PyArg_ParseTuple`)
pub type ParseTupleFn =
    unsafe extern "C" fn(*mut PyObject, *const c_char, ...) -> c_int;

/// Variadic value construction (`Py_BuildValue`)
pub type BuildValueFn = unsafe extern "C" fn(*const c_char, ...) -> *mut PyObject;

/// Resolved entry points of the foreign runtime
///
/// A slot is either `None` (the symbol was absent from the library) or a
/// pointer matching the declared signature. Invoking a `None` slot that
/// [`SymbolTable::validate`] guards is a programming error and panics with
/// the symbol name.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SymbolTable {
    pub parse_tuple: Option<ParseTupleFn>,
    pub build_value: Option<BuildValueFn>,
    pub bool_from_long: Option<unsafe extern "C" fn(c_long) -> *mut PyObject>,
    pub unicode_as_utf8: Option<unsafe extern "C" fn(*mut PyObject) -> *const c_char>,
    pub unicode_from_string: Option<unsafe extern "C" fn(*const c_char) -> *mut PyObject>,
    pub cfunction_new:
        Option<unsafe extern "C" fn(*mut PyMethodDef, *mut PyObject, *mut PyObject) -> *mut PyObject>,
    pub run_string:
        Option<unsafe extern "C" fn(*const c_char, c_int, *mut PyObject, *mut PyObject) -> *mut PyObject>,
    pub run_simple_string: Option<unsafe extern "C" fn(*const c_char) -> c_int>,
    /// First argument is the C stream (`FILE *`) the statement is read from.
    pub run_interactive_one: Option<unsafe extern "C" fn(*mut c_void, *const c_char) -> c_int>,
    pub compile_string:
        Option<unsafe extern "C" fn(*const c_char, *const c_char, c_int) -> *mut PyObject>,
    pub dict_get_item_string:
        Option<unsafe extern "C" fn(*mut PyObject, *const c_char) -> *mut PyObject>,
    pub dict_set_item_string:
        Option<unsafe extern "C" fn(*mut PyObject, *const c_char, *mut PyObject) -> c_int>,
    pub eval_get_builtins: Option<unsafe extern "C" fn() -> *mut PyObject>,
    pub eval_get_globals: Option<unsafe extern "C" fn() -> *mut PyObject>,
    pub import_add_module: Option<unsafe extern "C" fn(*const c_char) -> *mut PyObject>,
    pub import_get_module: Option<unsafe extern "C" fn(*mut PyObject) -> *mut PyObject>,
    pub module_get_dict: Option<unsafe extern "C" fn(*mut PyObject) -> *mut PyObject>,
    pub object_get_attr_string:
        Option<unsafe extern "C" fn(*mut PyObject, *const c_char) -> *mut PyObject>,
    pub object_set_attr_string:
        Option<unsafe extern "C" fn(*mut PyObject, *const c_char, *mut PyObject) -> c_int>,
    pub err_print: Option<unsafe extern "C" fn()>,
    pub err_clear: Option<unsafe extern "C" fn()>,
    pub err_occurred: Option<unsafe extern "C" fn() -> *mut PyObject>,
    pub incref: Option<unsafe extern "C" fn(*mut PyObject)>,
    pub decref: Option<unsafe extern "C" fn(*mut PyObject)>,
}

impl SymbolTable {
    /// Resolve every slot through `lookup`
    ///
    /// Resolution is pure: the same lookup always yields the same table, and
    /// a name the lookup cannot satisfy leaves exactly its slot `None`.
    pub fn resolve_with<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<*const ()>,
    {
        let mut sym = |name: &'static str| {
            let ptr = lookup(name);
            if ptr.is_none() {
                debug!(symbol = name, "entry point not found in library");
            }
            ptr
        };

        // Each transmute reinterprets the raw address as the slot's declared
        // signature; *const () and C function pointers share representation.
        unsafe {
            Self {
                parse_tuple: sym("PyArg_ParseTuple").map(|p| core::mem::transmute(p)),
                build_value: sym("Py_BuildValue").map(|p| core::mem::transmute(p)),
                bool_from_long: sym("PyBool_FromLong").map(|p| core::mem::transmute(p)),
                unicode_as_utf8: sym("PyUnicode_AsUTF8").map(|p| core::mem::transmute(p)),
                unicode_from_string: sym("PyUnicode_FromString").map(|p| core::mem::transmute(p)),
                cfunction_new: sym("PyCFunction_NewEx").map(|p| core::mem::transmute(p)),
                run_string: sym("PyRun_String").map(|p| core::mem::transmute(p)),
                run_simple_string: sym("PyRun_SimpleString").map(|p| core::mem::transmute(p)),
                run_interactive_one: sym("PyRun_InteractiveOne").map(|p| core::mem::transmute(p)),
                compile_string: sym("Py_CompileString").map(|p| core::mem::transmute(p)),
                dict_get_item_string: sym("PyDict_GetItemString").map(|p| core::mem::transmute(p)),
                dict_set_item_string: sym("PyDict_SetItemString").map(|p| core::mem::transmute(p)),
                eval_get_builtins: sym("PyEval_GetBuiltins").map(|p| core::mem::transmute(p)),
                eval_get_globals: sym("PyEval_GetGlobals").map(|p| core::mem::transmute(p)),
                import_add_module: sym("PyImport_AddModule").map(|p| core::mem::transmute(p)),
                import_get_module: sym("PyImport_GetModule").map(|p| core::mem::transmute(p)),
                module_get_dict: sym("PyModule_GetDict").map(|p| core::mem::transmute(p)),
                object_get_attr_string: sym("PyObject_GetAttrString")
                    .map(|p| core::mem::transmute(p)),
                object_set_attr_string: sym("PyObject_SetAttrString")
                    .map(|p| core::mem::transmute(p)),
                err_print: sym("PyErr_Print").map(|p| core::mem::transmute(p)),
                err_clear: sym("PyErr_Clear").map(|p| core::mem::transmute(p)),
                err_occurred: sym("PyErr_Occurred").map(|p| core::mem::transmute(p)),
                incref: sym("Py_IncRef").map(|p| core::mem::transmute(p)),
                decref: sym("Py_DecRef").map(|p| core::mem::transmute(p)),
            }
        }
    }

    /// Resolve every slot against a loaded library
    pub fn from_library(library: &Library) -> Self {
        Self::resolve_with(|name| library.symbol(name).ok())
    }

    /// Names of required entry points that did not resolve
    ///
    /// `PyUnicode_FromString` (absent on legacy runtimes) and
    /// `PyImport_GetModule` (added in newer runtimes) are version-dependent
    /// and deliberately not required; their absence is handled at use.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let mut check = |absent: bool, name: &'static str| {
            if absent {
                missing.push(name);
            }
        };

        check(self.parse_tuple.is_none(), "PyArg_ParseTuple");
        check(self.build_value.is_none(), "Py_BuildValue");
        check(self.bool_from_long.is_none(), "PyBool_FromLong");
        check(self.unicode_as_utf8.is_none(), "PyUnicode_AsUTF8");
        check(self.cfunction_new.is_none(), "PyCFunction_NewEx");
        check(self.run_string.is_none(), "PyRun_String");
        check(self.run_simple_string.is_none(), "PyRun_SimpleString");
        check(self.run_interactive_one.is_none(), "PyRun_InteractiveOne");
        check(self.compile_string.is_none(), "Py_CompileString");
        check(self.dict_get_item_string.is_none(), "PyDict_GetItemString");
        check(self.dict_set_item_string.is_none(), "PyDict_SetItemString");
        check(self.eval_get_builtins.is_none(), "PyEval_GetBuiltins");
        check(self.eval_get_globals.is_none(), "PyEval_GetGlobals");
        check(self.import_add_module.is_none(), "PyImport_AddModule");
        check(self.module_get_dict.is_none(), "PyModule_GetDict");
        check(self.object_get_attr_string.is_none(), "PyObject_GetAttrString");
        check(self.object_set_attr_string.is_none(), "PyObject_SetAttrString");
        check(self.err_print.is_none(), "PyErr_Print");
        check(self.err_clear.is_none(), "PyErr_Clear");
        check(self.err_occurred.is_none(), "PyErr_Occurred");
        check(self.incref.is_none(), "Py_IncRef");
        check(self.decref.is_none(), "Py_DecRef");

        missing
    }

    /// Fail initialization if any required entry point is unresolved
    pub fn validate(&self) -> Result<(), InitError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(InitError::MissingSymbols(missing))
        }
    }
}

/// Fetch a required slot, panicking with the symbol name if unresolved
///
/// Unreachable for tables that passed [`SymbolTable::validate`].
#[inline]
pub(crate) fn required<T: Copy>(slot: Option<T>, name: &'static str) -> T {
    match slot {
        Some(f) => f,
        None => panic!("foreign entry point {} was never resolved", name),
    }
}

static TABLE: OnceCell<SymbolTable> = OnceCell::new();

/// Store the process-wide symbol table
///
/// Validates first: missing required symbols abort initialization here
/// instead of deferring the failure to first use. A second call with an
/// equal table is accepted; a conflicting one is rejected.
pub fn init(table: SymbolTable) -> Result<&'static SymbolTable, InitError> {
    table.validate()?;
    let stored = TABLE.get_or_init(|| table);
    if *stored != table {
        return Err(InitError::AlreadyInitialized);
    }
    Ok(stored)
}

/// Resolve a library and store the table, keeping the handle open forever
///
/// The library handle is owned by the initializer for the process lifetime
/// and never closed.
pub fn init_from_library(library: Library) -> Result<&'static SymbolTable, InitError> {
    let table = SymbolTable::from_library(&library);
    let stored = init(table)?;
    std::mem::forget(library);
    Ok(stored)
}

/// Initialize from an opaque handle produced by the platform loader
///
/// # Safety
/// `handle` must be a live handle returned by the platform's dynamic-library
/// loader. The bridge borrows it for the process lifetime and never closes it.
pub unsafe fn init_from_raw(handle: *mut c_void) -> Result<&'static SymbolTable, InitError> {
    match Library::from_raw(handle) {
        Some(library) => init_from_library(library),
        None => Err(InitError::NullHandle),
    }
}

/// The process-wide symbol table, if initialized
///
/// Native callbacks receive no context argument from the runtime and reach
/// the table through here.
pub fn table() -> Option<&'static SymbolTable> {
    TABLE.get()
}

/// Initialization errors
#[derive(Debug, PartialEq, Eq)]
pub enum InitError {
    /// Required entry points were absent from the library
    MissingSymbols(Vec<&'static str>),
    /// A different table was already installed for this process
    AlreadyInitialized,
    /// The opaque handle passed to initialization was null
    NullHandle,
}

impl core::fmt::Display for InitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingSymbols(names) => {
                write!(f, "required entry points not found: {}", names.join(", "))
            }
            Self::AlreadyInitialized => {
                write!(f, "bridge already initialized with a different library")
            }
            Self::NullHandle => write!(f, "library handle was null"),
        }
    }
}

impl std::error::Error for InitError {}
