//! Execution bridge - running source text against the foreign runtime
//!
//! Source execution, the shared global namespace, attribute access, and
//! error-state inspection. Every operation is a synchronous pass-through to
//! exactly one resolved entry point; nothing here clears the runtime's error
//! state unless the caller asked for it.

use core::ffi::c_void;
use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use tracing::trace;

use crate::object::{ObjectRef, PyObject};
use crate::symbols::{required, SymbolTable};

const MAIN_MODULE: &[u8] = b"__main__\0";
const BUILTINS_KEY: &[u8] = b"__builtins__\0";

/// Start token for source execution, per the runtime's grammar entry points
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartMode {
    /// Single interactive statement
    Single,
    /// Module-level statement sequence
    File,
    /// Expression
    Eval,
}

impl StartMode {
    /// The runtime's start-token value
    pub const fn token(self) -> c_int {
        match self {
            Self::Single => 256,
            Self::File => 257,
            Self::Eval => 258,
        }
    }
}

/// What to do with a pending error after an execution call
///
/// Exactly one applies per call, never both.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Print the pending error to stderr (debug mode)
    Print,
    /// Discard the pending error (silent mode)
    Clear,
}

/// Execute source text against explicit namespaces
///
/// Ensures the globals namespace has a builtins binding first (injecting the
/// runtime's built-in namespace if absent), runs the text, then prints or
/// clears any pending error per `errors`. Returns the resulting reference,
/// or `None` on failure. Error state survives the call only as far as the
/// chosen disposition leaves it (on CPython, printing also consumes it).
pub fn run_code<'t>(
    table: &'t SymbolTable,
    source: &str,
    mode: StartMode,
    globals: &ObjectRef<'_>,
    locals: &ObjectRef<'_>,
    errors: ErrorDisposition,
) -> Option<ObjectRef<'t>> {
    let dict_get = required(table.dict_get_item_string, "PyDict_GetItemString");
    let dict_set = required(table.dict_set_item_string, "PyDict_SetItemString");
    let get_builtins = required(table.eval_get_builtins, "PyEval_GetBuiltins");
    let run_string = required(table.run_string, "PyRun_String");

    let c_source = CString::new(source).ok()?;
    trace!(mode = ?mode, "executing source text");

    unsafe {
        let key = BUILTINS_KEY.as_ptr().cast::<c_char>();
        if dict_get(globals.as_ptr(), key).is_null()
            && dict_set(globals.as_ptr(), key, get_builtins()) != 0
        {
            return None;
        }

        let result = run_string(
            c_source.as_ptr(),
            mode.token(),
            globals.as_ptr(),
            locals.as_ptr(),
        );

        match errors {
            ErrorDisposition::Print => print_errors(table),
            ErrorDisposition::Clear => clear_errors(table),
        }

        ObjectRef::owned(table, result)
    }
}

/// Fire-and-forget execution of top-level statements, no namespace control
///
/// Status is the runtime's own, propagated verbatim.
pub fn run_simple(table: &SymbolTable, source: &str) -> c_int {
    let run = required(table.run_simple_string, "PyRun_SimpleString");
    let c_source = match CString::new(source) {
        Ok(s) => s,
        // Interior NUL cannot reach the runtime; report its failure value.
        Err(_) => return -1,
    };
    unsafe { run(c_source.as_ptr()) }
}

/// Run one interactive statement from a C stream
pub fn run_interactive_one(table: &SymbolTable, stream: *mut c_void, filename: &str) -> c_int {
    let run = required(table.run_interactive_one, "PyRun_InteractiveOne");
    let c_name = match CString::new(filename) {
        Ok(s) => s,
        Err(_) => return -1,
    };
    unsafe { run(stream, c_name.as_ptr()) }
}

/// Compile source text into a code object
pub fn compile_source<'t>(
    table: &'t SymbolTable,
    source: &str,
    filename: &str,
    mode: StartMode,
) -> Option<ObjectRef<'t>> {
    let compile = required(table.compile_string, "Py_CompileString");
    let c_source = CString::new(source).ok()?;
    let c_name = CString::new(filename).ok()?;
    unsafe {
        ObjectRef::owned(
            table,
            compile(c_source.as_ptr(), c_name.as_ptr(), mode.token()),
        )
    }
}

/// The top-level pseudo-module, resolved by name on every access
pub fn main_module(table: &SymbolTable) -> Option<ObjectRef<'_>> {
    let add_module = required(table.import_add_module, "PyImport_AddModule");
    unsafe { ObjectRef::borrowed(table, add_module(MAIN_MODULE.as_ptr().cast::<c_char>())) }
}

/// The top-level pseudo-module's dictionary - the shared global scope
pub fn main_dict(table: &SymbolTable) -> Option<ObjectRef<'_>> {
    let get_dict = required(table.module_get_dict, "PyModule_GetDict");
    let module = main_module(table)?;
    unsafe { ObjectRef::borrowed(table, get_dict(module.as_ptr())) }
}

/// Bind `value` under `key` in the shared global scope
///
/// Status is the runtime's dictionary-set status, propagated verbatim
/// (zero means success).
pub fn set_global(table: &SymbolTable, key: &str, value: &ObjectRef<'_>) -> c_int {
    let dict_set = required(table.dict_set_item_string, "PyDict_SetItemString");
    let c_key = match CString::new(key) {
        Ok(s) => s,
        Err(_) => return -1,
    };
    let dict = match main_dict(table) {
        Some(d) => d,
        None => return -1,
    };
    unsafe { dict_set(dict.as_ptr(), c_key.as_ptr(), value.as_ptr()) }
}

/// Look up a binding in the shared global scope
pub fn get_global<'t>(table: &'t SymbolTable, key: &str) -> Option<ObjectRef<'t>> {
    let dict_get = required(table.dict_get_item_string, "PyDict_GetItemString");
    let c_key = CString::new(key).ok()?;
    let dict = main_dict(table)?;
    unsafe { ObjectRef::borrowed(table, dict_get(dict.as_ptr(), c_key.as_ptr())) }
}

/// The runtime's current execution globals, if any frame is live
pub fn execution_globals(table: &SymbolTable) -> Option<ObjectRef<'_>> {
    let get_globals = required(table.eval_get_globals, "PyEval_GetGlobals");
    unsafe { ObjectRef::borrowed(table, get_globals()) }
}

/// Fetch an already-imported module by name
///
/// Requires the module-lookup and string-constructor capabilities, which are
/// version-dependent; absent either, returns `None`.
pub fn import_module<'t>(table: &'t SymbolTable, name: &str) -> Option<ObjectRef<'t>> {
    let get_module = table.import_get_module?;
    let from_string = table.unicode_from_string?;
    let c_name = CString::new(name).ok()?;
    unsafe {
        let name_obj = ObjectRef::owned(table, from_string(c_name.as_ptr()))?;
        ObjectRef::owned(table, get_module(name_obj.as_ptr()))
    }
}

/// Get a named attribute of an arbitrary object
pub fn get_attr<'t>(
    table: &'t SymbolTable,
    obj: &ObjectRef<'_>,
    name: &str,
) -> Option<ObjectRef<'t>> {
    let get = required(table.object_get_attr_string, "PyObject_GetAttrString");
    let c_name = CString::new(name).ok()?;
    unsafe { ObjectRef::owned(table, get(obj.as_ptr(), c_name.as_ptr())) }
}

/// Set a named attribute; the runtime's zero status is remapped to `true`
pub fn set_attr(table: &SymbolTable, obj: &ObjectRef<'_>, name: &str, value: &ObjectRef<'_>) -> bool {
    let set = required(table.object_set_attr_string, "PyObject_SetAttrString");
    let c_name = match CString::new(name) {
        Ok(s) => s,
        Err(_) => return false,
    };
    unsafe { set(obj.as_ptr(), c_name.as_ptr(), value.as_ptr()) == 0 }
}

/// Whether an error is currently pending in the runtime
pub fn error_pending(table: &SymbolTable) -> bool {
    let occurred = required(table.err_occurred, "PyErr_Occurred");
    unsafe { !occurred().is_null() }
}

/// Print the pending error, if any, to the process's stderr
pub fn print_errors(table: &SymbolTable) {
    let print = required(table.err_print, "PyErr_Print");
    unsafe { print() }
}

/// Discard the pending error, if any
pub fn clear_errors(table: &SymbolTable) {
    let clear = required(table.err_clear, "PyErr_Clear");
    unsafe { clear() }
}
