//! pybridge - late-binding bridge to an embeddable Python-compatible runtime
//!
//! The runtime's shared library is loaded at process startup, its C-ABI entry
//! points are resolved by name into a typed capability table, and a marshaling
//! layer converts between native values and the runtime's opaque
//! reference-counted objects.
//!
//! Architecture:
//! - `library.rs`  - Dynamic library loading (dlopen/LoadLibrary)
//! - `symbols.rs`  - Entry-point resolution into a typed function table
//! - `object.rs`   - Ownership guard for foreign object references
//! - `args.rs`     - Foreign argument bundle -> native values
//! - `value.rs`    - Native values -> new foreign object references
//! - `exec.rs`     - Source execution, namespaces, attributes, error state
//! - `callback.rs` - Host-defined native callbacks callable from the runtime
//!
//! The bridge performs no locking of its own: the runtime is assumed to hold
//! a single interpreter-level execution lock, and callers must not enter the
//! bridge from multiple threads without that lock. After initialization the
//! symbol table is immutable and safe for concurrent reads.

pub mod args;
pub mod callback;
pub mod exec;
pub mod library;
pub mod logging;
pub mod object;
pub mod symbols;
pub mod value;

pub use args::{parse, ArgShape, ArgValues, ParseOutcome};
pub use callback::{new_function, PyCFunction, PyMethodDef, METH_VARARGS};
pub use exec::{ErrorDisposition, StartMode};
pub use library::{Library, LoadError, SymbolError};
pub use object::{ObjectRef, PyObject};
pub use symbols::{init, init_from_library, init_from_raw, table, InitError, SymbolTable};
pub use value::{wrap, NativeValue};

#[cfg(test)]
mod tests;
