//! Test suite for the bridge - fake lookups and fake entry points, no real
//! runtime required (see `tests/embed.rs` for the real-runtime checks).

use core::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::args::{parse, ArgShape};
use crate::callback::{PyCFunction, PyMethodDef, METH_VARARGS};
use crate::exec::StartMode;
use crate::object::{ObjectRef, PyObject};
use crate::symbols::{init, table, InitError, SymbolTable};
use crate::value::NativeValue;

extern "C" fn entry_a() -> i32 {
    1
}
extern "C" fn entry_b() -> i32 {
    2
}

fn full_lookup(_name: &str) -> Option<*const ()> {
    Some(entry_a as *const ())
}

#[test]
fn format_codes_per_shape() {
    assert_eq!(ArgShape::Str.format(), b"s\0");
    assert_eq!(ArgShape::Double.format(), b"d\0");
    assert_eq!(ArgShape::Long.format(), b"l\0");
    assert_eq!(ArgShape::Object.format(), b"O\0");
    assert_eq!(ArgShape::ObjectPair.format(), b"OO\0");
    assert_eq!(ArgShape::ObjectTriple.format(), b"OOO\0");

    assert_eq!(ArgShape::ObjectTriple.code(), "OOO");
}

#[test]
fn format_codes_per_native_kind() {
    assert_eq!(NativeValue::Long(0).format(), Some(&b"l\0"[..]));
    assert_eq!(NativeValue::Double(0.0).format(), Some(&b"d\0"[..]));
    assert_eq!(NativeValue::Str("").format(), Some(&b"s\0"[..]));
    assert_eq!(NativeValue::Object(ptr::null_mut()).format(), Some(&b"O\0"[..]));
    // Booleans go through the dedicated constructor, not a format code.
    assert_eq!(NativeValue::Bool(true).format(), None);
}

#[test]
fn start_mode_tokens() {
    assert_eq!(StartMode::Single.token(), 256);
    assert_eq!(StartMode::File.token(), 257);
    assert_eq!(StartMode::Eval.token(), 258);
}

#[test]
fn resolution_maps_names_to_slots() {
    let resolved = SymbolTable::resolve_with(|name| {
        if name == "PyArg_ParseTuple" {
            Some(entry_a as *const ())
        } else {
            Some(entry_b as *const ())
        }
    });

    assert_eq!(resolved.parse_tuple.map(|f| f as usize), Some(entry_a as usize));
    assert_eq!(resolved.build_value.map(|f| f as usize), Some(entry_b as usize));
    assert_eq!(resolved.err_clear.map(|f| f as usize), Some(entry_b as usize));
}

#[test]
fn resolution_is_idempotent() {
    let first = SymbolTable::resolve_with(full_lookup);
    let second = SymbolTable::resolve_with(full_lookup);
    assert_eq!(first, second);
}

#[test]
fn missing_symbol_isolates_to_its_slot() {
    let resolved = SymbolTable::resolve_with(|name| {
        if name == "PyRun_String" {
            None
        } else {
            Some(entry_a as *const ())
        }
    });

    assert!(resolved.run_string.is_none());
    assert!(resolved.parse_tuple.is_some());
    assert!(resolved.err_occurred.is_some());
    assert_eq!(resolved.missing_required(), vec!["PyRun_String"]);
    assert!(resolved.validate().is_err());
}

#[test]
fn version_dependent_symbols_are_not_required() {
    let resolved = SymbolTable::resolve_with(|name| {
        match name {
            "PyUnicode_FromString" | "PyImport_GetModule" => None,
            _ => Some(entry_a as *const ()),
        }
    });

    assert!(resolved.unicode_from_string.is_none());
    assert!(resolved.import_get_module.is_none());
    assert!(resolved.validate().is_ok());
}

#[test]
fn validation_lists_every_missing_required_symbol() {
    let resolved = SymbolTable::resolve_with(|_| None);
    match resolved.validate() {
        Err(InitError::MissingSymbols(names)) => {
            assert!(names.contains(&"PyArg_ParseTuple"));
            assert!(names.contains(&"Py_BuildValue"));
            assert!(names.contains(&"Py_DecRef"));
            assert!(!names.contains(&"PyUnicode_FromString"));
        }
        other => panic!("expected MissingSymbols, got {:?}", other),
    }

    assert!(SymbolTable::resolve_with(full_lookup).validate().is_ok());
}

#[test]
fn global_init_validates_rejects_conflicts_and_is_idempotent() {
    // Missing required symbols abort initialization without installing.
    assert!(matches!(
        init(SymbolTable::resolve_with(|_| None)),
        Err(InitError::MissingSymbols(_))
    ));

    let resolved = SymbolTable::resolve_with(full_lookup);
    let stored = init(resolved).expect("first init");
    assert_eq!(*stored, resolved);

    // Same table again is fine.
    assert!(init(resolved).is_ok());
    assert_eq!(table().map(|t| *t), Some(resolved));

    // A conflicting table is rejected.
    let conflicting = SymbolTable::resolve_with(|name| {
        if name == "PyArg_ParseTuple" {
            Some(entry_b as *const ())
        } else {
            Some(entry_a as *const ())
        }
    });
    assert_eq!(init(conflicting), Err(InitError::AlreadyInitialized));
}

#[test]
fn owned_guard_decrefs_exactly_once() {
    static DECREFS: AtomicUsize = AtomicUsize::new(0);
    extern "C" fn fake_decref(_: *mut PyObject) {
        DECREFS.fetch_add(1, Ordering::SeqCst);
    }

    let resolved = SymbolTable::resolve_with(|name| match name {
        "Py_DecRef" => Some(fake_decref as *const ()),
        _ => None,
    });
    let obj = 0x1000 as *mut PyObject;

    unsafe {
        let guard = ObjectRef::owned(&resolved, obj).expect("non-null");
        assert!(guard.is_owned());
        drop(guard);
    }
    assert_eq!(DECREFS.load(Ordering::SeqCst), 1);

    unsafe {
        let guard = ObjectRef::borrowed(&resolved, obj).expect("non-null");
        assert!(!guard.is_owned());
        drop(guard);
    }
    assert_eq!(DECREFS.load(Ordering::SeqCst), 1);
}

#[test]
fn into_raw_suppresses_the_decrement() {
    static DECREFS: AtomicUsize = AtomicUsize::new(0);
    extern "C" fn fake_decref(_: *mut PyObject) {
        DECREFS.fetch_add(1, Ordering::SeqCst);
    }

    let resolved = SymbolTable::resolve_with(|name| match name {
        "Py_DecRef" => Some(fake_decref as *const ()),
        _ => None,
    });
    let obj = 0x2000 as *mut PyObject;

    let raw = unsafe { ObjectRef::owned(&resolved, obj).expect("non-null").into_raw() };
    assert_eq!(raw, obj);
    assert_eq!(DECREFS.load(Ordering::SeqCst), 0);
}

#[test]
fn clone_ref_increments_and_takes_an_obligation() {
    static INCREFS: AtomicUsize = AtomicUsize::new(0);
    static DECREFS: AtomicUsize = AtomicUsize::new(0);
    extern "C" fn fake_incref(_: *mut PyObject) {
        INCREFS.fetch_add(1, Ordering::SeqCst);
    }
    extern "C" fn fake_decref(_: *mut PyObject) {
        DECREFS.fetch_add(1, Ordering::SeqCst);
    }

    let resolved = SymbolTable::resolve_with(|name| match name {
        "Py_IncRef" => Some(fake_incref as *const ()),
        "Py_DecRef" => Some(fake_decref as *const ()),
        _ => None,
    });
    let obj = 0x3000 as *mut PyObject;

    unsafe {
        let borrowed = ObjectRef::borrowed(&resolved, obj).expect("non-null");
        let cloned = borrowed.clone_ref();
        assert!(cloned.is_owned());
        assert_eq!(INCREFS.load(Ordering::SeqCst), 1);
        drop(cloned);
        drop(borrowed);
    }
    assert_eq!(DECREFS.load(Ordering::SeqCst), 1);
}

#[test]
fn null_references_are_rejected() {
    let resolved = SymbolTable::resolve_with(|_| None);
    unsafe {
        assert!(ObjectRef::owned(&resolved, ptr::null_mut()).is_none());
        assert!(ObjectRef::borrowed(&resolved, ptr::null_mut()).is_none());
    }
}

#[test]
#[should_panic(expected = "PyArg_ParseTuple")]
fn invoking_an_unresolved_slot_is_fatal() {
    let resolved = SymbolTable::resolve_with(|_| None);
    unsafe {
        let _ = parse(&resolved, ptr::null_mut(), ArgShape::Long);
    }
}

#[test]
fn method_descriptor_construction() {
    unsafe extern "C" fn cb(_slf: *mut PyObject, _args: *mut PyObject) -> *mut PyObject {
        ptr::null_mut()
    }

    static NAME: &[u8] = b"callback\0";
    let def = PyMethodDef::varargs(NAME, cb as PyCFunction);

    assert_eq!(def.ml_flags, METH_VARARGS);
    assert_eq!(def.ml_name, NAME.as_ptr().cast());
    assert!(def.ml_meth.is_some());
    assert!(def.ml_doc.is_null());
}
