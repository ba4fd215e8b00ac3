//! Dynamic library loading and symbol resolution
//!
//! Platform-agnostic wrapper around dlopen/LoadLibrary. Produces the opaque
//! handle the bridge's initializer consumes; when a handle is handed to
//! [`crate::symbols::init_from_library`] it is kept open for the process
//! lifetime and never closed.

use core::ffi::c_void;
use core::ptr::NonNull;
use std::ffi::CString;

/// Handle to a dynamically loaded library
pub struct Library {
    handle: NonNull<c_void>,
}

impl Library {
    /// Open a library by name
    ///
    /// Searches standard library paths. Use `open_path` for absolute paths.
    pub fn open(name: &str) -> Result<Self, LoadError> {
        Self::open_impl(name)
    }

    /// Open a library from an absolute path
    pub fn open_path(path: &str) -> Result<Self, LoadError> {
        Self::open_impl(path)
    }

    /// Wrap a raw handle obtained elsewhere (e.g. by the host's own loader)
    ///
    /// # Safety
    /// `handle` must be a live handle returned by the platform loader.
    pub unsafe fn from_raw(handle: *mut c_void) -> Option<Self> {
        NonNull::new(handle).map(|handle| Self { handle })
    }

    #[cfg(unix)]
    fn open_impl(name: &str) -> Result<Self, LoadError> {
        let cname = CString::new(name).map_err(|_| LoadError::InvalidName)?;

        unsafe {
            let handle = libc::dlopen(cname.as_ptr(), libc::RTLD_NOW | libc::RTLD_GLOBAL);
            NonNull::new(handle)
                .map(|handle| Self { handle })
                .ok_or_else(|| {
                    let err = libc::dlerror();
                    let msg = if !err.is_null() {
                        std::ffi::CStr::from_ptr(err).to_string_lossy().into_owned()
                    } else {
                        "unknown error".into()
                    };
                    LoadError::LoadFailed(msg)
                })
        }
    }

    #[cfg(windows)]
    fn open_impl(name: &str) -> Result<Self, LoadError> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;

        extern "system" {
            fn LoadLibraryW(filename: *const u16) -> *mut c_void;
            fn GetLastError() -> u32;
        }

        let wide: Vec<u16> = OsStr::new(name).encode_wide().chain(Some(0)).collect();

        unsafe {
            let handle = LoadLibraryW(wide.as_ptr());
            NonNull::new(handle)
                .map(|handle| Self { handle })
                .ok_or_else(|| {
                    let code = GetLastError();
                    LoadError::LoadFailed(format!("error code: {}", code))
                })
        }
    }

    /// Resolve a function pointer by symbol name
    pub fn symbol(&self, name: &str) -> Result<*const (), SymbolError> {
        self.symbol_impl(name)
    }

    #[cfg(unix)]
    fn symbol_impl(&self, name: &str) -> Result<*const (), SymbolError> {
        let cname = CString::new(name).map_err(|_| SymbolError::InvalidName)?;

        unsafe {
            let ptr = libc::dlsym(self.handle.as_ptr(), cname.as_ptr());
            if ptr.is_null() {
                Err(SymbolError::NotFound)
            } else {
                Ok(ptr as *const ())
            }
        }
    }

    #[cfg(windows)]
    fn symbol_impl(&self, name: &str) -> Result<*const (), SymbolError> {
        extern "system" {
            fn GetProcAddress(module: *mut c_void, name: *const u8) -> *mut c_void;
        }

        let cname = CString::new(name).map_err(|_| SymbolError::InvalidName)?;

        unsafe {
            let ptr = GetProcAddress(self.handle.as_ptr(), cname.as_ptr() as *const u8);
            if ptr.is_null() {
                Err(SymbolError::NotFound)
            } else {
                Ok(ptr as *const ())
            }
        }
    }
}

impl Drop for Library {
    #[cfg(unix)]
    fn drop(&mut self) {
        unsafe {
            libc::dlclose(self.handle.as_ptr());
        }
    }

    #[cfg(windows)]
    fn drop(&mut self) {
        extern "system" {
            fn FreeLibrary(module: *mut c_void) -> i32;
        }
        unsafe {
            FreeLibrary(self.handle.as_ptr());
        }
    }
}

unsafe impl Send for Library {}
unsafe impl Sync for Library {}

/// Library loading errors
#[derive(Debug)]
pub enum LoadError {
    InvalidName,
    LoadFailed(String),
}

impl core::fmt::Display for LoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "invalid library name"),
            Self::LoadFailed(msg) => write!(f, "failed to load library: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {}

/// Symbol lookup errors
#[derive(Debug)]
pub enum SymbolError {
    InvalidName,
    NotFound,
}

impl core::fmt::Display for SymbolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "invalid symbol name"),
            Self::NotFound => write!(f, "symbol not found"),
        }
    }
}

impl std::error::Error for SymbolError {}
