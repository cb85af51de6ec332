//! Strings crossing the foreign boundary.
//!
//! Strings handed out are allocated here and must come back through
//! [`free`]; absent values are the null pointer.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

/// Allocate a NUL-terminated copy of `s` for the caller.
///
/// Interior NUL bytes are dropped.
pub fn into_raw(s: &str) -> *mut c_char {
    let owned = match CString::new(s) {
        Ok(owned) => owned,
        Err(e) => {
            let mut bytes = e.into_vec();
            bytes.retain(|&b| b != 0);
            CString::new(bytes).unwrap_or_default()
        }
    };
    owned.into_raw()
}

/// Like [`into_raw`], with `None` mapped to the null pointer.
pub fn optional_into_raw(s: Option<&str>) -> *mut c_char {
    s.map_or(ptr::null_mut(), into_raw)
}

/// Copy a caller-owned C string. Null reads as the empty string.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
pub unsafe fn read(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Release a string previously returned by [`into_raw`].
///
/// # Safety
/// `ptr` must be null or a pointer obtained from [`into_raw`] that has not
/// been freed yet.
pub unsafe fn free(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(CString::from_raw(ptr));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_raw() {
        let raw = into_raw("https://x.example");
        let copy = unsafe { read(raw) };
        unsafe { free(raw) };
        assert_eq!(copy, "https://x.example");
    }

    #[test]
    fn absent_values_are_null() {
        assert!(optional_into_raw(None).is_null());
        assert_eq!(unsafe { read(ptr::null()) }, "");
        unsafe { free(ptr::null_mut()) };
    }

    #[test]
    fn interior_nul_is_dropped() {
        let raw = into_raw("a\0b");
        assert_eq!(unsafe { read(raw) }, "ab");
        unsafe { free(raw) };
    }
}
