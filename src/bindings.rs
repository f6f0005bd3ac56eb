//! C Bindings for the frequency channel
//!
//! Lets native buzzer controllers and front-ends share the channel logic.

use crate::channel::Publisher;
use crate::error::{BuzzerError, ErrorKind};
use crate::reader::FrequencyReader;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::ptr;

/// Success
pub const BUZZER_OK: c_int = 0;
/// Shared memory could not be opened or mapped
pub const BUZZER_ERR_RESOURCE: c_int = -1;
/// Write or flush failed, or the publisher is closed
pub const BUZZER_ERR_IO: c_int = -2;
/// Value does not fit in the channel
pub const BUZZER_ERR_INVALID_INPUT: c_int = -3;
/// Null handle or argument, or text that is not UTF-8
pub const BUZZER_ERR_ARGUMENT: c_int = -4;

// Opaque handles
pub struct BuzzerPublisherHandle(Publisher);
pub struct BuzzerReaderHandle(FrequencyReader);

fn error_code(err: &BuzzerError) -> c_int {
    match err.kind() {
        ErrorKind::ResourceUnavailable => BUZZER_ERR_RESOURCE,
        ErrorKind::IoFailure => BUZZER_ERR_IO,
        ErrorKind::InvalidInput => BUZZER_ERR_INVALID_INPUT,
    }
}

unsafe fn str_arg<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

// --- Publisher Side ---

/// Create or open a channel for publishing
///
/// Returns null on failure.
///
/// # Safety
/// name must be a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn buzzer_publisher_open(
    name: *const c_char,
    size: usize,
) -> *mut BuzzerPublisherHandle {
    let Some(name) = str_arg(name) else {
        return ptr::null_mut();
    };

    match Publisher::open(name, size) {
        Ok(publisher) => Box::into_raw(Box::new(BuzzerPublisherHandle(publisher))),
        Err(_) => ptr::null_mut(),
    }
}

/// Publish a value; returns `BUZZER_OK` or a negative error code
///
/// # Safety
/// handle must come from `buzzer_publisher_open`, text must be a valid
/// null-terminated string
#[no_mangle]
pub unsafe extern "C" fn buzzer_publisher_publish(
    handle: *mut BuzzerPublisherHandle,
    text: *const c_char,
) -> c_int {
    if handle.is_null() {
        return BUZZER_ERR_ARGUMENT;
    }
    let Some(text) = str_arg(text) else {
        return BUZZER_ERR_ARGUMENT;
    };

    match (*handle).0.publish(text) {
        Ok(()) => BUZZER_OK,
        Err(e) => error_code(&e),
    }
}

/// Release the mapping; the handle stays valid and later publishes fail
///
/// # Safety
/// handle must come from `buzzer_publisher_open`
#[no_mangle]
pub unsafe extern "C" fn buzzer_publisher_close(handle: *mut BuzzerPublisherHandle) {
    if !handle.is_null() {
        (*handle).0.close();
    }
}

/// Destroy a publisher handle
///
/// # Safety
/// handle must come from `buzzer_publisher_open` and not be used afterwards
#[no_mangle]
pub unsafe extern "C" fn buzzer_publisher_destroy(handle: *mut BuzzerPublisherHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

// --- Reader Side ---

/// Map an existing channel read-only
///
/// # Safety
/// name must be a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn buzzer_reader_open(name: *const c_char) -> *mut BuzzerReaderHandle {
    let Some(name) = str_arg(name) else {
        return ptr::null_mut();
    };

    match FrequencyReader::open(name) {
        Ok(reader) => Box::into_raw(Box::new(BuzzerReaderHandle(reader))),
        Err(_) => ptr::null_mut(),
    }
}

/// Copy the current value into buf as a null-terminated string
///
/// Returns the full value length, which may exceed `max_len - 1`.
///
/// # Safety
/// handle must come from `buzzer_reader_open`, buf must hold max_len bytes
#[no_mangle]
pub unsafe extern "C" fn buzzer_reader_read(
    handle: *mut BuzzerReaderHandle,
    buf: *mut c_char,
    max_len: usize,
) -> usize {
    if handle.is_null() {
        return 0;
    }
    let value = (*handle).0.read_raw();
    if !buf.is_null() && max_len > 0 {
        let copy_len = value.len().min(max_len - 1);
        ptr::copy_nonoverlapping(value.as_ptr(), buf.cast::<u8>(), copy_len);
        *buf.add(copy_len) = 0;
    }
    value.len()
}

/// Destroy a reader handle
///
/// # Safety
/// handle must come from `buzzer_reader_open` and not be used afterwards
#[no_mangle]
pub unsafe extern "C" fn buzzer_reader_destroy(handle: *mut BuzzerReaderHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shm::{tests::test_name, unlink};
    use std::ffi::CString;

    #[test]
    fn test_c_roundtrip() {
        let name = test_name("ffi");
        let c_name = CString::new(name.clone()).unwrap();

        unsafe {
            let publisher = buzzer_publisher_open(c_name.as_ptr(), 64);
            assert!(!publisher.is_null());
            let reader = buzzer_reader_open(c_name.as_ptr());
            assert!(!reader.is_null());

            let value = CString::new(" 1200 ").unwrap();
            assert_eq!(buzzer_publisher_publish(publisher, value.as_ptr()), BUZZER_OK);

            let mut buf = [0 as c_char; 8];
            assert_eq!(buzzer_reader_read(reader, buf.as_mut_ptr(), buf.len()), 4);
            assert_eq!(CStr::from_ptr(buf.as_ptr()).to_str().unwrap(), "1200");

            // Truncated copy still terminates
            let mut small = [0 as c_char; 3];
            assert_eq!(buzzer_reader_read(reader, small.as_mut_ptr(), small.len()), 4);
            assert_eq!(CStr::from_ptr(small.as_ptr()).to_str().unwrap(), "12");

            let too_big = CString::new("9".repeat(64)).unwrap();
            assert_eq!(
                buzzer_publisher_publish(publisher, too_big.as_ptr()),
                BUZZER_ERR_INVALID_INPUT
            );
            assert_eq!(
                buzzer_publisher_publish(publisher, ptr::null()),
                BUZZER_ERR_ARGUMENT
            );

            buzzer_publisher_close(publisher);
            assert_eq!(buzzer_publisher_publish(publisher, value.as_ptr()), BUZZER_ERR_IO);

            buzzer_reader_destroy(reader);
            buzzer_publisher_destroy(publisher);
        }

        unlink(&name).unwrap();
    }

    #[test]
    fn test_open_invalid_name() {
        let c_name = CString::new("no_slash").unwrap();
        unsafe {
            assert!(buzzer_publisher_open(c_name.as_ptr(), 64).is_null());
            assert!(buzzer_publisher_open(ptr::null(), 64).is_null());
        }
    }
}
