//! Reader side of the frequency channel
//!
//! Mirrors what the native buzzer controller does: map the channel
//! read-only and take everything from offset 0 up to the first NUL.

use crate::channel::TERMINATOR;
use crate::error::Result;
use crate::shm::SharedRegion;

/// Bytes of the value stored in `buf`: everything before the first NUL
///
/// A buffer without a terminator is returned whole.
#[inline]
pub fn decode_value(buf: &[u8]) -> &[u8] {
    match buf.iter().position(|&b| b == TERMINATOR) {
        Some(end) => &buf[..end],
        None => buf,
    }
}

/// Read-only view of a frequency channel
pub struct FrequencyReader {
    region: SharedRegion,
    last: String,
}

impl FrequencyReader {
    /// Map an existing channel read-only
    pub fn open(name: &str) -> Result<Self> {
        Ok(Self {
            region: SharedRegion::open_readonly(name)?,
            last: String::new(),
        })
    }

    /// Raw bytes of the current value
    pub fn read_raw(&self) -> Vec<u8> {
        decode_value(self.region.as_slice()).to_vec()
    }

    /// Current value, with invalid UTF-8 replaced
    pub fn read_value(&self) -> String {
        String::from_utf8_lossy(&self.read_raw()).into_owned()
    }

    /// Copy of the whole mapping, terminator and stale bytes included
    pub fn snapshot(&self) -> Vec<u8> {
        self.region.as_slice().to_vec()
    }

    /// Return the current value only if it differs from the last one seen
    ///
    /// The first call reports any non-empty value.
    pub fn poll_changed(&mut self) -> Option<String> {
        let value = self.read_value();
        if value == self.last {
            return None;
        }
        self.last.clone_from(&value);
        Some(value)
    }

    /// Get the channel name
    pub fn name(&self) -> &str {
        self.region.name()
    }

    /// Get the mapped size
    pub fn size(&self) -> usize {
        self.region.size()
    }
}
