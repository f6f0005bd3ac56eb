//! Writer side of the frequency channel
//!
//! The channel is a fixed-size shared memory block holding a single
//! NUL-terminated UTF-8 value at offset 0. Every publish overwrites the value
//! in place; bytes after the terminator keep whatever was there before.
//!
//! There is no lock or sequence counter between the writer and external
//! readers, so a reader racing a publish may observe a torn value.

use crate::error::{BuzzerError, Result};
use crate::shm::{validate_name, SharedRegion};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{fence, Ordering};
use tracing::{debug, info, warn};

/// Name the external buzzer controller maps
pub const DEFAULT_CHANNEL_NAME: &str = "/GUI";

/// Size of the channel in bytes
pub const DEFAULT_CHANNEL_SIZE: usize = 4096;

/// Value terminator
pub const TERMINATOR: u8 = 0;

/// Channel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Shared memory name, leading `/` included
    pub name: String,
    /// Size of the mapped block in bytes
    pub size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CHANNEL_NAME.to_string(),
            size: DEFAULT_CHANNEL_SIZE,
        }
    }
}

impl ChannelConfig {
    /// Check name and size without touching the system
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if self.size == 0 {
            return Err(BuzzerError::ZeroSize);
        }
        Ok(())
    }

    /// Largest value, in encoded bytes, that fits with its terminator
    pub fn max_value_len(&self) -> usize {
        self.size.saturating_sub(1)
    }
}

/// Encode a raw user entry as it is stored in the channel
///
/// Surrounding whitespace is trimmed; the terminator is not included.
pub fn encode_value(raw: &str) -> &[u8] {
    raw.trim().as_bytes()
}

/// Single writer of the frequency channel
///
/// Constructing a `Publisher` opens the channel; [`Publisher::close`] or
/// dropping it releases the local mapping. The shared memory object itself
/// outlives the publisher.
pub struct Publisher {
    region: Option<SharedRegion>,
    name: String,
    size: usize,
    published: u64,
}

impl Publisher {
    /// Create the channel if absent, otherwise open it, and map `size` bytes
    pub fn open(name: &str, size: usize) -> Result<Self> {
        let region = SharedRegion::create_or_open(name, size)?;
        info!(name, size, "frequency channel open");

        Ok(Self {
            region: Some(region),
            name: name.to_string(),
            size,
            published: 0,
        })
    }

    /// Open the channel described by `config`
    pub fn from_config(config: &ChannelConfig) -> Result<Self> {
        config.validate()?;
        Self::open(&config.name, config.size)
    }

    /// Write the trimmed value followed by a terminator at offset 0
    ///
    /// Oversized values are rejected before anything is written, leaving the
    /// previous value intact. The mapping is flushed before returning.
    pub fn publish(&mut self, raw: &str) -> Result<()> {
        let region = match self.region.as_mut() {
            Some(region) => region,
            None => {
                return Err(BuzzerError::Closed {
                    name: self.name.clone(),
                })
            }
        };

        let value = encode_value(raw);
        let needed = value.len() + 1;
        if needed > self.size {
            return Err(BuzzerError::PayloadTooLarge {
                max: self.size,
                got: needed,
            });
        }

        let buf = region.as_mut_slice()?;
        buf[..value.len()].copy_from_slice(value);
        buf[value.len()] = TERMINATOR;

        fence(Ordering::SeqCst);
        region.flush()?;

        self.published += 1;
        debug!(name = %self.name, bytes = value.len(), "published value");
        Ok(())
    }

    /// Release the local mapping and descriptor
    ///
    /// Calling this on a closed publisher does nothing. Unmap failures are
    /// logged and otherwise ignored.
    pub fn close(&mut self) {
        let Some(region) = self.region.take() else {
            return;
        };
        if let Err(e) = region.close() {
            warn!(name = %self.name, error = %e, "failed to release channel");
        }
        info!(name = %self.name, published = self.published, "frequency channel closed");
    }

    /// Whether the channel is still mapped
    #[inline]
    pub fn is_open(&self) -> bool {
        self.region.is_some()
    }

    /// Get the channel name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the channel size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of successful publishes since open
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.close();
    }
}
