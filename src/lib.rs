//! buzzer_shm - publish a buzzer frequency through POSIX shared memory
//!
//! A [`Publisher`] owns one fixed-size shared memory block (by default
//! `/GUI`, 4096 bytes) and writes the latest user-entered frequency into it
//! as a NUL-terminated UTF-8 string at offset 0. An external buzzer
//! controller maps the same block and reads up to the first NUL.
//!
//! # Wire format
//!
//! ```text
//! offset 0            len        len+1 ...           size
//! | trimmed UTF-8 value | 0x00 | stale bytes ...     |
//! ```
//!
//! Writes are not synchronized with readers.

pub mod error;
pub mod shm;
pub mod channel;
pub mod reader;
pub mod tone;
pub mod config;
pub mod bindings;
#[cfg(feature = "gui")]
pub mod gui;

pub use error::{BuzzerError, ErrorKind, Result};
pub use channel::{ChannelConfig, Publisher, DEFAULT_CHANNEL_NAME, DEFAULT_CHANNEL_SIZE};
pub use reader::FrequencyReader;
pub use config::{AppConfig, ConfigLoader};
