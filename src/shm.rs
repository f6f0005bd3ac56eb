//! Low-level POSIX shared memory operations

use crate::error::{BuzzerError, Result};
use rustix::fd::OwnedFd;
use rustix::fs::{fstat, ftruncate};
use rustix::mm::{mmap, msync, munmap, MapFlags, MsyncFlags, ProtFlags};
use rustix::shm::{shm_open, shm_unlink, Mode, ShmOFlags};
use std::ffi::CString;
use std::io;
use std::ptr::NonNull;
use tracing::warn;

/// Longest name accepted by `shm_open` on Linux (NAME_MAX)
pub const MAX_NAME_LEN: usize = 255;

/// Check that `name` is a portable POSIX shared memory name
///
/// The name must start with `/`, have at least one more character, and
/// contain no further `/` or NUL bytes.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if !name.starts_with('/') {
        Some("must start with '/'")
    } else if name.len() == 1 {
        Some("must not be empty after '/'")
    } else if name.len() > MAX_NAME_LEN {
        Some("longer than 255 bytes")
    } else if name[1..].contains('/') {
        Some("must not contain '/' after the first character")
    } else if name.contains('\0') {
        Some("must not contain NUL")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(BuzzerError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn c_name(name: &str) -> Result<CString> {
    validate_name(name)?;
    CString::new(name).map_err(|_| BuzzerError::InvalidName {
        name: name.to_string(),
        reason: "must not contain NUL",
    })
}

/// Remove a shared memory object from the system
///
/// Mappings held by other processes stay valid until they are released.
pub fn unlink(name: &str) -> Result<()> {
    let c_name = c_name(name)?;
    shm_unlink(c_name.as_c_str()).map_err(|e| BuzzerError::ShmOpen {
        name: name.to_string(),
        source: e.into(),
    })
}

/// Handle to a mapped shared memory region
///
/// Dropping the handle unmaps the region and closes the descriptor. The
/// underlying object is never unlinked here; use [`unlink`] for that.
pub struct SharedRegion {
    fd: Option<OwnedFd>,
    addr: NonNull<u8>,
    size: usize,
    name: String,
    writable: bool,
    mapped: bool,
}

// SAFETY: the mapping is owned by this handle and only reachable through it.
// Cross-process access to the same bytes is unsynchronized by contract.
unsafe impl Send for SharedRegion {}

impl SharedRegion {
    /// Create a shared memory object, or open it if it already exists
    ///
    /// A freshly created object is sized to `size`. An existing object must
    /// be at least `size` bytes; only the first `size` bytes are mapped.
    pub fn create_or_open(name: &str, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(BuzzerError::ZeroSize);
        }
        let c_name = c_name(name)?;

        let fd = shm_open(
            c_name.as_c_str(),
            ShmOFlags::CREATE | ShmOFlags::RDWR,
            Mode::RUSR | Mode::WUSR | Mode::RGRP | Mode::WGRP | Mode::ROTH | Mode::WOTH,
        )
        .map_err(|e| BuzzerError::ShmOpen {
            name: name.to_string(),
            source: e.into(),
        })?;

        let current = object_len(&fd, name)?;
        if current == 0 {
            ftruncate(&fd, size as u64).map_err(|e| BuzzerError::Truncate {
                name: name.to_string(),
                source: e.into(),
            })?;
        } else if current < size {
            return Err(BuzzerError::IncompatibleSize {
                name: name.to_string(),
                expected: size,
                actual: current,
            });
        }

        let addr = map(&fd, size, ProtFlags::READ | ProtFlags::WRITE)?;

        Ok(Self {
            fd: Some(fd),
            addr,
            size,
            name: name.to_string(),
            writable: true,
            mapped: true,
        })
    }

    /// Open an existing shared memory object read-only
    ///
    /// The whole object is mapped; its size is taken from the object itself.
    pub fn open_readonly(name: &str) -> Result<Self> {
        let c_name = c_name(name)?;

        let fd = shm_open(c_name.as_c_str(), ShmOFlags::RDONLY, Mode::empty()).map_err(|e| {
            BuzzerError::ShmOpen {
                name: name.to_string(),
                source: e.into(),
            }
        })?;

        let size = object_len(&fd, name)?;
        if size == 0 {
            return Err(BuzzerError::IncompatibleSize {
                name: name.to_string(),
                expected: 1,
                actual: 0,
            });
        }

        let addr = map(&fd, size, ProtFlags::READ)?;

        Ok(Self {
            fd: Some(fd),
            addr,
            size,
            name: name.to_string(),
            writable: false,
            mapped: true,
        })
    }

    /// View the mapped bytes
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `addr` maps `size` readable bytes for as long as `self`
        // lives. Other processes may change them concurrently.
        unsafe { std::slice::from_raw_parts(self.addr.as_ptr(), self.size) }
    }

    /// Mutable view of the mapped bytes; fails on read-only regions
    #[inline]
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        if !self.writable {
            return Err(BuzzerError::ReadOnly {
                name: self.name.clone(),
            });
        }
        // SAFETY: mapped PROT_WRITE with `size` bytes, uniquely borrowed here.
        Ok(unsafe { std::slice::from_raw_parts_mut(self.addr.as_ptr(), self.size) })
    }

    /// Synchronously flush the mapping
    pub fn flush(&self) -> Result<()> {
        // SAFETY: the range is exactly the live mapping.
        unsafe { msync(self.addr.as_ptr().cast(), self.size, MsyncFlags::SYNC) }
            .map_err(|e| BuzzerError::Flush(e.into()))
    }

    /// Get size of the mapped region
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the name of shared memory
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the region was mapped for writing
    #[inline(always)]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Unmap the region and close the descriptor, reporting unmap failures
    pub fn close(mut self) -> io::Result<()> {
        self.release()
    }

    fn release(&mut self) -> io::Result<()> {
        if !self.mapped {
            return Ok(());
        }
        self.mapped = false;
        // SAFETY: the mapping was created by `map` with this address and size
        // and no slice borrowed from it can outlive `&mut self`.
        let result = unsafe { munmap(self.addr.as_ptr().cast(), self.size) };
        self.fd.take();
        result.map_err(Into::into)
    }
}

impl Drop for SharedRegion {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(name = %self.name, error = %e, "failed to unmap shared memory");
        }
    }
}

fn object_len(fd: &OwnedFd, name: &str) -> Result<usize> {
    let stat = fstat(fd).map_err(|e| BuzzerError::Truncate {
        name: name.to_string(),
        source: e.into(),
    })?;
    Ok(stat.st_size.max(0) as usize)
}

fn map(fd: &OwnedFd, size: usize, prot: ProtFlags) -> Result<NonNull<u8>> {
    let addr = unsafe {
        mmap(std::ptr::null_mut(), size, prot, MapFlags::SHARED, fd, 0)
            .map_err(|e| BuzzerError::Mmap(e.into()))?
    };

    NonNull::new(addr.cast::<u8>())
        .ok_or_else(|| BuzzerError::Mmap(io::Error::new(io::ErrorKind::Other, "mmap returned null")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_name(tag: &str) -> String {
        format!("/buzzer_test_{}_{}", std::process::id(), tag)
    }

    #[test]
    fn test_create_and_open_readonly() {
        let name = test_name("shm_create");
        let size = 4096;

        let mut writer = SharedRegion::create_or_open(&name, size).unwrap();
        assert!(writer.is_writable());
        assert_eq!(writer.size(), size);

        writer.as_mut_slice().unwrap()[0] = 42;

        // Open from another "process"
        let reader = SharedRegion::open_readonly(&name).unwrap();
        assert!(!reader.is_writable());
        assert_eq!(reader.size(), size);
        assert_eq!(reader.as_slice()[0], 42);

        drop(reader);
        drop(writer);
        unlink(&name).unwrap();
    }

    #[test]
    fn test_drop_keeps_object() {
        let name = test_name("shm_keep");

        let mut writer = SharedRegion::create_or_open(&name, 64).unwrap();
        writer.as_mut_slice().unwrap()[..3].copy_from_slice(b"abc");
        writer.close().unwrap();

        let reopened = SharedRegion::create_or_open(&name, 64).unwrap();
        assert_eq!(&reopened.as_slice()[..3], b"abc");

        drop(reopened);
        unlink(&name).unwrap();
    }

    #[test]
    fn test_incompatible_size() {
        let name = test_name("shm_small");

        let small = SharedRegion::create_or_open(&name, 64).unwrap();
        let err = SharedRegion::create_or_open(&name, 4096).err().unwrap();
        assert!(matches!(err, BuzzerError::IncompatibleSize { actual: 64, .. }));

        // A smaller request against a larger object maps only what was asked
        let smaller = SharedRegion::create_or_open(&name, 16).unwrap();
        assert_eq!(smaller.size(), 16);

        drop(smaller);
        drop(small);
        unlink(&name).unwrap();
    }

    #[test]
    fn test_readonly_rejects_writes() {
        let name = test_name("shm_ro");

        let writer = SharedRegion::create_or_open(&name, 64).unwrap();
        let mut reader = SharedRegion::open_readonly(&name).unwrap();
        assert!(matches!(
            reader.as_mut_slice(),
            Err(BuzzerError::ReadOnly { .. })
        ));

        drop(reader);
        drop(writer);
        unlink(&name).unwrap();
    }

    #[test]
    fn test_open_missing() {
        let err = SharedRegion::open_readonly(&test_name("shm_missing"))
            .err()
            .unwrap();
        assert!(matches!(err, BuzzerError::ShmOpen { .. }));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("/GUI").is_ok());
        assert!(validate_name("GUI").is_err());
        assert!(validate_name("/").is_err());
        assert!(validate_name("/a/b").is_err());
        assert!(validate_name("/a\0b").is_err());
        assert!(validate_name(&format!("/{}", "x".repeat(MAX_NAME_LEN))).is_err());
        assert!(matches!(
            SharedRegion::create_or_open("/x", 0),
            Err(BuzzerError::ZeroSize)
        ));
    }
}
