//! # Register Windows
//!
//! A register window is a mapped range of 32-bit device registers. The
//! scenario engine only ever talks to a window through [`RegisterIo`], so
//! the same programming sequence drives real hardware through
//! [`MmioRegion`] and a host-side test through `RecordingIo`.

use core::ptr::{read_volatile, write_volatile};

use crate::{HalError, HalResult};

// =============================================================================
// REGISTER IO
// =============================================================================

/// 32-bit register access at a byte offset inside a window
pub trait RegisterIo {
    /// Window length in bytes
    fn len(&self) -> usize;

    /// Is the window empty?
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Does the window cover `required` bytes?
    fn covers(&self, required: usize) -> bool {
        self.len() >= required
    }

    /// Store `value` at `offset`
    fn write32(&self, offset: usize, value: u32);

    /// Load the register at `offset`
    fn read32(&self, offset: usize) -> u32;

    /// Read-modify-write: clear `mask`, then set `bits & mask`
    fn modify32(&self, offset: usize, mask: u32, bits: u32) {
        let old = self.read32(offset);
        self.write32(offset, (old & !mask) | (bits & mask));
    }
}

// =============================================================================
// MMIO REGION
// =============================================================================

/// Memory-mapped register window
#[derive(Debug)]
pub struct MmioRegion {
    base: *mut u8,
    len: usize,
}

// SAFETY: device registers are not thread-local; every access is a single
// volatile 32-bit load or store, and callers serialise sequences under
// their own lock.
unsafe impl Send for MmioRegion {}
unsafe impl Sync for MmioRegion {}

impl MmioRegion {
    /// Create a window over `len` bytes of already-mapped registers
    ///
    /// # Safety
    ///
    /// `base` must be a valid virtual mapping of device memory covering
    /// `len` bytes for the lifetime of the returned window.
    pub unsafe fn new(base: *mut u8, len: usize) -> HalResult<Self> {
        if base.is_null() {
            return Err(HalError::Unmapped);
        }
        if (base as usize) % 4 != 0 || len % 4 != 0 {
            return Err(HalError::Misaligned { base: base as usize });
        }
        Ok(Self { base, len })
    }

    /// Require the window to cover at least `required` bytes
    pub fn require(self, required: usize) -> HalResult<Self> {
        if self.len < required {
            return Err(HalError::OutOfRange { len: self.len, required });
        }
        Ok(self)
    }

    #[inline]
    fn check(&self, offset: usize) {
        let end = offset.checked_add(4);
        assert!(
            end.map_or(false, |end| end <= self.len),
            "register offset {:#x} out of window",
            offset
        );
    }
}

impl RegisterIo for MmioRegion {
    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) {
        self.check(offset);
        // SAFETY: offset + 4 is inside the window mapped at construction
        unsafe { write_volatile(self.base.add(offset) as *mut u32, value) }
    }

    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        self.check(offset);
        // SAFETY: offset + 4 is inside the window mapped at construction
        unsafe { read_volatile(self.base.add(offset) as *const u32) }
    }
}

// =============================================================================
// RECORDING WINDOW
// =============================================================================

#[cfg(any(test, feature = "testing"))]
pub use recording::RecordingIo;

#[cfg(any(test, feature = "testing"))]
mod recording {
    use alloc::collections::BTreeMap;
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use spin::Mutex;

    use super::RegisterIo;
    use crate::qos::BTS_WINDOW_LEN;

    #[derive(Debug, Default)]
    struct Inner {
        writes: Vec<(usize, u32)>,
        regs: BTreeMap<usize, u32>,
    }

    /// Register window backed by memory that logs every store
    ///
    /// Clones share the same log, so a test keeps one handle while the
    /// engine owns another.
    #[derive(Debug, Clone)]
    pub struct RecordingIo {
        inner: Arc<Mutex<Inner>>,
        len: usize,
    }

    impl RecordingIo {
        /// Create an empty window large enough for a BTS v2.1 block
        pub fn new() -> Self {
            Self::with_len(BTS_WINDOW_LEN)
        }

        /// Create an empty window of `len` bytes
        pub fn with_len(len: usize) -> Self {
            Self { inner: Arc::default(), len }
        }

        /// All stores so far, in order
        pub fn writes(&self) -> Vec<(usize, u32)> {
            self.inner.lock().writes.clone()
        }

        /// Number of stores so far
        pub fn write_count(&self) -> usize {
            self.inner.lock().writes.len()
        }

        /// Last value stored at `offset`
        pub fn value(&self, offset: usize) -> Option<u32> {
            self.inner.lock().regs.get(&offset).copied()
        }

        /// Forget the store log, keep register contents
        pub fn clear_log(&self) {
            self.inner.lock().writes.clear();
        }
    }

    impl Default for RecordingIo {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RegisterIo for RecordingIo {
        fn len(&self) -> usize {
            self.len
        }

        fn write32(&self, offset: usize, value: u32) {
            assert!(offset + 4 <= self.len, "register offset {:#x} out of window", offset);
            let mut inner = self.inner.lock();
            inner.writes.push((offset, value));
            inner.regs.insert(offset, value);
        }

        fn read32(&self, offset: usize) -> u32 {
            self.inner.lock().regs.get(&offset).copied().unwrap_or(0)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
