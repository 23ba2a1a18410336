//! # Exynos Register Access Layer
//!
//! Raw register access for the bus traffic shapers (BTS) that sit on every
//! memory-bus endpoint of the SoC. Nothing in this crate makes policy
//! decisions: it knows how to reach a register window and which values
//! make up a QoS programming sequence.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      exynos-bts (policy)                        │
//! │        scenario stack ── power domains ── bandwidth vote        │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │ QosPriority / MoLimit / BwWindow
//! ┌───────────────────────────────▼─────────────────────────────────┐
//! │                    exynos-hal::qos (sequences)                  │
//! │   set_priority  set_priority_bw  set_priority_mo_*  disable     │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │ write32 / read32
//! ┌───────────────────────────────▼─────────────────────────────────┐
//! │                 exynos-hal::mmio (RegisterIo)                   │
//! │          MmioRegion (volatile)   RecordingIo (tests)            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Register writes are fire-and-forget stores to always-present on-chip
//! registers; none of the programming routines can fail.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

pub mod mmio;
pub mod qos;

pub use mmio::{MmioRegion, RegisterIo};
pub use qos::{BwWindow, MoLimit, QosPriority};

#[cfg(any(test, feature = "testing"))]
pub use mmio::RecordingIo;

use core::fmt;

// =============================================================================
// ERRORS
// =============================================================================

/// HAL result type
pub type HalResult<T> = Result<T, HalError>;

/// Errors raised while binding a register window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Physical base address is null
    Unmapped,
    /// Base address or length is not 32-bit aligned
    Misaligned {
        /// Offending base address
        base: usize,
    },
    /// Window is too small for the register block it must hold
    OutOfRange {
        /// Requested window length
        len: usize,
        /// Minimum length required
        required: usize,
    },
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmapped => write!(f, "register window is not mapped"),
            Self::Misaligned { base } => write!(f, "register window {:#x} is misaligned", base),
            Self::OutOfRange { len, required } => {
                write!(f, "register window of {:#x} bytes, need {:#x}", len, required)
            },
        }
    }
}
