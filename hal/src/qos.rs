//! # BTS QoS Programming Sequences
//!
//! Every bus endpoint carries its QoS knobs in one of two register layouts:
//!
//! - **BTS v2.1 block**: a dedicated shaper with a read bank and a write
//!   bank, each with its own control, priority, issue-capability (MO) and
//!   window/token registers.
//! - **System register**: a compact pair of registers in the owning block's
//!   sysreg, holding both channel priorities and both MO limits.
//!
//! ## BTS v2.1 Register Map (per bank)
//!
//! | Offset | Register          | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | 0x00   | QOS_CONTROL       | Enable / MO limit / BW limit         |
//! | 0x04   | PRIORITY          | AxQOS priority (4 bits)              |
//! | 0x08   | TOKEN_MAX         | Token bucket depth                   |
//! | 0x20   | DEFAULT_WINDOW    | Bandwidth window (cycles)            |
//! | 0x24   | DEFAULT_TOKEN     | Tokens granted per window            |
//! | 0x30   | ISSUE_CAP_UPPER   | Max outstanding transactions         |
//! | 0x34   | ISSUE_CAP_LOWER   | Min outstanding under blocking       |
//! | 0x38   | BLOCKING_CONTROL  | Flexible blocking enable             |
//!
//! The read bank lives at [`BTS_READ_BANK`], the write bank at
//! [`BTS_WRITE_BANK`].
//!
//! ## Sysreg Layout
//!
//! ```text
//!  SYSREG_QOS (0x0)   31        10    9     8   7    4 3    0
//!                    ┌───────────┬─────┬─────┬──────┬──────┐
//!                    │  reserved │ AWE │ ARE │ AWQOS│ ARQOS│
//!                    └───────────┴─────┴─────┴──────┴──────┘
//!  SYSREG_MO  (0x4)   31      16 15       8 7        0
//!                    ┌──────────┬──────────┬──────────┐
//!                    │ reserved │   AWMO   │   ARMO   │
//!                    └──────────┴──────────┴──────────┘
//! ```
//!
//! All sequences quiesce the shaper before changing values and re-enable
//! it last, so the bus never observes a half-written configuration.

use bitflags::bitflags;
use static_assertions::const_assert;

use crate::mmio::RegisterIo;

// =============================================================================
// BTS V2.1 REGISTER MAP
// =============================================================================

/// Read channel bank
pub const BTS_READ_BANK: usize = 0x000;
/// Write channel bank
pub const BTS_WRITE_BANK: usize = 0x400;

/// QoS control register
pub const QOS_CONTROL: usize = 0x00;
/// Channel priority
pub const PRIORITY: usize = 0x04;
/// Token bucket depth
pub const TOKEN_MAX: usize = 0x08;
/// Bandwidth window length
pub const DEFAULT_WINDOW: usize = 0x20;
/// Tokens per window
pub const DEFAULT_TOKEN: usize = 0x24;
/// Upper issue capability (MO limit)
pub const ISSUE_CAP_UPPER: usize = 0x30;
/// Lower issue capability
pub const ISSUE_CAP_LOWER: usize = 0x34;
/// Flexible blocking control
pub const BLOCKING_CONTROL: usize = 0x38;

/// Size of one bank
pub const BTS_BANK_LEN: usize = 0x40;
/// Window size needed by a BTS v2.1 block
pub const BTS_WINDOW_LEN: usize = BTS_WRITE_BANK + BTS_BANK_LEN;

const_assert!(BTS_READ_BANK + BTS_BANK_LEN <= BTS_WRITE_BANK);
const_assert!(BLOCKING_CONTROL < BTS_BANK_LEN);

/// Hardware reset priority
pub const RESET_PRIORITY: u32 = 0x4;
/// Hardware reset issue capability
pub const RESET_ISSUE_CAP: u32 = 0x40;
/// Hardware reset token depth
pub const RESET_TOKEN_MAX: u32 = 0x0;

bitflags! {
    /// QOS_CONTROL bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct QosControl: u32 {
        /// Shaper drives AxQOS from PRIORITY
        const QOS_ON = 1 << 0;
        /// Issue capability limiting active
        const MO_LIMIT = 1 << 1;
        /// Window/token bandwidth limiting active
        const BW_LIMIT = 1 << 2;
    }
}

// =============================================================================
// SYSREG LAYOUT
// =============================================================================

/// Sysreg priority register
pub const SYSREG_QOS: usize = 0x0;
/// Sysreg MO register
pub const SYSREG_MO: usize = 0x4;
/// Window size needed by a sysreg endpoint
pub const SYSREG_WINDOW_LEN: usize = 0x8;

const ARQOS_SHIFT: u32 = 0;
const AWQOS_SHIFT: u32 = 4;
const ARQOS_EN: u32 = 1 << 8;
const AWQOS_EN: u32 = 1 << 9;
const ARMO_SHIFT: u32 = 0;
const AWMO_SHIFT: u32 = 8;
const MO_FIELD_MASK: u32 = 0xFF;

// =============================================================================
// QOS VALUES
// =============================================================================

/// Read/write AxQOS priority pair (4 bits each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QosPriority {
    /// Read channel priority
    pub read: u8,
    /// Write channel priority
    pub write: u8,
}

impl QosPriority {
    /// Highest encodable priority
    pub const MAX: u8 = 0xF;

    /// Same priority on both channels
    pub const fn splat(value: u8) -> Self {
        Self { read: value, write: value }
    }

    /// Distinct channel priorities
    pub const fn new(read: u8, write: u8) -> Self {
        Self { read, write }
    }

    /// Both values fit the 4-bit field
    pub const fn is_valid(&self) -> bool {
        self.read <= Self::MAX && self.write <= Self::MAX
    }
}

/// Read/write multi-outstanding limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoLimit {
    /// Max outstanding reads
    pub read: u16,
    /// Max outstanding writes
    pub write: u16,
}

impl MoLimit {
    /// Largest limit both layouts can encode
    pub const MAX: u16 = MO_FIELD_MASK as u16;

    /// Same limit on both channels
    pub const fn splat(value: u16) -> Self {
        Self { read: value, write: value }
    }

    /// Distinct channel limits
    pub const fn new(read: u16, write: u16) -> Self {
        Self { read, write }
    }

    /// Limits are non-zero and encodable
    pub const fn is_valid(&self) -> bool {
        self.read != 0 && self.write != 0 && self.read <= Self::MAX && self.write <= Self::MAX
    }
}

/// Bandwidth window/token pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BwWindow {
    /// Window length in bus cycles
    pub window: u32,
    /// Tokens granted per window
    pub token: u32,
}

// =============================================================================
// BTS V2.1 SEQUENCES
// =============================================================================

#[inline]
fn bank_write(io: &dyn RegisterIo, reg: usize, read: u32, write: u32) {
    io.write32(BTS_READ_BANK + reg, read);
    io.write32(BTS_WRITE_BANK + reg, write);
}

#[inline]
fn bts_quiesce(io: &dyn RegisterIo) {
    bank_write(io, QOS_CONTROL, 0, 0);
}

/// Program priority only
pub fn set_priority(io: &dyn RegisterIo, prio: QosPriority) {
    log::trace!("BTS: priority r{:#x} w{:#x}", prio.read, prio.write);
    bts_quiesce(io);
    bank_write(io, PRIORITY, prio.read as u32, prio.write as u32);
    let ctrl = QosControl::QOS_ON.bits();
    bank_write(io, QOS_CONTROL, ctrl, ctrl);
}

/// Program priority plus window/token bandwidth limiting
///
/// Bandwidth shaping is not validated on this SoC; the sequence is kept as
/// an empty stub so the scenario tables can still name it.
pub fn set_priority_bw(_io: &dyn RegisterIo, prio: QosPriority, bw: BwWindow) {
    log::trace!(
        "BTS: bandwidth shaping skipped (r{:#x} w{:#x} window {} token {})",
        prio.read,
        prio.write,
        bw.window,
        bw.token
    );
}

/// Program priority and MO limits into a BTS v2.1 block
pub fn set_priority_mo_bts(io: &dyn RegisterIo, prio: QosPriority, mo: MoLimit) {
    log::trace!(
        "BTS: priority r{:#x} w{:#x} mo r{} w{}",
        prio.read,
        prio.write,
        mo.read,
        mo.write
    );
    bts_quiesce(io);
    bank_write(io, PRIORITY, prio.read as u32, prio.write as u32);
    bank_write(io, ISSUE_CAP_UPPER, mo.read as u32, mo.write as u32);
    let ctrl = (QosControl::QOS_ON | QosControl::MO_LIMIT).bits();
    bank_write(io, QOS_CONTROL, ctrl, ctrl);
}

/// Restore the BTS v2.1 block to its reset state
pub fn disable(io: &dyn RegisterIo) {
    log::trace!("BTS: reset shaper");
    bts_quiesce(io);
    bank_write(io, PRIORITY, RESET_PRIORITY, RESET_PRIORITY);
    bank_write(io, TOKEN_MAX, RESET_TOKEN_MAX, RESET_TOKEN_MAX);
    bank_write(io, DEFAULT_WINDOW, 0, 0);
    bank_write(io, DEFAULT_TOKEN, 0, 0);
    bank_write(io, ISSUE_CAP_UPPER, RESET_ISSUE_CAP, RESET_ISSUE_CAP);
    bank_write(io, ISSUE_CAP_LOWER, 0, 0);
    bank_write(io, BLOCKING_CONTROL, 0, 0);
}

// =============================================================================
// SYSREG SEQUENCES
// =============================================================================

const fn sysreg_qos_word(prio: QosPriority) -> u32 {
    ((prio.read as u32 & 0xF) << ARQOS_SHIFT)
        | ((prio.write as u32 & 0xF) << AWQOS_SHIFT)
        | ARQOS_EN
        | AWQOS_EN
}

const fn sysreg_mo_word(mo: MoLimit) -> u32 {
    ((mo.read as u32 & MO_FIELD_MASK) << ARMO_SHIFT)
        | ((mo.write as u32 & MO_FIELD_MASK) << AWMO_SHIFT)
}

/// Program priority only into a sysreg endpoint
pub fn set_priority_sysreg(io: &dyn RegisterIo, prio: QosPriority) {
    log::trace!("BTS: sysreg priority r{:#x} w{:#x}", prio.read, prio.write);
    io.write32(SYSREG_QOS, sysreg_qos_word(prio));
}

/// Program priority and MO limits into a sysreg endpoint
pub fn set_priority_mo_sysreg(io: &dyn RegisterIo, prio: QosPriority, mo: MoLimit) {
    log::trace!(
        "BTS: sysreg priority r{:#x} w{:#x} mo r{} w{}",
        prio.read,
        prio.write,
        mo.read,
        mo.write
    );
    io.write32(SYSREG_QOS, 0);
    io.write32(SYSREG_MO, sysreg_mo_word(mo));
    io.write32(SYSREG_QOS, sysreg_qos_word(prio));
}

/// Hand a sysreg endpoint back to the bus default
pub fn disable_sysreg(io: &dyn RegisterIo) {
    log::trace!("BTS: sysreg reset");
    io.write32(SYSREG_QOS, 0);
    io.write32(SYSREG_MO, 0);
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmio::RecordingIo;

    #[test]
    fn test_priority_sequence_enables_last() {
        let io = RecordingIo::new();
        set_priority(&io, QosPriority::new(0xA, 0x6));

        let writes = io.writes();
        assert_eq!(writes[0], (BTS_READ_BANK + QOS_CONTROL, 0));
        assert_eq!(writes[1], (BTS_WRITE_BANK + QOS_CONTROL, 0));
        assert_eq!(io.value(BTS_READ_BANK + PRIORITY), Some(0xA));
        assert_eq!(io.value(BTS_WRITE_BANK + PRIORITY), Some(0x6));
        assert_eq!(writes.last(), Some(&(BTS_WRITE_BANK + QOS_CONTROL, 1)));
    }

    #[test]
    fn test_bandwidth_stub_touches_nothing() {
        let io = RecordingIo::new();
        set_priority_bw(&io, QosPriority::splat(0xC), BwWindow { window: 0x100, token: 0x40 });
        assert_eq!(io.write_count(), 0);
    }

    #[test]
    fn test_mo_sequence_bts_block() {
        let io = RecordingIo::new();
        set_priority_mo_bts(&io, QosPriority::splat(0x8), MoLimit::new(0x10, 0x8));
        assert_eq!(io.value(BTS_READ_BANK + ISSUE_CAP_UPPER), Some(0x10));
        assert_eq!(io.value(BTS_WRITE_BANK + ISSUE_CAP_UPPER), Some(0x8));
        assert_eq!(io.value(BTS_READ_BANK + QOS_CONTROL), Some(0b11));
    }

    #[test]
    fn test_mo_sequence_sysreg() {
        let io = RecordingIo::new();
        set_priority_mo_sysreg(&io, QosPriority::new(0x3, 0x5), MoLimit::new(0x20, 0x04));
        assert_eq!(io.value(SYSREG_MO), Some(0x0420));
        assert_eq!(io.value(SYSREG_QOS), Some(0x53 | ARQOS_EN | AWQOS_EN));
        assert_eq!(io.writes()[0], (SYSREG_QOS, 0));
    }

    #[test]
    fn test_disable_restores_reset_values() {
        let io = RecordingIo::new();
        set_priority_mo_bts(&io, QosPriority::splat(0xF), MoLimit::splat(0x2));
        disable(&io);
        assert_eq!(io.value(BTS_READ_BANK + QOS_CONTROL), Some(0));
        assert_eq!(io.value(BTS_WRITE_BANK + PRIORITY), Some(RESET_PRIORITY));
        assert_eq!(io.value(BTS_READ_BANK + ISSUE_CAP_UPPER), Some(RESET_ISSUE_CAP));

        disable_sysreg(&io);
        assert_eq!(io.value(SYSREG_QOS), Some(0));
    }

    #[test]
    fn test_value_validation() {
        assert!(QosPriority::splat(QosPriority::MAX).is_valid());
        assert!(!QosPriority::new(0x10, 0).is_valid());
        assert!(MoLimit::splat(1).is_valid());
        assert!(!MoLimit::splat(0).is_valid());
        assert!(!MoLimit::new(0x100, 1).is_valid());
    }
}
