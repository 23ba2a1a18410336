//! # Hardware Actions
//!
//! What a scenario record does to the shaper when it reaches the top of an
//! IP's stack. Dispatch is an exhaustive match; the register layout of the
//! descriptor picks between the BTS v2.1 block and the sysreg sequences.

use exynos_hal::qos::{self, RESET_PRIORITY};
use exynos_hal::{BwWindow, MoLimit, QosPriority};

use crate::ip::IpDescriptor;
use crate::scenario::ScenarioId;

// =============================================================================
// ACTIONS
// =============================================================================

/// Programming variant of a scenario record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareAction {
    /// Priority only
    SetPriority(QosPriority),
    /// Priority plus window/token shaping
    SetPriorityAndBandwidth(QosPriority, BwWindow),
    /// Priority plus multi-outstanding limits
    SetPriorityAndMo(QosPriority, MoLimit),
    /// Full reset to hardware defaults
    Disable,
    /// Leave the hardware alone
    Nop,
}

impl HardwareAction {
    /// Priority written by this action
    pub const fn priority(&self) -> Option<QosPriority> {
        match self {
            Self::SetPriority(p)
            | Self::SetPriorityAndBandwidth(p, _)
            | Self::SetPriorityAndMo(p, _) => Some(*p),
            Self::Disable | Self::Nop => None,
        }
    }

    /// MO limits written by this action
    pub const fn mo(&self) -> Option<MoLimit> {
        match self {
            Self::SetPriorityAndMo(_, mo) => Some(*mo),
            _ => None,
        }
    }

    /// Same action with a new priority
    pub fn with_priority(self, prio: QosPriority) -> Self {
        match self {
            Self::SetPriority(_) | Self::Disable | Self::Nop => Self::SetPriority(prio),
            Self::SetPriorityAndBandwidth(_, bw) => Self::SetPriorityAndBandwidth(prio, bw),
            Self::SetPriorityAndMo(_, mo) => Self::SetPriorityAndMo(prio, mo),
        }
    }

    /// Same action with MO limiting; actions without a priority keep the
    /// reset priority
    pub fn with_mo(self, mo: MoLimit) -> Self {
        let prio = self
            .priority()
            .unwrap_or(QosPriority::splat(RESET_PRIORITY as u8));
        Self::SetPriorityAndMo(prio, mo)
    }
}

// =============================================================================
// REGISTER LAYOUT
// =============================================================================

/// Where an endpoint keeps its QoS fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterLayout {
    /// Dedicated BTS v2.1 block
    BtsV21,
    /// Fields in the owning block's system registers
    Sysreg,
}

impl RegisterLayout {
    /// Bytes the register window must cover
    pub const fn window_len(self) -> usize {
        match self {
            Self::BtsV21 => qos::BTS_WINDOW_LEN,
            Self::Sysreg => qos::SYSREG_WINDOW_LEN,
        }
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Write `scen`'s record of `ip` to hardware
///
/// Callers hold the stack lock and have checked that the IP is powered.
pub(crate) fn program_hardware(ip: &mut IpDescriptor, scen: ScenarioId) {
    let action = ip.entry(scen).action;
    let io = &*ip.io;

    match (action, ip.layout) {
        (HardwareAction::SetPriority(prio), RegisterLayout::BtsV21) => {
            qos::set_priority(io, prio);
        },
        (HardwareAction::SetPriority(prio), RegisterLayout::Sysreg) => {
            qos::set_priority_sysreg(io, prio);
        },
        (HardwareAction::SetPriorityAndBandwidth(prio, bw), _) => {
            qos::set_priority_bw(io, prio, bw);
        },
        (HardwareAction::SetPriorityAndMo(prio, mo), RegisterLayout::BtsV21) => {
            qos::set_priority_mo_bts(io, prio, mo);
        },
        (HardwareAction::SetPriorityAndMo(prio, mo), RegisterLayout::Sysreg) => {
            qos::set_priority_mo_sysreg(io, prio, mo);
        },
        (HardwareAction::Disable, RegisterLayout::BtsV21) => qos::disable(io),
        (HardwareAction::Disable, RegisterLayout::Sysreg) => qos::disable_sysreg(io),
        (HardwareAction::Nop, _) => {},
    }

    log::debug!("BTS: {} programmed {}", ip.name, scen.name());
    ip.cur_scen = Some(scen);
    ip.programmed += 1;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::{IpId, IpInfo};
    use alloc::boxed::Box;
    use exynos_hal::qos::{
        BTS_READ_BANK, BTS_WRITE_BANK, ISSUE_CAP_UPPER, PRIORITY, SYSREG_MO, SYSREG_WINDOW_LEN,
    };
    use exynos_hal::RecordingIo;

    fn descriptor(layout: RegisterLayout, io: &RecordingIo) -> IpDescriptor {
        let info = IpInfo {
            id: IpId::ISP0,
            name: "isp0",
            pd_name: Some("pd-isp"),
            base: 0x1440_0000,
            actions: [
                HardwareAction::Disable,
                HardwareAction::SetPriorityAndMo(QosPriority::splat(0x8), MoLimit::splat(0x10)),
                HardwareAction::SetPriorityAndBandwidth(
                    QosPriority::splat(0xC),
                    BwWindow { window: 0x200, token: 0x80 },
                ),
                HardwareAction::Nop,
            ],
        };
        IpDescriptor::new(&info, layout, Box::new(io.clone()), true)
    }

    #[test]
    fn test_mo_dispatch_by_layout() {
        let io = RecordingIo::new();
        let mut ip = descriptor(RegisterLayout::BtsV21, &io);
        program_hardware(&mut ip, ScenarioId::Default);
        assert_eq!(io.value(BTS_READ_BANK + ISSUE_CAP_UPPER), Some(0x10));
        assert_eq!(io.value(BTS_WRITE_BANK + ISSUE_CAP_UPPER), Some(0x10));

        let io = RecordingIo::new();
        let mut ip = descriptor(RegisterLayout::Sysreg, &io);
        program_hardware(&mut ip, ScenarioId::Default);
        assert_eq!(io.value(SYSREG_MO), Some(0x1010));
        // The sysreg sequence stays inside its small window.
        assert!(io.writes().iter().all(|(offset, _)| *offset < SYSREG_WINDOW_LEN));
        assert_eq!(io.value(BTS_WRITE_BANK + ISSUE_CAP_UPPER), None);
    }

    #[test]
    fn test_stub_and_nop_still_account() {
        let io = RecordingIo::new();
        let mut ip = descriptor(RegisterLayout::BtsV21, &io);

        program_hardware(&mut ip, ScenarioId::CamBns);
        assert_eq!(io.write_count(), 0);
        assert_eq!(ip.current(), Some(ScenarioId::CamBns));

        program_hardware(&mut ip, ScenarioId::Debug);
        assert_eq!(io.write_count(), 0);
        assert_eq!(ip.current(), Some(ScenarioId::Debug));
        assert_eq!(ip.programmed(), 2);
    }

    #[test]
    fn test_disable_dispatch() {
        let io = RecordingIo::new();
        let mut ip = descriptor(RegisterLayout::BtsV21, &io);
        program_hardware(&mut ip, ScenarioId::Disable);
        assert_eq!(io.value(BTS_READ_BANK + PRIORITY), Some(RESET_PRIORITY));
    }

    #[test]
    fn test_action_editing() {
        let prio = QosPriority::splat(0x9);
        let mo = MoLimit::splat(0x20);

        assert_eq!(HardwareAction::Nop.with_priority(prio), HardwareAction::SetPriority(prio));
        assert_eq!(
            HardwareAction::SetPriority(prio).with_mo(mo),
            HardwareAction::SetPriorityAndMo(prio, mo)
        );
        assert_eq!(
            HardwareAction::Disable.with_mo(mo).priority(),
            Some(QosPriority::splat(RESET_PRIORITY as u8))
        );
        assert_eq!(HardwareAction::SetPriority(prio).mo(), None);
        assert_eq!(HardwareAction::Disable.priority(), None);
    }

    #[test]
    fn test_window_len() {
        assert!(RegisterLayout::BtsV21.window_len() > RegisterLayout::Sysreg.window_len());
    }
}
