//! # Debug Surface
//!
//! Per-IP knobs addressed by name, and text dumps of the whole engine.
//! Priority and MO writes edit the record of the IP's current top and are
//! pushed to hardware only while the IP is powered.

use core::fmt::{self, Write};

use alloc::string::String;

use exynos_hal::{MoLimit, QosPriority};

use crate::action::{program_hardware, HardwareAction};
use crate::error::{BtsError, BtsResult};
use crate::ip::{IpDescriptor, IpIndex};
use crate::scenario::ScenarioId;
use crate::stack::{StackState, Target};
use crate::system::BtsSystem;

impl BtsSystem {
    /// Priority of `name`'s top record; `None` when the top has none
    pub fn priority(&self, name: &str) -> BtsResult<Option<QosPriority>> {
        let state = self.stack.lock();
        let ip = lookup(&state, name)?;
        Ok(ip.entry(ip.top()).action.priority())
    }

    /// Overwrite the priority of `name`'s top record
    pub fn set_priority(&self, name: &str, prio: QosPriority) -> BtsResult<()> {
        if !prio.is_valid() {
            log::warn!("BTS: {} rejected priority {:?}", name, prio);
            return Err(BtsError::InvalidPriority(prio));
        }
        self.edit_top(name, |action| action.with_priority(prio))
    }

    /// MO limits of `name`'s top record; `None` when the top has none
    pub fn mo(&self, name: &str) -> BtsResult<Option<MoLimit>> {
        let state = self.stack.lock();
        let ip = lookup(&state, name)?;
        Ok(ip.entry(ip.top()).action.mo())
    }

    /// Overwrite the MO limits of `name`'s top record
    pub fn set_mo(&self, name: &str, mo: MoLimit) -> BtsResult<()> {
        if !mo.is_valid() {
            log::warn!("BTS: {} rejected mo {:?}", name, mo);
            return Err(BtsError::InvalidMo(mo));
        }
        self.edit_top(name, |action| action.with_mo(mo))
    }

    /// Put `name` into, or take it out of, the debug scenario
    pub fn set_debug_scenario(&self, name: &str, on: bool) -> BtsResult<()> {
        let mut state = self.stack.lock();
        let idx = find(&state, name)?;
        let ip = &state.ips[idx.index()];
        if !ip.enable {
            return Err(BtsError::Disabled(ip.name));
        }

        let id = ip.id;
        let members = state.registry.members(ScenarioId::Debug);
        if on {
            state.registry.set_members(ScenarioId::Debug, members | id);
            state.rebuild_chain(ScenarioId::Debug);
            state.add_scenario(ScenarioId::Debug, Target::Ip(idx));
        } else {
            state.remove_scenario(ScenarioId::Debug, Target::Ip(idx));
            state.registry.set_members(ScenarioId::Debug, members - id);
            state.rebuild_chain(ScenarioId::Debug);
        }
        Ok(())
    }

    /// Table of every IP's power, stack and programming state
    pub fn qos_status(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = write_qos_status(&self.stack.lock(), &mut out);
        out
    }

    /// Dump of the bandwidth aggregator
    pub fn bw_status(&self) -> String {
        self.bandwidth.status()
    }

    fn edit_top<F>(&self, name: &str, edit: F) -> BtsResult<()>
    where
        F: FnOnce(HardwareAction) -> HardwareAction,
    {
        let mut state = self.stack.lock();
        let idx = find(&state, name)?;
        let ip = &mut state.ips[idx.index()];
        if !ip.enable {
            return Err(BtsError::Disabled(ip.name));
        }

        let top = ip.top_scen;
        if top == ScenarioId::Disable {
            return Err(BtsError::NoActiveScenario(ip.name));
        }

        let action = edit(ip.entry(top).action);
        ip.entry_mut(top).action = action;
        log::debug!("BTS: {} {} now {:?}", ip.name, top.name(), action);

        if ip.on {
            program_hardware(ip, top);
        }
        Ok(())
    }
}

fn find(state: &StackState, name: &str) -> BtsResult<IpIndex> {
    state.find(name).ok_or_else(|| BtsError::UnknownIp(name.into()))
}

fn lookup<'a>(state: &'a StackState, name: &str) -> BtsResult<&'a IpDescriptor> {
    let idx = find(state, name)?;
    Ok(&state.ips[idx.index()])
}

fn write_qos_status(state: &StackState, out: &mut impl Write) -> fmt::Result {
    writeln!(
        out,
        "{:<8} {:<3} {:<3} {:<12} {:<12} {:<5} {:<9} {}",
        "ip", "on", "en", "top", "current", "prio", "mo", "active"
    )?;

    for ip in state.ips() {
        let action = ip.entry(ip.top()).action;
        write!(
            out,
            "{:<8} {:<3} {:<3} {:<12} {:<12} ",
            ip.name(),
            ip.is_on() as u8,
            ip.is_enabled() as u8,
            ip.top().name(),
            ip.current().map_or("-", ScenarioId::name),
        )?;
        match action.priority() {
            Some(p) => write!(out, "{:x}/{:<3x} ", p.read, p.write)?,
            None => write!(out, "{:<5} ", "-")?,
        }
        match action.mo() {
            Some(mo) => write!(out, "{:>3}/{:<5} ", mo.read, mo.write)?,
            None => write!(out, "{:<9} ", "-")?,
        }
        for (i, scen) in ip.active_chain().iter().enumerate() {
            if i > 0 {
                out.write_char(',')?;
            }
            out.write_str(scen.name())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BtsConfig;
    use crate::ip::IpId;
    use crate::stack::tests::assert_stack_invariants;
    use crate::system::tests::recorded;
    use exynos_hal::qos::{BTS_READ_BANK, ISSUE_CAP_UPPER, PRIORITY};

    #[test]
    fn test_priority_round_trip() {
        let (system, ios) = recorded(BtsConfig::default());
        system.initialize("pd-dispaud", true);

        assert_eq!(system.priority("decon"), Ok(Some(QosPriority::splat(0xB))));
        system.set_priority("decon", QosPriority::new(0x3, 0x5)).expect("valid write");
        assert_eq!(system.priority("decon"), Ok(Some(QosPriority::new(0x3, 0x5))));
        assert_eq!(ios["decon"].value(BTS_READ_BANK + PRIORITY), Some(0x3));
    }

    #[test]
    fn test_priority_validation() {
        let (system, _ios) = recorded(BtsConfig::default());
        let bad = QosPriority::splat(0x10);
        assert_eq!(system.set_priority("decon", bad), Err(BtsError::InvalidPriority(bad)));
        assert_eq!(
            system.set_priority("npu", QosPriority::splat(1)),
            Err(BtsError::UnknownIp("npu".into()))
        );
        // Domain still off: only the disable floor is stacked.
        assert_eq!(
            system.set_priority("decon", QosPriority::splat(1)),
            Err(BtsError::NoActiveScenario("decon"))
        );
        assert_eq!(system.priority("decon"), Ok(None));
    }

    #[test]
    fn test_write_while_unpowered_applies_on_power_on() {
        let (system, ios) = recorded(BtsConfig::default());
        system.initialize("pd-isp", true);
        system.initialize("pd-isp", false);
        let isp0 = system.ip_index("isp0").expect("known ip");
        system.add_scenario(ScenarioId::Default, Target::Ip(isp0));

        ios["isp0"].clear_log();
        system.set_priority("isp0", QosPriority::splat(0x7)).expect("valid write");
        assert_eq!(ios["isp0"].write_count(), 0);

        system.initialize("pd-isp", true);
        assert_eq!(ios["isp0"].value(BTS_READ_BANK + PRIORITY), Some(0x7));
    }

    #[test]
    fn test_mo_converts_plain_priority() {
        let (system, ios) = recorded(BtsConfig::default());
        system.initialize("pd-mfcmscl", true);
        assert_eq!(system.mo("mfcmscl"), Ok(None));

        system.set_mo("mfcmscl", MoLimit::new(0x8, 0x4)).expect("valid write");
        assert_eq!(system.mo("mfcmscl"), Ok(Some(MoLimit::new(0x8, 0x4))));
        assert_eq!(system.priority("mfcmscl"), Ok(Some(QosPriority::new(0x8, 0x6))));
        assert_eq!(ios["mfcmscl"].value(BTS_READ_BANK + ISSUE_CAP_UPPER), Some(0x8));

        assert_eq!(
            system.set_mo("mfcmscl", MoLimit::splat(0)),
            Err(BtsError::InvalidMo(MoLimit::splat(0)))
        );
    }

    #[test]
    fn test_debug_scenario_single_ip() {
        let (system, _ios) = recorded(BtsConfig::default());
        system.initialize("pd-isp", true);

        system.set_debug_scenario("isp1", true).expect("known ip");
        system.with_state(|state| {
            assert_eq!(state.registry().members(ScenarioId::Debug), IpId::ISP1);
            let isp0 = &state.ips()[1];
            let isp1 = &state.ips()[2];
            assert_eq!(isp0.top(), ScenarioId::Default);
            assert_eq!(isp1.top(), ScenarioId::Debug);
            assert_eq!(isp1.current(), Some(ScenarioId::Debug));
            assert_stack_invariants(isp1);
        });

        system.set_debug_scenario("isp0", true).expect("known ip");
        system.set_debug_scenario("isp1", false).expect("known ip");
        system.with_state(|state| {
            assert_eq!(state.registry().members(ScenarioId::Debug), IpId::ISP0);
            assert_eq!(state.ips()[1].top(), ScenarioId::Debug);
            assert_eq!(state.ips()[2].top(), ScenarioId::Default);
            assert_eq!(state.ips()[2].current(), Some(ScenarioId::Default));
        });
    }

    #[test]
    fn test_debug_on_disabled_system() {
        let (system, _ios) = recorded(BtsConfig::disabled());
        assert_eq!(system.set_debug_scenario("g3d", true), Err(BtsError::Disabled("g3d")));
        assert_eq!(
            system.set_priority("g3d", QosPriority::splat(1)),
            Err(BtsError::Disabled("g3d"))
        );
    }

    #[test]
    fn test_status_dumps() {
        let (system, _ios) = recorded(BtsConfig::default());
        system.initialize("pd-isp", true);
        system.set_debug_scenario("isp0", true).expect("known ip");

        let status = system.qos_status();
        assert!(status.starts_with("ip "));
        let isp0 = status.lines().find(|l| l.starts_with("isp0")).expect("isp0 row");
        assert!(isp0.contains("bts_debug,bts_default"), "{}", isp0);
        let decon = status.lines().find(|l| l.starts_with("decon")).expect("decon row");
        assert!(decon.contains("bts_disable"), "{}", decon);
        assert_eq!(status.lines().count(), crate::soc::IP_TABLE.len() + 1);

        assert!(system.bw_status().contains("mif:"));
    }
}
