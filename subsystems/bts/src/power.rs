//! # Power-Domain Lifecycle
//!
//! Platform power management reports every domain transition. Shapers in
//! a domain lose their registers while it is off, so on power-on the
//! engine pushes each IP's policy scenario and writes the resulting top
//! exactly once; on power-off it marks the IP unpowered before pulling
//! the scenario, so nothing is written to a dead block.
//!
//! ```text
//!   power on                          power off
//!   ────────                          ─────────
//!   add(policy(ip))  (ip still off)   on = false
//!   if !on:                           remove(policy(ip))
//!       on = true
//!       program(top)
//! ```

use crate::action::program_hardware;
use crate::ip::{IpDescriptor, IpIndex};
use crate::scenario::ScenarioId;
use crate::stack::{StackState, Target};

// =============================================================================
// POLICY
// =============================================================================

/// Picks the scenario an IP runs in while its domain is on
pub trait ScenarioPolicy: Send + Sync {
    /// Scenario for `ip`
    fn scenario_for(&self, ip: &IpDescriptor) -> ScenarioId;
}

/// Every IP runs the default scenario
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl ScenarioPolicy for DefaultPolicy {
    fn scenario_for(&self, _ip: &IpDescriptor) -> ScenarioId {
        ScenarioId::Default
    }
}

impl<F> ScenarioPolicy for F
where
    F: Fn(&IpDescriptor) -> ScenarioId + Send + Sync,
{
    fn scenario_for(&self, ip: &IpDescriptor) -> ScenarioId {
        self(ip)
    }
}

// =============================================================================
// TRANSITIONS
// =============================================================================

impl StackState {
    /// Apply a power transition of `pd_name`; returns the number of IPs in
    /// the domain
    pub fn power_transition(
        &mut self,
        pd_name: &str,
        on: bool,
        policy: &dyn ScenarioPolicy,
    ) -> usize {
        let mut matched = 0;

        for i in 0..self.ips.len() {
            if !self.ips[i].in_domain(pd_name) {
                continue;
            }
            matched += 1;
            log::debug!("BTS: {} on/off {} -> {}", self.ips[i].name, self.ips[i].on, on);

            if !self.ips[i].enable {
                self.ips[i].on = on;
                continue;
            }

            let scen = policy.scenario_for(&self.ips[i]);
            if on {
                self.power_on_ip(IpIndex::new(i), scen);
            } else {
                self.ips[i].on = false;
                self.remove_scenario(scen, Target::Ip(IpIndex::new(i)));
            }
        }

        if matched == 0 {
            log::debug!("BTS: no ip in power domain '{}'", pd_name);
        }
        matched
    }

    /// Bring up always-on IPs: they have no domain callback
    pub fn power_on_always_on(&mut self, policy: &dyn ScenarioPolicy) {
        for i in 0..self.ips.len() {
            if self.ips[i].pd_name.is_some() {
                continue;
            }
            if !self.ips[i].enable {
                self.ips[i].on = true;
                continue;
            }
            let scen = policy.scenario_for(&self.ips[i]);
            self.power_on_ip(IpIndex::new(i), scen);
        }
    }

    /// Push `scen` while still unpowered, then write the top once if the
    /// IP was off
    fn power_on_ip(&mut self, idx: IpIndex, scen: ScenarioId) {
        self.add_scenario(scen, Target::Ip(idx));
        let ip = &mut self.ips[idx.index()];
        if !ip.on {
            ip.on = true;
            let top = ip.top_scen;
            program_hardware(ip, top);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::IpId;
    use crate::scenario::ScenarioRegistry;
    use crate::stack::tests::{assert_stack_invariants, test_ip};
    use arrayvec::ArrayVec;
    use exynos_hal::RecordingIo;

    fn state() -> (StackState, [RecordingIo; 2]) {
        let ios = [RecordingIo::new(), RecordingIo::new()];
        let mut ips = ArrayVec::new();
        let mut isp = test_ip(IpId::ISP0, "isp0", &ios[0]);
        isp.pd_name = Some("pd-isp");
        let mut g3d = test_ip(IpId::G3D, "g3d", &ios[1]);
        g3d.pd_name = Some("pd-g3d");
        ips.push(isp);
        ips.push(g3d);
        (StackState::new(ips, ScenarioRegistry::new(|_| IpId::empty())), ios)
    }

    #[test]
    fn test_power_on_programs_once() {
        let (mut state, ios) = state();

        assert_eq!(state.power_transition("pd-isp", true, &DefaultPolicy), 1);
        let isp = &state.ips[0];
        assert!(isp.is_on());
        assert_eq!(isp.top(), ScenarioId::Default);
        assert_eq!(isp.programmed(), 1);
        assert_eq!(isp.current(), Some(ScenarioId::Default));
        assert_eq!(ios[1].write_count(), 0);
        assert!(!state.ips[1].is_on());
    }

    #[test]
    fn test_power_cycle_reapplies_surviving_top() {
        let (mut state, _ios) = state();
        let isp = Target::Ip(IpIndex::new(0));

        state.power_transition("pd-isp", true, &DefaultPolicy);
        state.add_scenario(ScenarioId::CamBns, isp);
        assert_eq!(state.ips[0].programmed(), 2);

        state.power_transition("pd-isp", false, &DefaultPolicy);
        assert!(!state.ips[0].is_on());
        assert_eq!(state.ips[0].top(), ScenarioId::CamBns);
        assert_eq!(state.ips[0].programmed(), 2);

        // Scenario changes while off are tracked but not written.
        state.remove_scenario(ScenarioId::CamBns, isp);
        state.add_scenario(ScenarioId::Debug, isp);
        assert_eq!(state.ips[0].programmed(), 2);

        state.power_transition("pd-isp", true, &DefaultPolicy);
        let ip = &state.ips[0];
        assert_eq!(ip.top(), ScenarioId::Debug);
        assert_eq!(ip.programmed(), 3);
        assert_eq!(ip.current(), Some(ScenarioId::Debug));
        assert_stack_invariants(ip);
    }

    #[test]
    fn test_repeated_power_on_is_idempotent() {
        let (mut state, ios) = state();
        state.power_transition("pd-g3d", true, &DefaultPolicy);
        let writes = ios[1].write_count();

        state.power_transition("pd-g3d", true, &DefaultPolicy);
        assert_eq!(ios[1].write_count(), writes);
        assert_eq!(state.ips[1].programmed(), 1);
    }

    #[test]
    fn test_power_off_writes_nothing() {
        let (mut state, ios) = state();
        state.power_transition("pd-g3d", true, &DefaultPolicy);
        ios[1].clear_log();

        state.power_transition("pd-g3d", false, &DefaultPolicy);
        assert_eq!(ios[1].write_count(), 0);
        assert_eq!(state.ips[1].top(), ScenarioId::Disable);
    }

    #[test]
    fn test_disabled_ip_tracks_power_only() {
        let (mut state, ios) = state();
        state.ips[0].enable = false;

        state.power_transition("pd-isp", true, &DefaultPolicy);
        assert!(state.ips[0].is_on());
        assert_eq!(state.ips[0].top(), ScenarioId::Disable);
        assert_eq!(ios[0].write_count(), 0);
    }

    #[test]
    fn test_custom_policy() {
        let (mut state, _ios) = state();
        let policy = |ip: &IpDescriptor| {
            if ip.id() == IpId::ISP0 {
                ScenarioId::CamBns
            } else {
                ScenarioId::Default
            }
        };

        state.power_transition("pd-", true, &policy);
        assert_eq!(state.ips[0].top(), ScenarioId::CamBns);
        assert_eq!(state.ips[1].top(), ScenarioId::Default);
    }

    #[test]
    fn test_unknown_or_empty_domain() {
        let (mut state, ios) = state();
        assert_eq!(state.power_transition("pd-mfcmscl", true, &DefaultPolicy), 0);
        assert_eq!(state.power_transition("", true, &DefaultPolicy), 0);
        assert!(ios.iter().all(|io| io.write_count() == 0));
    }

    #[test]
    fn test_always_on_bring_up() {
        let (mut state, _ios) = state();
        state.ips[1].pd_name = None;

        state.power_on_always_on(&DefaultPolicy);
        assert!(!state.ips[0].is_on());
        assert!(state.ips[1].is_on());
        assert_eq!(state.ips[1].programmed(), 1);
    }
}
