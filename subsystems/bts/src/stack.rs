//! # Scenario Stack Engine
//!
//! Every IP keeps its active scenarios in a doubly linked stack ordered by
//! rank. Only the top is ever written to hardware, so adds and removes
//! reprogram an IP exactly when its top changes, and only while the IP's
//! power domain is on.
//!
//! ## Add
//!
//! ```text
//!   rank(new) >= rank(top)             rank(new) < rank(top)
//!   ──────────────────────             ─────────────────────
//!        new   ◀── top                     top
//!         │                                 │
//!        top                               upper
//!         │                                 │
//!        ...                               new   ◀── spliced, no write
//!                                           │
//!   reprogram if powered                   lower
//! ```
//!
//! ## Remove
//!
//! Removing the top promotes its `prev`; removing a lower record splices
//! it out without touching hardware. A record ranked above the top cannot
//! exist; finding one is logged and ignored.

use arrayvec::ArrayVec;

use crate::action::program_hardware;
use crate::ip::{IpDescriptor, IpIndex, StackLink};
use crate::scenario::{ScenarioId, ScenarioRegistry};
use crate::MAX_IPS;

// =============================================================================
// TARGETS
// =============================================================================

/// Which descriptors an add or remove applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A single descriptor
    Ip(IpIndex),
    /// Every descriptor in the scenario's ring
    Chain,
}

// =============================================================================
// STACK STATE
// =============================================================================

/// Everything guarded by the stack lock
#[derive(Debug)]
pub struct StackState {
    pub(crate) ips: ArrayVec<IpDescriptor, MAX_IPS>,
    pub(crate) registry: ScenarioRegistry,
}

impl StackState {
    /// Wrap a populated arena; scenario rings still need building
    pub fn new(ips: ArrayVec<IpDescriptor, MAX_IPS>, registry: ScenarioRegistry) -> Self {
        Self { ips, registry }
    }

    /// Descriptor arena
    #[inline]
    pub fn ips(&self) -> &[IpDescriptor] {
        &self.ips
    }

    /// Descriptor by handle
    #[inline]
    pub fn ip(&self, idx: IpIndex) -> Option<&IpDescriptor> {
        self.ips.get(idx.index())
    }

    /// Scenario registry
    #[inline]
    pub fn registry(&self) -> &ScenarioRegistry {
        &self.registry
    }

    /// Handle of the descriptor called `name`
    pub fn find(&self, name: &str) -> Option<IpIndex> {
        self.ips
            .iter()
            .position(|ip| ip.name == name)
            .map(IpIndex::new)
    }

    /// Push `scen` onto every targeted stack
    pub fn add_scenario(&mut self, scen: ScenarioId, target: Target) {
        self.for_each_target(scen, target, |ip| add_scen(ip, scen));
    }

    /// Pull `scen` off every targeted stack
    pub fn remove_scenario(&mut self, scen: ScenarioId, target: Target) {
        self.for_each_target(scen, target, |ip| del_scen(ip, scen));
    }

    fn for_each_target<F>(&mut self, scen: ScenarioId, target: Target, mut f: F)
    where
        F: FnMut(&mut IpDescriptor),
    {
        match target {
            Target::Ip(idx) => {
                if let Some(ip) = self.ips.get_mut(idx.index()) {
                    f(ip);
                }
            },
            Target::Chain => {
                let Some(first) = self.registry.head(scen) else {
                    return;
                };
                let mut cur = first;
                // A ring visits each descriptor once; the bound only guards
                // against a corrupted ring.
                for _ in 0..self.ips.len() {
                    let Some(ip) = self.ips.get_mut(cur.index()) else {
                        break;
                    };
                    f(ip);
                    match ip.entry(scen).next_ip {
                        Some(next) if next != first => cur = next,
                        _ => break,
                    }
                }
            },
        }
    }
}

// =============================================================================
// PER-DESCRIPTOR OPERATIONS
// =============================================================================

fn add_scen(ip: &mut IpDescriptor, scen: ScenarioId) {
    if !ip.enable || ip.entry(scen).is_linked() {
        return;
    }

    let top = ip.top_scen;
    if scen.rank() >= top.rank() {
        ip.entry_mut(scen).prev = top;
        ip.entry_mut(top).next = StackLink::Above(scen);
        ip.entry_mut(scen).next = StackLink::Top;
        ip.top_scen = scen;

        log::debug!("BTS: {} top {} -> {}", ip.name, top.name(), scen.name());
        if ip.on {
            program_hardware(ip, scen);
        }
    } else {
        let mut upper = top;
        let mut lower = ip.entry(top).prev;
        while lower.rank() > scen.rank() {
            upper = lower;
            lower = ip.entry(lower).prev;
        }

        ip.entry_mut(scen).prev = lower;
        ip.entry_mut(scen).next = StackLink::Above(upper);
        ip.entry_mut(upper).prev = scen;
        ip.entry_mut(lower).next = StackLink::Above(scen);

        log::debug!("BTS: {} queued {} below {}", ip.name, scen.name(), upper.name());
    }
}

fn del_scen(ip: &mut IpDescriptor, scen: ScenarioId) {
    if !ip.enable || scen == ScenarioId::Disable {
        return;
    }

    match ip.entry(scen).next {
        StackLink::Absent => {},
        StackLink::Top => {
            let prev = ip.entry(scen).prev;
            ip.top_scen = prev;
            ip.entry_mut(prev).next = StackLink::Top;
            clear_links(ip, scen);

            log::debug!("BTS: {} top {} -> {}", ip.name, scen.name(), prev.name());
            // An emptied stack is left as is, like a powered-off domain.
            if ip.on && prev != ScenarioId::Disable {
                program_hardware(ip, prev);
            }
        },
        StackLink::Above(upper) if scen.rank() < ip.top_scen.rank() => {
            let lower = ip.entry(scen).prev;
            ip.entry_mut(upper).prev = lower;
            ip.entry_mut(lower).next = StackLink::Above(upper);
            clear_links(ip, scen);

            log::debug!("BTS: {} dropped {} below {}", ip.name, scen.name(), upper.name());
        },
        StackLink::Above(_) => {
            log::warn!(
                "BTS: {} {} cannot sit above top {}",
                ip.name,
                scen.name(),
                ip.top_scen.name()
            );
        },
    }
}

#[inline]
fn clear_links(ip: &mut IpDescriptor, scen: ScenarioId) {
    let entry = ip.entry_mut(scen);
    entry.prev = ScenarioId::Disable;
    entry.next = StackLink::Absent;
}

// =============================================================================
// TESTS
// =============================================================================
