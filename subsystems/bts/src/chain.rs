//! # Scenario Chaining
//!
//! Group scenarios apply to every IP in their membership mask. The IPs of
//! a scenario are threaded into a ring through their `next_ip` records in
//! arena order, and the registry remembers the first one:
//!
//! ```text
//!   registry[CamBns].head ──▶ decon ──▶ isp0 ──▶ isp1 ──┐
//!                               ▲                       │
//!                               └───────────────────────┘
//! ```
//!
//! Rings are rebuilt whenever a membership mask changes, before any add or
//! remove that walks them.

use arrayvec::ArrayVec;

use crate::ip::IpIndex;
use crate::scenario::ScenarioId;
use crate::stack::StackState;
use crate::MAX_IPS;

impl StackState {
    /// Rethread `scen`'s ring from its membership mask
    pub fn rebuild_chain(&mut self, scen: ScenarioId) {
        let members = self.registry.members(scen);
        let mut first: Option<IpIndex> = None;
        let mut last: Option<IpIndex> = None;

        for ip in self.ips.iter_mut() {
            ip.entry_mut(scen).next_ip = None;
        }

        for i in 0..self.ips.len() {
            if !members.intersects(self.ips[i].id) {
                continue;
            }
            let idx = IpIndex::new(i);
            match last {
                Some(prev) => self.ips[prev.index()].entry_mut(scen).next_ip = Some(idx),
                None => first = Some(idx),
            }
            last = Some(idx);
        }

        if let (Some(first), Some(last)) = (first, last) {
            self.ips[last.index()].entry_mut(scen).next_ip = Some(first);
        }
        self.registry.set_head(scen, first);

        log::debug!("BTS: {} chained {:#x}", scen.name(), members.bits());
    }

    /// Rethread every scenario's ring
    pub fn rebuild_all_chains(&mut self) {
        for scen in ScenarioId::ALL {
            self.rebuild_chain(scen);
        }
    }

    /// Ring members of `scen`, starting at the head
    pub fn chain(&self, scen: ScenarioId) -> ArrayVec<IpIndex, MAX_IPS> {
        let mut out = ArrayVec::new();
        let Some(first) = self.registry.head(scen) else {
            return out;
        };
        let mut cur = first;
        while !out.is_full() {
            out.push(cur);
            match self.ips[cur.index()].entry(scen).next_ip {
                Some(next) if next != first => cur = next,
                _ => break,
            }
        }
        out
    }
}

// =============================================================================
// TESTS
// =============================================================================
