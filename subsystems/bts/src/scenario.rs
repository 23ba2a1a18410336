//! # Scenarios
//!
//! A scenario is a named QoS profile. Every IP descriptor carries one
//! action record per scenario, and the scenario registry tracks which IPs
//! take part in each scenario and where that scenario's IP ring starts.
//!
//! ## Ranking
//!
//! ```text
//!   rank
//!    ▲
//!    │  Debug    (always outranks everything)
//!    │  CamBns   2
//!    │  Default  1
//!    │  Disable  0  ◀── permanent floor of every stack
//!    └──────────────
//! ```

use crate::ip::{IpId, IpIndex};

// =============================================================================
// SCENARIO IDS
// =============================================================================

/// Number of scenarios
pub const SCENARIO_COUNT: usize = 4;

/// Scenario identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ScenarioId {
    /// Hardware reset values; floor of every stack
    Disable = 0,
    /// Normal operation
    Default = 1,
    /// Camera bayer-scaler bypass
    CamBns  = 2,
    /// Debug override
    Debug   = 3,
}

impl ScenarioId {
    /// All scenarios in table order
    pub const ALL: [ScenarioId; SCENARIO_COUNT] = [
        ScenarioId::Disable,
        ScenarioId::Default,
        ScenarioId::CamBns,
        ScenarioId::Debug,
    ];

    /// Table index
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Scenario at table index
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Disable),
            1 => Some(Self::Default),
            2 => Some(Self::CamBns),
            3 => Some(Self::Debug),
            _ => None,
        }
    }

    /// Scenario name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Disable => "bts_disable",
            Self::Default => "bts_default",
            Self::CamBns => "bts_cam_bns",
            Self::Debug => "bts_debug",
        }
    }

    /// Stack ordering key
    #[inline]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Debug => u8::MAX,
            other => other as u8,
        }
    }
}

// =============================================================================
// SCENARIO TYPES
// =============================================================================

/// Scenarios media drivers toggle through `scen_update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioType {
    /// Camera running with the bayer scaler bypassed
    CamBns,
}

impl ScenarioType {
    /// Scenario toggled by this type
    pub const fn scenario(self) -> ScenarioId {
        match self {
            Self::CamBns => ScenarioId::CamBns,
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Registry entry for one scenario
#[derive(Debug, Clone, Copy)]
pub struct ScenarioInfo {
    /// IPs taking part in the scenario
    pub members: IpId,
    /// First IP of the scenario's ring
    pub head: Option<IpIndex>,
}

/// Scenario membership and ring heads
#[derive(Debug, Clone)]
pub struct ScenarioRegistry {
    scen: [ScenarioInfo; SCENARIO_COUNT],
}

impl ScenarioRegistry {
    /// Build a registry from a membership table
    pub fn new(members: fn(ScenarioId) -> IpId) -> Self {
        Self {
            scen: ScenarioId::ALL.map(|s| ScenarioInfo { members: members(s), head: None }),
        }
    }

    /// Registry entry
    #[inline]
    pub fn get(&self, scen: ScenarioId) -> &ScenarioInfo {
        &self.scen[scen.index()]
    }

    /// Membership mask
    #[inline]
    pub fn members(&self, scen: ScenarioId) -> IpId {
        self.scen[scen.index()].members
    }

    /// Replace the membership mask; the ring must be rebuilt afterwards
    #[inline]
    pub fn set_members(&mut self, scen: ScenarioId, members: IpId) {
        self.scen[scen.index()].members = members;
    }

    /// Ring head
    #[inline]
    pub fn head(&self, scen: ScenarioId) -> Option<IpIndex> {
        self.scen[scen.index()].head
    }

    #[inline]
    pub(crate) fn set_head(&mut self, scen: ScenarioId, head: Option<IpIndex>) {
        self.scen[scen.index()].head = head;
    }
}

// =============================================================================
// TESTS
// =============================================================================
