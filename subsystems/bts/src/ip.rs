//! # IP Descriptors
//!
//! One descriptor per bus endpoint the shaper can arbitrate. Descriptors
//! live in a fixed arena owned by the system and are addressed by
//! [`IpIndex`] handles; every link between descriptors or between
//! scenario records is an index, never a pointer.
//!
//! ## Per-IP Scenario Stack
//!
//! ```text
//!            table[Debug]   next: Top          ◀── top_scen
//!                 │ prev
//!            table[CamBns]  next: Above(Debug)
//!                 │ prev
//!            table[Default] next: Above(CamBns)
//!                 │ prev
//!            table[Disable] next: Above(Default)  (floor, always linked)
//! ```
//!
//! Records with `next == Absent` are not on the stack. The `next_ip` field
//! is unrelated to the stack: it threads the ring of IPs sharing one
//! scenario.

use core::fmt;

use arrayvec::ArrayVec;
use bitflags::bitflags;
use exynos_hal::RegisterIo;

use alloc::boxed::Box;

use crate::action::{HardwareAction, RegisterLayout};
use crate::scenario::{ScenarioId, SCENARIO_COUNT};

// =============================================================================
// IDENTITY
// =============================================================================

bitflags! {
    /// Identity bits of the arbitrated endpoints
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IpId: u32 {
        /// Display controller
        const DECON   = 1 << 0;
        /// Camera ISP path 0
        const ISP0    = 1 << 1;
        /// Camera ISP path 1
        const ISP1    = 1 << 2;
        /// Codec and scaler
        const MFCMSCL = 1 << 3;
        /// Storage (eMMC/SD)
        const FSYS    = 1 << 4;
        /// Modem interface
        const MODAPIF = 1 << 5;
        /// Modem processor
        const CP      = 1 << 6;
        /// Little CPU cluster
        const CPUCL0  = 1 << 7;
        /// Big CPU cluster
        const CPUCL1  = 1 << 8;
        /// GPU
        const G3D     = 1 << 9;
    }
}

/// Arena handle of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IpIndex(u8);

impl IpIndex {
    /// Handle for arena slot `index`
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index as u8)
    }

    /// Arena slot
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// STATIC DESCRIPTION
// =============================================================================

/// Constant description of one endpoint, as listed in a SoC table
#[derive(Debug, Clone, Copy)]
pub struct IpInfo {
    /// Identity bit
    pub id: IpId,
    /// Name used by the debug surface
    pub name: &'static str,
    /// Power domain; `None` for always-on endpoints
    pub pd_name: Option<&'static str>,
    /// Physical base of the register window
    pub base: usize,
    /// Action per scenario, indexed by `ScenarioId`
    pub actions: [HardwareAction; SCENARIO_COUNT],
}

// =============================================================================
// STACK RECORDS
// =============================================================================

/// Upward link of a scenario record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackLink {
    /// Scenario is not on the stack
    Absent,
    /// Scenario is the top of the stack
    Top,
    /// Next scenario up the stack
    Above(ScenarioId),
}

/// Per-scenario record of one descriptor
#[derive(Debug, Clone, Copy)]
pub struct ScenarioEntry {
    /// Programming applied when this scenario is on top
    pub action: HardwareAction,
    /// Next scenario down the stack
    pub prev: ScenarioId,
    /// Next scenario up the stack
    pub next: StackLink,
    /// Next IP in this scenario's ring
    pub next_ip: Option<IpIndex>,
}

impl ScenarioEntry {
    const fn new(action: HardwareAction) -> Self {
        Self {
            action,
            prev: ScenarioId::Disable,
            next: StackLink::Absent,
            next_ip: None,
        }
    }

    /// Is this scenario on the stack?
    #[inline]
    pub const fn is_linked(&self) -> bool {
        !matches!(self.next, StackLink::Absent)
    }
}

// =============================================================================
// DESCRIPTOR
// =============================================================================

/// Runtime descriptor of one endpoint
pub struct IpDescriptor {
    pub(crate) id: IpId,
    pub(crate) name: &'static str,
    pub(crate) pd_name: Option<&'static str>,
    pub(crate) base: usize,
    pub(crate) layout: RegisterLayout,
    pub(crate) io: Box<dyn RegisterIo + Send>,
    pub(crate) on: bool,
    pub(crate) enable: bool,
    pub(crate) top_scen: ScenarioId,
    pub(crate) cur_scen: Option<ScenarioId>,
    pub(crate) programmed: u64,
    pub(crate) table: [ScenarioEntry; SCENARIO_COUNT],
}

impl IpDescriptor {
    /// Build an unpowered descriptor with an empty stack
    pub fn new(
        info: &IpInfo,
        layout: RegisterLayout,
        io: Box<dyn RegisterIo + Send>,
        enable: bool,
    ) -> Self {
        let mut table = info.actions.map(ScenarioEntry::new);
        table[ScenarioId::Disable.index()].next = StackLink::Top;

        Self {
            id: info.id,
            name: info.name,
            pd_name: info.pd_name,
            base: info.base,
            layout,
            io,
            on: false,
            enable,
            top_scen: ScenarioId::Disable,
            cur_scen: None,
            programmed: 0,
            table,
        }
    }

    /// Identity bit
    #[inline]
    pub fn id(&self) -> IpId {
        self.id
    }

    /// Name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Power domain name
    #[inline]
    pub fn pd_name(&self) -> Option<&'static str> {
        self.pd_name
    }

    /// Physical register base
    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    /// Register layout
    #[inline]
    pub fn layout(&self) -> RegisterLayout {
        self.layout
    }

    /// Is the owning power domain on?
    #[inline]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Is scenario programming enabled?
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enable
    }

    /// Top of the stack
    #[inline]
    pub fn top(&self) -> ScenarioId {
        self.top_scen
    }

    /// Scenario last written to hardware
    #[inline]
    pub fn current(&self) -> Option<ScenarioId> {
        self.cur_scen
    }

    /// Number of hardware programming passes so far
    #[inline]
    pub fn programmed(&self) -> u64 {
        self.programmed
    }

    /// Scenario record
    #[inline]
    pub fn entry(&self, scen: ScenarioId) -> &ScenarioEntry {
        &self.table[scen.index()]
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, scen: ScenarioId) -> &mut ScenarioEntry {
        &mut self.table[scen.index()]
    }

    /// Is `scen` on the stack? The disable floor never counts.
    #[inline]
    pub fn is_active(&self, scen: ScenarioId) -> bool {
        scen != ScenarioId::Disable && self.entry(scen).is_linked()
    }

    /// Active scenarios from the top down, floor excluded
    pub fn active_chain(&self) -> ArrayVec<ScenarioId, SCENARIO_COUNT> {
        let mut chain = ArrayVec::new();
        let mut scen = self.top_scen;
        while scen != ScenarioId::Disable && !chain.is_full() {
            chain.push(scen);
            scen = self.entry(scen).prev;
        }
        chain
    }

    /// Does this descriptor belong to power domain `pd_name`?
    ///
    /// The platform reports domains by prefix, so `pd-isp` matches
    /// `pd-isp` and `pd-isp0`.
    pub fn in_domain(&self, pd_name: &str) -> bool {
        !pd_name.is_empty() && self.pd_name.map_or(false, |pd| pd.starts_with(pd_name))
    }
}

impl fmt::Debug for IpDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpDescriptor")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("pd_name", &self.pd_name)
            .field("base", &format_args!("{:#x}", self.base))
            .field("layout", &self.layout)
            .field("on", &self.on)
            .field("enable", &self.enable)
            .field("top_scen", &self.top_scen)
            .field("cur_scen", &self.cur_scen)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use exynos_hal::{QosPriority, RecordingIo};

    fn info(pd: Option<&'static str>) -> IpInfo {
        IpInfo {
            id: IpId::DECON,
            name: "decon",
            pd_name: pd,
            base: 0x1480_0000,
            actions: [
                HardwareAction::Disable,
                HardwareAction::SetPriority(QosPriority::splat(0xA)),
                HardwareAction::Nop,
                HardwareAction::SetPriority(QosPriority::splat(0xF)),
            ],
        }
    }

    #[test]
    fn test_new_descriptor_has_floor_only() {
        let ip = IpDescriptor::new(
            &info(Some("pd-dispaud")),
            RegisterLayout::BtsV21,
            Box::new(RecordingIo::new()),
            true,
        );
        assert_eq!(ip.top(), ScenarioId::Disable);
        assert_eq!(ip.entry(ScenarioId::Disable).next, StackLink::Top);
        assert!(ip.active_chain().is_empty());
        assert!(!ip.is_active(ScenarioId::Disable));
        assert!(!ip.is_on());
        assert_eq!(ip.current(), None);
    }

    #[test]
    fn test_domain_prefix_match() {
        let ip = IpDescriptor::new(
            &info(Some("pd-dispaud")),
            RegisterLayout::BtsV21,
            Box::new(RecordingIo::new()),
            true,
        );
        assert!(ip.in_domain("pd-dispaud"));
        assert!(ip.in_domain("pd-disp"));
        assert!(!ip.in_domain("pd-isp"));
        assert!(!ip.in_domain(""));

        let always_on = IpDescriptor::new(
            &info(None),
            RegisterLayout::BtsV21,
            Box::new(RecordingIo::new()),
            true,
        );
        assert!(!always_on.in_domain("pd-dispaud"));
    }

    #[test]
    fn test_ip_index_roundtrip() {
        assert_eq!(IpIndex::new(7).index(), 7);
    }
}
