//! # BTS System
//!
//! Owner of all arbitration state and home of the entry points the rest
//! of the platform calls.
//!
//! ## Locking
//!
//! ```text
//!   BtsSystem
//!   ├── stack: Mutex<StackState>      descriptors, stacks, rings
//!   │     taken by initialize, scen_update, add/remove and the debug surface
//!   └── bandwidth: BandwidthAggregator
//!         └── RwLock<BandwidthState>  taken by the media reports
//! ```
//!
//! Every public operation takes exactly one of the two locks, once, and
//! never both. Hardware is only written with the stack lock held.

use alloc::boxed::Box;
use core::fmt;

use arrayvec::ArrayVec;
use exynos_hal::{HalError, HalResult, RegisterIo};
use spin::Mutex;
use static_assertions::assert_impl_all;

use crate::action::RegisterLayout;
use crate::bandwidth::{BandwidthAggregator, BwType, FrequencyConstraint, MediaType, NoConstraint};
use crate::config::BtsConfig;
use crate::error::{BtsError, BtsResult};
use crate::ip::{IpDescriptor, IpId, IpIndex, IpInfo};
use crate::power::{DefaultPolicy, ScenarioPolicy};
use crate::scenario::{ScenarioId, ScenarioRegistry, ScenarioType};
use crate::soc;
use crate::stack::{StackState, Target};
use crate::MAX_IPS;

/// Bound register window of one descriptor
pub type BoxedIo = Box<dyn RegisterIo + Send>;

// =============================================================================
// SYSTEM
// =============================================================================

/// The scenario engine
pub struct BtsSystem {
    pub(crate) stack: Mutex<StackState>,
    pub(crate) policy: Box<dyn ScenarioPolicy>,
    pub(crate) bandwidth: BandwidthAggregator,
    pub(crate) config: BtsConfig,
}

assert_impl_all!(BtsSystem: Send, Sync);

impl BtsSystem {
    /// Build the engine over the selected SoC table
    ///
    /// `map` binds each descriptor's physical base to a register window of
    /// at least `layout.window_len()` bytes.
    pub fn new<M>(config: BtsConfig, map: M) -> BtsResult<Self>
    where
        M: FnMut(&IpInfo, RegisterLayout) -> HalResult<BoxedIo>,
    {
        Self::builder(config).build(map)
    }

    /// Start configuring an engine
    pub fn builder(config: BtsConfig) -> BtsBuilder {
        BtsBuilder::new(config)
    }

    /// Power-domain transition reported by platform power management
    ///
    /// Returns the number of descriptors in the domain.
    pub fn initialize(&self, pd_name: &str, on: bool) -> usize {
        let mut state = self.stack.lock();
        state.power_transition(pd_name, on, &*self.policy)
    }

    /// Toggle a group scenario for every IP in its ring
    pub fn scen_update(&self, ty: ScenarioType, on: bool) {
        let scen = ty.scenario();
        log::debug!("BTS: scen_update {} {}", scen.name(), on);

        let mut state = self.stack.lock();
        if on {
            state.add_scenario(scen, Target::Chain);
        } else {
            state.remove_scenario(scen, Target::Chain);
        }
    }

    /// Push `scen` onto the targeted stacks
    pub fn add_scenario(&self, scen: ScenarioId, target: Target) {
        self.stack.lock().add_scenario(scen, target);
    }

    /// Pull `scen` off the targeted stacks
    pub fn remove_scenario(&self, scen: ScenarioId, target: Target) {
        self.stack.lock().remove_scenario(scen, target);
    }

    /// Bandwidth report from a media driver; returns the MIF vote in kHz
    pub fn update_media_scenario(&self, media: MediaType, bw: u32, bw_type: BwType) -> u32 {
        self.bandwidth.update_media(media, bw, bw_type)
    }

    /// Overlay window count from the display driver; returns the MIF vote
    pub fn update_overlay_wincnt(&self, count: u32) -> u32 {
        self.bandwidth.update_wincnt(count)
    }

    /// Handle of the descriptor called `name`
    pub fn ip_index(&self, name: &str) -> BtsResult<IpIndex> {
        self.stack
            .lock()
            .find(name)
            .ok_or_else(|| BtsError::UnknownIp(name.into()))
    }

    /// Run `f` on one descriptor under the stack lock
    pub fn with_ip<R>(&self, idx: IpIndex, f: impl FnOnce(&IpDescriptor) -> R) -> Option<R> {
        let state = self.stack.lock();
        state.ip(idx).map(f)
    }

    /// Run `f` on the whole arbitration state under the stack lock
    pub fn with_state<R>(&self, f: impl FnOnce(&StackState) -> R) -> R {
        f(&self.stack.lock())
    }

    /// Bandwidth aggregator
    #[inline]
    pub fn bandwidth(&self) -> &BandwidthAggregator {
        &self.bandwidth
    }

    /// Configuration the engine was built with
    #[inline]
    pub fn config(&self) -> &BtsConfig {
        &self.config
    }
}

impl fmt::Debug for BtsSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BtsSystem")
            .field("config", &self.config)
            .field("bandwidth", &self.bandwidth)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builder for [`BtsSystem`]
pub struct BtsBuilder {
    config: BtsConfig,
    table: &'static [IpInfo],
    members: fn(ScenarioId) -> IpId,
    policy: Box<dyn ScenarioPolicy>,
    sink: Box<dyn FrequencyConstraint>,
}

impl BtsBuilder {
    /// Builder over the selected SoC table with the default policy and no
    /// frequency sink
    pub fn new(config: BtsConfig) -> Self {
        Self {
            config,
            table: &soc::IP_TABLE,
            members: soc::scenario_members,
            policy: Box::new(DefaultPolicy),
            sink: Box::new(NoConstraint),
        }
    }

    /// Use another descriptor table and membership function
    pub fn table(mut self, table: &'static [IpInfo], members: fn(ScenarioId) -> IpId) -> Self {
        self.table = table;
        self.members = members;
        self
    }

    /// Set the power-on scenario policy
    pub fn policy(mut self, policy: impl ScenarioPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Set the consumer of MIF votes
    pub fn frequency_sink(mut self, sink: impl FrequencyConstraint + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Bind every descriptor and bring up the always-on ones
    pub fn build<M>(self, mut map: M) -> BtsResult<BtsSystem>
    where
        M: FnMut(&IpInfo, RegisterLayout) -> HalResult<BoxedIo>,
    {
        self.config.validate()?;
        if self.table.len() > MAX_IPS {
            return Err(BtsError::TooManyIps(self.table.len()));
        }

        let mut seen = IpId::empty();
        let mut ips = ArrayVec::<IpDescriptor, MAX_IPS>::new();
        for info in self.table {
            if info.id.bits().count_ones() != 1 {
                return Err(BtsError::InvalidConfig("ip id must be a single bit"));
            }
            if seen.intersects(info.id) {
                return Err(BtsError::DuplicateIp(info.id));
            }
            seen |= info.id;

            let layout = if self.config.sysreg_mask.contains(info.id) {
                RegisterLayout::Sysreg
            } else {
                RegisterLayout::BtsV21
            };
            let io = map(info, layout).map_err(|e| BtsError::from((info.name, e)))?;
            if !io.covers(layout.window_len()) {
                let source = HalError::OutOfRange { len: io.len(), required: layout.window_len() };
                return Err(BtsError::Map { ip: info.name, source });
            }
            ips.push(IpDescriptor::new(info, layout, io, self.config.enabled));
        }

        let mut state = StackState::new(ips, ScenarioRegistry::new(self.members));
        state.rebuild_all_chains();
        state.power_on_always_on(&*self.policy);

        log::info!(
            "BTS: {} ips bound, scenario programming {}",
            state.ips().len(),
            if self.config.enabled { "on" } else { "off" }
        );

        Ok(BtsSystem {
            stack: Mutex::new(state),
            policy: self.policy,
            bandwidth: BandwidthAggregator::new(&self.config, self.sink),
            config: self.config,
        })
    }
}

impl fmt::Debug for BtsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BtsBuilder")
            .field("config", &self.config)
            .field("ips", &self.table.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
