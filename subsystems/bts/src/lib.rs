//! # Exynos BTS Scenario Engine
//!
//! Arbitration of the bus traffic shapers in front of every memory-bus
//! master. Each IP keeps a stack of requested QoS scenarios and the
//! hardware always runs the highest-ranked one; power domains, media
//! drivers and the debug surface push and pull scenarios concurrently.
//!
//! ## Architecture
//!
//! ```text
//!  power management      media drivers          debug surface
//!  initialize(pd, on)    scen_update(ty, on)    set_priority / set_mo
//!        │               update_media_scenario  set_debug_scenario
//!        │                     │      │               │
//!        ▼                     ▼      │               ▼
//! ┌─────────────────────────────────┐ │ ┌───────────────────────────┐
//! │   stack lock: StackState        │ │ │ bandwidth lock            │
//! │   ┌───────────┐ ┌────────────┐  │ └▶│ BandwidthAggregator       │
//! │   │ registry  │ │ IP arena   │  │   │ disp/cam bw, wincnt ──▶   │
//! │   │ members,  │ │ per-IP     │  │   │ MIF vote ──▶ Frequency-   │
//! │   │ ring head │ │ stacks     │  │   │              Constraint   │
//! │   └───────────┘ └─────┬──────┘  │   └───────────────────────────┘
//! └───────────────────────┼─────────┘
//!                         │ program_hardware(top)
//!                         ▼
//!                exynos-hal::qos sequences
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let bts = BtsSystem::new(BtsConfig::from_cmdline(cmdline), |info, layout| {
//!     let (base, size) = ioremap(info.base, layout.window_len());
//!     let region = unsafe { MmioRegion::new(base, size)? }.require(layout.window_len())?;
//!     Ok(Box::new(region) as BoxedIo)
//! })?;
//!
//! bts.initialize("pd-isp", true);
//! bts.scen_update(ScenarioType::CamBns, true);
//! ```

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

use static_assertions::const_assert;

pub mod action;
pub mod bandwidth;
pub mod chain;
pub mod config;
pub mod debug;
pub mod error;
pub mod ip;
pub mod power;
pub mod scenario;
pub mod soc;
pub mod stack;
pub mod system;

pub use action::{HardwareAction, RegisterLayout};
pub use bandwidth::{BandwidthAggregator, BandwidthState, BwType, FrequencyConstraint, MediaType};
pub use config::BtsConfig;
pub use error::{BtsError, BtsResult};
pub use ip::{IpDescriptor, IpId, IpIndex, IpInfo};
pub use power::{DefaultPolicy, ScenarioPolicy};
pub use scenario::{ScenarioId, ScenarioType};
pub use stack::{StackState, Target};
pub use system::{BoxedIo, BtsBuilder, BtsSystem};

/// Capacity of the descriptor arena
pub const MAX_IPS: usize = 16;

const_assert!(IpId::all().bits().count_ones() as usize <= MAX_IPS);
const_assert!(MAX_IPS <= u8::MAX as usize);
