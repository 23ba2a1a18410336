//! # Bandwidth Aggregation
//!
//! Display and camera drivers report how much memory bandwidth they need;
//! the aggregator turns the running totals into a minimum memory-interface
//! (MIF) frequency vote and hands it to the platform's frequency
//! constraint.
//!
//! ## Vote
//!
//! Bandwidths are KB/s. The reference unit is one 1080p RGBA plane at 60
//! fps ([`FHD_BW_KBPS`]). Each overlay window past the base plane adds a
//! quarter of the display load, up to four windows. The weighted total
//! climbs the MIF ladder one step per half unit, and an active camera
//! never votes below [`CAMERA_FLOOR_LEVEL`]:
//!
//! | Weighted total (FHD units) | Level | Default vote (kHz) |
//! |----------------------------|-------|--------------------|
//! | 0                          | 0     | released           |
//! | (0, 0.5]                   | 1     | 338 000            |
//! | (0.5, 1]                   | 2     | 451 000            |
//! | (1, 1.5]                   | 3     | 546 000            |
//! | (1.5, 2]                   | 4     | 676 000            |
//! | (2, 2.5]                   | 5     | 741 000            |
//! | > 2.5                      | 6     | 902 000            |
//!
//! The vote is a pure function of the stored values: nothing accumulates.
//!
//! ## Delivery
//!
//! The vote is computed under the state lock and handed to the sink after
//! that lock is released, so a slow sink never holds up reporters or
//! status readers. Every change carries a sequence number; a vote older
//! than one already delivered is dropped, so the sink sees changes in
//! update order.

use core::fmt::{self, Write};

use alloc::boxed::Box;
use alloc::string::String;

use spin::{Mutex, RwLock};

use crate::config::BtsConfig;

// =============================================================================
// CONSTANTS
// =============================================================================

/// 1920 x 1080 x 4 bytes x 60 fps, in KB/s
pub const FHD_BW_KBPS: u32 = 1920 * 1080 * 4 * 60 / 1000;

/// Number of MIF ladder steps
pub const MIF_LEVELS: usize = 7;

/// MIF ladder in kHz; level 0 releases the vote
pub const DEFAULT_MIF_LADDER: [u32; MIF_LEVELS] =
    [0, 338_000, 451_000, 546_000, 676_000, 741_000, 902_000];

/// Lowest level while the camera streams
pub const CAMERA_FLOOR_LEVEL: usize = 3;

/// Overlay windows that add display weight
pub const MAX_WEIGHTED_WINDOWS: u32 = 4;

// =============================================================================
// TYPES
// =============================================================================

/// Bandwidth reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// Display controller
    Display,
    /// Camera ISP
    Camera,
}

/// How a reported bandwidth was measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BwType {
    /// Average over a frame; headroom is added
    Average,
    /// Peak demand; stored as reported
    Peak,
}

/// Consumer of the MIF vote
///
/// Called with no aggregator lock held, but serialised against other
/// deliveries; the sink may read the aggregator back.
pub trait FrequencyConstraint: Send + Sync {
    /// Request MIF to run at `khz` or faster; 0 releases the request
    fn update_min_mif(&self, khz: u32);
}

/// Sink that drops every vote
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraint;

impl FrequencyConstraint for NoConstraint {
    fn update_min_mif(&self, _khz: u32) {}
}

/// Aggregated bandwidth state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandwidthState {
    /// Display bandwidth, KB/s
    pub disp_bw: u32,
    /// Camera bandwidth, KB/s
    pub cam_bw: u32,
    /// Active overlay windows
    pub wincnt: u32,
    /// Current MIF vote, kHz
    pub mif_khz: u32,
}

// =============================================================================
// POLICY
// =============================================================================

/// Ladder level for the given load
pub fn mif_level(disp_bw: u32, cam_bw: u32, wincnt: u32, fhd_bw: u32) -> usize {
    let extra = wincnt.saturating_sub(1).min(MAX_WEIGHTED_WINDOWS) as u64;
    let disp_eff = disp_bw as u64 * (4 + extra) / 4;
    let total = disp_eff + cam_bw as u64;
    if total == 0 {
        return 0;
    }

    let half = (fhd_bw as u64 / 2).max(1);
    let mut level = (total.div_ceil(half) as usize).min(MIF_LEVELS - 1);
    if cam_bw != 0 {
        level = level.max(CAMERA_FLOOR_LEVEL);
    }
    level
}

// =============================================================================
// AGGREGATOR
// =============================================================================

/// Vote waiting to be handed to the sink
#[derive(Debug, Clone, Copy)]
struct PendingVote {
    khz: u32,
    seq: u64,
}

#[derive(Debug, Default)]
struct Totals {
    bw: BandwidthState,
    seq: u64,
}

/// Bandwidth totals and the MIF vote derived from them
pub struct BandwidthAggregator {
    state: RwLock<Totals>,
    /// Sequence number of the last vote handed to the sink
    delivered: Mutex<u64>,
    fhd_bw: u32,
    avg_headroom_pct: u32,
    ladder: [u32; MIF_LEVELS],
    sink: Box<dyn FrequencyConstraint>,
}

impl BandwidthAggregator {
    /// Create an idle aggregator
    pub fn new(config: &BtsConfig, sink: Box<dyn FrequencyConstraint>) -> Self {
        Self {
            state: RwLock::new(Totals::default()),
            delivered: Mutex::new(0),
            fhd_bw: config.fhd_bw_kbps,
            avg_headroom_pct: config.avg_headroom_pct,
            ladder: config.mif_ladder,
            sink,
        }
    }

    /// Record one reporter's bandwidth; returns the resulting vote
    pub fn update_media(&self, media: MediaType, bw: u32, bw_type: BwType) -> u32 {
        let stored = match bw_type {
            BwType::Peak => bw,
            BwType::Average => {
                let raised = bw as u64 * (100 + self.avg_headroom_pct as u64) / 100;
                raised.min(u32::MAX as u64) as u32
            },
        };
        log::debug!("BTS: {:?} bw {} ({:?}) -> {}", media, bw, bw_type, stored);

        self.update(|bw| match media {
            MediaType::Display => bw.disp_bw = stored,
            MediaType::Camera => bw.cam_bw = stored,
        })
    }

    /// Record the overlay window count; returns the resulting vote
    pub fn update_wincnt(&self, count: u32) -> u32 {
        self.update(|bw| bw.wincnt = count)
    }

    fn update(&self, apply: impl FnOnce(&mut BandwidthState)) -> u32 {
        let (khz, pending) = {
            let mut totals = self.state.write();
            apply(&mut totals.bw);
            self.recompute(&mut totals)
        };
        if let Some(vote) = pending {
            self.deliver(vote);
        }
        khz
    }

    fn recompute(&self, totals: &mut Totals) -> (u32, Option<PendingVote>) {
        let bw = &mut totals.bw;
        let level = mif_level(bw.disp_bw, bw.cam_bw, bw.wincnt, self.fhd_bw);
        let khz = self.ladder[level];
        if khz == bw.mif_khz {
            return (khz, None);
        }

        log::debug!("BTS: mif vote {} -> {} kHz", bw.mif_khz, khz);
        bw.mif_khz = khz;
        totals.seq += 1;
        (khz, Some(PendingVote { khz, seq: totals.seq }))
    }

    // Runs with the state lock released.
    fn deliver(&self, vote: PendingVote) {
        let mut delivered = self.delivered.lock();
        if vote.seq <= *delivered {
            log::debug!("BTS: dropped stale mif vote {} kHz", vote.khz);
            return;
        }
        *delivered = vote.seq;
        self.sink.update_min_mif(vote.khz);
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> BandwidthState {
        self.state.read().bw
    }

    /// Text dump of the current state
    pub fn status(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_status(&mut out);
        out
    }

    fn write_status(&self, out: &mut impl Write) -> fmt::Result {
        let state = self.snapshot();
        writeln!(out, "disp_bw: {} KB/s", state.disp_bw)?;
        writeln!(out, "cam_bw:  {} KB/s", state.cam_bw)?;
        writeln!(out, "wincnt:  {}", state.wincnt)?;
        writeln!(out, "mif:     {} kHz", state.mif_khz)
    }
}

impl fmt::Debug for BandwidthAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BandwidthAggregator")
            .field("state", &self.snapshot())
            .field("fhd_bw", &self.fhd_bw)
            .field("ladder", &self.ladder)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
