//! # BTS Configuration
//!
//! Bring-up parameters of the scenario engine. Defaults match the selected
//! SoC table; the boot command line can switch scenario programming off
//! (`nobts`) or override the bandwidth unit (`bts.fhd_bw=<KB/s>`).

use crate::bandwidth::{DEFAULT_MIF_LADDER, FHD_BW_KBPS, MIF_LEVELS};
use crate::error::{BtsError, BtsResult};
use crate::ip::IpId;
use crate::soc;

/// Default headroom added to average bandwidth reports, percent
pub const DEFAULT_AVG_HEADROOM_PCT: u32 = 20;

/// Scenario engine configuration
#[derive(Debug, Clone)]
pub struct BtsConfig {
    /// Scenario programming on all IPs
    pub enabled: bool,
    /// Bandwidth unit, KB/s
    pub fhd_bw_kbps: u32,
    /// Headroom added to average reports, percent
    pub avg_headroom_pct: u32,
    /// MIF vote per ladder level, kHz
    pub mif_ladder: [u32; MIF_LEVELS],
    /// IPs programmed through system registers
    pub sysreg_mask: IpId,
}

impl Default for BtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fhd_bw_kbps: FHD_BW_KBPS,
            avg_headroom_pct: DEFAULT_AVG_HEADROOM_PCT,
            mif_ladder: DEFAULT_MIF_LADDER,
            sysreg_mask: soc::SYSREG_MASK,
        }
    }
}

impl BtsConfig {
    /// Configuration with scenario programming off
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    /// Override the bandwidth unit
    pub fn with_fhd_bw(mut self, kbps: u32) -> Self {
        self.fhd_bw_kbps = kbps;
        self
    }

    /// Override the average-report headroom
    pub fn with_avg_headroom(mut self, pct: u32) -> Self {
        self.avg_headroom_pct = pct;
        self
    }

    /// Override the MIF ladder
    pub fn with_mif_ladder(mut self, ladder: [u32; MIF_LEVELS]) -> Self {
        self.mif_ladder = ladder;
        self
    }

    /// Override the sysreg domain
    pub fn with_sysreg_mask(mut self, mask: IpId) -> Self {
        self.sysreg_mask = mask;
        self
    }

    /// Parse BTS options out of a kernel command line
    pub fn from_cmdline(cmdline: &str) -> Self {
        let mut config = Self::default();

        for arg in cmdline.split_whitespace() {
            if arg == "nobts" {
                config.enabled = false;
            } else if let Some(value) = arg.strip_prefix("bts.fhd_bw=") {
                match parse_u32(value) {
                    Some(kbps) if kbps != 0 => config.fhd_bw_kbps = kbps,
                    _ => log::warn!("BTS: ignoring bad bts.fhd_bw '{}'", value),
                }
            }
        }

        config
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> BtsResult<()> {
        if self.fhd_bw_kbps < 2 {
            return Err(BtsError::InvalidConfig("bandwidth unit too small"));
        }
        if self.mif_ladder.windows(2).any(|w| w[0] > w[1]) {
            return Err(BtsError::InvalidConfig("MIF ladder not ascending"));
        }
        Ok(())
    }
}

fn parse_u32(s: &str) -> Option<u32> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
