//! # BTS Errors
//!
//! The scenario engine itself never fails: add, remove, power transitions
//! and bandwidth votes are total operations, and structural violations are
//! logged where they are detected. Errors only surface from bring-up
//! (binding register windows, validating tables and configuration) and
//! from the debug surface, where a caller hands in names and raw values.

use core::fmt;

use alloc::string::String;

use exynos_hal::{HalError, MoLimit, QosPriority};

use crate::ip::IpId;

/// BTS result type
pub type BtsResult<T> = Result<T, BtsError>;

/// BTS errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BtsError {
    /// No descriptor carries this name
    UnknownIp(String),
    /// Two descriptors share an identity bit
    DuplicateIp(IpId),
    /// Descriptor table exceeds the arena
    TooManyIps(usize),
    /// Register window could not be bound
    Map {
        /// Descriptor being bound
        ip: &'static str,
        /// HAL failure
        source: HalError,
    },
    /// Priority does not fit the 4-bit field
    InvalidPriority(QosPriority),
    /// MO limit is zero or too large
    InvalidMo(MoLimit),
    /// Only the disable floor is on the stack
    NoActiveScenario(&'static str),
    /// Scenario programming is disabled for this descriptor
    Disabled(&'static str),
    /// Configuration rejected
    InvalidConfig(&'static str),
}

impl fmt::Display for BtsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownIp(name) => write!(f, "unknown BTS ip: {}", name),
            Self::DuplicateIp(id) => write!(f, "duplicate BTS ip id: {:#x}", id.bits()),
            Self::TooManyIps(n) => write!(f, "too many BTS ips: {}", n),
            Self::Map { ip, source } => write!(f, "cannot map {}: {}", ip, source),
            Self::InvalidPriority(p) => {
                write!(f, "invalid priority r{:#x} w{:#x}", p.read, p.write)
            },
            Self::InvalidMo(mo) => write!(f, "invalid mo r{} w{}", mo.read, mo.write),
            Self::NoActiveScenario(ip) => write!(f, "{}: no active scenario", ip),
            Self::Disabled(ip) => write!(f, "{}: scenario programming disabled", ip),
            Self::InvalidConfig(msg) => write!(f, "invalid BTS config: {}", msg),
        }
    }
}

impl From<(&'static str, HalError)> for BtsError {
    fn from((ip, source): (&'static str, HalError)) -> Self {
        Self::Map { ip, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_display() {
        let err = BtsError::Map { ip: "decon", source: HalError::Unmapped };
        assert_eq!(err.to_string(), "cannot map decon: register window is not mapped");
        assert_eq!(
            BtsError::UnknownIp("gpu".into()).to_string(),
            "unknown BTS ip: gpu"
        );
    }

    #[test]
    fn test_from_hal_error() {
        let err: BtsError = ("g3d", HalError::Misaligned { base: 0x3 }).into();
        assert!(matches!(err, BtsError::Map { ip: "g3d", .. }));
    }
}
