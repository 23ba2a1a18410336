//! # SoC Descriptor Tables
//!
//! Each supported SoC contributes a constant IP table, the membership of
//! every scenario and the mask of IPs reached through system registers.
//! Exactly one table is compiled in.

cfg_if::cfg_if! {
    if #[cfg(feature = "exynos7870")] {
        mod exynos7870;
        pub use exynos7870::{scenario_members, IP_TABLE, SYSREG_MASK};
    } else {
        compile_error!("exynos-bts needs a SoC table feature: enable `exynos7870`");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::IpId;
    use crate::scenario::ScenarioId;
    use crate::MAX_IPS;

    #[test]
    fn test_table_ids_unique() {
        let mut seen = IpId::empty();
        for info in IP_TABLE.iter() {
            assert_eq!(info.id.bits().count_ones(), 1, "{}", info.name);
            assert!(!seen.intersects(info.id), "{}", info.name);
            seen |= info.id;
        }
        assert!(IP_TABLE.len() <= MAX_IPS);
    }

    #[test]
    fn test_disable_record_resets() {
        for info in IP_TABLE.iter() {
            assert_eq!(
                info.actions[ScenarioId::Disable.index()],
                crate::action::HardwareAction::Disable,
                "{}",
                info.name
            );
        }
    }

    #[test]
    fn test_memberships() {
        assert!(scenario_members(ScenarioId::Disable).is_empty());
        assert!(scenario_members(ScenarioId::Debug).is_empty());
        assert!(scenario_members(ScenarioId::Default).contains(IpId::DECON | IpId::G3D));
        assert!(scenario_members(ScenarioId::CamBns).contains(IpId::ISP0));
    }

    #[test]
    fn test_priorities_encodable() {
        for info in IP_TABLE.iter() {
            for action in info.actions.iter() {
                if let Some(prio) = action.priority() {
                    assert!(prio.is_valid(), "{}", info.name);
                }
                if let Some(mo) = action.mo() {
                    assert!(mo.is_valid(), "{}", info.name);
                }
            }
        }
    }
}
