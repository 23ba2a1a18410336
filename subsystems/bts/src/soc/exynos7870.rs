//! Exynos 7870 shaper table
//!
//! Multimedia masters sit behind dedicated BTS v2.1 blocks; the CPU
//! clusters, GPU, storage and modem paths expose their QoS fields in the
//! owning block's system registers.

use exynos_hal::{BwWindow, MoLimit, QosPriority};

use crate::action::HardwareAction::{
    self, Disable, Nop, SetPriority, SetPriorityAndBandwidth, SetPriorityAndMo,
};
use crate::ip::{IpId, IpInfo};
use crate::scenario::{ScenarioId, SCENARIO_COUNT};

/// IPs programmed through system registers
pub const SYSREG_MASK: IpId = IpId::FSYS
    .union(IpId::MODAPIF)
    .union(IpId::CP)
    .union(IpId::CPUCL0)
    .union(IpId::CPUCL1)
    .union(IpId::G3D);

const fn prio(value: u8) -> QosPriority {
    QosPriority::splat(value)
}

const fn mo(value: u16) -> MoLimit {
    MoLimit::splat(value)
}

// [Disable, Default, CamBns, Debug]
const DEBUG: HardwareAction = SetPriority(prio(0xF));

const DECON: [HardwareAction; SCENARIO_COUNT] =
    [Disable, SetPriorityAndMo(prio(0xB), mo(0x10)), SetPriorityAndMo(prio(0xC), mo(0x10)), DEBUG];
const ISP: [HardwareAction; SCENARIO_COUNT] =
    [Disable, SetPriorityAndMo(prio(0xA), mo(0x10)), SetPriorityAndMo(prio(0xC), mo(0x20)), DEBUG];
const MFCMSCL: [HardwareAction; SCENARIO_COUNT] =
    [Disable, SetPriority(QosPriority::new(0x8, 0x6)), Nop, DEBUG];
const FSYS: [HardwareAction; SCENARIO_COUNT] =
    [Disable, SetPriorityAndMo(prio(0x6), mo(0x8)), Nop, DEBUG];
const MODEM: [HardwareAction; SCENARIO_COUNT] = [Disable, SetPriority(prio(0x9)), Nop, DEBUG];
const CPU: [HardwareAction; SCENARIO_COUNT] = [Disable, SetPriority(prio(0x6)), Nop, DEBUG];
const G3D: [HardwareAction; SCENARIO_COUNT] = [
    Disable,
    SetPriorityAndBandwidth(prio(0x6), BwWindow { window: 0x800, token: 0x100 }),
    Nop,
    DEBUG,
];

/// Endpoint table, in ring order
pub static IP_TABLE: [IpInfo; 10] = [
    ip(IpId::DECON, "decon", Some("pd-dispaud"), 0x1486_0000, DECON),
    ip(IpId::ISP0, "isp0", Some("pd-isp"), 0x1447_0000, ISP),
    ip(IpId::ISP1, "isp1", Some("pd-isp"), 0x1448_0000, ISP),
    ip(IpId::MFCMSCL, "mfcmscl", Some("pd-mfcmscl"), 0x1226_0000, MFCMSCL),
    ip(IpId::FSYS, "fsys", None, 0x1373_0000, FSYS),
    ip(IpId::MODAPIF, "modapif", None, 0x1053_0000, MODEM),
    ip(IpId::CP, "cp", None, 0x1054_0000, MODEM),
    ip(IpId::CPUCL0, "cpucl0", None, 0x1095_0000, CPU),
    ip(IpId::CPUCL1, "cpucl1", None, 0x1085_0000, CPU),
    ip(IpId::G3D, "g3d", Some("pd-g3d"), 0x1146_0000, G3D),
];

const fn ip(
    id: IpId,
    name: &'static str,
    pd_name: Option<&'static str>,
    base: usize,
    actions: [HardwareAction; SCENARIO_COUNT],
) -> IpInfo {
    IpInfo { id, name, pd_name, base, actions }
}

/// Initial membership of `scen`
pub fn scenario_members(scen: ScenarioId) -> IpId {
    match scen {
        ScenarioId::Default => IpId::all(),
        ScenarioId::CamBns => IpId::DECON | IpId::ISP0 | IpId::ISP1,
        ScenarioId::Disable | ScenarioId::Debug => IpId::empty(),
    }
}
