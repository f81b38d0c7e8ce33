//! Register map and constants for CH224Q.
//! Addresses, bit layouts and unit steps follow the WCH register description; the
//! helpers below are pure so the blocking and async paths share one encoding.

use crate::data_types::{AvsReadback, Protocol, StandardVoltage};

/// Default 7-bit I2C address of the CH224Q.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x22;
/// Alternate I2C address (CFG pin strapped for the secondary address).
pub const ALT_I2C_ADDRESS: u8 = 0x23;

/// Register addresses (8-bit).
pub mod addr {
    /// Protocol status (read-only).
    pub const STATUS: u8 = 0x09;
    /// Voltage control / mode select: 0..=5 fixed levels, 6 PPS, 7 AVS.
    pub const VOLTAGE_CTRL: u8 = 0x0A;
    /// Available current reported by the source (50 mA LSB).
    pub const CURRENT: u8 = 0x50;
    /// AVS voltage, high 7 bits plus enable bit (bit 7).
    pub const AVS_HIGH: u8 = 0x51;
    /// AVS voltage, low 8 bits.
    pub const AVS_LOW: u8 = 0x52;
    /// PPS voltage (100 mV LSB).
    pub const PPS_VOLTAGE: u8 = 0x53;
    /// First byte of the source capability (SRCCAP) table, 0x60..=0x8F.
    pub const PDO_BASE: u8 = 0x60;
}

/// Mode-select codes written to [`addr::VOLTAGE_CTRL`].
pub mod mode_code {
    pub const V5: u8 = 0;
    pub const V9: u8 = 1;
    pub const V12: u8 = 2;
    pub const V15: u8 = 3;
    pub const V20: u8 = 4;
    pub const V28: u8 = 5;
    pub const PPS: u8 = 6;
    pub const AVS: u8 = 7;
}

/// Size of the SRCCAP table mirrored at [`addr::PDO_BASE`].
pub const PDO_TABLE_LEN: usize = 96;

/// Available current LSB.
pub const CURRENT_LSB_MA: u16 = 50;
/// PPS/AVS voltage LSB.
pub const PROG_VOLTAGE_LSB_MV: u16 = 100;

/// Requests above this need explicit high-voltage authorization.
pub const HV_THRESHOLD_MV: u16 = 20_000;
/// Absolute ceiling, rejected even when high voltage is authorized.
pub const VOLTAGE_MAX_MV: u16 = 28_000;

bitflags::bitflags! {
    /// STATUS register bits (0x09).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct StatusBits: u8 {
        /// Bit 4: PD extended power range contract active.
        const EPR = 1 << 4;
        /// Bit 3: PD standard power range contract active.
        const SPR = 1 << 3;
        const QC3 = 1 << 2;
        const QC2 = 1 << 1;
        /// Bit 0: BC1.2 charger detected.
        const BC  = 1 << 0;
    }

    /// AVS_HIGH register bits (0x51).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct AvsHighBits: u8 {
        /// Bit 7: AVS request enable.
        const EN = 1 << 7;
    }
}

impl StatusBits {
    /// Either PD bit set: the SRCCAP table is valid.
    pub const PD_ACTIVE: Self = Self::EPR.union(Self::SPR);
}

/// Decode STATUS into the negotiated protocol (EPR > SPR > QC3 > QC2 > BC > none).
pub fn decode_protocol(bits: StatusBits) -> Protocol {
    if bits.contains(StatusBits::EPR) {
        Protocol::UcpdEpr
    } else if bits.contains(StatusBits::SPR) {
        Protocol::Ucpd
    } else if bits.contains(StatusBits::QC3) {
        Protocol::Qc3
    } else if bits.contains(StatusBits::QC2) {
        Protocol::Qc2
    } else if bits.contains(StatusBits::BC) {
        Protocol::Bc
    } else {
        Protocol::None
    }
}

/// True when the chip holds a PD contract and exposes its PDO table.
pub fn pd_active(bits: StatusBits) -> bool {
    bits.intersects(StatusBits::PD_ACTIVE)
}

/// Convert a raw CURRENT register value to milliamps.
pub fn code_to_current_ma(code: u8) -> u16 {
    code as u16 * CURRENT_LSB_MA
}

/// Quantize a PPS voltage to its one-byte register value (100 mV steps, truncating).
/// Returns `None` above 25.5 V, where the step count no longer fits the register.
pub fn pps_mv_to_code(mv: u16) -> Option<u8> {
    u8::try_from(mv / PROG_VOLTAGE_LSB_MV).ok()
}

/// Convert a PPS register value back to millivolts.
pub fn pps_code_to_mv(code: u8) -> u16 {
    code as u16 * PROG_VOLTAGE_LSB_MV
}

/// Split an AVS voltage into `(AVS_LOW, AVS_HIGH)` register values.
/// The high byte carries bits 8..=14 of the 100 mV step count plus [`AvsHighBits::EN`].
pub fn avs_mv_to_regs(mv: u16) -> (u8, u8) {
    let steps = mv / PROG_VOLTAGE_LSB_MV;
    let low = (steps & 0xFF) as u8;
    let high = ((steps >> 8) as u8 & 0x7F) | AvsHighBits::EN.bits();
    (low, high)
}

/// Decode AVS readback registers into millivolts.
///
/// `low` is AVS_LOW; `high` is the second register read for the given
/// interpretation (see [`AvsReadback`]). Returns `None` when the combined value
/// does not fit in 16 bits.
pub fn avs_regs_to_mv(readback: AvsReadback, low: u8, high: u8) -> Option<u16> {
    let high = (high & !AvsHighBits::EN.bits()) as u16;
    match readback {
        // The low byte does not contribute; the 16-bit product wraps.
        AvsReadback::Legacy => Some((high << 8).wrapping_mul(PROG_VOLTAGE_LSB_MV)),
        AvsReadback::Combined => {
            let steps = (high << 8) | low as u16;
            u16::try_from(steps as u32 * PROG_VOLTAGE_LSB_MV as u32).ok()
        }
    }
}

/// Map a fixed level in millivolts to its standard setting.
pub fn standard_from_mv(mv: u16) -> Option<StandardVoltage> {
    match mv {
        5_000 => Some(StandardVoltage::V5),
        9_000 => Some(StandardVoltage::V9),
        12_000 => Some(StandardVoltage::V12),
        15_000 => Some(StandardVoltage::V15),
        20_000 => Some(StandardVoltage::V20),
        28_000 => Some(StandardVoltage::V28),
        _ => None,
    }
}

/// Map a VOLTAGE_CTRL code to the standard setting it selects.
pub fn standard_from_code(code: u8) -> Option<StandardVoltage> {
    match code {
        mode_code::V5 => Some(StandardVoltage::V5),
        mode_code::V9 => Some(StandardVoltage::V9),
        mode_code::V12 => Some(StandardVoltage::V12),
        mode_code::V15 => Some(StandardVoltage::V15),
        mode_code::V20 => Some(StandardVoltage::V20),
        mode_code::V28 => Some(StandardVoltage::V28),
        _ => None,
    }
}
