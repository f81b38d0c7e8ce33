//! Data types for the CH224Q driver.

use crate::registers::{PDO_TABLE_LEN, addr, mode_code};

/// Charging protocol negotiated with the source, decoded from STATUS.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Protocol {
    /// Nothing negotiated (plain 5 V).
    None,
    /// USB BC1.2.
    Bc,
    /// Quick Charge 2.0.
    Qc2,
    /// Quick Charge 3.0.
    Qc3,
    /// USB PD, standard power range.
    Ucpd,
    /// USB PD, extended power range.
    UcpdEpr,
}

/// How the requested voltage is programmed into the chip.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum VoltageMode {
    /// One of the fixed levels (5/9/12/15/20/28 V).
    #[default]
    Standard,
    /// Programmable power supply, 100 mV steps.
    Pps,
    /// Adjustable voltage supply (PD 3.1 EPR), 100 mV steps.
    Avs,
}

/// Fixed voltage levels selectable through VOLTAGE_CTRL codes 0..=5.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StandardVoltage {
    V5,
    V9,
    V12,
    V15,
    V20,
    V28,
}

impl StandardVoltage {
    pub const ALL: [StandardVoltage; 6] = [
        StandardVoltage::V5,
        StandardVoltage::V9,
        StandardVoltage::V12,
        StandardVoltage::V15,
        StandardVoltage::V20,
        StandardVoltage::V28,
    ];

    pub fn millivolts(self) -> u16 {
        match self {
            StandardVoltage::V5 => 5_000,
            StandardVoltage::V9 => 9_000,
            StandardVoltage::V12 => 12_000,
            StandardVoltage::V15 => 15_000,
            StandardVoltage::V20 => 20_000,
            StandardVoltage::V28 => 28_000,
        }
    }

    /// VOLTAGE_CTRL code selecting this level.
    pub fn code(self) -> u8 {
        match self {
            StandardVoltage::V5 => mode_code::V5,
            StandardVoltage::V9 => mode_code::V9,
            StandardVoltage::V12 => mode_code::V12,
            StandardVoltage::V15 => mode_code::V15,
            StandardVoltage::V20 => mode_code::V20,
            StandardVoltage::V28 => mode_code::V28,
        }
    }
}

bitflags::bitflags! {
    /// Request flag byte as used by the vendor reference API.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct RequestFlags: u8 {
        /// Allow requests above 20 V.
        const ENABLE_HV = 1 << 0;
        const USE_AVS   = 1 << 4;
        const USE_PPS   = 1 << 5;
    }
}

impl RequestFlags {
    /// Mode selected by the flags; AVS wins over PPS, PPS over standard.
    pub fn mode(self) -> VoltageMode {
        if self.contains(RequestFlags::USE_AVS) {
            VoltageMode::Avs
        } else if self.contains(RequestFlags::USE_PPS) {
            VoltageMode::Pps
        } else {
            VoltageMode::Standard
        }
    }
}

impl From<VoltageMode> for RequestFlags {
    fn from(mode: VoltageMode) -> Self {
        match mode {
            VoltageMode::Standard => RequestFlags::empty(),
            VoltageMode::Pps => RequestFlags::USE_PPS,
            VoltageMode::Avs => RequestFlags::USE_AVS,
        }
    }
}

/// A single voltage request. Built per call, never stored by the driver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VoltageRequest {
    pub millivolts: u16,
    pub mode: VoltageMode,
    /// Must be set for anything above 20 V.
    pub allow_high_voltage: bool,
}

impl VoltageRequest {
    pub fn standard(millivolts: u16) -> Self {
        Self {
            millivolts,
            mode: VoltageMode::Standard,
            allow_high_voltage: false,
        }
    }

    pub fn pps(millivolts: u16) -> Self {
        Self {
            millivolts,
            mode: VoltageMode::Pps,
            allow_high_voltage: false,
        }
    }

    pub fn avs(millivolts: u16) -> Self {
        Self {
            millivolts,
            mode: VoltageMode::Avs,
            allow_high_voltage: false,
        }
    }

    /// Build a request from the vendor flag byte.
    pub fn from_flags(millivolts: u16, flags: RequestFlags) -> Self {
        Self {
            millivolts,
            mode: flags.mode(),
            allow_high_voltage: flags.contains(RequestFlags::ENABLE_HV),
        }
    }

    /// Authorize voltages above 20 V for this request.
    pub fn allow_high_voltage(mut self) -> Self {
        self.allow_high_voltage = true;
        self
    }

    pub fn flags(&self) -> RequestFlags {
        let mut flags = RequestFlags::from(self.mode);
        flags.set(RequestFlags::ENABLE_HV, self.allow_high_voltage);
        flags
    }
}

impl From<StandardVoltage> for VoltageRequest {
    fn from(level: StandardVoltage) -> Self {
        Self::standard(level.millivolts())
    }
}

/// Voltage currently programmed in the chip, as read back from its registers.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RequestedVoltage {
    pub millivolts: u16,
    pub mode: VoltageMode,
}

impl RequestedVoltage {
    /// Value to assume when the mode register holds an unknown code.
    pub const FALLBACK: RequestedVoltage = RequestedVoltage {
        millivolts: 5_000,
        mode: VoltageMode::Standard,
    };

    pub fn flags(&self) -> RequestFlags {
        RequestFlags::from(self.mode)
    }
}

/// How AVS readback registers are combined into millivolts.
///
/// The vendor reference reads AVS_LOW, discards it, and derives the voltage from
/// the masked PPS register alone. `Legacy` reproduces that; `Combined` uses the
/// documented AVS_HIGH/AVS_LOW layout.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AvsReadback {
    #[default]
    Legacy,
    Combined,
}

impl AvsReadback {
    /// Register read after AVS_LOW for the high bits.
    pub fn high_register(self) -> u8 {
        match self {
            AvsReadback::Legacy => addr::PPS_VOLTAGE,
            AvsReadback::Combined => addr::AVS_HIGH,
        }
    }
}

/// Raw SRCCAP table copied from 0x60..=0x8F. Not parsed by the driver.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PdoTable {
    pub raw: [u8; PDO_TABLE_LEN],
}

impl PdoTable {
    pub const fn new() -> Self {
        Self {
            raw: [0; PDO_TABLE_LEN],
        }
    }

    pub fn as_bytes(&self) -> &[u8; PDO_TABLE_LEN] {
        &self.raw
    }
}

impl Default for PdoTable {
    fn default() -> Self {
        Self::new()
    }
}
