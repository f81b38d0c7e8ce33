//! CH224Q controller.
//! Blocking operations run over any [`RegisterBus`]; the async mirror behind the
//! `async` feature drives an exclusively owned `embedded-hal-async` bus.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::bus::{I2cRegisterBus, RegisterBus, SharedI2cRegisterBus};
use crate::data_types::{
    AvsReadback, PdoTable, Protocol, RequestedVoltage, StandardVoltage, VoltageMode, VoltageRequest,
};
use crate::error::Error;
use crate::registers::{
    HV_THRESHOLD_MV, StatusBits, VOLTAGE_MAX_MV, addr, avs_regs_to_mv, code_to_current_ma, decode_protocol,
    mode_code, pd_active, pps_code_to_mv, pps_mv_to_code, standard_from_code, standard_from_mv,
};

/// CH224Q driver.
pub struct Ch224q<B> {
    bus: B,
    avs_readback: AvsReadback,
}

impl<B> Ch224q<B> {
    /// Create a driver over an already configured register bus.
    pub fn from_bus(bus: B) -> Self {
        Self {
            bus,
            avs_readback: AvsReadback::default(),
        }
    }

    /// Select how AVS readback registers are interpreted.
    pub fn with_avs_readback(mut self, avs_readback: AvsReadback) -> Self {
        self.avs_readback = avs_readback;
        self
    }

    pub fn avs_readback(&self) -> AvsReadback {
        self.avs_readback
    }

    /// Release the register bus.
    pub fn free(self) -> B {
        self.bus
    }
}

impl<I2C> Ch224q<I2cRegisterBus<I2C>> {
    /// Create a new driver instance with the default I2C address (0x22).
    pub fn new(i2c: I2C) -> Self {
        Self::from_bus(I2cRegisterBus::new(i2c))
    }

    /// Create a new driver instance with a custom I2C address.
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self::from_bus(I2cRegisterBus::with_address(i2c, address))
    }

    /// Return the 7-bit I2C address configured for this instance.
    pub fn address(&self) -> u8 {
        self.bus.address()
    }

    /// Release the underlying I2C bus.
    pub fn release(self) -> I2C {
        self.bus.free()
    }
}

impl<'a, M: RawMutex, I2C> Ch224q<SharedI2cRegisterBus<'a, M, I2C>> {
    /// Create a driver on a bus shared with other devices (default address).
    pub fn new_shared(bus: &'a Mutex<M, RefCell<I2C>>) -> Self {
        Self::from_bus(SharedI2cRegisterBus::new(bus))
    }
}

/// Register programming derived from a validated request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Program {
    Standard(StandardVoltage),
    Pps(u8),
    #[cfg(feature = "avs")]
    Avs { low: u8, high: u8 },
}

/// Validate a request and work out what to write. Touches no register.
fn plan<E>(request: &VoltageRequest) -> Result<Program, Error<E>> {
    let mv = request.millivolts;
    if mv > HV_THRESHOLD_MV && !request.allow_high_voltage {
        warn!("high voltage not enabled ({}mV)", mv);
        return Err(Error::VoltageNotSupported);
    }
    if mv > VOLTAGE_MAX_MV {
        error!("voltage higher than 28V ({}mV)", mv);
        return Err(Error::InvalidArgument);
    }
    match request.mode {
        VoltageMode::Avs => {
            info!("avs {}mV", mv);
            plan_avs(mv)
        }
        VoltageMode::Pps => {
            info!("pps {}mV", mv);
            pps_mv_to_code(mv).map(Program::Pps).ok_or_else(|| {
                error!("{}mV exceeds the PPS register range", mv);
                Error::InvalidArgument
            })
        }
        VoltageMode::Standard => {
            info!("std {}mV", mv);
            standard_from_mv(mv).map(Program::Standard).ok_or_else(|| {
                error!("{}mV is not a standard level", mv);
                Error::InvalidArgument
            })
        }
    }
}

#[cfg(feature = "avs")]
fn plan_avs<E>(mv: u16) -> Result<Program, Error<E>> {
    let (low, high) = crate::registers::avs_mv_to_regs(mv);
    Ok(Program::Avs { low, high })
}

#[cfg(not(feature = "avs"))]
fn plan_avs<E>(_mv: u16) -> Result<Program, Error<E>> {
    error!("avs requests are disabled");
    Err(Error::VoltageNotSupported)
}

fn io_error<E>(reg: u8, e: E) -> Error<E> {
    error!("io error at register {:#x}", reg);
    Error::I2c(e)
}

fn write<R: RegisterBus + ?Sized>(bus: &mut R, reg: u8, value: u8) -> Result<(), Error<R::Error>> {
    bus.write_register(reg, value).map_err(|e| io_error(reg, e))
}

fn read<R: RegisterBus + ?Sized>(bus: &mut R, reg: u8) -> Result<u8, Error<R::Error>> {
    bus.read_register(reg).map_err(|e| io_error(reg, e))
}

fn decode_standard<E>(code: u8) -> Result<RequestedVoltage, Error<E>> {
    match standard_from_code(code) {
        Some(level) => Ok(RequestedVoltage {
            millivolts: level.millivolts(),
            mode: VoltageMode::Standard,
        }),
        None => {
            warn!("unknown voltage control code {:#x}", code);
            Err(Error::VoltageNotSupported)
        }
    }
}

fn decode_avs<E>(readback: AvsReadback, low: u8, high: u8) -> Result<RequestedVoltage, Error<E>> {
    let millivolts = avs_regs_to_mv(readback, low, high).ok_or(Error::<E>::InvalidArgument)?;
    Ok(RequestedVoltage {
        millivolts,
        mode: VoltageMode::Avs,
    })
}

impl<B> Ch224q<B>
where
    B: RegisterBus,
{
    /// Read STATUS and report the negotiated protocol.
    pub fn handshake_status(&mut self) -> Result<Protocol, Error<B::Error>> {
        let bits = self.read_status()?;
        Ok(decode_protocol(bits))
    }

    /// Read STATUS raw bits.
    pub fn read_status(&mut self) -> Result<StatusBits, Error<B::Error>> {
        let raw = read(&mut self.bus, addr::STATUS)?;
        Ok(StatusBits::from_bits_truncate(raw))
    }

    /// Request a supply voltage.
    ///
    /// The request is validated before any bus access. PPS (and AVS, when enabled)
    /// writes the voltage register first, then switches VOLTAGE_CTRL; both writes
    /// happen inside one bus transaction and the first failure aborts the sequence.
    pub fn request_voltage(&mut self, request: VoltageRequest) -> Result<(), Error<B::Error>> {
        let program = plan::<B::Error>(&request)?;
        self.bus.transaction(|bus| -> Result<(), Error<B::Error>> {
            match program {
                Program::Standard(level) => write(bus, addr::VOLTAGE_CTRL, level.code()),
                Program::Pps(code) => {
                    write(bus, addr::PPS_VOLTAGE, code)?;
                    write(bus, addr::VOLTAGE_CTRL, mode_code::PPS)
                }
                #[cfg(feature = "avs")]
                Program::Avs { low, high } => {
                    write(bus, addr::AVS_LOW, low)?;
                    write(bus, addr::AVS_HIGH, high)?;
                    write(bus, addr::VOLTAGE_CTRL, mode_code::AVS)
                }
            }
        })
    }

    /// Request one of the fixed levels. 28 V needs `allow_high_voltage`.
    pub fn request_standard(
        &mut self,
        level: StandardVoltage,
        allow_high_voltage: bool,
    ) -> Result<(), Error<B::Error>> {
        let mut request = VoltageRequest::from(level);
        request.allow_high_voltage = allow_high_voltage;
        self.request_voltage(request)
    }

    /// Request a PPS voltage (100 mV resolution, truncated).
    pub fn request_pps(&mut self, mv: u16) -> Result<(), Error<B::Error>> {
        self.request_voltage(VoltageRequest::pps(mv))
    }

    /// Current the source can deliver, in mA.
    pub fn available_current_ma(&mut self) -> Result<u16, Error<B::Error>> {
        let raw = read(&mut self.bus, addr::CURRENT)?;
        Ok(code_to_current_ma(raw))
    }

    /// Read back the voltage programmed in the chip.
    ///
    /// An unknown VOLTAGE_CTRL code yields [`Error::VoltageNotSupported`]; use
    /// [`RequestedVoltage::FALLBACK`] where a value is needed regardless.
    pub fn requested_voltage(&mut self) -> Result<RequestedVoltage, Error<B::Error>> {
        let readback = self.avs_readback;
        self.bus.transaction(|bus| -> Result<RequestedVoltage, Error<B::Error>> {
            let code = read(bus, addr::VOLTAGE_CTRL)?;
            match code {
                mode_code::PPS => {
                    let raw = read(bus, addr::PPS_VOLTAGE)?;
                    Ok(RequestedVoltage {
                        millivolts: pps_code_to_mv(raw),
                        mode: VoltageMode::Pps,
                    })
                }
                mode_code::AVS => {
                    let low = read(bus, addr::AVS_LOW)?;
                    let high = read(bus, readback.high_register())?;
                    decode_avs(readback, low, high)
                }
                _ => decode_standard(code),
            }
        })
    }

    /// Copy the source capability table into `table`.
    ///
    /// Fails with [`Error::VoltageNotSupported`] without touching the table when no
    /// PD contract (SPR or EPR) is active.
    pub fn pdo(&mut self, table: &mut PdoTable) -> Result<(), Error<B::Error>> {
        self.bus.transaction(|bus| -> Result<(), Error<B::Error>> {
            let bits = StatusBits::from_bits_truncate(read(bus, addr::STATUS)?);
            if !pd_active(bits) {
                warn!("not in PD/PPS mode");
                return Err(Error::VoltageNotSupported);
            }
            bus.read_registers(addr::PDO_BASE, &mut table.raw)
                .map_err(|e| io_error(addr::PDO_BASE, e))
        })
    }

    /// Read the source capability table into a fresh buffer.
    pub fn pdo_table(&mut self) -> Result<PdoTable, Error<B::Error>> {
        let mut table = PdoTable::new();
        self.pdo(&mut table)?;
        Ok(table)
    }

    /// Diagnostic probe: read and log the raw VOLTAGE_CTRL value.
    pub fn read_mode_select_raw(&mut self) -> Result<u8, Error<B::Error>> {
        let raw = read(&mut self.bus, addr::VOLTAGE_CTRL)?;
        info!("0x0a = {:#x}", raw);
        Ok(raw)
    }
}

#[cfg(feature = "async")]
impl<I2C> Ch224q<I2cRegisterBus<I2C>>
where
    I2C: embedded_hal_async::i2c::I2c,
{
    async fn read_async(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        self.bus
            .read_register_async(reg)
            .await
            .map_err(|e| io_error(reg, e))
    }

    async fn write_async(&mut self, reg: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.bus
            .write_register_async(reg, value)
            .await
            .map_err(|e| io_error(reg, e))
    }

    /// Async version of [`Self::handshake_status`].
    pub async fn handshake_status_async(&mut self) -> Result<Protocol, Error<I2C::Error>> {
        let bits = self.read_status_async().await?;
        Ok(decode_protocol(bits))
    }

    pub async fn read_status_async(&mut self) -> Result<StatusBits, Error<I2C::Error>> {
        let raw = self.read_async(addr::STATUS).await?;
        Ok(StatusBits::from_bits_truncate(raw))
    }

    /// Async version of [`Self::request_voltage`].
    pub async fn request_voltage_async(&mut self, request: VoltageRequest) -> Result<(), Error<I2C::Error>> {
        match plan::<I2C::Error>(&request)? {
            Program::Standard(level) => self.write_async(addr::VOLTAGE_CTRL, level.code()).await,
            Program::Pps(code) => {
                self.write_async(addr::PPS_VOLTAGE, code).await?;
                self.write_async(addr::VOLTAGE_CTRL, mode_code::PPS).await
            }
            #[cfg(feature = "avs")]
            Program::Avs { low, high } => {
                self.write_async(addr::AVS_LOW, low).await?;
                self.write_async(addr::AVS_HIGH, high).await?;
                self.write_async(addr::VOLTAGE_CTRL, mode_code::AVS).await
            }
        }
    }

    pub async fn request_standard_async(
        &mut self,
        level: StandardVoltage,
        allow_high_voltage: bool,
    ) -> Result<(), Error<I2C::Error>> {
        let mut request = VoltageRequest::from(level);
        request.allow_high_voltage = allow_high_voltage;
        self.request_voltage_async(request).await
    }

    pub async fn request_pps_async(&mut self, mv: u16) -> Result<(), Error<I2C::Error>> {
        self.request_voltage_async(VoltageRequest::pps(mv)).await
    }

    pub async fn available_current_ma_async(&mut self) -> Result<u16, Error<I2C::Error>> {
        let raw = self.read_async(addr::CURRENT).await?;
        Ok(code_to_current_ma(raw))
    }

    /// Async version of [`Self::requested_voltage`].
    pub async fn requested_voltage_async(&mut self) -> Result<RequestedVoltage, Error<I2C::Error>> {
        let code = self.read_async(addr::VOLTAGE_CTRL).await?;
        match code {
            mode_code::PPS => {
                let raw = self.read_async(addr::PPS_VOLTAGE).await?;
                Ok(RequestedVoltage {
                    millivolts: pps_code_to_mv(raw),
                    mode: VoltageMode::Pps,
                })
            }
            mode_code::AVS => {
                let readback = self.avs_readback;
                let low = self.read_async(addr::AVS_LOW).await?;
                let high = self.read_async(readback.high_register()).await?;
                decode_avs(readback, low, high)
            }
            _ => decode_standard(code),
        }
    }

    /// Async version of [`Self::pdo`].
    pub async fn pdo_async(&mut self, table: &mut PdoTable) -> Result<(), Error<I2C::Error>> {
        let bits = self.read_status_async().await?;
        if !pd_active(bits) {
            warn!("not in PD/PPS mode");
            return Err(Error::VoltageNotSupported);
        }
        self.bus
            .read_registers_async(addr::PDO_BASE, &mut table.raw)
            .await
            .map_err(|e| io_error(addr::PDO_BASE, e))
    }

    pub async fn read_mode_select_raw_async(&mut self) -> Result<u8, Error<I2C::Error>> {
        let raw = self.read_async(addr::VOLTAGE_CTRL).await?;
        info!("0x0a = {:#x}", raw);
        Ok(raw)
    }
}
