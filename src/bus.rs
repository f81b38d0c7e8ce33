//! Register access for CH224Q.
//!
//! [`RegisterBus`] is the only thing the driver needs from the outside world: 8-bit
//! register writes, reads and burst reads against one device address. Two I2C
//! bindings are provided:
//! - [`I2cRegisterBus`] owns the bus (or a `&mut` to it); access is exclusive by construction.
//! - [`SharedI2cRegisterBus`] borrows an `embassy_sync` blocking mutex shared with
//!   other drivers; every access locks it, and [`RegisterBus::transaction`] holds the
//!   lock across a whole multi-register sequence.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::registers::DEFAULT_I2C_ADDRESS;

/// 8-bit register interface of a single device.
pub trait RegisterBus {
    type Error;

    /// Write a single register.
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;

    /// Read a single register.
    fn read_register(&mut self, reg: u8) -> Result<u8, Self::Error>;

    /// Read `buf.len()` consecutive registers starting at `reg`.
    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Run `f` with exclusive access to the bus for its whole duration.
    ///
    /// Bindings that share the bus must override this so the lock spans every
    /// access made through the handle passed to `f`.
    fn transaction<R, F>(&mut self, f: F) -> R
    where
        Self: Sized,
        F: FnOnce(&mut dyn RegisterBus<Error = Self::Error>) -> R,
    {
        f(self)
    }
}

/// Exclusive I2C binding.
pub struct I2cRegisterBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cRegisterBus<I2C> {
    /// Bind to the default address (0x22).
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_I2C_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Return the 7-bit I2C address configured for this instance.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Release the underlying bus.
    pub fn free(self) -> I2C {
        self.i2c
    }
}

impl<I2C> RegisterBus for I2cRegisterBus<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    type Error = I2C::Error;

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[reg, value])
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(self.address, &[reg], &mut buf)?;
        Ok(buf[0])
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address, &[reg], buf)
    }
}

#[cfg(feature = "async")]
impl<I2C> I2cRegisterBus<I2C>
where
    I2C: embedded_hal_async::i2c::I2c,
{
    pub async fn write_register_async(&mut self, reg: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[reg, value]).await
    }

    pub async fn read_register_async(&mut self, reg: u8) -> Result<u8, I2C::Error> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(self.address, &[reg], &mut buf).await?;
        Ok(buf[0])
    }

    pub async fn read_registers_async(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), I2C::Error> {
        self.i2c.write_read(self.address, &[reg], buf).await
    }
}

/// I2C binding over a bus shared through a blocking mutex.
pub struct SharedI2cRegisterBus<'a, M: RawMutex, I2C> {
    bus: &'a Mutex<M, RefCell<I2C>>,
    address: u8,
}

impl<'a, M: RawMutex, I2C> SharedI2cRegisterBus<'a, M, I2C> {
    /// Bind to the default address (0x22).
    pub fn new(bus: &'a Mutex<M, RefCell<I2C>>) -> Self {
        Self::with_address(bus, DEFAULT_I2C_ADDRESS)
    }

    pub fn with_address(bus: &'a Mutex<M, RefCell<I2C>>, address: u8) -> Self {
        Self { bus, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    fn locked<R>(&self, f: impl FnOnce(&mut I2cRegisterBus<&mut I2C>) -> R) -> R {
        self.bus.lock(|cell| {
            let mut i2c = cell.borrow_mut();
            let mut device = I2cRegisterBus::with_address(&mut *i2c, self.address);
            f(&mut device)
        })
    }
}

impl<M: RawMutex, I2C> RegisterBus for SharedI2cRegisterBus<'_, M, I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    type Error = I2C::Error;

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.locked(|dev| dev.write_register(reg, value))
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Self::Error> {
        self.locked(|dev| dev.read_register(reg))
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.locked(|dev| dev.read_registers(reg, buf))
    }

    fn transaction<R, F>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut dyn RegisterBus<Error = Self::Error>) -> R,
    {
        self.locked(|dev| f(dev))
    }
}
