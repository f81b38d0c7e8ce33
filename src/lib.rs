//! CH224Q Rust Driver
//!
//! `no_std` driver for the WCH CH224Q USB-PD / QC / BC sink front-end. It reads the
//! negotiated protocol, requests fixed, PPS or AVS voltages, and reads back the
//! available current, the programmed voltage and the source PDO table.
//!
//! Blocking access goes through [`bus::RegisterBus`], either owning the I2C bus or
//! sharing it behind an `embassy-sync` blocking mutex. The `async` feature adds an
//! `embedded-hal-async` mirror of every operation. Logging goes to `defmt` or `log`
//! when the matching feature is enabled.

#![no_std]

#[macro_use]
mod fmt;

pub mod bus;
pub mod data_types;
pub mod driver;
pub mod error;
pub mod registers;

pub use bus::{I2cRegisterBus, RegisterBus, SharedI2cRegisterBus};
pub use data_types::{
    AvsReadback, PdoTable, Protocol, RequestFlags, RequestedVoltage, StandardVoltage, VoltageMode, VoltageRequest,
};
pub use driver::Ch224q;
pub use error::Error;
pub use registers::DEFAULT_I2C_ADDRESS;
