//! Error definitions for CH224Q driver.

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<I2cError> {
    /// Underlying I2C transaction failed.
    I2c(I2cError),
    /// Value outside the protocol-defined range (above 28 V, not a fixed level, ...).
    InvalidArgument,
    /// Request rejected by policy: high voltage not authorized, AVS disabled,
    /// no PD contract, or an unknown mode code in the chip.
    VoltageNotSupported,
}

impl<I2cError: core::fmt::Debug> core::fmt::Display for Error<I2cError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {:?}", e),
            Error::InvalidArgument => write!(f, "invalid argument"),
            Error::VoltageNotSupported => write!(f, "voltage not supported"),
        }
    }
}
