use fpga_interface::{FpgaError, FpgaResult, Status};
use thiserror::Error;

use crate::{IrqChannel, Trigger, IRQNO_MAX, IRQNO_MIN};

/// Why a reservation was refused by the registry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveError {
    #[error("an interrupt with IRQ number {0} is already registered")]
    NumberNotUsable(u8),
    #[error("channel {0} is already registered with another interrupt")]
    ChannelNotUsable(IrqChannel),
}

impl ReserveError {
    pub fn status(&self) -> Status {
        match self {
            ReserveError::NumberNotUsable(_) => Status::IRQ_NUMBER_NOT_USABLE,
            ReserveError::ChannelNotUsable(_) => Status::IRQ_CHANNEL_NOT_USABLE,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqError {
    #[error("IRQ number {0} is out of range ({min}..={max})", min = IRQNO_MIN, max = IRQNO_MAX)]
    NumberOutOfRange(u8),
    #[error(transparent)]
    Reserve(#[from] ReserveError),
    #[error("channel {0} is not handled by this driver")]
    WrongChannel(IrqChannel),
    #[error("{0:?} edge is not supported on channel {1}")]
    UnsupportedTrigger(Trigger, IrqChannel),
    #[error("{context}: {source}")]
    Fpga {
        context: &'static str,
        source: FpgaError,
    },
}

impl IrqError {
    /// Vendor status code equivalent of this error.
    pub fn status(&self) -> Status {
        match self {
            IrqError::NumberOutOfRange(_) => Status::IRQ_NUMBER_NOT_USABLE,
            IrqError::Reserve(e) => e.status(),
            IrqError::WrongChannel(_) | IrqError::UnsupportedTrigger(..) => {
                Status::INVALID_PARAMETER
            }
            IrqError::Fpga { source, .. } => source.status(),
        }
    }
}

pub trait FpgaResultExt<T> {
    /// Tags a failed runtime call with what the driver was doing.
    fn context(self, context: &'static str) -> Result<T, IrqError>;
}

impl<T> FpgaResultExt<T> for FpgaResult<T> {
    fn context(self, context: &'static str) -> Result<T, IrqError> {
        self.map_err(|source| IrqError::Fpga { context, source })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            IrqError::NumberOutOfRange(9).status(),
            Status::IRQ_NUMBER_NOT_USABLE
        );
        assert_eq!(
            IrqError::from(ReserveError::NumberNotUsable(2)).status(),
            Status::IRQ_NUMBER_NOT_USABLE
        );
        assert_eq!(
            IrqError::from(ReserveError::ChannelNotUsable(IrqChannel::Button0)).status(),
            Status::IRQ_CHANNEL_NOT_USABLE
        );
        assert_eq!(
            IrqError::UnsupportedTrigger(Trigger::Both, IrqChannel::AiA0).status(),
            Status::INVALID_PARAMETER
        );
    }

    #[test]
    fn test_context_keeps_status() {
        let result: FpgaResult<u8> = Err(FpgaError::Status(Status::INVALID_SESSION));
        let err = result.context("could not read").unwrap_err();
        assert_eq!(err.status(), Status::INVALID_SESSION);
    }
}
