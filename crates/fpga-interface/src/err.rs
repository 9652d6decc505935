use thiserror::Error;

use crate::Status;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpgaError {
    #[error("{0}")]
    Status(Status),
}

impl FpgaError {
    pub fn status(&self) -> Status {
        match self {
            FpgaError::Status(status) => *status,
        }
    }
}

impl From<Status> for FpgaError {
    fn from(value: Status) -> Self {
        Self::Status(value)
    }
}

pub type FpgaResult<T = ()> = core::result::Result<T, FpgaError>;
