#![no_std]

mod _macro;
mod err;
mod session;
mod status;

pub use err::{FpgaError, FpgaResult};
pub use session::{DriverGeneric, FifoId, IrqContext, IrqWait, RegAddr, Session};
pub use status::Status;
