//! IRQ support for the ELVIS III FPGA personality.
//!
//! [`IrqRegistry`] keeps each channel and IRQ number exclusive, the
//! [`drivers`] program interrupt sources, and [`IrqWaiter`] / [`IrqThread`]
//! wait on a line in bounded slices so the wait can be cancelled from
//! another thread.

mod channel;
pub mod drivers;
mod error;
mod registry;
mod thread;
mod wait;

pub use channel::{
    check_irq_number, irq_mask, IrqChannel, Trigger, IRQNO_MAX, IRQNO_MIN, TIMER_IRQ_NUMBER,
};
pub use error::{FpgaResultExt, IrqError, ReserveError};
pub use registry::{IrqRegistry, Reservation};
pub use thread::IrqThread;
pub use wait::{acknowledge, wait, IrqWaiter, WaitConfig, WaitOutcome, DEFAULT_WAIT_SLICE};
