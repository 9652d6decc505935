//! Simulated FPGA session.
//!
//! [`SimSession`] implements [`fpga_interface::Session`] entirely in memory so
//! IRQ drivers can be exercised without the vendor runtime or a board. Tests
//! can script wait results, inject register faults and inspect every
//! acknowledge; [`Stimulus`] asserts lines periodically from another thread.

mod session;
mod stimulus;

pub use session::{SimSession, WaitHook};
pub use stimulus::Stimulus;
