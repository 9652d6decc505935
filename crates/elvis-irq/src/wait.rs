use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use fpga_interface::{IrqContext, Session, Status};
use log::trace;

use crate::irq_mask;

/// Upper bound of one blocking call into the runtime.
pub const DEFAULT_WAIT_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// How long each bounded wait may block before the continue flag is
    /// checked again. This bounds cancellation latency.
    pub slice: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            slice: DEFAULT_WAIT_SLICE,
        }
    }
}

/// Result of a cancellable wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOutcome {
    /// Bitmask of asserted IRQs, `0` when nothing fired.
    pub asserted: u32,
    /// Status of the last bounded wait.
    pub status: Status,
    /// Number of bounded waits issued.
    pub slices: u32,
}

impl WaitOutcome {
    pub fn is_asserted(&self, number: u8) -> bool {
        self.asserted & irq_mask(number) != 0
    }
}

/// Waits on IRQ `number` in slices of `config.slice` until it is asserted,
/// a non-timeout status comes back, or `keep_waiting` turns false.
///
/// A non-timeout status is logged only when the caller still wanted to
/// wait; after cancellation the status is returned silently.
pub fn wait<S: Session + ?Sized>(
    session: &S,
    context: IrqContext,
    number: u8,
    keep_waiting: &AtomicBool,
    config: WaitConfig,
) -> WaitOutcome {
    let irqs = irq_mask(number);
    let mut slices: u32 = 0;

    let result = loop {
        let result = session.wait_on_irqs(context, irqs, config.slice);
        slices = slices.saturating_add(1);
        if !result.is_timeout() || !keep_waiting.load(Ordering::Acquire) {
            break result;
        }
    };
    trace!("IRQ{number} wait ended after {slices} slice(s): {}", result.status);

    if keep_waiting.load(Ordering::Acquire) {
        result.status.report("waiting on IRQ failed");
    }

    WaitOutcome {
        asserted: result.asserted,
        status: result.status,
        slices,
    }
}

/// Acknowledges the IRQs in `asserted`. Failures are logged, not returned.
pub fn acknowledge<S: Session + ?Sized>(session: &S, asserted: u32) {
    if let Err(e) = session.acknowledge_irqs(asserted) {
        e.status().report("could not acknowledge IRQ(s)");
    }
}

/// Everything one IRQ thread needs to wait on its line.
pub struct IrqWaiter<S: Session + ?Sized> {
    session: Arc<S>,
    context: IrqContext,
    number: u8,
    config: WaitConfig,
}

impl<S: Session + ?Sized> IrqWaiter<S> {
    pub fn new(session: Arc<S>, context: IrqContext, number: u8) -> Self {
        Self {
            session,
            context,
            number,
            config: WaitConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WaitConfig) -> Self {
        self.config = config;
        self
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn context(&self) -> IrqContext {
        self.context
    }

    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    pub fn wait(&self, keep_waiting: &AtomicBool) -> WaitOutcome {
        wait(
            self.session.as_ref(),
            self.context,
            self.number,
            keep_waiting,
            self.config,
        )
    }

    pub fn acknowledge(&self, asserted: u32) {
        acknowledge(self.session.as_ref(), asserted)
    }
}
