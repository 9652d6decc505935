use fpga_interface::{IrqContext, RegAddr, Session};
use log::warn;

use super::{claim, release};
use crate::{error::FpgaResultExt, IrqChannel, IrqError, IrqRegistry, TIMER_IRQ_NUMBER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerIrqRegs {
    /// Microseconds left before the timer fires.
    pub read: RegAddr,
    /// Timeout in microseconds, latched by `set`.
    pub write: RegAddr,
    pub set: RegAddr,
}

pub const TIMER_IRQ: TimerIrq = TimerIrq::new(TimerIrqRegs {
    read: 99_904,
    write: 99_908,
    set: 99_902,
});

/// The one-shot timer. It always uses IRQ line 0.
#[derive(Debug, Clone, Copy)]
pub struct TimerIrq {
    regs: TimerIrqRegs,
}

impl TimerIrq {
    pub const fn new(regs: TimerIrqRegs) -> Self {
        Self { regs }
    }

    pub const fn channel(&self) -> IrqChannel {
        IrqChannel::Timer0
    }

    pub const fn number(&self) -> u8 {
        TIMER_IRQ_NUMBER
    }

    pub const fn regs(&self) -> &TimerIrqRegs {
        &self.regs
    }

    /// Arms the timer to fire once after `timeout_us` microseconds.
    pub fn register<S: Session + ?Sized>(
        &self,
        session: &S,
        registry: &IrqRegistry,
        timeout_us: u32,
    ) -> Result<IrqContext, IrqError> {
        if let Err(e) = registry.check_reserved(self.channel(), self.number()) {
            warn!("the only timer interrupt is already registered");
            return Err(e.into());
        }
        claim(session, registry, self.channel(), self.number(), || {
            self.arm(session, timeout_us)
        })
    }

    pub fn unregister<S: Session + ?Sized>(
        &self,
        session: &S,
        registry: &IrqRegistry,
        context: IrqContext,
    ) -> Result<(), IrqError> {
        release(session, registry, self.channel(), self.number(), context, || {
            self.arm(session, 0)
        })
    }

    pub fn remaining_us<S: Session + ?Sized>(&self, session: &S) -> Result<u32, IrqError> {
        session
            .read_u32(self.regs.read)
            .context("could not read from the timer IRQ read register")
    }

    fn arm<S: Session + ?Sized>(&self, session: &S, timeout_us: u32) -> Result<(), IrqError> {
        session
            .write_u32(self.regs.write, timeout_us)
            .context("could not write to the timer IRQ write register")?;
        session
            .write_bool(self.regs.set, true)
            .context("could not write to the timer IRQ set time register")
    }
}
