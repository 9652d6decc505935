use fpga_interface::{IrqContext, RegAddr, Session};

use super::{claim, release};
use crate::{check_irq_number, error::FpgaResultExt, IrqChannel, IrqError, IrqRegistry, Trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonIrqRegs {
    /// Interrupts are raised every `count` qualifying edges.
    pub count: RegAddr,
    pub number: RegAddr,
    pub enable: RegAddr,
    pub rising_edge: RegAddr,
    pub falling_edge: RegAddr,
}

pub const BUTTON_IRQ: ButtonIrq = ButtonIrq::new(ButtonIrqRegs {
    count: 100_012,
    number: 100_006,
    enable: 100_018,
    rising_edge: 100_026,
    falling_edge: 100_022,
});

/// The onboard user button.
#[derive(Debug, Clone, Copy)]
pub struct ButtonIrq {
    regs: ButtonIrqRegs,
}

impl ButtonIrq {
    pub const fn new(regs: ButtonIrqRegs) -> Self {
        Self { regs }
    }

    pub const fn channel(&self) -> IrqChannel {
        IrqChannel::Button0
    }

    pub const fn regs(&self) -> &ButtonIrqRegs {
        &self.regs
    }

    pub fn register<S: Session + ?Sized>(
        &self,
        session: &S,
        registry: &IrqRegistry,
        number: u8,
        count: u32,
        trigger: Trigger,
    ) -> Result<IrqContext, IrqError> {
        let number = check_irq_number(number)?;

        claim(session, registry, self.channel(), number, || {
            session
                .write_u8(self.regs.number, number)
                .context("could not write to the button IRQ number register")?;
            session
                .write_u32(self.regs.count, count)
                .context("could not write to the button IRQ count register")?;
            session
                .write_bool(self.regs.enable, true)
                .context("could not write to the button IRQ enable register")?;
            session
                .write_bool(self.regs.rising_edge, trigger.rising())
                .context("could not write to the button IRQ rising edge register")?;
            session
                .write_bool(self.regs.falling_edge, trigger.falling())
                .context("could not write to the button IRQ falling edge register")?;
            Ok(())
        })
    }

    pub fn unregister<S: Session + ?Sized>(
        &self,
        session: &S,
        registry: &IrqRegistry,
        context: IrqContext,
        number: u8,
    ) -> Result<(), IrqError> {
        let number = check_irq_number(number)?;

        release(session, registry, self.channel(), number, context, || {
            session
                .write_bool(self.regs.enable, false)
                .context("could not write to the button IRQ enable register")
        })
    }
}
