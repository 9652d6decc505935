use bitflags::bitflags;
use fpga_interface::{IrqContext, RegAddr, Session};

use super::{claim, release};
use crate::{check_irq_number, error::FpgaResultExt, IrqChannel, IrqError, IrqRegistry, Trigger};

bitflags! {
    /// AI interrupt configure register. A set type bit selects the rising
    /// edge, a clear one the falling edge.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AiConfigure: u8 {
        const A0_ENABLE = 0x01;
        const A0_RISING = 0x02;
        const A1_ENABLE = 0x04;
        const A1_RISING = 0x08;
    }
}

impl AiConfigure {
    fn channel_mask(index: usize) -> Self {
        match index {
            0 => Self::A0_ENABLE | Self::A0_RISING,
            _ => Self::A1_ENABLE | Self::A1_RISING,
        }
    }

    fn enable(index: usize) -> Self {
        match index {
            0 => Self::A0_ENABLE,
            _ => Self::A1_ENABLE,
        }
    }

    fn for_trigger(index: usize, trigger: Trigger) -> Self {
        let (enable, rising) = match index {
            0 => (Self::A0_ENABLE, Self::A0_RISING),
            _ => (Self::A1_ENABLE, Self::A1_RISING),
        };
        if trigger.rising() {
            enable | rising
        } else {
            enable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiIrqRegs {
    pub number: [RegAddr; 2],
    pub threshold: [RegAddr; 2],
    pub hysteresis: [RegAddr; 2],
    pub configure: RegAddr,
}

pub const AI_CONNECTOR_A: AiIrq = AiIrq::new(AiIrqRegs {
    number: [99_722, 99_718],
    threshold: [99_708, 99_712],
    hysteresis: [99_700, 99_696],
    configure: 99_726,
});

/// Threshold crossing settings. Threshold and hysteresis are the raw
/// fixed-point register words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiIrqSettings {
    pub number: u8,
    pub threshold: u32,
    pub hysteresis: u32,
    pub trigger: Trigger,
}

/// Analog input threshold interrupts on AI0/AI1 of connector A.
#[derive(Debug, Clone, Copy)]
pub struct AiIrq {
    regs: AiIrqRegs,
}

impl AiIrq {
    pub const fn new(regs: AiIrqRegs) -> Self {
        Self { regs }
    }

    pub const fn regs(&self) -> &AiIrqRegs {
        &self.regs
    }

    fn index(channel: IrqChannel) -> Result<usize, IrqError> {
        match channel {
            IrqChannel::AiA0 => Ok(0),
            IrqChannel::AiA1 => Ok(1),
            _ => Err(IrqError::WrongChannel(channel)),
        }
    }

    pub fn register<S: Session + ?Sized>(
        &self,
        session: &S,
        registry: &IrqRegistry,
        channel: IrqChannel,
        settings: AiIrqSettings,
    ) -> Result<IrqContext, IrqError> {
        let index = Self::index(channel)?;
        let number = check_irq_number(settings.number)?;
        if settings.trigger == Trigger::Both {
            return Err(IrqError::UnsupportedTrigger(settings.trigger, channel));
        }

        claim(session, registry, channel, number, || {
            session
                .write_u8(self.regs.number[index], number)
                .context("could not write to the AI IRQ number register")?;
            session
                .write_u32(self.regs.threshold[index], settings.threshold)
                .context("could not write to the AI IRQ threshold register")?;
            session
                .write_u32(self.regs.hysteresis[index], settings.hysteresis)
                .context("could not write to the AI IRQ hysteresis register")?;

            let configure = (self.read_configure(session)? - AiConfigure::channel_mask(index))
                | AiConfigure::for_trigger(index, settings.trigger);
            self.write_configure(session, configure)
        })
    }

    pub fn unregister<S: Session + ?Sized>(
        &self,
        session: &S,
        registry: &IrqRegistry,
        context: IrqContext,
        channel: IrqChannel,
        number: u8,
    ) -> Result<(), IrqError> {
        let index = Self::index(channel)?;
        let number = check_irq_number(number)?;

        release(session, registry, channel, number, context, || {
            let configure = self.read_configure(session)? - AiConfigure::enable(index);
            self.write_configure(session, configure)
        })
    }

    fn read_configure<S: Session + ?Sized>(&self, session: &S) -> Result<AiConfigure, IrqError> {
        session
            .read_u8(self.regs.configure)
            .map(AiConfigure::from_bits_retain)
            .context("could not read from the AI IRQ configure register")
    }

    fn write_configure<S: Session + ?Sized>(
        &self,
        session: &S,
        configure: AiConfigure,
    ) -> Result<(), IrqError> {
        session
            .write_u8(self.regs.configure, configure.bits())
            .context("could not write to the AI IRQ configure register")
    }
}
