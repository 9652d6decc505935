use bitflags::bitflags;
use fpga_interface::{IrqContext, RegAddr, Session, Status};

use super::{claim, release};
use crate::{check_irq_number, error::FpgaResultExt, IrqChannel, IrqError, IrqRegistry, Trigger};

bitflags! {
    /// DI interrupt enable register, one bit per channel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DiEnable: u8 {
        const A0 = 1 << 0;
        const A1 = 1 << 1;
        const A2 = 1 << 2;
        const A3 = 1 << 3;
    }
}

bitflags! {
    /// Rising edges in the low byte, falling edges in the high byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DiEdge: u16 {
        const A0_RISING = 1 << 0;
        const A1_RISING = 1 << 1;
        const A2_RISING = 1 << 2;
        const A3_RISING = 1 << 3;
        const A0_FALLING = 1 << 8;
        const A1_FALLING = 1 << 9;
        const A2_FALLING = 1 << 10;
        const A3_FALLING = 1 << 11;
    }
}

impl DiEnable {
    pub const fn channel(index: usize) -> Self {
        Self::from_bits_retain(1 << index)
    }
}

impl DiEdge {
    pub const fn rising(index: usize) -> Self {
        Self::from_bits_retain(1 << index)
    }

    pub const fn falling(index: usize) -> Self {
        Self::from_bits_retain(1 << (index + 8))
    }

    pub fn for_trigger(index: usize, trigger: Trigger) -> Self {
        let mut edge = Self::empty();
        edge.set(Self::rising(index), trigger.rising());
        edge.set(Self::falling(index), trigger.falling());
        edge
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiIrqRegs {
    /// Per-channel count registers, indexed by DIO channel.
    pub count: [RegAddr; 4],
    pub number: [RegAddr; 4],
    pub enable: RegAddr,
    pub rising_edge: RegAddr,
    pub falling_edge: RegAddr,
}

pub const DI_CONNECTOR_A: DiIrq = DiIrq::new(DiIrqRegs {
    count: [99_628, 99_624, 99_620, 99_616],
    number: [99_646, 99_642, 99_638, 99_634],
    enable: 99_650,
    rising_edge: 99_654,
    falling_edge: 99_658,
});

/// Digital input interrupts on DIO0..DIO3 of connector A.
#[derive(Debug, Clone, Copy)]
pub struct DiIrq {
    regs: DiIrqRegs,
}

impl DiIrq {
    pub const fn new(regs: DiIrqRegs) -> Self {
        Self { regs }
    }

    pub const fn regs(&self) -> &DiIrqRegs {
        &self.regs
    }

    fn index(channel: IrqChannel) -> Result<usize, IrqError> {
        match channel {
            IrqChannel::DioA0 | IrqChannel::DioA1 | IrqChannel::DioA2 | IrqChannel::DioA3 => {
                Ok((channel.raw() - IrqChannel::DioA0.raw()) as usize)
            }
            _ => Err(IrqError::WrongChannel(channel)),
        }
    }

    pub fn register<S: Session + ?Sized>(
        &self,
        session: &S,
        registry: &IrqRegistry,
        channel: IrqChannel,
        number: u8,
        count: u32,
        trigger: Trigger,
    ) -> Result<IrqContext, IrqError> {
        let index = Self::index(channel)?;
        let number = check_irq_number(number)?;

        claim(session, registry, channel, number, || {
            session
                .write_u8(self.regs.number[index], number)
                .context("could not write to the DI IRQ number register")?;
            session
                .write_u32(self.regs.count[index], count)
                .context("could not write to the DI IRQ count register")?;

            let enable = self.read_enable(session)? | DiEnable::channel(index);
            let edge = (self.read_edges(session)? - DiEdge::for_trigger(index, Trigger::Both))
                | DiEdge::for_trigger(index, trigger);

            session
                .write_u8(self.regs.enable, enable.bits())
                .context("could not write to the DI IRQ enable register")?;
            self.write_edges(session, edge)
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
            let enable = self.read_enable(session)? - DiEnable::channel(index);
            session
                .write_u8(self.regs.enable, enable.bits())
                .context("could not write to the DI IRQ enable register")
        })
    }

    fn read_enable<S: Session + ?Sized>(&self, session: &S) -> Result<DiEnable, IrqError> {
        session
            .read_u8(self.regs.enable)
            .map(DiEnable::from_bits_retain)
            .context("could not read from the DI IRQ enable register")
    }

    fn read_edges<S: Session + ?Sized>(&self, session: &S) -> Result<DiEdge, IrqError> {
        let mut status = Status::SUCCESS;
        let rising = session.read_u8(self.regs.rising_edge).unwrap_or_else(|e| {
            status.merge(e.status());
            0
        });
        let falling = session.read_u8(self.regs.falling_edge).unwrap_or_else(|e| {
            status.merge(e.status());
            0
        });
        status
            .into_result()
            .context("could not read from the DI IRQ rising/falling edge register")?;

        Ok(DiEdge::from_bits_retain(
            u16::from(rising) | (u16::from(falling) << 8),
        ))
    }

    fn write_edges<S: Session + ?Sized>(&self, session: &S, edge: DiEdge) -> Result<(), IrqError> {
        let [rising, falling] = edge.bits().to_le_bytes();
        let mut status = Status::SUCCESS;
        if let Err(e) = session.write_u8(self.regs.rising_edge, rising) {
            status.merge(e.status());
        }
        if let Err(e) = session.write_u8(self.regs.falling_edge, falling) {
            status.merge(e.status());
        }
        status
            .into_result()
            .context("could not write to the DI IRQ rising/falling edge register")
    }
}
