use core::fmt::{self, Display};

use crate::IrqError;

/// Lowest IRQ number a peripheral interrupt may use.
pub const IRQNO_MIN: u8 = 1;
/// Highest IRQ number a peripheral interrupt may use.
pub const IRQNO_MAX: u8 = 8;
/// The timer interrupt always fires on line 0.
pub const TIMER_IRQ_NUMBER: u8 = 0;

/// Interrupt-capable sources of the personality.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IrqChannel {
    AiA0 = 0,
    AiA1 = 1,
    DioA0 = 2,
    DioA1 = 3,
    DioA2 = 4,
    DioA3 = 5,
    Button0 = 6,
    Timer0 = 7,
}

impl IrqChannel {
    pub const ALL: [IrqChannel; 8] = [
        IrqChannel::AiA0,
        IrqChannel::AiA1,
        IrqChannel::DioA0,
        IrqChannel::DioA1,
        IrqChannel::DioA2,
        IrqChannel::DioA3,
        IrqChannel::Button0,
        IrqChannel::Timer0,
    ];

    pub const fn raw(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for IrqChannel {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(value as usize).copied().ok_or(value)
    }
}

impl Display for IrqChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IrqChannel::AiA0 => "AI A0",
            IrqChannel::AiA1 => "AI A1",
            IrqChannel::DioA0 => "DIO A0",
            IrqChannel::DioA1 => "DIO A1",
            IrqChannel::DioA2 => "DIO A2",
            IrqChannel::DioA3 => "DIO A3",
            IrqChannel::Button0 => "Button0",
            IrqChannel::Timer0 => "Timer0",
        };
        f.write_str(name)
    }
}

/// Edge an interrupt fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Trigger {
    #[default]
    Rising,
    Falling,
    Both,
}

impl Trigger {
    pub const fn rising(self) -> bool {
        matches!(self, Trigger::Rising | Trigger::Both)
    }

    pub const fn falling(self) -> bool {
        matches!(self, Trigger::Falling | Trigger::Both)
    }
}

/// Rejects IRQ numbers outside `IRQNO_MIN..=IRQNO_MAX`.
pub fn check_irq_number(number: u8) -> Result<u8, IrqError> {
    if (IRQNO_MIN..=IRQNO_MAX).contains(&number) {
        Ok(number)
    } else {
        Err(IrqError::NumberOutOfRange(number))
    }
}

/// Bitmask selecting `number` in a wait or acknowledge call.
pub const fn irq_mask(number: u8) -> u32 {
    match 1u32.checked_shl(number as u32) {
        Some(mask) => mask,
        None => 0,
    }
}
