//! Register/unregister sequences for each interrupt-capable peripheral.
//!
//! Every driver follows the same shape: validate the IRQ number, refuse a
//! taken channel or number, reserve an IRQ context, program the personality
//! and finally record the reservation. Unregistering a pair that is not
//! recorded is logged and treated as success, and leaves any other
//! driver's reservation of that number alone.

use fpga_interface::{IrqContext, Session};
use log::{info, warn};

use crate::{error::FpgaResultExt, IrqChannel, IrqError, IrqRegistry};

mod ai;
mod button;
mod di;
mod timer;

pub use ai::{AiConfigure, AiIrq, AiIrqRegs, AiIrqSettings, AI_CONNECTOR_A};
pub use button::{ButtonIrq, ButtonIrqRegs, BUTTON_IRQ};
pub use di::{DiEdge, DiEnable, DiIrq, DiIrqRegs, DI_CONNECTOR_A};
pub use timer::{TimerIrq, TimerIrqRegs, TIMER_IRQ};

fn claim<S, F>(
    session: &S,
    registry: &IrqRegistry,
    channel: IrqChannel,
    number: u8,
    configure: F,
) -> Result<IrqContext, IrqError>
where
    S: Session + ?Sized,
    F: FnOnce() -> Result<(), IrqError>,
{
    if let Err(e) = registry.check_reserved(channel, number) {
        warn!("cannot register {channel} on IRQ{number}: {e}");
        return Err(e.into());
    }

    let context = session
        .reserve_irq_context()
        .context("a required IRQ context was not reserved")?;

    let configured =
        configure().and_then(|()| registry.reserve(channel, number).map_err(IrqError::from));
    if let Err(e) = configured {
        if let Err(release) = session.unreserve_irq_context(context) {
            release.status().report("could not release IRQ context");
        }
        return Err(e);
    }

    info!("{channel} registered on IRQ{number} with context {context:?}");
    Ok(context)
}

fn release<S, F>(
    session: &S,
    registry: &IrqRegistry,
    channel: IrqChannel,
    number: u8,
    context: IrqContext,
    disable: F,
) -> Result<(), IrqError>
where
    S: Session + ?Sized,
    F: FnOnce() -> Result<(), IrqError>,
{
    if registry.channel_number(channel) != Some(number) {
        info!("{channel} was not registered on IRQ{number}, nothing to do");
        return Ok(());
    }

    disable()?;
    registry.remove_reserved(number);
    session
        .unreserve_irq_context(context)
        .context("a required IRQ context was not unreserved")?;

    info!("{channel} unregistered from IRQ{number}");
    Ok(())
}
