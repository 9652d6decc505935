use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Result};
use elvis_config::ProjectConfig;
use elvis_irq::{
    drivers::{AiIrqSettings, AI_CONNECTOR_A, BUTTON_IRQ, DI_CONNECTOR_A, TIMER_IRQ},
    irq_mask, IrqChannel, IrqError, IrqRegistry, IrqThread, IrqWaiter,
};
use fpga_interface::{DriverGeneric, IrqContext};
use fpga_sim::{SimSession, Stimulus};
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Example {
    Button,
    Timer,
    Di,
    Ai,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub duration_secs: Option<u64>,
    pub irq: Option<u8>,
}

#[derive(Debug, Clone, Copy)]
struct Registered {
    context: IrqContext,
    channel: IrqChannel,
    number: u8,
}

impl Example {
    fn register(
        self,
        session: &SimSession,
        registry: &IrqRegistry,
        config: &ProjectConfig,
        irq: Option<u8>,
    ) -> Result<Registered, IrqError> {
        match self {
            Example::Button => {
                let button = config.button();
                let number = irq.unwrap_or(button.irq);
                let context =
                    BUTTON_IRQ.register(session, registry, number, button.count, button.trigger)?;
                Ok(Registered {
                    context,
                    channel: BUTTON_IRQ.channel(),
                    number,
                })
            }
            Example::Timer => {
                if irq.is_some() {
                    warn!("the timer always uses IRQ{}", TIMER_IRQ.number());
                }
                let context = TIMER_IRQ.register(session, registry, config.timer().timeout_us)?;
                Ok(Registered {
                    context,
                    channel: TIMER_IRQ.channel(),
                    number: TIMER_IRQ.number(),
                })
            }
            Example::Di => {
                let di = config.di();
                let number = irq.unwrap_or(di.irq);
                let context = DI_CONNECTOR_A.register(
                    session, registry, di.channel, number, di.count, di.trigger,
                )?;
                Ok(Registered {
                    context,
                    channel: di.channel,
                    number,
                })
            }
            Example::Ai => {
                let ai = config.ai();
                let settings = AiIrqSettings {
                    number: irq.unwrap_or(ai.irq),
                    threshold: ai.threshold,
                    hysteresis: ai.hysteresis,
                    trigger: ai.trigger,
                };
                let context = AI_CONNECTOR_A.register(session, registry, ai.channel, settings)?;
                Ok(Registered {
                    context,
                    channel: ai.channel,
                    number: settings.number,
                })
            }
        }
    }

    fn unregister(
        self,
        session: &SimSession,
        registry: &IrqRegistry,
        registered: Registered,
    ) -> Result<(), IrqError> {
        let Registered {
            context,
            channel,
            number,
        } = registered;
        match self {
            Example::Button => BUTTON_IRQ.unregister(session, registry, context, number),
            Example::Timer => TIMER_IRQ.unregister(session, registry, context),
            Example::Di => DI_CONNECTOR_A.unregister(session, registry, context, channel, number),
            Example::Ai => AI_CONNECTOR_A.unregister(session, registry, context, channel, number),
        }
    }
}

pub fn run(example: Example, config: &ProjectConfig, options: Options) -> Result<()> {
    let timer = TIMER_IRQ.regs();
    let mut session = SimSession::new().with_timer(timer.write, timer.set);
    session.open()?;
    let session = Arc::new(session);
    let registry = IrqRegistry::new();

    let registered = match example.register(&session, &registry, config, options.irq) {
        Ok(registered) => registered,
        Err(e) => {
            println!("CONFIGURE ERROR: {}", e.status().raw());
            return Err(e.into());
        }
    };

    let (stimulus, worker) = match start(example, &session, registered, config) {
        Ok(started) => started,
        Err(e) => return Err(abort(example, &session, &registry, registered, e)),
    };

    let duration = Duration::from_secs(options.duration_secs.unwrap_or(config.demo.duration_secs));
    main_loop(duration, Duration::from_secs(config.demo.print_step_secs.max(1)));

    if let Some(stimulus) = stimulus {
        stimulus
            .stop()
            .map_err(|_| anyhow!("stimulus thread panicked"))?;
    }
    let handled = worker
        .stop()
        .map_err(|_| anyhow!("IRQ{} thread panicked", registered.number))?;
    info!("{} handled {handled} interrupt(s)", registered.channel);

    example.unregister(&session, &registry, registered)?;

    match Arc::into_inner(session) {
        Some(mut session) => session.close()?,
        None => warn!("session is still shared, leaving it open"),
    }
    Ok(())
}

fn start(
    example: Example,
    session: &Arc<SimSession>,
    registered: Registered,
    config: &ProjectConfig,
) -> Result<(Option<Stimulus>, IrqThread)> {
    let stimulus = match example {
        Example::Timer => None,
        _ => Some(Stimulus::start(
            session.clone(),
            irq_mask(registered.number),
            Duration::from_millis(config.demo.stimulus_ms.max(1)),
        )?),
    };

    let waiter = IrqWaiter::new(session.clone(), registered.context, registered.number)
        .with_config(config.irq.wait_config());
    match IrqThread::spawn(waiter, |number, count| println!("IRQ{number},{count}")) {
        Ok(worker) => Ok((stimulus, worker)),
        Err(e) => {
            if let Some(stimulus) = stimulus {
                let _ = stimulus.stop();
            }
            Err(e.into())
        }
    }
}

/// Undoes a registration whose workers failed to start, returning `err`.
fn abort(
    example: Example,
    session: &SimSession,
    registry: &IrqRegistry,
    registered: Registered,
    err: anyhow::Error,
) -> anyhow::Error {
    if let Err(e) = example.unregister(session, registry, registered) {
        warn!("could not unregister {}: {e}", registered.channel);
    }
    err
}

fn main_loop(duration: Duration, step: Duration) {
    let start = Instant::now();
    let mut k = 0u64;
    while start.elapsed() < duration {
        println!("main loop,{k}");
        k += 1;
        thread::sleep(step.min(duration.saturating_sub(start.elapsed())));
    }
}
