use std::{
    sync::{atomic::AtomicBool, Arc},
    time::Duration,
};

use elvis_irq::{
    drivers::{AiIrqSettings, AI_CONNECTOR_A, BUTTON_IRQ, DI_CONNECTOR_A, TIMER_IRQ},
    IrqChannel, IrqError, IrqRegistry, IrqThread, IrqWaiter, ReserveError, Trigger, WaitConfig,
    TIMER_IRQ_NUMBER,
};
use fpga_interface::{DriverGeneric, Status};
use fpga_sim::SimSession;

fn opened() -> SimSession {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut session = SimSession::new();
    session.open().unwrap();
    session
}

#[test]
fn test_button_register_programs_registers() {
    let session = opened();
    let registry = IrqRegistry::new();
    let regs = BUTTON_IRQ.regs();

    BUTTON_IRQ
        .register(&session, &registry, 3, 1, Trigger::Rising)
        .unwrap();

    assert_eq!(session.peek(regs.number), Some(3));
    assert_eq!(session.peek(regs.count), Some(1));
    assert_eq!(session.peek(regs.enable), Some(1));
    assert_eq!(session.peek(regs.rising_edge), Some(1));
    assert_eq!(session.peek(regs.falling_edge), Some(0));
    assert_eq!(registry.channel_number(IrqChannel::Button0), Some(3));
    assert_eq!(session.reserved_contexts(), 1);
}

#[test]
fn test_button_both_edges() {
    let session = opened();
    let registry = IrqRegistry::new();
    let regs = BUTTON_IRQ.regs();

    BUTTON_IRQ
        .register(&session, &registry, 4, 2, Trigger::Both)
        .unwrap();

    assert_eq!(session.peek(regs.rising_edge), Some(1));
    assert_eq!(session.peek(regs.falling_edge), Some(1));
}

#[test]
fn test_number_out_of_range_touches_nothing() {
    let session = opened();
    let registry = IrqRegistry::new();

    let err = BUTTON_IRQ
        .register(&session, &registry, 9, 1, Trigger::Rising)
        .unwrap_err();
    assert_eq!(err, IrqError::NumberOutOfRange(9));
    assert_eq!(err.status(), Status::IRQ_NUMBER_NOT_USABLE);
    assert_eq!(session.peek(BUTTON_IRQ.regs().number), None);
    assert_eq!(session.reserved_contexts(), 0);
}

#[test]
fn test_taken_number_is_refused() {
    let session = opened();
    let registry = IrqRegistry::new();

    DI_CONNECTOR_A
        .register(&session, &registry, IrqChannel::DioA0, 2, 2, Trigger::Rising)
        .unwrap();
    let err = BUTTON_IRQ
        .register(&session, &registry, 2, 1, Trigger::Rising)
        .unwrap_err();

    assert_eq!(err, IrqError::Reserve(ReserveError::NumberNotUsable(2)));
    assert_eq!(session.reserved_contexts(), 1);
    assert!(!registry.is_reserved_channel(IrqChannel::Button0));
}

#[test]
fn test_taken_channel_is_refused() {
    let session = opened();
    let registry = IrqRegistry::new();

    BUTTON_IRQ
        .register(&session, &registry, 3, 1, Trigger::Rising)
        .unwrap();
    let err = BUTTON_IRQ
        .register(&session, &registry, 4, 1, Trigger::Rising)
        .unwrap_err();

    assert_eq!(err.status(), Status::IRQ_CHANNEL_NOT_USABLE);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_write_failure_releases_context() {
    let session = opened();
    let registry = IrqRegistry::new();
    session.fail_register(BUTTON_IRQ.regs().enable, Status::INVALID_SESSION);

    let err = BUTTON_IRQ
        .register(&session, &registry, 3, 1, Trigger::Rising)
        .unwrap_err();

    assert!(matches!(err, IrqError::Fpga { .. }));
    assert_eq!(err.status(), Status::INVALID_SESSION);
    assert_eq!(session.reserved_contexts(), 0);
    assert!(registry.is_empty());
}

#[test]
fn test_button_unregister() {
    let session = opened();
    let registry = IrqRegistry::new();
    let ctx = BUTTON_IRQ
        .register(&session, &registry, 3, 1, Trigger::Rising)
        .unwrap();

    BUTTON_IRQ.unregister(&session, &registry, ctx, 3).unwrap();
    assert_eq!(session.peek(BUTTON_IRQ.regs().enable), Some(0));
    assert!(registry.is_empty());
    assert_eq!(session.reserved_contexts(), 0);

    // Already gone: logged, not an error.
    BUTTON_IRQ.unregister(&session, &registry, ctx, 3).unwrap();
}

#[test]
fn test_unregister_leaves_other_claim_alone() {
    let session = opened();
    let registry = IrqRegistry::new();
    let ctx = DI_CONNECTOR_A
        .register(&session, &registry, IrqChannel::DioA0, 2, 1, Trigger::Rising)
        .unwrap();
    session.poke(BUTTON_IRQ.regs().enable, 1);

    BUTTON_IRQ.unregister(&session, &registry, ctx, 2).unwrap();

    assert_eq!(registry.channel_number(IrqChannel::DioA0), Some(2));
    assert_eq!(session.peek(BUTTON_IRQ.regs().enable), Some(1));
    assert_eq!(session.peek(DI_CONNECTOR_A.regs().enable), Some(0b0001));
    assert_eq!(session.reserved_contexts(), 1);
}

#[test]
fn test_di_keeps_other_channels() {
    let session = opened();
    let registry = IrqRegistry::new();
    let regs = DI_CONNECTOR_A.regs();
    session.poke(regs.enable, 0b0001);
    session.poke(regs.rising_edge, 0b0001);

    let ctx = DI_CONNECTOR_A
        .register(&session, &registry, IrqChannel::DioA1, 2, 5, Trigger::Falling)
        .unwrap();

    assert_eq!(session.peek(regs.number[1]), Some(2));
    assert_eq!(session.peek(regs.count[1]), Some(5));
    assert_eq!(session.peek(regs.enable), Some(0b0011));
    assert_eq!(session.peek(regs.rising_edge), Some(0b0001));
    assert_eq!(session.peek(regs.falling_edge), Some(0b0010));

    DI_CONNECTOR_A
        .unregister(&session, &registry, ctx, IrqChannel::DioA1, 2)
        .unwrap();
    assert_eq!(session.peek(regs.enable), Some(0b0001));
}

#[test]
fn test_di_trigger_replaces_previous_edges() {
    let session = opened();
    let registry = IrqRegistry::new();
    let regs = DI_CONNECTOR_A.regs();
    session.poke(regs.falling_edge, 0b0100);

    DI_CONNECTOR_A
        .register(&session, &registry, IrqChannel::DioA2, 6, 1, Trigger::Rising)
        .unwrap();

    assert_eq!(session.peek(regs.rising_edge), Some(0b0100));
    assert_eq!(session.peek(regs.falling_edge), Some(0));
}

#[test]
fn test_di_edge_read_failure() {
    let session = opened();
    let registry = IrqRegistry::new();
    session.fail_register(DI_CONNECTOR_A.regs().falling_edge, Status::new(-1));

    let err = DI_CONNECTOR_A
        .register(&session, &registry, IrqChannel::DioA0, 2, 1, Trigger::Rising)
        .unwrap_err();
    assert_eq!(err.status(), Status::new(-1));
    assert!(registry.is_empty());
}

#[test]
fn test_di_rejects_other_channels() {
    let session = opened();
    let registry = IrqRegistry::new();

    let err = DI_CONNECTOR_A
        .register(&session, &registry, IrqChannel::AiA0, 2, 1, Trigger::Rising)
        .unwrap_err();
    assert_eq!(err, IrqError::WrongChannel(IrqChannel::AiA0));
    assert_eq!(err.status(), Status::INVALID_PARAMETER);
}

#[test]
fn test_ai_configure_register() {
    let session = opened();
    let registry = IrqRegistry::new();
    let regs = AI_CONNECTOR_A.regs();
    session.poke(regs.configure, 0x03);

    let ctx = AI_CONNECTOR_A
        .register(
            &session,
            &registry,
            IrqChannel::AiA1,
            AiIrqSettings {
                number: 1,
                threshold: 0x4000,
                hysteresis: 0x0014,
                trigger: Trigger::Rising,
            },
        )
        .unwrap();

    assert_eq!(session.peek(regs.number[1]), Some(1));
    assert_eq!(session.peek(regs.threshold[1]), Some(0x4000));
    assert_eq!(session.peek(regs.hysteresis[1]), Some(0x0014));
    assert_eq!(session.peek(regs.configure), Some(0x0f));

    AI_CONNECTOR_A
        .unregister(&session, &registry, ctx, IrqChannel::AiA1, 1)
        .unwrap();
    assert_eq!(session.peek(regs.configure), Some(0x0b));
}

#[test]
fn test_ai_unregister_keeps_edge_type() {
    let session = opened();
    let registry = IrqRegistry::new();
    let regs = AI_CONNECTOR_A.regs();

    let ctx = AI_CONNECTOR_A
        .register(
            &session,
            &registry,
            IrqChannel::AiA0,
            AiIrqSettings {
                number: 1,
                threshold: 0,
                hysteresis: 0,
                trigger: Trigger::Rising,
            },
        )
        .unwrap();
    assert_eq!(session.peek(regs.configure), Some(0x03));

    AI_CONNECTOR_A
        .unregister(&session, &registry, ctx, IrqChannel::AiA0, 1)
        .unwrap();
    assert_eq!(session.peek(regs.configure), Some(0x02));
}

#[test]
fn test_ai_falling_clears_type_bit() {
    let session = opened();
    let registry = IrqRegistry::new();
    let regs = AI_CONNECTOR_A.regs();
    session.poke(regs.configure, 0x03);

    AI_CONNECTOR_A
        .register(
            &session,
            &registry,
            IrqChannel::AiA0,
            AiIrqSettings {
                number: 1,
                threshold: 0,
                hysteresis: 0,
                trigger: Trigger::Falling,
            },
        )
        .unwrap();
    assert_eq!(session.peek(regs.configure), Some(0x01));
}

#[test]
fn test_ai_rejects_both_edges() {
    let session = opened();
    let registry = IrqRegistry::new();

    let err = AI_CONNECTOR_A
        .register(
            &session,
            &registry,
            IrqChannel::AiA0,
            AiIrqSettings {
                number: 1,
                threshold: 0,
                hysteresis: 0,
                trigger: Trigger::Both,
            },
        )
        .unwrap_err();
    assert_eq!(
        err,
        IrqError::UnsupportedTrigger(Trigger::Both, IrqChannel::AiA0)
    );
    assert_eq!(session.reserved_contexts(), 0);
}

#[test]
fn test_timer_fires_once() {
    let regs = *TIMER_IRQ.regs();
    let mut session = SimSession::new().with_timer(regs.write, regs.set);
    session.open().unwrap();
    let session = Arc::new(session);
    let registry = IrqRegistry::new();

    let ctx = TIMER_IRQ
        .register(session.as_ref(), &registry, 20_000)
        .unwrap();
    assert_eq!(session.peek(regs.write), Some(20_000));
    assert_eq!(
        registry.channel_number(IrqChannel::Timer0),
        Some(TIMER_IRQ_NUMBER)
    );

    let waiter = IrqWaiter::new(session.clone(), ctx, TIMER_IRQ_NUMBER).with_config(WaitConfig {
        slice: Duration::from_millis(10),
    });
    let outcome = waiter.wait(&AtomicBool::new(true));
    assert!(outcome.is_asserted(TIMER_IRQ_NUMBER));
    waiter.acknowledge(outcome.asserted);

    TIMER_IRQ
        .unregister(session.as_ref(), &registry, ctx)
        .unwrap();
    assert_eq!(session.peek(regs.write), Some(0));
    assert!(registry.is_empty());
}

#[test]
fn test_timer_is_exclusive() {
    let session = opened();
    let registry = IrqRegistry::new();

    TIMER_IRQ.register(&session, &registry, 1_000).unwrap();
    let err = TIMER_IRQ.register(&session, &registry, 1_000).unwrap_err();
    assert_eq!(err, IrqError::Reserve(ReserveError::NumberNotUsable(0)));
    assert_eq!(TIMER_IRQ.remaining_us(&session).unwrap(), 0);
}

#[test]
fn test_timer_thread_handler() {
    let regs = *TIMER_IRQ.regs();
    let mut session = SimSession::new().with_timer(regs.write, regs.set);
    session.open().unwrap();
    let session = Arc::new(session);
    let registry = IrqRegistry::new();
    let ctx = TIMER_IRQ
        .register(session.as_ref(), &registry, 5_000)
        .unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let waiter = IrqWaiter::new(session.clone(), ctx, TIMER_IRQ_NUMBER).with_config(WaitConfig {
        slice: Duration::from_millis(10),
    });
    let worker = IrqThread::spawn(waiter, move |number, count| {
        let _ = tx.send((number, count));
    })
    .unwrap();

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok((0, 1)));
    assert_eq!(worker.stop().unwrap(), 1);
}
