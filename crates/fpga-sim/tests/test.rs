use std::{sync::Arc, thread, time::Duration};

use fpga_interface::{DriverGeneric, IrqWait, Session, Status};
use fpga_sim::{SimSession, Stimulus};

fn opened() -> Arc<SimSession> {
    let mut session = SimSession::new();
    session.open().unwrap();
    Arc::new(session)
}

#[test]
fn test_waiter_is_woken_by_other_thread() {
    let session = opened();
    let ctx = session.reserve_irq_context().unwrap();

    let raiser = {
        let session = session.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            session.assert_irqs(1 << 4);
        })
    };

    let result = session.wait_on_irqs(ctx, 1 << 4, Duration::from_secs(5));
    raiser.join().unwrap();

    assert_eq!(result, IrqWait::asserted(1 << 4));
}

#[test]
fn test_unrelated_line_does_not_wake() {
    let session = opened();
    let ctx = session.reserve_irq_context().unwrap();
    session.assert_irqs(1 << 1);

    let result = session.wait_on_irqs(ctx, 1 << 4, Duration::from_millis(10));
    assert!(result.is_timeout());
}

#[test]
fn test_scripted_results_come_first() {
    let session = opened();
    let ctx = session.reserve_irq_context().unwrap();
    session.push_wait_result(IrqWait {
        status: Status::new(12),
        asserted: 0,
    });

    let result = session.wait_on_irqs(ctx, 1, Duration::from_secs(5));
    assert_eq!(result.status, Status::new(12));
    assert_eq!(session.last_wait_timeout(), Some(Duration::from_secs(5)));
}

#[test]
fn test_stimulus_asserts_lines() {
    let _ = env_logger::builder().is_test(true).try_init();

    let session = opened();
    let ctx = session.reserve_irq_context().unwrap();
    let stimulus = Stimulus::start(session.clone(), 1 << 3, Duration::from_millis(5)).unwrap();

    let result = session.wait_on_irqs(ctx, 1 << 3, Duration::from_secs(5));
    let fired = stimulus.stop().unwrap();

    assert_eq!(result.asserted, 1 << 3);
    assert!(fired >= 1);
}

#[test]
fn test_fifo_stream() {
    let session = opened();
    session.fifo_push(0, &[1, 2, 3]);

    let mut buf = [0u64; 2];
    let remaining = session
        .read_fifo_u64(0, &mut buf, Duration::from_millis(1))
        .unwrap();
    assert_eq!(buf, [1, 2]);
    assert_eq!(remaining, 1);

    let mut too_many = [0u64; 4];
    assert!(session
        .read_fifo_u64(0, &mut too_many, Duration::from_millis(1))
        .is_err());
}
