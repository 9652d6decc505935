use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::trace;

use crate::SimSession;

/// Background thread that keeps asserting a set of IRQ lines at a fixed
/// period, standing in for a button being pressed or an input toggling.
pub struct Stimulus {
    running: Arc<AtomicBool>,
    handle: JoinHandle<u32>,
}

impl Stimulus {
    pub fn start(session: Arc<SimSession>, mask: u32, period: Duration) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = thread::Builder::new()
            .name("stimulus".into())
            .spawn(move || {
                let mut fired = 0;
                while flag.load(Ordering::Acquire) {
                    thread::sleep(period);
                    if !flag.load(Ordering::Acquire) {
                        break;
                    }
                    trace!("stimulus asserts {mask:#x}");
                    session.assert_irqs(mask);
                    fired += 1;
                }
                fired
            })?;
        Ok(Self { running, handle })
    }

    /// Stops the thread and returns how many times it asserted the lines.
    pub fn stop(self) -> thread::Result<u32> {
        self.running.store(false, Ordering::Release);
        self.handle.join()
    }
}
