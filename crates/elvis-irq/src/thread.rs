use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use fpga_interface::Session;
use log::{debug, info};

use crate::IrqWaiter;

/// A worker thread that waits on one IRQ line and runs a handler each time
/// it fires.
///
/// The thread keeps waiting while its continue flag is set. Dropping the
/// handle clears the flag without joining.
pub struct IrqThread {
    number: u8,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<u32>>,
}

impl IrqThread {
    /// Spawns the worker. `handler` gets the IRQ number and how many times it
    /// has fired so far; the line is acknowledged after the handler returns.
    pub fn spawn<S, F>(waiter: IrqWaiter<S>, mut handler: F) -> io::Result<Self>
    where
        S: Session + ?Sized + 'static,
        F: FnMut(u8, u32) + Send + 'static,
    {
        let number = waiter.number();
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::Builder::new()
            .name(format!("irq-{number}"))
            .spawn(move || {
                debug!("IRQ{number} thread started");
                let mut count = 0u32;
                loop {
                    let outcome = waiter.wait(&flag);
                    if outcome.is_asserted(number) {
                        count += 1;
                        handler(number, count);
                        waiter.acknowledge(outcome.asserted);
                    }
                    if !flag.load(Ordering::Acquire) {
                        break;
                    }
                }
                info!("IRQ{number} thread ends after {count} interrupt(s)");
                count
            })?;

        Ok(Self {
            number,
            running,
            handle: Some(handle),
        })
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Clears the continue flag and joins. Returns how many interrupts were
    /// handled. Cancellation takes at most one wait slice.
    pub fn stop(mut self) -> thread::Result<u32> {
        self.running.store(false, Ordering::Release);
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(0),
        }
    }
}

impl Drop for IrqThread {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
