use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Condvar, Mutex, MutexGuard, PoisonError,
    },
    time::{Duration, Instant},
};

use fpga_interface::{
    DriverGeneric, FifoId, FpgaError, FpgaResult, IrqContext, IrqWait, RegAddr, Session, Status,
};
use log::{debug, trace};

/// Called on every `wait_on_irqs` with the 1-based call index. Returning
/// `Some` short-circuits the wait with that result.
pub type WaitHook = Box<dyn FnMut(usize) -> Option<IrqWait> + Send>;

const FIFO_DEPTH: usize = 1024;

/// Pair of registers emulating the one-shot timer IRQ on line 0.
#[derive(Debug, Clone, Copy)]
struct TimerRegs {
    write: RegAddr,
    set: RegAddr,
}

#[derive(Default)]
struct State {
    registers: BTreeMap<RegAddr, u64>,
    arrays: BTreeMap<RegAddr, Vec<u64>>,
    fifos: BTreeMap<FifoId, VecDeque<u64>>,
    faults: BTreeMap<RegAddr, Status>,
    ack_fault: Option<Status>,

    pending: u32,
    scripted: VecDeque<IrqWait>,
    hook: Option<WaitHook>,
    contexts: BTreeSet<IrqContext>,
    next_context: usize,

    wait_calls: usize,
    last_wait_timeout: Option<Duration>,
    acknowledged: Vec<u32>,

    timer: Option<TimerRegs>,
    timer_deadline: Option<Instant>,
}

impl State {
    fn check(&self, reg: RegAddr) -> FpgaResult {
        match self.faults.get(&reg) {
            Some(status) => Err(FpgaError::Status(*status)),
            None => Ok(()),
        }
    }

    fn read(&self, reg: RegAddr) -> FpgaResult<u64> {
        self.check(reg)?;
        Ok(self.registers.get(&reg).copied().unwrap_or(0))
    }

    fn write(&mut self, reg: RegAddr, value: u64) -> FpgaResult {
        self.check(reg)?;
        self.registers.insert(reg, value);

        if let Some(timer) = self.timer {
            if reg == timer.set && value != 0 {
                let micros = self.registers.get(&timer.write).copied().unwrap_or(0);
                self.timer_deadline = if micros == 0 {
                    None
                } else {
                    Some(Instant::now() + Duration::from_micros(micros))
                };
                debug!("timer armed for {micros}us");
            }
        }
        Ok(())
    }

    fn fire_timer(&mut self, now: Instant) {
        if let Some(deadline) = self.timer_deadline {
            if now >= deadline {
                self.timer_deadline = None;
                self.pending |= 1;
                trace!("timer fired");
            }
        }
    }
}

/// A simulated FPGA session.
///
/// Registers are a sparse map that reads back as zero until written. IRQ
/// lines stay asserted until acknowledged.
pub struct SimSession {
    state: Mutex<State>,
    irq_cond: Condvar,
    open: AtomicBool,
}

impl Default for SimSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SimSession {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_context: 1,
                ..Default::default()
            }),
            irq_cond: Condvar::new(),
            open: AtomicBool::new(false),
        }
    }

    /// Emulates the timer IRQ: writing `true` to `set` arms line 0 to fire
    /// after the number of microseconds held in `write`.
    pub fn with_timer(self, write: RegAddr, set: RegAddr) -> Self {
        self.state().timer = Some(TimerRegs { write, set });
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> FpgaResult {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(FpgaError::Status(Status::INVALID_SESSION))
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Asserts the IRQ lines in `mask` and wakes any waiter.
    pub fn assert_irqs(&self, mask: u32) {
        self.state().pending |= mask;
        self.irq_cond.notify_all();
    }

    pub fn pending(&self) -> u32 {
        self.state().pending
    }

    /// Queues a result for a later `wait_on_irqs`, returned without blocking.
    pub fn push_wait_result(&self, result: IrqWait) {
        self.state().scripted.push_back(result);
    }

    pub fn on_wait(&self, hook: impl FnMut(usize) -> Option<IrqWait> + Send + 'static) {
        self.state().hook = Some(Box::new(hook));
    }

    /// Every access to `reg` fails with `status` from now on.
    pub fn fail_register(&self, reg: RegAddr, status: Status) {
        self.state().faults.insert(reg, status);
    }

    pub fn fail_acknowledge(&self, status: Status) {
        self.state().ack_fault = Some(status);
    }

    pub fn clear_faults(&self) {
        let mut state = self.state();
        state.faults.clear();
        state.ack_fault = None;
    }

    /// Presets a register without going through the fault checks.
    pub fn poke(&self, reg: RegAddr, value: u64) {
        self.state().registers.insert(reg, value);
    }

    pub fn peek(&self, reg: RegAddr) -> Option<u64> {
        self.state().registers.get(&reg).copied()
    }

    pub fn array(&self, reg: RegAddr) -> Vec<u64> {
        self.state().arrays.get(&reg).cloned().unwrap_or_default()
    }

    pub fn fifo_push(&self, fifo: FifoId, data: &[u64]) {
        self.state()
            .fifos
            .entry(fifo)
            .or_default()
            .extend(data.iter().copied());
    }

    pub fn fifo_drain(&self, fifo: FifoId) -> Vec<u64> {
        self.state()
            .fifos
            .get_mut(&fifo)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn wait_calls(&self) -> usize {
        self.state().wait_calls
    }

    pub fn last_wait_timeout(&self) -> Option<Duration> {
        self.state().last_wait_timeout
    }

    /// Every mask passed to `acknowledge_irqs`, in call order.
    pub fn acknowledged(&self) -> Vec<u32> {
        self.state().acknowledged.clone()
    }

    pub fn reserved_contexts(&self) -> usize {
        self.state().contexts.len()
    }

    fn read_array<T: Copy>(&self, reg: RegAddr, buf: &mut [T], cast: fn(u64) -> T) -> FpgaResult {
        self.ensure_open()?;
        let state = self.state();
        state.check(reg)?;
        let stored = state.arrays.get(&reg);
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = cast(stored.and_then(|a| a.get(i)).copied().unwrap_or(0));
        }
        Ok(())
    }

    fn write_array(&self, reg: RegAddr, data: impl Iterator<Item = u64>) -> FpgaResult {
        self.ensure_open()?;
        let mut state = self.state();
        state.check(reg)?;
        state.arrays.insert(reg, data.collect());
        Ok(())
    }
}

impl DriverGeneric for SimSession {
    fn open(&mut self) -> FpgaResult {
        debug!("sim session open");
        self.open.store(true, Ordering::Release);
        Ok(())
    }

    fn close(&mut self) -> FpgaResult {
        self.ensure_open()?;
        debug!("sim session close");
        self.open.store(false, Ordering::Release);
        Ok(())
    }
}

impl Session for SimSession {
    fn read_bool(&self, reg: RegAddr) -> FpgaResult<bool> {
        self.ensure_open()?;
        Ok(self.state().read(reg)? != 0)
    }

    fn read_u8(&self, reg: RegAddr) -> FpgaResult<u8> {
        self.ensure_open()?;
        Ok(self.state().read(reg)? as u8)
    }

    fn read_u16(&self, reg: RegAddr) -> FpgaResult<u16> {
        self.ensure_open()?;
        Ok(self.state().read(reg)? as u16)
    }

    fn read_u32(&self, reg: RegAddr) -> FpgaResult<u32> {
        self.ensure_open()?;
        Ok(self.state().read(reg)? as u32)
    }

    fn read_u64(&self, reg: RegAddr) -> FpgaResult<u64> {
        self.ensure_open()?;
        self.state().read(reg)
    }

    fn write_bool(&self, reg: RegAddr, value: bool) -> FpgaResult {
        self.ensure_open()?;
        self.state().write(reg, value as u64)
    }

    fn write_u8(&self, reg: RegAddr, value: u8) -> FpgaResult {
        self.ensure_open()?;
        self.state().write(reg, value.into())
    }

    fn write_u16(&self, reg: RegAddr, value: u16) -> FpgaResult {
        self.ensure_open()?;
        self.state().write(reg, value.into())
    }

    fn write_u32(&self, reg: RegAddr, value: u32) -> FpgaResult {
        self.ensure_open()?;
        self.state().write(reg, value.into())
    }

    fn write_u64(&self, reg: RegAddr, value: u64) -> FpgaResult {
        self.ensure_open()?;
        self.state().write(reg, value)
    }

    fn read_array_u8(&self, reg: RegAddr, buf: &mut [u8]) -> FpgaResult {
        self.read_array(reg, buf, |v| v as u8)
    }

    fn write_array_u8(&self, reg: RegAddr, data: &[u8]) -> FpgaResult {
        self.write_array(reg, data.iter().map(|&v| v.into()))
    }

    fn read_array_u32(&self, reg: RegAddr, buf: &mut [u32]) -> FpgaResult {
        self.read_array(reg, buf, |v| v as u32)
    }

    fn write_array_u32(&self, reg: RegAddr, data: &[u32]) -> FpgaResult {
        self.write_array(reg, data.iter().map(|&v| v.into()))
    }

    fn read_fifo_u64(
        &self,
        fifo: FifoId,
        buf: &mut [u64],
        _timeout: Duration,
    ) -> FpgaResult<usize> {
        self.ensure_open()?;
        let mut state = self.state();
        let queue = state.fifos.entry(fifo).or_default();
        if queue.len() < buf.len() {
            return Err(FpgaError::Status(Status::FIFO_TIMEOUT));
        }
        for slot in buf.iter_mut() {
            *slot = queue.pop_front().unwrap_or(0);
        }
        Ok(queue.len())
    }

    fn write_fifo_u64(&self, fifo: FifoId, data: &[u64], _timeout: Duration) -> FpgaResult<usize> {
        self.ensure_open()?;
        let mut state = self.state();
        let queue = state.fifos.entry(fifo).or_default();
        if queue.len() + data.len() > FIFO_DEPTH {
            return Err(FpgaError::Status(Status::FIFO_TIMEOUT));
        }
        queue.extend(data.iter().copied());
        Ok(FIFO_DEPTH - queue.len())
    }

    fn reserve_irq_context(&self) -> FpgaResult<IrqContext> {
        self.ensure_open()?;
        let mut state = self.state();
        let context = IrqContext::new(state.next_context);
        state.next_context += 1;
        state.contexts.insert(context);
        debug!("reserve irq context {context:?}");
        Ok(context)
    }

    fn unreserve_irq_context(&self, context: IrqContext) -> FpgaResult {
        self.ensure_open()?;
        if self.state().contexts.remove(&context) {
            debug!("unreserve irq context {context:?}");
            Ok(())
        } else {
            Err(FpgaError::Status(Status::INVALID_PARAMETER))
        }
    }

    fn wait_on_irqs(&self, context: IrqContext, irqs: u32, timeout: Duration) -> IrqWait {
        if self.ensure_open().is_err() {
            return IrqWait {
                status: Status::INVALID_SESSION,
                asserted: 0,
            };
        }

        let mut state = self.state();
        state.wait_calls += 1;
        state.last_wait_timeout = Some(timeout);

        let call = state.wait_calls;
        if let Some(hook) = state.hook.as_mut() {
            if let Some(result) = hook(call) {
                return result;
            }
        }
        if let Some(result) = state.scripted.pop_front() {
            return result;
        }
        if !state.contexts.contains(&context) {
            return IrqWait {
                status: Status::INVALID_PARAMETER,
                asserted: 0,
            };
        }

        let end = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            state.fire_timer(now);

            let hit = state.pending & irqs;
            if hit != 0 {
                return IrqWait::asserted(hit);
            }
            if now >= end {
                return IrqWait::timeout();
            }

            let until = match state.timer_deadline {
                Some(deadline) => deadline.min(end),
                None => end,
            };
            let (guard, _) = self
                .irq_cond
                .wait_timeout(state, until.saturating_duration_since(now))
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    fn acknowledge_irqs(&self, irqs: u32) -> FpgaResult {
        self.ensure_open()?;
        let mut state = self.state();
        if let Some(status) = state.ack_fault {
            return Err(FpgaError::Status(status));
        }
        state.pending &= !irqs;
        state.acknowledged.push(irqs);
        Ok(())
    }
}
