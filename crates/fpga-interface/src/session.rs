use core::time::Duration;

use crate::{custom_type, FpgaResult, Status};

/// Address of a front-panel register in the FPGA personality.
pub type RegAddr = u32;
/// Index of a DMA FIFO in the FPGA personality.
pub type FifoId = u32;

custom_type!(
    /// A reserved IRQ context.
    ///
    /// IRQ contexts are single-threaded: only one thread may wait with a
    /// particular context at any given time.
    IrqContext,
    usize,
    "{:#x}"
);

/// Raw outcome of one bounded wait on a set of IRQs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqWait {
    pub status: Status,
    /// Bitmask of the IRQs that were asserted, `0` on timeout.
    pub asserted: u32,
}

impl IrqWait {
    pub const fn asserted(asserted: u32) -> Self {
        Self {
            status: Status::SUCCESS,
            asserted,
        }
    }

    pub const fn timeout() -> Self {
        Self {
            status: Status::IRQ_TIMEOUT,
            asserted: 0,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.status == Status::IRQ_TIMEOUT
    }
}

pub trait DriverGeneric: Send {
    /// Loads the runtime, downloads the personality, resets and runs it.
    fn open(&mut self) -> FpgaResult;
    /// Closes the session and unloads the runtime.
    fn close(&mut self) -> FpgaResult;
}

/// An open session with the FPGA personality.
///
/// Every method takes `&self` so one session can be shared between the
/// controlling thread and the IRQ worker threads.
pub trait Session: DriverGeneric + Sync {
    fn read_bool(&self, reg: RegAddr) -> FpgaResult<bool>;
    fn read_u8(&self, reg: RegAddr) -> FpgaResult<u8>;
    fn read_u16(&self, reg: RegAddr) -> FpgaResult<u16>;
    fn read_u32(&self, reg: RegAddr) -> FpgaResult<u32>;
    fn read_u64(&self, reg: RegAddr) -> FpgaResult<u64>;

    fn write_bool(&self, reg: RegAddr, value: bool) -> FpgaResult;
    fn write_u8(&self, reg: RegAddr, value: u8) -> FpgaResult;
    fn write_u16(&self, reg: RegAddr, value: u16) -> FpgaResult;
    fn write_u32(&self, reg: RegAddr, value: u32) -> FpgaResult;
    fn write_u64(&self, reg: RegAddr, value: u64) -> FpgaResult;

    fn read_array_u8(&self, reg: RegAddr, buf: &mut [u8]) -> FpgaResult;
    fn write_array_u8(&self, reg: RegAddr, data: &[u8]) -> FpgaResult;
    fn read_array_u32(&self, reg: RegAddr, buf: &mut [u32]) -> FpgaResult;
    fn write_array_u32(&self, reg: RegAddr, data: &[u32]) -> FpgaResult;

    /// Reads `buf.len()` elements, returning how many elements remain in the FIFO.
    fn read_fifo_u64(&self, fifo: FifoId, buf: &mut [u64], timeout: Duration)
        -> FpgaResult<usize>;
    /// Writes all of `data`, returning how many empty slots remain in the FIFO.
    fn write_fifo_u64(&self, fifo: FifoId, data: &[u64], timeout: Duration) -> FpgaResult<usize>;

    fn reserve_irq_context(&self) -> FpgaResult<IrqContext>;
    fn unreserve_irq_context(&self, context: IrqContext) -> FpgaResult;

    /// Blocks until any IRQ in `irqs` is asserted or `timeout` elapses.
    fn wait_on_irqs(&self, context: IrqContext, irqs: u32, timeout: Duration) -> IrqWait;

    /// Acknowledges the IRQs in the `irqs` bitmask.
    fn acknowledge_irqs(&self, irqs: u32) -> FpgaResult;
}
