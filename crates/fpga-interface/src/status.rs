use core::fmt::{self, Display};

use log::{error, warn};

use crate::{custom_type, err::FpgaError, FpgaResult};

custom_type!(
    /// Status code returned by every call into the vendor runtime.
    ///
    /// Zero is success, a negative code is an error and a positive code is a
    /// warning. Warnings still count as "not success".
    Status,
    i32,
    "{}"
);

impl Status {
    pub const SUCCESS: Status = Status(0);
    /// A wait on IRQs returned because its timeout elapsed.
    pub const IRQ_TIMEOUT: Status = Status(-61060);
    pub const FIFO_TIMEOUT: Status = Status(-50400);
    pub const INVALID_PARAMETER: Status = Status(-52005);
    pub const INVALID_SESSION: Status = Status(-63195);
    /// The channel is already registered with another interrupt.
    pub const IRQ_CHANNEL_NOT_USABLE: Status = Status(-363024);
    /// The IRQ number is out of range or already registered.
    pub const IRQ_NUMBER_NOT_USABLE: Status = Status(-363025);

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    pub const fn is_not_success(self) -> bool {
        self.0 != 0
    }

    pub const fn is_error(self) -> bool {
        self.0 < 0
    }

    pub const fn is_warning(self) -> bool {
        self.0 > 0
    }

    /// Folds `new` into `self` the way the vendor runtime merges statuses:
    /// the first error sticks, a warning is only replaced by an error, and
    /// success is replaced by anything.
    pub fn merge(&mut self, new: Status) -> Status {
        if !self.is_error() && (self.is_success() || new.is_error()) {
            *self = new;
        }
        *self
    }

    pub fn into_result(self) -> FpgaResult {
        if self.is_success() {
            Ok(())
        } else {
            Err(FpgaError::Status(self))
        }
    }

    /// Logs `message` together with the status when it is not success.
    ///
    /// Errors go to `error!`, warnings to `warn!`. Returns `true` if anything
    /// was reported.
    pub fn report(self, message: &str) -> bool {
        if self.is_error() {
            error!("{self}: {message}");
        } else if self.is_warning() {
            warn!("{self}: {message}");
        }
        self.is_not_success()
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_error() {
            write!(f, "ERROR: {}", self.0)
        } else if self.is_warning() {
            write!(f, "WARNING: {}", self.0)
        } else {
            write!(f, "SUCCESS")
        }
    }
}
