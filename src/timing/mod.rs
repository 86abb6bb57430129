// Timing module - clock and repeating-timer capabilities shared by every scheduler

pub mod clock;
pub mod driver;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::CadenceDriver;
pub use timer::{ManualTimer, RepeatingTimer, ThreadTimer, TickFn, TimerError, TimerHandle};
