//! Frame timing.
//!
//! One `FrameClock` per render loop; `tick()` once per presented frame.
//! `Timer` is a plain stopwatch for ad-hoc measurements.

mod frame_clock;
mod timer;

pub use frame_clock::{FrameClock, FrameTime};
pub use timer::Timer;
