//! Core traits and types for cycle-accurate emulation.
//!
//! A CPU core never owns memory or time. It borrows a bus for every access
//! and asks the host clock what cycle it is. Everything here describes that
//! boundary.

mod bus;
mod clock;
mod cpu;
mod observable;
mod ticks;

pub use bus::{Bus, SimpleBus};
pub use clock::CycleClock;
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
