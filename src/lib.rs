//! # ioloop - embedded event loop
//!
//! A single-threaded, non-preemptive event loop for microcontrollers. One
//! [`EventLoop`] multiplexes timers, debounced GPIO watches, console input,
//! buffered reads and idle jobs over the only execution thread, without
//! allocating per event. This library supports `no_std` environments.
//!
//! ## Features
//!
//! ### Handles
//! - **Timers**: one-shot and drift-free repeating deadlines
//! - **Watches**: glitch-filter debounced edge detection on digital lines
//! - **Line input**: per-byte delivery from a polled UART buffer
//! - **Idle jobs**: callbacks run once per tick (script job queues)
//! - **Buffered reads**: extension point for accumulate-until reads
//!
//! ### Lifecycle
//! - Handles are owned by the loop and addressed by [`HandleId`]
//! - Two-phase close: [`EventLoop::close`] queues, the end-of-tick sweep frees
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! ioloop = "0.1.0"
//! ```
//!
//! Implement the [`port`] traits for your board, create the loop and hand
//! control to [`EventLoop::run`]:
//!
//! ```rust,no_run
//! use ioloop::port::{ByteSource, Clock, DigitalIo, Instant, Level, Pin, PinMode};
//! use ioloop::{EventLoop, HandleId, TriggerMode};
//! # struct Board;
//! # impl Clock for Board { fn now(&mut self) -> Instant { 0 } }
//! # impl DigitalIo for Board {
//! #     fn configure(&mut self, _pin: Pin, _mode: PinMode) {}
//! #     fn read(&mut self, _pin: Pin) -> Level { Level::Low }
//! # }
//! # impl ByteSource for Board {
//! #     fn has_data(&mut self) -> bool { false }
//! #     fn pending_count(&mut self) -> usize { 0 }
//! #     fn read_one(&mut self) -> u8 { 0 }
//! # }
//!
//! fn on_button(lp: &mut EventLoop<Board>, id: HandleId) {
//!     let _pressed = lp.watch(id).map(|w| w.stable);
//! }
//!
//! fn on_key(_lp: &mut EventLoop<Board>, _id: HandleId, _byte: u8) {}
//!
//! let mut lp: EventLoop<Board> = EventLoop::new(Board);
//!
//! let button = lp.watch_init().unwrap();
//! lp.watch_start(button, Some(on_button), 5, TriggerMode::OnFalling, 50).unwrap();
//!
//! let console = lp.tty_init().unwrap();
//! lp.tty_start(console, Some(on_key)).unwrap();
//!
//! lp.run();
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, Xtensa)
//! - Hosted simulators, with the `std` feature's [`port::StdClock`]
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support and the hosted clock
//! - `defmt`: Enable defmt logging and `defmt::Format` impls
//! - `log`: Route internal logging through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

/// Common error type for event loop operations.
pub mod error;

/// The event loop, its handles and their subsystems.
pub mod io;

/// Collaborator contracts the loop consumes: clock, digital lines and
/// byte source.
pub mod port;

pub use error::Error;
pub use io::{
    BufferedRead, CloseFn, DEFAULT_CAPACITY, EventLoop, Flags, Handle, HandleId, Idle, IdleFn,
    Kind, LineInput, List, PollFn, Timer, TimerFn, TriggerMode, TtyFn, Watch, WatchFn,
};
