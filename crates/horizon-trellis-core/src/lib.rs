//! Core systems for Horizon Trellis.
//!
//! This crate provides the execution substrate for the Horizon Trellis
//! list engine:
//!
//! - **Dispatcher**: The single-threaded dispatch queue that owns all
//!   widget mutation, with proof-of-thread tokens and one-shot timers
//! - **Signal/Slot System**: Type-safe change notification
//!
//! # Dispatch Example
//!
//! ```
//! use horizon_trellis_core::Dispatcher;
//! use std::time::Duration;
//!
//! let dispatcher = Dispatcher::new();
//! let token = dispatcher.token();
//!
//! // Any thread may queue work...
//! dispatcher.post(|_token| {
//!     println!("running on the dispatch thread");
//! }).unwrap();
//!
//! // ...and a one-shot timer callback.
//! let timer = dispatcher.post_delayed(Duration::from_millis(5), |_token| {
//!     println!("timer fired");
//! }).unwrap();
//! dispatcher.cancel_timer(timer).ok();
//!
//! // The owning thread drains the queue.
//! dispatcher.run_pending(&token);
//! ```
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_trellis_core::Signal;
//!
//! let selection_changed = Signal::<usize>::new();
//!
//! let conn_id = selection_changed.connect(|row| {
//!     println!("row {row} selected");
//! });
//!
//! selection_changed.emit(2);
//! selection_changed.disconnect(conn_id);
//! ```

mod dispatcher;
mod error;
pub mod signal;

pub use dispatcher::{DispatchToken, Dispatcher, Invocation, TimerId};
pub use error::{DispatchError, Result, SignalError, TimerError, TrellisError};
pub use signal::{ConnectionId, Signal};
