//! Core systems for the cashpoint client.
//!
//! - **Event loop**: [`EventLoop`], a single-threaded deferred task queue
//! - **Signals**: [`Signal`], typed notifications with direct or queued delivery
//! - **Logging**: tracing target names shared by the workspace
//!
//! # Deferred Self-Dispatch Example
//!
//! ```
//! use cashpoint_core::{EventLoop, Signal};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! let event_loop = EventLoop::new();
//! let request = Signal::<String>::new();
//! let handled = Arc::new(AtomicBool::new(false));
//!
//! let flag = handled.clone();
//! request.connect_queued(&event_loop, move |_| flag.store(true, Ordering::SeqCst));
//!
//! request.emit("refresh".to_string());
//! assert!(!handled.load(Ordering::SeqCst));
//!
//! event_loop.run_until_idle();
//! assert!(handled.load(Ordering::SeqCst));
//! ```

mod error;
mod event_loop;
pub mod logging;
pub mod signal;

pub use error::{CoreError, EventLoopError, SignalError};
pub use event_loop::{EventLoop, TaskId};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, ConnectionType, Signal};
