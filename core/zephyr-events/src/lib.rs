//! # Zephyr Events
//!
//! Minimal typed publish/subscribe event emitter.
//!
//! ## Features
//!
//! - **Typed payloads**: one payload type per emitter, checked at compile time
//! - **Wildcard**: listeners on `"*"` receive `(key, payload)` for every emission
//! - **Set semantics**: registering the same handler twice keeps one entry
//! - **Snapshot dispatch**: handlers may subscribe, unsubscribe and emit while
//!   an emission is running without affecting the current round
//! - **Multi-threaded**: all operations take `&self`; no lock is held while a
//!   handler runs
//!
//! ## Example
//!
//! ```rust
//! use zephyr_events::{Emitter, EventKey, Handler, Listener};
//!
//! let emitter: Emitter<u64> = Emitter::new();
//!
//! let log_price = Handler::new(|price: &u64| println!("price: {}", price));
//! let unsubscribe = emitter.on("price", &log_price).unwrap();
//!
//! emitter
//!     .on("*", Listener::wildcard(|key: &EventKey, value: &u64| {
//!         println!("{} -> {}", key, value);
//!     }))
//!     .unwrap();
//!
//! emitter.emit("price", &6000);
//!
//! unsubscribe.unsubscribe();
//! assert_eq!(emitter.listener_count("price"), 0);
//! ```

pub mod config;
pub mod emitter;
pub mod error;
pub mod handler;
pub mod key;
pub mod set;

// Re-exports
pub use config::EmitterConfig;
pub use emitter::{EmitStats, Emitter, HandlerMap};
pub use error::{EmitterError, Result};
pub use handler::{Handler, Listener, ListenerId, Unsubscribe, WildcardHandler};
pub use key::{EventKey, Token, WILDCARD};
pub use set::HandlerSet;
