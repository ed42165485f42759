//! Moving lending events between devices.
//!
//! - [`codec`]: the `MTG1:` share code, a compressed and versioned text form
//!   of a batch of events that fits in a QR code or a chat message.
//! - [`backup`]: the uncompressed JSON dump of a whole ledger.
//! - [`exchange`]: the producer and consumer flows built on both. Every path
//!   that brings events in goes through the same per-event deduplicating
//!   insert, so restoring a backup and merging a friend's code behave alike.
//!
//! # Quick start
//!
//! ```no_run
//! use lendcraft_core::fact::NewEvent;
//! use lendcraft_share::codec;
//!
//! let lend = NewEvent::lend("Sol Ring", "Alice", "Bo", 1000).build().unwrap();
//! let code = codec::encode(&[lend]).unwrap();
//! assert!(code.starts_with(codec::FORMAT_TAG));
//! let records = codec::decode(&code).unwrap();
//! assert_eq!(records.len(), 1);
//! ```

pub mod backup;
pub mod codec;
pub mod error;
pub mod exchange;

pub use error::{CodecError, Error, Result};
