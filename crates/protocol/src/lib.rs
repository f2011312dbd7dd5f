//! Wire types for the QIX engine protocol.
//!
//! This crate contains the serde-serializable types used for communication
//! with the analytics engine over its JSON-RPC dialect. These types represent
//! the "protocol layer" - the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * 1:1 with protocol: Match the engine's published JSON-RPC schema
//! * Stable: Changes only when the wire protocol changes
//!
//! Higher-level ergonomic APIs are built on top of these types in `qix`.

pub mod list;
pub mod message;
pub mod object;

pub use list::*;
pub use message::*;
pub use object::*;

/// Handle of the engine's global scope, valid before any app is opened.
pub const GLOBAL_HANDLE: i32 = -1;
