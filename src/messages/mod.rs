//! Execute request messages
//!
//! This module contains the serialized form of an execute request: the
//! fixed header, the encoder used by statements and a decoder for
//! connection implementations.

mod execute;
mod header;

pub use execute::{ExecuteMessage, ExecuteRequest, RequestParam};
pub use header::RequestHeader;
