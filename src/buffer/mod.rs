//! Buffer abstractions for request encoding/decoding
//!
//! This module provides the byte buffers used to serialize an execute
//! request and to read it back.

mod read;
mod write;

pub use read::ReadBuffer;
pub use write::WriteBuffer;
