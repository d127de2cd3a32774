//! Execute request header encoding/decoding
//!
//! The request header is 12 bytes:
//!
//! ```text
//! +--------+--------+--------+--------+--------+--------+--------+--------+
//! |   Magic (2)     | Version| Kind   | Flags  | StmtTy |  Reserved (2)   |
//! +--------+--------+--------+--------+--------+--------+--------+--------+
//! |          Total length (4)         |
//! +--------+--------+--------+--------+
//! ```
//!
//! The total length covers the header itself and is patched in once the
//! body has been written.

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::constants::{request, request_flags, RequestKind, StatementType, REQUEST_HEADER_SIZE};
use crate::error::{Error, Result};

/// Byte offset of the total length field
pub(crate) const LENGTH_OFFSET: usize = 8;

/// Execute request header (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    /// Request kind
    pub kind: RequestKind,
    /// Request flags (see [`request_flags`])
    pub flags: u8,
    /// Classification of the SQL text
    pub statement_type: StatementType,
    /// Total request length including header
    pub length: u32,
}

impl RequestHeader {
    /// Create a new execute header; the length is filled in later
    pub fn new(statement_type: StatementType, flags: u8) -> Self {
        Self {
            kind: RequestKind::Execute,
            flags,
            statement_type,
            length: 0,
        }
    }

    /// Parse a request header from raw bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < REQUEST_HEADER_SIZE {
            return Err(Error::BufferUnderflow {
                needed: REQUEST_HEADER_SIZE,
                available: data.len(),
            });
        }
        let mut buf = ReadBuffer::from_slice(data);
        Self::read(&mut buf)
    }

    /// Read a request header from a buffer
    pub fn read(buf: &mut ReadBuffer) -> Result<Self> {
        let magic = buf.read_u16_be()?;
        if magic != request::MAGIC {
            return Err(Error::Protocol(format!("bad request magic: {:#06x}", magic)));
        }
        let version = buf.read_u8()?;
        if version != request::VERSION {
            return Err(Error::Protocol(format!(
                "unsupported request version: {}",
                version
            )));
        }

        let kind = RequestKind::try_from(buf.read_u8()?)?;
        let flags = buf.read_u8()?;
        let statement_type = StatementType::try_from(buf.read_u8()?)?;
        buf.skip(2)?; // reserved
        let length = buf.read_u32_be()?;

        Ok(Self {
            kind,
            flags,
            statement_type,
            length,
        })
    }

    /// Write the header to a buffer
    pub fn write(&self, buf: &mut WriteBuffer) -> Result<()> {
        buf.write_u16_be(request::MAGIC)?;
        buf.write_u8(request::VERSION)?;
        buf.write_u8(self.kind as u8)?;
        buf.write_u8(self.flags)?;
        buf.write_u8(self.statement_type as u8)?;
        buf.write_u16_be(0)?;
        buf.write_u32_be(self.length)?;
        Ok(())
    }

    /// Check if the request carries parameters
    pub fn has_params(&self) -> bool {
        self.flags & request_flags::HAS_PARAMS != 0
    }

    /// Check if the request carries an explicit fetch size
    pub fn has_fetch_size(&self) -> bool {
        self.flags & request_flags::HAS_FETCH_SIZE != 0
    }

    /// Get the body length (total length minus header)
    pub fn body_length(&self) -> usize {
        (self.length as usize).saturating_sub(REQUEST_HEADER_SIZE)
    }
}
