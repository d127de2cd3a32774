//! Read buffer for decoding request data
//!
//! The mirror image of [`WriteBuffer`](super::WriteBuffer): fixed-width
//! integers, variable-length integers and length-prefixed byte sequences.

use bytes::Bytes;

use crate::constants::length;
use crate::error::{Error, Result};

/// A buffer for reading request data
#[derive(Debug)]
pub struct ReadBuffer {
    /// The underlying byte data
    data: Bytes,
    /// Current read position
    pos: usize,
}

impl ReadBuffer {
    /// Create a new ReadBuffer from bytes
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a new ReadBuffer from a byte slice
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Get the current position in the buffer
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the total length of the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the number of bytes remaining to be read
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Skip `n` bytes in the buffer
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure_remaining(n)?;
        self.pos += n;
        Ok(())
    }

    #[inline]
    fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            Err(Error::BufferUnderflow {
                needed: n,
                available: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    /// Take the next `N` bytes as a fixed-size array
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure_remaining(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    // =========================================================================
    // Fixed-width reads (network byte order)
    // =========================================================================

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure_remaining(1)?;
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    /// Read `n` raw bytes without copying
    pub fn read_bytes_owned(&mut self, n: usize) -> Result<Bytes> {
        self.ensure_remaining(n)?;
        let bytes = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(bytes)
    }

    /// Read `n` raw bytes into a Vec
    pub fn read_bytes_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        self.read_bytes_owned(n).map(|b| b.to_vec())
    }

    /// Read a 16-bit unsigned integer in big-endian format
    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// Read a 32-bit unsigned integer in big-endian format
    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// Read a 64-bit unsigned integer in big-endian format
    pub fn read_u64_be(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_be_bytes)
    }

    // =========================================================================
    // Variable-length integers
    // =========================================================================

    /// Read an unsigned integer prefixed by its byte count, rejecting counts
    /// wider than `max_len`
    fn read_var_uint(&mut self, max_len: u8) -> Result<u64> {
        let len = self.read_u8()?;
        if len > max_len {
            return Err(Error::InvalidLengthIndicator(len));
        }
        let mut value = 0u64;
        for _ in 0..len {
            value = (value << 8) | self.read_u8()? as u64;
        }
        Ok(value)
    }

    /// Read a UB2 (unsigned 2-byte, variable length encoded)
    pub fn read_ub2(&mut self) -> Result<u16> {
        self.read_var_uint(2).map(|v| v as u16)
    }

    /// Read a UB4 (unsigned 4-byte, variable length encoded)
    pub fn read_ub4(&mut self) -> Result<u32> {
        self.read_var_uint(4).map(|v| v as u32)
    }

    /// Read a UB8 (unsigned 8-byte, variable length encoded)
    pub fn read_ub8(&mut self) -> Result<u64> {
        self.read_var_uint(8)
    }

    // =========================================================================
    // Length-prefixed data
    // =========================================================================

    /// Read a length-prefixed byte sequence
    ///
    /// Returns `None` for the NULL indicator (255). The long form (254) is a
    /// series of `ub4(chunk_len) + chunk` pieces ended by a zero-length chunk.
    pub fn read_bytes_with_length(&mut self) -> Result<Option<Vec<u8>>> {
        let len = self.read_u8()?;

        match len {
            length::NULL_INDICATOR => Ok(None),
            length::LONG_INDICATOR => {
                let mut result = Vec::new();
                loop {
                    let chunk_len = self.read_ub4()? as usize;
                    if chunk_len == 0 {
                        break;
                    }
                    result.extend_from_slice(&self.read_bytes_owned(chunk_len)?);
                }
                Ok(Some(result))
            }
            length::ESCAPE_CHAR => Err(Error::InvalidLengthIndicator(len)),
            _ => self.read_bytes_vec(len as usize).map(Some),
        }
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_string_with_length(&mut self) -> Result<Option<String>> {
        match self.read_bytes_with_length()? {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| Error::Protocol(format!("invalid UTF-8 string: {}", e))),
        }
    }
}
