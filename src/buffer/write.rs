//! Write buffer for encoding request data
//!
//! Provides methods for writing fixed-width integers, variable-length
//! integers and length-prefixed byte sequences to a byte buffer.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::length;
use crate::error::{Error, Result};

/// A buffer for writing request data
#[derive(Debug)]
pub struct WriteBuffer {
    /// The underlying byte buffer
    data: BytesMut,
    /// Maximum size of the encoded data (for request size limits)
    max_capacity: Option<usize>,
}

impl WriteBuffer {
    /// Create a new WriteBuffer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new WriteBuffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            max_capacity: None,
        }
    }

    /// Create a new WriteBuffer that refuses to grow past `max_capacity` bytes
    pub fn with_max_capacity(capacity: usize, max_capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity.min(max_capacity)),
            max_capacity: Some(max_capacity),
        }
    }

    /// Get the current length of data in the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the remaining writable space
    #[inline]
    pub fn remaining_capacity(&self) -> usize {
        match self.max_capacity {
            Some(max) => max.saturating_sub(self.data.len()),
            None => usize::MAX - self.data.len(),
        }
    }

    /// Get the buffer contents as a byte slice
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Freeze the buffer into immutable Bytes
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }

    #[inline]
    fn ensure_capacity(&self, n: usize) -> Result<()> {
        if let Some(max) = self.max_capacity {
            if self.data.len() + n > max {
                return Err(Error::BufferOverflow {
                    needed: n,
                    available: max.saturating_sub(self.data.len()),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Fixed-width writes (network byte order)
    // =========================================================================

    /// Write a single byte
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.ensure_capacity(1)?;
        self.data.put_u8(value);
        Ok(())
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_capacity(bytes.len())?;
        self.data.put_slice(bytes);
        Ok(())
    }

    /// Write a 16-bit unsigned integer in big-endian format
    pub fn write_u16_be(&mut self, value: u16) -> Result<()> {
        self.ensure_capacity(2)?;
        self.data.put_u16(value);
        Ok(())
    }

    /// Write a 32-bit unsigned integer in big-endian format
    pub fn write_u32_be(&mut self, value: u32) -> Result<()> {
        self.ensure_capacity(4)?;
        self.data.put_u32(value);
        Ok(())
    }

    /// Write a 64-bit unsigned integer in big-endian format
    pub fn write_u64_be(&mut self, value: u64) -> Result<()> {
        self.ensure_capacity(8)?;
        self.data.put_u64(value);
        Ok(())
    }

    // =========================================================================
    // Variable-length integers
    // =========================================================================

    /// Write an unsigned integer prefixed by the number of bytes that follow
    ///
    /// Zero is a single 0x00 byte. Other values use the smallest of 1, 2, 4 or
    /// 8 big-endian bytes that can hold them.
    fn write_var_uint(&mut self, value: u64) -> Result<()> {
        match value {
            0 => self.write_u8(0),
            1..=0xff => {
                self.write_u8(1)?;
                self.write_u8(value as u8)
            }
            0x100..=0xffff => {
                self.write_u8(2)?;
                self.write_u16_be(value as u16)
            }
            0x1_0000..=0xffff_ffff => {
                self.write_u8(4)?;
                self.write_u32_be(value as u32)
            }
            _ => {
                self.write_u8(8)?;
                self.write_u64_be(value)
            }
        }
    }

    /// Write a UB2 (unsigned 2-byte, variable length encoded)
    pub fn write_ub2(&mut self, value: u16) -> Result<()> {
        self.write_var_uint(value as u64)
    }

    /// Write a UB4 (unsigned 4-byte, variable length encoded)
    pub fn write_ub4(&mut self, value: u32) -> Result<()> {
        self.write_var_uint(value as u64)
    }

    /// Write a UB8 (unsigned 8-byte, variable length encoded)
    pub fn write_ub8(&mut self, value: u64) -> Result<()> {
        self.write_var_uint(value)
    }

    // =========================================================================
    // Length-prefixed data
    // =========================================================================

    /// Write a length-prefixed byte sequence
    ///
    /// `None` writes the NULL indicator (255). Up to 252 bytes use a single
    /// length byte; longer data is written as LONG_INDICATOR (254) followed by
    /// `ub4(chunk_len) + chunk` pieces of at most 32767 bytes and a `ub4(0)`
    /// terminator.
    pub fn write_bytes_with_length(&mut self, bytes: Option<&[u8]>) -> Result<()> {
        let Some(data) = bytes else {
            return self.write_u8(length::NULL_INDICATOR);
        };

        if data.len() <= length::MAX_SHORT as usize {
            self.write_u8(data.len() as u8)?;
            return self.write_bytes(data);
        }

        self.write_u8(length::LONG_INDICATOR)?;
        for chunk in data.chunks(length::CHUNK_SIZE) {
            self.write_ub4(chunk.len() as u32)?;
            self.write_bytes(chunk)?;
        }
        self.write_ub4(0)
    }

    /// Write a length-prefixed UTF-8 string
    pub fn write_string_with_length(&mut self, s: Option<&str>) -> Result<()> {
        self.write_bytes_with_length(s.map(str::as_bytes))
    }

    /// Patch a u32 at a specific position (big-endian)
    ///
    /// Used to fill in length fields once the rest of the request is known.
    pub fn patch_u32_be(&mut self, pos: usize, value: u32) -> Result<()> {
        if pos + 4 > self.data.len() {
            return Err(Error::BufferOverflow {
                needed: 4,
                available: self.data.len().saturating_sub(pos),
            });
        }
        self.data[pos..pos + 4].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<[u8]> for WriteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_fixed_width() {
        let mut buf = WriteBuffer::new();
        buf.write_u8(0x42).unwrap();
        buf.write_u16_be(0x0102).unwrap();
        buf.write_u32_be(0x03040506).unwrap();
        assert_eq!(buf.as_slice(), &[0x42, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn test_write_ub4_widths() {
        let cases: [(u32, &[u8]); 4] = [
            (0, &[0x00]),
            (0x42, &[0x01, 0x42]),
            (0x0102, &[0x02, 0x01, 0x02]),
            (0x01020304, &[0x04, 0x01, 0x02, 0x03, 0x04]),
        ];
        for (value, expected) in cases {
            let mut buf = WriteBuffer::new();
            buf.write_ub4(value).unwrap();
            assert_eq!(buf.as_slice(), expected, "ub4({:#x})", value);
        }
    }

    #[test]
    fn test_write_ub8_uses_eight_bytes_above_u32() {
        let mut buf = WriteBuffer::new();
        buf.write_ub8(0x1_0000_0000).unwrap();
        assert_eq!(buf.as_slice(), &[0x08, 0, 0, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_write_bytes_with_length_null_and_empty() {
        let mut buf = WriteBuffer::new();
        buf.write_bytes_with_length(None).unwrap();
        buf.write_bytes_with_length(Some(&[])).unwrap();
        assert_eq!(buf.as_slice(), &[0xff, 0x00]);
    }

    #[test]
    fn test_write_bytes_with_length_short() {
        let mut buf = WriteBuffer::new();
        buf.write_bytes_with_length(Some(b"abc")).unwrap();
        assert_eq!(buf.as_slice(), &[0x03, b'a', b'b', b'c']);
    }

    /// 252 bytes still fit the short form, 253 switch to the chunked long form
    #[test]
    fn test_short_form_threshold() {
        let mut short = WriteBuffer::new();
        short.write_bytes_with_length(Some(&[0xAA; 252])).unwrap();
        assert_eq!(short.as_slice()[0], 252);
        assert_eq!(short.len(), 253);

        let mut long = WriteBuffer::new();
        long.write_bytes_with_length(Some(&[0xAA; 253])).unwrap();
        let out = long.as_slice();
        assert_eq!(out[0], length::LONG_INDICATOR);
        // ub4(253) = [0x01, 0xFD]
        assert_eq!(&out[1..3], &[0x01, 0xFD]);
        // 1 indicator + 2 chunk length + 253 data + 1 terminator
        assert_eq!(out.len(), 257);
        assert_eq!(*out.last().unwrap(), 0x00);
    }

    #[test]
    fn test_long_data_is_split_into_chunks() {
        let data = vec![0x11u8; length::CHUNK_SIZE + 10];
        let mut buf = WriteBuffer::new();
        buf.write_bytes_with_length(Some(&data)).unwrap();

        let out = buf.as_slice();
        assert_eq!(out[0], length::LONG_INDICATOR);
        // first chunk: ub4(32767) = [0x02, 0x7F, 0xFF]
        assert_eq!(&out[1..4], &[0x02, 0x7F, 0xFF]);
        let second = 4 + length::CHUNK_SIZE;
        assert_eq!(&out[second..second + 2], &[0x01, 10]);
        assert_eq!(out.len(), second + 2 + 10 + 1);
    }

    #[test]
    fn test_patch_u32_be() {
        let mut buf = WriteBuffer::new();
        buf.write_u32_be(0).unwrap();
        buf.write_u8(0x42).unwrap();
        buf.patch_u32_be(0, 0x12345678).unwrap();
        assert_eq!(buf.as_slice(), &[0x12, 0x34, 0x56, 0x78, 0x42]);
        assert!(buf.patch_u32_be(3, 1).is_err());
    }

    #[test]
    fn test_max_capacity() {
        let mut buf = WriteBuffer::with_max_capacity(16, 5);
        buf.write_bytes(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(buf.remaining_capacity(), 0);
        assert!(matches!(
            buf.write_u8(6),
            Err(Error::BufferOverflow { needed: 1, available: 0 })
        ));
    }
}
