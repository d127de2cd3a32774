//! Execute request encoding and decoding
//!
//! Body layout after the [`RequestHeader`]:
//!
//! ```text
//! ub4                 fetch size
//! bytes_with_length   SQL text (UTF-8)
//! ub4                 parameter count
//! per parameter:      u8 field type, ub4 width hint, ub4 payload length
//! u8                  ROW_DATA marker (only when parameters follow)
//! per parameter:      bytes_with_length payload (NULL indicator for null)
//! ```

use bytes::Bytes;
use tracing::trace;

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::constants::{request_flags, FieldType, MessageType, RequestKind, StatementType};
use crate::error::{Error, Result};
use crate::messages::header::{RequestHeader, LENGTH_OFFSET};
use crate::params::ParameterList;
use crate::value::Value;

/// Number of leading request bytes included in trace dumps
const TRACE_DUMP_BYTES: usize = 64;

/// Builder for a serialized execute request
#[derive(Debug)]
pub struct ExecuteMessage<'a> {
    sql: &'a str,
    params: &'a ParameterList,
    fetch_size: u32,
    statement_type: StatementType,
    max_request_size: Option<usize>,
}

impl<'a> ExecuteMessage<'a> {
    /// Create a new execute message for SQL text and its parameters
    pub fn new(sql: &'a str, params: &'a ParameterList) -> Self {
        Self {
            sql,
            params,
            fetch_size: 0,
            statement_type: StatementType::Unknown,
            max_request_size: None,
        }
    }

    /// Set the fetch size hint (0 = server default)
    pub fn fetch_size(mut self, rows: u32) -> Self {
        self.fetch_size = rows;
        self
    }

    /// Set the statement classification sent in the header
    pub fn statement_type(mut self, statement_type: StatementType) -> Self {
        self.statement_type = statement_type;
        self
    }

    /// Limit the size of the serialized request
    pub fn max_request_size(mut self, limit: Option<usize>) -> Self {
        self.max_request_size = limit;
        self
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if !self.params.is_empty() {
            flags |= request_flags::HAS_PARAMS;
        }
        if self.fetch_size > 0 {
            flags |= request_flags::HAS_FETCH_SIZE;
        }
        flags
    }

    /// Build the execute request
    pub fn build_request(&self) -> Result<Bytes> {
        let capacity = 64 + self.sql.len();
        let mut buf = match self.max_request_size {
            Some(max) => WriteBuffer::with_max_capacity(capacity, max),
            None => WriteBuffer::with_capacity(capacity),
        };

        RequestHeader::new(self.statement_type, self.flags()).write(&mut buf)?;

        buf.write_ub4(self.fetch_size)?;
        buf.write_string_with_length(Some(self.sql))?;
        buf.write_ub4(self.params.len() as u32)?;
        self.write_bind_params(&mut buf)?;

        let total = u32::try_from(buf.len()).map_err(|_| {
            Error::InvalidArgument(format!("request of {} bytes is too large", buf.len()))
        })?;
        buf.patch_u32_be(LENGTH_OFFSET, total)?;

        let request = buf.freeze();
        trace!(
            len = request.len(),
            head = %hex::encode(&request[..request.len().min(TRACE_DUMP_BYTES)]),
            "built execute request"
        );
        Ok(request)
    }

    /// Write parameter metadata followed by the parameter data
    fn write_bind_params(&self, buf: &mut WriteBuffer) -> Result<()> {
        if self.params.is_empty() {
            return Ok(());
        }

        let payloads = self
            .params
            .iter()
            .map(|(_, param)| param.value.encode_payload())
            .collect::<Result<Vec<_>>>()?;

        for ((position, param), payload) in self.params.iter().zip(&payloads) {
            let payload_len = payload.as_ref().map_or(0, Vec::len);
            let len = u32::try_from(payload_len).map_err(|_| {
                Error::InvalidArgument(format!(
                    "parameter {} payload of {} bytes is too large",
                    position, payload_len
                ))
            })?;

            buf.write_u8(param.field_type() as u8)?;
            buf.write_ub4(param.max_size)?;
            buf.write_ub4(len)?;
        }

        buf.write_u8(MessageType::RowData as u8)?;
        for payload in &payloads {
            buf.write_bytes_with_length(payload.as_deref())?;
        }

        Ok(())
    }
}

/// A parameter read back from a serialized request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParam {
    /// Decoded value
    pub value: Value,
    /// Field width hint sent with the parameter
    pub width: u32,
}

/// A decoded execute request
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteRequest {
    /// Request header
    pub header: RequestHeader,
    /// Fetch size hint
    pub fetch_size: u32,
    /// SQL text
    pub sql: String,
    /// Parameters in positional order
    pub params: Vec<RequestParam>,
}

impl ExecuteRequest {
    /// Decode a serialized execute request
    pub fn decode(data: Bytes) -> Result<Self> {
        let header = RequestHeader::parse(&data)?;
        if header.length as usize != data.len() {
            return Err(Error::Protocol(format!(
                "request length mismatch: header says {}, got {}",
                header.length,
                data.len()
            )));
        }
        if header.kind != RequestKind::Execute {
            return Err(Error::Protocol(format!(
                "not an execute request: {:?}",
                header.kind
            )));
        }

        let mut buf = ReadBuffer::new(data);
        buf.skip(crate::constants::REQUEST_HEADER_SIZE)?;

        let fetch_size = buf.read_ub4()?;
        let sql = buf
            .read_string_with_length()?
            .ok_or_else(|| Error::Protocol("missing SQL text".to_string()))?;

        let count = buf.read_ub4()? as usize;
        if header.has_params() != (count > 0) {
            return Err(Error::Protocol(format!(
                "parameter flag does not match parameter count {}",
                count
            )));
        }

        let mut metadata = Vec::with_capacity(count.min(buf.remaining()));
        for _ in 0..count {
            let field_type = FieldType::try_from(buf.read_u8()?)?;
            let width = buf.read_ub4()?;
            let payload_len = buf.read_ub4()? as usize;
            metadata.push((field_type, width, payload_len));
        }

        let mut params = Vec::with_capacity(metadata.len());
        if count > 0 {
            let marker = buf.read_u8()?;
            if marker != MessageType::RowData as u8 {
                return Err(Error::Protocol(format!(
                    "expected row data marker, got {}",
                    marker
                )));
            }
            for (field_type, width, payload_len) in metadata {
                let payload = buf.read_bytes_with_length()?;
                let actual = payload.as_ref().map_or(0, Vec::len);
                if actual != payload_len {
                    return Err(Error::Protocol(format!(
                        "payload length mismatch: declared {}, got {}",
                        payload_len, actual
                    )));
                }
                let value = Value::decode_payload(field_type, payload.as_deref())?;
                params.push(RequestParam { value, width });
            }
        }

        if buf.remaining() != 0 {
            return Err(Error::Protocol(format!(
                "{} trailing bytes after request",
                buf.remaining()
            )));
        }

        Ok(Self {
            header,
            fetch_size,
            sql,
            params,
        })
    }

    /// Field types of the parameters in positional order
    pub fn field_types(&self) -> Vec<FieldType> {
        self.params.iter().map(|p| p.value.field_type()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::BindParam;

    #[test]
    fn test_request_without_params() {
        let params = ParameterList::new();
        let request = ExecuteMessage::new("SELECT 1", &params)
            .statement_type(StatementType::Query)
            .build_request()
            .unwrap();

        // header + ub4(0) + len byte + 8 sql bytes + ub4(0)
        assert_eq!(request.len(), 12 + 1 + 1 + 8 + 1);
        assert_eq!(&request[8..12], &(request.len() as u32).to_be_bytes());

        let decoded = ExecuteRequest::decode(request).unwrap();
        assert_eq!(decoded.sql, "SELECT 1");
        assert_eq!(decoded.header.statement_type, StatementType::Query);
        assert_eq!(decoded.header.flags, 0);
        assert!(decoded.params.is_empty());
    }

    #[test]
    fn test_request_param_layout() {
        let params: ParameterList = [BindParam::with_max_size(42i32, 10), BindParam::null()]
            .into_iter()
            .collect();
        let request = ExecuteMessage::new("?", &params).build_request().unwrap();

        let body = &request[12..];
        // fetch size, sql "?", count 2
        assert_eq!(&body[..5], &[0x00, 0x01, b'?', 0x01, 0x02]);
        // INT, width 10, len 4 / NULL, width 0, len 0
        assert_eq!(&body[5..10], &[3, 0x01, 10, 0x01, 4]);
        assert_eq!(&body[10..13], &[0, 0x00, 0x00]);
        // row data marker, then payloads
        assert_eq!(&body[13..], &[7, 4, 0, 0, 0, 42, 0xff]);

        let decoded = ExecuteRequest::decode(request).unwrap();
        let widths: Vec<u32> = decoded.params.iter().map(|p| p.width).collect();
        assert_eq!(widths, vec![10, 0]);
    }

    #[test]
    fn test_fetch_size_flag() {
        let params = ParameterList::new();
        let request = ExecuteMessage::new("SELECT 1", &params)
            .fetch_size(100)
            .build_request()
            .unwrap();
        let decoded = ExecuteRequest::decode(request).unwrap();
        assert!(decoded.header.has_fetch_size());
        assert_eq!(decoded.fetch_size, 100);
    }

    #[test]
    fn test_max_request_size() {
        let params: ParameterList = [BindParam::new(vec![0u8; 512])].into_iter().collect();
        let err = ExecuteMessage::new("INSERT INTO t VALUES (?)", &params)
            .max_request_size(Some(128))
            .build_request()
            .unwrap_err();
        assert!(matches!(err, Error::BufferOverflow { .. }));
    }

    #[test]
    fn test_decode_rejects_truncated_request() {
        let params: ParameterList = [BindParam::new("abc")].into_iter().collect();
        let request = ExecuteMessage::new("SELECT ?", &params).build_request().unwrap();
        let truncated = request.slice(..request.len() - 1);
        assert!(matches!(
            ExecuteRequest::decode(truncated),
            Err(Error::Protocol(_))
        ));
    }
}
