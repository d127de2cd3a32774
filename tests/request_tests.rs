//! Integration tests for execute request encoding
//!
//! Requests are built through the public builder and read back with the
//! decoder a connection implementation would use.

use chrono::NaiveDate;
use edb_rs::constants::{request_flags, REQUEST_HEADER_SIZE};
use edb_rs::{
    BigDecimal, BigInteger, BindParam, Error, ExecuteMessage, ExecuteRequest, FieldType,
    ParameterList, RequestHeader, StatementType, Value,
};

fn list(params: Vec<BindParam>) -> ParameterList {
    params.into_iter().collect()
}

mod header_tests {
    use super::*;

    #[test]
    fn test_length_field_matches_request() {
        let params = list(vec![BindParam::new("x".repeat(1000))]);
        let request = ExecuteMessage::new("INSERT INTO t VALUES (?)", &params)
            .build_request()
            .unwrap();

        let header = RequestHeader::parse(&request).unwrap();
        assert_eq!(header.length as usize, request.len());
        assert_eq!(header.body_length(), request.len() - REQUEST_HEADER_SIZE);
        assert_eq!(header.flags, request_flags::HAS_PARAMS);
    }

    #[test]
    fn test_statement_type_in_header() {
        let params = ParameterList::new();
        let request = ExecuteMessage::new("CREATE TABLE t (id INT)", &params)
            .statement_type(StatementType::Ddl)
            .fetch_size(10)
            .build_request()
            .unwrap();

        let header = RequestHeader::parse(&request).unwrap();
        assert_eq!(header.statement_type, StatementType::Ddl);
        assert!(header.has_fetch_size());
        assert!(!header.has_params());
    }
}

mod param_tests {
    use super::*;

    #[test]
    fn test_all_types_decode_in_order() {
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_nano_opt(23, 59, 58, 999_999_999)
            .unwrap();
        let big: BigInteger = "-98765432109876543210".parse().unwrap();
        let dec: BigDecimal = "0.000123".parse().unwrap();

        let values = vec![
            Value::Null,
            Value::Bool(false),
            Value::Short(-7),
            Value::Int(i32::MAX),
            Value::Long(i64::MIN),
            Value::Float(0.5),
            Value::Double(-2.25),
            Value::BigInteger(big),
            Value::Decimal(dec),
            Value::String("héllo".to_string()),
            Value::DateTime(ts),
            Value::Bytes(vec![0, 1, 2, 255]),
        ];
        let params = list(values.iter().cloned().map(BindParam::new).collect());

        let request = ExecuteMessage::new("CALL p(?,?,?,?,?,?,?,?,?,?,?,?)", &params)
            .build_request()
            .unwrap();
        let decoded = ExecuteRequest::decode(request).unwrap();

        let decoded_values: Vec<Value> = decoded.params.iter().map(|p| p.value.clone()).collect();
        assert_eq!(decoded_values, values);
        assert_eq!(
            decoded.field_types(),
            vec![
                FieldType::Null,
                FieldType::Bool,
                FieldType::Short,
                FieldType::Int,
                FieldType::Long,
                FieldType::Float,
                FieldType::Double,
                FieldType::BigInteger,
                FieldType::Decimal,
                FieldType::String,
                FieldType::DateTime,
                FieldType::Bytes,
            ]
        );
    }

    #[test]
    fn test_width_hint_is_not_truncation() {
        let params = list(vec![BindParam::with_max_size("abcdef", 3)]);
        let request = ExecuteMessage::new("SELECT ?", &params).build_request().unwrap();
        let decoded = ExecuteRequest::decode(request).unwrap();

        assert_eq!(decoded.params[0].width, 3);
        assert_eq!(decoded.params[0].value, Value::String("abcdef".to_string()));
    }

    #[test]
    fn test_declared_width_sent_as_given() {
        let params = list(vec![
            BindParam::with_max_size(7i32, 10),
            BindParam::new("abc"),
            BindParam::with_max_size(Value::Null, 16),
        ]);
        let request = ExecuteMessage::new("SELECT ?, ?, ?", &params)
            .build_request()
            .unwrap();
        let decoded = ExecuteRequest::decode(request).unwrap();

        let widths: Vec<u32> = decoded.params.iter().map(|p| p.width).collect();
        assert_eq!(widths, vec![10, 0, 16]);
        assert_eq!(decoded.params[0].value, Value::Int(7));
        assert_eq!(decoded.params[1].value, Value::String("abc".to_string()));
    }

    #[test]
    fn test_large_blob_roundtrip() {
        let blob: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let params = list(vec![BindParam::new(blob.clone())]);
        let request = ExecuteMessage::new("INSERT INTO files VALUES (?)", &params)
            .build_request()
            .unwrap();
        let decoded = ExecuteRequest::decode(request).unwrap();

        assert_eq!(decoded.params[0].value, Value::Bytes(blob));
        assert_eq!(decoded.params[0].width, 0);
    }

    #[test]
    fn test_empty_blob_is_not_null() {
        let params = list(vec![BindParam::new(Vec::<u8>::new())]);
        let request = ExecuteMessage::new("SELECT ?", &params).build_request().unwrap();
        let decoded = ExecuteRequest::decode(request).unwrap();
        assert_eq!(decoded.params[0].value, Value::Bytes(Vec::new()));
    }
}

mod decode_error_tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    fn sample() -> Bytes {
        let params = list(vec![BindParam::new(1i32)]);
        ExecuteMessage::new("SELECT ?", &params).build_request().unwrap()
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut data = BytesMut::from(&sample()[..]);
        data.extend_from_slice(&[0]);
        let len = data.len() as u32;
        data[8..12].copy_from_slice(&len.to_be_bytes());

        assert!(matches!(
            ExecuteRequest::decode(data.freeze()),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_unknown_field_type_rejected() {
        let mut data = BytesMut::from(&sample()[..]);
        // body: ub4(0), 0x08 "SELECT ?", ub4(1), then the field type tag
        let tag_offset = REQUEST_HEADER_SIZE + 1 + 9 + 2;
        assert_eq!(data[tag_offset], FieldType::Int as u8);
        data[tag_offset] = 42;

        assert!(matches!(
            ExecuteRequest::decode(data.freeze()),
            Err(Error::InvalidFieldType(42))
        ));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut data = BytesMut::from(&sample()[..]);
        data[0] = 0;
        assert!(matches!(
            ExecuteRequest::decode(data.freeze()),
            Err(Error::Protocol(_))
        ));
    }
}
