//! Wire constants for the execute request
//!
//! Field type tags, statement classification and the length indicators used
//! by the request encoder and decoder.

use std::fmt;

// =============================================================================
// Request Header
// =============================================================================

/// Size of the request header in bytes
pub const REQUEST_HEADER_SIZE: usize = 12;

/// Request header constants
#[allow(missing_docs)]
pub mod request {
    pub const MAGIC: u16 = 0xEDB0;
    pub const VERSION: u8 = 1;
}

/// Request header flags
#[allow(missing_docs)]
pub mod request_flags {
    pub const HAS_PARAMS: u8 = 0x01;
    pub const HAS_FETCH_SIZE: u8 = 0x02;
}

/// Request kinds (header byte 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestKind {
    /// Execute a statement
    Execute = 1,
}

impl TryFrom<u8> for RequestKind {
    type Error = crate::error::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RequestKind::Execute),
            _ => Err(crate::error::Error::Protocol(format!(
                "unknown request kind: {}",
                value
            ))),
        }
    }
}

// =============================================================================
// Message Markers
// =============================================================================

/// Markers inside the request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Start of the parameter payload section
    RowData = 7,
}

// =============================================================================
// Length Indicators
// =============================================================================

/// Length indicator constants for length-prefixed data
pub mod length {
    /// Maximum length that fits in a single byte
    pub const MAX_SHORT: u8 = 252;
    /// Escape character for special values
    pub const ESCAPE_CHAR: u8 = 253;
    /// Indicates a long (chunked) length follows
    pub const LONG_INDICATOR: u8 = 254;
    /// Indicates NULL value
    pub const NULL_INDICATOR: u8 = 255;
    /// Chunk size used by the long form
    pub const CHUNK_SIZE: usize = 32767;
}

// =============================================================================
// Field Types
// =============================================================================

/// SQL field types a parameter can be bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldType {
    /// SQL NULL
    Null = 0,
    /// BOOLEAN
    Bool = 1,
    /// SMALLINT (16-bit)
    Short = 2,
    /// INT (32-bit)
    Int = 3,
    /// BIGINT (64-bit)
    Long = 4,
    /// REAL (single precision)
    Float = 5,
    /// DOUBLE PRECISION
    Double = 6,
    /// Arbitrary precision integer
    BigInteger = 7,
    /// Arbitrary precision decimal (NUMERIC / DECIMAL)
    Decimal = 8,
    /// Character data (VARCHAR / TEXT)
    String = 9,
    /// TIMESTAMP
    DateTime = 10,
    /// Binary data (BLOB / VARBINARY)
    Bytes = 11,
}

impl FieldType {
    /// Fixed payload size for fixed-width types, `None` for variable-length types
    pub fn fixed_size(&self) -> Option<u32> {
        match self {
            FieldType::Null => Some(0),
            FieldType::Bool => Some(1),
            FieldType::Short => Some(2),
            FieldType::Int => Some(4),
            FieldType::Long => Some(8),
            FieldType::Float => Some(4),
            FieldType::Double => Some(8),
            FieldType::DateTime => Some(11),
            FieldType::BigInteger | FieldType::Decimal | FieldType::String | FieldType::Bytes => {
                None
            }
        }
    }

    /// Check if this type carries a variable-length payload
    pub fn is_variable_length(&self) -> bool {
        self.fixed_size().is_none()
    }

    /// SQL name of the type
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Null => "NULL",
            FieldType::Bool => "BOOLEAN",
            FieldType::Short => "SMALLINT",
            FieldType::Int => "INT",
            FieldType::Long => "BIGINT",
            FieldType::Float => "REAL",
            FieldType::Double => "DOUBLE",
            FieldType::BigInteger => "BIGINTEGER",
            FieldType::Decimal => "NUMERIC",
            FieldType::String => "VARCHAR",
            FieldType::DateTime => "TIMESTAMP",
            FieldType::Bytes => "BLOB",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for FieldType {
    type Error = crate::error::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FieldType::Null),
            1 => Ok(FieldType::Bool),
            2 => Ok(FieldType::Short),
            3 => Ok(FieldType::Int),
            4 => Ok(FieldType::Long),
            5 => Ok(FieldType::Float),
            6 => Ok(FieldType::Double),
            7 => Ok(FieldType::BigInteger),
            8 => Ok(FieldType::Decimal),
            9 => Ok(FieldType::String),
            10 => Ok(FieldType::DateTime),
            11 => Ok(FieldType::Bytes),
            _ => Err(crate::error::Error::InvalidFieldType(value)),
        }
    }
}

// =============================================================================
// Statement Types
// =============================================================================

/// Statement type determined from the leading SQL keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum StatementType {
    /// Unknown or empty statement
    #[default]
    Unknown = 0,
    /// SELECT / WITH / SHOW ...
    Query = 1,
    /// INSERT, UPDATE, DELETE, MERGE, REPLACE
    Dml = 2,
    /// CREATE, ALTER, DROP, ...
    Ddl = 3,
    /// Stored procedure call or anonymous block
    Procedure = 4,
}

impl TryFrom<u8> for StatementType {
    type Error = crate::error::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(StatementType::Unknown),
            1 => Ok(StatementType::Query),
            2 => Ok(StatementType::Dml),
            3 => Ok(StatementType::Ddl),
            4 => Ok(StatementType::Procedure),
            _ => Err(crate::error::Error::Protocol(format!(
                "unknown statement type: {}",
                value
            ))),
        }
    }
}
