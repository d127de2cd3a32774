//! Value types that need more than a primitive
//!
//! This module provides the arbitrary precision numeric types and the
//! timestamp codec used when binding parameters.

mod datetime;
mod number;

pub use datetime::{
    check_datetime_range, decode_datetime, encode_datetime, parse_datetime, TIMESTAMP_LENGTH,
};
pub use number::{BigDecimal, BigInteger};
