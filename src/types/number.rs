//! Arbitrary precision numeric values
//!
//! The statement core never does arithmetic on these; they are carried as
//! validated decimal text and sent to the server in that form. Accepted
//! literal grammar:
//!
//! ```text
//! [+-] digits [ '.' digits ] [ (e|E) [+-] digits ]
//! ```
//!
//! A [`BigInteger`] accepts only the integer part of the grammar.

use std::fmt;
use std::str::FromStr;

use crate::constants::FieldType;
use crate::error::{Error, Result};

/// Arbitrary precision integer, stored as canonical decimal text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigInteger {
    value: String,
}

/// Arbitrary precision decimal, stored as canonical decimal text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigDecimal {
    value: String,
    is_integer: bool,
}

/// Parts of a scanned numeric literal
struct Literal<'a> {
    negative: bool,
    int_digits: &'a str,
    frac_digits: Option<&'a str>,
    exponent: Option<&'a str>,
}

fn take_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn scan(field_type: FieldType, input: &str) -> Result<Literal<'_>> {
    let s = input.trim();
    if s.is_empty() {
        return Err(Error::parse(field_type, input, "empty numeric literal"));
    }

    let (negative, rest) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let (int_digits, mut rest) = take_digits(rest);
    let mut frac_digits = None;
    if let Some(after_dot) = rest.strip_prefix('.') {
        let (digits, tail) = take_digits(after_dot);
        if digits.is_empty() {
            return Err(Error::parse(field_type, input, "missing digits after decimal point"));
        }
        frac_digits = Some(digits);
        rest = tail;
    }
    if int_digits.is_empty() && frac_digits.is_none() {
        return Err(Error::parse(field_type, input, "no digits"));
    }

    let mut exponent = None;
    if let Some(after_e) = rest.strip_prefix(['e', 'E']) {
        let unsigned = after_e.strip_prefix(['+', '-']).unwrap_or(after_e);
        let (digits, tail) = take_digits(unsigned);
        if digits.is_empty() {
            return Err(Error::parse(field_type, input, "missing exponent digits"));
        }
        exponent = Some(&after_e[..after_e.len() - tail.len()]);
        rest = tail;
    }

    if let Some(c) = rest.chars().next() {
        return Err(Error::parse(
            field_type,
            input,
            format!("unexpected character {:?}", c),
        ));
    }

    Ok(Literal {
        negative,
        int_digits,
        frac_digits,
        exponent,
    })
}

/// Strip leading zeros, keeping at least one digit
fn trim_leading_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

impl BigInteger {
    /// The decimal text of this integer
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Try to convert to i64
    pub fn to_i64(&self) -> Result<i64> {
        self.value
            .parse()
            .map_err(|e| Error::parse(FieldType::Long, self.value.clone(), format!("{}", e)))
    }

    /// Check if this is negative
    pub fn is_negative(&self) -> bool {
        self.value.starts_with('-')
    }
}

impl FromStr for BigInteger {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lit = scan(FieldType::BigInteger, s)?;
        if lit.frac_digits.is_some() || lit.exponent.is_some() || lit.int_digits.is_empty() {
            return Err(Error::parse(FieldType::BigInteger, s, "not an integer literal"));
        }
        let digits = trim_leading_zeros(lit.int_digits);
        let value = if lit.negative && digits != "0" {
            format!("-{}", digits)
        } else {
            digits.to_string()
        };
        Ok(Self { value })
    }
}

impl From<i64> for BigInteger {
    fn from(v: i64) -> Self {
        Self {
            value: v.to_string(),
        }
    }
}

impl From<i32> for BigInteger {
    fn from(v: i32) -> Self {
        Self::from(v as i64)
    }
}

impl From<u64> for BigInteger {
    fn from(v: u64) -> Self {
        Self {
            value: v.to_string(),
        }
    }
}

impl From<i128> for BigInteger {
    fn from(v: i128) -> Self {
        Self {
            value: v.to_string(),
        }
    }
}

impl fmt::Display for BigInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl BigDecimal {
    /// The decimal text of this number
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Whether the literal has neither a fractional part nor an exponent
    pub fn is_integer(&self) -> bool {
        self.is_integer
    }

    /// Try to convert to f64 (may lose precision)
    pub fn to_f64(&self) -> Result<f64> {
        self.value
            .parse()
            .map_err(|e| Error::parse(FieldType::Double, self.value.clone(), format!("{}", e)))
    }
}

impl FromStr for BigDecimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lit = scan(FieldType::Decimal, s)?;

        let mut value = String::with_capacity(s.len());
        if lit.negative {
            value.push('-');
        }
        value.push_str(trim_leading_zeros(lit.int_digits));
        if let Some(frac) = lit.frac_digits {
            value.push('.');
            value.push_str(frac);
        }
        if let Some(exp) = lit.exponent {
            value.push('E');
            value.push_str(exp);
        }

        Ok(Self {
            is_integer: lit.frac_digits.is_none() && lit.exponent.is_none(),
            value,
        })
    }
}

impl From<BigInteger> for BigDecimal {
    fn from(v: BigInteger) -> Self {
        Self {
            value: v.value,
            is_integer: true,
        }
    }
}

impl From<i64> for BigDecimal {
    fn from(v: i64) -> Self {
        BigInteger::from(v).into()
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
