#![warn(missing_docs)]

//! # edb-rs
//!
//! Parameter binding and statement execution core for EDB SQL client drivers.
//!
//! This crate accumulates typed, positional query parameters, serializes them
//! together with the SQL text into a wire-ready request and tracks the
//! lifecycle of the statement and its result. The network transport lives
//! behind the [`Connection`] trait.
//!
//! ## Features
//!
//! - **Typed binding** - Native values, text literals and raw payloads
//! - **Positional parameters** - Bind order defines the 1-based position
//! - **One open result** - A new execution or `clear()` releases the previous result
//! - **Async/await** - Execution is delegated to an async [`Connection`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edb_rs::{Connection, Statement, StatementState};
//!
//! # async fn example(conn: &dyn Connection) -> edb_rs::Result<()> {
//! let mut stmt = Statement::new(conn);
//! stmt.set_sql("INSERT INTO users (id, name) VALUES (?, ?)")?
//!     .bind_int(1)?
//!     .bind_string("Alice")?;
//!
//! match stmt.execute().await.map(|result| result.rows_affected) {
//!     Ok(rows) => println!("{} rows inserted", rows),
//!     Err(_) => println!("insert failed: {}", stmt.error_message()),
//! }
//! assert_ne!(stmt.state(), StatementState::Executing);
//!
//! stmt.clear()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Binding from Text
//!
//! Every typed binder has a textual counterpart. Invalid literals are
//! rejected, never truncated:
//!
//! ```rust
//! use edb_rs::{FieldType, Statement};
//!
//! let mut stmt = Statement::detached();
//! stmt.set_sql("UPDATE t SET flag = ?, amount = ? WHERE id = ?").unwrap()
//!     .bind_text(FieldType::Bool, "yes").unwrap()
//!     .bind_text(FieldType::Decimal, "12.50").unwrap();
//!
//! assert!(stmt.bind_text(FieldType::Int, "12abc").unwrap_err().is_parse_error());
//! assert_eq!(stmt.params().len(), 2);
//! ```
//!
//! ## Fetch Size
//!
//! ```rust
//! use edb_rs::Statement;
//!
//! let mut stmt = Statement::detached();
//! stmt.set_fetch_size(500).unwrap();
//! assert!(stmt.set_fetch_size(-1).is_err());
//! assert_eq!(stmt.fetch_size(), 500);
//! ```
//!
//! ## Logging
//!
//! Diagnostics are emitted through [`tracing`]; install a subscriber in the
//! application to see them. Parameter values are only logged when
//! `log_bind_values` is enabled in [`Config`].

pub mod buffer;
pub mod config;
pub mod connection;
pub mod constants;
pub mod error;
pub mod messages;
pub mod params;
pub mod statement;
pub mod types;
pub mod value;

// Re-exports for convenience
pub use config::Config;
pub use connection::{Connection, ResultSet};
pub use constants::{FieldType, StatementType};
pub use error::{Error, Result};
pub use messages::{ExecuteMessage, ExecuteRequest, RequestHeader, RequestParam};
pub use params::{BindParam, ParameterList, Positions};
pub use statement::{Statement, StatementState};
pub use types::{BigDecimal, BigInteger};
pub use value::Value;
