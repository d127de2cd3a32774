//! SQL statement with positional parameters
//!
//! A [`Statement`] owns its SQL text and [`ParameterList`], borrows a
//! [`Connection`] and tracks the lifecycle of the single result it may have
//! open at any time.

use std::fmt;

use bytes::Bytes;
use chrono::NaiveDateTime;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::connection::{Connection, ResultSet};
use crate::constants::{FieldType, StatementType};
use crate::error::{Error, Result};
use crate::messages::ExecuteMessage;
use crate::params::{BindParam, ParameterList};
use crate::types::{BigDecimal, BigInteger};
use crate::value::Value;

/// Lifecycle state of a [`Statement`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementState {
    /// No SQL text set
    #[default]
    Idle,
    /// SQL text set, parameters may be bound
    Bound,
    /// A request is in flight
    Executing,
    /// The last execution succeeded and its result is open
    HasResult,
    /// The last execution failed
    Failed,
    /// Released; no further use is possible
    Closed,
}

impl StatementState {
    /// Name of the state
    pub fn name(&self) -> &'static str {
        match self {
            StatementState::Idle => "Idle",
            StatementState::Bound => "Bound",
            StatementState::Executing => "Executing",
            StatementState::HasResult => "HasResult",
            StatementState::Failed => "Failed",
            StatementState::Closed => "Closed",
        }
    }
}

impl fmt::Display for StatementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A SQL statement bound to a connection.
///
/// Parameters are bound positionally in call order. Mutators return
/// `&mut Self` so calls can be chained; each one fails with
/// [`Error::InvalidState`] once the statement has been cleared.
///
/// # Example
///
/// ```rust,no_run
/// use edb_rs::{Connection, Statement};
///
/// # async fn example(conn: &dyn Connection) -> edb_rs::Result<()> {
/// let mut stmt = Statement::new(conn);
/// stmt.set_sql("INSERT INTO t (id, name) VALUES (?, ?)")?
///     .bind_int(42)?
///     .bind_string("abc")?;
///
/// let result = stmt.execute().await?;
/// println!("{} rows inserted", result.rows_affected);
///
/// stmt.clear()?;
/// # Ok(())
/// # }
/// ```
pub struct Statement<'c> {
    connection: Option<&'c dyn Connection>,
    sql: String,
    statement_type: StatementType,
    placeholder_count: usize,
    params: ParameterList,
    fetch_size: u32,
    max_request_size: Option<usize>,
    log_bind_values: bool,
    state: StatementState,
    result: Option<ResultSet>,
    error_message: String,
}

impl<'c> Statement<'c> {
    /// Create a statement on a connection with default settings
    pub fn new(connection: &'c dyn Connection) -> Self {
        Self::with_config(connection, &Config::default())
    }

    /// Create a statement on a connection with the given defaults
    pub fn with_config(connection: &'c dyn Connection, config: &Config) -> Self {
        let mut stmt = Self::from_config(config);
        stmt.connection = Some(connection);
        stmt
    }

    /// Create a statement that is not yet bound to a connection
    pub fn detached() -> Self {
        Self::from_config(&Config::default())
    }

    fn from_config(config: &Config) -> Self {
        Self {
            connection: None,
            sql: String::new(),
            statement_type: StatementType::Unknown,
            placeholder_count: 0,
            params: ParameterList::new(),
            fetch_size: config.fetch_size,
            max_request_size: config.max_request_size,
            log_bind_values: config.log_bind_values,
            state: StatementState::Idle,
            result: None,
            error_message: String::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The connection this statement executes on
    pub fn connection(&self) -> Option<&'c dyn Connection> {
        self.connection
    }

    /// Current SQL text (empty when none is set)
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Classification of the current SQL text
    pub fn statement_type(&self) -> StatementType {
        self.statement_type
    }

    /// Number of `?` placeholders in the current SQL text
    pub fn placeholder_count(&self) -> usize {
        self.placeholder_count
    }

    /// Bound parameters in positional order
    pub fn params(&self) -> &ParameterList {
        &self.params
    }

    /// Current lifecycle state
    pub fn state(&self) -> StatementState {
        self.state
    }

    /// The open result of the last successful execution
    pub fn result(&self) -> Option<&ResultSet> {
        self.result.as_ref()
    }

    /// Message of the last error, empty when there is none
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Fetch size hint sent with the next execution (0 = server default)
    pub fn fetch_size(&self) -> u32 {
        self.fetch_size
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    fn ensure_open(&self, operation: &str) -> Result<()> {
        if self.state == StatementState::Closed {
            return Err(Error::InvalidState(format!(
                "cannot {} a closed statement",
                operation
            )));
        }
        Ok(())
    }

    /// Attach the statement to a connection
    ///
    /// An open result is released on the previous connection first.
    pub fn set_connection(&mut self, connection: &'c dyn Connection) -> Result<&mut Self> {
        self.ensure_open("attach")?;
        self.release_or_record();
        self.connection = Some(connection);
        if self.state == StatementState::HasResult {
            self.state = StatementState::Bound;
        }
        Ok(self)
    }

    /// Replace the SQL text
    ///
    /// Clears all parameters and releases any open result.
    pub fn set_sql(&mut self, sql: impl Into<String>) -> Result<&mut Self> {
        self.ensure_open("set SQL on")?;
        self.error_message.clear();
        self.release_or_record();

        self.sql = sql.into();
        self.statement_type = classify_sql(&self.sql);
        self.placeholder_count = count_placeholders(&self.sql);
        self.params.clear();
        self.state = StatementState::Bound;

        trace!(
            statement_type = ?self.statement_type,
            placeholders = self.placeholder_count,
            "SQL replaced"
        );
        Ok(self)
    }

    /// Replace the SQL text with formatted text
    ///
    /// ```rust
    /// # use edb_rs::Statement;
    /// let mut stmt = Statement::detached();
    /// stmt.set_sql_fmt(format_args!("SELECT * FROM {} WHERE id = ?", "users")).unwrap();
    /// assert_eq!(stmt.sql(), "SELECT * FROM users WHERE id = ?");
    /// ```
    pub fn set_sql_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<&mut Self> {
        self.set_sql(fmt::format(args))
    }

    /// Remove the SQL text and all parameters
    pub fn clear_sql(&mut self) -> Result<&mut Self> {
        self.ensure_open("clear SQL of")?;
        self.error_message.clear();
        self.release_or_record();

        self.sql.clear();
        self.statement_type = StatementType::Unknown;
        self.placeholder_count = 0;
        self.params.clear();
        self.state = StatementState::Idle;
        Ok(self)
    }

    /// Set the fetch size used by the next execution
    ///
    /// Negative values are rejected; 0 lets the server choose.
    pub fn set_fetch_size(&mut self, rows: i32) -> Result<&mut Self> {
        self.ensure_open("set fetch size on")?;
        self.fetch_size = u32::try_from(rows).map_err(|_| {
            Error::InvalidArgument(format!("fetch size must not be negative, got {}", rows))
        })?;
        Ok(self)
    }

    // =========================================================================
    // Binding
    // =========================================================================

    /// Append a parameter
    ///
    /// A value that cannot be encoded, such as a timestamp outside years
    /// -9999..=9999, fails with [`Error::InvalidArgument`] and binds nothing.
    pub fn bind_param(&mut self, param: BindParam) -> Result<&mut Self> {
        self.ensure_open("bind to")?;
        param.value.check_encodable()?;
        let field_type = param.field_type();
        let max_size = param.max_size;

        if self.log_bind_values {
            let value = param.value.to_string();
            let position = self.params.push(param);
            trace!(position, %field_type, max_size, value = %value, "bound parameter");
        } else {
            let position = self.params.push(param);
            trace!(position, %field_type, max_size, "bound parameter");
        }
        Ok(self)
    }

    /// Append a value with the default field width
    pub fn bind(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        self.bind_param(BindParam::new(value))
    }

    /// Append a value with a declared maximum field width
    pub fn bind_with_width(&mut self, value: impl Into<Value>, max_size: u32) -> Result<&mut Self> {
        self.bind_param(BindParam::with_max_size(value, max_size))
    }

    /// Append a raw payload of the given type
    ///
    /// Binary payloads are taken verbatim, other types are parsed from the
    /// payload text. A missing payload is only valid for NULL.
    pub fn bind_raw(
        &mut self,
        field_type: FieldType,
        payload: Option<&[u8]>,
        max_size: u32,
    ) -> Result<&mut Self> {
        self.ensure_open("bind to")?;
        let value = Value::from_raw(field_type, payload)?;
        self.bind_with_width(value, max_size)
    }

    /// Append a value parsed from text
    pub fn bind_text(&mut self, field_type: FieldType, text: &str) -> Result<&mut Self> {
        self.ensure_open("bind to")?;
        let value = Value::parse(field_type, text)?;
        self.bind(value)
    }

    /// Append a value parsed from formatted text
    pub fn bind_fmt(&mut self, field_type: FieldType, args: fmt::Arguments<'_>) -> Result<&mut Self> {
        match args.as_str() {
            Some(text) => self.bind_text(field_type, text),
            None => self.bind_text(field_type, &fmt::format(args)),
        }
    }

    /// Append a string
    pub fn bind_string(&mut self, value: impl Into<String>) -> Result<&mut Self> {
        self.bind(Value::String(value.into()))
    }

    /// Append a boolean
    pub fn bind_bool(&mut self, value: bool) -> Result<&mut Self> {
        self.bind(value)
    }

    /// Append a 16-bit integer
    pub fn bind_short(&mut self, value: i16) -> Result<&mut Self> {
        self.bind(value)
    }

    /// Append a 32-bit integer
    pub fn bind_int(&mut self, value: i32) -> Result<&mut Self> {
        self.bind(value)
    }

    /// Append a 64-bit integer
    pub fn bind_long(&mut self, value: i64) -> Result<&mut Self> {
        self.bind(value)
    }

    /// Append a single precision float
    pub fn bind_float(&mut self, value: f32) -> Result<&mut Self> {
        self.bind(value)
    }

    /// Append a double
    pub fn bind_double(&mut self, value: f64) -> Result<&mut Self> {
        self.bind(value)
    }

    /// Append an integer as an arbitrary precision number
    pub fn bind_numeric(&mut self, value: i64) -> Result<&mut Self> {
        self.bind(BigInteger::from(value))
    }

    /// Append an arbitrary precision integer
    pub fn bind_big_integer(&mut self, value: BigInteger) -> Result<&mut Self> {
        self.bind(value)
    }

    /// Append an arbitrary precision decimal
    pub fn bind_decimal(&mut self, value: BigDecimal) -> Result<&mut Self> {
        self.bind(value)
    }

    /// Append a timestamp; `None` binds NULL
    pub fn bind_datetime(&mut self, value: Option<NaiveDateTime>) -> Result<&mut Self> {
        self.bind(value)
    }

    /// Append binary data
    pub fn bind_bytes(&mut self, value: &[u8]) -> Result<&mut Self> {
        self.bind(value)
    }

    /// Append an explicit NULL
    pub fn bind_null(&mut self) -> Result<&mut Self> {
        self.bind_param(BindParam::null())
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Serialize the SQL text, parameters and fetch size into a request
    pub fn build_request(&self) -> Result<Bytes> {
        ExecuteMessage::new(&self.sql, &self.params)
            .fetch_size(self.fetch_size)
            .statement_type(self.statement_type)
            .max_request_size(self.max_request_size)
            .build_request()
    }

    /// Execute the statement
    ///
    /// Any result still open from a previous execution is released first.
    /// Every bound parameter is sent, including those bound before an
    /// earlier execution. On failure the statement moves to
    /// [`StatementState::Failed`] and the message is kept for
    /// [`error_message`](Self::error_message).
    ///
    /// SQL text that is empty or consists only of whitespace is rejected with
    /// [`Error::InvalidState`] without contacting the connection.
    ///
    /// The returned result borrows the statement. It stays open until the
    /// next `execute`, `set_sql`, `clear_sql`, `set_connection` or `clear`,
    /// each of which closes it.
    pub async fn execute(&mut self) -> Result<&ResultSet> {
        self.ensure_open("execute")?;
        if self.sql.trim().is_empty() {
            return Err(Error::InvalidState(
                "cannot execute a statement without SQL text".to_string(),
            ));
        }
        let connection = self.connection.ok_or_else(|| {
            Error::InvalidState("statement is not attached to a connection".to_string())
        })?;

        if self.state == StatementState::Executing {
            warn!("previous execution was interrupted before completing");
        }
        if self.params.len() != self.placeholder_count {
            warn!(
                placeholders = self.placeholder_count,
                params = self.params.len(),
                "bound parameter count does not match placeholders"
            );
        }

        if let Err(e) = self.release_result() {
            return Err(self.fail(e.into_execution()));
        }

        let request = match self.build_request() {
            Ok(request) => request,
            Err(e) => return Err(self.fail(e)),
        };

        debug!(
            sql = %self.sql,
            params = self.params.len(),
            fetch_size = self.fetch_size,
            statement_type = ?self.statement_type,
            "executing statement"
        );
        self.state = StatementState::Executing;

        match connection.execute(request).await {
            Ok(result) => {
                self.state = StatementState::HasResult;
                self.error_message.clear();
                Ok(&*self.result.insert(result))
            }
            Err(e) => Err(self.fail(e.into_execution())),
        }
    }

    /// Release the open result and all pending state
    ///
    /// The statement is [`Closed`](StatementState::Closed) afterwards even if
    /// releasing the result fails. Clearing a closed statement does nothing.
    pub fn clear(&mut self) -> Result<()> {
        if self.state == StatementState::Closed {
            return Ok(());
        }
        if self.state == StatementState::Executing {
            warn!("clearing a statement whose execution was interrupted");
        }

        let released = self.release_result();

        self.sql.clear();
        self.statement_type = StatementType::Unknown;
        self.placeholder_count = 0;
        self.params.clear();
        self.state = StatementState::Closed;

        released.map_err(|e| {
            let err = e.into_execution();
            self.error_message = message_of(&err);
            err
        })
    }

    fn fail(&mut self, err: Error) -> Error {
        self.state = StatementState::Failed;
        self.error_message = message_of(&err);
        err
    }

    /// Close the open result on its connection
    fn release_result(&mut self) -> Result<()> {
        let Some(result) = self.result.take() else {
            return Ok(());
        };
        let Some(connection) = self.connection else {
            return Ok(());
        };
        debug!(cursor_id = result.cursor_id, "closing result");
        connection.close_result(&result)
    }

    /// Release the open result, keeping a failure in the error slot
    fn release_or_record(&mut self) {
        if let Err(e) = self.release_result() {
            warn!(error = %e, "failed to close previous result");
            self.error_message = message_of(&e);
        }
    }
}

fn message_of(err: &Error) -> String {
    match err.server_message() {
        Some(message) => message.to_string(),
        None => err.to_string(),
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        if self.result.is_some() {
            warn!("statement dropped with an open result; call clear() first");
        }
        if let Err(e) = self.clear() {
            warn!(error = %e, "failed to release statement on drop");
        }
    }
}

impl fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("state", &self.state)
            .field("params", &self.params.len())
            .field("fetch_size", &self.fetch_size)
            .field("connected", &self.connection.is_some())
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// SQL scanning
// =============================================================================

/// Skip leading whitespace, comments and opening parentheses
fn skip_leading_noise(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail);
        } else if let Some(after) = rest.strip_prefix('(') {
            rest = after;
        } else {
            return rest;
        }
    }
}

/// Determine the statement type from the leading keyword
pub(crate) fn classify_sql(sql: &str) -> StatementType {
    let rest = skip_leading_noise(sql);
    let keyword: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    match keyword.as_str() {
        "SELECT" | "WITH" | "SHOW" | "DESCRIBE" | "DESC" | "EXPLAIN" | "VALUES" => {
            StatementType::Query
        }
        "INSERT" | "UPDATE" | "DELETE" | "MERGE" | "REPLACE" | "UPSERT" => StatementType::Dml,
        "CREATE" | "ALTER" | "DROP" | "TRUNCATE" | "GRANT" | "REVOKE" | "COMMENT" | "RENAME"
        | "ANALYZE" => StatementType::Ddl,
        "CALL" | "EXEC" | "EXECUTE" | "BEGIN" | "DECLARE" | "DO" => StatementType::Procedure,
        _ => StatementType::Unknown,
    }
}

/// Count `?` placeholders outside of literals, quoted identifiers and comments
pub(crate) fn count_placeholders(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut count = 0;
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                // doubled quotes inside a literal reopen it on the next pass
                i += 1;
                while i < len && bytes[i] != quote {
                    i += 1;
                }
                i += 1;
            }
            b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i += 2;
                while i < len && !(bytes[i] == b'*' && i + 1 < len && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
            }
            b'?' => {
                count += 1;
                i += 1;
            }
            _ => i += 1,
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_sql() {
        assert_eq!(classify_sql("SELECT * FROM t"), StatementType::Query);
        assert_eq!(classify_sql("  with x as (select 1) select * from x"), StatementType::Query);
        assert_eq!(classify_sql("(SELECT 1) UNION (SELECT 2)"), StatementType::Query);
        assert_eq!(classify_sql("insert into t values (?)"), StatementType::Dml);
        assert_eq!(classify_sql("-- note\nUPDATE t SET a = 1"), StatementType::Dml);
        assert_eq!(classify_sql("/* hint */ DELETE FROM t"), StatementType::Dml);
        assert_eq!(classify_sql("CREATE TABLE t (id INT)"), StatementType::Ddl);
        assert_eq!(classify_sql("CALL proc(?)"), StatementType::Procedure);
        assert_eq!(classify_sql(""), StatementType::Unknown);
        assert_eq!(classify_sql("VACUUM"), StatementType::Unknown);
    }

    #[test]
    fn test_count_placeholders() {
        assert_eq!(count_placeholders("INSERT INTO t VALUES(?,?)"), 2);
        assert_eq!(count_placeholders("SELECT '?' FROM t WHERE a = ?"), 1);
        assert_eq!(count_placeholders("SELECT \"odd?col\" FROM t"), 0);
        assert_eq!(count_placeholders("SELECT 1 -- why?\nWHERE a = ?"), 1);
        assert_eq!(count_placeholders("SELECT /* ? */ ?"), 1);
        assert_eq!(count_placeholders("SELECT 'it''s ?', ?"), 1);
        assert_eq!(count_placeholders("SELECT 'unterminated ?"), 0);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(StatementState::default(), StatementState::Idle);
        assert_eq!(StatementState::HasResult.to_string(), "HasResult");
    }

    #[test]
    fn test_detached_statement_binds() {
        let mut stmt = Statement::detached();
        stmt.set_sql("SELECT ?").unwrap().bind_int(1).unwrap();
        assert_eq!(stmt.state(), StatementState::Bound);
        assert_eq!(stmt.params().len(), 1);
        assert!(stmt.connection().is_none());
    }

    #[test]
    fn test_bind_fmt() {
        let mut stmt = Statement::detached();
        stmt.bind_fmt(FieldType::Long, format_args!("{}{}", 4, 2)).unwrap();
        stmt.bind_fmt(FieldType::String, format_args!("plain")).unwrap();
        assert_eq!(stmt.params().get(1).unwrap().value, Value::Long(42));
        assert_eq!(stmt.params().get(2).unwrap().value, Value::String("plain".into()));
    }

    #[test]
    fn test_set_fetch_size() {
        let mut stmt = Statement::detached();
        assert!(stmt.set_fetch_size(-1).unwrap_err().is_invalid_argument());
        stmt.set_fetch_size(0).unwrap();
        assert_eq!(stmt.fetch_size(), 0);
        stmt.set_fetch_size(250).unwrap();
        assert_eq!(stmt.fetch_size(), 250);
    }

    #[test]
    fn test_closed_statement_rejects_mutation() {
        let mut stmt = Statement::detached();
        stmt.clear().unwrap();
        assert!(stmt.set_sql("SELECT 1").unwrap_err().is_invalid_state());
        assert!(stmt.bind_int(1).unwrap_err().is_invalid_state());
        assert!(stmt.set_fetch_size(1).unwrap_err().is_invalid_state());
        assert!(stmt.clear_sql().unwrap_err().is_invalid_state());
    }
}
