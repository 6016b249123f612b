use std::collections::HashSet;

use anyhow::{Context as _, anyhow, bail};
use async_trait::async_trait;
use chrono::{Datelike, Timelike};
use mysql_async::{Conn, Opts, OptsBuilder, Params, SslOpts, Value, prelude::Queryable};
use toolbelt_core::{ConnectionProfile, SslMode};

use crate::{ConnectionState, DbAdapter, HandlerOptions, PreparedCommand, Result, SqlValue};

/// Adapter over a single `mysql_async` connection that exists only while open.
pub struct MySqlAdapter {
    opts: Opts,
    conn: Option<Conn>,
}

impl MySqlAdapter {
    pub fn new(profile: &ConnectionProfile, options: &HandlerOptions) -> Result<Self> {
        let port = profile
            .port()
            .parse::<u16>()
            .with_context(|| format!("Invalid MySQL port `{}`", profile.port()))?;
        let builder = OptsBuilder::default()
            .ip_or_hostname(profile.server())
            .tcp_port(port)
            .db_name(Some(profile.database()))
            .user(Some(profile.username()))
            .pass(Some(profile.password()))
            .ssl_opts(ssl_opts(options.ssl_mode));
        Ok(Self {
            opts: Opts::from(builder),
            conn: None,
        })
    }
}

#[async_trait]
impl DbAdapter for MySqlAdapter {
    async fn open(&mut self) -> Result<()> {
        if self.conn.is_none() {
            let conn = Conn::new(self.opts.clone()).await?;
            self.conn = Some(conn);
        }
        Ok(())
    }

    async fn execute_non_query(&mut self, command: &PreparedCommand) -> Result<u64> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| anyhow!("Database connection is not open."))?;
        let statement = PositionalStatement::from_command(command)?;
        if !statement.unused.is_empty() {
            tracing::debug!(
                unused = ?statement.unused,
                "Ignoring parameters the statement does not reference."
            );
        }
        if statement.values.is_empty() {
            conn.query_drop(statement.sql).await?;
        } else {
            conn.exec_drop(statement.sql, Params::Positional(statement.values))
                .await?;
        }
        Ok(conn.affected_rows())
    }

    async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(err) = conn.disconnect().await {
                tracing::warn!("Failed to close MySQL connection cleanly: {err}");
            }
        }
    }

    fn state(&self) -> ConnectionState {
        if self.conn.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }
}

fn ssl_opts(mode: SslMode) -> Option<SslOpts> {
    match mode {
        SslMode::None => None,
        SslMode::Preferred | SslMode::Required => Some(
            SslOpts::default()
                .with_danger_accept_invalid_certs(true)
                .with_danger_skip_domain_validation(true),
        ),
        SslMode::VerifyCa => Some(SslOpts::default().with_danger_skip_domain_validation(true)),
        SslMode::VerifyFull => Some(SslOpts::default()),
    }
}

/// A command with its bound placeholders replaced by `?` and the values in
/// the order the placeholders appear.
#[derive(Debug)]
pub(crate) struct PositionalStatement {
    pub sql: String,
    pub values: Vec<Value>,
    /// Bound names the SQL never references.
    pub unused: Vec<String>,
}

impl PositionalStatement {
    /// Rewrites every `@name` or `:name` whose `name` is bound. Quoted text,
    /// comments, `@@system` variables and unbound variables pass through.
    pub(crate) fn from_command(command: &PreparedCommand) -> Result<Self> {
        let chars: Vec<char> = command.sql().chars().collect();
        let mut sql = String::with_capacity(command.sql().len());
        let mut values = Vec::new();
        let mut used: HashSet<&str> = HashSet::new();
        let mut idx = 0;

        while idx < chars.len() {
            let end = match chars[idx] {
                quote @ ('\'' | '"' | '`') => quoted_end(&chars, idx, quote),
                '#' => line_end(&chars, idx),
                '-' if chars.get(idx + 1) == Some(&'-')
                    && chars.get(idx + 2).is_none_or(|c| c.is_whitespace()) =>
                {
                    line_end(&chars, idx)
                }
                '/' if chars.get(idx + 1) == Some(&'*') => block_comment_end(&chars, idx),
                '@' if chars.get(idx + 1) == Some(&'@') => identifier_end(&chars, idx + 2),
                '@' | ':' => {
                    let end = identifier_end(&chars, idx + 1);
                    let name: String = chars[idx + 1..end].iter().collect();
                    if let Some(parameter) = command.parameter(&name) {
                        sql.push('?');
                        values.push(to_mysql_value(&parameter.value)?);
                        used.insert(parameter.bare_name());
                        idx = end;
                        continue;
                    }
                    end
                }
                _ => idx + 1,
            };
            sql.extend(&chars[idx..end]);
            idx = end;
        }

        let unused = command
            .parameters()
            .iter()
            .filter(|parameter| !used.contains(parameter.bare_name()))
            .map(|parameter| parameter.name.clone())
            .collect();
        Ok(Self {
            sql,
            values,
            unused,
        })
    }
}

fn to_mysql_value(value: &SqlValue) -> Result<Value> {
    let value = match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Bool(v) => Value::Int(i64::from(*v)),
        SqlValue::Int(v) => Value::Int(*v),
        SqlValue::UInt(v) => Value::UInt(*v),
        SqlValue::Float(v) => Value::Double(*v),
        SqlValue::Text(v) => Value::Bytes(v.as_bytes().to_vec()),
        SqlValue::Bytes(v) => Value::Bytes(v.clone()),
        SqlValue::Date(d) => {
            Value::Date(mysql_year(d.year())?, d.month() as u8, d.day() as u8, 0, 0, 0, 0)
        }
        SqlValue::DateTime(dt) => {
            let micros = dt.nanosecond() / 1_000;
            if micros > 999_999 {
                bail!("Leap second in {dt} cannot be stored in MySQL.");
            }
            Value::Date(
                mysql_year(dt.year())?,
                dt.month() as u8,
                dt.day() as u8,
                dt.hour() as u8,
                dt.minute() as u8,
                dt.second() as u8,
                micros,
            )
        }
        SqlValue::Json(v) => Value::Bytes(v.to_string().into_bytes()),
        SqlValue::Uuid(v) => Value::Bytes(v.hyphenated().to_string().into_bytes()),
    };
    Ok(value)
}

fn mysql_year(year: i32) -> Result<u16> {
    u16::try_from(year)
        .ok()
        .filter(|year| *year <= 9999)
        .ok_or_else(|| anyhow!("Year {year} is outside MySQL's 0..=9999 range."))
}

fn quoted_end(chars: &[char], start: usize, quote: char) -> usize {
    let mut idx = start + 1;
    while idx < chars.len() {
        let c = chars[idx];
        if c == '\\' && quote != '`' {
            idx += 2;
        } else if c == quote {
            if chars.get(idx + 1) == Some(&quote) {
                idx += 2;
            } else {
                return idx + 1;
            }
        } else {
            idx += 1;
        }
    }
    chars.len()
}

fn line_end(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|c| *c == '\n')
        .map_or(chars.len(), |offset| start + offset + 1)
}

fn block_comment_end(chars: &[char], start: usize) -> usize {
    chars[start + 2..]
        .windows(2)
        .position(|pair| pair == ['*', '/'])
        .map_or(chars.len(), |offset| start + 2 + offset + 2)
}

fn identifier_end(chars: &[char], start: usize) -> usize {
    chars[start.min(chars.len())..]
        .iter()
        .position(|c| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
        .map_or(chars.len(), |offset| start + offset)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn positional(sql: &str, names: &[&str]) -> PositionalStatement {
        let bindings = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (*name, SqlValue::Int(idx as i64)));
        PositionalStatement::from_command(&PreparedCommand::with_bindings(sql, bindings).unwrap())
            .unwrap()
    }

    #[test]
    fn bound_placeholders_become_positional() {
        let statement = positional(
            "SELECT * FROM examples WHERE foo = @bar LIMIT @limit;",
            &["@limit", "@bar"],
        );
        assert_eq!(statement.sql, "SELECT * FROM examples WHERE foo = ? LIMIT ?;");
        assert_eq!(statement.values, vec![Value::Int(1), Value::Int(0)]);
        assert!(statement.unused.is_empty());
    }

    #[test]
    fn any_identifier_style_is_bound() {
        let statement = positional(
            "UPDATE users SET name = @userName, price = :price$usd WHERE id = @Id",
            &["@Id", "@userName", "price$usd"],
        );
        assert_eq!(statement.sql, "UPDATE users SET name = ?, price = ? WHERE id = ?");
        assert_eq!(
            statement.values,
            vec![Value::Int(1), Value::Int(2), Value::Int(0)]
        );
        assert!(!statement.sql.contains('@') && !statement.sql.contains(':'));
    }

    #[test]
    fn repeated_placeholder_repeats_its_value() {
        let statement = positional("UPDATE t SET a = @v WHERE b = @v", &["v"]);
        assert_eq!(statement.sql, "UPDATE t SET a = ? WHERE b = ?");
        assert_eq!(statement.values, vec![Value::Int(0), Value::Int(0)]);
    }

    #[test]
    fn leaves_user_and_system_variables_alone() {
        let statement = positional("SET @total = @@session.sql_mode, @id = @id2", &["id"]);
        assert_eq!(statement.sql, "SET @total = @@session.sql_mode, ? = @id2");
    }

    #[test]
    fn skips_quoted_text_and_comments() {
        let sql = "INSERT INTO t VALUES ('@a', \"it\\\"s @a\", `@a`) -- @a\n# @a\n/* @a */ , @a";
        let expected =
            "INSERT INTO t VALUES ('@a', \"it\\\"s @a\", `@a`) -- @a\n# @a\n/* @a */ , ?";
        let statement = positional(sql, &["a"]);
        assert_eq!(statement.sql, expected);
        assert_eq!(statement.values.len(), 1);
    }

    #[test]
    fn doubled_quotes_stay_inside_the_literal() {
        let statement = positional("SELECT 'it''s @a', @a", &["@a"]);
        assert_eq!(statement.sql, "SELECT 'it''s @a', ?");
    }

    #[test]
    fn unterminated_literal_is_copied_verbatim() {
        let statement = positional("SELECT @a, 'open @a", &["a"]);
        assert_eq!(statement.sql, "SELECT ?, 'open @a");
    }

    #[test]
    fn assignment_operator_is_not_a_placeholder() {
        let statement = positional("SET @n := @a", &["a"]);
        assert_eq!(statement.sql, "SET @n := ?");
    }

    #[test]
    fn unreferenced_bindings_are_dropped() {
        let statement = positional("DELETE FROM t", &["@id"]);
        assert_eq!(statement.sql, "DELETE FROM t");
        assert!(statement.values.is_empty());
        assert_eq!(statement.unused, vec!["@id".to_string()]);
    }

    #[test]
    fn converts_dates_to_mysql_values() {
        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(13, 45, 7, 250)
            .unwrap();
        assert_eq!(
            to_mysql_value(&SqlValue::DateTime(dt)).unwrap(),
            Value::Date(2024, 2, 29, 13, 45, 7, 250)
        );
        assert_eq!(to_mysql_value(&SqlValue::Bool(true)).unwrap(), Value::Int(1));
        assert_eq!(
            to_mysql_value(&SqlValue::Text("x".into())).unwrap(),
            Value::Bytes(b"x".to_vec())
        );
    }

    #[test]
    fn out_of_range_dates_are_rejected() {
        let too_late = NaiveDate::from_ymd_opt(10_000, 1, 1).unwrap();
        let negative = NaiveDate::from_ymd_opt(-5, 1, 1).unwrap();
        assert!(to_mysql_value(&SqlValue::Date(too_late)).is_err());
        assert!(to_mysql_value(&SqlValue::Date(negative)).is_err());

        let leap_second = NaiveDate::from_ymd_opt(2016, 12, 31)
            .unwrap()
            .and_hms_nano_opt(23, 59, 59, 1_500_000_000)
            .unwrap();
        let err = to_mysql_value(&SqlValue::DateTime(leap_second)).unwrap_err();
        assert!(err.to_string().contains("Leap second"));
    }

    #[test]
    fn bad_value_fails_the_whole_statement() {
        let command = PreparedCommand::with_bindings(
            "INSERT INTO t (d) VALUES (@d)",
            [("@d", NaiveDate::from_ymd_opt(10_000, 1, 1).unwrap())],
        )
        .unwrap();
        assert!(PositionalStatement::from_command(&command).is_err());
    }

    #[test]
    fn rejects_non_numeric_port() {
        let profile = ConnectionProfile::new("u", "p", "db", "localhost", "mysql");
        let err = MySqlAdapter::new(&profile, &HandlerOptions::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("Invalid MySQL port"));
    }

    #[test]
    fn fresh_adapter_is_closed() {
        let profile = ConnectionProfile::local("u", "p", "db");
        let adapter = MySqlAdapter::new(&profile, &HandlerOptions::default()).unwrap();
        assert_eq!(adapter.state(), ConnectionState::Closed);
    }
}
