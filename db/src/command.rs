use anyhow::bail;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::Result;

/// A value bound to a named parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Json(serde_json::Value),
    Uuid(Uuid),
}

macro_rules! impl_from_value {
    ($variant:ident, $target:ty, [$($source:ty),*]) => {
        $(
            impl From<$source> for SqlValue {
                fn from(value: $source) -> Self {
                    SqlValue::$variant(<$target>::from(value))
                }
            }
        )*
    };
}

impl_from_value!(Int, i64, [i8, i16, i32, i64]);
impl_from_value!(UInt, u64, [u8, u16, u32, u64]);
impl_from_value!(Float, f64, [f32, f64]);
impl_from_value!(Text, String, [String, &str]);
impl_from_value!(Bytes, Vec<u8>, [Vec<u8>, &[u8]]);

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::DateTime(value)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        SqlValue::Json(value)
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Uuid(value)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: SqlValue,
}

impl Parameter {
    /// The name without its `@` or `:` marker.
    pub fn bare_name(&self) -> &str {
        bare_name(&self.name)
    }
}

/// SQL text plus its named parameter bindings.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedCommand {
    sql: String,
    parameters: Vec<Parameter>,
}

impl PreparedCommand {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_bindings<N, V, I>(sql: impl Into<String>, bindings: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<SqlValue>,
    {
        let mut command = Self::new(sql);
        for (name, value) in bindings {
            command.bind(name, value)?;
        }
        Ok(command)
    }

    /// Attaches one named parameter. A name may only be bound once.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Result<()> {
        let name = name.into();
        if bare_name(&name).is_empty() {
            bail!("Parameter name `{name}` is empty.");
        }
        if self.parameter(&name).is_some() {
            bail!("Parameter `{name}` has already been defined.");
        }
        self.parameters.push(Parameter {
            name,
            value: value.into(),
        });
        Ok(())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        let wanted = bare_name(name);
        self.parameters
            .iter()
            .find(|parameter| parameter.bare_name() == wanted)
    }

    pub fn is_parameterized(&self) -> bool {
        !self.parameters.is_empty()
    }
}

fn bare_name(name: &str) -> &str {
    name.strip_prefix('@')
        .or_else(|| name.strip_prefix(':'))
        .unwrap_or(name)
}
