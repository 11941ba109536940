//! Query-string construction for resource calls.
//!
//! InoCore expects PHP-style indexed parameters: a list of filters becomes
//! `filter[0][field]=x&filter[0][op]=eq`. Parameter values are an explicit
//! tagged union so the shapes the API understands are spelled out at the
//! call site.
//!
//! Top-level mapping values have no rendering yet and are skipped; the shape
//! is kept so callers can pass them without failing.

use std::fmt;

use serde_json::Value;
use tracing::debug;

/// A single rendered value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Scalar::Str(s.clone())),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Some(Scalar::Int(i)),
                // u64 above i64::MAX keeps its exact digits
                (None, _) if n.is_u64() => Some(Scalar::Str(n.to_string())),
                (None, Some(f)) => Some(Scalar::Float(f)),
                (None, None) => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => f.write_str(s),
            Scalar::Int(i) => write!(f, "{i}"),
            // Whole floats keep a decimal so `1.0` stays distinct from `1`.
            Scalar::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// One element of a list-valued parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryItem {
    /// Rendered as `name[i]=value`.
    Scalar(Scalar),
    /// Rendered as `name[i][key]=value` for each pair, in order.
    Map(Vec<(String, Scalar)>),
}

/// The value of one named query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Scalar(Scalar),
    List(Vec<QueryItem>),
    /// Accepted but never rendered.
    Map(Vec<(String, Scalar)>),
}

impl QueryValue {
    /// Converts a JSON value; `null` yields `None`. Elements of a list that
    /// are neither scalars nor objects are dropped, as are non-scalar values
    /// inside those objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Array(items) => Some(QueryValue::List(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => Some(QueryItem::Map(pairs_from_json(map))),
                        other => Scalar::from_json(other).map(QueryItem::Scalar),
                    })
                    .collect(),
            )),
            Value::Object(map) => Some(QueryValue::Map(pairs_from_json(map))),
            other => Scalar::from_json(other).map(QueryValue::Scalar),
        }
    }
}

fn pairs_from_json(map: &serde_json::Map<String, Value>) -> Vec<(String, Scalar)> {
    map.iter()
        .filter_map(|(k, v)| Scalar::from_json(v).map(|s| (k.clone(), s)))
        .collect()
}

/// Ordered query parameters.
///
/// ```
/// use inocore_connect::QueryParams;
///
/// let params = QueryParams::new()
///     .list("status", ["a", "b"])
///     .scalar("limit", 10);
/// assert_eq!(
///     inocore_connect::build_query_string(&params),
///     "?status[0]=a&status[1]=b&limit=10"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, name: impl Into<String>, value: QueryValue) -> Self {
        self.entries.push((name.into(), value));
        self
    }

    pub fn scalar(self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.push(name, QueryValue::Scalar(value.into()))
    }

    pub fn list<I, S>(self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        let items = values
            .into_iter()
            .map(|v| QueryItem::Scalar(v.into()))
            .collect();
        self.push(name, QueryValue::List(items))
    }

    /// A list of mappings, such as filter definitions.
    pub fn records<I, R, K, S>(self, name: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Scalar>,
    {
        let items = records
            .into_iter()
            .map(|r| QueryItem::Map(r.into_iter().map(|(k, v)| (k.into(), v.into())).collect()))
            .collect();
        self.push(name, QueryValue::List(items))
    }

    /// Builds parameters from a JSON object, keeping its key order. Returns
    /// `None` for anything that is not an object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let entries = map
            .iter()
            .filter_map(|(k, v)| QueryValue::from_json(v).map(|qv| (k.clone(), qv)))
            .collect();
        Some(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Renders `params` as `?a=1&b[0]=x...`, or an empty string when nothing
/// renders. The result is not percent-encoded.
pub fn build_query_string(params: &QueryParams) -> String {
    let mut pairs = Vec::new();

    for (name, value) in params.iter() {
        match value {
            QueryValue::Scalar(s) => pairs.push(format!("{name}={s}")),
            QueryValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    match item {
                        QueryItem::Scalar(s) => pairs.push(format!("{name}[{i}]={s}")),
                        QueryItem::Map(fields) => {
                            for (key, s) in fields {
                                pairs.push(format!("{name}[{i}][{key}]={s}"));
                            }
                        }
                    }
                }
            }
            QueryValue::Map(_) => {
                debug!(param = %name, "skipping mapping-valued query parameter");
            }
        }
    }

    if pairs.is_empty() {
        return String::new();
    }
    format!("?{}", pairs.join("&"))
}
