//! Logical proxy request
//!
//! A [`ProxyRequest`] is what a caller posts to the proxy: the upstream route,
//! query and body, plus optional API credentials. Every field is optional on
//! the wire; absent and `null` fields take their defaults.

use crate::error::{RequestError, RequestResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Production origin of Kraken's REST API
pub const KRAKEN_API_URL: &str = "https://api.kraken.com";

/// Method used when a request does not name one
pub const DEFAULT_METHOD: &str = "GET";

/// A single query parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write_number(f, n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Integral floats below 1e21 print without a fraction (`1.0` as `1`)
fn write_number(f: &mut fmt::Formatter<'_>, n: &serde_json::Number) -> fmt::Result {
    match n.as_f64() {
        Some(x) if n.is_f64() && x == 0.0 => f.write_str("0"),
        Some(x) if n.is_f64() && x.fract() == 0.0 && x.abs() < 1e21 => write!(f, "{:.0}", x),
        _ => write!(f, "{}", n),
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Scalar {
    /// Non-finite values have no JSON form and become `Null`
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

macro_rules! scalar_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Scalar {
                fn from(n: $t) -> Self {
                    Self::Number(n.into())
                }
            }
        )*
    };
}

scalar_from_int!(i32, i64, u32, u64);

/// Query parameter value: one scalar, or a list encoded as repeated keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    One(Scalar),
    Many(Vec<Scalar>),
}

impl QueryValue {
    /// Values in encoding order
    pub fn values(&self) -> &[Scalar] {
        match self {
            Self::One(scalar) => std::slice::from_ref(scalar),
            Self::Many(list) => list,
        }
    }
}

impl From<Scalar> for QueryValue {
    fn from(scalar: Scalar) -> Self {
        Self::One(scalar)
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for QueryValue {
    fn from(list: Vec<T>) -> Self {
        Self::Many(list.into_iter().map(Into::into).collect())
    }
}

macro_rules! query_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for QueryValue {
                fn from(v: $t) -> Self {
                    Self::One(v.into())
                }
            }
        )*
    };
}

query_value_from!(&str, String, bool, f64, i32, i64, u32, u64);

/// Logical request posted to the proxy
///
/// # Example
///
/// ```
/// use kraken_types::ProxyRequest;
///
/// let req = ProxyRequest::from_json(br#"{"path":"/0/public/Time"}"#).unwrap();
/// assert_eq!(req.method(), "GET");
/// assert_eq!(req.environment(), "https://api.kraken.com");
/// ```
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    /// Upstream HTTP method (default `GET`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Upstream route, e.g. `/0/public/OHLC`
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub query: BTreeMap<String, QueryValue>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub body: Map<String, Value>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub public_key: String,

    /// Base64-encoded API secret
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub private_key: String,

    /// Upstream origin (default [`KRAKEN_API_URL`])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ProxyRequest {
    /// Create a request for the given method and path
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            path: path.into(),
            ..Self::default()
        }
    }

    /// GET request to a public endpoint
    pub fn public(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// POST request to a private endpoint
    ///
    /// Attach keys with [`with_credentials`](Self::with_credentials).
    pub fn private(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// Ticker for one or more pairs (e.g. `["XXBTZUSD", "XETHZUSD"]`)
    pub fn ticker(pairs: &[&str]) -> Self {
        Self::public("/0/public/Ticker").with_query("pair", pairs.join(","))
    }

    /// OHLC candles for a pair at the given interval in minutes
    pub fn ohlc(pair: &str, interval: u32) -> Self {
        Self::public("/0/public/OHLC")
            .with_query("pair", pair)
            .with_query("interval", interval)
    }

    /// Parse the raw body of an inbound proxy call
    ///
    /// The top level must be a JSON object. Unknown fields are ignored.
    pub fn from_json(bytes: &[u8]) -> RequestResult<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(RequestError::InvalidJson)?;
        if !value.is_object() {
            return Err(RequestError::NotAnObject(json_kind(&value)));
        }
        serde_json::from_value(value).map_err(RequestError::InvalidField)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    pub fn with_credentials(
        mut self,
        public_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        self.public_key = public_key.into();
        self.private_key = private_key.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Upstream method, falling back to [`DEFAULT_METHOD`]
    pub fn method(&self) -> &str {
        match self.method.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ => DEFAULT_METHOD,
        }
    }

    /// Upstream origin, falling back to `default` when absent or empty
    pub fn environment_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.environment.as_deref() {
            Some(env) if !env.is_empty() => env,
            _ => default,
        }
    }

    /// Upstream origin, falling back to [`KRAKEN_API_URL`]
    pub fn environment(&self) -> &str {
        self.environment_or(KRAKEN_API_URL)
    }

    /// Whether a nonce must be injected into the body
    pub fn has_public_key(&self) -> bool {
        !self.public_key.is_empty()
    }

    /// Whether the request carries both keys and will be signed
    pub fn is_signed(&self) -> bool {
        self.has_public_key() && !self.private_key.is_empty()
    }
}

impl fmt::Debug for ProxyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let private_key = if self.private_key.is_empty() { "" } else { "[REDACTED]" };
        f.debug_struct("ProxyRequest")
            .field("method", &self.method())
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("public_key", &self.public_key)
            .field("private_key", &private_key)
            .field("environment", &self.environment)
            .finish()
    }
}
