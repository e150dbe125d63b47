use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A placeholder expected-value that supplies its own comparison predicate
/// instead of a literal value.
///
/// Matchers can appear anywhere inside an [`Expected`] tree, so a single
/// field of an expected object can be checked by predicate while the rest
/// of the object is compared structurally.
pub trait AsymmetricMatcher: fmt::Debug + Send + Sync {
    /// Returns true if the recorded value satisfies this matcher.
    fn matches(&self, actual: &Value) -> bool;

    /// Short human-readable form used in diagnostic messages.
    fn description(&self) -> String;
}

/// An expected value for a facet comparison.
///
/// Plain JSON values compare with full structural equality: arrays must have
/// the same length, objects must have the same key set (extra keys on the
/// recorded side fail the match). The `Array` and `Object` variants exist so
/// asymmetric matchers can be nested inside structured expectations.
#[derive(Debug, Clone)]
pub enum Expected {
    /// A literal JSON value, compared structurally.
    Value(Value),
    /// An asymmetric matcher; comparison is delegated to it.
    Matcher(Arc<dyn AsymmetricMatcher>),
    /// An array whose elements may themselves contain matchers.
    Array(Vec<Expected>),
    /// An object whose field values may themselves contain matchers.
    Object(BTreeMap<String, Expected>),
}

impl Expected {
    /// Builds an object expectation from key/expectation pairs.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Expected)>,
        K: Into<String>,
    {
        Self::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }

    /// Builds an array expectation from element expectations.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Expected>,
    {
        Self::Array(items.into_iter().collect())
    }
}

impl From<Value> for Expected {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Expected {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_owned()))
    }
}

impl From<String> for Expected {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<bool> for Expected {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

impl From<i64> for Expected {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{}", v),
            Self::Matcher(m) => write!(f, "{}", m.description()),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Object(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{:?}:{}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Deep-equality comparison between an expected value and a recorded value.
///
/// Never panics; always returns a boolean. Asymmetric matchers take
/// precedence over structural comparison. Literal values use
/// `serde_json::Value` equality, which already enforces strict null
/// identity, type-mismatch failure, element-wise array comparison and exact
/// key-count object comparison.
pub fn check_equality(expected: &Expected, actual: &Value) -> bool {
    match expected {
        Expected::Matcher(matcher) => matcher.matches(actual),
        Expected::Value(value) => value == actual,
        Expected::Array(items) => match actual {
            Value::Array(actual_items) => {
                items.len() == actual_items.len()
                    && items
                        .iter()
                        .zip(actual_items)
                        .all(|(e, a)| check_equality(e, a))
            }
            _ => false,
        },
        Expected::Object(fields) => match actual {
            Value::Object(actual_fields) => {
                fields.len() == actual_fields.len()
                    && fields.iter().all(|(key, e)| {
                        actual_fields
                            .get(key)
                            .is_some_and(|a| check_equality(e, a))
                    })
            }
            _ => false,
        },
    }
}

#[derive(Debug)]
struct Any;

impl AsymmetricMatcher for Any {
    fn matches(&self, _actual: &Value) -> bool {
        true
    }

    fn description(&self) -> String {
        "any()".to_owned()
    }
}

#[derive(Debug)]
struct StringContaining(String);

impl AsymmetricMatcher for StringContaining {
    fn matches(&self, actual: &Value) -> bool {
        actual.as_str().is_some_and(|s| s.contains(&self.0))
    }

    fn description(&self) -> String {
        format!("string_containing({:?})", self.0)
    }
}

#[derive(Debug)]
struct StringMatching(Regex);

impl AsymmetricMatcher for StringMatching {
    fn matches(&self, actual: &Value) -> bool {
        actual.as_str().is_some_and(|s| self.0.is_match(s))
    }

    fn description(&self) -> String {
        format!("string_matching({:?})", self.0.as_str())
    }
}

#[derive(Debug)]
struct ObjectContaining(BTreeMap<String, Expected>);

impl AsymmetricMatcher for ObjectContaining {
    fn matches(&self, actual: &Value) -> bool {
        let Value::Object(actual_fields) = actual else {
            return false;
        };
        self.0.iter().all(|(key, e)| {
            actual_fields
                .get(key)
                .is_some_and(|a| check_equality(e, a))
        })
    }

    fn description(&self) -> String {
        let fields: Vec<String> = self
            .0
            .iter()
            .map(|(k, v)| format!("{:?}:{}", k, v))
            .collect();
        format!("object_containing({{{}}})", fields.join(","))
    }
}

#[derive(Debug)]
struct ArrayContaining(Vec<Expected>);

impl AsymmetricMatcher for ArrayContaining {
    fn matches(&self, actual: &Value) -> bool {
        let Value::Array(actual_items) = actual else {
            return false;
        };
        self.0.iter().all(|e| {
            actual_items.iter().any(|a| check_equality(e, a))
        })
    }

    fn description(&self) -> String {
        let items: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        format!("array_containing([{}])", items.join(","))
    }
}

/// Matches any recorded value, including `null`.
pub fn any() -> Expected {
    Expected::Matcher(Arc::new(Any))
}

/// Matches a string containing the given substring.
pub fn string_containing<S: Into<String>>(needle: S) -> Expected {
    Expected::Matcher(Arc::new(StringContaining(needle.into())))
}

/// Matches a string matching the given regular expression.
pub fn string_matching(pattern: &str) -> Result<Expected, regex::Error> {
    Ok(Expected::Matcher(Arc::new(StringMatching(Regex::new(
        pattern,
    )?))))
}

/// Matches an object carrying at least the given fields; extra keys on the
/// recorded side are allowed. This is the explicit subset-matching escape
/// hatch from the otherwise exact key-count comparison.
pub fn object_containing<I, K, E>(fields: I) -> Expected
where
    I: IntoIterator<Item = (K, E)>,
    K: Into<String>,
    E: Into<Expected>,
{
    Expected::Matcher(Arc::new(ObjectContaining(
        fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )))
}

/// Matches an array containing at least the given elements, in any order.
pub fn array_containing<I, E>(items: I) -> Expected
where
    I: IntoIterator<Item = E>,
    E: Into<Expected>,
{
    Expected::Matcher(Arc::new(ArrayContaining(
        items.into_iter().map(Into::into).collect(),
    )))
}

pub(crate) fn value_object<I, K>(fields: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    let map: Map<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k.into(), v))
        .collect();
    Value::Object(map)
}
