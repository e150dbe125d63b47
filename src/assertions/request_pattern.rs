use super::{require_recorder, MatcherContext, Outcome};
use crate::error::AssertionError;
use crate::facets::Facet;
use crate::format::{format_calls, ordinal_of};
use crate::handler::InstrumentedHandler;
use crate::matcher::{check_equality, Expected};
use crate::recorder::CallRecorder;
use serde_json::{Map, Value};
use std::fmt;

/// A multi-facet expected-request descriptor.
///
/// Only facets that were explicitly set participate in the comparison: an
/// unset facet means "don't constrain", never "expect absent". A pattern
/// with no facets set is rejected as a programmer error at evaluation time.
#[derive(Debug, Clone, Default)]
pub struct RequestPattern {
    body: Option<Expected>,
    json_body: Option<Expected>,
    headers: Option<Expected>,
    query_string: Option<Expected>,
    hash: Option<Expected>,
    path_parameters: Option<Expected>,
    gql_variables: Option<Expected>,
    gql_query: Option<Expected>,
}

macro_rules! impl_pattern_setters {
    ($(($fn_name:ident, $field:ident, $doc:literal)),* $(,)?) => {
        $(
            #[doc = $doc]
            #[must_use]
            pub fn $fn_name<E: Into<Expected>>(mut self, expected: E) -> Self {
                self.$field = Some(expected.into());
                self
            }
        )*
    };
}

impl RequestPattern {
    pub fn new() -> Self {
        Self::default()
    }

    impl_pattern_setters!(
        (body, body, "Constrains the raw body text."),
        (json_body, json_body, "Constrains the parsed JSON body."),
        (headers, headers, "Constrains the normalized header map."),
        (query_string, query_string, "Constrains the leading-`?` query string."),
        (hash, hash, "Constrains the leading-`#` fragment."),
        (path_parameters, path_parameters, "Constrains the captured path parameters."),
        (gql_variables, gql_variables, "Constrains the GraphQL variables."),
        (gql_query, gql_query, "Constrains the GraphQL query document."),
    );

    /// The facets this pattern constrains, in canonical facet order.
    pub(crate) fn constraints(&self) -> Vec<(Facet, &Expected)> {
        [
            (Facet::Body, &self.body),
            (Facet::JsonBody, &self.json_body),
            (Facet::Headers, &self.headers),
            (Facet::QueryString, &self.query_string),
            (Facet::Hash, &self.hash),
            (Facet::PathParameters, &self.path_parameters),
            (Facet::GqlVariables, &self.gql_variables),
            (Facet::GqlQuery, &self.gql_query),
        ]
        .into_iter()
        .filter_map(|(facet, slot)| slot.as_ref().map(|e| (facet, e)))
        .collect()
    }
}

impl fmt::Display for RequestPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (facet, expected)) in self.constraints().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{:?}:{}", facet.label(), expected)?;
        }
        write!(f, "}}")
    }
}

struct Constraint<'a> {
    facet: Facet,
    expected: &'a Expected,
    recorder: &'a CallRecorder,
}

fn resolve_constraints<'a>(
    handler: &'a dyn InstrumentedHandler,
    pattern: &'a RequestPattern,
) -> Result<(Vec<Constraint<'a>>, &'a CallRecorder), AssertionError> {
    let constraints = pattern.constraints();
    if constraints.is_empty() {
        return Err(AssertionError::EmptyPattern);
    }
    let requested = require_recorder(handler, Facet::Requested)?;
    let mut resolved = Vec::with_capacity(constraints.len());
    for (facet, expected) in constraints {
        resolved.push(Constraint {
            facet,
            expected,
            recorder: require_recorder(handler, facet)?,
        });
    }
    Ok((resolved, requested))
}

/// The composite view of one recorded call, restricted to the constrained
/// facets. Index alignment across recorders makes this lookup sound.
fn composite_call(constraints: &[Constraint<'_>], n: usize) -> Value {
    let fields: Map<String, Value> = constraints
        .iter()
        .map(|c| {
            (
                c.facet.label().to_owned(),
                c.recorder.nth(n).unwrap_or(Value::Null),
            )
        })
        .collect();
    Value::Object(fields)
}

fn call_matches(constraints: &[Constraint<'_>], n: usize) -> bool {
    constraints
        .iter()
        .all(|c| check_equality(c.expected, &c.recorder.nth(n).unwrap_or(Value::Null)))
}

fn safe_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<unserializable>".to_owned())
}

/// Composite existential comparison: passes iff at least one recorded call
/// satisfies every facet constraint present in the pattern simultaneously.
pub fn to_have_been_requested_with(
    ctx: &MatcherContext,
    handler: &dyn InstrumentedHandler,
    pattern: &RequestPattern,
) -> Result<Outcome, AssertionError> {
    let (constraints, requested) = resolve_constraints(handler, pattern)?;
    let count = requested.len();

    let pass = (1..=count).any(|n| call_matches(&constraints, n));
    let calls: Vec<Value> = (1..=count).map(|n| composite_call(&constraints, n)).collect();

    let base = format!(
        "Expected {} to{} have been requested with request matching {}",
        requested.name(),
        ctx.polarity(),
        pattern,
    );
    Ok(Outcome {
        pass,
        message: format_calls(requested.name(), &calls, base),
    })
}

/// Composite nth comparison, 1-based: passes iff the nth recorded call
/// satisfies every facet constraint present in the pattern. A position
/// beyond the recorded count is a normal failed match.
pub fn to_have_been_nth_requested_with(
    ctx: &MatcherContext,
    handler: &dyn InstrumentedHandler,
    n: usize,
    pattern: &RequestPattern,
) -> Result<Outcome, AssertionError> {
    let (constraints, requested) = resolve_constraints(handler, pattern)?;
    let count = requested.len();

    let in_range = n >= 1 && n <= count;
    let pass = in_range && call_matches(&constraints, n);
    let actual = composite_call(&constraints, n);
    let calls: Vec<Value> = (1..=count).map(|i| composite_call(&constraints, i)).collect();

    let base = format!(
        "Expected {} to{} have been requested the {} time with request matching {}, \
         but it was requested with {}",
        requested.name(),
        ctx.polarity(),
        ordinal_of(n),
        pattern,
        safe_json(&actual),
    );
    Ok(Outcome {
        pass,
        message: format_calls(requested.name(), &calls, base),
    })
}
