use super::{require_recorder, MatcherContext, Outcome};
use crate::error::AssertionError;
use crate::facets::Facet;
use crate::format::{format_calls, ordinal_of};
use crate::handler::InstrumentedHandler;
use crate::matcher::{check_equality, Expected};
use serde_json::Value;

fn facet_noun(facet: Facet) -> &'static str {
    match facet {
        Facet::Body => "body",
        Facet::JsonBody => "JSON body",
        Facet::Headers => "headers",
        Facet::QueryString => "query string",
        Facet::Hash => "hash",
        Facet::PathParameters => "path parameters",
        Facet::GqlVariables => "GraphQL variables",
        Facet::GqlQuery => "GraphQL query",
        Facet::Requested => "request",
    }
}

fn safe_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<unserializable>".to_owned())
}

/// Single-facet existential comparison: passes iff any recorded value for
/// the facet equals the expectation.
pub fn to_have_been_requested_with_facet(
    ctx: &MatcherContext,
    handler: &dyn InstrumentedHandler,
    facet: Facet,
    expected: &Expected,
) -> Result<Outcome, AssertionError> {
    let recorder = require_recorder(handler, facet)?;
    let calls = recorder.calls();
    let pass = calls.iter().any(|call| check_equality(expected, call));

    let base = format!(
        "Expected {} to{} have been requested with {} {}",
        recorder.name(),
        ctx.polarity(),
        facet_noun(facet),
        expected,
    );
    Ok(Outcome {
        pass,
        message: format_calls(recorder.name(), &calls, base),
    })
}

/// Single-facet nth comparison, 1-based. A position beyond the recorded
/// count is a normal failed match with `null` shown as the actual value.
pub fn to_have_been_nth_requested_with_facet(
    ctx: &MatcherContext,
    handler: &dyn InstrumentedHandler,
    n: usize,
    facet: Facet,
    expected: &Expected,
) -> Result<Outcome, AssertionError> {
    let recorder = require_recorder(handler, facet)?;
    let calls = recorder.calls();
    let actual = recorder.nth(n).unwrap_or(Value::Null);
    let pass = check_equality(expected, &actual);

    let base = format!(
        "Expected {} to{} have been requested the {} time with {} {}, but it was requested with {}",
        recorder.name(),
        ctx.polarity(),
        ordinal_of(n),
        facet_noun(facet),
        expected,
        safe_json(&actual),
    );
    Ok(Outcome {
        pass,
        message: format_calls(recorder.name(), &calls, base),
    })
}
