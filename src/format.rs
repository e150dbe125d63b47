use serde_json::Value;

/// Renders `n` with its English ordinal suffix: 1st, 2nd, 3rd, 4th, with the
/// 11/12/13 exception (11th, 12th, 13th, 111th).
pub(crate) fn ordinal_of(n: usize) -> String {
    let ones = n % 10;
    let tens = n % 100;

    if ones == 1 && tens != 11 {
        return format!("{n}st");
    }
    if ones == 2 && tens != 12 {
        return format!("{n}nd");
    }
    if ones == 3 && tens != 13 {
        return format!("{n}rd");
    }
    format!("{n}th")
}

fn safe_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<unserializable>".to_owned())
}

/// Appends an enumerated dump of every recorded call to a base failure
/// message, plus the total call count.
pub(crate) fn format_calls(name: &str, calls: &[Value], base: String) -> String {
    let mut msg = base;

    if !calls.is_empty() {
        msg.push_str("\n\nReceived: \n\n");
        let rendered: Vec<String> = calls
            .iter()
            .enumerate()
            .map(|(i, call)| {
                let mut entry = format!("  {} {} call:\n\n", ordinal_of(i + 1), name);
                for line in safe_json(call).split('\n') {
                    entry.push_str("    ");
                    entry.push_str(line);
                }
                entry.push('\n');
                entry
            })
            .collect();
        msg.push_str(&rendered.join("\n"));
    }

    msg.push_str(&format!("\n\nNumber of calls: {}\n", calls.len()));
    msg
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ordinal_suffixes() {
        assert_eq!(ordinal_of(1), "1st");
        assert_eq!(ordinal_of(2), "2nd");
        assert_eq!(ordinal_of(3), "3rd");
        assert_eq!(ordinal_of(4), "4th");
        assert_eq!(ordinal_of(10), "10th");
        assert_eq!(ordinal_of(21), "21st");
        assert_eq!(ordinal_of(42), "42nd");
        assert_eq!(ordinal_of(103), "103rd");
    }

    #[test]
    fn test_ordinal_teens_exception() {
        assert_eq!(ordinal_of(11), "11th");
        assert_eq!(ordinal_of(12), "12th");
        assert_eq!(ordinal_of(13), "13th");
        assert_eq!(ordinal_of(111), "111th");
        assert_eq!(ordinal_of(112), "112th");
        assert_eq!(ordinal_of(113), "113th");
    }

    #[test]
    fn test_format_calls_enumerates_every_call() {
        let calls = vec![json!({"a": 1}), json!({"a": 2})];
        let msg = format_calls("/foo", &calls, "Expected /foo".to_owned());
        assert!(msg.starts_with("Expected /foo"));
        assert!(msg.contains("1st /foo call:"));
        assert!(msg.contains("    {\"a\":1}"));
        assert!(msg.contains("2nd /foo call:"));
        assert!(msg.contains("    {\"a\":2}"));
        assert!(msg.ends_with("Number of calls: 2\n"));
    }

    #[test]
    fn test_format_calls_with_no_calls_only_reports_count() {
        let msg = format_calls("/foo", &[], "base".to_owned());
        assert_eq!(msg, "base\n\nNumber of calls: 0\n");
    }
}
