//! JSON decoding with readable failure messages.

use anyhow::Result;

/// Attempt to parse JSON and, on failure, include a contextual snippet of the
/// line where the error occurred along with the serde path and type mismatch.
pub fn parse_json_with_context<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let jd = &mut serde_json::Deserializer::from_str(body);
    match serde_path_to_error::deserialize(jd) {
        Ok(value) => Ok(value),
        Err(err) => {
            let inner_err = err.inner();
            let (line, column) = (inner_err.line(), inner_err.column());
            let path = err.path().to_string();

            let msg = inner_err.to_string();
            let loc = format!(" at line {line} column {column}");
            let msg_without_loc = msg.strip_suffix(&loc).unwrap_or(&msg);

            let type_info = parse_type_mismatch(msg_without_loc);
            let snippet = build_error_snippet(body, line, column, 20);

            let mut final_err = String::new();
            if !path.is_empty() && path != "." {
                final_err.push_str(&format!("at path '{path}': "));
            }
            final_err.push_str(&format!("{type_info} (line {line} col {column})\n{snippet}"));

            Err(anyhow::anyhow!(final_err))
        }
    }
}

/// Turn "invalid type: X, expected Y" into "expected Y, got X".
///
/// Falls back to the original message when it has a different shape.
fn parse_type_mismatch(error_msg: &str) -> String {
    if let Some(invalid_start) = error_msg.find("invalid type: ") {
        let after_prefix = &error_msg[invalid_start + "invalid type: ".len()..];

        if let Some(comma_pos) = after_prefix.find(", expected ") {
            let actual_type = &after_prefix[..comma_pos];
            let expected_part = &after_prefix[comma_pos + ", expected ".len()..];
            let expected_type = expected_part
                .split(" at line ")
                .next()
                .unwrap_or(expected_part)
                .trim();

            return format!("expected {expected_type}, got {actual_type}");
        }
    }

    if error_msg.starts_with("expected ")
        && let Some(expected_part) = error_msg.split(" at line ").next()
    {
        return expected_part.to_string();
    }

    error_msg.to_string()
}

/// Show up to `context_len` chars around the error column with a caret under it.
///
/// Works in chars, not bytes: cached rows can hold arbitrary text and slicing
/// mid-codepoint would panic.
fn build_error_snippet(body: &str, line: usize, column: usize, context_len: usize) -> String {
    let target_line: Vec<char> = body
        .lines()
        .nth(line.saturating_sub(1))
        .unwrap_or("")
        .chars()
        .collect();
    if target_line.is_empty() {
        return "(empty line)".to_string();
    }

    // column is 1-based
    let error_idx = column.saturating_sub(1).min(target_line.len());

    let half_len = context_len / 2;
    let start = error_idx.saturating_sub(half_len);
    let end = (error_idx + half_len).min(target_line.len());

    let slice: String = target_line[start..end].iter().collect();
    let indicator = " ".repeat(error_idx - start) + "^";

    format!("...{slice}...\n   {indicator}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_parse_type_mismatch_invalid_type() {
        let msg = "invalid type: null, expected a string at line 45 column 29";
        assert_eq!(parse_type_mismatch(msg), "expected a string, got null");
    }

    #[test]
    fn test_parse_type_mismatch_expected() {
        let msg = "expected value at line 1 column 1";
        assert_eq!(parse_type_mismatch(msg), "expected value");
    }

    #[test]
    fn test_parse_json_with_context_null_value() {
        #[derive(Debug, Deserialize)]
        struct Entry {
            #[allow(dead_code)]
            values: Vec<String>,
        }

        let result: Result<Entry> = parse_json_with_context(r#"{"values": null}"#);
        let err_msg = result.unwrap_err().to_string();

        assert!(err_msg.contains("values"));
        assert!(err_msg.contains("expected"));
        assert!(err_msg.contains("got"));
    }

    #[test]
    fn test_nested_path_in_option_list() {
        #[derive(Debug, Deserialize)]
        struct Venue {
            #[allow(dead_code)]
            id: u64,
            #[allow(dead_code)]
            name: String,
        }

        let json = r#"[
            {"id": 1, "name": "Mercury Lounge"},
            {"id": 2, "name": null}
        ]"#;

        let err_msg = parse_json_with_context::<Vec<Venue>>(json)
            .unwrap_err()
            .to_string();
        assert!(err_msg.contains("[1].name"));
        assert!(err_msg.contains("expected") && err_msg.contains("got"));
    }

    #[test]
    fn test_snippet_is_char_boundary_safe() {
        // Multi-byte chars before and after the failure point.
        let body = "{\"values\": [\"ééééééééééééé\", ñññ]}";
        let result: Result<Vec<String>> = parse_json_with_context(body);
        assert!(result.is_err());

        let snippet = build_error_snippet("ééééé", 1, 3, 4);
        assert_eq!(snippet, "...éééé...\n     ^");
    }

    #[test]
    fn test_snippet_empty_line() {
        assert_eq!(build_error_snippet("", 1, 1, 20), "(empty line)");
    }
}
