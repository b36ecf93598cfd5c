//! Pulling JSON payloads out of free-form model responses

/// Strip a surrounding markdown code fence, including its info string.
pub(crate) fn strip_markdown_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches("json"),
    };
    match body.rfind("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Span of the object or array that opens at the first char of `text`.
/// Brackets inside string literals are ignored.
fn balanced_span(text: &str) -> Option<&str> {
    let open = text.chars().next()?;
    let close = match open {
        '{' => '}',
        '[' => ']',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// First well-formed JSON object or array in a model response.
///
/// Models wrap their answer in fences, lead with prose, and mention table
/// references like `[acme.sales.orders]` before the payload. Each `{` or `[`
/// is tried in order and the first balanced span that parses wins.
pub(crate) fn extract_json(response: &str) -> Option<&str> {
    let content = strip_markdown_fences(response);
    content
        .match_indices(['{', '['])
        .filter_map(|(start, _)| balanced_span(&content[start..]))
        .find(|span| serde_json::from_str::<serde_json::Value>(span).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_after_table_reference() {
        let response = "Looking at [acme.sales.orders] against the step columns:\n\
            {\"is_good_fit\": true, \"reasoning\": \"has order_id and amount\"}\n\
            Let me know if you need more detail.";
        assert_eq!(
            extract_json(response),
            Some(r#"{"is_good_fit": true, "reasoning": "has order_id and amount"}"#)
        );
    }

    #[test]
    fn test_verdict_reasoning_with_brackets_and_quotes() {
        let response = r#"{"is_good_fit": false, "reasoning": "only [store_id] present, no \"sku\" {column}"}"#;
        assert_eq!(extract_json(response), Some(response));
    }

    #[test]
    fn test_search_plan_behind_chatty_fence() {
        let response = "Sure! Here is the plan:\n```json\n{\"search_plan\": [{\"conceptual_group\": \"Sales\", \
            \"search_query\": \"daily store sales\", \"target_columns\": [\"revenue\"]}]}\n```\nHope this helps!";
        let json = extract_json(response).unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["search_plan"][0]["conceptual_group"], "Sales");
    }

    #[test]
    fn test_fence_without_newline() {
        assert_eq!(
            strip_markdown_fences("```json{\"search_plan\": []}```"),
            "{\"search_plan\": []}"
        );
        assert_eq!(strip_markdown_fences("  plain text  "), "plain text");
    }

    #[test]
    fn test_multibyte_text_before_and_inside_payload() {
        let response = "Résumé → {\"is_good_fit\": true, \"reasoning\": \"covers né and données\"}";
        assert_eq!(
            extract_json(response),
            Some("{\"is_good_fit\": true, \"reasoning\": \"covers né and données\"}")
        );
    }

    #[test]
    fn test_prose_only_response() {
        let response = "I found [acme.sales.orders] and {various tables} in the catalog.";
        assert_eq!(extract_json(response), None);
    }

    #[test]
    fn test_truncated_payload() {
        let response = "{\"search_plan\": [{\"conceptual_group\": \"Sales\"";
        assert_eq!(extract_json(response), None);
    }
}
