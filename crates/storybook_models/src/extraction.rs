//! Pulling JSON out of model text.
//!
//! Providers that honour `response_format` return bare JSON, but some wrap
//! it in a markdown fence or prepend a sentence. Extraction tries a fenced
//! block first, then the first balanced object or array.

use storybook_error::{OracleError, OracleErrorKind};

/// Extract a JSON document from a model reply.
///
/// # Errors
///
/// Returns a deserialization error if no JSON object or array is present.
///
/// # Examples
///
/// ```
/// use storybook_models::extract_json;
///
/// let reply = "Here is the bible:\n```json\n{\"characters\": []}\n```";
/// assert_eq!(extract_json(reply).unwrap(), "{\"characters\": []}");
///
/// let reply = "Sure! {\"action\": \"edit\"} Hope that helps.";
/// assert_eq!(extract_json(reply).unwrap(), "{\"action\": \"edit\"}");
/// ```
pub fn extract_json(response: &str) -> Result<String, OracleError> {
    let trimmed = response.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
            return Ok(trimmed.to_string());
        }
    }

    if let Some(json) = from_code_block(response) {
        return Ok(json);
    }

    let object = response.find('{');
    let array = response.find('[');
    let found = match (object, array) {
        (Some(o), Some(a)) if a < o => {
            balanced(response, '[', ']').or_else(|| balanced(response, '{', '}'))
        }
        (None, Some(_)) => balanced(response, '[', ']'),
        _ => balanced(response, '{', '}').or_else(|| balanced(response, '[', ']')),
    };

    found.ok_or_else(|| {
        tracing::error!(response_length = response.len(), "No JSON found in model reply");
        OracleError::new(OracleErrorKind::Deserialization(format!(
            "no JSON found in reply of length {}",
            response.len()
        )))
    })
}

fn from_code_block(response: &str) -> Option<String> {
    let start = response.find("```")?;
    let after_fence = start + 3;
    // Skip an optional language tag on the fence line.
    let content_start = response[after_fence..]
        .find('\n')
        .map(|n| after_fence + n + 1)
        .unwrap_or(after_fence);
    let content = match response[content_start..].find("```") {
        Some(end) => &response[content_start..content_start + end],
        // Unterminated fence: the reply was probably truncated.
        None => &response[content_start..],
    };
    let content = content.trim();
    if content.starts_with('{') || content.starts_with('[') {
        Some(content.to_string())
    } else {
        None
    }
}

fn balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(response[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
