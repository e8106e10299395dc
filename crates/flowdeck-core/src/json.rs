//! Decoding JSON out of free-form model output
//!
//! Models wrap JSON in prose, Markdown fences, or cut it off mid-object.
//! [`decode`] tries these candidates in order and returns the first one that
//! both parses and matches the target type:
//!
//! 1. the trimmed response
//! 2. the body of the first fenced code block
//! 3. the first balanced object/array (string and escape aware)
//! 4. the region from the first opening bracket to the last matching closer
//!
//! When nothing matches, the most specific failure wins: a schema mismatch,
//! then truncation, then "not found".

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonError {
    #[error("no JSON object or array found in response")]
    NotFound,

    #[error("response JSON is truncated")]
    Truncated,

    #[error("response JSON does not match the expected shape: {0}")]
    Schema(String),
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"```[A-Za-z]*[ \t]*\r?\n?([\s\S]*?)```").expect("valid regex")
    })
}

/// Substring from the first `{` to the last `}`, or from the first `[` to the
/// last `]` when the `[` comes first
pub fn extract_json_region(text: &str) -> Option<&str> {
    let (start, closer) = match (text.find('{'), text.find('[')) {
        (Some(obj), Some(arr)) if arr < obj => (arr, ']'),
        (Some(obj), _) => (obj, '}'),
        (None, Some(arr)) => (arr, ']'),
        (None, None) => return None,
    };
    let end = text.rfind(closer)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Body of the first fenced code block, if any
pub fn strip_code_fences(text: &str) -> Option<&str> {
    fence_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Outcome of scanning for the first balanced object/array
#[derive(Debug, PartialEq, Eq)]
enum Scan<'a> {
    Found(&'a str),
    Truncated,
    Missing,
}

fn balanced_region(text: &str) -> Scan<'_> {
    let Some(start) = text.find(['{', '[']) else {
        return Scan::Missing;
    };

    let mut closers: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => closers.push(b'}'),
            b'[' => closers.push(b']'),
            b'}' | b']' => {
                if closers.pop() != Some(*byte) {
                    return Scan::Missing;
                }
                if closers.is_empty() {
                    return Scan::Found(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    Scan::Truncated
}

/// Decode the first JSON value in `text` that matches `T`
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, JsonError> {
    let trimmed = text.trim();
    let fenced = strip_code_fences(trimmed);
    let scan_source = fenced.unwrap_or(trimmed);

    let mut truncated = false;
    let mut candidates: Vec<&str> = vec![trimmed];
    if let Some(body) = fenced {
        candidates.push(body);
    }
    match balanced_region(scan_source) {
        Scan::Found(region) => candidates.push(region),
        Scan::Truncated => truncated = true,
        Scan::Missing => {}
    }
    if let Some(region) = extract_json_region(scan_source) {
        candidates.push(region);
    }

    let mut schema_error = None;
    for candidate in candidates {
        match serde_json::from_str::<serde_json::Value>(candidate) {
            Ok(value) => match serde_json::from_value::<T>(value) {
                Ok(decoded) => return Ok(decoded),
                Err(e) => schema_error = Some(e.to_string()),
            },
            Err(e) if e.is_eof() => truncated = true,
            Err(_) => {}
        }
    }

    if let Some(message) = schema_error {
        Err(JsonError::Schema(message))
    } else if truncated {
        Err(JsonError::Truncated)
    } else {
        Err(JsonError::NotFound)
    }
}
