//! Response Extractor
//!
//! Pulls the assistant's raw payload out of the provider envelope and
//! normalizes the formatting defects models routinely produce: markdown code
//! fences, trailing commas before closers, doubled quote characters.
//!
//! Total by contract: an envelope without the expected shape yields an empty
//! string, which is the recovery engine's signal to fall through its ladder.

use crate::ai::provider::{ChatEnvelope, OutputMode};

/// Raw record text from an envelope, already cleaned. Never fails.
pub fn extract_raw(envelope: &ChatEnvelope, mode: OutputMode) -> String {
    let raw = match mode {
        OutputMode::Content => envelope
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .unwrap_or(""),
        OutputMode::ToolCall => envelope
            .choices
            .first()
            .and_then(|choice| choice.message.tool_calls.as_ref())
            .and_then(|calls| calls.first())
            .map(|call| call.function.arguments.as_str())
            .unwrap_or(""),
    };

    clean_raw(raw)
}

/// Cleanup pass shared with the recovery ladder: fences, trailing commas,
/// doubled quotes, BOM, surrounding whitespace.
pub fn clean_raw(raw: &str) -> String {
    let s = raw.trim().trim_start_matches('\u{feff}');
    let s = strip_code_fences(s);
    let s = fix_trailing_commas(&s);
    let s = collapse_doubled_quotes(&s);
    s.trim().to_string()
}

/// Strip ```json ... ``` or ``` ... ``` wrapping.
fn strip_code_fences(s: &str) -> String {
    let mut result = s.trim().to_string();

    if result.starts_with("```")
        && let Some(first_newline) = result.find('\n')
    {
        result = result[first_newline + 1..].to_string();
    }

    if result.ends_with("```") {
        result = result[..result.len() - 3].trim_end().to_string();
    }

    result
}

/// Drop commas that sit directly before `]` or `}` (whitespace allowed).
fn fix_trailing_commas(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let chars: Vec<char> = s.chars().collect();

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];

        if ch == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && (chars[j] == ']' || chars[j] == '}') {
                i += 1;
                continue;
            }
        }

        result.push(ch);
        i += 1;
    }

    result
}

/// Collapse runs of repeated `"` to a single quote — the `""cidade""` defect —
/// while leaving legitimate empty strings (`"campo": ""`) untouched.
///
/// A run of exactly two quotes is an empty string when it is preceded by a
/// value position (`:`, `[` or `,`) and followed by a value terminator
/// (`,`, `}` or `]`).
fn collapse_doubled_quotes(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len());
    let mut last_significant: Option<char> = None;

    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '"' {
            if !chars[i].is_whitespace() {
                last_significant = Some(chars[i]);
            }
            result.push(chars[i]);
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == '"' {
            run += 1;
        }

        let next_significant = chars[i + run..].iter().find(|c| !c.is_whitespace()).copied();
        let empty_string_value = run == 2
            && matches!(last_significant, Some(':') | Some('[') | Some(','))
            && matches!(next_significant, Some(',') | Some('}') | Some(']') | None);

        if run == 1 || empty_string_value {
            for _ in 0..run {
                result.push('"');
            }
        } else {
            result.push('"');
        }

        last_significant = Some('"');
        i += run;
    }

    result
}
