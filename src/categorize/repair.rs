//! Best-effort repair of almost-JSON model output.
//!
//! This is a heuristic, not a recovering parser. The rewrites below are applied
//! blindly to the whole text, including the inside of string values, and can
//! damage input that was already valid. Its only job is to salvage a
//! categorization pass that failed on a formatting slip.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

struct Rewrite {
    name: &'static str,
    pattern: &'static str,
    replacement: &'static str,
}

const REWRITES: &[Rewrite] = &[
    Rewrite {
        name: "comma between objects",
        pattern: r"\}\s*\n\s*\{",
        replacement: "}, {",
    },
    Rewrite {
        name: "comma between strings",
        // whitespace required, so `""` survives; adjacent `"a""b"` gets no comma
        pattern: r#""\s+""#,
        replacement: r#"", ""#,
    },
    Rewrite {
        name: "trailing comma in array",
        pattern: r",\s*\]",
        replacement: "]",
    },
    Rewrite {
        name: "trailing comma in object",
        pattern: r",\s*\}",
        replacement: "}",
    },
    Rewrite {
        name: "quote bare keys",
        pattern: r"([{,]\s*)([a-zA-Z0-9_]+)(\s*:)",
        replacement: r#"${1}"${2}"${3}"#,
    },
];

/// A `{"name": "...", "repositories": [...]}` block, allowing one level of
/// nested brackets inside the array.
const CATEGORY_BLOCK: &str =
    r#"\{\s*"name":\s*"[^"]+",\s*"repositories":\s*\[(?:[^\[\]]|\[[^\[\]]*\])*\]\s*\}"#;

fn compiled_rewrites() -> &'static [(&'static str, Regex, &'static str)] {
    static RE: OnceLock<Vec<(&'static str, Regex, &'static str)>> = OnceLock::new();
    RE.get_or_init(|| {
        REWRITES
            .iter()
            .map(|r| (r.name, Regex::new(r.pattern).unwrap(), r.replacement))
            .collect()
    })
}

fn category_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CATEGORY_BLOCK).unwrap())
}

/// Try to turn `input` into parseable JSON.
///
/// Returns the rewritten text if it parses. If it doesn't, returns a synthetic
/// `{"categories": [...]}` envelope around every well-formed category block
/// found in the original input (not re-validated). Returns `None` when neither
/// works.
pub fn repair_json(input: &str) -> Option<String> {
    info!("Attempting to repair malformed JSON...");

    let repaired = apply_rewrites(input);
    match serde_json::from_str::<serde_json::Value>(&repaired) {
        Ok(_) => {
            info!("JSON successfully repaired");
            return Some(repaired);
        }
        Err(e) => warn!("Repair attempt failed: {}", e),
    }

    salvage_categories(input)
}

/// Wrap every well-formed category block in `input` in a fresh
/// `{"categories": [...]}` envelope, or `None` if there are none.
pub fn salvage_categories(input: &str) -> Option<String> {
    info!("Trying to extract valid categories...");
    let blocks = extract_category_blocks(input);
    if blocks.is_empty() {
        warn!("No well-formed category blocks found");
        return None;
    }
    info!("Salvaged {} category block(s)", blocks.len());
    Some(format!("{{\"categories\": [{}]}}", blocks.join(",")))
}

pub fn apply_rewrites(input: &str) -> String {
    let mut text = input.to_string();
    for (name, re, replacement) in compiled_rewrites() {
        let next = re.replace_all(&text, *replacement).into_owned();
        if next != text {
            debug!(rewrite = name, "applied");
        }
        text = next;
    }
    escape_inner_quotes(&text)
}

pub fn extract_category_blocks(input: &str) -> Vec<String> {
    let flat = input.replace('\n', " ");
    category_block_re()
        .find_iter(&flat)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Escape quotes that look like they sit inside a string value: an unescaped
/// `"` that neither opens a string (preceded by `{ [ , :` or start of input)
/// nor closes one (followed by `, } ] :` or end of input).
fn escape_inner_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '"' && !is_escaped(&chars, i) && is_inner_quote(&chars, i) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn is_escaped(chars: &[char], i: usize) -> bool {
    let backslashes = chars[..i].iter().rev().take_while(|c| **c == '\\').count();
    backslashes % 2 == 1
}

fn is_inner_quote(chars: &[char], i: usize) -> bool {
    let prev = chars[..i].iter().rev().find(|c| !c.is_whitespace()).copied();
    let next = chars[i + 1..].iter().find(|c| !c.is_whitespace()).copied();
    let opens = matches!(prev, None | Some('{' | '[' | ',' | ':'));
    let closes = matches!(next, None | Some(',' | '}' | ']' | ':'));
    !opens && !closes
}
