use chrono::NaiveDateTime;

use crate::form::UNKNOWN_PRODUCT;
use crate::ScriptType;

pub const FILE_NAME_PREFIX: &str = "AI生成_";
pub const MAX_PRODUCT_PREFIX_CHARS: usize = 10;
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Target artifact name: `AI生成_{clean prefix}_{YYYYMMDD_HHMMSS}.{md|xlsx}`.
pub fn target_file_name(product_name: &str, script_type: ScriptType, now: NaiveDateTime) -> String {
    let name = if product_name.trim().is_empty() {
        UNKNOWN_PRODUCT
    } else {
        product_name
    };
    format!(
        "{FILE_NAME_PREFIX}{}_{}.{}",
        sanitize_product_prefix(name),
        now.format(TIMESTAMP_FORMAT),
        script_type.artifact_extension()
    )
}

/// First ten characters with forbidden characters and commas mapped to `_`
/// one-for-one and every whitespace run collapsed into a single `_`.
pub fn sanitize_product_prefix(product_name: &str) -> String {
    let mut cleaned = String::with_capacity(product_name.len());
    let mut in_whitespace = false;
    for c in product_name.chars().take(MAX_PRODUCT_PREFIX_CHARS) {
        if c.is_whitespace() {
            if !in_whitespace {
                cleaned.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        cleaned.push(if is_replaced(c) { '_' } else { c });
    }
    cleaned
}

fn is_replaced(c: char) -> bool {
    matches!(
        c,
        '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | ',' | '，'
    )
}
