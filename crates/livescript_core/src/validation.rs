use std::fmt;

use crate::form::{is_blank, FormDraft, ANCHOR_NAME, GUESTS, LIVE_TIME, RETAIL_PRICE};
use crate::ScriptType;

/// Why a draft cannot be submitted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NoProducts,
    /// 1-based index of the first product missing id, name or price.
    IncompleteProduct { index: usize },
    MissingField(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NoProducts => write!(f, "at least one product is required"),
            ValidationError::IncompleteProduct { index } => {
                write!(f, "product {index} needs an id, a name and a price")
            }
            ValidationError::MissingField(name) => write!(f, "required field '{name}' is empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Fields that must be non-blank for the given script type, besides products.
pub fn required_fields(script_type: ScriptType) -> &'static [&'static str] {
    match script_type {
        ScriptType::SingleProduct => &[LIVE_TIME, ANCHOR_NAME],
        ScriptType::GuestInteraction => &[LIVE_TIME, ANCHOR_NAME, GUESTS],
        ScriptType::SellingPoint => &[RETAIL_PRICE],
    }
}

/// Check a draft against the required-field policy of its script type.
pub fn validate(script_type: ScriptType, draft: &FormDraft) -> Result<(), ValidationError> {
    if draft.products.is_empty() {
        return Err(ValidationError::NoProducts);
    }
    if let Some(position) = draft.products.iter().position(|p| !p.is_complete()) {
        return Err(ValidationError::IncompleteProduct {
            index: position + 1,
        });
    }
    match required_fields(script_type)
        .iter()
        .find(|name| is_blank(draft.field(name)))
    {
        Some(name) => Err(ValidationError::MissingField(*name)),
        None => Ok(()),
    }
}

pub fn is_valid(script_type: ScriptType, draft: &FormDraft) -> bool {
    validate(script_type, draft).is_ok()
}
