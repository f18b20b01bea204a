use std::fmt;
use std::str::FromStr;

/// The three script templates offered by the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScriptType {
    SingleProduct,
    GuestInteraction,
    SellingPoint,
}

impl ScriptType {
    pub const ALL: [ScriptType; 3] = [
        ScriptType::SingleProduct,
        ScriptType::GuestInteraction,
        ScriptType::SellingPoint,
    ];

    /// Label sent to the generation service as `script_type`.
    pub fn wire_label(self) -> &'static str {
        match self {
            ScriptType::SingleProduct => "单人推品",
            ScriptType::GuestInteraction => "嘉宾互动",
            ScriptType::SellingPoint => "商品卖点",
        }
    }

    pub fn cli_name(self) -> &'static str {
        match self {
            ScriptType::SingleProduct => "single-product",
            ScriptType::GuestInteraction => "guest-interaction",
            ScriptType::SellingPoint => "selling-point",
        }
    }

    pub fn artifact_extension(self) -> &'static str {
        match self {
            ScriptType::SellingPoint => "md",
            ScriptType::SingleProduct | ScriptType::GuestInteraction => "xlsx",
        }
    }

    /// Request field carrying the target file name.
    pub fn file_name_field(self) -> &'static str {
        match self {
            ScriptType::SellingPoint => "markdown_file_name",
            ScriptType::SingleProduct | ScriptType::GuestInteraction => "excel_file_name",
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownScriptType(pub String);

impl fmt::Display for UnknownScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown script type '{}' (expected single-product, guest-interaction or selling-point)",
            self.0
        )
    }
}

impl std::error::Error for UnknownScriptType {}

impl FromStr for ScriptType {
    type Err = UnknownScriptType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ScriptType::ALL
            .into_iter()
            .find(|t| t.cli_name().eq_ignore_ascii_case(needle) || t.wire_label() == needle)
            .ok_or_else(|| UnknownScriptType(needle.to_string()))
    }
}
