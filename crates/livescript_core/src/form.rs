use std::collections::BTreeMap;

pub const LIVE_TIME: &str = "live_time";
pub const ANCHOR_NAME: &str = "anchor_name";
pub const GUESTS: &str = "guests";
pub const RETAIL_PRICE: &str = "retail_price";

/// Used for naming the artifact when no product name was entered.
pub const UNKNOWN_PRODUCT: &str = "unknown_product";

const JOIN_SEPARATOR: &str = ";";

/// One row of the product list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductEntry {
    pub product_id: String,
    pub product_name: String,
    pub product_price: String,
    pub product_spec: String,
    pub sellpoint: String,
}

impl ProductEntry {
    pub fn is_complete(&self) -> bool {
        !is_blank(&self.product_id) && !is_blank(&self.product_name) && !is_blank(&self.product_price)
    }

    /// Merge auto-filled product details; empty values leave the entry untouched.
    pub fn apply_product_info(&mut self, info: &ProductInfo) {
        if let Some(name) = non_blank(info.product_name.as_deref()) {
            self.product_name = name.to_string();
        }
        if let Some(price) = non_blank(info.product_price.as_deref()) {
            self.product_price = price.to_string();
        }
        let parts: Vec<&str> = [info.brand_info.as_deref(), info.sellpoint.as_deref()]
            .into_iter()
            .filter_map(non_blank)
            .collect();
        if !parts.is_empty() {
            self.sellpoint = parts.join(JOIN_SEPARATOR);
        }
    }
}

/// Product details returned by the auto-fill lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductInfo {
    pub product_name: Option<String>,
    pub product_price: Option<String>,
    pub brand_info: Option<String>,
    pub sellpoint: Option<String>,
}

/// Per-tab form contents: the product list plus every other named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    pub products: Vec<ProductEntry>,
    pub fields: BTreeMap<String, String>,
}

impl Default for FormDraft {
    /// A fresh form starts with one empty product row.
    fn default() -> Self {
        Self {
            products: vec![ProductEntry::default()],
            fields: BTreeMap::new(),
        }
    }
}

impl FormDraft {
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Product names joined with `;`, blanks dropped.
    pub fn joined_product_names(&self) -> String {
        join_column(&self.products, |p| &p.product_name)
    }

    /// Flatten the draft into the request field map.
    ///
    /// Product columns are joined with `;` (blank cells skipped) and override
    /// any free-form field of the same name.
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut out = self.fields.clone();
        let columns: [(&str, fn(&ProductEntry) -> &String); 5] = [
            ("product_id", |p| &p.product_id),
            ("product_name", |p| &p.product_name),
            ("product_price", |p| &p.product_price),
            ("product_spec", |p| &p.product_spec),
            ("sellpoint", |p| &p.sellpoint),
        ];
        for (name, column) in columns {
            out.insert(name.to_string(), join_column(&self.products, column));
        }
        out
    }
}

fn join_column(products: &[ProductEntry], column: impl Fn(&ProductEntry) -> &String) -> String {
    products
        .iter()
        .map(column)
        .filter(|value| !is_blank(value))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(JOIN_SEPARATOR)
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !is_blank(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: &str, name: &str, price: &str) -> ProductEntry {
        ProductEntry {
            product_id: id.into(),
            product_name: name.into(),
            product_price: price.into(),
            ..ProductEntry::default()
        }
    }

    #[test]
    fn flatten_joins_columns_and_skips_blanks() {
        let mut draft = FormDraft {
            products: vec![entry("1", "苹果", "9.9"), entry("2", " ", "19.9")],
            fields: BTreeMap::new(),
        };
        draft.set_field(ANCHOR_NAME, "小王");

        let flat = draft.flatten();
        assert_eq!(flat["product_id"], "1;2");
        assert_eq!(flat["product_name"], "苹果");
        assert_eq!(flat["product_price"], "9.9;19.9");
        assert_eq!(flat["product_spec"], "");
        assert_eq!(flat[ANCHOR_NAME], "小王");
    }

    #[test]
    fn product_info_merges_brand_and_sellpoint() {
        let mut product = entry("42", "old", "1");
        product.apply_product_info(&ProductInfo {
            product_name: Some("新品".into()),
            product_price: Some(String::new()),
            brand_info: Some("品牌A".into()),
            sellpoint: Some("好吃;便宜".into()),
        });

        assert_eq!(product.product_name, "新品");
        assert_eq!(product.product_price, "1");
        assert_eq!(product.sellpoint, "品牌A;好吃;便宜");
    }

    #[test]
    fn empty_product_info_changes_nothing() {
        let mut product = entry("42", "old", "1");
        product.sellpoint = "keep".into();
        let before = product.clone();
        product.apply_product_info(&ProductInfo::default());
        assert_eq!(product, before);
    }
}
