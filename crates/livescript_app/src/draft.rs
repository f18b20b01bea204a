//! Form drafts stored as RON files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use livescript_core::{FormDraft, ProductEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftProduct {
    pub id: String,
    pub name: String,
    pub price: String,
    pub spec: String,
    pub sellpoint: String,
}

/// On-disk form contents for one script type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftFile {
    pub products: Vec<DraftProduct>,
    pub fields: BTreeMap<String, String>,
}

impl DraftFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading draft {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parsing draft {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())?;
        fs::write(path, text).with_context(|| format!("writing draft {}", path.display()))
    }

    /// A draft without products still gets the single empty row a new form has.
    pub fn into_form(self) -> FormDraft {
        let mut form = FormDraft {
            fields: self.fields,
            ..FormDraft::default()
        };
        if !self.products.is_empty() {
            form.products = self
                .products
                .into_iter()
                .map(|product| ProductEntry {
                    product_id: product.id,
                    product_name: product.name,
                    product_price: product.price,
                    product_spec: product.spec,
                    sellpoint: product.sellpoint,
                })
                .collect();
        }
        form
    }

    pub fn from_form(form: &FormDraft) -> Self {
        Self {
            products: form
                .products
                .iter()
                .map(|product| DraftProduct {
                    id: product.product_id.clone(),
                    name: product.product_name.clone(),
                    price: product.product_price.clone(),
                    spec: product.product_spec.clone(),
                    sellpoint: product.sellpoint.clone(),
                })
                .collect(),
            fields: form.fields.clone(),
        }
    }
}
