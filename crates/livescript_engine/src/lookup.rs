use livescript_logging::{script_debug, script_warn};
use serde::Deserialize;
use serde_json::Value;

use crate::http::{build_client, post_envelope, read_events};
use crate::query::ServiceReply;
use crate::stream::StreamEvent;
use crate::wire::ItemQueryRequest;
use crate::{ApiSettings, ItemInfo, LookupError};

/// Fetch product details for an item id.
#[async_trait::async_trait]
pub trait ProductLookup: Send + Sync {
    async fn lookup(&self, item_id: &str) -> Result<ItemInfo, LookupError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestProductLookup {
    settings: ApiSettings,
}

impl ReqwestProductLookup {
    pub fn new(settings: ApiSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl ProductLookup for ReqwestProductLookup {
    async fn lookup(&self, item_id: &str) -> Result<ItemInfo, LookupError> {
        let client = build_client(self.settings.connect_timeout, self.settings.lookup_timeout)?;
        let response = post_envelope(&client, &self.settings, ItemQueryRequest::new(item_id)).await?;
        let events = read_events(response).await?;
        interpret_lookup_events(&events)
    }
}

#[derive(Debug, Deserialize)]
struct ItemReply {
    #[serde(default)]
    status: String,
    message: Option<String>,
    item_name: Option<Value>,
    discount_price: Option<Value>,
    daily_price: Option<Value>,
    brand_ext_info: Option<Value>,
    selling_points: Option<Value>,
}

/// Fold an item-query stream into product details; the first verdict wins.
pub fn interpret_lookup_events(events: &[StreamEvent]) -> Result<ItemInfo, LookupError> {
    for event in events {
        let payload = match event {
            StreamEvent::Done { .. } => break,
            StreamEvent::Data { payload, .. } => payload,
        };
        let reply: ServiceReply<ItemReply> = match serde_json::from_str(payload) {
            Ok(reply) => reply,
            Err(err) => {
                script_warn!("Skipping malformed item payload {payload:?}: {err}");
                continue;
            }
        };
        let Some(data) = reply.data else {
            continue;
        };
        match data.status.as_str() {
            "success" if reply.success => {
                return Ok(ItemInfo {
                    name: data.item_name.as_ref().and_then(text),
                    price: data
                        .discount_price
                        .as_ref()
                        .and_then(text)
                        .or_else(|| data.daily_price.as_ref().and_then(text)),
                    brand_info: data.brand_ext_info.as_ref().and_then(text),
                    selling_points: data.selling_points.as_ref().and_then(selling_points),
                });
            }
            "progress" => script_debug!("item lookup in progress"),
            _ => {
                return Err(LookupError::NotFound(
                    data.message.unwrap_or_else(|| format!("status {:?}", data.status)),
                ));
            }
        }
    }
    Err(LookupError::Empty)
}

/// Scalar JSON as trimmed text; empty strings and nulls are absent.
fn text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Selling points arrive as a JSON array, a string holding a JSON array, or
/// plain text. Arrays are joined with `;`.
fn selling_points(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let joined = items.iter().filter_map(text).collect::<Vec<_>>().join(";");
            (!joined.is_empty()).then_some(joined)
        }
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed @ Value::Array(_)) => selling_points(&parsed),
            _ => text(value),
        },
        other => text(other),
    }
}
