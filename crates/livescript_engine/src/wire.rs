//! Request envelopes understood by the inference gateway.
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::ApiSettings;

pub(crate) const SERVICE_LIVE_SCRIPT: &str = "live_script";
pub(crate) const SERVICE_OSS_QUERY: &str = "oss_query";
pub(crate) const SERVICE_ITEM_QUERY: &str = "igraph_query";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope<'a, R> {
    app_id: u64,
    biz_code: &'a str,
    config: EnvelopeConfig,
    request: R,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeConfig {
    request_timeout_ms: u64,
}

impl<'a, R: Serialize> Envelope<'a, R> {
    pub(crate) fn new(settings: &'a ApiSettings, request: R) -> Self {
        Self {
            app_id: settings.app_id,
            biz_code: &settings.biz_code,
            config: EnvelopeConfig {
                request_timeout_ms: u64::try_from(settings.service_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            },
            request,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OssQueryRequest<'a> {
    service_type: &'static str,
    name: &'a str,
}

impl<'a> OssQueryRequest<'a> {
    pub(crate) fn new(name: &'a str) -> Self {
        Self {
            service_type: SERVICE_OSS_QUERY,
            name,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ItemQueryRequest<'a> {
    service_type: &'static str,
    item_id: &'a str,
}

impl<'a> ItemQueryRequest<'a> {
    pub(crate) fn new(item_id: &'a str) -> Self {
        Self {
            service_type: SERVICE_ITEM_QUERY,
            item_id,
        }
    }
}

/// Flattened generation request; `service_type` and `script_type` always win
/// over form fields of the same name.
pub(crate) fn live_script_request(
    script_type_label: &str,
    fields: &BTreeMap<String, String>,
) -> Map<String, Value> {
    let mut request: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    request.insert(
        "service_type".to_string(),
        Value::String(SERVICE_LIVE_SCRIPT.to_string()),
    );
    request.insert(
        "script_type".to_string(),
        Value::String(script_type_label.to_string()),
    );
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_uses_gateway_field_names() {
        let settings = ApiSettings::default();
        let body = serde_json::to_value(Envelope::new(&settings, OssQueryRequest::new("a.xlsx")))
            .unwrap();
        assert_eq!(
            body,
            json!({
                "appId": 51143,
                "bizCode": "live_script_demo",
                "config": { "requestTimeoutMs": 900000 },
                "request": { "service_type": "oss_query", "name": "a.xlsx" }
            })
        );
    }

    #[test]
    fn form_fields_cannot_override_service_type() {
        let mut fields = BTreeMap::new();
        fields.insert("service_type".to_string(), "oss_query".to_string());
        fields.insert("anchor_name".to_string(), "小王".to_string());
        let request = live_script_request("单人推品", &fields);
        assert_eq!(request["service_type"], "live_script");
        assert_eq!(request["script_type"], "单人推品");
        assert_eq!(request["anchor_name"], "小王");
    }
}
