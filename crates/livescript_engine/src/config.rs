use std::time::Duration;

use url::Url;

/// Connection details and request-level timeouts for the inference gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub endpoint_path: String,
    pub app_id: u64,
    pub biz_code: String,
    /// Server-side budget sent as `config.requestTimeoutMs`.
    pub service_timeout: Duration,
    pub connect_timeout: Duration,
    pub submit_timeout: Duration,
    pub query_timeout: Duration,
    pub lookup_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7001".to_string(),
            endpoint_path: "/pyinfer_tao_pre/api/v1/inference/stream".to_string(),
            app_id: 51143,
            biz_code: "live_script_demo".to_string(),
            service_timeout: Duration::from_secs(15 * 60),
            connect_timeout: Duration::from_secs(10),
            submit_timeout: Duration::from_secs(5 * 60),
            query_timeout: Duration::from_secs(60),
            lookup_timeout: Duration::from_secs(60),
        }
    }
}

impl ApiSettings {
    /// Absolute URL every envelope is posted to.
    pub fn endpoint(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)?.join(&self.endpoint_path)
    }
}
