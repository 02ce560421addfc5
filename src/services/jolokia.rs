//! Jolokia（JMX over HTTP）管理连接
//!
//! 端点地址可以是 `http(s)://host:port/jolokia/`，也可以是
//! `service:jmx:http(s)://...` 形式；其他 JMX 协议（如 rmi）不支持。

use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ProbeError, ProbeResult};
use crate::models::{ManagementEndpointAddress, ObjectName};
use crate::services::management::{MBeanConnection, ManagementConnector};

const JMX_SERVICE_PREFIX: &str = "service:jmx:";

#[derive(Debug, Deserialize)]
struct JolokiaResponse {
    status: u16,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_type: Option<String>,
}

/// 把端点地址转换为 Jolokia 的基础 URL（以 `/` 结尾）
pub fn agent_url(address: &ManagementEndpointAddress) -> ProbeResult<Url> {
    let raw = address.as_str().trim();
    let url_part = raw.strip_prefix(JMX_SERVICE_PREFIX).unwrap_or(raw);

    let scheme = url_part.split_once("://").map(|(scheme, _)| scheme);
    match scheme {
        Some("http") | Some("https") => {}
        Some(other) => {
            return Err(ProbeError::connection_failure(
                raw,
                format!("unsupported management protocol '{}'", other),
            ))
        }
        None => return Err(ProbeError::connection_failure(raw, "not a management URL")),
    }

    let mut url = Url::parse(url_part)
        .map_err(|e| ProbeError::connection_failure(raw, format!("invalid URL: {}", e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct JolokiaConnector {
    timeout: Duration,
}

impl JolokiaConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ManagementConnector for JolokiaConnector {
    type Connection = JolokiaConnection;

    async fn connect(&self, address: &ManagementEndpointAddress) -> ProbeResult<JolokiaConnection> {
        let base_url = agent_url(address)?;
        let fail = |reason: String| ProbeError::connection_failure(address.as_str(), reason);

        let client = Client::builder()
            .timeout(self.timeout)
            .no_proxy()
            .user_agent(format!("kafka-health-probe/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| fail(format!("failed to create HTTP client: {}", e)))?;

        let version_url = base_url
            .join("version")
            .map_err(|e| fail(format!("invalid URL: {}", e)))?;
        debug!("Handshake with {}", version_url);

        let response = client
            .get(version_url)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fail(format!("handshake returned HTTP {}", response.status())));
        }
        let body: JolokiaResponse = response
            .json()
            .await
            .map_err(|e| fail(format!("handshake response is not a Jolokia reply: {}", e)))?;
        if body.status != 200 {
            return Err(fail(format!(
                "handshake rejected with status {}: {}",
                body.status,
                body.error.unwrap_or_default()
            )));
        }

        Ok(JolokiaConnection {
            client,
            base_url,
            address: address.clone(),
        })
    }
}

#[derive(Debug)]
pub struct JolokiaConnection {
    client: Client,
    base_url: Url,
    address: ManagementEndpointAddress,
}

impl MBeanConnection for JolokiaConnection {
    async fn read_attribute(&self, name: &ObjectName, attribute: &str) -> ProbeResult<Value> {
        let request = json!({
            "type": "read",
            "mbean": name.as_str(),
            "attribute": attribute,
        });

        let response = self
            .client
            .post(self.base_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProbeError::connection_failure(self.address.as_str(), e.to_string()))?;

        let http_status = response.status();
        let body: JolokiaResponse = response.json().await.map_err(|e| {
            ProbeError::attribute_unreadable(
                name.as_str(),
                attribute,
                format!("HTTP {} with unreadable body: {}", http_status, e),
            )
        })?;

        let reason = || {
            format!(
                "{}: {}",
                body.error_type.as_deref().unwrap_or("error"),
                body.error.as_deref().unwrap_or("no details")
            )
        };

        let not_found = body.status == StatusCode::NOT_FOUND.as_u16()
            && body
                .error_type
                .as_deref()
                .map_or(true, |t| t.ends_with("InstanceNotFoundException"));

        match body.status {
            200 => body.value.clone().ok_or_else(|| {
                ProbeError::attribute_unreadable(name.as_str(), attribute, "reply has no value")
            }),
            _ if not_found => Err(ProbeError::ObjectNotFound {
                name: name.to_string(),
                reason: reason(),
            }),
            status => Err(ProbeError::attribute_unreadable(
                name.as_str(),
                attribute,
                format!("status {} ({})", status, reason()),
            )),
        }
    }

    async fn close(self) {
        debug!("Releasing management connection to {}", self.address);
        drop(self.client);
    }
}
