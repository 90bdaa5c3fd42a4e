use aries_domain::{GatewayConfig, GatewayError, GatewayResult, Service, ServiceGateway};
use async_trait::async_trait;
use metrics::counter;
use reqwest::{Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::builder::GatewayBuilder;

/// Collection endpoint for service records, relative to the backend origin.
pub const SERVICES_PATH: &str = "/api/services";

/// `reqwest`-backed gateway. Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpServiceGateway {
    http: reqwest::Client,
    services_url: Url,
}

impl HttpServiceGateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        Self::builder()
            .base_url(config.api_base_url())
            .request_timeout(config.request_timeout())
            .build()
    }

    pub(crate) fn from_parts(http: reqwest::Client, services_url: Url) -> Self {
        Self { http, services_url }
    }

    pub fn services_url(&self) -> &Url {
        &self.services_url
    }
}

#[async_trait]
impl ServiceGateway for HttpServiceGateway {
    async fn list_services(&self) -> GatewayResult<Vec<Service>> {
        let response = self
            .http
            .get(self.services_url.clone())
            .send()
            .await
            .map_err(|err| transport_failure("GET", err))?;
        let response = expect_ok("GET", response).await?;

        let services = response.json::<Vec<Service>>().await.map_err(|err| {
            counter!("gateway_requests_total", "method" => "GET", "result" => "decode_error")
                .increment(1);
            warn!(%err, "service list payload could not be decoded");
            GatewayError::Decode(err.to_string())
        })?;

        counter!("gateway_requests_total", "method" => "GET", "result" => "ok").increment(1);
        debug!(count = services.len(), "fetched service list");
        Ok(services)
    }

    async fn update_service(&self, service: &Service) -> GatewayResult<()> {
        let response = self
            .http
            .put(self.services_url.clone())
            .json(service)
            .send()
            .await
            .map_err(|err| transport_failure("PUT", err))?;
        expect_ok("PUT", response).await?;

        counter!("gateway_requests_total", "method" => "PUT", "result" => "ok").increment(1);
        debug!(id = ?service.id(), "service update accepted");
        Ok(())
    }

    async fn create_service(&self, service: &Service) -> GatewayResult<()> {
        let response = self
            .http
            .post(self.services_url.clone())
            .json(service)
            .send()
            .await
            .map_err(|err| transport_failure("POST", err))?;
        expect_ok("POST", response).await?;

        counter!("gateway_requests_total", "method" => "POST", "result" => "ok").increment(1);
        debug!(id = ?service.id(), "service creation accepted");
        Ok(())
    }
}

fn transport_failure(method: &'static str, err: reqwest::Error) -> GatewayError {
    counter!("gateway_requests_total", "method" => method, "result" => "transport_error")
        .increment(1);
    warn!(method, %err, "service registry unreachable");
    GatewayError::transport(err)
}

/// Only an exact 200 counts as success; everything else becomes a status
/// failure carrying the response body.
async fn expect_ok(method: &'static str, response: Response) -> GatewayResult<Response> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            warn!(method, status = status.as_u16(), %err, "failed to read rejection body");
            String::new()
        }
    };
    let detail = failure_detail(status, &body);
    counter!("gateway_requests_total", "method" => method, "result" => "status_error")
        .increment(1);
    warn!(method, status = status.as_u16(), %detail, "service registry rejected request");
    Err(GatewayError::Status {
        status: status.as_u16(),
        detail,
    })
}

pub(crate) fn failure_detail(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(text)) => text,
        _ => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("no response body")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        }
    }
}
