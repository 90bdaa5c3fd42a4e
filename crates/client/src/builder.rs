use std::time::Duration;

use aries_domain::{GatewayError, GatewayResult, DEFAULT_REQUEST_TIMEOUT};
use reqwest::Url;

use crate::gateway::{HttpServiceGateway, SERVICES_PATH};

#[derive(Debug, Default)]
pub struct GatewayBuilder {
    base_url: Option<String>,
    request_timeout: Option<Duration>,
}

impl GatewayBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            request_timeout: None,
        }
    }

    /// Backend origin; `/api/services` is resolved against it.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> GatewayResult<HttpServiceGateway> {
        let raw = self
            .base_url
            .ok_or_else(|| GatewayError::InvalidEndpoint("missing base url".into()))?;
        let base = Url::parse(raw.trim())
            .map_err(|err| GatewayError::InvalidEndpoint(format!("{raw}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(GatewayError::InvalidEndpoint(format!(
                "{raw}: not an http origin"
            )));
        }
        let services_url = base
            .join(SERVICES_PATH)
            .map_err(|err| GatewayError::InvalidEndpoint(format!("{raw}: {err}")))?;

        let http = reqwest::Client::builder()
            .timeout(self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
            .build()
            .map_err(GatewayError::transport)?;

        Ok(HttpServiceGateway::from_parts(http, services_url))
    }
}
