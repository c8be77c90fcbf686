#![forbid(unsafe_code)]

//! HTTP implementation of the analysis endpoint.
//!
//! Works on native targets and on `wasm32` (where `reqwest` goes through the
//! browser's `fetch`). One POST per call; the status is checked, nothing is
//! retried and no timeout is set.

use async_trait::async_trait;
use sentiview_core::{
    AnalysisEndpoint, AnalysisRequest, AnalysisResponse, EndpointError, PageConfig,
};
use tracing::debug;
use url::Url;

/// Resolve `endpoint` against `base` when it is relative.
pub fn resolve_endpoint_url(endpoint: &str, base: Option<&str>) -> Result<Url, EndpointError> {
    match Url::parse(endpoint) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(|| {
                EndpointError::InvalidUrl(format!("relative endpoint {endpoint:?} needs a base url"))
            })?;
            Url::parse(base)
                .and_then(|base| base.join(endpoint))
                .map_err(|err| EndpointError::InvalidUrl(err.to_string()))
        }
        Err(err) => Err(EndpointError::InvalidUrl(err.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: reqwest::Client,
    url: Url,
}

impl HttpEndpoint {
    pub fn new(url: Url) -> Result<Self, EndpointError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| EndpointError::Transport(err.to_string()))?;
        Ok(Self { client, url })
    }

    /// Build from the page config. `fallback_base` (the page origin in the
    /// browser) is used when the config has no `base_url`.
    pub fn from_config(config: &PageConfig, fallback_base: Option<&str>) -> Result<Self, EndpointError> {
        let base = config.base_url.as_deref().or(fallback_base);
        Self::new(resolve_endpoint_url(&config.endpoint_url, base)?)
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait(?Send)]
impl AnalysisEndpoint for HttpEndpoint {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, EndpointError> {
        debug!(url = %self.url, channel = %request.channel_name, "posting analysis request");
        let response = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| EndpointError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(EndpointError::Status(status.as_u16()));
        }
        response
            .json::<AnalysisResponse>()
            .await
            .map_err(|err| EndpointError::Decode(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn absolute_endpoint_ignores_base() {
        let url = resolve_endpoint_url("https://api.example.test/analyze", Some("http://localhost:5000"))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.test/analyze");
    }

    #[test]
    fn relative_endpoint_joins_base() {
        let url = resolve_endpoint_url("/analyze", Some("http://localhost:5000/app/")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/analyze");
    }

    #[test]
    fn relative_endpoint_without_base_is_rejected() {
        let err = resolve_endpoint_url("/analyze", None).unwrap_err();
        assert!(matches!(err, EndpointError::InvalidUrl(_)));
    }

    #[test]
    fn bad_base_is_rejected() {
        let err = resolve_endpoint_url("/analyze", Some("not a url")).unwrap_err();
        assert!(matches!(err, EndpointError::InvalidUrl(_)));
    }

    #[test]
    fn config_base_wins_over_fallback() {
        let config = PageConfig {
            base_url: Some("http://configured.test".to_owned()),
            ..PageConfig::default()
        };
        let endpoint = HttpEndpoint::from_config(&config, Some("http://origin.test")).unwrap();
        assert_eq!(endpoint.url().as_str(), "http://configured.test/analyze");

        let endpoint =
            HttpEndpoint::from_config(&PageConfig::default(), Some("http://origin.test")).unwrap();
        assert_eq!(endpoint.url().as_str(), "http://origin.test/analyze");
    }
}
