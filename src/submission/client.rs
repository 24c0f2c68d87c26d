use crate::error::SubmitError;
use crate::model::{AnalysisRequest, AnalysisResponse, WizardConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

/// Backend that turns a request into an analysis.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, SubmitError>;
}

/// JSON-over-HTTP analysis endpoint.
#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpAnalysisService {
    pub fn new(cfg: &WizardConfig) -> Result<Self> {
        let endpoint = Url::parse(&cfg.endpoint)
            .with_context(|| format!("invalid analysis endpoint {}", cfg.endpoint))?;
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .build()
            .context("build http client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, SubmitError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = resp.status();
        debug!(status = status.as_u16(), "analysis endpoint responded");
        if !status.is_success() {
            return Err(SubmitError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        resp.json::<AnalysisResponse>()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))
    }
}
