pub mod dto;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{LlmConfig, ModelSourceConfig};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    Primary,
    Fallback,
}

impl ModelSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelSource::Primary => "primary",
            ModelSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(ModelSource::Primary),
            "fallback" => Ok(ModelSource::Fallback),
            other => Err(AppError::BadRequest(format!(
                "منبع مدل «{}» پشتیبانی نمی‌شود",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// `None` tries the primary source, then the fallback.
    pub source: Option<ModelSource>,
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub source: ModelSource,
    pub content: String,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, AppError>;
}

/// OpenAI-compatible `/chat/completions` client over one or two endpoints.
pub struct HttpLanguageModel {
    client: Client,
    config: LlmConfig,
}

impl HttpLanguageModel {
    pub fn new(config: LlmConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn sources(
        &self,
        requested: Option<ModelSource>,
    ) -> Result<Vec<(ModelSource, &ModelSourceConfig)>, AppError> {
        let configured = |source: ModelSource| match source {
            ModelSource::Primary => self.config.primary.as_ref(),
            ModelSource::Fallback => self.config.fallback.as_ref(),
        };

        match requested {
            Some(source) => configured(source)
                .map(|cfg| vec![(source, cfg)])
                .ok_or_else(|| {
                    AppError::BadRequest(format!("منبع مدل «{}» پیکربندی نشده است", source))
                }),
            None => {
                let sources: Vec<_> = [ModelSource::Primary, ModelSource::Fallback]
                    .into_iter()
                    .filter_map(|s| configured(s).map(|cfg| (s, cfg)))
                    .collect();
                if sources.is_empty() {
                    Err(AppError::Extraction(
                        "no language model source is configured".to_string(),
                    ))
                } else {
                    Ok(sources)
                }
            }
        }
    }

    async fn chat(
        &self,
        source: &ModelSourceConfig,
        request: &CompletionRequest,
    ) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", source.base_url.trim_end_matches('/'));
        let body = dto::ChatCompletionRequest {
            model: &source.model,
            messages: vec![
                dto::ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                dto::ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: 0.0,
            response_format: dto::ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&source.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Extraction(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Extraction(format!(
                "model API error {}: {}",
                status, text
            )));
        }

        let parsed: dto::ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Extraction(format!("failed to parse model response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Extraction("model returned no choices".to_string()))?;
        debug!("model finished with {:?}", choice.finish_reason);

        choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::Extraction("model returned an empty message".to_string()))
    }
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, AppError> {
        let mut last_error = None;
        for (source, cfg) in self.sources(request.source)? {
            match self.chat(cfg, &request).await {
                Ok(content) => return Ok(Completion { source, content }),
                Err(e) => {
                    warn!("model source {} ({}) failed: {}", source, cfg.model, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| AppError::Extraction("no language model answered".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn source(model: &str) -> ModelSourceConfig {
        ModelSourceConfig {
            base_url: "http://localhost:1".to_string(),
            api_key: "key".to_string(),
            model: model.to_string(),
        }
    }

    fn model(primary: bool, fallback: bool) -> HttpLanguageModel {
        HttpLanguageModel::new(LlmConfig {
            primary: primary.then(|| source("main")),
            fallback: fallback.then(|| source("backup")),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn selector_parses_known_sources() {
        assert_eq!("Primary".parse::<ModelSource>().unwrap(), ModelSource::Primary);
        assert_eq!(" fallback ".parse::<ModelSource>().unwrap(), ModelSource::Fallback);
        assert!(matches!("gpt".parse::<ModelSource>(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn absent_selector_tries_every_configured_source_in_order() {
        let m = model(true, true);
        let order: Vec<ModelSource> = m.sources(None).unwrap().into_iter().map(|(s, _)| s).collect();
        assert_eq!(order, vec![ModelSource::Primary, ModelSource::Fallback]);

        let only_fallback = model(false, true);
        assert_eq!(only_fallback.sources(None).unwrap().len(), 1);
    }

    #[test]
    fn unconfigured_sources_are_reported() {
        assert!(matches!(
            model(true, false).sources(Some(ModelSource::Fallback)),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(model(false, false).sources(None), Err(AppError::Extraction(_))));
    }
}
