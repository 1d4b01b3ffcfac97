use crate::config::Config;
use crate::i18n::Locale;
use crate::translation::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Maximum number of texts per provider request.
/// Google Translate v2 accepts up to 128 texts per request.
pub const DEFAULT_BATCH_SIZE: usize = 128;

pub const DEFAULT_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// External text-translation service.
///
/// Implementations make exactly one attempt per call and return results in
/// input order. Retrying and falling back are the caller's business.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, texts: &[String], target: Locale) -> Result<Vec<String>, ProviderError>;
}

/// Google Translate v2 request body
#[derive(Debug, Serialize)]
struct TranslateApiRequest<'a> {
    q: &'a [String],
    source: &'static str,
    target: &'static str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateApiResponse {
    data: TranslateApiData,
}

#[derive(Debug, Deserialize)]
struct TranslateApiData {
    translations: Vec<ApiTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTranslation {
    translated_text: String,
}

/// HTTP adapter for a Google-Translate-v2-compatible API.
#[derive(Debug, Clone)]
pub struct HttpTranslationProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    batch_size: usize,
}

impl HttpTranslationProvider {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        batch_size: usize,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            batch_size: batch_size.max(1),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        Self::new(
            &config.translate_api_url,
            &config.translate_api_key,
            config.translate_batch_size,
            Duration::from_secs(config.translate_timeout_secs),
        )
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Translate one chunk (at most `batch_size` texts) with a single request.
    async fn translate_chunk(&self, chunk: &[String], target: Locale) -> Result<Vec<String>, ProviderError> {
        let request = TranslateApiRequest {
            q: chunk,
            source: Locale::SOURCE.code(),
            target: target.code(),
            format: "text",
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(ProviderError::from_status(status, body));
        }

        let parsed: TranslateApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        if parsed.data.translations.len() != chunk.len() {
            return Err(ProviderError::MalformedResponse(format!(
                "expected {} translations, got {}",
                chunk.len(),
                parsed.data.translations.len()
            )));
        }

        Ok(parsed
            .data
            .translations
            .into_iter()
            .map(|t| t.translated_text)
            .collect())
    }
}

#[async_trait]
impl TranslationProvider for HttpTranslationProvider {
    async fn translate(&self, texts: &[String], target: Locale) -> Result<Vec<String>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let chunks: Vec<&[String]> = texts.chunks(self.batch_size).collect();
        debug!(
            "Translating {} texts to {} in {} request(s)",
            texts.len(),
            target.code(),
            chunks.len()
        );

        // Sequential; one failed chunk fails the whole call.
        let mut translated = Vec::with_capacity(texts.len());
        for chunk in chunks {
            translated.extend(self.translate_chunk(chunk, target).await?);
        }
        Ok(translated)
    }
}
