//! IBM watsonx.ai providers for embeddings and text generation.
//!
//! This module is only available when the `watsonx` feature is enabled.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{Generation, GenerationParams, TextGenerator};

/// Provider name used in error variants and log fields.
const PROVIDER: &str = "watsonx";

/// IBM Cloud IAM token exchange endpoint.
const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// Grant type for exchanging an API key for a bearer token.
const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Bearer tokens are refreshed this many seconds before they expire.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

/// The watsonx.ai API version date sent with every request.
const DEFAULT_API_VERSION: &str = "2023-05-29";

/// The default model for watsonx embeddings.
const DEFAULT_EMBEDDING_MODEL: &str = "ibm/slate-125m-english-rtrvr-v2";

/// The dimensionality of `ibm/slate-125m-english-rtrvr-v2`.
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;

/// The default model for watsonx text generation.
const DEFAULT_GENERATION_MODEL: &str = "ibm/granite-3-2-8b-instruct";

/// Connection settings for a watsonx.ai project.
#[derive(Debug, Clone)]
pub struct WatsonxConfig {
    /// Regional service endpoint, e.g. `https://us-south.ml.cloud.ibm.com`.
    pub url: String,
    /// IBM Cloud API key, exchanged for a bearer token on first use.
    pub api_key: String,
    /// The watsonx.ai project id requests are billed against.
    pub project_id: String,
    /// API version date sent as the `version` query parameter.
    pub version: String,
}

impl WatsonxConfig {
    /// Create a config with the default API version.
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            project_id: project_id.into(),
            version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Create a config from the `IBM_URL_END_POINT`, `IBM_API_KEY`, and
    /// `IBM_PROJECT_ID` environment variables.
    pub fn from_env() -> Result<Self> {
        let url = required_env("IBM_URL_END_POINT")?;
        let api_key = required_env("IBM_API_KEY")?;
        let project_id = required_env("IBM_PROJECT_ID")?;
        Ok(Self::new(url, api_key, project_id))
    }

    /// Override the API version date.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| RagError::ConfigError(format!("{name} environment variable not set")))
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Shared HTTP client for the watsonx.ai API.
///
/// Holds the connection pool and the cached IAM bearer token; one client is
/// constructed per process and shared by the embedding provider and the
/// generator via `Arc`. The API key is exchanged for a bearer token lazily
/// and the token is reused until shortly before it expires.
pub struct WatsonxClient {
    http: reqwest::Client,
    config: WatsonxConfig,
    token: Mutex<Option<CachedToken>>,
}

impl WatsonxClient {
    /// Create a client for the given config.
    pub fn new(config: WatsonxConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(RagError::ConfigError("watsonx API key must not be empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config, token: Mutex::new(None) })
    }

    /// Create a client from environment variables (see
    /// [`WatsonxConfig::from_env`]).
    pub fn from_env() -> Result<Self> {
        Self::new(WatsonxConfig::from_env()?)
    }

    /// Return a valid bearer token, exchanging the API key if the cached
    /// token is missing or about to expire.
    async fn bearer_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.token.clone());
            }
        }

        debug!(provider = PROVIDER, "exchanging API key for IAM token");
        let response = self
            .http
            .post(IAM_TOKEN_URL)
            .form(&[("grant_type", IAM_GRANT_TYPE), ("apikey", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "IAM token request failed");
                RagError::AuthError {
                    provider: PROVIDER.to_string(),
                    message: format!("token request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = PROVIDER, %status, "IAM rejected the API key");
            return Err(RagError::AuthError {
                provider: PROVIDER.to_string(),
                message: format!("IAM returned {status}: {body}"),
            });
        }

        let token_response: IamTokenResponse = response.json().await.map_err(|e| {
            RagError::ParseError {
                provider: PROVIDER.to_string(),
                message: format!("failed to parse IAM token response: {e}"),
            }
        })?;

        let ttl = token_response.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);
        let token = CachedToken {
            token: token_response.access_token,
            expires_at: Instant::now() + Duration::from_secs(ttl),
        };
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// POST a JSON body to a watsonx.ai endpoint with auth and the API
    /// version, returning the raw response for the caller to decode.
    async fn post(
        &self,
        endpoint: &str,
        body: &impl Serialize,
        request_failed: impl FnOnce(String) -> RagError,
    ) -> Result<reqwest::Response> {
        let token = self.bearer_token().await?;
        let url = format!("{}{endpoint}", self.config.url);
        self.http
            .post(&url)
            .query(&[("version", self.config.version.as_str())])
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                request_failed(format!("request failed: {e}"))
            })
    }
}

// ── watsonx.ai API request/response types ──────────────────────────

#[derive(Deserialize)]
struct IamTokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    inputs: Vec<&'a str>,
    model_id: &'a str,
    project_id: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    results: Vec<EmbeddingResult>,
}

#[derive(Deserialize)]
struct EmbeddingResult {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    input: &'a str,
    model_id: &'a str,
    project_id: &'a str,
    parameters: GenerationRequestParameters,
}

#[derive(Serialize)]
struct GenerationRequestParameters {
    decoding_method: &'static str,
    max_new_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationResult>,
}

#[derive(Deserialize)]
struct GenerationResult {
    generated_text: String,
    #[serde(default)]
    generated_token_count: Option<u64>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct WatsonxErrorResponse {
    errors: Vec<WatsonxErrorDetail>,
}

#[derive(Deserialize)]
struct WatsonxErrorDetail {
    message: String,
}

/// Map a non-success watsonx response to the error taxonomy.
///
/// Auth and rate-limit statuses map to their dedicated variants; anything
/// else goes through `fallback` so embedding and generation calls keep
/// their own flavor.
fn api_error(status: StatusCode, body: &str, fallback: impl FnOnce(String) -> RagError) -> RagError {
    let detail = serde_json::from_str::<WatsonxErrorResponse>(body)
        .ok()
        .and_then(|e| e.errors.into_iter().next())
        .map(|e| e.message)
        .unwrap_or_else(|| body.to_string());
    let message = format!("API returned {status}: {detail}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RagError::AuthError { provider: PROVIDER.to_string(), message }
        }
        StatusCode::TOO_MANY_REQUESTS => {
            RagError::RateLimitError { provider: PROVIDER.to_string(), message }
        }
        _ => fallback(message),
    }
}

// ── EmbeddingProvider implementation ───────────────────────────────

/// An [`EmbeddingProvider`] backed by the watsonx.ai embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use docqa::watsonx::{WatsonxClient, WatsonxEmbeddingProvider};
///
/// let client = Arc::new(WatsonxClient::from_env()?);
/// let provider = WatsonxEmbeddingProvider::new(client);
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct WatsonxEmbeddingProvider {
    client: Arc<WatsonxClient>,
    model: String,
    dimensions: usize,
}

impl WatsonxEmbeddingProvider {
    /// Create a provider with the default model
    /// (`ibm/slate-125m-english-rtrvr-v2`, 768 dimensions).
    pub fn new(client: Arc<WatsonxClient>) -> Self {
        Self {
            client,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }

    /// Set the embedding model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the dimensionality reported for the model.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for WatsonxEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request_body = EmbeddingsRequest {
            inputs: texts.to_vec(),
            model_id: &self.model,
            project_id: &self.client.config.project_id,
        };

        let embedding_error = |message: String| RagError::EmbeddingError {
            provider: PROVIDER.to_string(),
            message,
        };

        let response =
            self.client.post("/ml/v1/text/embeddings", &request_body, embedding_error).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = PROVIDER, %status, "embeddings API error");
            return Err(api_error(status, &body, embedding_error));
        }

        let embeddings: EmbeddingsResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse embeddings response");
            RagError::ParseError {
                provider: PROVIDER.to_string(),
                message: format!("failed to parse embeddings response: {e}"),
            }
        })?;

        if embeddings.results.len() != texts.len() {
            return Err(RagError::EmbeddingError {
                provider: PROVIDER.to_string(),
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    embeddings.results.len()
                ),
            });
        }

        Ok(embeddings.results.into_iter().map(|r| r.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ── TextGenerator implementation ───────────────────────────────────

/// A [`TextGenerator`] backed by the watsonx.ai text generation API.
///
/// Uses greedy decoding with the parameters fixed at construction.
pub struct WatsonxGenerator {
    client: Arc<WatsonxClient>,
    model: String,
    params: GenerationParams,
}

impl WatsonxGenerator {
    /// Create a generator with the default model
    /// (`ibm/granite-3-2-8b-instruct`) and default parameters.
    pub fn new(client: Arc<WatsonxClient>) -> Self {
        Self {
            client,
            model: DEFAULT_GENERATION_MODEL.to_string(),
            params: GenerationParams::default(),
        }
    }

    /// Set the generation model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }
}

#[async_trait]
impl TextGenerator for WatsonxGenerator {
    async fn generate(&self, prompt: &str) -> Result<Generation> {
        debug!(
            provider = PROVIDER,
            model = %self.model,
            prompt_len = prompt.len(),
            "generating"
        );

        let request_body = GenerationRequest {
            input: prompt,
            model_id: &self.model,
            project_id: &self.client.config.project_id,
            parameters: GenerationRequestParameters {
                decoding_method: "greedy",
                max_new_tokens: self.params.max_new_tokens,
                temperature: self.params.temperature,
            },
        };

        let generation_error = |message: String| RagError::GenerationError {
            provider: PROVIDER.to_string(),
            message,
        };

        let response =
            self.client.post("/ml/v1/text/generation", &request_body, generation_error).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = PROVIDER, %status, "generation API error");
            return Err(api_error(status, &body, generation_error));
        }

        let generation: GenerationResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse generation response");
            RagError::ParseError {
                provider: PROVIDER.to_string(),
                message: format!("failed to parse generation response: {e}"),
            }
        })?;

        let result = generation.results.into_iter().next().ok_or_else(|| {
            RagError::GenerationError {
                provider: PROVIDER.to_string(),
                message: "API returned empty response".to_string(),
            }
        })?;

        Ok(Generation {
            text: result.generated_text,
            model_id: self.model.clone(),
            generated_tokens: result.generated_token_count,
            stop_reason: result.stop_reason,
        })
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
