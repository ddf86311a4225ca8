//! External vision-model client
//!
//! Sends uploaded photos to an OpenAI-compatible chat-completions API
//! and extracts the loosely-structured scoring JSON from the reply.
//! When no API key is configured, or the upstream call fails in any way,
//! the caller falls back to [`mock_analysis`] — the request pipeline
//! always ends up with a [`RawAnalysis`] to normalize.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chopd_common::analysis::RawAnalysis;
use chopd_common::config::ServiceConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const USER_AGENT: &str = "chopd/0.1.0 (https://github.com/chopd/chopd)";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const RATE_LIMIT_MS: u64 = 500; // 2 requests per second
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

/// Scoring prompt sent alongside the photos
const ANALYSIS_PROMPT: &str = r#"Analyze these photos and provide a comprehensive appearance assessment.

Please evaluate the following aspects and provide:
1. An overall "Chop Score" from 0-100
2. Breakdown scores for each category (face, hair, skin, style, body) that sum to the total score
3. Constructive, friendly suggestions for improvement

Categories to evaluate:
- Face Harmony (0-25 points): facial symmetry, features, expressions
- Hair & Beard (0-25 points): style, grooming, suitability
- Skin (0-20 points): complexion, texture, care
- Style (0-20 points): clothing choices, fit, coordination
- Body (0-20 points): posture, proportions, presentation

Guidelines:
- Be constructive and encouraging
- Focus on actionable improvements
- Keep tone friendly and supportive
- Consider the number and types of photos provided
- If certain photos are missing, note this in suggestions

Respond with a JSON object in this exact format:
{
  "score": [0-100],
  "breakdown": {
    "face": [0-25],
    "hair": [0-25],
    "skin": [0-20],
    "style": [0-20],
    "body": [0-20]
  },
  "suggestions": {
    "face": "constructive suggestion for facial improvements",
    "hair": "constructive suggestion for hair/beard improvements",
    "skin": "constructive suggestion for skin care",
    "style": "constructive suggestion for style improvements",
    "body": "constructive suggestion for posture/body improvements"
  }
}"#;

/// Vision client errors
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Vision API key not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Completion contained no content")]
    EmptyCompletion,

    #[error("No JSON object found in completion")]
    NoJsonBlock,

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One uploaded photo, already read out of the multipart stream
#[derive(Debug, Clone)]
pub struct Photo {
    pub data: Vec<u8>,
    pub filename: Option<String>,
}

/// Rate limiter enforcing a minimum interval between upstream calls
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

// Chat-completions wire types (request side)

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// Chat-completions wire types (response side)

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// OpenAI-compatible vision-model client
pub struct VisionClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
}

impl VisionClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, VisionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| VisionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            model: config.vision_model.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }

    /// Whether an API key is configured (otherwise every request takes
    /// the mock path)
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Submit photos for scoring and pluck the raw analysis out of the
    /// model's reply
    pub async fn request_analysis(&self, photos: &[Photo]) -> Result<RawAnalysis, VisionError> {
        let api_key = self.api_key.as_deref().ok_or(VisionError::NotConfigured)?;

        self.rate_limiter.wait().await;

        let mut content = vec![ContentPart::Text {
            text: ANALYSIS_PROMPT,
        }];
        for photo in photos {
            content.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: data_url(&photo.data),
                },
            });
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(url = %url, photos = photos.len(), "Querying vision API");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| VisionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VisionError::Api(status.as_u16(), error_text));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| VisionError::Parse(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(VisionError::EmptyCompletion)?;

        // The model sometimes wraps the JSON in prose; take the first
        // '{' through the last '}'
        let block = extract_json_block(&content).ok_or(VisionError::NoJsonBlock)?;
        let value: serde_json::Value =
            serde_json::from_str(block).map_err(|e| VisionError::Parse(e.to_string()))?;

        tracing::info!(photos = photos.len(), "Received vision analysis");

        Ok(RawAnalysis::from_value(&value))
    }
}

/// Encode image bytes as a base64 data URL
fn data_url(bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", BASE64.encode(bytes))
}

/// Extract the outermost `{...}` block from free text
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}

/// Generate a stand-in analysis when the upstream model is unavailable
///
/// Intentionally random, unlike the normalizer it feeds: the base score
/// grows with photo count and wanders by up to ten points either way.
pub fn mock_analysis(photo_count: usize) -> RawAnalysis {
    let base = 60.0 + photo_count as f64 * 5.0;
    let variation = rand::thread_rng().gen_range(-10.0..=10.0);
    let total = (base + variation).round().clamp(0.0, 100.0);

    let mut raw = RawAnalysis {
        score: Some(total),
        ..Default::default()
    };
    raw.breakdown = [
        Some((total * 0.25).round()),
        Some((total * 0.20).round()),
        Some((total * 0.15).round()),
        Some((total * 0.20).round()),
        Some((total * 0.20).round()),
    ];
    raw.suggestions = [
        Some("Great facial features! Consider different lighting angles.".to_string()),
        Some("Your hair style suits you well. A trim could enhance it further.".to_string()),
        Some("Good skin condition. A moisturizer could add extra glow.".to_string()),
        Some("Nice style choices. Experiment with different fits.".to_string()),
        Some("Good posture! Standing tall makes a big difference.".to_string()),
    ];
    raw
}
