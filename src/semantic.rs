//! Optional narrowing of the vocabulary by a natural-language criterion.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::FilterError;
use crate::settings::Settings;

pub const MAX_CRITERION_LENGTH: usize = 250;
/// Words sent to the service per request.
pub const MAX_VOCABULARY: usize = 1000;
/// Service answers shorter than this are dropped, a stricter floor than the
/// tokenizer's.
pub const MIN_FILTERED_WORD_LENGTH: usize = 4;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const CREDENTIAL_PREFIX: &str = "sk-";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str = "You are a text filtering assistant. Given a list of words and \
filtering criteria, return ONLY the words that match the criteria as a comma-separated list. \
Do not include explanations or additional text.";

/// A sanitized filter criterion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Criterion(String);

impl Criterion {
    /// Drops control characters, collapses whitespace and enforces the length cap.
    pub fn parse(raw: &str) -> Result<Self, FilterError> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_control() || c.is_whitespace())
            .collect();
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

        let length = collapsed.chars().count();
        if length > MAX_CRITERION_LENGTH {
            return Err(FilterError::PromptTooLong {
                length,
                max: MAX_CRITERION_LENGTH,
            });
        }
        Ok(Criterion(collapsed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[async_trait]
pub trait VocabularyFilter: Send + Sync {
    /// Returns the words judged to match `criterion`. Implementations may return
    /// anything; callers narrow the answer with [`narrow_vocabulary`].
    async fn filter(&self, words: &[String], criterion: &Criterion)
        -> Result<Vec<String>, FilterError>;
}

/// Runs `filter` over at most [`MAX_VOCABULARY`] words and keeps only answers that
/// were part of the request.
pub async fn run_semantic_filter(
    filter: &dyn VocabularyFilter,
    vocabulary: &[String],
    criterion: &Criterion,
) -> Result<Vec<String>, FilterError> {
    let request = &vocabulary[..vocabulary.len().min(MAX_VOCABULARY)];
    if request.len() < vocabulary.len() {
        warn!(
            "Vocabulary truncated for semantic filter - sent={}, total={}",
            request.len(),
            vocabulary.len()
        );
    }

    let answer = filter.filter(request, criterion).await?;
    let retained = narrow_vocabulary(request, &answer)?;

    info!(
        "Semantic filter completed - sent={}, answered={}, retained={}",
        request.len(),
        answer.len(),
        retained.len()
    );
    Ok(retained)
}

/// Intersects a service answer with the vocabulary it was given.
///
/// Entries are normalized to lowercase alphanumerics first. The result follows
/// vocabulary order and never contains a word outside `vocabulary`.
pub fn narrow_vocabulary(
    vocabulary: &[String],
    answer: &[String],
) -> Result<Vec<String>, FilterError> {
    let answered: HashSet<String> = answer.iter().map(|word| normalize(word)).collect();

    let mut seen = HashSet::new();
    let retained: Vec<String> = vocabulary
        .iter()
        .filter(|word| answered.contains(word.as_str()) && seen.insert(word.as_str()))
        .cloned()
        .collect();

    if retained.is_empty() {
        return Err(FilterError::EmptyResult);
    }
    Ok(retained)
}

/// Splits a comma/whitespace separated answer into normalized words of at least
/// [`MIN_FILTERED_WORD_LENGTH`] characters.
pub fn parse_word_list(content: &str) -> Vec<String> {
    content
        .to_lowercase()
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(normalize)
        .filter(|word| word.len() >= MIN_FILTERED_WORD_LENGTH)
        .collect()
}

fn normalize(word: &str) -> String {
    word.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Cheap format check before any network traffic.
pub fn validate_credential(credential: Option<&str>) -> Result<&str, FilterError> {
    let key = credential
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(FilterError::CredentialMissing)?;

    if !key.starts_with(CREDENTIAL_PREFIX) {
        return Err(FilterError::CredentialInvalid(format!(
            "API key should start with \"{CREDENTIAL_PREFIX}\""
        )));
    }
    Ok(key)
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Filter backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiFilter {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: Client,
}

impl OpenAiFilter {
    pub fn new(api_key: &str) -> Result<Self, FilterError> {
        let api_key = validate_credential(Some(api_key))?.to_string();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FilterError::Service(e.to_string()))?;

        Ok(OpenAiFilter {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 2000,
            client,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, FilterError> {
        let key = validate_credential(settings.credential.as_deref())?;
        Self::new(key)
    }

    /// Points the filter at another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/v1/models", self.base_url)
    }

    fn build_request(&self, words: &[String], criterion: &Criterion) -> ChatRequest {
        let word_list = words.join(", ");
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Filter these words based on: \"{}\"\n\nWords: {}\n\nReturn only the matching words as a comma-separated list.",
                        criterion.as_str(),
                        word_list
                    ),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Checks the key against the service with a cheap authenticated request.
    pub async fn verify_credential(&self) -> Result<bool, FilterError> {
        let response = self
            .client
            .get(self.models_url())
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| FilterError::Service(format!("Network error: {e}")))?;

        debug!("Credential check - status={}", response.status());
        Ok(response.status().is_success())
    }
}

async fn error_message(response: reqwest::Response) -> Option<String> {
    let body: ErrorBody = response.json().await.ok()?;
    body.error?.message
}

#[async_trait]
impl VocabularyFilter for OpenAiFilter {
    async fn filter(
        &self,
        words: &[String],
        criterion: &Criterion,
    ) -> Result<Vec<String>, FilterError> {
        let request = self.build_request(words, criterion);
        debug!(
            "Semantic filter request - model={}, words={}",
            request.model,
            words.len()
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| FilterError::Service(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            warn!("Semantic filter rejected - status={}", status);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FilterError::CredentialInvalid(
                    message.unwrap_or_else(|| "rejected by the service".to_string()),
                ),
                _ => FilterError::Service(
                    message.unwrap_or_else(|| "API request failed".to_string()),
                ),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| FilterError::Service(format!("Malformed response: {e}")))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| FilterError::Service("Empty response from AI service".to_string()))?;

        Ok(parse_word_list(content.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn criterion_is_sanitized() {
        let criterion = Criterion::parse("  only\u{0000} fruit\t\tand\n\n\nvegetables \u{007f}").unwrap();
        assert_eq!(criterion.as_str(), "only fruit and vegetables");
    }

    #[test]
    fn criterion_length_is_capped() {
        let raw = "a".repeat(MAX_CRITERION_LENGTH + 1);
        assert_eq!(
            Criterion::parse(&raw),
            Err(FilterError::PromptTooLong {
                length: 251,
                max: 250
            })
        );
        assert!(Criterion::parse(&"a".repeat(MAX_CRITERION_LENGTH)).is_ok());
    }

    #[test]
    fn narrowing_discards_words_outside_vocabulary() {
        let vocabulary = words(&["apple", "banana", "car"]);
        let retained = narrow_vocabulary(&vocabulary, &words(&["apple", "car", "extraword"])).unwrap();
        assert_eq!(retained, words(&["apple", "car"]));
    }

    #[test]
    fn narrowing_normalizes_answers() {
        let vocabulary = words(&["apple", "banana"]);
        let retained = narrow_vocabulary(&vocabulary, &words(&["\"Apple.\"", "BANANA", "apple"])).unwrap();
        assert_eq!(retained, words(&["apple", "banana"]));
    }

    #[test]
    fn nothing_matched_is_empty_result() {
        let vocabulary = words(&["apple"]);
        assert_eq!(
            narrow_vocabulary(&vocabulary, &words(&["pear"])),
            Err(FilterError::EmptyResult)
        );
    }

    #[test]
    fn word_list_parsing_applies_the_length_floor() {
        let parsed = parse_word_list("Apple, car,\nkiwi  banana!, x1y2, re-use");
        assert_eq!(parsed, words(&["apple", "kiwi", "banana", "x1y2", "reuse"]));
        assert!(parsed
            .iter()
            .all(|w| w.len() >= 4 && w.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())));
    }

    #[test]
    fn credential_checks_happen_locally() {
        assert_eq!(validate_credential(None), Err(FilterError::CredentialMissing));
        assert_eq!(validate_credential(Some("  ")), Err(FilterError::CredentialMissing));
        assert!(matches!(
            validate_credential(Some("pk-123")),
            Err(FilterError::CredentialInvalid(_))
        ));
        assert_eq!(validate_credential(Some(" sk-abc ")), Ok("sk-abc"));
    }

    #[test]
    fn request_carries_criterion_and_words() {
        let filter = OpenAiFilter::new("sk-test").unwrap();
        let criterion = Criterion::parse("fruit").unwrap();
        let request = filter.build_request(&words(&["apple", "car"]), &criterion);

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.messages.len(), 2);
        assert!(request.messages[1].content.contains("\"fruit\""));
        assert!(request.messages[1].content.contains("Words: apple, car"));
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let filter = OpenAiFilter::new("sk-test")
            .unwrap()
            .with_base_url("http://localhost:8080/");
        assert_eq!(filter.completions_url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(filter.models_url(), "http://localhost:8080/v1/models");
    }
}
