//! Text summaries of computed metrics.
//!
//! [`TemplateSummarizer`] always produces the deterministic narrative.
//! An optional [`TextSummarizer`] (e.g. [`HttpSummarizer`]) may add prose;
//! the orchestrator bounds it with a timeout and substitutes
//! [`FALLBACK_SUMMARY`] when it fails.

use std::time::Duration;

use async_trait::async_trait;
use landcover_common::{AnalysisIntent, ValidatedQuery, VisualizationKind, NO_DATA_CODE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::SummarizerError;
use crate::metrics::{MetricsTable, YearMetrics};

/// Text used in place of generated prose when the summariser fails.
pub const FALLBACK_SUMMARY: &str = "An automated narrative could not be generated for this \
     query; the statistics above were computed from the raster data.";

/// Structured input handed to a summariser.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRequest {
    pub intent: AnalysisIntent,
    pub intent_label: String,
    pub variables: Vec<String>,
    pub years: Vec<i32>,
    pub missing_years: Vec<i32>,
    pub metrics: Vec<YearMetrics>,
    pub visualizations: Vec<VisualizationKind>,
    pub comment: Option<String>,
}

impl SummaryRequest {
    pub fn new(
        query: &ValidatedQuery,
        metrics: &MetricsTable,
        visualizations: Vec<VisualizationKind>,
    ) -> Self {
        Self {
            intent: query.intent,
            intent_label: query.intent.label().to_string(),
            variables: query.categories.iter().map(|c| c.name.clone()).collect(),
            years: query.years.clone(),
            missing_years: metrics.missing_years(),
            metrics: metrics.entries().to_vec(),
            visualizations,
            comment: query.comment.clone(),
        }
    }
}

/// Produces prose from metrics. Implementations may fail; callers decide
/// the fallback.
#[async_trait]
pub trait TextSummarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizerError>;
}

fn join_years(years: &[i32]) -> String {
    let years: Vec<String> = years.iter().map(|y| y.to_string()).collect();
    match years.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    }
}

/// Deterministic narrative built from the metrics alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSummarizer;

impl TemplateSummarizer {
    pub fn narrative(&self, query: &ValidatedQuery, metrics: &MetricsTable) -> String {
        let missing = metrics.missing_years();
        if metrics.all_missing() {
            return format!(
                "No land-cover data is available for {}, \
                 so no statistics or charts could be produced.",
                join_years(&missing)
            );
        }

        let labels: Vec<&str> = query.categories.iter().map(|c| c.label.as_str()).collect();
        let mut parts = vec![format!(
            "{} of {} for {}.",
            query.intent.label(),
            labels.join(", "),
            join_years(&query.years)
        )];

        let available = metrics.available_years();
        for &year in &available {
            for category in &query.categories {
                let Some(m) = metrics.get(year, category.code) else {
                    continue;
                };
                let whole = if category.code == NO_DATA_CODE {
                    "the raster"
                } else {
                    "classified land"
                };
                let share = metrics
                    .pixel_share(year, category.code)
                    .map(|pct| format!(", {:.1}% of {}", pct, whole))
                    .unwrap_or_default();
                parts.push(format!(
                    "In {}, {} covered {} km² ({} pixels{}).",
                    year,
                    category.label,
                    m.area_display(),
                    m.pixel_count,
                    share
                ));
            }
        }

        if let [first, .., last] = available.as_slice() {
            for category in &query.categories {
                if let Some(change) = metrics.change_between(*first, *last, category.code) {
                    let direction = if change.delta_km2 > 0.0 {
                        "increased"
                    } else if change.delta_km2 < 0.0 {
                        "decreased"
                    } else {
                        "did not change"
                    };
                    let mut sentence = format!(
                        "Between {} and {}, {} area {}",
                        first, last, category.label, direction
                    );
                    if change.delta_km2 != 0.0 {
                        sentence.push_str(&format!(" by {:.2} km²", change.delta_km2.abs()));
                        if let Some(pct) = change.percent {
                            sentence.push_str(&format!(" ({:+.1}%)", pct));
                        }
                    }
                    sentence.push('.');
                    parts.push(sentence);
                }
            }
        }

        if !missing.is_empty() {
            parts.push(format!(
                "No data was found for {}; results cover {} only.",
                join_years(&missing),
                join_years(&available)
            ));
        }

        parts.join(" ")
    }
}

/// Chat-completions client for an external text-generation service.
pub struct HttpSummarizer {
    client: Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

const SYSTEM_PROMPT: &str = "You are a land-cover analyst. Summarise the supplied raster \
     statistics in a short paragraph for a non-specialist. Mention missing years if any. \
     Do not invent numbers.";

impl HttpSummarizer {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SummarizerError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
            model: model.into(),
        })
    }
}

impl std::fmt::Debug for HttpSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSummarizer")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TextSummarizer for HttpSummarizer {
    #[instrument(skip(self, request), fields(url = %self.url))]
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizerError> {
        let mut user = serde_json::to_string(request)?;
        if let Some(comment) = &request.comment {
            user.push_str("\nUser comment: ");
            user.push_str(comment);
        }
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let mut http = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }
        let response = http.send().await?;
        if !response.status().is_success() {
            return Err(SummarizerError::Status(response.status().as_u16()));
        }
        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(SummarizerError::EmptyResponse)?;
        debug!(chars = text.len(), "Summariser returned text");
        Ok(text)
    }
}

/// Run `summarizer` with a deadline; any failure yields the fallback text.
pub async fn summarize_or_fallback(
    summarizer: &dyn TextSummarizer,
    request: &SummaryRequest,
    timeout: Duration,
) -> String {
    let outcome = match tokio::time::timeout(timeout, summarizer.summarize(request)).await {
        Ok(result) => result,
        Err(_) => Err(SummarizerError::Timeout(timeout)),
    };
    match outcome {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Summariser failed; using fallback text");
            FALLBACK_SUMMARY.to_string()
        }
    }
}
