//! `POST /chat`: run one analysis query.
//!
//! The body is accepted in the shapes browser clients send: the intent as
//! `analysisType` or `intent`, variables as one string or a list, years
//! as numbers or numeric strings. Semantic problems are answered with
//! status 200 and the message as `text`; only undecodable bodies get 400.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use landcover_common::{AnalysisResult, Query, QueryError};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn, Span};
use uuid::Uuid;

use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A single value or a list of values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

/// A year given as a JSON number or string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum YearValue {
    Number(i64),
    Text(String),
}

impl YearValue {
    fn to_year(&self) -> Result<i32, QueryError> {
        match self {
            YearValue::Number(n) => {
                i32::try_from(*n).map_err(|_| QueryError::InvalidYear(n.to_string()))
            }
            YearValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| QueryError::InvalidYear(s.clone())),
        }
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default, alias = "analysisType", alias = "analysis_type")]
    pub intent: Option<String>,
    #[serde(default, alias = "variable")]
    pub variables: OneOrMany<String>,
    #[serde(default)]
    pub years: OneOrMany<YearValue>,
    #[serde(default, alias = "comment")]
    pub comments: Option<String>,
}

impl ChatRequest {
    /// Convert into a core query; only year values can fail here.
    pub fn into_query(self) -> Result<Query, QueryError> {
        let years = self
            .years
            .into_vec()
            .iter()
            .map(YearValue::to_year)
            .collect::<Result<Vec<_>, _>>()?;
        let mut query = Query::new(
            self.intent.unwrap_or_default(),
            self.variables.into_vec(),
            years,
        );
        query.comment = self.comments;
        Ok(query)
    }
}

/// Body of every `/chat` answer.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

fn respond(status: StatusCode, request_id: Uuid, result: AnalysisResult) -> Response {
    let mut response = (status, Json(ChatResponse { request_id, result })).into_response();
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// POST /chat
#[instrument(skip_all, fields(request_id = tracing::field::Empty))]
pub async fn chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    Span::current().record("request_id", &tracing::field::display(&request_id));

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected chat body");
            metrics::counter!("landcover_chat_bad_requests_total").increment(1);
            return respond(
                StatusCode::BAD_REQUEST,
                request_id,
                AnalysisResult::text_only(format!("Invalid request: {}", rejection.body_text())),
            );
        }
    };

    let query = match request.into_query() {
        Ok(query) => query,
        Err(e) => {
            info!(reason = e.code(), "Query rejected");
            return respond(StatusCode::OK, request_id, AnalysisResult::text_only(e.user_message()));
        }
    };

    let result = state.orchestrator.handle(&query).await;
    respond(StatusCode::OK, request_id, result)
}
