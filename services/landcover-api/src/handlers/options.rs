//! `GET /get_config`: options for client forms.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use landcover_common::{IntentOption, VariableOption};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub variables: Vec<VariableOption>,
    pub analysis_types: Vec<IntentOption>,
    pub years: Vec<i32>,
}

/// GET /get_config
pub async fn config_handler(Extension(state): Extension<Arc<AppState>>) -> Json<ConfigResponse> {
    let catalog = state.catalog();
    Json(ConfigResponse {
        variables: catalog
            .variable_options()
            .into_iter()
            .filter(|v| v.value != "no_data")
            .collect(),
        analysis_types: catalog.intents.clone(),
        years: catalog.years.clone(),
    })
}
