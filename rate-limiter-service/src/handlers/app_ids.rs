use crate::startup::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppIdsResponse {
    #[serde(rename = "applicationIDs")]
    pub application_ids: Vec<String>,
}

/// Applications over their daily limit for longer than the grace period.
pub async fn get_app_ids(State(state): State<AppState>) -> Json<AppIdsResponse> {
    Json(AppIdsResponse {
        application_ids: state.cache.app_ids_passed_limit(),
    })
}
