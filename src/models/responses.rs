use serde::{Deserialize, Serialize};
use crate::models::domain::{MatchResult, StoreMatch};

/// Response for the recommend endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub recipes: Vec<MatchResult>,
    /// Absent when the store lookup failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stores: Option<Vec<StoreMatch>>,
    /// Set when the store lookup hit its deadline and `stores` is incomplete
    pub partial: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
    pub request_id: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub recipes: usize,
    pub stores: usize,
    pub stores_refreshed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
}
