use serde::{Deserialize, Serialize};

pub(crate) fn default_true() -> bool {
    true
}

/// Envelope of every successful response
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// `?forceDelete=true` cascades the delete to dependent rows
#[derive(Debug, Clone, Copy, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    #[serde(default)]
    pub force_delete: bool,
}

/// Outcome of a delete that may have cascaded
#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_users_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_children_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_role_count: Option<u64>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
}
