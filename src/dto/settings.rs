use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::Setting;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpsertSettingRequest {
    pub key: String,
    pub value: String,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkSettingsRequest {
    pub settings: Vec<UpsertSettingRequest>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SettingsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SettingList {
    #[schema(value_type = Vec<Setting>)]
    pub items: Vec<Setting>,
}

/// Public settings flattened to `key -> value`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct PublicSettings {
    #[schema(value_type = BTreeMap<String, String>)]
    pub values: BTreeMap<String, String>,
}
