use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::Identity;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    User,
    Content,
    Setting,
    System,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::User => "user",
            TargetType::Content => "content",
            TargetType::Setting => "setting",
            TargetType::System => "system",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(TargetType::User),
            "content" => Ok(TargetType::Content),
            "setting" => Ok(TargetType::Setting),
            "system" => Ok(TargetType::System),
            other => Err(AppError::Validation(format!(
                "Invalid target type: {}. Must be one of: user, content, setting, system",
                other
            ))),
        }
    }
}

/// One entry of the admin activity log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminActivity {
    pub id: String,
    pub user_id: String,
    pub user_display_name: String,
    pub action: String,
    pub target_type: TargetType,
    pub target_id: Option<String>,
    pub target_name: Option<String>,
    pub timestamp: String,
    pub details: Option<serde_json::Value>,
}

/// An activity about to be recorded.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: String,
    pub user_display_name: String,
    pub action: String,
    pub target_type: TargetType,
    pub target_id: Option<String>,
    pub target_name: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl NewActivity {
    pub fn new(actor: &Identity, action: impl Into<String>, target_type: TargetType) -> Self {
        Self {
            user_id: actor.id.clone(),
            user_display_name: actor.label().to_string(),
            action: action.into(),
            target_type,
            target_id: None,
            target_name: None,
            details: None,
        }
    }

    pub fn target(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.target_id = Some(id.into());
        self.target_name = Some(name.into());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
