// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, FromRow)]
pub struct User {
    #[serde(default)]
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Accepted on input, stored as a bcrypt hash, never serialized back out.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

pub const DEFAULT_SUBSCRIPTION_LEVEL: &str = "bronze";

fn default_subscription_level() -> String {
    DEFAULT_SUBSCRIPTION_LEVEL.to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, FromRow)]
pub struct Subscriber {
    #[serde(default)]
    pub id: i32,
    pub user_id: i32,
    /// Serialized under the column name; `status` is accepted on input only.
    #[serde(default, alias = "status")]
    pub status_subscription: String,
    #[serde(default)]
    pub number_subscriptions: i32,
    #[serde(default = "Utc::now")]
    pub subscription_time: DateTime<Utc>,
    #[serde(default)]
    pub subscriptions_in_row: i32,
    #[serde(default = "default_subscription_level")]
    pub subscription_level: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, FromRow)]
pub struct Message {
    #[serde(default)]
    pub id: i32,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, FromRow)]
pub struct Mail {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    #[sqlx(rename = "to_list")]
    pub to: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default = "Utc::now")]
    pub sent_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateLevelRequest {
    #[serde(default)]
    pub subscription_level: String,
}
