//! Social, invitation and challenge row schemas

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tokens::TokenSymbol;

pub const PEER_RECOGNITION_TABLE: &str = "peer_recognition";
pub const NOTIFICATIONS_TABLE: &str = "notifications";
pub const POSTS_TABLE: &str = "posts";
pub const EVENTS_TABLE: &str = "events";
pub const MESSAGES_TABLE: &str = "messages";
pub const INVITATIONS_TABLE: &str = "invitations";
pub const CHALLENGES_TABLE: &str = "challenges";

/// Thanks sent from one member to another
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PeerRecognition {
    pub sender_id: String,
    pub recipient_id: String,
    pub message: String,
    #[serde(default)]
    pub token_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// In-app notification
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Notification {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn recognition(recipient_id: &str, sender_name: &str, message: &str) -> Self {
        Self {
            user_id: recipient_id.to_string(),
            kind: "recognition".to_string(),
            title: format!("{} recognized you", sender_name),
            body: message.to_string(),
            is_read: false,
            created_at: None,
        }
    }
}

/// Community feed post
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
}

/// Chat message
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub sender_id: String,
    #[serde(default)]
    pub recipient_id: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Invitation code issued by a member
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Invitation {
    pub code: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Daily challenge definition
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub token_type: TokenSymbol,
    #[serde(default)]
    pub reward_amount: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}
