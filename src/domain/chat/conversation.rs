//! Conversation entity and its context blob.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::{ConversationId, Timestamp, UserId, UserRole};

/// Context attached to a conversation when it is created.
///
/// The known fields feed the system prompt; `additional_data` is an opaque
/// key-value bag that is stored and passed through unmodified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<Map<String, Value>>,
}

impl ConversationContext {
    /// Returns true when none of the prompt-relevant fields is present.
    pub fn is_empty(&self) -> bool {
        self.page.is_none() && self.event_id.is_none() && self.user_role.is_none()
    }
}

/// A titled, timestamped thread of ordered messages owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: UserId,
    /// Set exactly once, after the first exchange.
    pub title: Option<String>,
    pub context: ConversationContext,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Conversation {
    /// Creates a new untitled conversation carrying the supplied context.
    pub fn new(user_id: UserId, context: ConversationContext) -> Self {
        let now = Timestamp::now();
        Self {
            id: ConversationId::new(),
            user_id,
            title: None,
            context,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_conversation_is_untitled() {
        let conv = Conversation::new(
            UserId::new("demo-user").unwrap(),
            ConversationContext::default(),
        );
        assert!(conv.title.is_none());
        assert_eq!(conv.created_at, conv.updated_at);
    }

    #[test]
    fn context_serializes_camel_case_and_skips_absent_fields() {
        let context = ConversationContext {
            page: Some("leaderboard".to_string()),
            event_id: None,
            user_role: Some(UserRole::Judge),
            additional_data: None,
        };

        let json = serde_json::to_string(&context).unwrap();
        assert!(json.contains("\"page\":\"leaderboard\""));
        assert!(json.contains("\"userRole\":\"JUDGE\""));
        assert!(!json.contains("eventId"));
        assert!(!json.contains("additionalData"));
    }

    #[test]
    fn context_passes_additional_data_through_unmodified() {
        let raw = r#"{"page":"dashboard","additionalData":{"theme":"dark","tab":3}}"#;
        let context: ConversationContext = serde_json::from_str(raw).unwrap();

        let extra = context.additional_data.as_ref().unwrap();
        assert_eq!(extra.get("theme"), Some(&Value::from("dark")));
        assert_eq!(extra.get("tab"), Some(&Value::from(3)));
    }

    #[test]
    fn context_is_empty_ignores_additional_data() {
        let context = ConversationContext {
            additional_data: Some(Map::new()),
            ..Default::default()
        };
        assert!(context.is_empty());
    }
}
