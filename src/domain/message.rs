use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::session::{Principal, Role};

pub const MAX_MESSAGE_LEN: usize = 2000;

/// Identifies the conversation between one customer and one vendor principal.
///
/// Both parties derive the same key regardless of who sends, so the key is
/// always `customer:vendor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey(String);

impl ConversationKey {
    pub fn new(customer_id: Uuid, vendor_principal_id: Uuid) -> Self {
        Self(format!("{customer_id}:{vendor_principal_id}"))
    }

    /// Key for a conversation between `principal` and someone on the other side.
    pub fn between(principal: &Principal, counterpart_id: Uuid) -> Self {
        match principal.role {
            Role::Customer => Self::new(principal.id, counterpart_id),
            Role::Vendor => Self::new(counterpart_id, principal.id),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rebuilds a key read back from storage.
    pub fn from_stored(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub conversation_key: ConversationKey,
    pub sender_id: Uuid,
    pub sender_role: Role,
    pub receiver_id: Uuid,
    pub receiver_role: Role,
    pub order_id: Option<Uuid>,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_key: ConversationKey,
    pub sender_id: Uuid,
    pub sender_role: Role,
    pub receiver_id: Uuid,
    pub receiver_role: Role,
    pub order_id: Option<Uuid>,
    pub content: String,
}

impl NewMessage {
    pub fn compose(
        sender: &Principal,
        receiver_id: Uuid,
        content: &str,
        order_id: Option<Uuid>,
    ) -> Result<Self, DomainError> {
        if receiver_id == sender.id {
            return Err(DomainError::InvalidInput(
                "cannot send a message to yourself".into(),
            ));
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::InvalidInput("message must not be empty".into()));
        }
        if content.chars().count() > MAX_MESSAGE_LEN {
            return Err(DomainError::InvalidInput(format!(
                "message exceeds {MAX_MESSAGE_LEN} characters"
            )));
        }
        Ok(Self {
            conversation_key: ConversationKey::between(sender, receiver_id),
            sender_id: sender.id,
            sender_role: sender.role,
            receiver_id,
            receiver_role: sender.role.counterpart(),
            order_id,
            content: content.to_string(),
        })
    }
}
