use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::domain::message::{ConversationKey, Message};

/// Fan-out of committed messages to live subscribers, one bounded channel per
/// conversation. Subscribers only ever see their own conversation.
pub struct MessageHub {
    capacity: usize,
    channels: Mutex<HashMap<ConversationKey, broadcast::Sender<Message>>>,
}

impl MessageHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<ConversationKey, broadcast::Sender<Message>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, key: &ConversationKey) -> broadcast::Receiver<Message> {
        let mut channels = self.channels();
        match channels.get(key) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = broadcast::channel(self.capacity);
                channels.insert(key.clone(), sender);
                receiver
            }
        }
    }

    /// Returns how many subscribers received the message.
    pub fn publish(&self, message: &Message) -> usize {
        let mut channels = self.channels();
        channels.retain(|_, sender| sender.receiver_count() > 0);
        match channels.get(&message.conversation_key) {
            Some(sender) => sender.send(message.clone()).unwrap_or(0),
            None => 0,
        }
    }

    pub fn open_channels(&self) -> usize {
        self.channels().len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::session::Role;

    fn message(key: &ConversationKey, content: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_key: key.clone(),
            sender_id: Uuid::new_v4(),
            sender_role: Role::Customer,
            receiver_id: Uuid::new_v4(),
            receiver_role: Role::Vendor,
            order_id: None,
            content: content.into(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_only_receive_their_conversation() {
        let hub = MessageHub::new(8);
        let ours = ConversationKey::new(Uuid::new_v4(), Uuid::new_v4());
        let theirs = ConversationKey::new(Uuid::new_v4(), Uuid::new_v4());
        let mut rx = hub.subscribe(&ours);
        let _other = hub.subscribe(&theirs);

        assert_eq!(hub.publish(&message(&theirs, "not for you")), 1);
        assert_eq!(hub.publish(&message(&ours, "hello")), 1);

        assert_eq!(rx.recv().await.unwrap().content, "hello");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn slow_subscriber_is_told_it_lagged() {
        let hub = MessageHub::new(2);
        let key = ConversationKey::new(Uuid::new_v4(), Uuid::new_v4());
        let mut rx = hub.subscribe(&key);
        for i in 0..4 {
            hub.publish(&message(&key, &format!("m{i}")));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        assert_eq!(rx.recv().await.unwrap().content, "m2");
    }

    #[test]
    fn abandoned_channels_are_pruned_on_publish() {
        let hub = MessageHub::new(4);
        let key = ConversationKey::new(Uuid::new_v4(), Uuid::new_v4());
        drop(hub.subscribe(&key));
        assert_eq!(hub.open_channels(), 1);

        assert_eq!(hub.publish(&message(&key, "anyone?")), 0);
        assert_eq!(hub.open_channels(), 0);
    }
}
