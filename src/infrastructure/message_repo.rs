use diesel::dsl::count_star;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::events::PendingEvent;
use crate::domain::message::{ConversationKey, Message, NewMessage};
use crate::domain::ports::MessageRepository;
use crate::schema::messages;

use super::change_feed;
use super::models::{MessageRow, NewMessageRow};

pub struct DieselMessageRepository {
    pool: DbPool,
}

impl DieselMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl MessageRepository for DieselMessageRepository {
    fn insert(&self, message: NewMessage) -> Result<Message, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row: MessageRow = diesel::insert_into(messages::table)
                .values(&NewMessageRow {
                    id: Uuid::new_v4(),
                    conversation_key: message.conversation_key.to_string(),
                    sender_id: message.sender_id,
                    sender_role: message.sender_role.as_str().to_string(),
                    receiver_id: message.receiver_id,
                    receiver_role: message.receiver_role.as_str().to_string(),
                    order_id: message.order_id,
                    content: message.content.clone(),
                })
                .get_result(conn)?;
            let sent = Message::try_from(row)?;
            change_feed::record(conn, PendingEvent::message_sent(&sent))?;
            Ok(sent)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = messages::table
            .find(id)
            .select(MessageRow::as_select())
            .first::<MessageRow>(&mut conn)
            .optional()?;
        row.map(Message::try_from).transpose()
    }

    fn list_conversation(&self, key: &ConversationKey) -> Result<Vec<Message>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = messages::table
            .filter(messages::conversation_key.eq(key.as_str()))
            .select(MessageRow::as_select())
            .order((messages::created_at.asc(), messages::id.asc()))
            .load::<MessageRow>(&mut conn)?;
        rows.into_iter().map(Message::try_from).collect()
    }

    fn mark_read(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(
            messages::table
                .filter(messages::id.eq(id))
                .filter(messages::is_read.eq(false)),
        )
        .set(messages::is_read.eq(true))
        .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn unread_count(&self, receiver_id: Uuid) -> Result<i64, DomainError> {
        let mut conn = self.pool.get()?;
        let count = messages::table
            .filter(messages::receiver_id.eq(receiver_id))
            .filter(messages::is_read.eq(false))
            .select(count_star())
            .first::<i64>(&mut conn)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::DieselMessageRepository;
    use crate::domain::message::{ConversationKey, NewMessage};
    use crate::domain::ports::MessageRepository;
    use crate::domain::session::Principal;
    use crate::infrastructure::test_support::setup_db;

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn conversation_is_listed_oldest_first_and_isolated() {
        let (_container, pool) = setup_db().await;
        let repo = DieselMessageRepository::new(pool);
        let customer = Principal::customer(Uuid::new_v4());
        let vendor = Principal::vendor(Uuid::new_v4());
        let stranger = Principal::customer(Uuid::new_v4());

        for (from, to, text) in [
            (&customer, vendor.id, "is the 13kg in stock?"),
            (&vendor, customer.id, "yes"),
            (&stranger, vendor.id, "hello"),
        ] {
            repo.insert(NewMessage::compose(from, to, text, None).unwrap())
                .expect("insert");
        }

        let key = ConversationKey::between(&customer, vendor.id);
        let thread = repo.list_conversation(&key).expect("list");
        let texts: Vec<&str> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["is the 13kg in stock?", "yes"]);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn mark_read_is_idempotent_and_updates_unread_count() {
        let (_container, pool) = setup_db().await;
        let repo = DieselMessageRepository::new(pool);
        let customer = Principal::customer(Uuid::new_v4());
        let vendor_id = Uuid::new_v4();

        let sent = repo
            .insert(NewMessage::compose(&customer, vendor_id, "ping", None).unwrap())
            .expect("insert");
        assert_eq!(repo.unread_count(vendor_id).expect("count"), 1);

        assert!(repo.mark_read(sent.id).expect("first mark"));
        assert!(!repo.mark_read(sent.id).expect("second mark"));
        assert_eq!(repo.unread_count(vendor_id).expect("count"), 0);
    }
}
