use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::message::{ConversationKey, Message, NewMessage};
use crate::domain::ports::{MessageRepository, OrderRepository};
use crate::domain::session::{Principal, Role};

use super::message_hub::MessageHub;
use super::profile_service::ProfileService;

#[derive(Clone)]
pub struct MessagingService {
    messages: Arc<dyn MessageRepository>,
    orders: Arc<dyn OrderRepository>,
    profiles: ProfileService,
    hub: Arc<MessageHub>,
}

impl MessagingService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        orders: Arc<dyn OrderRepository>,
        profiles: ProfileService,
        hub: Arc<MessageHub>,
    ) -> Self {
        Self {
            messages,
            orders,
            profiles,
            hub,
        }
    }

    /// A message may only reference an order placed between its two parties.
    /// Senders outside the order get the same answer as for a missing one.
    fn check_order_link(
        &self,
        principal: &Principal,
        receiver_id: Uuid,
        order_id: Uuid,
    ) -> Result<(), DomainError> {
        let order = self
            .orders
            .find_by_id(order_id)?
            .ok_or(DomainError::NotFound("Order"))?;
        let vendor_owner = self.profiles.vendor(order.vendor_id)?.owner_id;
        let (own_side, other_side) = match principal.role {
            Role::Customer => (order.customer_id, vendor_owner),
            Role::Vendor => (vendor_owner, order.customer_id),
        };
        if own_side != principal.id {
            return Err(DomainError::NotFound("Order"));
        }
        if other_side != receiver_id {
            return Err(DomainError::InvalidInput(
                "order does not belong to this conversation".into(),
            ));
        }
        Ok(())
    }

    /// Stores the message, then pushes it to live subscribers of the
    /// conversation. Publishing happens only after the insert committed.
    pub fn send(
        &self,
        principal: &Principal,
        receiver_id: Uuid,
        content: &str,
        order_id: Option<Uuid>,
    ) -> Result<Message, DomainError> {
        let message = NewMessage::compose(principal, receiver_id, content, order_id)?;
        if let Some(order_id) = order_id {
            self.check_order_link(principal, receiver_id, order_id)?;
        }
        let sent = self.messages.insert(message)?;
        let delivered = self.hub.publish(&sent);
        log::debug!(
            "Message {} in {} pushed to {} subscriber(s)",
            sent.id,
            sent.conversation_key,
            delivered
        );
        Ok(sent)
    }

    pub fn conversation(
        &self,
        principal: &Principal,
        counterpart_id: Uuid,
    ) -> Result<Vec<Message>, DomainError> {
        self.messages
            .list_conversation(&ConversationKey::between(principal, counterpart_id))
    }

    pub fn subscribe(
        &self,
        principal: &Principal,
        counterpart_id: Uuid,
    ) -> Result<broadcast::Receiver<Message>, DomainError> {
        if counterpart_id == principal.id {
            return Err(DomainError::InvalidInput(
                "cannot subscribe to a conversation with yourself".into(),
            ));
        }
        Ok(self
            .hub
            .subscribe(&ConversationKey::between(principal, counterpart_id)))
    }

    /// Returns whether the message was unread before this call.
    pub fn mark_read(&self, principal: &Principal, id: Uuid) -> Result<bool, DomainError> {
        let message = self
            .messages
            .find_by_id(id)?
            .ok_or(DomainError::NotFound("Message"))?;
        if message.receiver_id != principal.id {
            return Err(DomainError::Forbidden(
                "only the receiver can mark a message as read".into(),
            ));
        }
        self.messages.mark_read(id)
    }

    pub fn unread_count(&self, principal: &Principal) -> Result<i64, DomainError> {
        self.messages.unread_count(principal.id)
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::order::NewOrder;
    use crate::domain::ports::ChangeFeed;
    use crate::infrastructure::memory::InMemoryStore;

    fn setup() -> (Arc<InMemoryStore>, MessagingService) {
        let store = Arc::new(InMemoryStore::new());
        let svc = MessagingService::new(
            store.clone(),
            store.clone(),
            ProfileService::new(store.clone()),
            Arc::new(MessageHub::new(16)),
        );
        (store, svc)
    }

    /// A pending order from `customer` to the business owned by `vendor`.
    fn order_between(store: &Arc<InMemoryStore>, customer: &Principal, vendor: &Principal) -> Uuid {
        let vendor_id = ProfileService::new(store.clone())
            .own_vendor(vendor)
            .unwrap()
            .id;
        OrderRepository::create(
            store.as_ref(),
            NewOrder {
                customer_id: customer.id,
                vendor_id,
                service_id: Uuid::new_v4(),
                quantity: 1,
                scheduled_time: None,
                total_price: BigDecimal::from(25),
                delivery_address: "7 Kenyatta Ave".into(),
                notes: None,
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn both_parties_read_the_same_thread() {
        let (_, svc) = setup();
        let customer = Principal::customer(Uuid::new_v4());
        let vendor = Principal::vendor(Uuid::new_v4());

        svc.send(&customer, vendor.id, "do you deliver on Sunday?", None)
            .unwrap();
        svc.send(&vendor, customer.id, "yes, until noon", None)
            .unwrap();

        let seen_by_customer = svc.conversation(&customer, vendor.id).unwrap();
        let seen_by_vendor = svc.conversation(&vendor, customer.id).unwrap();
        assert_eq!(seen_by_customer, seen_by_vendor);
        assert_eq!(seen_by_customer[0].content, "do you deliver on Sunday?");
        assert_eq!(seen_by_customer[1].content, "yes, until noon");
    }

    #[test]
    fn sending_records_a_change_event() {
        let (store, svc) = setup();
        let customer = Principal::customer(Uuid::new_v4());
        let vendor_id = Uuid::new_v4();
        let sent = svc.send(&customer, vendor_id, "hi", None).unwrap();

        let events = store.events_for(sent.conversation_key.as_str()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "MessageSent");
    }

    #[tokio::test]
    async fn subscriber_receives_messages_after_commit() {
        let (_, svc) = setup();
        let customer = Principal::customer(Uuid::new_v4());
        let vendor = Principal::vendor(Uuid::new_v4());
        let mut rx = svc.subscribe(&vendor, customer.id).unwrap();

        let sent = svc.send(&customer, vendor.id, "order placed", None).unwrap();

        assert_eq!(rx.recv().await.unwrap(), sent);
    }

    #[test]
    fn only_the_receiver_marks_read() {
        let (_, svc) = setup();
        let customer = Principal::customer(Uuid::new_v4());
        let vendor = Principal::vendor(Uuid::new_v4());
        let sent = svc.send(&customer, vendor.id, "ping", None).unwrap();

        assert!(matches!(
            svc.mark_read(&customer, sent.id),
            Err(DomainError::Forbidden(_))
        ));
        assert_eq!(svc.unread_count(&vendor).unwrap(), 1);
        assert!(svc.mark_read(&vendor, sent.id).unwrap());
        assert!(!svc.mark_read(&vendor, sent.id).unwrap());
        assert_eq!(svc.unread_count(&vendor).unwrap(), 0);
    }

    #[test]
    fn unknown_message_is_not_found() {
        let (_, svc) = setup();
        assert!(matches!(
            svc.mark_read(&Principal::vendor(Uuid::new_v4()), Uuid::new_v4()),
            Err(DomainError::NotFound("Message"))
        ));
    }

    #[test]
    fn messages_can_reference_their_order() {
        let (store, svc) = setup();
        let customer = Principal::customer(Uuid::new_v4());
        let vendor = Principal::vendor(Uuid::new_v4());
        let order_id = order_between(&store, &customer, &vendor);

        let asked = svc
            .send(&customer, vendor.id, "gate code is 1234", Some(order_id))
            .unwrap();
        let answered = svc
            .send(&vendor, customer.id, "noted", Some(order_id))
            .unwrap();
        assert_eq!(asked.order_id, Some(order_id));
        assert_eq!(answered.order_id, Some(order_id));
    }

    #[test]
    fn unknown_order_is_not_found() {
        let (_, svc) = setup();
        let customer = Principal::customer(Uuid::new_v4());
        assert!(matches!(
            svc.send(&customer, Uuid::new_v4(), "where is it?", Some(Uuid::new_v4())),
            Err(DomainError::NotFound("Order"))
        ));
    }

    #[test]
    fn another_conversations_order_is_refused() {
        let (store, svc) = setup();
        let customer = Principal::customer(Uuid::new_v4());
        let vendor = Principal::vendor(Uuid::new_v4());
        let order_id = order_between(&store, &customer, &vendor);

        let outsider = Principal::customer(Uuid::new_v4());
        assert!(matches!(
            svc.send(&outsider, vendor.id, "mine now", Some(order_id)),
            Err(DomainError::NotFound("Order"))
        ));

        let other_vendor = Principal::vendor(Uuid::new_v4());
        assert!(matches!(
            svc.send(&customer, other_vendor.id, "wrong shop", Some(order_id)),
            Err(DomainError::InvalidInput(_))
        ));

        assert!(svc.conversation(&outsider, vendor.id).unwrap().is_empty());
        assert!(svc.conversation(&customer, other_vendor.id).unwrap().is_empty());
    }
}
