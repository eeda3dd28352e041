use std::convert::Infallible;

use actix_web::{web, HttpResponse};
use async_stream::stream;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::message::Message;
use crate::errors::AppError;
use crate::handlers::principal::CurrentPrincipal;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// Principal id of the other party.
    pub receiver_id: Uuid,
    pub content: String,
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_key: String,
    pub sender_id: Uuid,
    pub sender_role: String,
    pub receiver_id: Uuid,
    pub receiver_role: String,
    pub order_id: Option<Uuid>,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            conversation_key: m.conversation_key.to_string(),
            sender_id: m.sender_id,
            sender_role: m.sender_role.as_str().to_string(),
            receiver_id: m.receiver_id,
            receiver_role: m.receiver_role.as_str().to_string(),
            order_id: m.order_id,
            content: m.content,
            is_read: m.is_read,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    /// False when the message had already been read.
    pub changed: bool,
}

fn sse_event(event: &str, data: &str) -> web::Bytes {
    web::Bytes::from(format!("event: {event}\ndata: {data}\n\n"))
}

/// POST /messages
#[utoipa::path(
    post,
    path = "/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored and pushed to subscribers", body = MessageResponse),
        (status = 400, description = "Empty or oversized message"),
    ),
    tag = "messages"
)]
pub async fn send_message(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    body: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let SendMessageRequest {
        receiver_id,
        content,
        order_id,
    } = body.into_inner();

    let sent = web::block(move || {
        state
            .messaging
            .send(&principal, receiver_id, &content, order_id)
    })
    .await??;

    Ok(HttpResponse::Created().json(MessageResponse::from(sent)))
}

/// GET /messages/{counterpart_id}
#[utoipa::path(
    get,
    path = "/messages/{counterpart_id}",
    params(("counterpart_id" = Uuid, Path, description = "Principal id of the other party")),
    responses(
        (status = 200, description = "Conversation, oldest first", body = [MessageResponse]),
    ),
    tag = "messages"
)]
pub async fn list_conversation(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let counterpart_id = path.into_inner();

    let messages =
        web::block(move || state.messaging.conversation(&principal, counterpart_id)).await??;

    let body: Vec<MessageResponse> = messages.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /messages/{counterpart_id}/stream
///
/// Server-Sent Events carrying each new message of the conversation as a
/// `message` event. A subscriber that falls behind receives a `lagged` event
/// with the number of skipped messages and should re-list the conversation.
#[utoipa::path(
    get,
    path = "/messages/{counterpart_id}/stream",
    params(("counterpart_id" = Uuid, Path, description = "Principal id of the other party")),
    responses(
        (status = 200, description = "text/event-stream of new messages"),
    ),
    tag = "messages"
)]
pub async fn stream_conversation(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let counterpart_id = path.into_inner();
    let mut receiver = state.messaging.subscribe(&principal, counterpart_id)?;
    log::info!(
        "{} {} subscribed to conversation with {}",
        principal.role,
        principal.id,
        counterpart_id
    );

    let events = stream! {
        yield Ok::<_, Infallible>(web::Bytes::from_static(b": subscribed\n\n"));
        loop {
            match receiver.recv().await {
                Ok(message) => match serde_json::to_string(&MessageResponse::from(message)) {
                    Ok(json) => {
                        yield Ok::<_, Infallible>(sse_event("message", &json));
                    }
                    Err(e) => {
                        log::error!("Could not encode message event: {}", e);
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!(
                        "Subscriber {} lagged by {} message(s)",
                        principal.id,
                        skipped
                    );
                    let data = serde_json::json!({ "skipped": skipped }).to_string();
                    yield Ok::<_, Infallible>(sse_event("lagged", &data));
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(events))
}

/// POST /messages/{id}/read
#[utoipa::path(
    post,
    path = "/messages/{id}/read",
    params(("id" = Uuid, Path, description = "Message UUID")),
    responses(
        (status = 200, description = "Message is read", body = MarkReadResponse),
        (status = 403, description = "Caller is not the receiver"),
        (status = 404, description = "Message not found"),
    ),
    tag = "messages"
)]
pub async fn mark_read(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let id = path.into_inner();
    let changed = web::block(move || state.messaging.mark_read(&principal, id)).await??;
    Ok(HttpResponse::Ok().json(MarkReadResponse { changed }))
}

/// GET /messages/unread/count
#[utoipa::path(
    get,
    path = "/messages/unread/count",
    responses(
        (status = 200, description = "Unread messages addressed to the caller", body = UnreadCountResponse),
    ),
    tag = "messages"
)]
pub async fn unread_count(
    state: web::Data<AppState>,
    principal: CurrentPrincipal,
) -> Result<HttpResponse, AppError> {
    let CurrentPrincipal(principal) = principal;
    let unread = web::block(move || state.messaging.unread_count(&principal)).await??;
    Ok(HttpResponse::Ok().json(UnreadCountResponse { unread }))
}
