pub mod message_hub;
pub mod messaging_service;
pub mod offering_service;
pub mod order_service;
pub mod profile_service;
pub mod review_service;
pub mod stats_service;
