pub mod errors;
pub mod events;
pub mod message;
pub mod offering;
pub mod order;
pub mod ports;
pub mod profile;
pub mod review;
pub mod session;
pub mod stats;
