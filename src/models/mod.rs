pub mod conversation;
pub mod direct_message;
pub mod session;
pub mod user;
