pub mod aggregator;
pub mod block_gate;
pub mod composer;
pub mod conversation;
pub mod inbox;
pub mod moderation;
pub mod read_state;
