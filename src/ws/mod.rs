pub mod connection;
pub mod events;

pub use connection::ws_handler;
pub use events::{ClientEvent, MessagePayload, ServerEvent};
