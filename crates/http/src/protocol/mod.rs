//! Core HTTP protocol abstractions.
//!
//! - **Message Handling** (`message`): payload items, framing decisions and the
//!   [`HttpMessage`] accessor for message heads
//! - **Framing Strategy** (`strategy`): [`ContentLengthStrategy`] and its default rules
//! - **Entities** (`entity`): [`IncomingEntity`] handed to callers after a message head
//! - **Timeouts** (`timeout`): the [`Timeout`] value used for socket reads
//! - **Error Handling** (`error`): [`HttpError`], [`ConnectionError`], [`ParseError`], [`SendError`]

mod message;
pub use message::HttpMessage;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod strategy;
pub use strategy::ContentLengthStrategy;
pub use strategy::DefaultContentLengthStrategy;

mod entity;
pub use entity::IncomingEntity;

mod timeout;
pub use timeout::Timeout;

mod error;
pub use error::ConnectionError;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
