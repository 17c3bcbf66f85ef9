//! Blocking I/O on top of a bound socket.
//!
//! - [`Endpoint`]: the socket abstraction a connection binds to
//! - [`SessionInputBuffer`] / [`SessionOutputBuffer`]: buffering between the
//!   socket and the body codecs, including the three-way [`Peek`] result
//! - [`ContentInputStream`] / [`OutgoingContent`]: body streams that apply
//!   a framing decision on top of the buffers

mod content_input;
mod content_output;
mod endpoint;
mod input_buffer;
mod output_buffer;

pub use content_input::ContentInputStream;
pub use content_output::OutgoingContent;
pub use endpoint::Endpoint;
pub use input_buffer::{Peek, SessionInputBuffer};
pub use output_buffer::SessionOutputBuffer;
