//! Incremental decoding of Server-Sent-Events byte streams.
//!
//! [`SseDecoder`] is a feed-bytes / drain-lines state machine owned by a
//! single reader; [`decode`] wraps it around a [`acgate_types::ByteStream`]
//! to yield lines lazily as chunks arrive.

pub mod decoder;
pub mod stream;

pub use decoder::{DATA_PREFIX, SseDecoder, SseEvent, SseLine};
pub use stream::{EventStream, LineStream, decode, events};
