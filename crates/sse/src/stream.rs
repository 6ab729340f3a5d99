//! Lazy line and event streams over a [`ByteStream`].

use std::pin::Pin;

use acgate_types::{ByteStream, Result};
use futures_util::{Stream, StreamExt as _, TryStreamExt as _, stream};

use crate::decoder::{SseDecoder, SseEvent, SseLine};

pub type LineStream = Pin<Box<dyn Stream<Item = Result<SseLine>> + Send>>;
pub type EventStream = Pin<Box<dyn Stream<Item = Result<SseEvent>> + Send>>;

struct DecodeState {
    inner: ByteStream,
    decoder: SseDecoder,
}

/// Decode a byte stream into complete lines as chunks arrive.
///
/// A transport error ends the stream after it is yielded; lines already
/// decoded before the error are delivered first.
#[must_use]
pub fn decode(inner: ByteStream) -> LineStream {
    let state = DecodeState {
        inner,
        decoder: SseDecoder::new(),
    };
    Box::pin(stream::try_unfold(state, |mut st| async move {
        loop {
            if let Some(line) = st.decoder.next_line() {
                return Ok(Some((line, st)));
            }
            if st.decoder.is_finished() {
                return Ok(None);
            }
            match st.inner.next().await {
                Some(Ok(chunk)) => st.decoder.feed(&chunk),
                Some(Err(e)) => return Err(e),
                None => st.decoder.finish(),
            }
        }
    }))
}

/// Decode a byte stream, yielding only `data: ` payloads.
#[must_use]
pub fn events(inner: ByteStream) -> EventStream {
    Box::pin(decode(inner).try_filter_map(|line| async move { Ok(line.into_event()) }))
}
