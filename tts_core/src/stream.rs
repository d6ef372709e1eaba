//! Re-chunking of engine output into player-friendly blocks.
//!
//! Engines emit fragments of arbitrary size at arbitrary pacing. Players
//! stutter when fed tiny writes and break on partial sample frames, so the
//! fragment stream is coalesced into fixed-size blocks and each block is
//! trimmed to whole frames before it reaches the transport.

use async_stream::stream;
use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::{pin_mut, StreamExt};

use crate::{EngineError, StreamError};

/// Coalesce `fragments` into blocks of `target_bytes`.
///
/// Empty fragments are skipped; only exhaustion of the fragment stream ends
/// the output. Every emitted block is exactly `target_bytes` long except
/// possibly the final one, which carries whatever remains in the buffer.
/// An engine error terminates the output after being passed through.
///
/// Single pass over `fragments`; the only buffering is the accumulation
/// buffer, which never holds more than `target_bytes - 1` bytes between
/// fragments.
pub fn coalesce<S>(
    fragments: S,
    target_bytes: usize,
) -> Result<impl Stream<Item = Result<Bytes, StreamError>> + Send, StreamError>
where
    S: Stream<Item = Result<Bytes, EngineError>> + Send + 'static,
{
    if target_bytes == 0 {
        return Err(StreamError::InvalidChunkSize);
    }

    Ok(stream! {
        let mut pending = BytesMut::new();
        pin_mut!(fragments);

        while let Some(fragment) = fragments.next().await {
            let fragment = match fragment {
                Ok(fragment) => fragment,
                Err(e) => {
                    yield Err(StreamError::Engine(e));
                    return;
                }
            };
            if fragment.is_empty() {
                continue;
            }

            pending.extend_from_slice(&fragment);
            while pending.len() >= target_bytes {
                yield Ok(pending.split_to(target_bytes).freeze());
            }
        }

        if !pending.is_empty() {
            yield Ok(pending.freeze());
        }
    })
}

/// Trim `block` down to a whole number of sample frames.
///
/// Returns `None` when the block holds less than one frame. The trailing
/// partial frame, if any, is dropped rather than carried into the next
/// block; a partial frame on the wire corrupts playback.
pub fn frame_align(mut block: Bytes, frame_bytes: usize) -> Option<Bytes> {
    let keep = (block.len() / frame_bytes) * frame_bytes;
    if keep == 0 {
        return None;
    }
    block.truncate(keep);
    Some(block)
}
