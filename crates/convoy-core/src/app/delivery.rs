//! Delivery - presentation 層への結果の渡し方
//!
//! Two shapes, same guarantee: the presenter sees exactly one terminal
//! envelope (`Success` or `Failure`), never a panic.
//!
//! - [`request_once`]: await once, get the terminal envelope.
//! - [`request_stream`]: optionally `Loading` first, then the terminal
//!   envelope, then the stream ends.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::stream::{self, Stream, StreamExt};
use futures::FutureExt;

use crate::domain::ResultEnvelope;

/// Await `request` and hand back its terminal envelope.
///
/// A panic inside the request, or a request that resolves to `Loading`,
/// becomes the unrecognized failure.
pub async fn request_once<T, Fut>(request: Fut) -> ResultEnvelope<T>
where
    Fut: Future<Output = ResultEnvelope<T>>,
{
    match AssertUnwindSafe(request).catch_unwind().await {
        Ok(ResultEnvelope::Loading) => {
            tracing::error!("request resolved to Loading instead of a terminal envelope");
            ResultEnvelope::unrecognized()
        }
        Ok(envelope) => envelope,
        Err(_panic) => {
            tracing::error!("request panicked");
            ResultEnvelope::unrecognized()
        }
    }
}

/// Stream form: `[Loading]?, terminal`.
pub fn request_stream<T, Fut>(
    request: Fut,
    emit_loading: bool,
) -> impl Stream<Item = ResultEnvelope<T>>
where
    Fut: Future<Output = ResultEnvelope<T>>,
{
    let loading = emit_loading.then_some(ResultEnvelope::Loading);
    stream::iter(loading).chain(stream::once(request_once(request)))
}
