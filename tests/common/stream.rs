//! Stream collection utilities for testing walks.

use futures_core::Stream;
use std::future::poll_fn;
use std::pin::Pin;
use std::task::Context;

/// Collect items from a stream up to a limit.
pub async fn collect_stream<S, T>(mut stream: Pin<&mut S>, limit: usize) -> Vec<T>
where
    S: Stream<Item = T> + Unpin,
{
    let mut results = Vec::new();
    while results.len() < limit {
        let item = poll_fn(|cx: &mut Context<'_>| Pin::new(&mut stream).poll_next(cx)).await;

        match item {
            Some(item) => results.push(item),
            None => break,
        }
    }
    results
}
