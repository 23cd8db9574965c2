use crate::prelude::*;
use futures::stream::{self, StreamExt};
use homecooked_core::outcome::{Artifact, TransformOutcome};
use std::future::Future;

/// Run `transform` over `items` with at most `limit` calls in flight.
///
/// Results come back in input order regardless of completion order. A
/// `limit` of 0 is treated as 1 (strictly sequential).
pub async fn map_ordered<I, R, F, Fut>(items: Vec<I>, limit: usize, transform: F) -> Vec<Result<R>>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let limit = limit.max(1);

    let mut indexed: Vec<(usize, Result<R>)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let work = transform(item);
            async move { (index, work.await) }
        })
        .buffer_unordered(limit)
        .collect()
        .await;

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}

/// Apply a record transformer to every item, isolating failures.
///
/// Each item gets exactly one [`TransformOutcome`], labelled with `label`.
/// An error from one item never stops the others.
pub async fn map_bounded<I, L, F, Fut>(
    items: Vec<I>,
    limit: usize,
    label: L,
    transform: F,
) -> Vec<TransformOutcome>
where
    L: Fn(&I) -> String,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<Artifact>>,
{
    let labels: Vec<String> = items.iter().map(&label).collect();
    let results = map_ordered(items, limit, transform).await;

    labels
        .into_iter()
        .zip(results)
        .map(|(item, result)| match result {
            Ok(artifact) => TransformOutcome::success(item, artifact),
            Err(err) => {
                log::debug!("{item} failed: {err:?}");
                TransformOutcome::failure(item, f!("{err:#}"))
            }
        })
        .collect()
}
