//! Bounded-concurrency mapping over a collection of async operations.
//!
//! At most `limit` operations are in flight at once. A new operation starts
//! as soon as any running one finishes, so a single slow call does not hold
//! back the rest of the batch. Results always come back in input order.

use std::future::Future;

use futures_util::{StreamExt, TryStreamExt, stream};

/// Run `f` over `items` with at most `limit` calls in flight.
///
/// A `limit` of zero is treated as one.
///
/// # Examples
///
/// ```
/// use rideshare_core::map_with_concurrency;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let doubled = map_with_concurrency(vec![1, 2, 3], 2, |n| async move { n * 2 }).await;
/// assert_eq!(doubled, vec![2, 4, 6]);
/// # }
/// ```
pub async fn map_with_concurrency<I, F, Fut>(items: I, limit: usize, f: F) -> Vec<Fut::Output>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future,
{
    stream::iter(items)
        .map(f)
        .buffered(limit.max(1))
        .collect()
        .await
}

/// Fallible variant of [`map_with_concurrency`].
///
/// Returns the first error in input order. No new calls are started once that
/// error has been observed.
///
/// # Errors
///
/// Propagates the first error returned by `f`.
pub async fn try_map_with_concurrency<I, F, Fut, T, E>(
    items: I,
    limit: usize,
    f: F,
) -> Result<Vec<T>, E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    stream::iter(items)
        .map(f)
        .buffered(limit.max(1))
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
    }

    impl InFlight {
        async fn run(&self, delay_ms: u64) {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[rstest]
    #[tokio::test]
    async fn preserves_input_order_despite_completion_order() {
        let delays = vec![40_u64, 5, 25, 1, 15, 30, 2];
        let results = map_with_concurrency(delays.clone(), 3, |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            delay
        })
        .await;
        assert_eq!(results, delays);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(5)]
    #[tokio::test]
    async fn never_exceeds_limit(#[case] limit: usize) {
        let tracker = Arc::new(InFlight::default());
        let items: Vec<u64> = (0..12).map(|i| 2 + (i % 4) * 3).collect();
        map_with_concurrency(items, limit, |delay| {
            let tracker = Arc::clone(&tracker);
            async move { tracker.run(delay).await }
        })
        .await;
        let peak = tracker.peak.load(Ordering::SeqCst);
        assert!(peak <= limit, "peak {peak} exceeded limit {limit}");
        assert!(peak >= 1);
        assert_eq!(tracker.started.load(Ordering::SeqCst), 12);
    }

    #[rstest]
    #[tokio::test]
    async fn zero_limit_still_makes_progress() {
        let results = map_with_concurrency(vec![1, 2], 0, |n| async move { n + 1 }).await;
        assert_eq!(results, vec![2, 3]);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let results = map_with_concurrency(Vec::<u8>::new(), 5, |n| async move { n }).await;
        assert!(results.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn try_variant_stops_at_first_error() {
        let tracker = Arc::new(InFlight::default());
        let outcome: Result<Vec<u32>, String> =
            try_map_with_concurrency(0..20_u32, 2, |n| {
                let tracker = Arc::clone(&tracker);
                async move {
                    tracker.run(1).await;
                    if n == 3 { Err(format!("item {n}")) } else { Ok(n) }
                }
            })
            .await;
        assert_eq!(outcome, Err("item 3".to_owned()));
        assert!(tracker.started.load(Ordering::SeqCst) < 20);
    }

    #[rstest]
    #[tokio::test]
    async fn try_variant_collects_successes_in_order() {
        let outcome: Result<Vec<u32>, String> =
            try_map_with_concurrency(vec![3_u32, 1, 2], 5, |n| async move { Ok(n * 10) }).await;
        assert_eq!(outcome, Ok(vec![30, 10, 20]));
    }
}
