use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::error_handling::FailureKind;
use crate::lookup::{test_record, RetryPolicy, RetryingLookup};

/// Lookup stub driven by a plain function of the address value.
struct FnLookup<F> {
    f: F,
    calls: AtomicUsize,
    per_address: Mutex<HashMap<u32, usize>>,
}

impl<F> FnLookup<F>
where
    F: Fn(u32) -> Result<GeoRecord, LookupError> + Send + Sync,
{
    fn new(f: F) -> Self {
        FnLookup {
            f,
            calls: AtomicUsize::new(0),
            per_address: Mutex::new(HashMap::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn calls_for(&self, address: u32) -> usize {
        self.per_address
            .lock()
            .unwrap()
            .get(&address)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl<F> GeoLookup for FnLookup<F>
where
    F: Fn(u32) -> Result<GeoRecord, LookupError> + Send + Sync,
{
    async fn lookup(&self, address: Address) -> Result<GeoRecord, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .per_address
            .lock()
            .unwrap()
            .entry(address.value())
            .or_insert(0) += 1;
        (self.f)(address.value())
    }
}

fn segment(start: u32, end: u32) -> Segment {
    Segment::new(Address::new(start), Address::new(end)).unwrap()
}

fn record_a() -> GeoRecord {
    test_record("CN", 330000, 330100)
}

fn record_b() -> GeoRecord {
    test_record("CN", 110000, 110100)
}

fn span(range: &ResolvedRange) -> (u32, u32) {
    (range.start.value(), range.end.value())
}

#[tokio::test]
async fn test_two_regions_yield_two_ranges() {
    let lookup = FnLookup::new(|a| Ok(if a <= 15 { record_a() } else { record_b() }));

    let (ranges, summary) =
        resolve_segment(segment(10, 20), &lookup, CancellationToken::new()).await;

    assert_eq!(ranges.len(), 2);
    assert_eq!(span(&ranges[0]), (10, 15));
    assert_eq!(ranges[0].record, record_a());
    assert_eq!(span(&ranges[1]), (16, 20));
    assert_eq!(ranges[1].record, record_b());
    assert!(summary.abandoned.is_empty());
    assert!(!summary.cancelled);
    assert_eq!(summary.ranges, 2);
}

#[tokio::test]
async fn test_boundary_record_is_reused_from_cache() {
    let lookup = FnLookup::new(|a| Ok(if a <= 15 { record_a() } else { record_b() }));

    let _ = resolve_segment(segment(10, 20), &lookup, CancellationToken::new()).await;

    // 16 is found as the differing probe and then becomes the next anchor
    assert_eq!(lookup.calls_for(16), 1);
    for address in 10..=20 {
        assert!(lookup.calls_for(address) <= 1, "{address} queried twice");
    }
}

#[tokio::test]
async fn test_homogeneous_segment_is_one_range() {
    let lookup = FnLookup::new(|_| Ok(record_a()));

    let (ranges, _) = resolve_segment(segment(0, 255), &lookup, CancellationToken::new()).await;

    assert_eq!(ranges.len(), 1);
    assert_eq!(span(&ranges[0]), (0, 255));
    assert!(lookup.calls() <= 10, "made {} calls", lookup.calls());
}

#[tokio::test]
async fn test_single_address_segment() {
    let lookup = FnLookup::new(|_| Ok(record_b()));

    let (ranges, _) = resolve_segment(segment(7, 7), &lookup, CancellationToken::new()).await;

    assert_eq!(ranges.len(), 1);
    assert_eq!(span(&ranges[0]), (7, 7));
    assert_eq!(lookup.calls(), 1);
}

#[tokio::test]
async fn test_lookup_count_is_logarithmic() {
    // three regions across 2^20 addresses
    let lookup = FnLookup::new(|a| {
        Ok(match a {
            0..=99_999 => test_record("US", 1, 1),
            100_000..=700_000 => test_record("US", 2, 1),
            _ => test_record("US", 3, 1),
        })
    });

    let (ranges, summary) =
        resolve_segment(segment(0, (1 << 20) - 1), &lookup, CancellationToken::new()).await;

    assert_eq!(ranges.len(), 3);
    assert_eq!(span(&ranges[0]), (0, 99_999));
    assert_eq!(span(&ranges[1]), (100_000, 700_000));
    assert_eq!(span(&ranges[2]), (700_001, (1 << 20) - 1));
    assert!(summary.lookups < 100, "made {} lookups", summary.lookups);
}

#[tokio::test]
async fn test_unsubdivided_territory_collapses() {
    let lookup = FnLookup::new(|a| Ok(test_record("HK", a as i64 % 3, a as i64 % 5)));

    let (ranges, _) = resolve_segment(segment(1000, 1999), &lookup, CancellationToken::new()).await;

    assert_eq!(ranges.len(), 1);
    assert_eq!(span(&ranges[0]), (1000, 1999));
}

#[tokio::test]
async fn test_every_anchor_failing_still_terminates() {
    let lookup = FnLookup::new(|_| Err(LookupError::Status(503)));

    let (ranges, summary) =
        resolve_segment(segment(100, 131), &lookup, CancellationToken::new()).await;

    assert!(ranges.is_empty());
    assert_eq!(summary.abandoned.len(), 32);
    assert_eq!(summary.abandoned.first(), Some(&Address::new(100)));
    assert_eq!(summary.abandoned.last(), Some(&Address::new(131)));
    assert_eq!(lookup.calls(), 32);
}

#[tokio::test]
async fn test_failed_anchor_is_a_gap() {
    let lookup = FnLookup::new(|a| {
        if a == 10 {
            Err(LookupError::Decode("no data".into()))
        } else {
            Ok(record_a())
        }
    });

    let (ranges, summary) = resolve_segment(segment(10, 20), &lookup, CancellationToken::new()).await;

    assert_eq!(summary.abandoned, vec![Address::new(10)]);
    assert_eq!(ranges.len(), 1);
    assert_eq!(span(&ranges[0]), (11, 20));
}

#[tokio::test]
async fn test_failed_probe_narrows_instead_of_aborting() {
    // 15 is the first probe of [10, 20] and fails permanently
    let lookup = FnLookup::new(|a| {
        if a == 15 {
            Err(LookupError::Status(500))
        } else {
            Ok(record_a())
        }
    });

    let (ranges, summary) = resolve_segment(segment(10, 20), &lookup, CancellationToken::new()).await;

    assert!(summary.probe_failures >= 1);
    assert_eq!(ranges.first().map(span), Some((10, 14)));
    // 15 is retried as the next anchor, fails again and is abandoned
    assert_eq!(summary.abandoned, vec![Address::new(15)]);
    assert_eq!(ranges.last().map(span), Some((16, 20)));
    assert_eq!(lookup.calls_for(15), 2);
}

#[tokio::test]
async fn test_segment_ending_at_max_address_terminates() {
    let lookup = FnLookup::new(|a| {
        Ok(if a < u32::MAX - 3 {
            record_a()
        } else {
            record_b()
        })
    });

    let (ranges, _) = resolve_segment(
        segment(u32::MAX - 9, u32::MAX),
        &lookup,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(ranges.len(), 2);
    assert_eq!(span(&ranges[0]), (u32::MAX - 9, u32::MAX - 4));
    assert_eq!(span(&ranges[1]), (u32::MAX - 3, u32::MAX));
}

#[tokio::test]
async fn test_cancelled_before_start_emits_nothing() {
    let lookup = FnLookup::new(|_| Ok(record_a()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let (ranges, summary) = resolve_segment(segment(0, 100), &lookup, cancel).await;

    assert!(ranges.is_empty());
    assert!(summary.cancelled);
    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn test_cancellation_mid_segment_keeps_emitted_ranges() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    // one region per 10 addresses; cancel after the first range's worth of lookups
    let seen = AtomicUsize::new(0);
    let lookup = FnLookup::new(move |a| {
        if seen.fetch_add(1, Ordering::SeqCst) + 1 >= 12 {
            trigger.cancel();
        }
        Ok(test_record("US", i64::from(a / 10), 0))
    });

    let mut resolution = SegmentResolution::new(segment(0, 99), &lookup, cancel);
    let mut ranges = Vec::new();
    while let Some(range) = resolution.next_range().await {
        ranges.push(range);
    }

    assert!(resolution.summary().cancelled);
    assert!(!ranges.is_empty());
    assert!(ranges.len() < 10);
    for (i, range) in ranges.iter().enumerate() {
        assert_eq!(span(range), (i as u32 * 10, i as u32 * 10 + 9));
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_retry_backoff_stops_at_once() {
    let lookup = RetryingLookup::new(
        FnLookup::new(|_| Err(LookupError::Transient("connection reset by peer".into()))),
        RetryPolicy::default(),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let started = tokio::time::Instant::now();
    let (ranges, summary) = resolve_segment(segment(0, 10), &lookup, cancel).await;
    let elapsed = started.elapsed();

    assert!(ranges.is_empty());
    assert!(summary.cancelled);
    // the interrupted anchor is not a failed one
    assert!(summary.abandoned.is_empty());
    assert_eq!(lookup.inner().calls(), 1);
    assert!(elapsed < Duration::from_secs(1), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn test_stats_count_lookup_failures() {
    let stats = ProcessingStats::new();
    let lookup = FnLookup::new(|a| {
        if a % 2 == 0 {
            Err(LookupError::Status(404))
        } else {
            Err(LookupError::Decode("x".into()))
        }
    });

    let mut resolution =
        SegmentResolution::new(segment(0, 3), &lookup, CancellationToken::new()).with_stats(&stats);
    while resolution.next_range().await.is_some() {}

    assert_eq!(stats.get_count(FailureKind::LookupStatus), 2);
    assert_eq!(stats.get_count(FailureKind::LookupDecode), 2);
}

/// Ranges are sorted and disjoint, and together with the abandoned points
/// they cover the segment exactly.
fn check_partition(
    seg: Segment,
    ranges: &[ResolvedRange],
    summary: &ResolutionSummary,
) -> Result<(), TestCaseError> {
    let mut covered: Vec<u32> = Vec::new();
    let mut previous_end: Option<u32> = None;
    for range in ranges {
        prop_assert!(range.start <= range.end);
        if let Some(prev) = previous_end {
            prop_assert!(range.start.value() > prev, "ranges overlap or are unsorted");
        }
        previous_end = Some(range.end.value());
        covered.extend(range.start.value()..=range.end.value());
    }
    covered.extend(summary.abandoned.iter().map(|a| a.value()));
    covered.sort_unstable();
    let expected: Vec<u32> = (seg.start.value()..=seg.end.value()).collect();
    prop_assert_eq!(covered, expected);
    Ok(())
}

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #[test]
    fn prop_partition_law_with_failures(
        start in 0u32..1_000,
        len in 1u32..300,
        cuts in prop::collection::vec(0u32..300, 0..8),
        failures in prop::collection::hash_set(0u32..300, 0..30),
    ) {
        let seg = segment(start, start + len - 1);
        let lookup = FnLookup::new(move |a| {
            let offset = a - start;
            if failures.contains(&offset) {
                return Err(LookupError::Status(500));
            }
            let region = cuts.iter().filter(|c| **c <= offset).count() as i64;
            Ok(test_record("US", region, 0))
        });

        let (ranges, summary) = run(resolve_segment(seg, &lookup, CancellationToken::new()));
        check_partition(seg, &ranges, &summary)?;
    }

    #[test]
    fn prop_exact_regions_without_failures(
        start in 0u32..1_000_000,
        len in 1u32..5_000,
        cuts in prop::collection::btree_set(1u32..5_000, 0..10),
    ) {
        let seg = segment(start, start + len - 1);
        let cut_list: Vec<u32> = cuts.iter().copied().filter(|c| *c < len).collect();
        let regions = cut_list.clone();
        let lookup = FnLookup::new(move |a| {
            let offset = a - start;
            let region = regions.iter().filter(|c| **c <= offset).count() as i64;
            Ok(test_record("US", region, 0))
        });

        let (ranges, summary) = run(resolve_segment(seg, &lookup, CancellationToken::new()));
        check_partition(seg, &ranges, &summary)?;
        prop_assert!(summary.abandoned.is_empty());

        let mut bounds = vec![0u32];
        bounds.extend(cut_list);
        bounds.push(len);
        let expected: Vec<(u32, u32)> = bounds
            .windows(2)
            .map(|w| (start + w[0], start + w[1] - 1))
            .collect();
        let actual: Vec<(u32, u32)> = ranges.iter().map(span).collect();
        prop_assert_eq!(actual, expected);
    }
}
