//! Range resolution.
//!
//! Turns one input segment into the smallest run of contiguous ranges whose
//! addresses share a geolocation record, without querying every address.
//!
//! For each range the resolver looks up the record at its cursor (the
//! *anchor*), then binary-searches the first address up to the segment end
//! whose record differs from the anchor. Everything before that boundary is
//! emitted as one [`ResolvedRange`] and the cursor moves to the boundary.
//! A segment with `k` distinct regions costs roughly `k * log2(n)` lookups
//! instead of `n`.
//!
//! Failure handling:
//! - anchor lookup fails: the address is abandoned and the cursor advances by one
//! - probe lookup fails: the probe is treated as "boundary at or before here"
//!   and the upper bound shrinks; the failure is not cached
//!
//! Abandoned addresses appear as gaps in the output, never as errors.
//!
//! Every lookup, retries and backoff included, is raced against the
//! cancellation token. A lookup interrupted that way abandons nothing.

mod cache;

pub use cache::ScopedCache;

use tokio_util::sync::CancellationToken;

use crate::address::Address;
use crate::error_handling::{LookupError, ProcessingStats};
use crate::lookup::{GeoLookup, GeoRecord};
use crate::segment::Segment;

/// A closed interval of addresses sharing one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: Address,
    pub end: Address,
    pub record: GeoRecord,
}

impl ResolvedRange {
    pub fn address_count(&self) -> u64 {
        u64::from(self.end.value()) - u64::from(self.start.value()) + 1
    }
}

/// What happened while resolving one segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionSummary {
    /// Ranges handed out by [`SegmentResolution::next_range`].
    pub ranges: usize,
    /// Addresses whose anchor lookup failed permanently.
    pub abandoned: Vec<Address>,
    /// Probe lookups that failed during boundary searches.
    pub probe_failures: usize,
    /// Lookups that went to the lookup client (cache misses).
    pub lookups: usize,
    /// Resolution stopped early because the cancellation token fired.
    pub cancelled: bool,
}

/// In-progress resolution of one segment.
///
/// Pull ranges with [`next_range`](Self::next_range) until it returns `None`.
/// The cache lives and dies with this value.
pub struct SegmentResolution<'a, L: GeoLookup + ?Sized> {
    segment: Segment,
    lookup: &'a L,
    cancel: CancellationToken,
    stats: Option<&'a ProcessingStats>,
    cache: ScopedCache,
    cursor: u64,
    end: u64,
    summary: ResolutionSummary,
}

impl<'a, L: GeoLookup + ?Sized> SegmentResolution<'a, L> {
    pub fn new(segment: Segment, lookup: &'a L, cancel: CancellationToken) -> Self {
        SegmentResolution {
            segment,
            lookup,
            cancel,
            stats: None,
            cache: ScopedCache::new(),
            cursor: u64::from(segment.start.value()),
            end: u64::from(segment.end.value()),
            summary: ResolutionSummary::default(),
        }
    }

    /// Counts lookup failures into `stats` as they happen.
    pub fn with_stats(mut self, stats: &'a ProcessingStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    pub fn summary(&self) -> &ResolutionSummary {
        &self.summary
    }

    pub fn into_summary(self) -> ResolutionSummary {
        self.summary
    }

    /// Resolves and returns the next range, or `None` once the segment is
    /// exhausted or the cancellation token has fired.
    pub async fn next_range(&mut self) -> Option<ResolvedRange> {
        while self.cursor <= self.end {
            if self.check_cancelled() {
                return None;
            }

            let cursor = self.cursor;
            let anchor = match self.fetch(cursor).await? {
                Ok(record) => record,
                Err(e) => {
                    let address = to_address(cursor);
                    log::warn!("Abandoning {}: {}", address, e);
                    self.summary.abandoned.push(address);
                    self.cursor += 1;
                    continue;
                }
            };
            self.cache.insert(cursor, anchor.clone());

            let boundary = self.find_boundary(cursor, &anchor).await?;

            let range = ResolvedRange {
                start: to_address(cursor),
                end: to_address(boundary - 1),
                record: anchor,
            };
            self.cache.prune_below(boundary);
            self.cursor = boundary;
            self.summary.ranges += 1;

            log::debug!(
                "Resolved {} - {} ({} addresses, country {})",
                range.start,
                range.end,
                range.address_count(),
                range.record.country_id
            );
            return Some(range);
        }
        None
    }

    /// Binary-searches the first address in `(cursor, end]` whose record
    /// differs from `anchor`. Returns `end + 1` when none does, or `None`
    /// if cancelled mid-search.
    async fn find_boundary(&mut self, cursor: u64, anchor: &GeoRecord) -> Option<u64> {
        let mut low = cursor;
        let mut high = self.end;

        while low <= high {
            if self.check_cancelled() {
                return None;
            }

            let mid = low + (high - low) / 2;
            let narrowed = match self.fetch(mid).await? {
                Ok(record) if anchor.same_range(&record) => {
                    low = mid + 1;
                    continue;
                }
                Ok(record) => {
                    self.cache.insert(mid, record);
                    mid.checked_sub(1)
                }
                Err(e) => {
                    log::debug!("Probe at {} failed, narrowing: {}", to_address(mid), e);
                    self.summary.probe_failures += 1;
                    mid.checked_sub(1)
                }
            };
            match narrowed {
                Some(h) => high = h,
                None => break,
            }
        }

        Some(low.max(cursor + 1))
    }

    /// Returns `None` when cancellation interrupts the lookup.
    async fn fetch(&mut self, address: u64) -> Option<Result<GeoRecord, LookupError>> {
        if let Some(record) = self.cache.get(address) {
            return Some(Ok(record.clone()));
        }
        self.summary.lookups += 1;
        let cancel = self.cancel.clone();
        let lookup = self.lookup;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.check_cancelled();
                return None;
            }
            result = lookup.lookup(to_address(address)) => result,
        };
        if let (Err(e), Some(stats)) = (&result, self.stats) {
            stats.increment(e.kind());
        }
        Some(result)
    }

    fn check_cancelled(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            if !self.summary.cancelled {
                log::info!("Resolution of {} cancelled", self.segment);
            }
            self.summary.cancelled = true;
            true
        } else {
            false
        }
    }
}

fn to_address(value: u64) -> Address {
    Address::new(value as u32)
}

/// Resolves a whole segment, collecting the ranges.
///
/// Convenient for callers that do not need to stream ranges out one at a time.
pub async fn resolve_segment<L: GeoLookup + ?Sized>(
    segment: Segment,
    lookup: &L,
    cancel: CancellationToken,
) -> (Vec<ResolvedRange>, ResolutionSummary) {
    let mut resolution = SegmentResolution::new(segment, lookup, cancel);
    let mut ranges = Vec::new();
    while let Some(range) = resolution.next_range().await {
        ranges.push(range);
    }
    (ranges, resolution.into_summary())
}

#[cfg(test)]
mod tests;
