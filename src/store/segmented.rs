use super::filter::ScanFilter;
use super::traits::{CountingStore, ScanQuery, StoreError};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, trace, Instrument};

/// Number of scan segments to use when none is configured.
pub fn default_segments() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Counts matching records with a parallel, segmented, paginated scan.
///
/// Every segment follows its continuation tokens until the store stops
/// returning one. Segments run concurrently and their totals are summed only
/// once all of them are exhausted. Any failed page fails the whole count.
#[derive(Clone)]
pub struct SegmentedCounter {
    store: Arc<dyn CountingStore>,
    segments: usize,
}

impl SegmentedCounter {
    /// `segments` below 1 is treated as 1.
    pub fn new(store: Arc<dyn CountingStore>, segments: usize) -> Self {
        Self {
            store,
            segments: segments.max(1),
        }
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub async fn count(&self, filter: &ScanFilter) -> Result<u64, StoreError> {
        self.count_segments(filter, self.segments).await
    }

    pub async fn count_segments(
        &self,
        filter: &ScanFilter,
        segments: usize,
    ) -> Result<u64, StoreError> {
        let segments = segments.max(1);

        let scans = (0..segments).map(|segment| {
            let query = ScanQuery::new(filter.clone(), segment, segments);
            self.scan_segment(query)
                .instrument(tracing::debug_span!("segment_scan", segment, segments))
        });

        let totals = try_join_all(scans).await?;
        let total = totals.iter().fold(0u64, |acc, n| acc.saturating_add(*n));

        debug!(
            table = %filter.table,
            filter = %filter.expression(),
            segments,
            total,
            "Segmented scan complete"
        );

        Ok(total)
    }

    async fn scan_segment(&self, mut query: ScanQuery) -> Result<u64, StoreError> {
        let mut count = 0u64;
        let mut pages = 0usize;

        loop {
            let page = self.store.scan_page(&query).await?;
            pages += 1;
            count = count.saturating_add(page.count.unwrap_or(0));

            match page.next_token {
                Some(token) => query.continuation = Some(token),
                None => break,
            }
        }

        trace!(pages, count, "Segment exhausted");
        Ok(count)
    }
}
