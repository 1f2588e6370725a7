use super::filter::{Condition, ScanFilter};
use super::traits::{ContinuationToken, CountingStore, ScanPage, ScanQuery, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A row of the activities table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub activity_type: String,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl ActivityRecord {
    pub fn new(activity_type: &str, start_time: &str, end_time: Option<&str>) -> Self {
        Self {
            activity_type: activity_type.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.map(str::to_string),
        }
    }

    fn matches(&self, condition: &Condition) -> bool {
        match condition {
            Condition::StartTimeAtOrAfter(v) => self.start_time.as_str() >= v.as_str(),
            Condition::StartTimeAtOrBefore(v) => self.start_time.as_str() <= v.as_str(),
            Condition::EndTimeUnset => self.end_time.is_none(),
            Condition::ActivityType(v) => &self.activity_type == v,
        }
    }

    fn matches_all(&self, filter: &ScanFilter) -> bool {
        filter.conditions.iter().all(|c| self.matches(c))
    }
}

/// In-process counting store.
///
/// Rows are assigned to segment `index % total_segments`. Each page examines
/// up to `page_size` rows of the segment before the filter is applied, so a
/// page can report zero matches and still carry a continuation token.
pub struct MemoryStore {
    tables: HashMap<String, Vec<ActivityRecord>>,
    page_size: usize,
    failures: Mutex<HashSet<(usize, usize)>>,
    requests: AtomicUsize,
}

impl MemoryStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            tables: HashMap::new(),
            page_size: page_size.max(1),
            failures: Mutex::new(HashSet::new()),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn with_table(mut self, table: &str, records: Vec<ActivityRecord>) -> Self {
        self.tables.insert(table.to_string(), records);
        self
    }

    /// Make the request for `page` (zero-based) of `segment` fail.
    pub fn fail_page(&self, segment: usize, page: usize) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert((segment, page));
        }
    }

    /// Number of page requests served so far, including failed ones.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn should_fail(&self, segment: usize, page: usize) -> bool {
        self.failures
            .lock()
            .map(|failures| failures.contains(&(segment, page)))
            .unwrap_or(false)
    }
}

#[async_trait]
impl CountingStore for MemoryStore {
    async fn scan_page(&self, query: &ScanQuery) -> Result<ScanPage, StoreError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let offset = match &query.continuation {
            Some(token) => token
                .0
                .parse::<usize>()
                .map_err(|_| StoreError::InvalidToken(token.0.clone()))?,
            None => 0,
        };

        if self.should_fail(query.segment, offset / self.page_size) {
            return Err(StoreError::Request {
                segment: query.segment,
                message: format!("injected failure at offset {}", offset),
            });
        }

        let total_segments = query.total_segments.max(1);
        let segment_rows: Vec<&ActivityRecord> = self
            .tables
            .get(&query.filter.table)
            .map(|rows| {
                rows.iter()
                    .enumerate()
                    .filter(|(i, _)| i % total_segments == query.segment)
                    .map(|(_, row)| row)
                    .collect()
            })
            .unwrap_or_default();

        if offset > segment_rows.len() {
            return Err(StoreError::InvalidToken(offset.to_string()));
        }

        let end = offset.saturating_add(self.page_size).min(segment_rows.len());
        let count = segment_rows
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .filter(|row| row.matches_all(&query.filter))
            .count() as u64;

        Ok(ScanPage {
            count: Some(count),
            next_token: (end < segment_rows.len()).then(|| ContinuationToken(end.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::segmented::SegmentedCounter;
    use std::sync::Arc;

    const TABLE: &str = "cvs-test-activities";

    fn records() -> Vec<ActivityRecord> {
        vec![
            ActivityRecord::new("visit", "2024-03-07T08:00:00.000Z", None),
            ActivityRecord::new("visit", "2024-03-06T08:00:00.000Z", None),
            ActivityRecord::new("visit", "2024-03-07T09:00:00.000Z", Some("2024-03-07T09:30:00.000Z")),
            ActivityRecord::new("wait", "2024-03-07T09:00:00.000Z", None),
            ActivityRecord::new("visit", "2024-03-05T09:00:00.000Z", Some("2024-03-05T10:00:00.000Z")),
        ]
    }

    fn open_visits() -> ScanFilter {
        ScanFilter::new(TABLE)
            .with(Condition::EndTimeUnset)
            .with(Condition::ActivityType("visit".into()))
    }

    #[tokio::test]
    async fn test_filters_rows() {
        let store = Arc::new(MemoryStore::new(100).with_table(TABLE, records()));
        let counter = SegmentedCounter::new(store, 1);
        assert_eq!(counter.count(&open_visits()).await.unwrap(), 2);

        let started_today = ScanFilter::new(TABLE)
            .with(Condition::StartTimeAtOrAfter("2024-03-07T00:00:00.000Z".into()))
            .with(Condition::ActivityType("visit".into()));
        assert_eq!(counter.count(&started_today).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_count_independent_of_paging_and_segments() {
        for page_size in 1..4 {
            for segments in 1..6 {
                let store = Arc::new(MemoryStore::new(page_size).with_table(TABLE, records()));
                let counter = SegmentedCounter::new(store, segments);
                assert_eq!(counter.count(&open_visits()).await.unwrap(), 2);
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_table_counts_zero() {
        let store = Arc::new(MemoryStore::new(10));
        let counter = SegmentedCounter::new(store.clone(), 3);
        assert_eq!(counter.count(&open_visits()).await.unwrap(), 0);
        assert_eq!(store.requests(), 3);
    }

    #[tokio::test]
    async fn test_paginates_within_segment() {
        let query = ScanQuery::new(open_visits(), 0, 1);
        let store = MemoryStore::new(2).with_table(TABLE, records());

        let first = store.scan_page(&query).await.unwrap();
        assert_eq!(first.count, Some(2));
        assert_eq!(first.next_token, Some(ContinuationToken("2".into())));

        let mut next = query.clone();
        next.continuation = first.next_token;
        let second = store.scan_page(&next).await.unwrap();
        assert_eq!(second.count, Some(0));
        assert!(second.next_token.is_some());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new(1).with_table(TABLE, records());
        store.fail_page(0, 1);
        let store = Arc::new(store);
        let counter = SegmentedCounter::new(store, 1);
        let err = counter.count(&open_visits()).await.unwrap_err();
        assert!(matches!(err, StoreError::Request { segment: 0, .. }));
    }

    #[tokio::test]
    async fn test_rejects_foreign_token() {
        let store = MemoryStore::new(1);
        let mut query = ScanQuery::new(open_visits(), 0, 1);
        query.continuation = Some(ContinuationToken("abc".into()));
        let err = store.scan_page(&query).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_rejects_offset_past_segment_end() {
        let store = MemoryStore::new(2).with_table(TABLE, records());
        let mut query = ScanQuery::new(open_visits(), 0, 1);

        query.continuation = Some(ContinuationToken(usize::MAX.to_string()));
        let err = store.scan_page(&query).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidToken(ref t) if *t == usize::MAX.to_string()));

        query.continuation = Some(ContinuationToken("6".into()));
        assert!(store.scan_page(&query).await.is_err());
    }

    #[tokio::test]
    async fn test_large_page_size_does_not_overflow() {
        let store = MemoryStore::new(usize::MAX).with_table(TABLE, records());
        let mut query = ScanQuery::new(open_visits(), 0, 1);
        query.continuation = Some(ContinuationToken("3".into()));
        let page = store.scan_page(&query).await.unwrap();
        assert_eq!(page.count, Some(0));
        assert_eq!(page.next_token, None);
    }
}
