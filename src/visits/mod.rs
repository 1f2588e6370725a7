pub mod filter;

use crate::model::VisitCounts;
use crate::store::{SegmentedCounter, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, Instrument};

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(10 * 60 * 60);
pub const DEFAULT_ACTIVITY_TYPE: &str = "visit";

/// Where visits live and how old an open visit may get.
#[derive(Debug, Clone)]
pub struct VisitSettings {
    pub table: String,
    pub activity_type: String,
    pub stale_after: Duration,
}

/// Computes visit statistics from the activities table.
///
/// All filters are relative to the `now` captured at construction, so the
/// three counts of one pass agree on the time they describe.
pub struct VisitAggregator {
    counter: Arc<SegmentedCounter>,
    settings: VisitSettings,
    now: DateTime<Utc>,
}

impl VisitAggregator {
    pub fn new(counter: Arc<SegmentedCounter>, settings: VisitSettings, now: DateTime<Utc>) -> Self {
        Self {
            counter,
            settings,
            now,
        }
    }

    /// Visits started since 00:00 UTC today.
    pub async fn visits_today(&self) -> Result<u64, StoreError> {
        let since = filter::start_of_day(self.now);
        let query = filter::visits_since(&self.settings.table, &self.settings.activity_type, since);

        async {
            info!("Retrieving total visits today");
            let total = self.counter.count(&query).await?;
            info!(since = %since.to_rfc3339(), total, "Total visits today");
            Ok::<_, StoreError>(total)
        }
        .instrument(info_span!("get_visits", filter = %query.expression()))
        .await
    }

    /// Open visits started more than `stale_after` ago.
    pub async fn stale_open_visits(&self, stale_after: Duration) -> Result<u64, StoreError> {
        let cutoff = filter::stale_cutoff(self.now, stale_after);
        let query = filter::open_visits_started_by(
            &self.settings.table,
            &self.settings.activity_type,
            cutoff,
        );

        async {
            info!(cutoff = %cutoff.to_rfc3339(), "Retrieving open visits older than cutoff");
            let total = self.counter.count(&query).await?;
            info!(cutoff = %cutoff.to_rfc3339(), total, "Total stale open visits");
            Ok::<_, StoreError>(total)
        }
        .instrument(info_span!("get_old_visits", filter = %query.expression()))
        .await
    }

    pub async fn open_visits(&self) -> Result<u64, StoreError> {
        let query = filter::open_visits(&self.settings.table, &self.settings.activity_type);

        async {
            info!("Retrieving total open visits");
            let total = self.counter.count(&query).await?;
            info!(total, "Total open visits");
            Ok::<_, StoreError>(total)
        }
        .instrument(info_span!("get_open_visits", filter = %query.expression()))
        .await
    }

    /// Run all three counts concurrently.
    pub async fn collect(&self) -> Result<VisitCounts, StoreError> {
        let (visits_today, stale_open_visits, open_visits) = tokio::try_join!(
            self.visits_today(),
            self.stale_open_visits(self.settings.stale_after),
            self.open_visits(),
        )?;

        Ok(VisitCounts {
            visits_today,
            stale_open_visits,
            open_visits,
        })
    }
}
