//! In-memory store for user-submitted reports
//!
//! The store is an explicit, injectable object; the aggregation pipeline
//! re-derives its output from a snapshot after every mutation. Records are
//! never mutated in place.

use crate::domain::{Report, ReportCreateArgs};
use crate::infrastructure::events::{Event, EventBus};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// User-report ids start above the seed range; the first assigned id is 101.
const ID_ORIGIN: u32 = 100;

struct StoreInner {
    records: Vec<Report>,
    /// Highest id ever assigned since the last clear. Keeps ids strictly
    /// increasing across removals; only `clear_reports` resets it.
    high_water: u32,
}

/// Store for user-submitted reports. Mutations are serialized behind one
/// lock, so two concurrent adds can never observe the same id.
pub struct ReportStore {
    inner: RwLock<StoreInner>,
    events: Arc<EventBus>,
}

impl ReportStore {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: Vec::new(),
                high_water: ID_ORIGIN,
            }),
            events,
        }
    }

    /// Append a new report, assigning the next id. Ids are never reused,
    /// even after removals.
    pub async fn add_report(&self, args: ReportCreateArgs) -> Report {
        let mut inner = self.inner.write().await;

        let max_stored = inner.records.iter().map(|r| r.id).max().unwrap_or(ID_ORIGIN);
        let id = inner.high_water.max(max_stored) + 1;
        inner.high_water = id;

        let report = Report {
            id,
            coordinates: args.coordinates,
            title: args.title,
            description: args.description,
            photos: args.photos,
        };
        inner.records.push(report.clone());
        drop(inner);

        debug!(id, "report added");
        self.events.emit(Event::ReportAdded { id });
        report
    }

    /// Remove the report with this id; silent no-op when absent.
    pub async fn remove_report(&self, id: u32) {
        let mut inner = self.inner.write().await;
        let before = inner.records.len();
        inner.records.retain(|r| r.id != id);
        let removed = inner.records.len() != before;
        drop(inner);

        if removed {
            debug!(id, "report removed");
            self.events.emit(Event::ReportRemoved { id });
        }
    }

    /// Empty the store and reset id assignment to its origin.
    pub async fn clear_reports(&self) {
        let mut inner = self.inner.write().await;
        inner.records.clear();
        inner.high_water = ID_ORIGIN;
        drop(inner);

        debug!("reports cleared");
        self.events.emit(Event::ReportsCleared);
    }

    /// Snapshot of all records in creation order.
    pub async fn records(&self) -> Vec<Report> {
        self.inner.read().await.records.clone()
    }

    pub async fn get(&self, id: u32) -> Option<Report> {
        self.inner
            .read()
            .await
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}
