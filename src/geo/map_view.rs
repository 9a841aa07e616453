//! Viewport-driven partner map.
//!
//! Pan and zoom events are debounced into one query after a quiet period,
//! and every issued query carries a sequence number. A result is applied
//! only if no later query has been issued since, so a slow early response
//! can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::errors::{ConsoleError, Result};
use crate::models::{BoundingBox, MapPartner, MapQuery, PartnerStatus, PartnerType};
use crate::promotions::PromotionsClient;

/// Monotonic issue counter deciding which completion may be applied.
#[derive(Debug, Default)]
pub struct SequenceGate {
    issued: AtomicU64,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number for a newly issued request; starts at 1.
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Whether a request issued as `sequence` is still the newest.
    pub fn is_current(&self, sequence: u64) -> bool {
        sequence == self.latest()
    }
}

/// Filters applied to every map query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapFilters {
    pub partner_type: Option<PartnerType>,
    pub status: Option<PartnerStatus>,
    pub search: Option<String>,
}

/// What the map currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapSnapshot {
    pub partners: Vec<MapPartner>,
    /// Sequence number of the query these partners came from; 0 before any
    pub sequence: u64,
    pub error: Option<ConsoleError>,
}

struct MapViewInner {
    client: PromotionsClient,
    debounce: Duration,
    triggers: AtomicU64,
    gate: SequenceGate,
    filters: Mutex<MapFilters>,
    snapshot: watch::Sender<MapSnapshot>,
}

/// Partner map state shared between the event handlers and query tasks.
#[derive(Clone)]
pub struct MapView {
    inner: Arc<MapViewInner>,
}

impl MapView {
    pub fn new(client: PromotionsClient, debounce: Duration) -> Self {
        let (snapshot, _) = watch::channel(MapSnapshot::default());
        Self {
            inner: Arc::new(MapViewInner {
                client,
                debounce,
                triggers: AtomicU64::new(0),
                gate: SequenceGate::new(),
                filters: Mutex::new(MapFilters::default()),
                snapshot,
            }),
        }
    }

    pub fn snapshot(&self) -> MapSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MapSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Number of queries actually sent so far.
    pub fn issued_queries(&self) -> u64 {
        self.inner.gate.latest()
    }

    /// Filters take effect on the next query.
    pub fn set_filters(&self, filters: MapFilters) {
        *self
            .inner
            .filters
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = filters;
    }

    /// React to a pan or zoom. The query is sent once no further viewport
    /// change has arrived for the debounce window.
    pub fn viewport_changed(&self, bbox: BoundingBox, zoom: u8) -> JoinHandle<()> {
        let trigger = self.inner.triggers.fetch_add(1, Ordering::SeqCst) + 1;
        let view = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(view.inner.debounce).await;
            if view.inner.triggers.load(Ordering::SeqCst) != trigger {
                return;
            }
            // Superseded results are already discarded inside `load_now`.
            let _ = view.load_now(bbox, zoom).await;
        })
    }

    /// Query immediately, bypassing the debounce. Returns whether the
    /// result was applied.
    pub async fn load_now(&self, bbox: BoundingBox, zoom: u8) -> Result<bool> {
        let query = self.query(bbox, zoom);
        let sequence = self.inner.gate.issue();
        tracing::debug!(sequence, bbox = %query.bbox.to_param(), zoom, "Map query issued");

        let result = self.inner.client.map_partners(&query).await;
        let failure = result.as_ref().err().cloned();
        let applied = self.complete(sequence, result);

        match failure {
            Some(e) if applied => Err(e),
            _ => Ok(applied),
        }
    }

    /// Apply a completed query if it is still the newest one issued.
    fn complete(&self, sequence: u64, result: Result<Vec<MapPartner>>) -> bool {
        if !self.inner.gate.is_current(sequence) {
            tracing::debug!(
                sequence,
                latest = self.inner.gate.latest(),
                "Discarding superseded map result"
            );
            return false;
        }

        let snapshot = match result {
            Ok(partners) => MapSnapshot {
                partners,
                sequence,
                error: None,
            },
            Err(e) => MapSnapshot {
                partners: Vec::new(),
                sequence,
                error: Some(e),
            },
        };
        self.inner.snapshot.send_replace(snapshot);
        true
    }

    fn query(&self, bbox: BoundingBox, zoom: u8) -> MapQuery {
        let filters = self
            .inner
            .filters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        MapQuery {
            bbox,
            zoom,
            partner_type: filters.partner_type,
            status: filters.status,
            search: filters.search,
        }
    }
}
