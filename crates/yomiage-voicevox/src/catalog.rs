//! TTL-bound cache for the engine's voice catalog.
//!
//! The cache holds at most one snapshot: the speaker list plus both lookup
//! indices, all built from the same `GET /speakers` response and replaced
//! wholesale. Readers either see a complete snapshot or none at all; there
//! is no partial mutation, so a single lock around the snapshot slot is the
//! only synchronization the cache needs.
//!
//! Refreshes are single-flight. The caller that flips `refresh_in_flight`
//! performs the fetch; callers that race in while it is set fall back to the
//! stale-but-valid snapshot without blocking. The one exception is the very
//! first population, where racers have nothing to fall back on and wait for
//! the winner's fetch to land.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use crate::models::{Speaker, SpeakerStyle, StyleId};

/// One complete, immutable view of the voice catalog.
pub(crate) struct CatalogSnapshot {
    speakers: Vec<Speaker>,
    by_uuid: HashMap<String, usize>,
    by_style_id: HashMap<StyleId, (usize, usize)>,
    fetched_at: Instant,
}

impl CatalogSnapshot {
    /// Build a snapshot, deriving both indices from one speaker list.
    fn build(speakers: Vec<Speaker>) -> Self {
        let mut by_uuid = HashMap::with_capacity(speakers.len());
        let mut by_style_id = HashMap::new();

        for (speaker_idx, speaker) in speakers.iter().enumerate() {
            by_uuid.insert(speaker.speaker_uuid.clone(), speaker_idx);

            for (style_idx, style) in speaker.styles.iter().enumerate() {
                if let Some(previous) =
                    by_style_id.insert(style.id, (speaker_idx, style_idx))
                {
                    // Style ids are globally unique per the engine contract;
                    // keep the first occurrence if that ever breaks.
                    tracing::warn!(
                        style_id = style.id,
                        speaker = %speaker.name,
                        "Duplicate style id in catalog, keeping first occurrence"
                    );
                    by_style_id.insert(style.id, previous);
                }
            }
        }

        Self {
            speakers,
            by_uuid,
            by_style_id,
            fetched_at: Instant::now(),
        }
    }

    pub(crate) fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    pub(crate) fn speaker_by_uuid(&self, uuid: &str) -> Option<&Speaker> {
        self.by_uuid.get(uuid).map(|&idx| &self.speakers[idx])
    }

    pub(crate) fn style_by_id(&self, style_id: StyleId) -> Option<(&Speaker, &SpeakerStyle)> {
        self.by_style_id.get(&style_id).map(|&(s, t)| {
            let speaker = &self.speakers[s];
            (speaker, &speaker.styles[t])
        })
    }
}

/// Cache slot plus the single-flight refresh machinery.
pub(crate) struct CatalogCache {
    ttl: Duration,
    snapshot: RwLock<Option<Arc<CatalogSnapshot>>>,
    refresh_in_flight: AtomicBool,
    /// Signalled whenever a refresh completes (success or failure), waking
    /// first-population waiters.
    refresh_done: Notify,
}

impl CatalogCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            snapshot: RwLock::new(None),
            refresh_in_flight: AtomicBool::new(false),
            refresh_done: Notify::new(),
        }
    }

    /// The current snapshot, fresh or stale.
    pub(crate) fn current(&self) -> Option<Arc<CatalogSnapshot>> {
        self.snapshot.read().unwrap().clone()
    }

    /// Whether the current snapshot is within its TTL.
    pub(crate) fn is_fresh(&self) -> bool {
        self.current()
            .is_some_and(|snapshot| snapshot.fetched_at.elapsed() < self.ttl)
    }

    /// Try to claim the refresh. Returns `true` for the one caller that
    /// should perform the fetch; everyone else gets `false`.
    pub(crate) fn begin_refresh(&self) -> bool {
        !self.refresh_in_flight.swap(true, Ordering::SeqCst)
    }

    /// Complete a claimed refresh. On success the new speaker list is built
    /// into a snapshot and swapped in atomically; on failure the previous
    /// snapshot (if any) keeps serving reads. Either way the in-flight flag
    /// clears and waiters wake.
    pub(crate) fn finish_refresh(&self, speakers: Option<Vec<Speaker>>) {
        if let Some(speakers) = speakers {
            let snapshot = Arc::new(CatalogSnapshot::build(speakers));
            tracing::debug!(speakers = snapshot.speakers.len(), "Voice catalog refreshed");
            *self.snapshot.write().unwrap() = Some(snapshot);
        }
        self.refresh_in_flight.store(false, Ordering::SeqCst);
        self.refresh_done.notify_waiters();
    }

    /// Wait until the in-flight refresh completes (used only before the
    /// first population, when there is no stale snapshot to serve).
    pub(crate) async fn wait_for_refresh(&self) {
        loop {
            let notified = self.refresh_done.notified();
            tokio::pin!(notified);
            // Register interest before re-checking, so a completion between
            // the check and the await cannot be missed.
            notified.as_mut().enable();

            if self.current().is_some() || !self.refresh_in_flight.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }

    /// Drop the cached snapshot; the next lookup refetches.
    pub(crate) fn invalidate(&self) {
        *self.snapshot.write().unwrap() = None;
        tracing::debug!("Voice catalog invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpeakerStyle;

    fn speakers() -> Vec<Speaker> {
        vec![
            Speaker {
                name: "ずんだもん".to_string(),
                speaker_uuid: "uuid-zunda".to_string(),
                styles: vec![
                    SpeakerStyle {
                        name: "ノーマル".to_string(),
                        id: 3,
                    },
                    SpeakerStyle {
                        name: "あまあま".to_string(),
                        id: 1,
                    },
                ],
                version: None,
            },
            Speaker {
                name: "四国めたん".to_string(),
                speaker_uuid: "uuid-metan".to_string(),
                styles: vec![SpeakerStyle {
                    name: "ノーマル".to_string(),
                    id: 2,
                }],
                version: None,
            },
        ]
    }

    #[test]
    fn snapshot_indexes_by_uuid_and_style_id() {
        let snapshot = CatalogSnapshot::build(speakers());

        let speaker = snapshot.speaker_by_uuid("uuid-metan").unwrap();
        assert_eq!(speaker.name, "四国めたん");

        let (speaker, style) = snapshot.style_by_id(1).unwrap();
        assert_eq!(speaker.name, "ずんだもん");
        assert_eq!(style.name, "あまあま");

        assert!(snapshot.speaker_by_uuid("uuid-nobody").is_none());
        assert!(snapshot.style_by_id(999).is_none());
    }

    #[test]
    fn cache_starts_empty_and_stale() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        assert!(cache.current().is_none());
        assert!(!cache.is_fresh());
    }

    #[test]
    fn finish_refresh_installs_snapshot_atomically() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        assert!(cache.begin_refresh());
        // Second claimant loses while the first is in flight.
        assert!(!cache.begin_refresh());

        cache.finish_refresh(Some(speakers()));
        assert!(cache.is_fresh());
        assert_eq!(cache.current().unwrap().speakers().len(), 2);

        // Flag cleared: the next claim wins again.
        assert!(cache.begin_refresh());
        cache.finish_refresh(None);
    }

    #[test]
    fn failed_refresh_keeps_previous_snapshot() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        assert!(cache.begin_refresh());
        cache.finish_refresh(Some(speakers()));

        assert!(cache.begin_refresh());
        cache.finish_refresh(None);
        assert_eq!(cache.current().unwrap().speakers().len(), 2);
    }

    #[test]
    fn zero_ttl_is_always_stale() {
        let cache = CatalogCache::new(Duration::ZERO);
        assert!(cache.begin_refresh());
        cache.finish_refresh(Some(speakers()));
        assert!(cache.current().is_some());
        assert!(!cache.is_fresh());
    }

    #[test]
    fn invalidate_drops_snapshot() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        assert!(cache.begin_refresh());
        cache.finish_refresh(Some(speakers()));
        cache.invalidate();
        assert!(cache.current().is_none());
    }

    #[tokio::test]
    async fn wait_for_refresh_returns_once_populated() {
        let cache = Arc::new(CatalogCache::new(Duration::from_secs(60)));
        assert!(cache.begin_refresh());

        let waiter = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.wait_for_refresh().await })
        };

        // Give the waiter a chance to register.
        tokio::task::yield_now().await;
        cache.finish_refresh(Some(speakers()));

        waiter.await.unwrap();
        assert!(cache.current().is_some());
    }

    #[tokio::test]
    async fn wait_for_refresh_returns_immediately_when_no_refresh_running() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        // No refresh in flight and no snapshot: nothing to wait for.
        cache.wait_for_refresh().await;
    }
}
