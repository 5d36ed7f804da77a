use std::sync::Arc;

use chrono::Utc;

use crate::cache::TicketCache;
use crate::domain::ticket::{Ticket, TicketFields};
use crate::error::AppResult;
use crate::services::TicketBackend;

/// Serves ticket reads from the local cache when it can and keeps that cache
/// mirroring the backend after every successful write.
///
/// A failed backend call never touches the cache.
#[derive(Clone)]
pub struct TicketService {
    backend: Arc<dyn TicketBackend>,
    cache: TicketCache,
}

impl TicketService {
    pub fn new(backend: Arc<dyn TicketBackend>, cache: TicketCache) -> Self {
        Self { backend, cache }
    }

    /// Returns the cached collection unless `force_refresh` is set or the
    /// cache holds nothing, in which case the backend list replaces the cache.
    pub async fn get_all(&self, force_refresh: bool) -> AppResult<Vec<Ticket>> {
        if !force_refresh {
            if let Some(tickets) = self.cache.read() {
                tracing::debug!("serving {} tickets from cache", tickets.len());
                return Ok(tickets);
            }
        }

        let tickets = self.backend.list().await?;
        tracing::debug!("fetched {} tickets from backend", tickets.len());
        self.store(&tickets);
        Ok(tickets)
    }

    pub async fn get(&self, id: u64) -> AppResult<Ticket> {
        if let Some(ticket) = self
            .cache
            .read()
            .and_then(|tickets| tickets.into_iter().find(|t| t.id == id))
        {
            return Ok(ticket);
        }
        self.backend.fetch(id).await
    }

    /// Creates a ticket, filling omitted fields with their defaults.
    pub async fn add(&self, fields: TicketFields) -> AppResult<Ticket> {
        let fields = fields.with_defaults(Utc::now());
        let ticket = self.backend.create(&fields).await?;
        tracing::debug!("created ticket {}", ticket.id);

        self.mirror(|tickets| tickets.push(ticket.clone())).await;
        Ok(ticket)
    }

    /// Applies `patch` on top of the cached copy of the ticket. The id and
    /// creation date never change.
    pub async fn update(&self, id: u64, patch: TicketFields) -> AppResult<Ticket> {
        let patch = patch.into_patch();
        let cached = self
            .cache
            .read()
            .and_then(|tickets| tickets.into_iter().find(|t| t.id == id));
        let body = match &cached {
            Some(current) => patch.merged_onto(current),
            None => patch,
        };

        let ticket = self.backend.replace(id, &body).await?;
        tracing::debug!("updated ticket {id}");

        self.mirror(|tickets| match tickets.iter_mut().find(|t| t.id == id) {
            Some(slot) => *slot = ticket.clone(),
            None => tickets.push(ticket.clone()),
        })
        .await;
        Ok(ticket)
    }

    pub async fn remove(&self, id: u64) -> AppResult<()> {
        self.backend.delete(id).await?;
        tracing::debug!("removed ticket {id}");

        self.mirror(|tickets| tickets.retain(|t| t.id != id)).await;
        Ok(())
    }

    /// Applies a successful write to the cached collection. With nothing
    /// cached yet, the cache is seeded from the backend list instead, which
    /// already includes the write.
    async fn mirror(&self, change: impl FnOnce(&mut Vec<Ticket>)) {
        let tickets = match self.cache.read() {
            Some(mut tickets) => {
                change(&mut tickets);
                tickets
            }
            None => match self.backend.list().await {
                Ok(tickets) => tickets,
                Err(err) => {
                    tracing::warn!("could not seed the ticket cache after a write: {err}");
                    return;
                }
            },
        };
        self.store(&tickets);
    }

    /// Cache write failures after a successful backend call are logged only;
    /// the caller still gets the backend result.
    fn store(&self, tickets: &[Ticket]) {
        if let Err(err) = self.cache.write(tickets) {
            tracing::warn!("backend call succeeded but the cache could not be updated: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::cache::TICKETS_KEY;
    use crate::domain::ticket::{Category, DEFAULT_USER, Priority, Status};
    use crate::error::AppError;
    use crate::infra::mock::MockBackend;
    use crate::storage::{KeyValueStore, MemoryStore};

    /// Counts list calls made against the wrapped backend.
    struct CountingBackend {
        inner: MockBackend,
        lists: AtomicUsize,
    }

    #[async_trait]
    impl TicketBackend for CountingBackend {
        async fn list(&self) -> AppResult<Vec<Ticket>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.list().await
        }
        async fn fetch(&self, id: u64) -> AppResult<Ticket> {
            self.inner.fetch(id).await
        }
        async fn create(&self, fields: &TicketFields) -> AppResult<Ticket> {
            self.inner.create(fields).await
        }
        async fn replace(&self, id: u64, fields: &TicketFields) -> AppResult<Ticket> {
            self.inner.replace(id, fields).await
        }
        async fn delete(&self, id: u64) -> AppResult<()> {
            self.inner.delete(id).await
        }
    }

    struct Harness {
        backend: Arc<CountingBackend>,
        store: Arc<MemoryStore>,
        service: TicketService,
    }

    impl Harness {
        fn seeded() -> Self {
            let backend = Arc::new(CountingBackend {
                inner: MockBackend::seeded(Duration::ZERO),
                lists: AtomicUsize::new(0),
            });
            let store = Arc::new(MemoryStore::new());
            let service = TicketService::new(backend.clone(), TicketCache::new(store.clone()));
            Self {
                backend,
                store,
                service,
            }
        }

        fn list_calls(&self) -> usize {
            self.backend.lists.load(Ordering::SeqCst)
        }

        fn cached_raw(&self) -> Option<String> {
            self.store.get_item(TICKETS_KEY).unwrap()
        }
    }

    fn ids(tickets: &[Ticket]) -> BTreeSet<u64> {
        tickets.iter().map(|t| t.id).collect()
    }

    fn submission() -> TicketFields {
        TicketFields {
            title: Some("X test ticket".to_string()),
            description: Some("a description long enough".to_string()),
            category: Some(Category::BugReport),
            priority: Some(Priority::High),
            ..TicketFields::default()
        }
    }

    #[tokio::test]
    async fn add_then_refresh_then_remove_scenario() {
        let h = Harness::seeded();
        h.service.get_all(true).await.unwrap();

        let created = h.service.add(submission()).await.unwrap();
        assert_eq!(created.id, 3);
        assert_eq!(created.status, Status::Open);
        assert_eq!(created.user, DEFAULT_USER);
        assert_eq!(created.category, Category::BugReport);
        assert_eq!(created.priority, Priority::High);

        let all = h.service.get_all(true).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.iter().filter(|t| t.id == 3).count(), 1);

        h.service.remove(2).await.unwrap();
        let all = h.service.get_all(true).await.unwrap();
        assert_eq!(ids(&all), BTreeSet::from([1, 3]));
    }

    #[tokio::test]
    async fn cached_reads_skip_the_backend() {
        let h = Harness::seeded();
        let first = h.service.get_all(false).await.unwrap();
        assert_eq!(h.list_calls(), 1);

        let second = h.service.get_all(false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(h.list_calls(), 1);

        h.service.add(submission()).await.unwrap();
        let third = h.service.get_all(false).await.unwrap();
        assert_eq!(third.len(), 3);
        assert_eq!(h.list_calls(), 1);

        h.service.get_all(true).await.unwrap();
        assert_eq!(h.list_calls(), 2);
    }

    #[tokio::test]
    async fn corrupt_cache_falls_back_to_backend() {
        let h = Harness::seeded();
        h.store.set_item(TICKETS_KEY, "not json at all").unwrap();

        let tickets = h.service.get_all(false).await.unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(h.list_calls(), 1);
        assert!(h.cached_raw().unwrap().starts_with('['));
    }

    #[tokio::test]
    async fn writes_keep_cache_mirroring_backend() {
        let h = Harness::seeded();
        h.service.get_all(true).await.unwrap();

        h.service.add(submission()).await.unwrap();
        h.service
            .update(1, TicketFields::status(Status::Closed))
            .await
            .unwrap();
        h.service.remove(2).await.unwrap();

        let cached = h.service.get_all(false).await.unwrap();
        let authoritative = h.backend.inner.snapshot().await;
        assert_eq!(cached, authoritative);
    }

    #[tokio::test]
    async fn update_changes_only_the_patched_field() {
        let h = Harness::seeded();
        let before = h.service.get_all(true).await.unwrap();

        let updated = h
            .service
            .update(2, TicketFields::status(Status::Resolved))
            .await
            .unwrap();
        assert_eq!(updated.status, Status::Resolved);

        let after = h.service.get_all(true).await.unwrap();
        let old = serde_json::to_value(&before[1]).unwrap();
        let new = serde_json::to_value(&after[1]).unwrap();
        for field in ["id", "titulo", "descripcion", "categoria", "prioridad", "fecha", "usuario"] {
            assert_eq!(old[field], new[field], "field {field} changed");
        }
        assert_eq!(new["estado"], "resuelto");
        assert_eq!(before[0], after[0]);
    }

    #[tokio::test]
    async fn update_keeps_collection_order() {
        let h = Harness::seeded();
        h.service.get_all(true).await.unwrap();
        h.service
            .update(1, TicketFields::status(Status::Closed))
            .await
            .unwrap();

        let cached = h.service.get_all(false).await.unwrap();
        assert_eq!(cached.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(cached[0].status, Status::Closed);
    }

    #[tokio::test]
    async fn update_of_uncached_ticket_adds_it_to_cache() {
        let h = Harness::seeded();
        h.service.get_all(true).await.unwrap();
        // Created elsewhere after this cache was filled.
        h.backend.inner.create(&submission()).await.unwrap();

        let updated = h
            .service
            .update(3, TicketFields::status(Status::Resolved))
            .await
            .unwrap();
        assert_eq!(updated.id, 3);

        let cached = h.service.get_all(false).await.unwrap();
        assert_eq!(cached, h.backend.inner.snapshot().await);
        assert_eq!(cached[2].status, Status::Resolved);
    }

    /// Reads come back empty and every write is refused.
    struct FullDisk;

    impl KeyValueStore for FullDisk {
        fn get_item(&self, _key: &str) -> AppResult<Option<String>> {
            Ok(None)
        }
        fn set_item(&self, _key: &str, _value: &str) -> AppResult<()> {
            Err(AppError::Storage("no space left".to_string()))
        }
        fn remove_item(&self, _key: &str) -> AppResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn cache_write_failures_do_not_fail_backend_results() {
        let backend = Arc::new(MockBackend::seeded(Duration::ZERO));
        let service = TicketService::new(backend.clone(), TicketCache::new(Arc::new(FullDisk)));

        assert_eq!(service.get_all(true).await.unwrap().len(), 2);
        let created = service.add(submission()).await.unwrap();
        service
            .update(created.id, TicketFields::status(Status::Closed))
            .await
            .unwrap();
        service.remove(1).await.unwrap();

        assert_eq!(ids(&backend.snapshot().await), BTreeSet::from([2, 3]));
    }

    #[tokio::test]
    async fn removing_unknown_id_leaves_collection_alone() {
        let h = Harness::seeded();
        h.service.get_all(true).await.unwrap();
        let raw_before = h.cached_raw();

        let err = h.service.remove(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(42)));
        assert_eq!(h.cached_raw(), raw_before);
        assert_eq!(h.service.get_all(true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn updating_unknown_id_is_not_found() {
        let h = Harness::seeded();
        h.service.get_all(true).await.unwrap();
        let err = h
            .service
            .update(42, TicketFields::status(Status::Closed))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(42)));
    }

    #[tokio::test]
    async fn failed_backend_calls_leave_cache_untouched() {
        let h = Harness::seeded();
        h.service.get_all(true).await.unwrap();
        let raw_before = h.cached_raw();
        h.backend.inner.set_reachable(false).await;

        assert!(h.service.add(submission()).await.unwrap_err().is_transport());
        assert!(
            h.service
                .update(1, TicketFields::status(Status::Closed))
                .await
                .unwrap_err()
                .is_transport()
        );
        assert!(h.service.remove(1).await.unwrap_err().is_transport());
        assert!(h.service.get_all(true).await.unwrap_err().is_transport());

        assert_eq!(h.cached_raw(), raw_before);
        assert_eq!(h.service.get_all(false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn write_without_a_cache_seeds_it_from_backend() {
        let h = Harness::seeded();
        h.service.remove(1).await.unwrap();
        assert_eq!(h.list_calls(), 1);

        let cached = h.service.get_all(false).await.unwrap();
        assert_eq!(ids(&cached), BTreeSet::from([2]));
        assert_eq!(h.list_calls(), 1);
    }

    #[tokio::test]
    async fn cleared_cache_is_reseeded_on_next_write() {
        let h = Harness::seeded();
        h.service.add(submission()).await.unwrap();
        assert!(h.cached_raw().is_some());

        h.store.remove_item(TICKETS_KEY).unwrap();
        h.service.remove(3).await.unwrap();
        assert_eq!(
            ids(&h.service.get_all(false).await.unwrap()),
            BTreeSet::from([1, 2])
        );
    }

    #[tokio::test]
    async fn get_prefers_cache_then_backend() {
        let h = Harness::seeded();
        let ticket = h.service.get(2).await.unwrap();
        assert_eq!(ticket.id, 2);
        assert_eq!(h.list_calls(), 0);

        assert!(matches!(
            h.service.get(99).await,
            Err(AppError::NotFound(99))
        ));
    }
}
