//! Paged search results.
//!
//! `ResultsPaginator` owns the current page, asks a [`SearchBackend`] for
//! pages, decorates each listing with its open/closed state, and discards
//! responses that were overtaken by a newer search.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, instrument};

use models::pagination::PaginationState;
use models::search::{SearchQuery, SearchResponse, SearchResult};

use crate::errors::ServiceError;
use crate::hours::{self, Clock, LocalClock};

/// Anything that can answer a validated search query.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ServiceError>;
}

/// One applied page of results.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultPage {
    pub query: SearchQuery,
    pub items: Vec<SearchResult>,
    pub pagination: PaginationState,
    pub generation: u64,
}

impl ResultPage {
    pub fn is_first_page(&self) -> bool {
        self.pagination.page == 1
    }

    /// Coordinates of the first item, used to recenter the map.
    pub fn focus(&self) -> Option<(f64, f64)> {
        self.items.first().map(|r| (r.store.latitude, r.store.longitude))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PageOutcome {
    Page(ResultPage),
    /// Zero matches. A successful search, distinct from a transport error.
    Empty { query: SearchQuery, pagination: PaginationState },
    /// A newer search was issued while this one was in flight; nothing was applied.
    Stale { generation: u64 },
}

impl PageOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, PageOutcome::Empty { .. })
    }

    pub fn page(&self) -> Option<&ResultPage> {
        match self {
            PageOutcome::Page(p) => Some(p),
            _ => None,
        }
    }
}

pub struct ResultsPaginator<B: SearchBackend> {
    backend: Arc<B>,
    clock: Arc<dyn Clock>,
    generation: AtomicU64,
    current: Mutex<Option<ResultPage>>,
}

impl<B: SearchBackend> ResultsPaginator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_clock(backend, Arc::new(LocalClock))
    }

    pub fn with_clock(backend: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock, generation: AtomicU64::new(0), current: Mutex::new(None) }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ResultPage>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last applied page, if any.
    pub fn current(&self) -> Option<ResultPage> {
        self.lock().clone()
    }

    pub fn pagination(&self) -> Option<PaginationState> {
        self.lock().as_ref().map(|p| p.pagination)
    }

    /// Fetch `query` and replace the current result set with it.
    ///
    /// A page past the end (the backend total shrank since the last fetch) is
    /// refetched at the last page, so the applied query and pagination always
    /// name the same page.
    #[instrument(skip(self, query), fields(page = query.page, limit = query.limit))]
    pub async fn fetch_page(&self, mut query: SearchQuery) -> Result<PageOutcome, ServiceError> {
        loop {
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let response = self.backend.search(&query).await;

            // Checked under the lock so a newer search can't be overwritten.
            let mut current = self.lock();
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!(event = "stale_search_discarded", generation, "newer search issued; dropping response");
                return Ok(PageOutcome::Stale { generation });
            }
            let response = response?;

            let pagination = PaginationState::new(query.page, query.limit, response.total);
            if pagination.page != query.page {
                query = query.with_page(pagination.page);
                if !pagination.is_empty() {
                    drop(current);
                    debug!(last_page = pagination.page, "requested page past the end; refetching last page");
                    continue;
                }
            }

            let now = self.clock.now();
            let items = response
                .results
                .into_iter()
                .map(|store| {
                    let open_status = hours::evaluate(&store.weekly_hours, now);
                    SearchResult { store, open_status }
                })
                .collect();
            let page = ResultPage { query, items, pagination, generation };
            *current = Some(page.clone());
            drop(current);

            debug!(total = pagination.total, total_pages = pagination.total_pages, "page applied");
            if pagination.is_empty() {
                return Ok(PageOutcome::Empty { query: page.query, pagination });
            }
            return Ok(PageOutcome::Page(page));
        }
    }

    /// Advance one page; `Ok(None)` when already on the last page.
    pub async fn next_page(&self) -> Result<Option<PageOutcome>, ServiceError> {
        let next = {
            let current = self.lock();
            match current.as_ref() {
                Some(p) if p.pagination.has_next() => p.query.with_page(p.pagination.page + 1),
                _ => return Ok(None),
            }
        };
        self.fetch_page(next).await.map(Some)
    }

    /// Go back one page; `Ok(None)` when already on the first page.
    pub async fn prev_page(&self) -> Result<Option<PageOutcome>, ServiceError> {
        let prev = {
            let current = self.lock();
            match current.as_ref() {
                Some(p) if p.pagination.has_prev() => p.query.with_page(p.pagination.page - 1),
                _ => return Ok(None),
            }
        };
        self.fetch_page(prev).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hours::FixedClock;
    use crate::transport::TransportError;
    use chrono::NaiveDate;
    use models::search::OpenStatus;
    use models::store::{StoreListing, WeeklyHours};
    use std::collections::BTreeSet;
    use std::time::Duration;

    /// Serves `total` numbered stores; `slow` terms take longer to answer.
    struct FakeBackend {
        total: u64,
        fail: bool,
    }

    impl FakeBackend {
        fn with_total(total: u64) -> Self {
            Self { total, fail: false }
        }
    }

    #[async_trait]
    impl SearchBackend for FakeBackend {
        async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ServiceError> {
            if query.location_term == "slow" {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            if self.fail {
                return Err(TransportError::Network("down".into()).into());
            }
            let start = u64::from(query.page - 1) * u64::from(query.limit);
            let end = (start + u64::from(query.limit)).min(self.total);
            let results = (start..end)
                .map(|i| StoreListing {
                    store_id: format!("S-{i}"),
                    name: format!("Store {i}"),
                    latitude: 34.0 + i as f64,
                    longitude: -118.0,
                    weekly_hours: WeeklyHours::business_week(),
                    ..StoreListing::default()
                })
                .collect();
            Ok(SearchResponse { results, total: self.total, ..SearchResponse::default() })
        }
    }

    fn query(term: &str, page: u32) -> SearchQuery {
        SearchQuery {
            location_term: term.into(),
            radius_miles: 50.0,
            store_type: None,
            services: BTreeSet::new(),
            open_now_only: false,
            page,
            limit: 10,
        }
    }

    fn paginator(backend: FakeBackend) -> ResultsPaginator<FakeBackend> {
        // Monday 10:00
        let now = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        ResultsPaginator::with_clock(Arc::new(backend), Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn page_is_decorated_and_stored() -> Result<(), ServiceError> {
        let p = paginator(FakeBackend::with_total(25));
        let outcome = p.fetch_page(query("90210", 1)).await?;
        let page = outcome.page().expect("page");
        assert_eq!(page.items.len(), 10);
        assert!(page.items.iter().all(|r| r.open_status == OpenStatus::Open));
        assert_eq!(page.pagination, PaginationState::new(1, 10, 25));
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.is_first_page());
        assert_eq!(page.focus(), Some((34.0, -118.0)));
        assert_eq!(p.current().as_ref(), Some(page));
        Ok(())
    }

    #[tokio::test]
    async fn zero_total_is_empty_not_error() -> Result<(), ServiceError> {
        let p = paginator(FakeBackend::with_total(0));
        let outcome = p.fetch_page(query("90210", 1)).await?;
        assert!(outcome.is_empty());
        assert_eq!(p.pagination().map(|s| s.total_pages), Some(0));
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_is_an_error() {
        let p = paginator(FakeBackend { fail: true, ..FakeBackend::with_total(5) });
        let err = p.fetch_page(query("90210", 1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Transport(TransportError::Network(_))));
        assert!(p.current().is_none());
    }

    #[tokio::test]
    async fn same_query_twice_yields_same_state() -> Result<(), ServiceError> {
        let p = paginator(FakeBackend::with_total(25));
        let first = p.fetch_page(query("90210", 2)).await?;
        let second = p.fetch_page(query("90210", 2)).await?;
        let (a, b) = (first.page().unwrap(), second.page().unwrap());
        assert_eq!(a.pagination, b.pagination);
        assert_eq!(a.items, b.items);
        Ok(())
    }

    #[tokio::test]
    async fn navigation_is_bounded() -> Result<(), ServiceError> {
        let backend = FakeBackend::with_total(25);
        let p = paginator(backend);

        assert!(p.next_page().await?.is_none(), "nothing fetched yet");

        p.fetch_page(query("90210", 1)).await?;
        assert!(p.prev_page().await?.is_none(), "already on first page");

        p.next_page().await?.expect("page 2");
        p.next_page().await?.expect("page 3");
        assert_eq!(p.pagination().unwrap().page, 3);
        assert!(p.next_page().await?.is_none(), "already on last page");
        assert_eq!(p.current().unwrap().items.len(), 5);

        p.prev_page().await?.expect("page 2");
        assert_eq!(p.pagination().unwrap().page, 2);
        Ok(())
    }

    #[tokio::test]
    async fn new_fetch_replaces_previous_results() -> Result<(), ServiceError> {
        let p = paginator(FakeBackend::with_total(25));
        p.fetch_page(query("90210", 1)).await?;
        p.fetch_page(query("10001", 3)).await?;
        let current = p.current().unwrap();
        assert_eq!(current.query.location_term, "10001");
        assert_eq!(current.items.len(), 5);
        assert_eq!(current.items[0].store.store_id, "S-20");
        Ok(())
    }

    #[tokio::test]
    async fn page_past_the_end_lands_on_last_page() -> Result<(), ServiceError> {
        let p = paginator(FakeBackend::with_total(25));
        let page = p.fetch_page(query("90210", 9)).await?.page().cloned().expect("page");
        assert_eq!(page.pagination.page, 3);
        assert_eq!(page.query.page, 3);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0].store.store_id, "S-20");
        assert!(p.next_page().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn empty_result_keeps_query_and_pagination_in_step() -> Result<(), ServiceError> {
        let p = paginator(FakeBackend::with_total(0));
        let PageOutcome::Empty { query: applied, pagination } = p.fetch_page(query("90210", 4)).await? else {
            panic!("expected empty outcome")
        };
        assert_eq!(applied.page, pagination.page);
        assert_eq!(p.current().unwrap().query.page, 1);
        Ok(())
    }

    #[tokio::test]
    async fn overtaken_response_is_discarded() -> Result<(), ServiceError> {
        let p = paginator(FakeBackend::with_total(25));
        let (slow, fast) = tokio::join!(p.fetch_page(query("slow", 1)), p.fetch_page(query("fast", 2)));
        assert!(matches!(slow?, PageOutcome::Stale { generation: 1 }));
        assert!(fast?.page().is_some());
        let current = p.current().unwrap();
        assert_eq!(current.query.location_term, "fast");
        assert_eq!(current.generation, 2);
        Ok(())
    }
}
