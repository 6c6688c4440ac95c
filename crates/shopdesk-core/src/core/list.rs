//! Resource list hook
//!
//! [`ListController`] is the synchronous core: filter tuple, generation
//! counter and list state. [`ResourceList`] drives it with spawned fetches
//! and publishes every state change on a `watch` channel.
//!
//! Only the response of the latest generation may touch the state. Older
//! responses, successful or not, are dropped on arrival.

use crate::api::client::ApiClient;
use crate::core::feedback::Feedback;
use crate::core::resource::{ListFilters, Page, Resource, Stats};
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Observable state of one list hook.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    pub items: Vec<Value>,
    pub stats: Stats,
    pub total_pages: u32,
    pub total_items: u64,
    pub loading: bool,
    pub error: Option<String>,
}

impl ListState {
    pub fn empty(stats: Stats) -> Self {
        Self {
            items: Vec::new(),
            stats,
            total_pages: 1,
            total_items: 0,
            loading: false,
            error: None,
        }
    }
}

/// A fetch the caller must perform and report back with [`ListController::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket<F> {
    pub generation: u64,
    pub filters: F,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Applied,
    Failed(String),
    Stale,
}

#[derive(Debug, Clone)]
pub struct ListController<F> {
    filters: F,
    generation: u64,
    state: ListState,
}

impl<F: ListFilters> ListController<F> {
    pub fn new(filters: F, stats: Stats) -> Self {
        Self {
            filters,
            generation: 0,
            state: ListState::empty(stats),
        }
    }

    pub fn filters(&self) -> &F {
        &self.filters
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Enter Fetching with the current filters under a new generation.
    pub fn begin(&mut self) -> FetchTicket<F> {
        self.generation = self.generation.wrapping_add(1);
        self.state.loading = true;
        FetchTicket {
            generation: self.generation,
            filters: self.filters.clone(),
        }
    }

    /// Replace the filter tuple. An equal tuple is not a change and starts nothing.
    pub fn set_filters(&mut self, filters: F) -> Option<FetchTicket<F>> {
        if filters == self.filters {
            return None;
        }
        self.filters = filters;
        Some(self.begin())
    }

    /// Apply the result of the fetch issued under `generation`.
    pub fn complete(&mut self, generation: u64, result: Result<Page, ApiError>) -> Completion {
        if generation != self.generation {
            return Completion::Stale;
        }

        self.state.loading = false;
        match result {
            Ok(page) => {
                self.state.items = page.items;
                self.state.stats = page.stats;
                self.state.total_pages = page.total_pages;
                self.state.total_items = page.total_items;
                self.state.error = None;
                Completion::Applied
            }
            Err(e) => {
                let message = e.user_message();
                self.state.error = Some(message.clone());
                Completion::Failed(message)
            }
        }
    }
}

/// Where list pages come from. Implemented by [`ApiClient`] for every resource.
#[async_trait]
pub trait ListSource<R: Resource>: Send + Sync + 'static {
    async fn fetch_page(&self, filters: &R::Filters) -> Result<Page, ApiError>;
}

#[async_trait]
impl<R: Resource> ListSource<R> for ApiClient {
    async fn fetch_page(&self, filters: &R::Filters) -> Result<Page, ApiError> {
        let envelope = self.list_resource(R::PATH, filters.query_pairs()).await?;
        Page::extract::<R>(envelope)
    }
}

struct Shared<R: Resource, S> {
    source: S,
    feedback: Arc<dyn Feedback>,
    controller: Mutex<ListController<R::Filters>>,
    state_tx: watch::Sender<ListState>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<R: Resource, S: ListSource<R>> Shared<R, S> {
    fn finish(&self, generation: u64, result: Result<Page, ApiError>) {
        let completion = {
            let mut controller = lock(&self.controller);
            let completion = controller.complete(generation, result);
            if completion != Completion::Stale {
                self.state_tx.send_replace(controller.state().clone());
            }
            completion
        };

        match completion {
            Completion::Applied => {
                log::debug!("{} list updated (generation {})", R::LABEL, generation)
            }
            Completion::Failed(message) => {
                log::warn!("{} list fetch failed: {}", R::LABEL, message);
                self.feedback.error(&message);
            }
            Completion::Stale => {
                log::debug!(
                    "Discarding stale {} response (generation {})",
                    R::LABEL,
                    generation
                )
            }
        }
    }
}

/// List hook for one resource: `{loading, items, stats, total_pages, total_items, error}`
/// plus `refetch`. Fetches on construction and whenever the filter tuple changes.
///
/// Must be created inside a Tokio runtime. Dropping the hook aborts its in-flight fetches.
pub struct ResourceList<R: Resource, S: ListSource<R> = ApiClient> {
    shared: Arc<Shared<R, S>>,
}

impl<R: Resource, S: ListSource<R>> ResourceList<R, S> {
    pub fn new(source: S, filters: R::Filters, feedback: Arc<dyn Feedback>) -> Self {
        let controller = ListController::new(filters, R::default_stats());
        let (state_tx, _) = watch::channel(controller.state().clone());
        let list = Self {
            shared: Arc::new(Shared {
                source,
                feedback,
                controller: Mutex::new(controller),
                state_tx,
                tasks: Mutex::new(Vec::new()),
            }),
        };
        list.refetch();
        list
    }

    pub fn state(&self) -> ListState {
        self.shared.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.shared.state_tx.subscribe()
    }

    pub fn filters(&self) -> R::Filters {
        lock(&self.shared.controller).filters().clone()
    }

    pub fn generation(&self) -> u64 {
        lock(&self.shared.controller).generation()
    }

    /// Returns `true` when the tuple changed and a fetch was started.
    pub fn set_filters(&self, filters: R::Filters) -> bool {
        let ticket = {
            let mut controller = lock(&self.shared.controller);
            let ticket = controller.set_filters(filters);
            if ticket.is_some() {
                self.shared.state_tx.send_replace(controller.state().clone());
            }
            ticket
        };
        match ticket {
            Some(ticket) => {
                self.spawn_fetch(ticket);
                true
            }
            None => false,
        }
    }

    /// Edit a copy of the current filters and apply it.
    pub fn update_filters(&self, edit: impl FnOnce(&mut R::Filters)) -> bool {
        let mut filters = self.filters();
        edit(&mut filters);
        self.set_filters(filters)
    }

    /// Fetch again with the last-used filters.
    pub fn refetch(&self) {
        let ticket = {
            let mut controller = lock(&self.shared.controller);
            let ticket = controller.begin();
            self.shared.state_tx.send_replace(controller.state().clone());
            ticket
        };
        self.spawn_fetch(ticket);
    }

    /// Wait until no fetch is pending and return the state at that point.
    pub async fn settled(&self) -> ListState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket<R::Filters>) {
        log::debug!(
            "Fetching {} list (generation {}): {:?}",
            R::LABEL,
            ticket.generation,
            ticket.filters
        );
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let result = shared.source.fetch_page(&ticket.filters).await;
            shared.finish(ticket.generation, result);
        });

        let mut tasks = lock(&self.shared.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }
}

impl<R: Resource, S: ListSource<R>> Drop for ResourceList<R, S> {
    fn drop(&mut self) {
        for task in lock(&self.shared.tasks).drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resource::{ProductFilters, Products};
    use serde_json::json;

    fn page(ids: &[&str]) -> Page {
        Page {
            items: ids.iter().map(|id| json!({"_id": id})).collect(),
            stats: Products::default_stats(),
            total_pages: 1,
            total_items: ids.len() as u64,
        }
    }

    fn controller() -> ListController<ProductFilters> {
        ListController::new(ProductFilters::default(), Products::default_stats())
    }

    fn search(term: &str) -> ProductFilters {
        ProductFilters {
            search: term.to_string(),
            ..ProductFilters::default()
        }
    }

    #[test]
    fn test_begin_enters_fetching() {
        let mut c = controller();
        assert!(!c.state().loading);
        let ticket = c.begin();
        assert_eq!(ticket.generation, 1);
        assert!(c.state().loading);
    }

    #[test]
    fn test_equal_filters_do_not_refetch() {
        let mut c = controller();
        assert!(c.set_filters(ProductFilters::default()).is_none());
        assert_eq!(c.generation(), 0);
        assert!(c.set_filters(search("shirt")).is_some());
        assert_eq!(c.generation(), 1);
    }

    #[test]
    fn test_out_of_order_responses_keep_latest() {
        let mut c = controller();
        let first = c.set_filters(search("s")).unwrap();
        let second = c.set_filters(search("sh")).unwrap();

        assert_eq!(c.complete(second.generation, Ok(page(&["b"]))), Completion::Applied);
        assert_eq!(c.complete(first.generation, Ok(page(&["a1", "a2"]))), Completion::Stale);

        assert_eq!(c.state().items, vec![json!({"_id": "b"})]);
        assert_eq!(c.state().total_items, 1);
        assert!(!c.state().loading);
    }

    #[test]
    fn test_stale_response_does_not_clear_loading() {
        let mut c = controller();
        let first = c.begin();
        let _second = c.begin();
        assert_eq!(c.complete(first.generation, Ok(page(&["a"]))), Completion::Stale);
        assert!(c.state().loading);
        assert!(c.state().items.is_empty());
    }

    #[test]
    fn test_failure_keeps_previous_data() {
        let mut c = controller();
        let t = c.begin();
        c.complete(t.generation, Ok(page(&["a", "b"])));

        let t = c.begin();
        let completion = c.complete(
            t.generation,
            Err(ApiError::Api {
                status: 500,
                endpoint: "/product".to_string(),
                message: "Database unavailable".to_string(),
            }),
        );
        assert_eq!(completion, Completion::Failed("Database unavailable".to_string()));
        assert_eq!(c.state().items.len(), 2);
        assert_eq!(c.state().error.as_deref(), Some("Database unavailable"));
        assert!(!c.state().loading);

        let t = c.begin();
        c.complete(t.generation, Ok(page(&[])));
        assert_eq!(c.state().error, None);
        assert!(c.state().items.is_empty());
    }

    #[test]
    fn test_stale_failure_is_discarded() {
        let mut c = controller();
        let first = c.begin();
        let second = c.begin();
        c.complete(second.generation, Ok(page(&["b"])));
        let completion = c.complete(
            first.generation,
            Err(ApiError::Network {
                endpoint: "/product".to_string(),
                message: "connection reset".to_string(),
            }),
        );
        assert_eq!(completion, Completion::Stale);
        assert_eq!(c.state().error, None);
    }
}
