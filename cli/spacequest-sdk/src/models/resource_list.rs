//! The resource list controller.
//!
//! A [`ResourceListController`] owns everything a list of one catalog
//! resource needs: the fetched snapshot, the debounced search term and the
//! page cursor. It fetches the whole collection once and filters and
//! paginates it locally, so page turns and searches never hit the network.
//!
//! At most one request is outstanding per controller. Starting a fetch
//! cancels the previous one and bumps the request epoch; a completion is only
//! applied if it carries the current epoch, so a late response can never
//! overwrite newer state even if the client ignored the cancellation.
//!
//! All commands take `&self` and must be called from within a tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use derive_more::Display;
use serde::de::DeserializeOwned;
use spacequest_catalog::{
    CancellationToken,
    CatalogClientError,
    CatalogResponse,
    Client,
    ClientTrait,
    FetchHints,
    Resource,
};
use tokio::sync::watch;
use tracing::{Instrument, debug, debug_span, warn};

use super::debounce::{Debouncer, SEARCH_DEBOUNCE};
use super::filter::{Searchable, filter_items};
use super::view::{PageWindow, clamp_page};

/// Records a controller can list.
pub trait ListItem: Searchable + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> ListItem for T where T: Searchable + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Lifecycle phase of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    #[display("loading")]
    Loading,
    #[display("ready")]
    Ready,
    #[display("errored")]
    Errored,
    #[display("unmounted")]
    Unmounted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Page to show once data arrives; clamped into range at that point.
    pub initial_page: u32,
    pub search_debounce: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            initial_page: 1,
            search_debounce: SEARCH_DEBOUNCE,
        }
    }
}

/// Everything a presentation layer shows for a list, derived from the
/// controller state at one revision.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceListView<T> {
    pub resource: Resource,
    /// Items visible on the current page.
    pub items: Vec<T>,
    pub phase: Phase,
    pub is_loading: bool,
    pub error: Option<String>,
    pub page: u32,
    pub page_count: u32,
    /// Number of items matching the committed search term.
    pub total_count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub search_term: String,
    pub pending_search_term: String,
}

#[derive(Debug)]
struct ControllerState<T> {
    resource: Resource,
    raw_items: Vec<T>,
    search_term: String,
    pending_search_term: String,
    search_generation: u64,
    search_pending: bool,
    page: u32,
    phase: Phase,
    error: Option<String>,
    request_epoch: u64,
    in_flight: Option<CancellationToken>,
}

impl<T> ControllerState<T> {
    fn new(resource: Resource, initial_page: u32) -> Self {
        Self {
            resource,
            raw_items: Vec::new(),
            search_term: String::new(),
            pending_search_term: String::new(),
            search_generation: 0,
            search_pending: false,
            page: initial_page.max(1),
            phase: Phase::Loading,
            error: None,
            request_epoch: 0,
            in_flight: None,
        }
    }

    fn is_unmounted(&self) -> bool {
        self.phase == Phase::Unmounted
    }

    fn is_settled(&self) -> bool {
        self.phase != Phase::Loading && !self.search_pending
    }
}

impl<T: Searchable + Clone> ControllerState<T> {
    fn window(&self) -> (Vec<&T>, PageWindow) {
        let filtered = filter_items(&self.raw_items, &self.search_term);
        let window = PageWindow::new(filtered.len(), self.page);
        (filtered, window)
    }

    fn clamp_page(&mut self) {
        let (_, window) = self.window();
        self.page = window.page;
    }

    fn view(&self) -> ResourceListView<T> {
        let (filtered, window) = self.window();
        ResourceListView {
            resource: self.resource,
            items: window.slice(&filtered).iter().map(|item| (*item).clone()).collect(),
            phase: self.phase,
            is_loading: self.phase == Phase::Loading,
            error: self.error.clone(),
            page: window.page,
            page_count: window.page_count,
            total_count: window.total_count,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
            search_term: self.search_term.clone(),
            pending_search_term: self.pending_search_term.clone(),
        }
    }
}

#[derive(Debug)]
struct Shared<T> {
    state: Mutex<ControllerState<T>>,
    revisions: watch::Sender<u64>,
    debouncer: Debouncer,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, ControllerState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revisions.send_modify(|revision| *revision += 1);
    }
}

/// Fetch, search and pagination state for one catalog resource.
///
/// Dropping the controller unmounts it.
#[derive(Debug)]
pub struct ResourceListController<T, C = Client> {
    client: Arc<C>,
    shared: Arc<Shared<T>>,
}

impl<T, C> ResourceListController<T, C>
where
    T: ListItem,
    C: ClientTrait + Send + Sync + 'static,
{
    /// Create a controller for `resource` and start fetching it.
    pub fn mount(client: Arc<C>, resource: Resource, options: ControllerOptions) -> Self {
        let (revisions, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            state: Mutex::new(ControllerState::new(resource, options.initial_page)),
            revisions,
            debouncer: Debouncer::new(options.search_debounce),
        });
        debug!(%resource, "mounting resource list");
        start_fetch(&shared, &client, None);
        Self { client, shared }
    }

    /// Update the pending search term.
    ///
    /// The term is committed once no further call arrived for the debounce
    /// window. Committing a changed term resets the page to 1. If the last
    /// fetch failed, committing also fetches again with the term as hint.
    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        let generation = {
            let mut state = self.shared.lock();
            if state.is_unmounted() {
                return;
            }
            state.pending_search_term = term;
            state.search_pending = true;
            state.search_generation += 1;
            state.search_generation
        };
        self.shared.bump();

        let shared = Arc::downgrade(&self.shared);
        let client = Arc::clone(&self.client);
        self.shared
            .debouncer
            .schedule(move || commit_search(&shared, &client, generation));
    }

    /// Move one page forward. No-op on the last page.
    pub fn go_to_next_page(&self) {
        self.turn_page(|window| window.has_next().then(|| window.page + 1));
    }

    /// Move one page back. No-op on the first page.
    pub fn go_to_previous_page(&self) {
        self.turn_page(|window| window.has_previous().then(|| window.page - 1));
    }

    /// Jump to `page`, clamped into the current page range.
    pub fn go_to_page(&self, page: u32) {
        self.turn_page(|window| {
            let page = clamp_page(page, window.page_count);
            (page != window.page).then_some(page)
        });
    }

    fn turn_page(&self, target: impl FnOnce(&PageWindow) -> Option<u32>) {
        {
            let mut state = self.shared.lock();
            if state.is_unmounted() {
                return;
            }
            let (_, window) = state.window();
            let Some(page) = target(&window) else {
                return;
            };
            state.page = page;
        }
        self.shared.bump();
    }

    /// Fetch the current resource again, superseding any request in flight.
    pub fn refresh(&self) {
        start_fetch(&self.shared, &self.client, None);
    }

    /// Switch to another resource.
    ///
    /// Clears the snapshot and the page but keeps the search term.
    pub fn set_resource(&self, resource: Resource) {
        {
            let mut state = self.shared.lock();
            if state.is_unmounted() || state.resource == resource {
                return;
            }
            debug!(from = %state.resource, to = %resource, "switching resource");
            state.resource = resource;
            state.raw_items.clear();
            state.page = 1;
        }
        start_fetch(&self.shared, &self.client, None);
    }

    pub fn view(&self) -> ResourceListView<T> {
        self.shared.lock().view()
    }

    /// First record of the snapshot matching `predicate`, ignoring search
    /// and pagination.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.shared
            .lock()
            .raw_items
            .iter()
            .find(|&item| predicate(item))
            .cloned()
    }

    /// Wait until no fetch is in flight and no search term awaits its
    /// commit, then return the view.
    pub async fn settled(&self) -> ResourceListView<T> {
        let mut revisions = self.subscribe();
        loop {
            {
                let state = self.shared.lock();
                if state.is_settled() {
                    return state.view();
                }
            }
            if revisions.changed().await.is_err() {
                return self.view();
            }
        }
    }
}

impl<T, C> ResourceListController<T, C> {
    /// Receiver of the revision counter, bumped on every state mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revisions.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.shared.revisions.borrow()
    }

    /// Cancel the request in flight and the pending search commit.
    ///
    /// Nothing mutates the state afterwards. Idempotent.
    pub fn unmount(&self) {
        let in_flight = {
            let mut state = self.shared.lock();
            if state.is_unmounted() {
                return;
            }
            state.phase = Phase::Unmounted;
            state.search_pending = false;
            state.in_flight.take()
        };
        if let Some(token) = in_flight {
            token.cancel();
        }
        self.shared.debouncer.cancel();
        debug!("unmounted resource list");
        self.shared.bump();
    }
}

impl<T, C> Drop for ResourceListController<T, C> {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Supersede the request in flight with a new one for the current resource.
fn start_fetch<T, C>(shared: &Arc<Shared<T>>, client: &Arc<C>, search: Option<String>)
where
    T: ListItem,
    C: ClientTrait + Send + Sync + 'static,
{
    let (resource, epoch, token) = {
        let mut state = shared.lock();
        if state.is_unmounted() {
            return;
        }
        if let Some(previous) = state.in_flight.take() {
            previous.cancel();
        }
        state.request_epoch += 1;
        let token = CancellationToken::new();
        state.in_flight = Some(token.clone());
        state.phase = Phase::Loading;
        state.error = None;
        (state.resource, state.request_epoch, token)
    };
    shared.bump();

    let hints = FetchHints {
        page: Some(1),
        search,
    };
    let shared = Arc::downgrade(shared);
    let client = Arc::clone(client);
    let span = debug_span!("fetch", %resource, epoch);
    tokio::spawn(
        async move {
            let result = client
                .fetch_collection::<T>(resource, &hints, &token)
                .await;
            if let Some(shared) = shared.upgrade() {
                complete(&shared, epoch, result);
            }
        }
        .instrument(span),
    );
}

/// Apply the outcome of the request started at `epoch`, unless superseded.
fn complete<T: ListItem>(
    shared: &Shared<T>,
    epoch: u64,
    result: Result<CatalogResponse<T>, CatalogClientError>,
) {
    {
        let mut state = shared.lock();
        if state.is_unmounted() || state.request_epoch != epoch {
            debug!(
                current_epoch = state.request_epoch,
                "discarding stale catalog response"
            );
            return;
        }
        match result {
            Err(err) if err.is_cancelled() => {
                debug!("catalog request cancelled");
                return;
            },
            Ok(response) => {
                if !response.is_complete() {
                    warn!(
                        resource = %state.resource,
                        count = response.count,
                        received = response.results.len(),
                        "catalog returned a partial collection, listing only the received items"
                    );
                }
                debug!(n_items = response.results.len(), "catalog collection loaded");
                state.raw_items = response.results;
                state.phase = Phase::Ready;
                state.error = None;
            },
            Err(err) => {
                debug!(error = %err, status = err.status(), "catalog collection failed to load");
                state.raw_items.clear();
                state.phase = Phase::Errored;
                state.error = Some(err.to_string());
            },
        }
        state.in_flight = None;
        state.clamp_page();
    }
    shared.bump();
}

/// Commit the pending search term, unless a newer term arrived meanwhile.
fn commit_search<T, C>(shared: &Weak<Shared<T>>, client: &Arc<C>, generation: u64)
where
    T: ListItem,
    C: ClientTrait + Send + Sync + 'static,
{
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let refetch = {
        let mut state = shared.lock();
        if state.is_unmounted() || state.search_generation != generation {
            return;
        }
        let term = state.pending_search_term.clone();
        debug!(term = %term, "committing search term");
        state.search_pending = false;
        if state.search_term != term {
            state.search_term = term.clone();
            state.page = 1;
        }
        (state.phase == Phase::Errored).then_some(term)
    };
    shared.bump();

    if let Some(term) = refetch {
        start_fetch(&shared, client, Some(term));
    }
}
