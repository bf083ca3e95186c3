//! The session object handed to every component.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use log::Level;
use url::Url;
use websheet_api_client::{
    spreadsheet_id_of, CurrencyFetcher, DeltaFetcher, FetchError, FetcherWatcher, HttpTransport, LocaleFetcher,
    MetadataFetcher,
};
use websheet_config::Settings;
use websheet_history::{HistoryController, HistoryToken, Location};
use websheet_protocol::{SpreadsheetDelta, SpreadsheetId, SpreadsheetMetadata};
use websheet_viewport::ViewportCache;

use crate::lifecycle::LifecycleContext;

/// Runs fetch futures to completion in the background of the UI thread.
pub trait Spawner {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>);
}

impl Spawner for futures::executor::LocalSpawner {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        if let Err(e) = LocalSpawnExt::spawn_local(self, future) {
            log::error!("could not spawn fetch: {}", e);
        }
    }
}

/// Transient on-screen notifications.
pub trait Notifier {
    fn notify(&self, level: Level, message: &str);
}

/// Keeps every notification, newest last, like a status bar history.
#[derive(Debug, Default)]
pub struct StatusNotifier {
    messages: RefCell<Vec<(Level, String)>>,
}

impl StatusNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.borrow().clone()
    }

    pub fn last(&self) -> Option<(Level, String)> {
        self.messages.borrow().last().cloned()
    }
}

impl Notifier for StatusNotifier {
    fn notify(&self, level: Level, message: &str) {
        self.messages.borrow_mut().push((level, message.to_string()));
    }
}

/// Everything one session shares: navigation, loaded metadata, the
/// viewport cache and the fetchers that fill them.
///
/// Created once per session and passed by reference to every component.
/// The history controller is the only writer of the current token and the
/// delta watcher the only writer of the cache.
pub struct AppContext {
    history: HistoryController,
    cache: RefCell<ViewportCache>,
    metadata: RefCell<Option<SpreadsheetMetadata>>,
    /// Metadata load in flight; cleared when it succeeds or fails.
    metadata_pending: Cell<Option<SpreadsheetId>>,
    delta_fetcher: DeltaFetcher,
    find_fetcher: DeltaFetcher,
    metadata_fetcher: MetadataFetcher,
    locale_fetcher: LocaleFetcher,
    currency_fetcher: CurrencyFetcher,
    spawner: Rc<dyn Spawner>,
    notifier: Rc<dyn Notifier>,
    settings: Settings,
}

impl AppContext {
    pub fn new(
        settings: Settings,
        location: Rc<dyn Location>,
        transport: Rc<dyn HttpTransport>,
        spawner: Rc<dyn Spawner>,
        notifier: Rc<dyn Notifier>,
    ) -> Result<Rc<Self>, FetchError> {
        let base_url = settings.api_base_url.as_str();
        let fetch_log = settings.fetch_log;
        let delta_fetcher = DeltaFetcher::new(base_url, transport.clone())?.with_fetch_log(fetch_log);
        let find_fetcher = DeltaFetcher::new(base_url, transport.clone())?.with_fetch_log(fetch_log);
        let metadata_fetcher = MetadataFetcher::new(base_url, transport.clone())?.with_fetch_log(fetch_log);
        let locale_fetcher = LocaleFetcher::new(base_url, transport.clone())?;
        let currency_fetcher = CurrencyFetcher::new(base_url, transport)?;

        let context = Rc::new(Self {
            history: HistoryController::new(location).with_token_logging(settings.log_history_tokens),
            cache: RefCell::new(ViewportCache::new()),
            metadata: RefCell::new(None),
            metadata_pending: Cell::new(None),
            delta_fetcher,
            find_fetcher,
            metadata_fetcher,
            locale_fetcher,
            currency_fetcher,
            spawner,
            notifier,
            settings,
        });

        context.delta_fetcher.add_watcher(Rc::new(DeltaCacheWatcher {
            context: Rc::downgrade(&context),
        }));
        context.metadata_fetcher.add_watcher(Rc::new(MetadataWatcher {
            context: Rc::downgrade(&context),
        }));
        Ok(context)
    }

    pub fn history(&self) -> &HistoryController {
        &self.history
    }

    pub fn push_history_token(&self, token: &HistoryToken) {
        self.history.push_history_token(token);
    }

    pub fn cache(&self) -> Ref<'_, ViewportCache> {
        self.cache.borrow()
    }

    pub fn cache_mut(&self) -> RefMut<'_, ViewportCache> {
        self.cache.borrow_mut()
    }

    pub fn metadata(&self) -> Option<SpreadsheetMetadata> {
        self.metadata.borrow().clone()
    }

    pub fn metadata_id(&self) -> Option<SpreadsheetId> {
        self.metadata.borrow().as_ref().and_then(SpreadsheetMetadata::id)
    }

    /// Load metadata for `id` unless it is loaded or already on its way.
    pub fn load_metadata(&self, id: SpreadsheetId) {
        if self.metadata_id() == Some(id) || self.metadata_pending.get() == Some(id) {
            return;
        }
        log::debug!("loading metadata for {}", id);
        self.reload_metadata(id);
    }

    /// Load metadata for `id` even if it is loaded.
    pub fn reload_metadata(&self, id: SpreadsheetId) {
        self.metadata_pending.set(Some(id));
        self.spawn(self.metadata_fetcher.load(id));
    }

    pub fn delta_fetcher(&self) -> &DeltaFetcher {
        &self.delta_fetcher
    }

    /// Separate watcher list from [`delta_fetcher`](Self::delta_fetcher):
    /// find results are not viewport content.
    pub fn find_fetcher(&self) -> &DeltaFetcher {
        &self.find_fetcher
    }

    pub fn metadata_fetcher(&self) -> &MetadataFetcher {
        &self.metadata_fetcher
    }

    pub fn locale_fetcher(&self) -> &LocaleFetcher {
        &self.locale_fetcher
    }

    pub fn currency_fetcher(&self) -> &CurrencyFetcher {
        &self.currency_fetcher
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        self.spawner.spawn_local(future);
    }

    /// Log and show an error.
    pub fn error(&self, message: &str) {
        log::error!("{}", message);
        self.notifier.notify(Level::Error, message);
    }

    /// Log and show a warning.
    pub fn warning(&self, message: &str) {
        log::warn!("{}", message);
        self.notifier.notify(Level::Warn, message);
    }

    fn metadata_loaded(&self, metadata: SpreadsheetMetadata) {
        self.metadata_pending.set(None);
        let Some(id) = metadata.id() else {
            self.error("Spreadsheet metadata without spreadsheet-id");
            return;
        };

        let changed = self.metadata_id() != Some(id);
        let name = metadata.name();
        *self.metadata.borrow_mut() = Some(metadata);
        if changed {
            log::debug!("spreadsheet {} loaded, clearing viewport cache", id);
            self.cache.borrow_mut().clear();
        }

        // Give a freshly created, loaded or renamed spreadsheet its name.
        let token = self.history.history_token();
        if let Some(name) = name {
            let needs_name = match &token {
                HistoryToken::SpreadsheetCreate | HistoryToken::SpreadsheetLoad { .. } => true,
                other => other.spreadsheet_id() == Some(id) && other.spreadsheet_name() != Some(&name),
            };
            if needs_name {
                self.history.push_history_token(&token.set_id_name(id, name));
                return;
            }
        }
        self.history.fire_current_history_token();
    }
}

impl LifecycleContext for AppContext {
    fn history_token(&self) -> HistoryToken {
        self.history.history_token()
    }

    /// Loaded means loaded for the spreadsheet the current token names.
    fn is_spreadsheet_metadata_loaded(&self) -> bool {
        match (self.metadata_id(), self.history.history_token().spreadsheet_id()) {
            (Some(loaded), Some(wanted)) => loaded == wanted,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

// ============================================================================
// Fetch watchers
// ============================================================================

/// Applies every delta to the viewport cache.
struct DeltaCacheWatcher {
    context: Weak<AppContext>,
}

impl FetcherWatcher<SpreadsheetDelta> for DeltaCacheWatcher {
    /// Drops deltas for any spreadsheet but the loaded one: a late answer
    /// from the previous spreadsheet can share its window.
    fn on_response(&self, url: &Url, delta: &SpreadsheetDelta) {
        let Some(context) = self.context.upgrade() else {
            return;
        };
        let loaded = context.metadata_id();
        if spreadsheet_id_of(url) != loaded || loaded.is_none() {
            log::debug!("ignoring delta from {}, loaded spreadsheet is {:?}", url, loaded);
            return;
        }
        self.on_success(delta);
    }

    fn on_success(&self, delta: &SpreadsheetDelta) {
        let Some(context) = self.context.upgrade() else {
            return;
        };
        let result = context.cache.borrow_mut().apply(delta);
        if let Err(e) = result {
            context.error(&format!("Viewport update rejected: {}", e));
        }
    }

    fn on_failure(&self, status: u16, _headers: &[(String, String)], body: &str) {
        if let Some(context) = self.context.upgrade() {
            context.error(&format!("Cell request failed ({}): {}", status, body));
        }
    }

    fn on_error(&self, error: &FetchError) {
        if let Some(context) = self.context.upgrade() {
            context.error(&format!("Cell request failed: {}", error));
        }
    }
}

/// Stores loaded metadata and re-broadcasts the current token so waiting
/// components can open.
struct MetadataWatcher {
    context: Weak<AppContext>,
}

impl FetcherWatcher<SpreadsheetMetadata> for MetadataWatcher {
    fn on_success(&self, metadata: &SpreadsheetMetadata) {
        if let Some(context) = self.context.upgrade() {
            context.metadata_loaded(metadata.clone());
        }
    }

    fn on_failure(&self, status: u16, _headers: &[(String, String)], body: &str) {
        if let Some(context) = self.context.upgrade() {
            context.metadata_pending.set(None);
            context.error(&format!("Spreadsheet request failed ({}): {}", status, body));
        }
    }

    fn on_error(&self, error: &FetchError) {
        if let Some(context) = self.context.upgrade() {
            context.metadata_pending.set(None);
            context.error(&format!("Spreadsheet request failed: {}", error));
        }
    }
}
