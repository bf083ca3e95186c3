//! Wires components to the session.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use websheet_api_client::{FetchError, FetcherWatcher};
use websheet_core::WatcherRemover;
use websheet_history::{HistoryController, HistoryToken};
use websheet_protocol::SpreadsheetDelta;

use crate::actions::HistoryTokenActions;
use crate::components::{
    CellFormulaComponent, FindDialog, MetadataPropertyDialog, SpreadsheetNameDialog, ViewportComponent,
};
use crate::context::AppContext;
use crate::lifecycle::{component_lifecycle_history_token_query, refresh_if_open, ComponentLifecycle};

/// The client: a session plus its components.
///
/// Every component sits in a `RefCell`. A notification that arrives while
/// the component is already borrowed (a push from inside one of its own
/// callbacks) is skipped for that component.
pub struct App {
    context: Rc<AppContext>,
    viewport: Rc<RefCell<ViewportComponent>>,
    name_dialog: Rc<RefCell<SpreadsheetNameDialog>>,
    metadata_dialog: Rc<RefCell<MetadataPropertyDialog>>,
    formula: Rc<RefCell<CellFormulaComponent>>,
    find: Rc<RefCell<FindDialog>>,
    removers: Vec<WatcherRemover>,
}

impl App {
    pub fn new(context: Rc<AppContext>) -> Self {
        let mut app = Self {
            context,
            viewport: Rc::new(RefCell::new(ViewportComponent::new())),
            name_dialog: Rc::new(RefCell::new(SpreadsheetNameDialog::new())),
            metadata_dialog: Rc::new(RefCell::new(MetadataPropertyDialog::new())),
            formula: Rc::new(RefCell::new(CellFormulaComponent::new())),
            find: Rc::new(RefCell::new(FindDialog::new())),
            removers: Vec::new(),
        };

        // Actions first, so components see a save token already replaced.
        let actions = HistoryTokenActions::new(Rc::downgrade(&app.context));
        app.removers.push(app.context.history().add_history_token_watcher(Rc::new(actions)));

        app.watch_lifecycle("viewport", app.viewport.clone());
        app.watch_lifecycle("rename", app.name_dialog.clone());
        app.watch_lifecycle("metadata", app.metadata_dialog.clone());
        app.watch_lifecycle("formula", app.formula.clone());
        app.watch_lifecycle("find", app.find.clone());

        app.refresh_on_delta(app.viewport.clone());
        app.refresh_on_delta(app.formula.clone());

        let find_results = FindResults {
            context: Rc::downgrade(&app.context),
            dialog: app.find.clone(),
        };
        app.removers
            .push(app.context.find_fetcher().add_watcher(Rc::new(find_results)));
        app
    }

    fn watch_lifecycle<L>(&mut self, name: &'static str, component: Rc<RefCell<L>>)
    where
        L: ComponentLifecycle<AppContext> + 'static,
    {
        let context = Rc::downgrade(&self.context);
        let watcher = move |_previous: &HistoryToken, controller: &HistoryController| {
            let Some(context) = context.upgrade() else {
                return;
            };
            let token = controller.history_token();
            match component.try_borrow_mut() {
                Ok(mut component) => component_lifecycle_history_token_query(&mut *component, &token, &*context),
                Err(_) => log::warn!("{} is busy, skipping {}", name, token),
            };
        };
        self.removers
            .push(self.context.history().add_history_token_watcher(Rc::new(watcher)));
    }

    fn refresh_on_delta<L>(&mut self, component: Rc<RefCell<L>>)
    where
        L: ComponentLifecycle<AppContext> + 'static,
    {
        let watcher = RefreshOnDelta {
            context: Rc::downgrade(&self.context),
            component,
        };
        self.removers
            .push(self.context.delta_fetcher().add_watcher(Rc::new(watcher)));
    }

    pub fn context(&self) -> &Rc<AppContext> {
        &self.context
    }

    /// Process the fragment already in the location bar.
    pub fn start(&self) {
        self.context.history().on_hash_change();
    }

    pub fn viewport(&self) -> Ref<'_, ViewportComponent> {
        self.viewport.borrow()
    }

    pub fn viewport_mut(&self) -> RefMut<'_, ViewportComponent> {
        self.viewport.borrow_mut()
    }

    pub fn name_dialog(&self) -> Ref<'_, SpreadsheetNameDialog> {
        self.name_dialog.borrow()
    }

    pub fn name_dialog_mut(&self) -> RefMut<'_, SpreadsheetNameDialog> {
        self.name_dialog.borrow_mut()
    }

    pub fn metadata_dialog(&self) -> Ref<'_, MetadataPropertyDialog> {
        self.metadata_dialog.borrow()
    }

    pub fn metadata_dialog_mut(&self) -> RefMut<'_, MetadataPropertyDialog> {
        self.metadata_dialog.borrow_mut()
    }

    pub fn formula(&self) -> Ref<'_, CellFormulaComponent> {
        self.formula.borrow()
    }

    pub fn formula_mut(&self) -> RefMut<'_, CellFormulaComponent> {
        self.formula.borrow_mut()
    }

    pub fn find(&self) -> Ref<'_, FindDialog> {
        self.find.borrow()
    }

    /// Unregister every watcher this app added.
    pub fn shutdown(self) {
        for remover in self.removers {
            remover.remove();
        }
    }
}

/// Re-renders an open component when new cells arrive.
struct RefreshOnDelta<L> {
    context: Weak<AppContext>,
    component: Rc<RefCell<L>>,
}

impl<L> FetcherWatcher<SpreadsheetDelta> for RefreshOnDelta<L>
where
    L: ComponentLifecycle<AppContext>,
{
    fn on_success(&self, _delta: &SpreadsheetDelta) {
        let Some(context) = self.context.upgrade() else {
            return;
        };
        if let Ok(mut component) = self.component.try_borrow_mut() {
            refresh_if_open(&mut *component, &*context);
        }
    }

    // Reported by the session's own delta watcher.
    fn on_failure(&self, _status: u16, _headers: &[(String, String)], _body: &str) {}

    fn on_error(&self, _error: &FetchError) {}
}

struct FindResults {
    context: Weak<AppContext>,
    dialog: Rc<RefCell<FindDialog>>,
}

impl FetcherWatcher<SpreadsheetDelta> for FindResults {
    fn on_success(&self, delta: &SpreadsheetDelta) {
        if let Ok(mut dialog) = self.dialog.try_borrow_mut() {
            dialog.set_results(delta);
        }
    }

    fn on_failure(&self, status: u16, _headers: &[(String, String)], body: &str) {
        if let Some(context) = self.context.upgrade() {
            context.error(&format!("Find failed ({}): {}", status, body));
        }
    }

    fn on_error(&self, error: &FetchError) {
        if let Some(context) = self.context.upgrade() {
            context.error(&format!("Find failed: {}", error));
        }
    }
}
