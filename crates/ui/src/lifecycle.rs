//! Open/refresh/close state machine for history-aware components.
//!
//! A component supplies the capabilities below; the dispatch itself is the
//! free function [`component_lifecycle_history_token_query`], run once per
//! history token change.

use websheet_history::HistoryToken;

/// Decides whether a component cares about a token.
pub trait HistoryTokenMatcher {
    /// Whether the component should be open for `token`.
    fn is_match(&self, token: &HistoryToken) -> bool;

    /// Tokens that must not affect the component at all. The default skips
    /// one-shot tokens (saves, clears, inserts) so a component never reacts
    /// to the save it just pushed.
    fn should_ignore(&self, token: &HistoryToken) -> bool {
        token.should_ignore()
    }
}

pub trait Openable<C: ?Sized> {
    fn is_open(&self) -> bool;

    fn open(&mut self, context: &C);

    /// Grab keyboard focus. Runs once per closed -> open edge.
    fn open_give_focus(&mut self, context: &C);

    fn close(&mut self, context: &C);
}

pub trait Refreshable<C: ?Sized> {
    fn refresh(&mut self, context: &C);
}

pub trait ComponentLifecycle<C: ?Sized>: HistoryTokenMatcher + Openable<C> + Refreshable<C> {
    /// Components that render server state stay closed until the
    /// spreadsheet metadata has loaded.
    fn requires_loaded_metadata(&self) -> bool {
        false
    }
}

/// What the lifecycle needs to know about the session.
pub trait LifecycleContext {
    fn history_token(&self) -> HistoryToken;

    fn is_spreadsheet_metadata_loaded(&self) -> bool;
}

/// Move `component` to the state `token` asks for.
///
/// | open | match | calls |
/// |------|-------|-------|
/// | yes  | yes   | refresh |
/// | yes  | no    | close |
/// | no   | yes   | open, refresh, open_give_focus |
/// | no   | no    | - |
///
/// `open` and `refresh` may push tokens of their own. Before each later
/// call the component is checked against the token that is current by
/// then, and the sequence stops if it no longer matches.
pub fn component_lifecycle_history_token_query<C, L>(component: &mut L, token: &HistoryToken, context: &C)
where
    C: LifecycleContext + ?Sized,
    L: ComponentLifecycle<C> + ?Sized,
{
    if component.should_ignore(token) {
        return;
    }

    if component.requires_loaded_metadata() && !context.is_spreadsheet_metadata_loaded() {
        if component.is_open() {
            component.close(context);
        }
        return;
    }

    let next_open = component.is_match(token);
    match (component.is_open(), next_open) {
        (true, true) => {
            if still_matches(component, context) {
                component.refresh(context);
            }
        }
        (true, false) => component.close(context),
        (false, true) => {
            component.open(context);
            if !still_matches(component, context) {
                return;
            }
            component.refresh(context);
            if !still_matches(component, context) {
                return;
            }
            component.open_give_focus(context);
        }
        (false, false) => {}
    }
}

// TODO: drop once re-entrant pushes from open/refresh are queued until the
// current dispatch finishes.
fn still_matches<C, L>(component: &L, context: &C) -> bool
where
    C: LifecycleContext + ?Sized,
    L: ComponentLifecycle<C> + ?Sized,
{
    let current = context.history_token();
    let matches = component.is_match(&current);
    if !matches {
        log::warn!("component no longer matches {}, skipping lifecycle call", current);
    }
    matches
}

/// Refresh `component` if it is open. For parts embedded in a component
/// that already runs the full lifecycle.
pub fn refresh_if_open<C, L>(component: &mut L, context: &C)
where
    C: ?Sized,
    L: Openable<C> + Refreshable<C> + ?Sized,
{
    if component.is_open() {
        component.refresh(context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use websheet_protocol::SpreadsheetId;

    struct TestContext {
        token: RefCell<HistoryToken>,
        loaded: Cell<bool>,
    }

    impl TestContext {
        fn new() -> Self {
            Self {
                token: RefCell::new(HistoryToken::default()),
                loaded: Cell::new(true),
            }
        }

        fn set(&self, token: &HistoryToken) {
            *self.token.borrow_mut() = token.clone();
        }
    }

    impl LifecycleContext for TestContext {
        fn history_token(&self) -> HistoryToken {
            self.token.borrow().clone()
        }

        fn is_spreadsheet_metadata_loaded(&self) -> bool {
            self.loaded.get()
        }
    }

    /// Open for `SpreadsheetLoad` tokens; logs every lifecycle call.
    #[derive(Default)]
    struct Spy {
        open: bool,
        calls: Vec<&'static str>,
        needs_metadata: bool,
        /// Token pushed from inside `open`, simulating a re-entrant push.
        push_on_open: Option<HistoryToken>,
    }

    impl HistoryTokenMatcher for Spy {
        fn is_match(&self, token: &HistoryToken) -> bool {
            matches!(token, HistoryToken::SpreadsheetLoad { .. })
        }
    }

    impl Openable<TestContext> for Spy {
        fn is_open(&self) -> bool {
            self.open
        }

        fn open(&mut self, context: &TestContext) {
            self.open = true;
            self.calls.push("open");
            if let Some(token) = self.push_on_open.take() {
                context.set(&token);
            }
        }

        fn open_give_focus(&mut self, _context: &TestContext) {
            self.calls.push("focus");
        }

        fn close(&mut self, _context: &TestContext) {
            self.open = false;
            self.calls.push("close");
        }
    }

    impl Refreshable<TestContext> for Spy {
        fn refresh(&mut self, _context: &TestContext) {
            self.calls.push("refresh");
        }
    }

    impl ComponentLifecycle<TestContext> for Spy {
        fn requires_loaded_metadata(&self) -> bool {
            self.needs_metadata
        }
    }

    fn load(id: u64) -> HistoryToken {
        HistoryToken::SpreadsheetLoad {
            id: SpreadsheetId::new(id),
        }
    }

    fn run(spy: &mut Spy, context: &TestContext, tokens: &[HistoryToken]) {
        for token in tokens {
            context.set(token);
            component_lifecycle_history_token_query(spy, token, context);
        }
    }

    #[test]
    fn test_edge_triggered_sequence() {
        let context = TestContext::new();
        let mut spy = Spy::default();
        run(
            &mut spy,
            &context,
            &[HistoryToken::default(), load(1), load(2), HistoryToken::SpreadsheetCreate],
        );
        assert_eq!(spy.calls, vec!["open", "refresh", "focus", "refresh", "close"]);
        assert!(!spy.open);
    }

    #[test]
    fn test_closed_stays_closed() {
        let context = TestContext::new();
        let mut spy = Spy::default();
        run(&mut spy, &context, &[HistoryToken::default(), HistoryToken::SpreadsheetCreate]);
        assert!(spy.calls.is_empty());
    }

    #[test]
    fn test_ignored_token_is_noop() {
        let context = TestContext::new();
        let mut spy = Spy::default();
        run(&mut spy, &context, &[load(1)]);

        let save: HistoryToken = HistoryToken::parse("/1/Budget/rename/save/Other");
        assert!(save.should_ignore());
        run(&mut spy, &context, &[save]);

        assert_eq!(spy.calls, vec!["open", "refresh", "focus"]);
        assert!(spy.open);
    }

    #[test]
    fn test_missing_metadata_closes() {
        let context = TestContext::new();
        let mut spy = Spy {
            needs_metadata: true,
            ..Default::default()
        };
        run(&mut spy, &context, &[load(1)]);

        context.loaded.set(false);
        run(&mut spy, &context, &[load(1), load(2)]);

        assert_eq!(spy.calls, vec!["open", "refresh", "focus", "close"]);
    }

    #[test]
    fn test_push_during_open_stops_sequence() {
        let context = TestContext::new();
        let mut spy = Spy {
            push_on_open: Some(HistoryToken::SpreadsheetCreate),
            ..Default::default()
        };
        run(&mut spy, &context, &[load(1)]);
        assert_eq!(spy.calls, vec!["open"]);
    }

    #[test]
    fn test_refresh_if_open() {
        let context = TestContext::new();
        let mut spy = Spy::default();
        refresh_if_open(&mut spy, &context);
        assert!(spy.calls.is_empty());

        spy.open = true;
        refresh_if_open(&mut spy, &context);
        assert_eq!(spy.calls, vec!["refresh"]);
    }
}
