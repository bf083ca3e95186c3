//! The history controller: one current token, change detection, broadcast.

use std::cell::RefCell;
use std::rc::Rc;

use websheet_core::{WatcherRemover, Watchers};

use crate::token::HistoryToken;

/// The browser location bar, as far as the controller cares.
pub trait Location {
    /// The current fragment, with or without a leading `#`.
    fn hash(&self) -> String;

    /// Replace the fragment. Must not notify; the caller runs
    /// [`HistoryController::on_hash_change`] itself.
    fn set_hash(&self, hash: &str);
}

/// In-memory [`Location`] that remembers every fragment written to it.
#[derive(Debug, Default)]
pub struct MemoryLocation {
    hash: RefCell<String>,
    pushes: RefCell<Vec<String>>,
}

impl MemoryLocation {
    pub fn new(hash: &str) -> Self {
        Self {
            hash: RefCell::new(normalize(hash)),
            pushes: RefCell::new(Vec::new()),
        }
    }

    /// Every fragment passed to `set_hash`, oldest first.
    pub fn pushes(&self) -> Vec<String> {
        self.pushes.borrow().clone()
    }

    /// Change the fragment the way the back/forward buttons do: nothing is
    /// recorded as a push.
    pub fn navigate(&self, hash: &str) {
        *self.hash.borrow_mut() = normalize(hash);
    }
}

impl Location for MemoryLocation {
    fn hash(&self) -> String {
        self.hash.borrow().clone()
    }

    fn set_hash(&self, hash: &str) {
        let hash = normalize(hash);
        self.pushes.borrow_mut().push(hash.clone());
        *self.hash.borrow_mut() = hash;
    }
}

fn normalize(hash: &str) -> String {
    if hash.starts_with('#') {
        hash.to_string()
    } else {
        format!("#{}", hash)
    }
}

/// Receives every accepted history token change.
pub trait HistoryTokenWatcher {
    /// `previous` is the token before the change; the new one is
    /// `controller.history_token()`.
    fn on_history_token_change(&self, previous: &HistoryToken, controller: &HistoryController);
}

impl<F> HistoryTokenWatcher for F
where
    F: Fn(&HistoryToken, &HistoryController),
{
    fn on_history_token_change(&self, previous: &HistoryToken, controller: &HistoryController) {
        self(previous, controller)
    }
}

/// Owns the navigation state of one session.
///
/// Watchers may push tokens while they are being notified; every push runs
/// its own change detection immediately.
pub struct HistoryController {
    location: Rc<dyn Location>,
    previous: RefCell<HistoryToken>,
    firing: RefCell<Option<HistoryToken>>,
    watchers: Watchers<dyn HistoryTokenWatcher>,
    log_tokens: bool,
}

impl HistoryController {
    pub fn new(location: Rc<dyn Location>) -> Self {
        Self {
            location,
            previous: RefCell::new(HistoryToken::unknown("")),
            firing: RefCell::new(None),
            watchers: Watchers::new(),
            log_tokens: false,
        }
    }

    /// Log every accepted token at debug level.
    pub fn with_token_logging(mut self, log_tokens: bool) -> Self {
        self.log_tokens = log_tokens;
        self
    }

    /// The token in the location bar right now.
    pub fn history_token(&self) -> HistoryToken {
        HistoryToken::parse(&self.location.hash())
    }

    /// The last accepted token. Unknown until the first change is accepted.
    pub fn previous_history_token(&self) -> HistoryToken {
        self.previous.borrow().clone()
    }

    /// The token being re-broadcast by [`fire_current_history_token`](Self::fire_current_history_token), if any.
    pub fn firing_token(&self) -> Option<HistoryToken> {
        self.firing.borrow().clone()
    }

    /// Write `token` to the location and process it as a change.
    ///
    /// A one-shot token equal to the one currently firing loses its action
    /// first, so a save handler that pushes its own token does not save twice.
    pub fn push_history_token(&self, token: &HistoryToken) {
        let is_firing = self.firing.borrow().as_ref() == Some(token);
        let token = if token.should_ignore() && is_firing {
            let cleared = token.clear_action();
            log::debug!("push {} is firing, pushing {} instead", token, cleared);
            cleared
        } else {
            token.clone()
        };

        self.location.set_hash(&token.url_fragment());
        self.on_hash_change();
    }

    /// Process the fragment currently in the location.
    pub fn on_hash_change(&self) {
        let token = self.history_token();
        let previous = self.previous_history_token();

        if token == previous {
            if self.log_tokens {
                log::debug!("history token unchanged {}", token);
            }
            return;
        }

        if token.is_unknown() {
            let revert = if previous.is_unknown() {
                HistoryToken::default()
            } else {
                previous
            };
            log::warn!("invalid history token {:?}, reverting to {}", token.url_fragment(), revert);
            self.location.set_hash(&revert.url_fragment());
            self.on_hash_change();
            return;
        }

        if self.log_tokens {
            log::debug!("history token {} -> {}", previous, token);
        }
        *self.previous.borrow_mut() = token.clone();
        self.fire(&previous, &token);
    }

    /// Broadcast the current token again as if it had just changed.
    pub fn fire_current_history_token(&self) {
        let token = self.history_token();
        if self.log_tokens {
            log::debug!("fire current history token {}", token);
        }
        let _firing = FiringGuard::set(&self.firing, token.clone());
        let previous = self.previous_history_token();
        self.fire(&previous, &token);
    }

    /// Broadcast `token`. A watcher that pushes a different token starts a
    /// nested broadcast that reaches everyone; the remaining watchers of this
    /// one are then skipped so nobody handles the newer token twice.
    fn fire(&self, previous: &HistoryToken, token: &HistoryToken) {
        self.watchers.fire_while(
            || {
                let current = self.history_token();
                if current != *token {
                    log::debug!("broadcast of {} superseded by {}", token, current);
                    return false;
                }
                true
            },
            |watcher| watcher.on_history_token_change(previous, self),
        );
    }

    pub fn add_history_token_watcher(&self, watcher: Rc<dyn HistoryTokenWatcher>) -> WatcherRemover {
        self.watchers.add(watcher)
    }

    /// The watcher is removed before its first notification.
    pub fn add_history_token_watcher_once(&self, watcher: Rc<dyn HistoryTokenWatcher>) -> WatcherRemover {
        self.watchers.add_once(watcher)
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }
}

/// Restores the previous firing value on drop, also when a watcher panics.
struct FiringGuard<'a> {
    firing: &'a RefCell<Option<HistoryToken>>,
    restore: Option<HistoryToken>,
}

impl<'a> FiringGuard<'a> {
    fn set(firing: &'a RefCell<Option<HistoryToken>>, token: HistoryToken) -> Self {
        let restore = firing.replace(Some(token));
        Self { firing, restore }
    }
}

impl Drop for FiringGuard<'_> {
    fn drop(&mut self) {
        *self.firing.borrow_mut() = self.restore.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<(String, String)>>,
    }

    impl HistoryTokenWatcher for Recorder {
        fn on_history_token_change(&self, previous: &HistoryToken, controller: &HistoryController) {
            self.seen
                .borrow_mut()
                .push((previous.url_fragment(), controller.history_token().url_fragment()));
        }
    }

    fn setup(hash: &str) -> (Rc<MemoryLocation>, HistoryController, Rc<Recorder>) {
        let location = Rc::new(MemoryLocation::new(hash));
        let controller = HistoryController::new(location.clone());
        controller.on_hash_change();
        let recorder = Rc::new(Recorder::default());
        controller.add_history_token_watcher(recorder.clone());
        (location, controller, recorder)
    }

    #[test]
    fn test_initial_fragment_is_accepted() {
        let (_, controller, _) = setup("#/1/Budget");
        assert_eq!(controller.previous_history_token().url_fragment(), "/1/Budget");
    }

    #[test]
    fn test_push_notifies_with_previous() {
        let (location, controller, recorder) = setup("#/1/Budget");
        controller.push_history_token(&HistoryToken::parse("/1/Budget/cell/A1"));

        assert_eq!(location.hash(), "#/1/Budget/cell/A1");
        assert_eq!(
            *recorder.seen.borrow(),
            vec![("/1/Budget".to_string(), "/1/Budget/cell/A1".to_string())]
        );
    }

    #[test]
    fn test_same_token_is_not_rebroadcast() {
        let (_, controller, recorder) = setup("#/1/Budget");
        controller.push_history_token(&HistoryToken::parse("/1/Budget"));
        controller.on_hash_change();
        assert!(recorder.seen.borrow().is_empty());
    }

    #[test]
    fn test_unknown_token_reverts() {
        let (location, controller, recorder) = setup("#/1/Budget/cell/B2");

        location.navigate("#/1/Budget/cell/not a cell");
        controller.on_hash_change();

        assert_eq!(location.hash(), "#/1/Budget/cell/B2");
        assert_eq!(controller.history_token().url_fragment(), "/1/Budget/cell/B2");
        assert_eq!(controller.previous_history_token().url_fragment(), "/1/Budget/cell/B2");
        assert!(recorder.seen.borrow().is_empty());
    }

    #[test]
    fn test_unknown_first_token_falls_back_to_list() {
        let location = Rc::new(MemoryLocation::new("#/garbage/garbage"));
        let controller = HistoryController::new(location.clone());
        controller.on_hash_change();
        assert_eq!(location.hash(), "#/");
        assert_eq!(controller.previous_history_token(), HistoryToken::default());
    }

    #[test]
    fn test_back_button_is_a_change() {
        let (location, controller, recorder) = setup("#/1/Budget");
        controller.push_history_token(&HistoryToken::parse("/1/Budget/rename"));
        location.navigate("#/1/Budget");
        controller.on_hash_change();
        assert_eq!(recorder.seen.borrow().len(), 2);
        assert_eq!(recorder.seen.borrow()[1].0, "/1/Budget/rename");
    }

    struct Saver {
        saves: Cell<u32>,
    }

    impl HistoryTokenWatcher for Saver {
        fn on_history_token_change(&self, _previous: &HistoryToken, controller: &HistoryController) {
            let token = controller.history_token();
            if token.save_value().is_some() {
                self.saves.set(self.saves.get() + 1);
                // A save handler that re-pushes its own token.
                controller.push_history_token(&token);
            }
        }
    }

    #[test]
    fn test_firing_save_token_is_not_repeated() {
        let location = Rc::new(MemoryLocation::new("#/1/Budget/cell/A1/formula/save/%3D1"));
        let controller = HistoryController::new(location.clone());
        let saver = Rc::new(Saver { saves: Cell::new(0) });
        controller.add_history_token_watcher(saver.clone());

        controller.on_hash_change();
        controller.fire_current_history_token();

        assert_eq!(location.hash(), "#/1/Budget/cell/A1/formula");
        assert_eq!(controller.firing_token(), None);
        // One save from the initial change (its re-push is a no-op), one from
        // the replay; the replay's re-push loses its save.
        assert_eq!(saver.saves.get(), 2);
        assert_eq!(
            location.pushes(),
            vec![
                "#/1/Budget/cell/A1/formula/save/%3D1".to_string(),
                "#/1/Budget/cell/A1/formula".to_string(),
            ]
        );
    }

    struct Redirect;

    impl HistoryTokenWatcher for Redirect {
        fn on_history_token_change(&self, _previous: &HistoryToken, controller: &HistoryController) {
            let token = controller.history_token();
            if token.save_value().is_some() {
                controller.push_history_token(&token.clear_action());
            }
        }
    }

    #[test]
    fn test_watchers_after_a_redirect_see_the_new_token_once() {
        let location = Rc::new(MemoryLocation::new("#/1/Budget/cell/A1/formula"));
        let controller = HistoryController::new(location.clone());
        controller.on_hash_change();
        controller.add_history_token_watcher(Rc::new(Redirect));
        let recorder = Rc::new(Recorder::default());
        controller.add_history_token_watcher(recorder.clone());

        controller.push_history_token(&HistoryToken::parse("/1/Budget/cell/A1/formula/save/%3D2"));

        assert_eq!(location.hash(), "#/1/Budget/cell/A1/formula");
        assert_eq!(
            *recorder.seen.borrow(),
            vec![(
                "/1/Budget/cell/A1/formula/save/%3D2".to_string(),
                "/1/Budget/cell/A1/formula".to_string()
            )]
        );
    }

    #[test]
    fn test_firing_is_cleared_after_panic() {
        let (_, controller, _) = setup("#/1/Budget");
        let panicking = Rc::new(|_: &HistoryToken, _: &HistoryController| panic!("broken watcher"));
        controller.add_history_token_watcher(panicking);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            controller.fire_current_history_token();
        }));
        assert!(result.is_err());
        assert_eq!(controller.firing_token(), None);
    }

    #[test]
    fn test_once_watcher() {
        let (_, controller, _) = setup("#/1/Budget");
        let once = Rc::new(Recorder::default());
        controller.add_history_token_watcher_once(once.clone());
        assert_eq!(controller.watcher_count(), 2);

        controller.push_history_token(&HistoryToken::parse("/1/Budget/cell/A1"));
        controller.push_history_token(&HistoryToken::parse("/1/Budget/cell/A2"));
        assert_eq!(once.seen.borrow().len(), 1);
        assert_eq!(controller.watcher_count(), 1);
    }

    #[test]
    fn test_remover() {
        let (_, controller, recorder) = setup("#/1/Budget");
        let other = Rc::new(Recorder::default());
        let remover = controller.add_history_token_watcher(other.clone());
        remover.remove();

        controller.push_history_token(&HistoryToken::parse("/1/Budget/cell/A1"));
        assert!(other.seen.borrow().is_empty());
        assert_eq!(recorder.seen.borrow().len(), 1);
    }
}
