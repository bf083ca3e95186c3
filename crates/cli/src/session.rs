// Terminal session: one App driven by a current-thread tokio runtime.
// Everything here is !Send and must run inside a tokio LocalSet.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use tokio::sync::Notify;
use websheet_api_client::{FetchError, FetcherWatcher, HttpTransport, ReqwestTransport};
use websheet_config::Settings;
use websheet_history::{Location, MemoryLocation};
use websheet_ui::{App, AppContext, Spawner, StatusNotifier};

use crate::exit_codes::{fetch_exit_code, EXIT_SERVER_STATUS, EXIT_SUCCESS};

// ============================================================================
// Spawner
// ============================================================================

/// Spawns onto the current `LocalSet` and counts what is still running.
#[derive(Default)]
pub struct TokioSpawner {
    in_flight: Rc<Cell<usize>>,
    idle: Rc<Notify>,
}

impl TokioSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once every spawned future, including those spawned while
    /// waiting, has finished.
    pub async fn settle(&self) {
        while self.in_flight.get() > 0 {
            self.idle.notified().await;
        }
    }
}

impl Spawner for TokioSpawner {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        self.in_flight.set(self.in_flight.get() + 1);
        let in_flight = Rc::clone(&self.in_flight);
        let idle = Rc::clone(&self.idle);
        tokio::task::spawn_local(async move {
            future.await;
            let remaining = in_flight.get().saturating_sub(1);
            in_flight.set(remaining);
            if remaining == 0 {
                idle.notify_one();
            }
        });
    }
}

// ============================================================================
// Request outcome
// ============================================================================

/// Remembers the first failed request as an exit code.
#[derive(Default)]
struct RequestOutcome {
    code: Cell<u8>,
}

impl RequestOutcome {
    fn record(&self, code: u8) {
        if self.code.get() == EXIT_SUCCESS {
            self.code.set(code);
        }
    }
}

impl<T> FetcherWatcher<T> for RequestOutcome {
    fn on_success(&self, _value: &T) {}

    fn on_failure(&self, _status: u16, _headers: &[(String, String)], _body: &str) {
        self.record(EXIT_SERVER_STATUS);
    }

    fn on_error(&self, error: &FetchError) {
        self.record(fetch_exit_code(error));
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct Session {
    app: App,
    location: Rc<MemoryLocation>,
    notifier: Rc<StatusNotifier>,
    spawner: Rc<TokioSpawner>,
    outcome: Rc<RequestOutcome>,
}

impl Session {
    /// A session talking to `settings.api_base_url` over HTTP.
    pub fn connect(settings: Settings, fragment: &str) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::new(Duration::from_secs(settings.fetch_timeout_seconds))?;
        Self::with_transport(settings, fragment, Rc::new(transport))
    }

    pub fn with_transport(
        settings: Settings,
        fragment: &str,
        transport: Rc<dyn HttpTransport>,
    ) -> Result<Self, FetchError> {
        let location = Rc::new(MemoryLocation::new(fragment));
        let notifier = Rc::new(StatusNotifier::new());
        let spawner = Rc::new(TokioSpawner::new());
        let context = AppContext::new(
            settings,
            location.clone(),
            transport,
            spawner.clone(),
            notifier.clone(),
        )?;

        let outcome = Rc::new(RequestOutcome::default());
        // Watchers stay registered for the life of the context.
        context.delta_fetcher().add_watcher(outcome.clone());
        context.find_fetcher().add_watcher(outcome.clone());
        context.metadata_fetcher().add_watcher(outcome.clone());

        Ok(Self {
            app: App::new(context),
            location,
            notifier,
            spawner,
            outcome,
        })
    }

    /// Process the initial fragment and wait for every request it caused.
    pub async fn start(&self) {
        self.app.start();
        self.spawner.settle().await;
    }

    /// Type `fragment` into the location bar.
    pub async fn navigate(&self, fragment: &str) {
        self.location.navigate(fragment);
        self.app.context().history().on_hash_change();
        self.spawner.settle().await;
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn location_hash(&self) -> String {
        self.location.hash()
    }

    pub fn messages(&self) -> Vec<(log::Level, String)> {
        self.notifier.messages()
    }

    /// `EXIT_SUCCESS` unless a request failed.
    pub fn exit_code(&self) -> u8 {
        self.outcome.code.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use websheet_api_client::{HttpMethod, HttpResponse, MemoryTransport};

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        tokio::task::LocalSet::new().block_on(&rt, future)
    }

    fn settings() -> Settings {
        Settings {
            viewport_width: 2,
            viewport_height: 1,
            include_frozen_columns_rows: false,
            ..Settings::default()
        }
    }

    fn transport() -> Rc<MemoryTransport> {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            HttpMethod::Get,
            "/api/spreadsheet/1f",
            HttpResponse::json(200, json!({ "spreadsheet-id": "1f", "spreadsheet-name": "Budget" }).to_string()),
        );
        transport.respond(
            HttpMethod::Get,
            "/api/spreadsheet/1f/cell/*/force-recompute",
            HttpResponse::json(
                200,
                json!({ "cells": [ { "reference": "B1", "formula": { "text": "x" } } ], "window": ["A1:B1"] })
                    .to_string(),
            ),
        );
        transport
    }

    #[test]
    fn test_start_settles_chained_requests() {
        let transport = transport();
        block_on(async {
            let session = Session::with_transport(settings(), "#/1f", transport.clone()).unwrap();
            session.start().await;

            assert_eq!(session.location_hash(), "#/1f/Budget");
            assert_eq!(transport.requests().len(), 2);
            assert_eq!(session.exit_code(), EXIT_SUCCESS);
            assert_eq!(session.app().viewport().rows().len(), 1);
        });
    }

    #[test]
    fn test_navigate_reuses_loaded_metadata() {
        let transport = transport();
        block_on(async {
            let session = Session::with_transport(settings(), "#/1f/Budget", transport.clone()).unwrap();
            session.start().await;
            session.navigate("#/1f/Budget/cell/B1/formula").await;

            assert_eq!(transport.requests().len(), 2);
            assert_eq!(session.app().formula().text(), "x");
        });
    }

    #[test]
    fn test_failed_request_sets_exit_code() {
        block_on(async {
            let session = Session::with_transport(settings(), "#/2a", Rc::new(MemoryTransport::new())).unwrap();
            session.start().await;

            assert_eq!(session.exit_code(), EXIT_SERVER_STATUS);
            assert_eq!(session.messages().len(), 1);
        });
    }

    #[test]
    fn test_settle_without_work_returns() {
        block_on(async {
            TokioSpawner::new().settle().await;
        });
    }
}
