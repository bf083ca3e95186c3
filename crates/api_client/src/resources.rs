//! One fetcher per server resource.
//!
//! Endpoints:
//!
//! | resource | method | path |
//! |----------|--------|------|
//! | metadata | POST   | `/api/spreadsheet` |
//! | metadata | GET, PATCH | `/api/spreadsheet/{id}` |
//! | delta    | GET    | `/api/spreadsheet/{id}/cell/*/force-recompute` |
//! | delta    | POST, PATCH, DELETE | `/api/spreadsheet/{id}/{cell,column,row}/{selection}` |
//! | delta    | POST   | `/api/spreadsheet/{id}/{kind}/{selection}/clear` |
//! | delta    | POST   | `/api/spreadsheet/{id}/{column,row}/{selection}/{after,before}?count=` |
//! | delta    | GET    | `/api/spreadsheet/{id}/{kind}/{selection}/sort?comparators=` |
//! | delta    | GET    | `/api/spreadsheet/{id}/cell/{selection}/find` |
//! | delta    | POST   | `/api/spreadsheet/{id}/label` |
//! | locale   | GET    | `/api/locale/{tag}` |
//! | currency | GET    | `/api/currency/{code}` |

use std::num::NonZeroU32;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde_json::Value;
use url::Url;
use websheet_core::{CellRef, LabelName, SpreadsheetSelection, WatcherRemover};
use websheet_protocol::{
    Currency, LabelMapping, LabelTarget, Locale, MetadataPropertyName, SpreadsheetCell, SpreadsheetDelta,
    SpreadsheetId, SpreadsheetMetadata,
};
use websheet_viewport::Viewport;

use crate::fetcher::{FetchResource, Fetcher, FetcherWatcher};
use crate::transport::{FetchError, HttpMethod, HttpTransport};

const API: &str = "api";
const SPREADSHEET: &str = "spreadsheet";

/// No request body.
const NO_BODY: Option<&()> = None;

/// The spreadsheet a request URL addresses, from its `/api/spreadsheet/{id}`
/// segments. `None` for `/api/spreadsheet` itself and other resources.
pub fn spreadsheet_id_of(url: &Url) -> Option<SpreadsheetId> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    segments
        .windows(3)
        .find(|w| w[0] == API && w[1] == SPREADSHEET)
        .and_then(|w| w[2].parse().ok())
}

fn selection_kind(selection: &SpreadsheetSelection) -> &'static str {
    if selection.is_column_like() {
        "column"
    } else if selection.is_row_like() {
        "row"
    } else {
        "cell"
    }
}

// ============================================================================
// Resource kinds
// ============================================================================

pub struct DeltaResource;

impl FetchResource for DeltaResource {
    type Value = SpreadsheetDelta;
    const NAME: &'static str = "delta";
}

pub struct MetadataResource;

impl FetchResource for MetadataResource {
    type Value = SpreadsheetMetadata;
    const NAME: &'static str = "metadata";
}

pub struct LocaleResource;

impl FetchResource for LocaleResource {
    type Value = Locale;
    const NAME: &'static str = "locale";
}

pub struct CurrencyResource;

impl FetchResource for CurrencyResource {
    type Value = Currency;
    const NAME: &'static str = "currency";
}

// ============================================================================
// Delta
// ============================================================================

/// Cell loads and mutations. Every response is a [`SpreadsheetDelta`].
#[derive(Clone)]
pub struct DeltaFetcher {
    fetcher: Fetcher<DeltaResource>,
}

impl DeltaFetcher {
    pub fn new(base_url: &str, transport: Rc<dyn HttpTransport>) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: Fetcher::new(base_url, transport)?,
        })
    }

    pub fn with_fetch_log(self, fetch_log: bool) -> Self {
        Self {
            fetcher: self.fetcher.with_fetch_log(fetch_log),
        }
    }

    pub fn fetcher(&self) -> &Fetcher<DeltaResource> {
        &self.fetcher
    }

    pub fn add_watcher(&self, watcher: Rc<dyn FetcherWatcher<SpreadsheetDelta>>) -> WatcherRemover {
        self.fetcher.add_watcher(watcher)
    }

    /// Load (and recompute) every cell in the viewport.
    pub fn load_viewport(
        &self,
        id: SpreadsheetId,
        viewport: &Viewport,
        include_frozen_columns_rows: bool,
    ) -> LocalBoxFuture<'static, ()> {
        let id = id.to_string();
        let query = viewport.query_params(include_frozen_columns_rows);
        self.fetcher.request(
            HttpMethod::Get,
            &[API, SPREADSHEET, &id, "cell", "*", "force-recompute"],
            &query,
            NO_BODY,
        )
    }

    /// Replace the formula text of one cell.
    pub fn save_formula(&self, id: SpreadsheetId, cell: CellRef, text: &str) -> LocalBoxFuture<'static, ()> {
        let body = SpreadsheetDelta {
            cells: vec![SpreadsheetCell::new(cell, text)],
            ..Default::default()
        };
        let (id, cell) = (id.to_string(), cell.to_string());
        self.fetcher
            .request(HttpMethod::Post, &[API, SPREADSHEET, &id, "cell", &cell], &[], Some(&body))
    }

    /// Set one style property on every cell of the selection; a null value
    /// removes it.
    pub fn patch_style(
        &self,
        id: SpreadsheetId,
        selection: &SpreadsheetSelection,
        property: &str,
        value: Value,
    ) -> LocalBoxFuture<'static, ()> {
        let mut style = serde_json::Map::new();
        style.insert(property.to_string(), value);
        let body = serde_json::json!({ "style": style });
        let (id, selection) = (id.to_string(), selection.to_string());
        self.fetcher.request(
            HttpMethod::Patch,
            &[API, SPREADSHEET, &id, "cell", &selection],
            &[],
            Some(&body),
        )
    }

    /// Empty every cell of the selection, keeping the cells themselves.
    pub fn clear(&self, id: SpreadsheetId, selection: &SpreadsheetSelection) -> LocalBoxFuture<'static, ()> {
        let kind = selection_kind(selection);
        let (id, selection) = (id.to_string(), selection.to_string());
        self.fetcher.request(
            HttpMethod::Post,
            &[API, SPREADSHEET, &id, kind, &selection, "clear"],
            &[],
            NO_BODY,
        )
    }

    /// Delete the selected cells, columns or rows.
    pub fn delete_cells(&self, id: SpreadsheetId, selection: &SpreadsheetSelection) -> LocalBoxFuture<'static, ()> {
        let kind = selection_kind(selection);
        let (id, selection) = (id.to_string(), selection.to_string());
        self.fetcher
            .request(HttpMethod::Delete, &[API, SPREADSHEET, &id, kind, &selection], &[], NO_BODY)
    }

    pub fn insert_after(
        &self,
        id: SpreadsheetId,
        selection: &SpreadsheetSelection,
        count: NonZeroU32,
    ) -> LocalBoxFuture<'static, ()> {
        self.insert(id, selection, "after", count)
    }

    pub fn insert_before(
        &self,
        id: SpreadsheetId,
        selection: &SpreadsheetSelection,
        count: NonZeroU32,
    ) -> LocalBoxFuture<'static, ()> {
        self.insert(id, selection, "before", count)
    }

    fn insert(
        &self,
        id: SpreadsheetId,
        selection: &SpreadsheetSelection,
        direction: &str,
        count: NonZeroU32,
    ) -> LocalBoxFuture<'static, ()> {
        let kind = selection_kind(selection);
        let (id, selection) = (id.to_string(), selection.to_string());
        self.fetcher.request(
            HttpMethod::Post,
            &[API, SPREADSHEET, &id, kind, &selection, direction],
            &[("count", count.to_string())],
            NO_BODY,
        )
    }

    /// Sort the selection with a comparator list such as `A=text UP`.
    pub fn sort(
        &self,
        id: SpreadsheetId,
        selection: &SpreadsheetSelection,
        comparators: &str,
    ) -> LocalBoxFuture<'static, ()> {
        let kind = selection_kind(selection);
        let (id, selection) = (id.to_string(), selection.to_string());
        self.fetcher.request(
            HttpMethod::Get,
            &[API, SPREADSHEET, &id, kind, &selection, "sort"],
            &[("comparators", comparators.to_string())],
            NO_BODY,
        )
    }

    /// Cells in the selection matching `query`, paged.
    pub fn find_cells(
        &self,
        id: SpreadsheetId,
        selection: &SpreadsheetSelection,
        offset: Option<u32>,
        count: Option<NonZeroU32>,
        query: Option<&str>,
    ) -> LocalBoxFuture<'static, ()> {
        let mut params = Vec::new();
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }
        if let Some(count) = count {
            params.push(("count", count.to_string()));
        }
        if let Some(query) = query {
            params.push(("query", query.to_string()));
        }
        let (id, selection) = (id.to_string(), selection.to_string());
        self.fetcher.request(
            HttpMethod::Get,
            &[API, SPREADSHEET, &id, "cell", &selection, "find"],
            &params,
            NO_BODY,
        )
    }

    /// Create or move a label.
    pub fn save_label(&self, id: SpreadsheetId, label: LabelName, target: LabelTarget) -> LocalBoxFuture<'static, ()> {
        let body = LabelMapping::new(label, target);
        let id = id.to_string();
        self.fetcher
            .request(HttpMethod::Post, &[API, SPREADSHEET, &id, "label"], &[], Some(&body))
    }
}

// ============================================================================
// Metadata
// ============================================================================

#[derive(Clone)]
pub struct MetadataFetcher {
    fetcher: Fetcher<MetadataResource>,
}

impl MetadataFetcher {
    pub fn new(base_url: &str, transport: Rc<dyn HttpTransport>) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: Fetcher::new(base_url, transport)?,
        })
    }

    pub fn with_fetch_log(self, fetch_log: bool) -> Self {
        Self {
            fetcher: self.fetcher.with_fetch_log(fetch_log),
        }
    }

    pub fn fetcher(&self) -> &Fetcher<MetadataResource> {
        &self.fetcher
    }

    pub fn add_watcher(&self, watcher: Rc<dyn FetcherWatcher<SpreadsheetMetadata>>) -> WatcherRemover {
        self.fetcher.add_watcher(watcher)
    }

    pub fn load(&self, id: SpreadsheetId) -> LocalBoxFuture<'static, ()> {
        let id = id.to_string();
        self.fetcher
            .request(HttpMethod::Get, &[API, SPREADSHEET, &id], &[], NO_BODY)
    }

    /// Create an empty spreadsheet; the server answers with its metadata.
    pub fn create(&self) -> LocalBoxFuture<'static, ()> {
        let body = serde_json::json!({});
        self.fetcher
            .request(HttpMethod::Post, &[API, SPREADSHEET], &[], Some(&body))
    }

    /// Change one property; a null value removes it.
    pub fn patch_property(
        &self,
        id: SpreadsheetId,
        property: MetadataPropertyName,
        value: Value,
    ) -> LocalBoxFuture<'static, ()> {
        let body = SpreadsheetMetadata::patch_body(property, value);
        let id = id.to_string();
        self.fetcher
            .request(HttpMethod::Patch, &[API, SPREADSHEET, &id], &[], Some(&body))
    }
}

// ============================================================================
// Locale & currency
// ============================================================================

#[derive(Clone)]
pub struct LocaleFetcher {
    fetcher: Fetcher<LocaleResource>,
}

impl LocaleFetcher {
    pub fn new(base_url: &str, transport: Rc<dyn HttpTransport>) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: Fetcher::new(base_url, transport)?,
        })
    }

    pub fn add_watcher(&self, watcher: Rc<dyn FetcherWatcher<Locale>>) -> WatcherRemover {
        self.fetcher.add_watcher(watcher)
    }

    /// Look up a language tag such as `en-AU`.
    pub fn get(&self, tag: &str) -> LocalBoxFuture<'static, ()> {
        self.fetcher
            .request(HttpMethod::Get, &[API, "locale", tag], &[], NO_BODY)
    }
}

#[derive(Clone)]
pub struct CurrencyFetcher {
    fetcher: Fetcher<CurrencyResource>,
}

impl CurrencyFetcher {
    pub fn new(base_url: &str, transport: Rc<dyn HttpTransport>) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: Fetcher::new(base_url, transport)?,
        })
    }

    pub fn add_watcher(&self, watcher: Rc<dyn FetcherWatcher<Currency>>) -> WatcherRemover {
        self.fetcher.add_watcher(watcher)
    }

    /// Look up an ISO 4217 code such as `AUD`.
    pub fn get(&self, code: &str) -> LocalBoxFuture<'static, ()> {
        self.fetcher
            .request(HttpMethod::Get, &[API, "currency", code], &[], NO_BODY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(text: &str) -> Url {
        Url::parse(text).unwrap()
    }

    #[test]
    fn test_spreadsheet_id_of() {
        assert_eq!(
            spreadsheet_id_of(&url("http://localhost:12345/api/spreadsheet/1f/cell/*/force-recompute?width=3")),
            Some(SpreadsheetId::new(0x1f))
        );
        assert_eq!(
            spreadsheet_id_of(&url("http://host/prefix/api/spreadsheet/2a")),
            Some(SpreadsheetId::new(0x2a))
        );
        assert_eq!(spreadsheet_id_of(&url("http://localhost:12345/api/spreadsheet")), None);
        assert_eq!(spreadsheet_id_of(&url("http://localhost:12345/api/locale/en-AU")), None);
    }
}
