//! Spreadsheet server API client.
//!
//! One [`Fetcher`] per resource kind. A fetch is fire-and-forget: the
//! returned future resolves once every watcher has been told the outcome.
//! Non-2xx answers are reported to `on_failure` as data; nothing is
//! retried.
//!
//! The HTTP layer sits behind [`HttpTransport`] so the same fetchers run
//! against reqwest or an in-memory fake.

mod fetcher;
mod resources;
mod transport;

pub use fetcher::{FetchResource, Fetcher, FetcherWatcher};
pub use resources::{
    CurrencyFetcher, CurrencyResource, DeltaFetcher, DeltaResource, LocaleFetcher, LocaleResource,
    MetadataFetcher, MetadataResource, spreadsheet_id_of,
};
pub use transport::{
    FetchError, HttpMethod, HttpRequest, HttpResponse, HttpTransport, MemoryTransport, ReqwestTransport,
};
