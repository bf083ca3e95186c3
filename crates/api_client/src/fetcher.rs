//! The generic request/response pipeline shared by every resource kind.

use std::marker::PhantomData;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;
use websheet_core::{WatcherRemover, Watchers};

use crate::transport::{FetchError, HttpMethod, HttpRequest, HttpTransport};

/// A kind of JSON resource the server returns.
pub trait FetchResource: 'static {
    type Value: DeserializeOwned + 'static;

    /// Short name used in the fetch log.
    const NAME: &'static str;
}

/// Told about every fetch of one resource kind.
pub trait FetcherWatcher<T> {
    fn on_begin(&self, _method: HttpMethod, _url: &Url, _body: Option<&str>) {}

    /// A 2xx response whose body parsed.
    fn on_success(&self, value: &T);

    /// [`on_success`](Self::on_success) with the URL that answered. Override
    /// to tell apart responses to different requests.
    fn on_response(&self, _url: &Url, value: &T) {
        self.on_success(value);
    }

    /// Any non-2xx response.
    fn on_failure(&self, status: u16, headers: &[(String, String)], body: &str);

    /// No response, or a 2xx body that did not parse.
    fn on_error(&self, error: &FetchError);
}

/// Issues requests for resource `R` and reports outcomes to its watchers.
///
/// Cloning is cheap and clones share watchers.
pub struct Fetcher<R: FetchResource> {
    base_url: Url,
    transport: Rc<dyn HttpTransport>,
    watchers: Rc<Watchers<dyn FetcherWatcher<R::Value>>>,
    fetch_log: bool,
    _resource: PhantomData<R>,
}

impl<R: FetchResource> Clone for Fetcher<R> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            transport: Rc::clone(&self.transport),
            watchers: Rc::clone(&self.watchers),
            fetch_log: self.fetch_log,
            _resource: PhantomData,
        }
    }
}

impl<R: FetchResource> Fetcher<R> {
    pub fn new(base_url: &str, transport: Rc<dyn HttpTransport>) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            transport,
            watchers: Rc::new(Watchers::new()),
            fetch_log: false,
            _resource: PhantomData,
        })
    }

    /// Log every request and response at debug level, target `fetch`.
    pub fn with_fetch_log(mut self, fetch_log: bool) -> Self {
        self.fetch_log = fetch_log;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn add_watcher(&self, watcher: Rc<dyn FetcherWatcher<R::Value>>) -> WatcherRemover {
        self.watchers.add(watcher)
    }

    /// `base_url` + percent-encoded path segments + query.
    pub fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())));
        }
        Ok(url)
    }

    pub fn get(&self, url: Url) -> LocalBoxFuture<'static, ()> {
        self.fetch(HttpMethod::Get, url, None)
    }

    pub fn post(&self, url: Url, body: Option<String>) -> LocalBoxFuture<'static, ()> {
        self.fetch(HttpMethod::Post, url, body)
    }

    pub fn put(&self, url: Url, body: Option<String>) -> LocalBoxFuture<'static, ()> {
        self.fetch(HttpMethod::Put, url, body)
    }

    pub fn patch(&self, url: Url, body: Option<String>) -> LocalBoxFuture<'static, ()> {
        self.fetch(HttpMethod::Patch, url, body)
    }

    pub fn delete(&self, url: Url) -> LocalBoxFuture<'static, ()> {
        self.fetch(HttpMethod::Delete, url, None)
    }

    /// Build the URL and body, then fetch. A URL or body that cannot be
    /// built is reported to `on_error` like any other failed fetch.
    pub(crate) fn request<B: Serialize>(
        &self,
        method: HttpMethod,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> LocalBoxFuture<'static, ()> {
        let url = match self.url(segments, query) {
            Ok(url) => url,
            Err(e) => return self.fail(e),
        };
        let body = match body.map(serde_json::to_string).transpose() {
            Ok(body) => body,
            Err(e) => return self.fail(FetchError::Parse(e.to_string())),
        };
        self.fetch(method, url, body)
    }

    fn fail(&self, error: FetchError) -> LocalBoxFuture<'static, ()> {
        let watchers = Rc::clone(&self.watchers);
        async move {
            log::warn!(target: "fetch", "{} fetch not sent: {}", R::NAME, error);
            watchers.fire(|w| w.on_error(&error));
        }
        .boxed_local()
    }

    /// Issue one request. The request is sent when the future is first
    /// polled; it resolves after the watchers have been notified.
    pub fn fetch(&self, method: HttpMethod, url: Url, body: Option<String>) -> LocalBoxFuture<'static, ()> {
        let this = self.clone();
        async move {
            this.watchers.fire(|w| w.on_begin(method, &url, body.as_deref()));
            if this.fetch_log {
                log::debug!(target: "fetch", "{} {} {} {}", R::NAME, method, url, body.as_deref().unwrap_or(""));
            }

            let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
            if body.is_some() {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
            }
            let request = HttpRequest {
                method,
                url: url.clone(),
                headers,
                body,
            };

            let response = match this.transport.send(request).await {
                Ok(response) => response,
                Err(e) => {
                    log::warn!(target: "fetch", "{} {} {} failed: {}", R::NAME, method, url, e);
                    this.watchers.fire(|w| w.on_error(&e));
                    return;
                }
            };

            if this.fetch_log {
                log::debug!(target: "fetch", "{} {} {} -> {} {}", R::NAME, method, url, response.status, response.body);
            }

            if !response.is_success() {
                this.watchers
                    .fire(|w| w.on_failure(response.status, &response.headers, &response.body));
                return;
            }

            match serde_json::from_str::<R::Value>(&response.body) {
                Ok(value) => this.watchers.fire(|w| w.on_response(&url, &value)),
                Err(e) => {
                    let error = FetchError::Parse(format!("{} response: {}", R::NAME, e));
                    this.watchers.fire(|w| w.on_error(&error));
                }
            }
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpResponse, MemoryTransport};
    use futures::executor::block_on;
    use std::cell::RefCell;

    struct Numbers;

    impl FetchResource for Numbers {
        type Value = Vec<u32>;
        const NAME: &'static str = "numbers";
    }

    #[derive(Default)]
    struct Log {
        events: RefCell<Vec<String>>,
    }

    impl FetcherWatcher<Vec<u32>> for Log {
        fn on_begin(&self, method: HttpMethod, url: &Url, _body: Option<&str>) {
            self.events.borrow_mut().push(format!("begin {} {}", method, url.path()));
        }

        fn on_success(&self, value: &Vec<u32>) {
            self.events.borrow_mut().push(format!("success {:?}", value));
        }

        fn on_failure(&self, status: u16, _headers: &[(String, String)], body: &str) {
            self.events.borrow_mut().push(format!("failure {} {}", status, body));
        }

        fn on_error(&self, error: &FetchError) {
            self.events.borrow_mut().push(format!("error {}", error));
        }
    }

    fn setup() -> (Rc<MemoryTransport>, Fetcher<Numbers>, Rc<Log>) {
        let transport = Rc::new(MemoryTransport::new());
        let fetcher = Fetcher::<Numbers>::new("http://localhost:12345", transport.clone()).unwrap();
        let log = Rc::new(Log::default());
        fetcher.add_watcher(log.clone());
        (transport, fetcher, log)
    }

    #[test]
    fn test_url_encodes_segments() {
        let (_, fetcher, _) = setup();
        let url = fetcher
            .url(&["api", "spreadsheet", "1f", "cell", "A1:B2"], &[("home", "A1".to_string())])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:12345/api/spreadsheet/1f/cell/A1:B2?home=A1");

        let url = fetcher.url(&["api", "locale", "a/b c"], &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:12345/api/locale/a%2Fb%20c");
    }

    #[test]
    fn test_invalid_base_url() {
        let transport: Rc<dyn HttpTransport> = Rc::new(MemoryTransport::new());
        assert!(matches!(
            Fetcher::<Numbers>::new("not a url", transport.clone()),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            Fetcher::<Numbers>::new("mailto:someone@example.com", transport),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_success() {
        let (transport, fetcher, log) = setup();
        transport.respond(HttpMethod::Get, "/numbers", HttpResponse::json(200, "[1,2]"));

        let url = fetcher.url(&["numbers"], &[]).unwrap();
        block_on(fetcher.get(url));

        assert_eq!(*log.events.borrow(), vec!["begin GET /numbers", "success [1, 2]"]);
        let request = &transport.requests()[0];
        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(request.header("content-type"), None);
    }

    #[test]
    fn test_body_sets_content_type() {
        let (transport, fetcher, _) = setup();
        transport.respond(HttpMethod::Post, "/numbers", HttpResponse::json(201, "[3]"));

        let url = fetcher.url(&["numbers"], &[]).unwrap();
        block_on(fetcher.post(url, Some("[3]".to_string())));

        let request = &transport.requests()[0];
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.body.as_deref(), Some("[3]"));
    }

    #[test]
    fn test_failure_is_data() {
        let (transport, fetcher, log) = setup();
        transport.respond(HttpMethod::Delete, "/numbers", HttpResponse::json(409, "busy"));

        let url = fetcher.url(&["numbers"], &[]).unwrap();
        block_on(fetcher.delete(url));

        assert_eq!(log.events.borrow()[1], "failure 409 busy");
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_transport_and_parse_errors() {
        let (transport, fetcher, log) = setup();
        transport.fail(HttpMethod::Get, "/down", FetchError::Network("refused".into()));
        transport.respond(HttpMethod::Get, "/garbage", HttpResponse::json(200, "{"));

        block_on(fetcher.get(fetcher.url(&["down"], &[]).unwrap()));
        block_on(fetcher.get(fetcher.url(&["garbage"], &[]).unwrap()));

        let events = log.events.borrow();
        assert_eq!(events[1], "error Network error: refused");
        assert!(events[3].starts_with("error Parse error: numbers response"));
    }

    #[test]
    fn test_request_is_lazy() {
        let (transport, fetcher, _) = setup();
        let future = fetcher.get(fetcher.url(&["numbers"], &[]).unwrap());
        assert!(transport.requests().is_empty());
        block_on(future);
        assert_eq!(transport.requests().len(), 1);
    }
}
