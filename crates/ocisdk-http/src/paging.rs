//! Paging engine.
//!
//! A [`Paginator`] walks a paged listing one response at a time. It starts
//! from an initial [`Response`] and asks the response's [`PageSource`] for
//! each following page while a next-page token is present. Fetches are
//! strictly sequential. Two consecutive pages reporting the same token end
//! the walk with [`PagingError::RepeatedToken`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use tracing::debug;

use crate::error::{PagingError, SdkResult};
use crate::response::{Payload, Response};

/// Fetches the page identified by a next-page token.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page.
    async fn fetch_next(&self, token: &str) -> SdkResult<Response>;
}

enum State {
    Start(Response),
    Fetched {
        token: Option<String>,
        source: Option<Arc<dyn PageSource>>,
    },
    Done,
}

/// A forward-only walk over the pages of a listing.
///
/// # Examples
///
/// ```no_run
/// # async fn demo(client: ocisdk_http::ApiClient) -> ocisdk_http::SdkResult<()> {
/// use http::Method;
/// use ocisdk_http::{Paginator, RequestOptions};
///
/// let first = client
///     .call(Method::GET, "/20180401/alarms", "https://telemetry.us-phoenix-1.oraclecloud.com", RequestOptions::default())
///     .await?;
/// let mut pages = Paginator::new(first);
/// while let Some(page) = pages.next_page().await {
///     let page = page?;
///     println!("{:?}", page.request_id());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Paginator {
    state: State,
    pages: usize,
}

impl fmt::Debug for Paginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Start(_) => "start",
            State::Fetched { .. } => "fetched",
            State::Done => "done",
        };
        f.debug_struct("Paginator")
            .field("state", &state)
            .field("pages", &self.pages)
            .finish()
    }
}

impl Paginator {
    /// Begin at an initial response.
    #[must_use]
    pub fn new(first: Response) -> Self {
        Self {
            state: State::Start(first),
            pages: 0,
        }
    }

    /// The initial response, until it has been yielded.
    #[must_use]
    pub fn current(&self) -> Option<&Response> {
        match &self.state {
            State::Start(response) => Some(response),
            _ => None,
        }
    }

    /// Number of pages yielded so far.
    #[must_use]
    pub fn pages_yielded(&self) -> usize {
        self.pages
    }

    /// The next page, or `None` once the listing is exhausted.
    ///
    /// After an error the walk is over and `None` is returned.
    pub async fn next_page(&mut self) -> Option<SdkResult<Response>> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Done => None,
            State::Start(response) => {
                self.state = State::Fetched {
                    token: response.next_page().map(str::to_owned),
                    source: response.page_source().cloned(),
                };
                self.pages += 1;
                Some(Ok(response))
            }
            State::Fetched { token: None, .. } => None,
            State::Fetched { token: Some(_), source: None } => {
                Some(Err(PagingError::NotReplayable.into()))
            }
            State::Fetched {
                token: Some(token),
                source: Some(source),
            } => {
                debug!(token = %token, page = self.pages + 1, "Fetching next page");
                let response = match source.fetch_next(&token).await {
                    Ok(response) => response,
                    Err(err) => return Some(Err(err)),
                };
                let next = response.next_page().map(str::to_owned);
                if next.as_deref() == Some(token.as_str()) {
                    return Some(Err(PagingError::RepeatedToken(token).into()));
                }
                self.state = State::Fetched {
                    token: next,
                    source: response.page_source().cloned().or(Some(source)),
                };
                self.pages += 1;
                Some(Ok(response))
            }
        }
    }

    /// The remaining pages as a stream.
    pub fn into_stream(self) -> impl Stream<Item = SdkResult<Response>> + Send {
        futures::stream::unfold(self, |mut paginator| async move {
            let item = paginator.next_page().await?;
            Some((item, paginator))
        })
    }
}

/// Collect the items of every page into one list.
///
/// A page's items are its JSON payload when that is an array, else its
/// `items` array field, else its first array-valued field. Pages without
/// a JSON payload contribute nothing.
pub async fn list_all_items(first: Response) -> SdkResult<Vec<Value>> {
    let mut paginator = Paginator::new(first);
    let mut items = Vec::new();
    while let Some(page) = paginator.next_page().await {
        let page = page?;
        if let Some(Payload::Json(value)) = page.into_data() {
            items.extend(page_items(value));
        }
    }
    Ok(items)
}

fn page_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut fields) => {
            if let Some(Value::Array(items)) = fields.remove("items") {
                return items;
            }
            fields
                .into_iter()
                .find_map(|(_, v)| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}
