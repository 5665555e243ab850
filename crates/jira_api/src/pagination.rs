//! Offset-based continuation over Jira list endpoints.
//!
//! Jira list responses carry `startAt`, `maxResults`, `total` and, depending on
//! the endpoint and server version, an optional `isLast` marker. [`paginate`]
//! keeps requesting pages until the marker (or the totals, when the marker is
//! absent) say the collection is exhausted.

use std::future::Future;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;

/// Tri-state `isLast` marker; servers omit it on several endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<bool>")]
pub enum LastPage {
    Yes,
    No,
    #[default]
    Unknown,
}

impl From<Option<bool>> for LastPage {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => LastPage::Yes,
            Some(false) => LastPage::No,
            None => LastPage::Unknown,
        }
    }
}

/// Paging metadata returned next to the items of a list response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    #[serde(default)]
    pub max_results: usize,
    #[serde(default)]
    pub start_at: usize,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub is_last: LastPage,
}

impl PageState {
    /// Returns the offset of the next page after a page requested at `offset`,
    /// or `None` once the collection is exhausted.
    pub fn next_offset(&self, offset: usize) -> Option<usize> {
        if self.max_results == 0 {
            return None;
        }
        let next = offset + self.max_results;
        match self.is_last {
            LastPage::No => Some(next),
            LastPage::Unknown if self.total >= next => Some(next),
            _ => None,
        }
    }
}

/// One page of items plus its paging metadata.
#[derive(Clone, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub state: PageState,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, state: PageState) -> Self {
        Self { items, state }
    }
}

/// Fetches pages starting at offset 0 until exhausted and concatenates their
/// items in request order. The first failing fetch aborts the whole walk.
pub async fn paginate<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut offset = 0usize;
    loop {
        let page = fetch(offset).await?;
        let received = page.items.len();
        debug!(
            offset,
            received,
            total = page.state.total,
            max_results = page.state.max_results,
            "received page"
        );
        items.extend(page.items);

        match page.state.next_offset(offset) {
            Some(_) if received == 0 => {
                warn!(offset, "empty page not marked as last; stopping pagination");
                break;
            }
            Some(next) => offset = next,
            None => break,
        }
    }
    Ok(items)
}
