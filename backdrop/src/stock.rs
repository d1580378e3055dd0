//! # Stock search
//! Contract for the stock-photo service a host wires in behind its
//! background picker. The engine never talks to the service itself - the
//! picker UI searches, the user chooses, and the chosen photo comes back to
//! the engine as an ordinary [`crate::compose::BackgroundRequest::StockImage`].
//!
//! Most providers' terms require two courtesies that live here so hosts
//! cannot forget them: photographer attribution travels with every photo,
//! and a download must be credited when a photo is actually used.

use backdrop_core::source::{ImageHost, ImageSource};

/// One page of search input.
#[derive(serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct StockQuery {
    pub query: String,
    /// Photos per page. Pickers show a small grid; default is one grid-full.
    pub page_size: usize,
    /// 1-based page index.
    pub page: usize,
}
impl StockQuery {
    pub const DEFAULT_PAGE_SIZE: usize = 12;

    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

/// Who took the photo, and where to point the required credit link.
#[derive(serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Attribution {
    pub name: String,
    pub link: String,
}

/// One search result.
#[derive(serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct StockPhoto {
    /// Provider-side id, echoed back in [`StockProvider::credit_download`].
    pub id: String,
    /// Small rendition for the picker grid.
    pub thumbnail_url: String,
    /// Full-resolution rendition, the one worth compositing.
    pub full_url: String,
    pub attribution: Attribution,
}
impl StockPhoto {
    /// The full-resolution photo as an image source. Stock hosts serve
    /// finished files; they run no transforms for us.
    #[must_use]
    pub fn source(&self) -> ImageSource {
        ImageSource::new(self.full_url.as_str(), ImageHost::Plain)
    }
}

/// The one failure a picker needs to distinguish: the search did not come
/// back. Retry it or drop it; there is nothing smarter to do from here.
#[derive(Debug, thiserror::Error)]
#[error("stock image search failed")]
pub struct StockError {
    #[source]
    pub source: crate::BoxedError,
}

#[async_trait::async_trait]
pub trait StockProvider: Send + Sync {
    async fn search(&self, query: &StockQuery) -> Result<Vec<StockPhoto>, StockError>;
    /// Tell the provider a photo was actually used, for their usage stats.
    /// Fire-and-forget by contract: implementations swallow their own
    /// errors, callers never wait on anything but the request itself.
    async fn credit_download(&self, _photo: &StockPhoto) {}
}
