//! Search engine seam

use async_trait::async_trait;

use crate::error::LunaryResult;
use crate::types::{SearchRequest, SearchResponse};

/// The external full-text search engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Run one query against the index
    async fn search_index(&self, request: SearchRequest) -> LunaryResult<SearchResponse>;
}
