//! Policy Search
//!
//! Retrieval over the store's policy documents.

mod keyword;

pub use keyword::KeywordPolicyIndex;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::PolicyDocument;

/// Ranked document search (Strategy pattern)
///
/// `KeywordPolicyIndex` is the built-in implementation; an embedding-backed
/// vector store fits behind the same trait.
#[async_trait]
pub trait PolicyIndex: Send + Sync {
    /// Up to `k` documents, best match first. Empty when nothing is relevant.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<PolicyDocument>>;

    /// Number of indexed documents
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
