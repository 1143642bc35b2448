use crate::errors::Result;
use crate::selector::Query;
use crate::types::{ElementHandle, ElementSnapshot, RawElement, Strategy};
use async_trait::async_trait;

/// Per-element filter applied during a whole-document scan.
pub type ScanPredicate<'a> = &'a (dyn Fn(&RawElement) -> bool + Send + Sync);

/// Live document access consumed by validation, scanning and composite
/// resolution.
///
/// Implementations own the query engine; the locator core only hands them
/// typed queries and reads back document-order element handles.
#[async_trait]
pub trait DocumentQuery: Send + Sync {
    /// Resolve a query to matching elements in document order.
    async fn query(&self, query: &Query) -> Result<Vec<ElementHandle>>;

    /// Resolve a strategy with the mechanism its kind calls for.
    async fn query_by_strategy(&self, strategy: &Strategy) -> Result<Vec<ElementHandle>> {
        let query = strategy.query()?;
        self.query(&query).await
    }

    /// Capture tag, attributes, text, geometry and ancestry of one element.
    ///
    /// Fails with `ElementNotFound` when the handle no longer refers to an element.
    async fn capture_snapshot(&self, handle: ElementHandle) -> Result<ElementSnapshot>;

    /// Enumerate visible, non-script/style elements that satisfy `predicate`.
    async fn scan_document(&self, predicate: ScanPredicate<'_>) -> Result<Vec<RawElement>>;

    /// Ancestors of an element, nearest first, at most `max_levels` of them.
    async fn ancestors(&self, handle: ElementHandle, max_levels: usize) -> Result<Vec<RawElement>>;
}
