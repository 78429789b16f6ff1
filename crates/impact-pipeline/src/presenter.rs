//! Seam to the rendering layer.

use impact_core::QueryResult;

/// Receives the terminal result of a query.
///
/// Rendering (map, charts, form state) lives outside this workspace; the
/// pipeline guarantees the presenter sees exactly one terminal snapshot per
/// generation that survives to completion, and none for superseded ones.
pub trait Presenter: Send + Sync {
    fn present(&self, result: &QueryResult);
}

/// Presenter that ignores results, for callers that only consume tickets.
#[derive(Debug, Default)]
pub struct NoopPresenter;

impl Presenter for NoopPresenter {
    fn present(&self, _result: &QueryResult) {}
}
