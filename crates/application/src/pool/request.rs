use hostq_domain::{LookupAnswer, LookupMethod};

/// Arbitrary key/value bag carried from dispatch to the callback untouched.
pub type Extras = serde_json::Map<String, serde_json::Value>;

/// Invoked by [`super::ResolverPool::run`] on the draining thread with the
/// answer (`None` when resolution produced nothing) and the extras supplied
/// at dispatch.
pub type LookupCallback = Box<dyn FnOnce(Option<LookupAnswer>, Extras) + Send + 'static>;

/// One queued lookup. Immutable once enqueued; consumed by exactly one
/// worker.
pub(crate) struct LookupRequest {
    pub method: LookupMethod,
    pub argument: String,
    pub callback: LookupCallback,
    pub extras: Extras,
}

/// A finished lookup awaiting delivery to its callback.
pub(crate) struct CompletedLookup {
    pub callback: LookupCallback,
    pub answer: Option<LookupAnswer>,
    pub extras: Extras,
}
