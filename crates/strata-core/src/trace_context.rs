//! Per-request trace context.
//!
//! The source this framework is modeled on keeps this as a `threading.local`
//! populated at the top of each request handler. Tokio's request handlers
//! run as tasks on a work-stealing thread pool rather than pinned OS
//! threads, so a `thread_local!` would leak context across unrelated
//! requests that happen to share a worker thread. `tokio::task_local!`
//! gives the same "ambient, per-execution, implicitly available" shape
//! while scoping correctly to the task that `TraceContext::scope` wraps.

use std::cell::RefCell;
use std::collections::HashMap;

const HTTP_HEADER_PREFIX: &str = "x-tracectx-";
const CONTEXT_KEY_PREFIX: &str = "traceCtx.";

tokio::task_local! {
    static CONTEXT: RefCell<HashMap<String, String>>;
}

/// An immutable, owned copy of the current trace context. Deliberately
/// exposes no mutating methods: callers (the log formatter, downstream
/// calls) cannot affect the live context through a snapshot they hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceSnapshot(HashMap<String, String>);

impl TraceSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Runs `fut` with a fresh, empty trace context bound to it. Every inbound
/// request must be wrapped in exactly one `scope` call before any
/// `set_from_headers`/`get_all` call, mirroring the invariant that a new
/// request sees an empty context.
pub async fn scope<F, T>(fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    CONTEXT.scope(RefCell::new(HashMap::new()), fut).await
}

/// Extracts every header whose name case-insensitively starts with
/// `X-Tracectx-`, maps it to `traceCtx.<lowercased-suffix>`, and merges the
/// result into the current task's context. Must be called from within a
/// `scope`.
pub fn set_from_headers<'a>(headers: impl IntoIterator<Item = (&'a str, &'a str)>) {
    CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        for (name, value) in headers {
            if let Some(suffix) = strip_prefix_case_insensitive(name, HTTP_HEADER_PREFIX) {
                ctx.insert(format!("{CONTEXT_KEY_PREFIX}{}", suffix.to_lowercase()), value.to_string());
            }
        }
    });
}

/// Merges an already-keyed map into the current context (used by
/// non-HTTP callers, e.g. background job handlers re-establishing
/// correlation ids read off a queued job).
pub fn set_from_map(entries: impl IntoIterator<Item = (String, String)>) {
    CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        ctx.extend(entries);
    });
}

/// Returns an immutable snapshot of the current context. Outside a `scope`
/// (a bug in the host, never a normal request path) this yields an empty
/// snapshot rather than panicking, since the log formatter must be callable
/// from code paths that run before or after request handling.
pub fn get_all() -> TraceSnapshot {
    CONTEXT
        .try_with(|ctx| TraceSnapshot(ctx.borrow().clone()))
        .unwrap_or_default()
}

fn strip_prefix_case_insensitive<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
