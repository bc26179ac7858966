//! One translation context per logical request, carried in task-local storage.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::state::LocaleState;
use crate::message::CompiledMessage;

tokio::task_local! {
    /// Context of the running request.
    static CONTEXT: I18nContext;
}

/// Request-scoped view of one locale.
///
/// Holds the locale state current when the request started, so a request
/// keeps reading consistent layers while translations are replaced.
#[derive(Debug, Clone)]
pub struct I18nContext {
    /// Locale the request resolved to.
    locale: Arc<str>,
    /// Locale state snapshot taken at scope entry.
    state: Arc<LocaleState>,
    /// Resolved fallbacks for keys missing from the compiled layer.
    missing: Arc<Mutex<HashMap<String, Arc<CompiledMessage>>>>,
}

impl I18nContext {
    /// Context over a snapshot of `state`.
    pub(super) fn new(locale: &str, state: Arc<LocaleState>) -> Self {
        Self { locale: locale.into(), state, missing: Arc::default() }
    }

    /// Locale the request resolved to.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Locale state snapshot.
    pub(super) fn state(&self) -> &LocaleState {
        &self.state
    }

    /// Previously resolved fallback for `key`.
    pub(super) fn remembered(&self, key: &str) -> Option<Arc<CompiledMessage>> {
        self.missing.lock().get(key).cloned()
    }

    /// Memoizes the resolved fallback for `key`.
    pub(super) fn remember(&self, key: &str, compiled: &Arc<CompiledMessage>) {
        self.missing.lock().insert(key.to_string(), Arc::clone(compiled));
    }

    /// The context of the running request, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CONTEXT.try_with(Clone::clone).ok()
    }
}

/// Runs `future` with `context` installed.
pub(super) async fn scope<F: Future>(context: I18nContext, future: F) -> F::Output {
    CONTEXT.scope(context, future).await
}

/// Runs `f` with `context` installed.
pub(super) fn sync_scope<R>(context: I18nContext, f: impl FnOnce() -> R) -> R {
    CONTEXT.sync_scope(context, f)
}

/// Locale of the running request.
#[must_use]
pub fn current_locale() -> Option<String> {
    CONTEXT.try_with(|context| context.locale.to_string()).ok()
}
