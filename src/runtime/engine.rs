//! The translation service shared by every request.

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::sync::{
    Arc,
    LazyLock,
};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::client::{
    ChunkPath,
    ChunkResponse,
    ClientSettings,
    ClientState,
};
use super::context::{
    self,
    I18nContext,
};
use super::error::{
    RuntimeError,
    TranslateError,
};
use super::fallback::FallbackPolicy;
use super::state::LocaleState;
use crate::chunks::Manifest;
use crate::config::{
    I18nSettings,
    RuntimeOptions,
};
use crate::ir::RawTranslations;
use crate::message::{
    CompiledMessage,
    MessageArgs,
    MessageCompiler,
    MessagePart,
};
use crate::rich::{
    RenderNode,
    RichChild,
    TagHandlers,
    render,
};

/// Locale used for calls made outside any request context.
const UNSCOPED_LOCALE: &str = "und";

/// Compiler for translations outside any request.
static UNSCOPED: LazyLock<MessageCompiler> = LazyLock::new(MessageCompiler::new);

/// Formats `fallback` (or the key) without locale-specific state.
///
/// Usable before any runtime is configured.
#[must_use]
pub fn translate_unscoped(key: &str, fallback: Option<&str>, args: &MessageArgs) -> String {
    UNSCOPED.compile(UNSCOPED_LOCALE, fallback.unwrap_or(key)).format(args)
}

/// State shared by every clone of a runtime.
#[derive(Debug)]
struct Shared {
    /// Validated default locale.
    default_locale: String,
    /// Missing-key policy for this configuration.
    fallback: FallbackPolicy,
    /// URL scheme and global name for payloads.
    client: ClientSettings,
    /// Template cache shared by all locales.
    compiler: MessageCompiler,
    /// Manifest currently served.
    manifest: ArcSwap<Manifest>,
    /// Published state per configured locale.
    states: HashMap<String, ArcSwap<LocaleState>>,
    /// Serializes writers; readers never take it.
    publish: Mutex<()>,
}

/// Translation service: per-locale caches, request scoping and client payloads.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct I18nRuntime {
    /// Shared state.
    shared: Arc<Shared>,
}

impl I18nRuntime {
    /// # Errors
    /// Returns `RuntimeError::Config` when `options` fail validation.
    pub fn configure(options: RuntimeOptions, manifest: Manifest) -> Result<Self, RuntimeError> {
        Self::configure_with(options, manifest, &I18nSettings::default())
    }

    /// Like `configure`, taking payload URL and global name settings from `settings`.
    ///
    /// # Errors
    /// Returns `RuntimeError::Config` when `options` fail validation.
    pub fn configure_with(
        options: RuntimeOptions,
        manifest: Manifest,
        settings: &I18nSettings,
    ) -> Result<Self, RuntimeError> {
        options.check()?;
        let default_locale = options.effective_default_locale().unwrap_or(UNSCOPED_LOCALE).to_string();

        let manifest = Arc::new(manifest);
        let states = options
            .locales
            .iter()
            .map(|locale| {
                let state = LocaleState::new(locale, Arc::clone(&manifest), None);
                (locale.clone(), ArcSwap::from_pointee(state))
            })
            .collect();

        tracing::info!(
            locales = ?options.locales,
            default_locale = %default_locale,
            fallback = ?options.fallback,
            keys = manifest.keys.len(),
            chunks = manifest.chunks.len(),
            "Runtime configured"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                default_locale,
                fallback: options.fallback,
                client: ClientSettings::from(settings),
                compiler: MessageCompiler::new(),
                manifest: ArcSwap::new(manifest),
                states,
                publish: Mutex::new(()),
            }),
        })
    }

    /// Default locale.
    #[must_use]
    pub fn default_locale(&self) -> &str {
        &self.shared.default_locale
    }

    /// Configured locales, sorted.
    #[must_use]
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.shared.states.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    /// Manifest currently served.
    #[must_use]
    pub fn manifest(&self) -> Arc<Manifest> {
        self.shared.manifest.load_full()
    }

    /// Current state of a configured locale.
    fn state(&self, locale: &str) -> Result<Arc<LocaleState>, TranslateError> {
        self.shared
            .states
            .get(locale)
            .map(ArcSwap::load_full)
            .ok_or_else(|| TranslateError::UnknownLocale(locale.to_string()))
    }

    /// Replaces a locale's translations.
    ///
    /// Hashes are recomputed immediately; merged and compiled layers, the boot
    /// script and chunk payloads are rebuilt on next use. The new state is
    /// published in one swap.
    ///
    /// # Errors
    /// Returns `TranslateError::UnknownLocale` for locales not configured.
    pub fn set_translations(&self, locale: &str, raw: RawTranslations) -> Result<(), RuntimeError> {
        let slot = self
            .shared
            .states
            .get(locale)
            .ok_or_else(|| TranslateError::UnknownLocale(locale.to_string()))?;

        let _guard = self.shared.publish.lock();
        let entries = raw.len();
        let state = LocaleState::new(locale, self.shared.manifest.load_full(), Some(Arc::new(raw)));
        slot.store(Arc::new(state));
        tracing::debug!(locale, entries, "Translations replaced");
        Ok(())
    }

    /// Swaps in a new manifest (live development builds) and republishes every locale.
    pub fn set_manifest(&self, manifest: Manifest) {
        let _guard = self.shared.publish.lock();
        let manifest = Arc::new(manifest);
        self.shared.manifest.store(Arc::clone(&manifest));
        for slot in self.shared.states.values() {
            let rebuilt = slot.load().rebuild(Arc::clone(&manifest));
            slot.store(Arc::new(rebuilt));
        }
        tracing::debug!(keys = manifest.keys.len(), chunks = manifest.chunks.len(), "Manifest replaced");
    }

    /// Resolves `locale` to a configured one, falling back to the default.
    fn context(&self, locale: &str) -> I18nContext {
        let locale = if self.shared.states.contains_key(locale) {
            locale
        } else {
            tracing::warn!(locale, default_locale = %self.shared.default_locale, "Unknown locale, using default");
            self.shared.default_locale.as_str()
        };
        match self.state(locale) {
            Ok(state) => I18nContext::new(locale, state),
            // The default locale is always configured.
            Err(_) => I18nContext::new(
                locale,
                Arc::new(LocaleState::new(locale, self.shared.manifest.load_full(), None)),
            ),
        }
    }

    /// Runs `future` as one request translated into `locale`.
    pub async fn scope<F: Future>(&self, locale: &str, future: F) -> F::Output {
        context::scope(self.context(locale), future).await
    }

    /// Synchronous variant of `scope`.
    pub fn sync_scope<R>(&self, locale: &str, f: impl FnOnce() -> R) -> R {
        context::sync_scope(self.context(locale), f)
    }

    /// Applies the fallback policy to a key missing from the context's translations.
    fn missing(&self, context: &I18nContext, key: &str, fallback: Option<&str>) -> Result<String, TranslateError> {
        let locale = context.locale();
        let template = match &self.shared.fallback {
            FallbackPolicy::Fallback => fallback
                .or_else(|| context.state().manifest().fallback_for(key))
                .unwrap_or(key)
                .to_string(),
            FallbackPolicy::Key => key.to_string(),
            FallbackPolicy::Throw => {
                return Err(TranslateError::MissingTranslation {
                    key: key.to_string(),
                    locale: locale.to_string(),
                });
            }
            FallbackPolicy::Custom(handler) => handler(key, locale),
        };
        tracing::debug!(key, locale, "Missing translation, applying fallback policy");
        Ok(template)
    }

    /// Compiled message for `key` in the current context.
    fn resolve(&self, key: &str, fallback: Option<&str>) -> Result<Arc<CompiledMessage>, TranslateError> {
        let Some(context) = I18nContext::current() else {
            return Ok(UNSCOPED.compile(UNSCOPED_LOCALE, fallback.unwrap_or(key)));
        };

        if let Some(compiled) = context.state().compiled(&self.shared.compiler).get(key) {
            return Ok(Arc::clone(compiled));
        }
        if let Some(compiled) = context.remembered(key) {
            return Ok(compiled);
        }
        let template = self.missing(&context, key, fallback)?;
        let compiled = self.shared.compiler.compile(context.locale(), &template);
        context.remember(key, &compiled);
        Ok(compiled)
    }

    /// Translates `key` in the current request's locale.
    ///
    /// Outside a request context the fallback (or key) is formatted without
    /// locale data.
    ///
    /// # Errors
    /// `TranslateError::MissingTranslation` under `FallbackPolicy::Throw`.
    pub fn t(&self, key: &str, fallback: Option<&str>, args: &MessageArgs) -> Result<String, TranslateError> {
        Ok(self.resolve(key, fallback)?.format(args))
    }

    /// Like `t`, keeping markup as separate parts.
    ///
    /// # Errors
    /// `TranslateError::MissingTranslation` under `FallbackPolicy::Throw`.
    pub fn t_rich(
        &self,
        key: &str,
        fallback: Option<&str>,
        args: &MessageArgs,
    ) -> Result<Vec<MessagePart>, TranslateError> {
        Ok(self.resolve(key, fallback)?.format_to_parts(args))
    }

    /// `t_rich` rendered through tag handlers.
    ///
    /// # Errors
    /// `TranslateError::MissingTranslation` under `FallbackPolicy::Throw`.
    pub fn render_rich<N: RenderNode>(
        &self,
        key: &str,
        fallback: Option<&str>,
        args: &MessageArgs,
        handlers: &TagHandlers<'_, N>,
    ) -> Result<Vec<RichChild<N>>, TranslateError> {
        Ok(render(&self.t_rich(key, fallback, args)?, handlers))
    }

    /// # Errors
    /// `TranslateError::UnknownLocale` for locales not configured.
    pub fn client_state(&self, locale: &str) -> Result<ClientState, TranslateError> {
        Ok(self.state(locale)?.client_state())
    }

    /// Inline script installing the client state; cached until the locale changes.
    ///
    /// # Errors
    /// `TranslateError::UnknownLocale` for locales not configured.
    pub fn boot_script(&self, locale: &str) -> Result<Arc<str>, TranslateError> {
        Ok(self.state(locale)?.boot_script(&self.shared.client))
    }

    /// Current hash of `chunk` in `locale`.
    #[must_use]
    pub fn chunk_hash(&self, locale: &str, chunk: &str) -> Option<String> {
        self.state(locale).ok()?.hashes().get(chunk).cloned()
    }

    /// Every chunk hash of `locale`.
    #[must_use]
    pub fn chunk_hashes(&self, locale: &str) -> Option<BTreeMap<String, String>> {
        self.state(locale).ok().map(|state| state.hashes().clone())
    }

    /// `{prefix}/{locale}/{chunk}.{hash}.{ext}`, or `None` for unknown locales and chunks.
    #[must_use]
    pub fn chunk_url(&self, locale: &str, chunk: &str) -> Option<String> {
        let hash = self.chunk_hash(locale, chunk)?;
        Some(self.shared.client.chunk_url(locale, chunk, &hash))
    }

    /// Parses a payload URL path.
    #[must_use]
    pub fn parse_chunk_path(&self, path: &str) -> Option<ChunkPath> {
        self.shared.client.parse_chunk_path(path)
    }

    /// Script merging one chunk's translations into the client table.
    ///
    /// # Errors
    /// `TranslateError::UnknownLocale` for locales not configured.
    pub fn chunk_payload(&self, locale: &str, chunk: &str) -> Result<ChunkResponse, TranslateError> {
        let state = self.state(locale)?;
        Ok(state.payload(chunk, &self.shared.client).map_or_else(
            || {
                tracing::warn!(locale, chunk, "Unknown chunk requested");
                ChunkResponse::NotFound
            },
            ChunkResponse::Found,
        ))
    }

    /// Serves a payload URL. A stale hash still gets the current content.
    #[must_use]
    pub fn serve_path(&self, path: &str) -> ChunkResponse {
        let Some(request) = self.parse_chunk_path(path) else {
            tracing::debug!(path, "Not a chunk payload path");
            return ChunkResponse::NotFound;
        };
        if let Some(current) = self.chunk_hash(&request.locale, &request.chunk)
            && current != request.hash
        {
            tracing::debug!(path, current = %current, "Serving current content for stale hash");
        }
        self.chunk_payload(&request.locale, &request.chunk).unwrap_or_else(|error| {
            tracing::warn!(path, "{error}");
            ChunkResponse::NotFound
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::rich::Element;
    use crate::test_utils::sample_manifest;

    fn runtime(fallback: FallbackPolicy) -> I18nRuntime {
        let options = RuntimeOptions::new(["en", "de"]).with_fallback(fallback);
        I18nRuntime::configure(options, sample_manifest()).unwrap()
    }

    fn sam() -> MessageArgs {
        MessageArgs::new().with("name", "Sam")
    }

    #[rstest]
    fn rejects_invalid_options() {
        let options = RuntimeOptions::new(["en", "en"]);

        assert_that!(
            I18nRuntime::configure(options, Manifest::default()),
            err(displays_as(contains_substring("Duplicate locale 'en'")))
        );
    }

    #[rstest]
    fn fallback_policy_uses_fallback_text() {
        let runtime = runtime(FallbackPolicy::Fallback);

        let text = runtime.sync_scope("en", || runtime.t("greet", Some("Hi {$name}"), &sam()));

        assert_that!(text, ok(contains_substring("Sam")));
    }

    #[rstest]
    fn fallback_policy_falls_back_to_manifest_text() {
        let runtime = runtime(FallbackPolicy::Fallback);

        let text = runtime.sync_scope("en", || runtime.t("greet", None, &sam()));

        assert_that!(text, ok(eq("Hi Sam")));
    }

    #[rstest]
    fn key_policy_returns_the_key() {
        let runtime = runtime(FallbackPolicy::Key);

        let text = runtime.sync_scope("en", || runtime.t("greet", Some("Hi {$name}"), &sam()));

        assert_that!(text, ok(eq("greet")));
    }

    #[rstest]
    fn throw_policy_raises() {
        let runtime = runtime(FallbackPolicy::Throw);

        let result = runtime.sync_scope("en", || runtime.t("greet", Some("Hi {$name}"), &sam()));

        assert_that!(
            result,
            err(eq(&TranslateError::MissingTranslation { key: "greet".to_string(), locale: "en".to_string() }))
        );
    }

    #[rstest]
    fn custom_policy_receives_key_and_locale() {
        let runtime = runtime(FallbackPolicy::custom(|key, locale| format!("[{locale}] {key}")));

        let text = runtime.sync_scope("de", || runtime.t("greet", None, &sam()));

        assert_that!(text, ok(eq("[de] greet")));
    }

    #[rstest]
    fn missing_keys_are_memoized_per_context() {
        let runtime = runtime(FallbackPolicy::Fallback);

        runtime.sync_scope("en", || {
            let first = runtime.resolve("nope", Some("First")).unwrap();
            let second = runtime.resolve("nope", Some("Second")).unwrap();
            assert_that!(Arc::ptr_eq(&first, &second), eq(true));
            assert_that!(second.format(&MessageArgs::new()), eq("First"));
        });
        let fresh = runtime.sync_scope("en", || runtime.t("nope", Some("Second"), &MessageArgs::new()));
        assert_that!(fresh, ok(eq("Second")));
    }

    #[rstest]
    fn translations_win_once_set() {
        let runtime = runtime(FallbackPolicy::Key);
        runtime
            .set_translations("de", RawTranslations::from([("greet".to_string(), "Hallo {$name}".to_string())]))
            .unwrap();

        let greet = runtime.sync_scope("de", || runtime.t("greet", None, &sam()));
        // Manifest fallbacks count as translations once the locale is loaded.
        let total = runtime.sync_scope("de", || {
            runtime.t("cart.total", None, &MessageArgs::new().with("amount", 3))
        });

        assert_that!(greet, ok(eq("Hallo Sam")));
        assert_that!(total, ok(eq("Total: 3")));
    }

    #[rstest]
    fn unscoped_calls_need_no_context() {
        let runtime = runtime(FallbackPolicy::Throw);

        assert_that!(runtime.t("greet", Some("Hi {$name}"), &sam()), ok(eq("Hi Sam")));
        assert_that!(translate_unscoped("plain.key", None, &MessageArgs::new()), eq("plain.key"));
        assert_that!(context::current_locale(), none());
    }

    #[rstest]
    fn unknown_scope_locale_uses_default() {
        let runtime = runtime(FallbackPolicy::Key);

        let locale = runtime.sync_scope("fr", context::current_locale);

        assert_eq!(locale, Some("en".to_string()));
    }

    #[rstest]
    #[tokio::test]
    async fn async_scopes_are_isolated() {
        let runtime = runtime(FallbackPolicy::custom(|_key, locale| locale.to_string()));

        let en = tokio::spawn({
            let runtime = runtime.clone();
            async move {
                let inner = runtime.clone();
                runtime.scope("en", async move { inner.t("x", None, &MessageArgs::new()) }).await
            }
        });
        let de = runtime.scope("de", async { runtime.t("x", None, &MessageArgs::new()) }).await;

        assert_that!(en.await.unwrap(), ok(eq("en")));
        assert_that!(de, ok(eq("de")));
    }

    #[rstest]
    fn set_translations_rejects_unknown_locale() {
        let runtime = runtime(FallbackPolicy::Key);

        assert_that!(
            runtime.set_translations("ja", RawTranslations::new()),
            err(displays_as(eq("Locale 'ja' is not configured")))
        );
    }

    #[rstest]
    fn hashes_change_with_translations_only_for_affected_chunks() {
        let runtime = runtime(FallbackPolicy::Key);
        let before = runtime.chunk_hashes("en").unwrap();

        runtime
            .set_translations("en", RawTranslations::from([("greet".to_string(), "Hello".to_string())]))
            .unwrap();
        let after = runtime.chunk_hashes("en").unwrap();

        assert_that!(after["main"], not(eq(&before["main"])));
        assert_that!(after["cart"], eq(&before["cart"]));
        assert_that!(runtime.chunk_hash("en", "nope"), none());
    }

    #[rstest]
    fn context_keeps_its_snapshot() {
        let runtime = runtime(FallbackPolicy::Key);
        runtime.set_translations("en", RawTranslations::from([("greet".to_string(), "Old".to_string())])).unwrap();

        let (before, after) = runtime.sync_scope("en", || {
            let before = runtime.t("greet", None, &MessageArgs::new());
            runtime.set_translations("en", RawTranslations::from([("greet".to_string(), "New".to_string())])).unwrap();
            (before, runtime.t("greet", None, &MessageArgs::new()))
        });

        assert_that!(before, ok(eq("Old")));
        assert_that!(after, ok(eq("Old")));
        let next = runtime.sync_scope("en", || runtime.t("greet", None, &MessageArgs::new()));
        assert_that!(next, ok(eq("New")));
    }

    #[rstest]
    fn rich_rendering_through_the_runtime() {
        let runtime = runtime(FallbackPolicy::Fallback);
        let handlers = TagHandlers::new().with("link", |children| Element::new("a", children));

        let rendered = runtime
            .sync_scope("en", || runtime.render_rich("terms", Some("Read {#link}Terms{/link}"), &MessageArgs::new(), &handlers))
            .unwrap();

        assert_that!(rendered.len(), eq(2));
        assert_eq!(rendered[0].as_text(), Some("Read "));
        assert!(matches!(&rendered[1], RichChild::Node(node) if node.text() == "Terms"));
    }

    #[rstest]
    fn client_surface() {
        let runtime = runtime(FallbackPolicy::Key);
        runtime
            .set_translations("en", RawTranslations::from([("greet".to_string(), "Hello {$name}".to_string())]))
            .unwrap();

        let state = runtime.client_state("en").unwrap();
        let url = runtime.chunk_url("en", "main").unwrap();
        let boot = runtime.boot_script("en").unwrap();

        assert_that!(state.translations, is_empty());
        assert_that!(state.imports["main"], elements_are![eq("cart")]);
        assert_eq!(url, format!("/_i18n/en/main.{}.js", state.hashes["main"]));
        assert_that!(Arc::ptr_eq(&boot, &runtime.boot_script("en").unwrap()), eq(true));
        assert_that!(runtime.client_state("xx"), err(anything()));

        let ChunkResponse::Found(body) = runtime.serve_path(&url) else { panic!("expected a payload") };
        assert_that!(String::from_utf8(body.to_vec()).unwrap(), contains_substring(r#"{"greet":"Hello {$name}"}"#));
        assert_eq!(runtime.serve_path("/_i18n/en/main.00000000.js").body(), Some(&*body));
        assert_eq!(runtime.serve_path("/_i18n/en/nope.00000000.js"), ChunkResponse::NotFound);
        assert_eq!(runtime.serve_path("/_i18n/xx/main.00000000.js"), ChunkResponse::NotFound);
        assert_that!(runtime.chunk_url("en", "nope"), none());
    }

    #[rstest]
    fn set_manifest_republishes_locales() {
        let runtime = runtime(FallbackPolicy::Key);
        runtime.set_translations("en", RawTranslations::from([("greet".to_string(), "Hello".to_string())])).unwrap();

        runtime.set_manifest(Manifest::default());

        assert_that!(runtime.chunk_hashes("en").unwrap(), is_empty());
        assert_that!(runtime.chunk_payload("en", "main"), ok(eq(&ChunkResponse::NotFound)));
        let greet = runtime.sync_scope("en", || runtime.t("greet", None, &MessageArgs::new()));
        assert_that!(greet, ok(eq("Hello")));
    }
}
