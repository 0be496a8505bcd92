//! Per-editor state: current language, buffers, run gating and the local cache.
//!
//! The cache is injected rather than global so that each session (one per
//! question or approach being edited) owns its own view. Losing cached
//! entries only means the user sees resolved code instead of their last edit.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::approach::{Approach, Candidate};
use crate::language::{
    LanguageCatalog, LanguageProfile, Resolution, ResolutionSource, StarterSnippet,
    resolve_for_language, resolve_initial,
};
use crate::quota::{QuotaLimits, QuotaStatus, classify};
use crate::sandbox::{ExecuteRequest, ExecutionOutcome, InputRequired, prepare_run};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Code,
    Input,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Question or approach id the editor is bound to
    pub scope: String,
    pub language: String,
    pub kind: CacheKind,
}

impl CacheKey {
    pub fn new(scope: &str, language: &str, kind: CacheKind) -> Self {
        Self {
            scope: scope.to_string(),
            language: language.to_string(),
            kind,
        }
    }
}

/// Key-value store backing an editor session.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<String>;
    fn set(&self, key: CacheKey, value: String);
    fn remove(&self, key: &CacheKey);
}

/// In-process [`LocalCache`].
#[derive(Default, Clone)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<CacheKey, String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: CacheKey, value: String) {
        self.entries.write().insert(key, value);
    }

    fn remove(&self, key: &CacheKey) {
        self.entries.write().remove(key);
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a run is already in progress")]
    RunInProgress,
    #[error("no run is in progress")]
    NoRunInProgress,
}

pub struct EditorSession<C: LocalCache> {
    scope: String,
    catalog: Arc<LanguageCatalog>,
    cache: C,
    language: LanguageProfile,
    source: ResolutionSource,
    code: String,
    text: String,
    input: String,
    running: bool,
    last_outcome: Option<ExecutionOutcome>,
}

impl<C: LocalCache> EditorSession<C> {
    /// Opens an editor with the initially resolved language and code.
    pub fn open(
        scope: impl Into<String>,
        catalog: Arc<LanguageCatalog>,
        cache: C,
        prior: &[Approach],
        snippets: &[StarterSnippet],
    ) -> Self {
        let scope = scope.into();
        let Resolution {
            language,
            code,
            source,
        } = resolve_initial(prior, snippets, &catalog);
        let input = cache
            .get(&CacheKey::new(&scope, &language.name, CacheKind::Input))
            .unwrap_or_default();

        log::debug!("Opened editor {scope} in {} ({source:?})", language.name);

        Self {
            scope,
            catalog,
            cache,
            language,
            source,
            code,
            text: String::new(),
            input,
            running: false,
            last_outcome: None,
        }
    }

    /// Switches to the language `label` names, falling back to the default
    /// language for unknown labels. Returns the canonical language name.
    pub fn switch_language(
        &mut self,
        label: &str,
        prior: &[Approach],
        snippets: &[StarterSnippet],
    ) -> &LanguageProfile {
        let selected = self.catalog.canonicalize_or_default(label).clone();

        let cached = self
            .cache
            .get(&CacheKey::new(&self.scope, &selected.name, CacheKind::Code));
        let Resolution { code, source, .. } = match cached {
            Some(code) => Resolution {
                language: selected.clone(),
                code,
                source: ResolutionSource::Cache,
            },
            None => resolve_for_language(&selected, prior, snippets, &self.catalog),
        };

        self.input = self
            .cache
            .get(&CacheKey::new(&self.scope, &selected.name, CacheKind::Input))
            .unwrap_or_default();
        self.code = code;
        self.source = source;
        self.language = selected;

        &self.language
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
        self.cache.set(
            CacheKey::new(&self.scope, &self.language.name, CacheKind::Code),
            self.code.clone(),
        );
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
        self.cache.set(
            CacheKey::new(&self.scope, &self.language.name, CacheKind::Input),
            self.input.clone(),
        );
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Drops cached buffers for the current language, e.g. after a save.
    pub fn forget_cached(&self) {
        for kind in [CacheKind::Code, CacheKind::Input] {
            self.cache
                .remove(&CacheKey::new(&self.scope, &self.language.name, kind));
        }
    }

    pub fn language(&self) -> &LanguageProfile {
        &self.language
    }

    pub fn source(&self) -> &ResolutionSource {
        &self.source
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn candidate(&self) -> Candidate {
        Candidate::new(self.text.clone(), self.code.clone())
    }

    /// Quota status of the current buffers, recomputed on every call.
    pub fn status(
        &self,
        existing: &[Approach],
        exclude_approach_id: Option<u32>,
        limits: &QuotaLimits,
    ) -> QuotaStatus {
        classify(existing, &self.candidate(), exclude_approach_id, limits)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Marks a run as started. Only one run may be pending at a time.
    ///
    /// The outer `Result` reports the gating; the inner one is the stdin guard.
    pub fn begin_run(&mut self) -> Result<Result<ExecuteRequest, InputRequired>, SessionError> {
        if self.running {
            return Err(SessionError::RunInProgress);
        }

        let request = prepare_run(&self.language, &self.code, &self.input);
        if request.is_ok() {
            self.running = true;
        }
        Ok(request)
    }

    /// Records the outcome of the pending run, replacing the previous one.
    pub fn finish_run(&mut self, outcome: ExecutionOutcome) -> Result<(), SessionError> {
        if !self.running {
            return Err(SessionError::NoRunInProgress);
        }
        self.running = false;
        self.last_outcome = Some(outcome);
        Ok(())
    }

    pub fn last_outcome(&self) -> Option<&ExecutionOutcome> {
        self.last_outcome.as_ref()
    }
}
