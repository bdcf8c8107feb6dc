//! Tiered execution of call sites.
//!
//! Every accessor slot starts out interpreting its call-site tree. When its
//! invocation counter reaches the configured threshold, a flattened closure
//! form of the same tree is built off the calling thread and swapped into the
//! slot. Both forms produce identical results; only evaluation cost differs.
//! A compile that fails is dropped and the slot keeps interpreting.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::call_site::{invoke_factory, CallSite};
use crate::config::{CompileMode, ProviderOptions};
use crate::descriptors::Args;
use crate::error::{DiError, DiResult};
use crate::internal::circular::MAX_DEPTH;
use crate::internal::CallChain;
use crate::key::Key;
use crate::provider::ScopeRef;
use crate::registration::{AnyArc, ServiceList};

/// Closure form of a call-site tree.
pub(crate) type CompiledFn =
    Arc<dyn Fn(&ScopeRef<'_>, Option<&CallChain<'_>>) -> DiResult<AnyArc> + Send + Sync>;

fn compiled<F>(f: F) -> CompiledFn
where
    F: Fn(&ScopeRef<'_>, Option<&CallChain<'_>>) -> DiResult<AnyArc> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What an accessor slot currently runs.
pub(crate) enum Executable {
    /// No registration and no empty-collection rule applies
    Missing,
    Interpreted(Arc<CallSite>),
    Compiled(CompiledFn),
}

/// Observable state of a key's accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorState {
    /// The key has never been resolved
    Unbuilt,
    /// The key was planned and has no registration
    Missing,
    /// Resolution walks the call-site tree
    Interpreted,
    /// Resolution runs the compiled closure
    Compiled,
}

/// Per-key executable cell in the registration table.
pub(crate) struct AccessorSlot {
    key: Key,
    executable: ArcSwap<Executable>,
    calls: AtomicUsize,
}

impl AccessorSlot {
    pub(crate) fn missing(key: Key) -> Self {
        Self::with(key, Executable::Missing)
    }

    pub(crate) fn interpreted(key: Key, site: CallSite) -> Self {
        Self::with(key, Executable::Interpreted(Arc::new(site)))
    }

    fn with(key: Key, executable: Executable) -> Self {
        Self {
            key,
            executable: ArcSwap::from_pointee(executable),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn state(&self) -> AccessorState {
        match &**self.executable.load() {
            Executable::Missing => AccessorState::Missing,
            Executable::Interpreted(_) => AccessorState::Interpreted,
            Executable::Compiled(_) => AccessorState::Compiled,
        }
    }

    /// Runs the current executable; `None` means the key has no registration.
    pub(crate) fn invoke(
        self: &Arc<Self>,
        scope: &ScopeRef<'_>,
        chain: Option<&CallChain<'_>>,
        options: &ProviderOptions,
    ) -> DiResult<Option<AnyArc>> {
        // Owned snapshot: a swap during a long, re-entrant resolution must not
        // pin the guard
        let current = self.executable.load_full();
        match &*current {
            Executable::Missing => Ok(None),
            Executable::Compiled(run) => run(scope, chain).map(Some),
            Executable::Interpreted(site) => {
                let calls = self.calls.fetch_add(1, Ordering::AcqRel) + 1;
                if calls == options.compile_threshold.max(1) {
                    self.schedule_compile(site.clone(), options.compile_mode);
                }
                site.invoke(scope, chain).map(Some)
            }
        }
    }

    fn schedule_compile(self: &Arc<Self>, site: Arc<CallSite>, mode: CompileMode) {
        match mode {
            CompileMode::Disabled => {}
            CompileMode::Inline => self.install_compiled(&site),
            CompileMode::Background => {
                tracing::debug!(key = %self.key, "scheduling accessor compile");
                let slot = Arc::clone(self);
                spawn_detached(move || slot.install_compiled(&site));
            }
        }
    }

    fn install_compiled(&self, site: &CallSite) {
        match panic::catch_unwind(AssertUnwindSafe(|| compile(site, 0))) {
            Ok(Ok(run)) => {
                self.executable.store(Arc::new(Executable::Compiled(run)));
                tracing::debug!(key = %self.key, "compiled accessor installed");
            }
            Ok(Err(err)) => {
                tracing::debug!(key = %self.key, error = %err, "discarding failed accessor compile");
            }
            Err(_) => {
                tracing::debug!(key = %self.key, "discarding panicked accessor compile");
            }
        }
    }
}

fn spawn_detached<F>(job: F)
where
    F: FnOnce() + Send + 'static,
{
    #[cfg(feature = "tokio")]
    {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            drop(handle.spawn_blocking(job));
            return;
        }
    }

    if let Err(err) = std::thread::Builder::new()
        .name("tiered-di-compile".into())
        .spawn(job)
    {
        tracing::debug!(error = %err, "could not spawn accessor compile");
    }
}

/// Flattens a call-site tree into nested closures.
pub(crate) fn compile(site: &CallSite, depth: usize) -> DiResult<CompiledFn> {
    if depth >= MAX_DEPTH {
        return Err(DiError::DepthExceeded(depth));
    }
    let next = depth + 1;

    let run = match site {
        CallSite::Constructor { service, params, ctor } => {
            let service = *service;
            let ctor = ctor.clone();
            if params.is_empty() {
                compiled(move |_, _| ctor(&Args::new(service, Vec::new())))
            } else {
                let params = params
                    .iter()
                    .map(|param| compile(param, next))
                    .collect::<DiResult<Vec<_>>>()?;
                compiled(move |scope, chain| {
                    let mut values = Vec::with_capacity(params.len());
                    for param in &params {
                        values.push(param(scope, chain)?);
                    }
                    ctor(&Args::new(service, values))
                })
            }
        }
        CallSite::Factory { key, factory } => {
            let key = key.clone();
            let factory = factory.clone();
            compiled(move |scope, chain| invoke_factory(&factory, &key, scope, chain))
        }
        CallSite::Instance(value) => {
            let value = value.clone();
            compiled(move |_, _| Ok(value.clone()))
        }
        CallSite::Transient { inner, release } => {
            let inner = compile(inner, next)?;
            match release.clone() {
                // Nothing to track: the wrapper disappears
                None => inner,
                Some(release) => compiled(move |scope, chain| {
                    let value = inner(scope, chain)?;
                    scope.capture_transient(value, Some(&release))
                }),
            }
        }
        CallSite::Scoped { id, inner, release } => {
            let id = *id;
            let inner = compile(inner, next)?;
            let release = release.clone();
            compiled(move |scope, chain| {
                scope.get_or_create(id, release.as_ref(), || inner(scope, chain))
            })
        }
        CallSite::Singleton { id, inner, release } => {
            let id = *id;
            let inner = compile(inner, next)?;
            let release = release.clone();
            compiled(move |scope, chain| {
                let root = scope.root();
                root.get_or_create(id, release.as_ref(), || inner(&root, chain))
            })
        }
        CallSite::ResolveAll { items, .. } => {
            let items = items
                .iter()
                .map(|item| compile(item, next))
                .collect::<DiResult<Vec<_>>>()?;
            compiled(move |scope, chain| {
                let mut values = Vec::with_capacity(items.len());
                for item in &items {
                    values.push(item(scope, chain)?);
                }
                Ok(Arc::new(ServiceList(values)) as AnyArc)
            })
        }
        CallSite::EmptyCollection { .. } => {
            compiled(|_, _| Ok(Arc::new(ServiceList(Vec::new())) as AnyArc))
        }
    };
    Ok(run)
}
