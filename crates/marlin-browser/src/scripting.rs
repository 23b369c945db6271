//! Script classification, loading, and execution.
//!
//! This module is the scheduler half of the engine: it watches tree
//! insertions, classifies every `<script>` it finds, coordinates loads
//! with the resource provider, and runs sources through the
//! [`ScriptExecutor`] capability under the document's execution mutex.

use marlin_common::net::{FetchError, ResourceProvider};
use marlin_common::url::resolve_url;
use marlin_dom::{Document, ElementData, NodeId, NodeKind, NodeOrigin, ReadyState};
use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, ThreadId};
use thiserror::Error;

use crate::PageCore;

/// Failure raised by a [`ScriptExecutor`].
///
/// The scheduler contains it: the error surfaces as an `error` event on
/// the document plus an observer notification, and never propagates to
/// whoever triggered the insertion.
#[derive(Debug, Clone, Error)]
#[error("script execution failed: {message}")]
pub struct ScriptError {
    /// Human-readable failure description.
    pub message: String,
}

impl ScriptError {
    /// Create an error carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Capability that runs script source.
///
/// The engine hands over `(mime_type, source_text)` and nothing else; the
/// implementation owns its own interpreter state. Implementations decide
/// what to do with non-JavaScript MIME types.
pub trait ScriptExecutor: Send {
    /// Execute `source` of the given MIME type.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError`] for syntax errors or uncaught exceptions;
    /// the scheduler converts it into the engine's error taxonomy.
    fn execute(&mut self, mime_type: &str, source: &str) -> Result<(), ScriptError>;
}

/// Executor that accepts every script and runs nothing.
///
/// Useful for parsing-only embeddings and tests that only care about
/// scheduling behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExecutor;

impl NoopExecutor {
    /// Create the executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ScriptExecutor for NoopExecutor {
    fn execute(&mut self, _mime_type: &str, _source: &str) -> Result<(), ScriptError> {
        Ok(())
    }
}

/// How the scheduler will treat one script element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScriptKind {
    /// Remote, `defer`, from the parser: load now, execute on
    /// DOMContentLoaded in document order.
    Deferred,
    /// Remote and synchronous: the insertion call blocks until the load
    /// and execution finish (parser-blocking).
    RemoteBlocking,
    /// Remote and asynchronous: the insertion call returns immediately,
    /// execution happens on load completion.
    RemoteAsync,
    /// Inline with an executable type and a non-empty body: execute
    /// immediately, synchronously.
    Inline,
    /// Nothing to do (empty body, non-executable type, or not a script).
    Inert,
}

/// Whether a `type` attribute names source the engine forwards for
/// immediate inline execution. Absent and empty types count as
/// JavaScript.
fn is_executable_type(mime_type: Option<&str>) -> bool {
    mime_type.is_none_or(|t| t.is_empty() || t.eq_ignore_ascii_case("text/javascript"))
}

/// Classify a script element.
///
/// - `remote` = the element has a non-empty `src`.
/// - `async` = (`async` flag AND remote) OR inserted programmatically —
///   dynamically-inserted scripts always run asynchronously once loaded.
/// - `defer` = `defer` flag AND remote AND NOT async AND produced by the
///   parser.
pub(crate) fn classify(document: &Document, script: NodeId) -> ScriptKind {
    let Some(element) = document.as_element(script) else {
        return ScriptKind::Inert;
    };
    let Some(data) = element.script() else {
        return ScriptKind::Inert;
    };

    let remote = element
        .get_attribute("src")
        .is_some_and(|src| !src.is_empty());
    let is_async = (element.has_attribute("async") && remote)
        || data.origin == NodeOrigin::FromScriptInsertion;
    let deferred = element.has_attribute("defer")
        && remote
        && !is_async
        && data.origin == NodeOrigin::FromParse;

    if deferred {
        ScriptKind::Deferred
    } else if remote {
        if is_async {
            ScriptKind::RemoteAsync
        } else {
            ScriptKind::RemoteBlocking
        }
    } else if is_executable_type(element.get_attribute("type"))
        && !document.script_text(script).unwrap_or_default().is_empty()
    {
        ScriptKind::Inline
    } else {
        ScriptKind::Inert
    }
}

/// Fetch a script source, treating non-2xx statuses as failures.
pub(crate) fn fetch_source(
    provider: &dyn ResourceProvider,
    url: &str,
) -> Result<String, FetchError> {
    let response = provider.fetch(url)?;
    if response.is_success() {
        Ok(response.text())
    } else {
        Err(FetchError::Transport {
            url: url.to_string(),
            message: format!("HTTP status {}", response.status),
        })
    }
}

/// A deferred script waiting for DOMContentLoaded, paired with its
/// in-flight load.
pub(crate) struct DeferredScript {
    pub(crate) script: NodeId,
    pub(crate) load: mpsc::Receiver<Result<String, FetchError>>,
}

/// The per-document execution mutex.
///
/// While one script runs, an execution request from another thread
/// blocks until the lock frees. A re-entrant request from the running
/// script's own thread (a script inserting another script) is queued and
/// runs immediately after the current script — it serializes behind the
/// holder instead of deadlocking against it.
#[derive(Default)]
pub(crate) struct ExecLock {
    state: Mutex<ExecState>,
    available: Condvar,
}

#[derive(Default)]
struct ExecState {
    holder: Option<ThreadId>,
    pending: VecDeque<NodeId>,
}

impl PageCore {
    /// React to a subtree newly attached to the live document: scan it
    /// for scripts, register delayed resources, notify observers, and
    /// dispatch each script per its classification. Attribute nodes and
    /// detached subtrees are ignored.
    pub(crate) fn handle_inserted(self: &Arc<Self>, node: NodeId) {
        let (ready, scripts) = {
            let doc = self.document.lock().unwrap();
            if !doc.is_in_document(node) {
                return;
            }
            if matches!(doc.get(node).map(|n| &n.kind), Some(NodeKind::Attribute(_))) {
                return;
            }

            let ready = doc.ready_state();
            let mut scripts = Vec::new();
            for id in doc.descendants(node) {
                let kind = classify(&doc, id);
                if kind == ScriptKind::Inert {
                    continue;
                }
                if matches!(
                    kind,
                    ScriptKind::Deferred | ScriptKind::RemoteBlocking | ScriptKind::RemoteAsync
                ) {
                    self.delayed.lock().unwrap().push_back(id);
                }
                scripts.push((id, kind));
            }
            (ready, scripts)
        };

        self.notify_node_inserted(node);

        for (script, kind) in scripts {
            self.dispatch_script(script, kind);
        }

        // After the document completed, insertions resolve their delayed
        // content and run their scripts immediately instead of waiting
        // for DOMContentLoaded (it already fired).
        if ready == ReadyState::Complete {
            self.resolve_delayed_content();
            self.run_scripts_under(node);
        }
    }

    fn dispatch_script(self: &Arc<Self>, script: NodeId, kind: ScriptKind) {
        match kind {
            ScriptKind::Inert => {}
            ScriptKind::Inline => self.execute_script(script),
            ScriptKind::Deferred => {
                if let Some(load) = self.start_load(script) {
                    self.deferred
                        .lock()
                        .unwrap()
                        .push_back(DeferredScript { script, load });
                }
            }
            ScriptKind::RemoteBlocking => {
                let Some(url) = self.script_url(script) else {
                    return;
                };
                self.mark_load_started(script);
                match fetch_source(&*self.provider, &url) {
                    Ok(source) => {
                        self.store_fetched_source(script, source);
                        self.execute_script(script);
                    }
                    Err(_) => {
                        let _ = self.dispatch_node_event(script, "error");
                    }
                }
            }
            ScriptKind::RemoteAsync => self.start_async_load(script),
        }
    }

    /// Begin a background load for a deferred script, returning the
    /// receiver its completion arrives on.
    fn start_load(self: &Arc<Self>, script: NodeId) -> Option<mpsc::Receiver<Result<String, FetchError>>> {
        let url = self.script_url(script)?;
        self.mark_load_started(script);
        let provider = Arc::clone(&self.provider);
        let (tx, rx) = mpsc::channel();
        let _ = thread::spawn(move || {
            let _ = tx.send(fetch_source(&*provider, &url));
        });
        Some(rx)
    }

    /// Begin a background load whose completion is marshaled into the
    /// document's execution context. The insertion call does not block.
    fn start_async_load(self: &Arc<Self>, script: NodeId) {
        let Some(url) = self.script_url(script) else {
            return;
        };
        self.mark_load_started(script);
        let core = Arc::clone(self);
        let _ = thread::spawn(move || {
            let result = fetch_source(&*core.provider, &url);
            let finisher = Arc::clone(&core);
            core.context
                .post(Box::new(move || finisher.finish_remote_load(script, result)));
        });
    }

    /// Apply a completed remote load: successful loads execute, failed
    /// loads fire `error` on the script node instead.
    pub(crate) fn finish_remote_load(
        self: &Arc<Self>,
        script: NodeId,
        result: Result<String, FetchError>,
    ) {
        match result {
            Ok(source) => {
                self.store_fetched_source(script, source);
                self.execute_script(script);
            }
            Err(_) => {
                let _ = self.dispatch_node_event(script, "error");
            }
        }
    }

    /// Drain the deferred queue strictly in enqueue order: wait for each
    /// load to finish, execute, then move to the next. Source order is
    /// preserved even when loads complete out of order.
    pub(crate) fn drain_deferred(self: &Arc<Self>) {
        loop {
            let entry = self.deferred.lock().unwrap().pop_front();
            let Some(DeferredScript { script, load }) = entry else {
                return;
            };
            match load.recv() {
                Ok(Ok(source)) => {
                    self.store_fetched_source(script, source);
                    self.execute_script(script);
                }
                Ok(Err(_)) | Err(_) => {
                    let _ = self.dispatch_node_event(script, "error");
                }
            }
        }
    }

    /// Execute every unexecuted script with an executable type and a
    /// non-empty body under `root`, in document order.
    pub(crate) fn run_scripts_under(self: &Arc<Self>, root: NodeId) {
        let scripts: Vec<NodeId> = {
            let doc = self.document.lock().unwrap();
            doc.descendants(root)
                .filter(|&id| {
                    doc.as_element(id)
                        .and_then(ElementData::script)
                        .is_some_and(|data| !data.executed)
                })
                .filter(|&id| {
                    let element = doc.as_element(id).expect("filtered to elements");
                    is_executable_type(element.get_attribute("type"))
                        && !doc.script_text(id).unwrap_or_default().is_empty()
                })
                .collect()
        };
        for script in scripts {
            self.execute_script(script);
        }
    }

    /// Run one script under the document's execution mutex.
    ///
    /// A request from the thread currently holding the mutex is queued
    /// and runs right after the current script finishes; a request from
    /// any other thread blocks until the mutex frees.
    pub(crate) fn execute_script(self: &Arc<Self>, script: NodeId) {
        let me = thread::current().id();
        {
            let mut state = self.exec.state.lock().unwrap();
            if state.holder == Some(me) {
                state.pending.push_back(script);
                return;
            }
            while state.holder.is_some() {
                state = self.exec.available.wait(state).unwrap();
            }
            state.holder = Some(me);
        }

        self.run_one_script(script);
        loop {
            let next = {
                let mut state = self.exec.state.lock().unwrap();
                if let Some(queued) = state.pending.pop_front() {
                    Some(queued)
                } else {
                    state.holder = None;
                    self.exec.available.notify_one();
                    None
                }
            };
            match next {
                Some(queued) => self.run_one_script(queued),
                None => return,
            }
        }
    }

    /// The body of `execute_script`, called with the execution mutex
    /// held by this thread.
    fn run_one_script(self: &Arc<Self>, script: NodeId) {
        let snapshot = {
            let doc = self.document.lock().unwrap();
            let Some(element) = doc.as_element(script) else {
                return;
            };
            let Some(data) = element.script() else {
                return;
            };
            // Idempotent: a script executes at most once.
            if data.executed {
                return;
            }
            let remote = element
                .get_attribute("src")
                .is_some_and(|src| !src.is_empty());
            let mime = element
                .get_attribute("type")
                .filter(|t| !t.is_empty())
                .unwrap_or("text/javascript")
                .to_string();
            let source = doc.script_text(script).unwrap_or_default();
            (mime, source, remote)
        };
        let (mime, source, remote) = snapshot;

        self.notify_before_script(script);

        let result = {
            let mut executor = self.executor.lock().unwrap();
            executor.execute(&mime, &source)
        };

        match result {
            Ok(()) => {
                {
                    let mut doc = self.document.lock().unwrap();
                    if let Some(data) = doc.as_element_mut(script).and_then(ElementData::script_mut)
                    {
                        data.executed = true;
                    }
                }
                if remote {
                    let _ = self.dispatch_node_event(script, "load");
                }
            }
            Err(error) => {
                // Contained: the failure becomes an observer notification
                // plus an `error` event on the owning document.
                self.notify_script_error(script, &error);
                let _ = self.dispatch_node_event(NodeId::ROOT, "error");
            }
        }

        self.notify_after_script(script);
    }

    /// Resolved absolute URL of a script's `src`, if it has one.
    fn script_url(&self, script: NodeId) -> Option<String> {
        let doc = self.document.lock().unwrap();
        let src = doc
            .as_element(script)?
            .get_attribute("src")
            .filter(|s| !s.is_empty())?
            .to_string();
        Some(resolve_url(&src, doc.base_url()))
    }

    fn mark_load_started(&self, script: NodeId) {
        let mut doc = self.document.lock().unwrap();
        if let Some(data) = doc.as_element_mut(script).and_then(ElementData::script_mut) {
            data.load_started = true;
        }
    }

    pub(crate) fn store_fetched_source(&self, script: NodeId, source: String) {
        let mut doc = self.document.lock().unwrap();
        if let Some(data) = doc.as_element_mut(script).and_then(ElementData::script_mut) {
            data.fetched_source = Some(source);
        }
    }
}
