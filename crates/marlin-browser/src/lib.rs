//! High-level embedding API for the Marlin document engine.
//!
//! # Scope
//!
//! This crate ties the pieces together into a [`Page`], the embeddable
//! document host:
//!
//! - **Document lifecycle** — `write`/`load_url` replace the tree,
//!   normalize it to a single `html` root, fire `DOMContentLoaded` and
//!   `load`, and advance the ready state.
//! - **Script scheduling** — inline, blocking-remote, async, deferred,
//!   and dynamically-inserted scripts, with loads via a
//!   [`ResourceProvider`] and execution via a [`ScriptExecutor`], all
//!   serialized under a per-document execution mutex.
//! - **Execution context** — completion marshaling for multi-threaded
//!   hosts ([`QueuedContext`]) or inline dispatch ([`ImmediateContext`]).
//! - **XMLHttpRequest** — a scriptable request client over the same
//!   provider and context.
//! - **Snapshots** — serializable plain-data copies of the tree.

/// Execution-context dispatchers.
pub mod context;
/// Script classification, loading, and execution.
pub mod scripting;
/// Serializable tree snapshots.
pub mod snapshot;
/// XMLHttpRequest over the resource provider.
pub mod xhr;

pub use marlin_common as common;
pub use marlin_css as css;
pub use marlin_dom as dom;
pub use marlin_html as html;

pub use context::{ExecutionContext, ImmediateContext, Job, QueuedContext};
pub use scripting::{NoopExecutor, ScriptError, ScriptExecutor};
pub use snapshot::{NodeSnapshot, snapshot};
pub use xhr::{XhrError, XhrReadyState, XmlHttpRequest};

use marlin_common::net::{FetchError, ResourceProvider};
use marlin_css::Selector;
use marlin_dom::{
    Document, DomError, Event, ListenerCallback, ListenerId, NodeId, NodeOrigin, ReadyState,
};
use marlin_html::parse_into;
use scripting::{DeferredScript, ExecLock};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Observer invoked with the affected node.
pub type NodeObserver = Arc<dyn Fn(NodeId) + Send + Sync>;
/// Observer invoked with the failing script and its error.
pub type ScriptErrorObserver = Arc<dyn Fn(NodeId, &ScriptError) + Send + Sync>;

/// Explicit observer registration lists, invoked synchronously in
/// registration order.
#[derive(Default)]
struct Observers {
    node_inserted: Mutex<Vec<NodeObserver>>,
    before_script: Mutex<Vec<NodeObserver>>,
    after_script: Mutex<Vec<NodeObserver>>,
    script_error: Mutex<Vec<ScriptErrorObserver>>,
}

/// Shared state behind a [`Page`].
pub(crate) struct PageCore {
    pub(crate) document: Mutex<Document>,
    pub(crate) provider: Arc<dyn ResourceProvider>,
    pub(crate) executor: Mutex<Box<dyn ScriptExecutor>>,
    pub(crate) context: Arc<dyn ExecutionContext>,
    pub(crate) exec: ExecLock,
    pub(crate) deferred: Mutex<VecDeque<DeferredScript>>,
    /// Pending delayed-resource-bearing nodes, resolved best-effort.
    pub(crate) delayed: Mutex<VecDeque<NodeId>>,
    observers: Observers,
}

/// An embeddable document host: one live DOM tree plus the scheduling
/// machinery that governs when its scripts run.
///
/// `Page` is cheaply cloneable; clones share the same document.
///
/// # Example
///
/// ```
/// use marlin_browser::{NoopExecutor, Page};
/// use marlin_common::net::MemoryResourceProvider;
/// use std::sync::Arc;
///
/// let page = Page::new(Arc::new(MemoryResourceProvider::new()), Box::new(NoopExecutor::new()));
/// page.write("<html><body><p id='hi'>hello</p></body></html>");
/// assert!(page.get_element_by_id("hi").is_some());
/// ```
#[derive(Clone)]
pub struct Page {
    core: Arc<PageCore>,
}

impl Page {
    /// Create a page with the inline [`ImmediateContext`].
    #[must_use]
    pub fn new(provider: Arc<dyn ResourceProvider>, executor: Box<dyn ScriptExecutor>) -> Self {
        Self::with_context(provider, executor, Arc::new(ImmediateContext::new()))
    }

    /// Create a page with a caller-provided execution context.
    #[must_use]
    pub fn with_context(
        provider: Arc<dyn ResourceProvider>,
        executor: Box<dyn ScriptExecutor>,
        context: Arc<dyn ExecutionContext>,
    ) -> Self {
        Self {
            core: Arc::new(PageCore {
                document: Mutex::new(Document::new()),
                provider,
                executor: Mutex::new(executor),
                context,
                exec: ExecLock::default(),
                deferred: Mutex::new(VecDeque::new()),
                delayed: Mutex::new(VecDeque::new()),
                observers: Observers::default(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Replace the document with the parse of `html`.
    ///
    /// Parses, normalizes to a single `html` root, runs the insertion
    /// scan over the fresh tree (inline scripts execute here,
    /// parser-blocking loads block here), fires `DOMContentLoaded`,
    /// drains deferred scripts, flips the ready state to `Complete`,
    /// resolves delayed resources, fires `load`, and finally runs any
    /// remaining unexecuted scripts in document order.
    pub fn write(&self, html: &str) {
        let tops = {
            let mut doc = self.core.document.lock().unwrap();
            parse_into(&mut doc, html)
        };
        self.core.load(tops);
    }

    /// Fetch `url` through the resource provider and [`Page::write`] the
    /// body, with the document's base URL set for relative `src`
    /// resolution.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the fetch fails or returns a non-2xx
    /// status.
    pub fn load_url(&self, url: &str) -> Result<(), FetchError> {
        let response = self.core.provider.fetch(url)?;
        if !response.is_success() {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: format!("HTTP status {}", response.status),
            });
        }
        {
            let mut doc = self.core.document.lock().unwrap();
            doc.set_base_url(url);
        }
        self.write(&response.text());
        Ok(())
    }

    /// Current document readiness.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.core.document.lock().unwrap().ready_state()
    }

    // ------------------------------------------------------------------
    // Document access
    // ------------------------------------------------------------------

    /// Run `f` with exclusive access to the document.
    ///
    /// Mutations made here bypass the script scheduler; use the page's
    /// insertion methods when scripts should be noticed.
    pub fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let mut doc = self.core.document.lock().unwrap();
        f(&mut doc)
    }

    /// The single top-level element, conventionally named `html`.
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.core.document.lock().unwrap().document_element()
    }

    /// The document's `head` element.
    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        self.core.document.lock().unwrap().head()
    }

    /// The document's `body` element.
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        self.core.document.lock().unwrap().body()
    }

    /// First element with the given `id` attribute, in document order.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.core.document.lock().unwrap().get_element_by_id(id)
    }

    /// First element matching `selector`, in document order.
    #[must_use]
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let selector = Selector::parse(selector);
        let doc = self.core.document.lock().unwrap();
        selector.query_first(&doc)
    }

    /// Every element matching `selector`, in document order.
    #[must_use]
    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        let selector = Selector::parse(selector);
        let doc = self.core.document.lock().unwrap();
        selector.query_all(&doc)
    }

    /// Concatenated text of the subtree rooted at `node`.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        self.core.document.lock().unwrap().text_content(node)
    }

    /// Serializable snapshot of the whole document.
    #[must_use]
    pub fn snapshot(&self) -> NodeSnapshot {
        let doc = self.core.document.lock().unwrap();
        snapshot(&doc, NodeId::ROOT)
    }

    // ------------------------------------------------------------------
    // Creation and mutation (scheduler-aware)
    // ------------------------------------------------------------------

    /// Create a detached element (origin: script insertion).
    ///
    /// # Errors
    ///
    /// [`DomError::EmptyTagName`] if `tag_name` is empty.
    pub fn create_element(&self, tag_name: &str) -> Result<NodeId, DomError> {
        self.core.document.lock().unwrap().create_element(tag_name)
    }

    /// Create a detached text node.
    #[must_use]
    pub fn create_text_node(&self, data: &str) -> NodeId {
        self.core.document.lock().unwrap().create_text_node(data)
    }

    /// Create a detached comment node.
    #[must_use]
    pub fn create_comment(&self, data: &str) -> NodeId {
        self.core.document.lock().unwrap().create_comment(data)
    }

    /// Create an empty document fragment.
    #[must_use]
    pub fn create_document_fragment(&self) -> NodeId {
        self.core.document.lock().unwrap().create_document_fragment()
    }

    /// Create a detached attribute node.
    ///
    /// # Errors
    ///
    /// [`DomError::EmptyAttributeName`] if `name` is empty.
    pub fn create_attribute(&self, name: &str) -> Result<NodeId, DomError> {
        self.core.document.lock().unwrap().create_attribute(name)
    }

    /// Create an event of the given interface (only `"Event"` is
    /// supported).
    ///
    /// # Errors
    ///
    /// [`DomError::UnsupportedEventType`] for other interface names.
    pub fn create_event(&self, interface: &str) -> Result<Event, DomError> {
        self.core.document.lock().unwrap().create_event(interface)
    }

    /// Set an attribute on an element; non-elements are ignored.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut doc = self.core.document.lock().unwrap();
        if let Some(element) = doc.as_element_mut(node) {
            element.set_attribute(name, value);
        }
    }

    /// Append `child` under `parent` and run the insertion scan on the
    /// attached subtree (scripts are classified and dispatched here).
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        {
            let mut doc = self.core.document.lock().unwrap();
            doc.append_child(parent, child);
        }
        self.core.handle_inserted(child);
    }

    /// Insert `child` before `reference` under `parent`, then run the
    /// insertion scan.
    ///
    /// # Errors
    ///
    /// [`DomError::NotAChild`] if `reference` is not a child of `parent`.
    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError> {
        {
            let mut doc = self.core.document.lock().unwrap();
            doc.insert_before(parent, child, reference)?;
        }
        self.core.handle_inserted(child);
        Ok(())
    }

    /// Remove `child` from `parent`.
    ///
    /// # Errors
    ///
    /// [`DomError::NotAChild`] if `child` is not a child of `parent`.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        let mut doc = self.core.document.lock().unwrap();
        doc.remove_child(parent, child)
    }

    /// Parse `html` as a fragment and append each top-level node under
    /// `parent`, running the insertion scan per node. Returns the
    /// appended nodes.
    pub fn append_html(&self, parent: NodeId, html: &str) -> Vec<NodeId> {
        let tops = {
            let mut doc = self.core.document.lock().unwrap();
            parse_into(&mut doc, html)
        };
        for &top in &tops {
            self.append_child(parent, top);
        }
        tops
    }

    // ------------------------------------------------------------------
    // Events and observers
    // ------------------------------------------------------------------

    /// Register an event listener on `node`.
    pub fn add_event_listener(
        &self,
        node: NodeId,
        event_type: &str,
        callback: ListenerCallback,
    ) -> ListenerId {
        let mut doc = self.core.document.lock().unwrap();
        doc.add_event_listener(node, event_type, callback)
    }

    /// Remove a previously registered listener.
    pub fn remove_event_listener(&self, node: NodeId, listener: ListenerId) {
        let mut doc = self.core.document.lock().unwrap();
        doc.remove_event_listener(node, listener);
    }

    /// Dispatch `event` on `node`, invoking listeners outside the
    /// document lock so they may call back into the page. Returns `true`
    /// if no listener canceled the default action.
    pub fn dispatch_event(&self, node: NodeId, event: &mut Event) -> bool {
        let listeners = {
            let doc = self.core.document.lock().unwrap();
            doc.listeners_for(node, &event.event_type)
        };
        event.target = Some(node);
        for listener in listeners {
            listener(event);
        }
        !(event.cancelable && event.default_prevented())
    }

    /// Observe subtree insertions into the live document.
    pub fn on_node_inserted(&self, observer: impl Fn(NodeId) + Send + Sync + 'static) {
        self.core
            .observers
            .node_inserted
            .lock()
            .unwrap()
            .push(Arc::new(observer));
    }

    /// Observe the moment just before a script executes.
    pub fn on_before_script_execute(&self, observer: impl Fn(NodeId) + Send + Sync + 'static) {
        self.core
            .observers
            .before_script
            .lock()
            .unwrap()
            .push(Arc::new(observer));
    }

    /// Observe the moment just after a script executes (fires even after
    /// an execution error).
    pub fn on_after_script_execute(&self, observer: impl Fn(NodeId) + Send + Sync + 'static) {
        self.core
            .observers
            .after_script
            .lock()
            .unwrap()
            .push(Arc::new(observer));
    }

    /// Observe contained script-execution failures.
    pub fn on_script_execution_error(
        &self,
        observer: impl Fn(NodeId, &ScriptError) + Send + Sync + 'static,
    ) {
        self.core
            .observers
            .script_error
            .lock()
            .unwrap()
            .push(Arc::new(observer));
    }

    // ------------------------------------------------------------------
    // Collaborators
    // ------------------------------------------------------------------

    /// Create an [`XmlHttpRequest`] wired to this page's provider and
    /// execution context.
    #[must_use]
    pub fn create_xhr(&self) -> XmlHttpRequest {
        XmlHttpRequest::new(Arc::clone(&self.core.provider), Arc::clone(&self.core.context))
    }
}

impl PageCore {
    /// The lifecycle `load`: replace the tree with `tops`, normalize,
    /// and run the parse-complete sequence.
    pub(crate) fn load(self: &Arc<Self>, tops: Vec<NodeId>) {
        {
            let mut doc = self.document.lock().unwrap();

            // A single top-level `<html>` wrapper is unwrapped; its
            // children become the node list (normalization rebuilds the
            // root below).
            let nodes = if tops.len() == 1
                && doc
                    .as_element(tops[0])
                    .is_some_and(|e| e.matches_tag("html"))
            {
                let inner = doc.children(tops[0]).to_vec();
                doc.clear_children(tops[0]);
                inner
            } else {
                tops
            };

            doc.clear_children(NodeId::ROOT);
            for &node in &nodes {
                doc.append_child(NodeId::ROOT, node);
            }

            // Normalize to a single root element named `html`.
            let children = doc.children(NodeId::ROOT).to_vec();
            let first_is_html = children.first().copied().is_some_and(|c| {
                doc.as_element(c).is_some_and(|e| e.matches_tag("html"))
            });
            if children.len() != 1 || !first_is_html {
                let root_element = doc
                    .create_element_of_origin("html", NodeOrigin::FromParse)
                    .expect("html is a non-empty tag name");
                doc.clear_children(NodeId::ROOT);
                doc.append_child(NodeId::ROOT, root_element);
                for child in children {
                    doc.append_child(root_element, child);
                }
            }
        }

        // Insertion scan over the fresh tree: inline scripts execute,
        // parser-blocking loads block, deferred loads start.
        let root_element = self.document.lock().unwrap().document_element();
        if let Some(root_element) = root_element {
            self.handle_inserted(root_element);
        }

        self.fire_document_event("DOMContentLoaded");
        self.drain_deferred();
        {
            let mut doc = self.document.lock().unwrap();
            doc.advance_ready_state(ReadyState::Complete);
        }
        self.resolve_delayed_content();
        self.run_scripts_under(NodeId::ROOT);
    }

    /// Attempt to load every pending delayed-resource node, best-effort:
    /// one bad resource never aborts the rest. Fires `load` on the
    /// document once the queue is drained.
    pub(crate) fn resolve_delayed_content(self: &Arc<Self>) {
        loop {
            let node = self.delayed.lock().unwrap().pop_front();
            let Some(node) = node else { break };

            let url = {
                let doc = self.document.lock().unwrap();
                doc.as_element(node)
                    .and_then(|element| {
                        let data = element.script()?;
                        if data.executed || data.load_started || data.fetched_source.is_some() {
                            return None;
                        }
                        element.get_attribute("src").filter(|s| !s.is_empty())
                            .map(|src| marlin_common::url::resolve_url(src, doc.base_url()))
                    })
            };
            if let Some(url) = url {
                // Individual failures are dropped.
                if let Ok(source) = scripting::fetch_source(&*self.provider, &url) {
                    self.store_fetched_source(node, source);
                }
            }
        }
        self.fire_document_event("load");
    }

    /// Dispatch a lifecycle event on the document through its execution
    /// context.
    pub(crate) fn fire_document_event(self: &Arc<Self>, event_type: &str) {
        let core = Arc::clone(self);
        let event_type = event_type.to_string();
        self.context.post(Box::new(move || {
            let _ = core.dispatch_node_event(NodeId::ROOT, &event_type);
        }));
    }

    /// Dispatch an event on `node` with listeners invoked outside the
    /// document lock. Returns `true` if no listener canceled the default
    /// action.
    pub(crate) fn dispatch_node_event(&self, node: NodeId, event_type: &str) -> bool {
        let listeners = {
            let doc = self.document.lock().unwrap();
            doc.listeners_for(node, event_type)
        };
        let mut event = Event::new(event_type);
        event.target = Some(node);
        for listener in listeners {
            listener(&mut event);
        }
        !(event.cancelable && event.default_prevented())
    }

    pub(crate) fn notify_node_inserted(&self, node: NodeId) {
        let observers = self.observers.node_inserted.lock().unwrap().clone();
        for observer in observers {
            observer(node);
        }
    }

    pub(crate) fn notify_before_script(&self, script: NodeId) {
        let observers = self.observers.before_script.lock().unwrap().clone();
        for observer in observers {
            observer(script);
        }
        let _ = self.dispatch_node_event(script, "BeforeScriptExecute");
    }

    pub(crate) fn notify_after_script(&self, script: NodeId) {
        let observers = self.observers.after_script.lock().unwrap().clone();
        for observer in observers {
            observer(script);
        }
        let _ = self.dispatch_node_event(script, "AfterScriptExecute");
    }

    pub(crate) fn notify_script_error(&self, script: NodeId, error: &ScriptError) {
        let observers = self.observers.script_error.lock().unwrap().clone();
        for observer in observers {
            observer(script, error);
        }
    }
}
