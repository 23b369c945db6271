//! Boa-backed script execution for the Marlin engine.
//!
//! Uses [Boa](https://boajs.dev/) as the JavaScript engine.
//!
//! Two layers:
//!
//! - [`JsRuntime`] — a thin wrapper around a Boa `Context` with the
//!   engine's globals registered, for single-threaded embedding.
//! - [`BoaExecutor`] — a [`ScriptExecutor`] hosting a `JsRuntime` on a
//!   dedicated thread. Boa contexts are not `Send`, so the executor
//!   forwards sources over a channel and waits for each result; script
//!   state (globals, declared variables) persists across calls.
//!
//! # Example
//!
//! ```
//! use marlin_js::JsRuntime;
//!
//! let mut runtime = JsRuntime::new();
//! assert!(runtime.execute("var greeting = 'hi';").is_ok());
//! assert!(runtime.execute("greeting.length").is_ok());
//! ```

mod globals;

use boa_engine::{Context, JsError, JsValue, Source};
use marlin_browser::{ScriptError, ScriptExecutor};
use std::sync::mpsc;
use std::thread;

/// JavaScript runtime for a document.
///
/// Each document gets its own runtime with its own global object; the
/// runtime lives as long as the document does, so state declared by one
/// script is visible to the next.
pub struct JsRuntime {
    /// The Boa JavaScript context.
    context: Context,
}

impl JsRuntime {
    /// Create a new runtime with the engine globals registered.
    #[must_use]
    pub fn new() -> Self {
        let mut context = Context::default();
        globals::register_globals(&mut context);
        Self { context }
    }

    /// Execute JavaScript source code.
    ///
    /// # Errors
    ///
    /// Returns `JsError` if the source contains syntax errors or throws
    /// an uncaught exception.
    pub fn execute(&mut self, source: &str) -> Result<JsValue, JsError> {
        self.context.eval(Source::from_bytes(source))
    }
}

impl Default for JsRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// MIME types the executor forwards to the JavaScript engine. Anything
/// else is accepted and ignored.
fn is_javascript(mime_type: &str) -> bool {
    mime_type.is_empty()
        || mime_type.eq_ignore_ascii_case("text/javascript")
        || mime_type.eq_ignore_ascii_case("application/javascript")
}

struct ExecRequest {
    mime_type: String,
    source: String,
    reply: mpsc::Sender<Result<(), ScriptError>>,
}

/// A [`ScriptExecutor`] hosting a [`JsRuntime`] on its own thread.
///
/// The runtime thread owns the Boa context for the executor's whole
/// lifetime and shuts down when the executor is dropped.
pub struct BoaExecutor {
    sender: mpsc::Sender<ExecRequest>,
}

impl BoaExecutor {
    /// Spawn the runtime thread and return the executor.
    ///
    /// # Panics
    ///
    /// Panics if the runtime thread cannot be spawned.
    #[must_use]
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel::<ExecRequest>();
        let _ = thread::Builder::new()
            .name("marlin-js".to_string())
            .spawn(move || {
                let mut runtime = JsRuntime::new();
                while let Ok(request) = receiver.recv() {
                    let result = if is_javascript(&request.mime_type) {
                        runtime
                            .execute(&request.source)
                            .map(|_value| ())
                            .map_err(|error| ScriptError::new(error.to_string()))
                    } else {
                        Ok(())
                    };
                    let _ = request.reply.send(result);
                }
            })
            .expect("failed to spawn the script runtime thread");
        Self { sender }
    }
}

impl ScriptExecutor for BoaExecutor {
    fn execute(&mut self, mime_type: &str, source: &str) -> Result<(), ScriptError> {
        let (reply, result) = mpsc::channel();
        self.sender
            .send(ExecRequest {
                mime_type: mime_type.to_string(),
                source: source.to_string(),
                reply,
            })
            .map_err(|_| ScriptError::new("script runtime thread is gone"))?;
        result
            .recv()
            .map_err(|_| ScriptError::new("script runtime thread is gone"))?
    }
}
