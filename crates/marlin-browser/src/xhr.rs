//! XMLHttpRequest over the resource provider.
//!
//! [XMLHttpRequest Standard](https://xhr.spec.whatwg.org/)
//!
//! A thin state machine over [`ResourceProvider`]: `open` then `send`,
//! with completion callbacks marshaled through the document's execution
//! context. Call-sequence violations (setting a header before `open`,
//! sending twice) are synchronous invalid-state errors.

use marlin_common::net::{Request, ResourceProvider, Response};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use strum_macros::Display;
use thiserror::Error;

use crate::context::ExecutionContext;

/// Invalid XHR call sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XhrError {
    /// The operation is not legal in the current ready state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// [§ 3.4 States](https://xhr.spec.whatwg.org/#states)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum XhrReadyState {
    /// Client created; `open()` not called yet.
    Unsent,
    /// `open()` has been called.
    Opened,
    /// `send()` has been called and response headers are available.
    HeadersReceived,
    /// The response body is being received.
    Loading,
    /// The operation is complete (success or failure).
    Done,
}

impl XhrReadyState {
    /// Numeric value exposed by the conventional constants
    /// (UNSENT=0 ... DONE=4).
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::Unsent => 0,
            Self::Opened => 1,
            Self::HeadersReceived => 2,
            Self::Loading => 3,
            Self::Done => 4,
        }
    }
}

/// Callback invoked as an XHR progresses.
pub type XhrCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Callbacks {
    ready_state_change: Vec<XhrCallback>,
    load: Vec<XhrCallback>,
    error: Vec<XhrCallback>,
    timeout: Vec<XhrCallback>,
}

struct XhrState {
    ready_state: XhrReadyState,
    request: Option<Request>,
    is_async: bool,
    sent: bool,
    response: Option<Response>,
}

struct XhrInner {
    provider: Arc<dyn ResourceProvider>,
    context: Arc<dyn ExecutionContext>,
    state: Mutex<XhrState>,
    callbacks: Mutex<Callbacks>,
}

/// One HTTP request lifecycle, scriptable through callbacks.
#[derive(Clone)]
pub struct XmlHttpRequest {
    inner: Arc<XhrInner>,
}

impl XmlHttpRequest {
    /// Create a request client over `provider`, delivering callbacks
    /// through `context`.
    #[must_use]
    pub fn new(provider: Arc<dyn ResourceProvider>, context: Arc<dyn ExecutionContext>) -> Self {
        Self {
            inner: Arc::new(XhrInner {
                provider,
                context,
                state: Mutex::new(XhrState {
                    ready_state: XhrReadyState::Unsent,
                    request: None,
                    is_async: true,
                    sent: false,
                    response: None,
                }),
                callbacks: Mutex::new(Callbacks::default()),
            }),
        }
    }

    /// [§ 3.5](https://xhr.spec.whatwg.org/#the-open()-method)
    ///
    /// Initialize a request. `is_async = false` makes `send` block until
    /// the response arrives.
    ///
    /// # Panics
    ///
    /// Panics if the internal state mutex is poisoned.
    pub fn open(&self, method: &str, url: &str, is_async: bool) {
        {
            let mut state = self.inner.state.lock().unwrap();
            let mut request = self.inner.provider.create_request(url);
            request.method = method.to_string();
            state.request = Some(request);
            state.is_async = is_async;
            state.sent = false;
            state.response = None;
            state.ready_state = XhrReadyState::Opened;
        }
        self.inner.fire_ready_state_change();
    }

    /// [§ 3.5.1](https://xhr.spec.whatwg.org/#the-setrequestheader()-method)
    ///
    /// "Appends a value to an existing request header or adds a new
    /// request header." Legal only between `open` and `send`.
    ///
    /// # Errors
    ///
    /// [`XhrError::InvalidState`] before `open` or after `send`.
    ///
    /// # Panics
    ///
    /// Panics if the internal state mutex is poisoned.
    pub fn set_request_header(&self, name: &str, value: &str) -> Result<(), XhrError> {
        let mut state = self.inner.state.lock().unwrap();
        if state.ready_state != XhrReadyState::Opened || state.sent {
            return Err(XhrError::InvalidState(
                "setRequestHeader requires an opened, unsent request".to_string(),
            ));
        }
        let request = state
            .request
            .as_mut()
            .expect("opened state implies a request");
        request.headers.push((name.to_string(), value.to_string()));
        Ok(())
    }

    /// Current per-request timeout.
    ///
    /// # Errors
    ///
    /// [`XhrError::InvalidState`] before `open`.
    ///
    /// # Panics
    ///
    /// Panics if the internal state mutex is poisoned.
    pub fn timeout(&self) -> Result<Duration, XhrError> {
        let state = self.inner.state.lock().unwrap();
        state
            .request
            .as_ref()
            .map(|r| r.timeout)
            .ok_or_else(|| XhrError::InvalidState("not opened".to_string()))
    }

    /// Set the per-request timeout.
    ///
    /// # Errors
    ///
    /// [`XhrError::InvalidState`] before `open`.
    ///
    /// # Panics
    ///
    /// Panics if the internal state mutex is poisoned.
    pub fn set_timeout(&self, timeout: Duration) -> Result<(), XhrError> {
        let mut state = self.inner.state.lock().unwrap();
        state
            .request
            .as_mut()
            .map(|r| r.timeout = timeout)
            .ok_or_else(|| XhrError::InvalidState("not opened".to_string()))
    }

    /// [§ 3.5.2](https://xhr.spec.whatwg.org/#the-send()-method)
    ///
    /// Dispatch the request. Asynchronous sends return immediately and
    /// complete through the execution context; synchronous sends block
    /// until done.
    ///
    /// # Errors
    ///
    /// [`XhrError::InvalidState`] before `open` or on a repeated `send`.
    ///
    /// # Panics
    ///
    /// Panics if the internal state mutex is poisoned.
    pub fn send(&self, body: Option<&[u8]>) -> Result<(), XhrError> {
        let (request, is_async) = {
            let mut state = self.inner.state.lock().unwrap();
            if state.ready_state != XhrReadyState::Opened || state.sent {
                return Err(XhrError::InvalidState(
                    "send requires an opened, unsent request".to_string(),
                ));
            }
            state.sent = true;
            let mut request = state
                .request
                .as_ref()
                .expect("opened state implies a request")
                .clone();
            request.body = body.map(<[u8]>::to_vec);
            (request, state.is_async)
        };

        if is_async {
            {
                let mut state = self.inner.state.lock().unwrap();
                state.ready_state = XhrReadyState::Loading;
            }
            self.inner.fire_ready_state_change();

            let inner = Arc::clone(&self.inner);
            let _ = thread::spawn(move || {
                let result = inner.provider.send_request(&request);
                let finisher = Arc::clone(&inner);
                inner
                    .context
                    .post(Box::new(move || finisher.finish(result)));
            });
        } else {
            let result = self.inner.provider.send_request(&request);
            self.inner.finish(result);
        }
        Ok(())
    }

    /// Current ready state.
    ///
    /// # Panics
    ///
    /// Panics if the internal state mutex is poisoned.
    #[must_use]
    pub fn ready_state(&self) -> XhrReadyState {
        self.inner.state.lock().unwrap().ready_state
    }

    /// HTTP status code, or 0 before a response exists.
    ///
    /// # Panics
    ///
    /// Panics if the internal state mutex is poisoned.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.inner
            .state
            .lock()
            .unwrap()
            .response
            .as_ref()
            .map_or(0, |r| r.status)
    }

    /// Response body as text, available once DONE.
    ///
    /// # Panics
    ///
    /// Panics if the internal state mutex is poisoned.
    #[must_use]
    pub fn response_text(&self) -> Option<String> {
        let state = self.inner.state.lock().unwrap();
        if state.ready_state == XhrReadyState::Done {
            state.response.as_ref().map(Response::text)
        } else {
            None
        }
    }

    /// All response headers as CRLF-separated `Name: Value` lines, or an
    /// empty string before a response exists.
    ///
    /// # Panics
    ///
    /// Panics if the internal state mutex is poisoned.
    #[must_use]
    pub fn get_all_response_headers(&self) -> String {
        self.inner
            .state
            .lock()
            .unwrap()
            .response
            .as_ref()
            .map(Response::headers_joined)
            .unwrap_or_default()
    }

    /// Register a readystatechange callback.
    ///
    /// # Panics
    ///
    /// Panics if the callback mutex is poisoned.
    pub fn on_ready_state_change(&self, callback: XhrCallback) {
        self.inner
            .callbacks
            .lock()
            .unwrap()
            .ready_state_change
            .push(callback);
    }

    /// Register a load callback (successful completion).
    ///
    /// # Panics
    ///
    /// Panics if the callback mutex is poisoned.
    pub fn on_load(&self, callback: XhrCallback) {
        self.inner.callbacks.lock().unwrap().load.push(callback);
    }

    /// Register an error callback (non-timeout transport failure).
    ///
    /// # Panics
    ///
    /// Panics if the callback mutex is poisoned.
    pub fn on_error(&self, callback: XhrCallback) {
        self.inner.callbacks.lock().unwrap().error.push(callback);
    }

    /// Register a timeout callback.
    ///
    /// # Panics
    ///
    /// Panics if the callback mutex is poisoned.
    pub fn on_timeout(&self, callback: XhrCallback) {
        self.inner.callbacks.lock().unwrap().timeout.push(callback);
    }
}

impl XhrInner {
    fn finish(&self, result: Result<Response, marlin_common::net::FetchError>) {
        let outcome = {
            let mut state = self.state.lock().unwrap();
            match result {
                Ok(response) => {
                    state.response = Some(response);
                    state.ready_state = XhrReadyState::Done;
                    Outcome::Loaded
                }
                Err(error) => {
                    state.ready_state = XhrReadyState::Done;
                    if error.is_timeout() {
                        Outcome::TimedOut
                    } else {
                        Outcome::Failed
                    }
                }
            }
        };

        self.fire_ready_state_change();
        let callbacks = self.callbacks.lock().unwrap();
        let list = match outcome {
            Outcome::Loaded => callbacks.load.clone(),
            Outcome::Failed => callbacks.error.clone(),
            Outcome::TimedOut => callbacks.timeout.clone(),
        };
        drop(callbacks);
        for callback in list {
            callback();
        }
    }

    fn fire_ready_state_change(&self) {
        let list = self.callbacks.lock().unwrap().ready_state_change.clone();
        for callback in list {
            callback();
        }
    }
}

enum Outcome {
    Loaded,
    Failed,
    TimedOut,
}
