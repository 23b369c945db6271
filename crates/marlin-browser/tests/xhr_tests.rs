//! XMLHttpRequest state machine and callback tests.

use marlin_browser::{NoopExecutor, Page, QueuedContext, XhrError, XhrReadyState, XmlHttpRequest};
use marlin_common::net::{
    FetchError, MemoryResourceProvider, Request, ResourceProvider, Response,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn provider_with(url: &str, body: &str) -> Arc<MemoryResourceProvider> {
    let provider = Arc::new(MemoryResourceProvider::new());
    provider.insert_text(url, body);
    provider
}

#[test]
fn set_request_header_before_open_is_an_invalid_state() {
    let xhr = XmlHttpRequest::new(
        Arc::new(MemoryResourceProvider::new()),
        Arc::new(marlin_browser::ImmediateContext::new()),
    );
    assert!(matches!(
        xhr.set_request_header("X-Test", "1"),
        Err(XhrError::InvalidState(_))
    ));
}

#[test]
fn timeout_access_before_open_is_an_invalid_state() {
    let xhr = XmlHttpRequest::new(
        Arc::new(MemoryResourceProvider::new()),
        Arc::new(marlin_browser::ImmediateContext::new()),
    );
    assert!(xhr.timeout().is_err());
    assert!(xhr.set_timeout(Duration::from_secs(5)).is_err());

    xhr.open("GET", "http://x/data", false);
    xhr.set_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(xhr.timeout().unwrap(), Duration::from_secs(5));
}

#[test]
fn send_before_open_and_double_send_are_invalid_states() {
    let provider = provider_with("http://x/data", "payload");
    let xhr = XmlHttpRequest::new(
        provider,
        Arc::new(marlin_browser::ImmediateContext::new()),
    );
    assert!(xhr.send(None).is_err());

    xhr.open("GET", "http://x/data", false);
    xhr.send(None).unwrap();
    assert!(xhr.send(None).is_err());

    // A header after send is rejected too.
    assert!(xhr.set_request_header("X-Late", "1").is_err());
}

#[test]
fn synchronous_send_completes_inline() {
    let provider = provider_with("http://x/data", "payload");
    let xhr = XmlHttpRequest::new(
        provider,
        Arc::new(marlin_browser::ImmediateContext::new()),
    );

    let states = Arc::new(Mutex::new(Vec::new()));
    {
        let states = Arc::clone(&states);
        let observer = xhr.clone();
        xhr.on_ready_state_change(Arc::new(move || {
            states.lock().unwrap().push(observer.ready_state());
        }));
    }

    assert_eq!(xhr.ready_state(), XhrReadyState::Unsent);
    xhr.open("GET", "http://x/data", false);
    xhr.send(None).unwrap();

    assert_eq!(xhr.ready_state(), XhrReadyState::Done);
    assert_eq!(xhr.status(), 200);
    assert_eq!(xhr.response_text().as_deref(), Some("payload"));
    assert_eq!(
        *states.lock().unwrap(),
        vec![XhrReadyState::Opened, XhrReadyState::Done]
    );
}

#[test]
fn asynchronous_send_completes_through_the_context() {
    let provider = provider_with("http://x/data", "payload");
    let context = Arc::new(QueuedContext::new());
    let xhr = XmlHttpRequest::new(provider, Arc::<QueuedContext>::clone(&context));

    let loads = Arc::new(AtomicUsize::new(0));
    {
        let loads = Arc::clone(&loads);
        xhr.on_load(Arc::new(move || {
            let _ = loads.fetch_add(1, Ordering::SeqCst);
        }));
    }

    xhr.open("GET", "http://x/data", true);
    xhr.send(None).unwrap();
    assert_eq!(xhr.ready_state(), XhrReadyState::Loading);
    assert_eq!(loads.load(Ordering::SeqCst), 0);

    assert!(context.wait_and_run_one(Duration::from_secs(5)));
    assert_eq!(xhr.ready_state(), XhrReadyState::Done);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(xhr.response_text().as_deref(), Some("payload"));
}

#[test]
fn transport_failure_fires_error_not_load() {
    let provider = Arc::new(MemoryResourceProvider::new());
    provider.insert_error(
        "http://x/broken",
        FetchError::Transport {
            url: "http://x/broken".to_string(),
            message: "refused".to_string(),
        },
    );
    let xhr = XmlHttpRequest::new(
        provider,
        Arc::new(marlin_browser::ImmediateContext::new()),
    );

    let outcomes = Arc::new(Mutex::new(Vec::new()));
    {
        let outcomes = Arc::clone(&outcomes);
        xhr.on_load(Arc::new(move || outcomes.lock().unwrap().push("load")));
    }
    {
        let outcomes = Arc::clone(&outcomes);
        xhr.on_error(Arc::new(move || outcomes.lock().unwrap().push("error")));
    }
    {
        let outcomes = Arc::clone(&outcomes);
        xhr.on_timeout(Arc::new(move || outcomes.lock().unwrap().push("timeout")));
    }

    xhr.open("GET", "http://x/broken", false);
    xhr.send(None).unwrap();
    assert_eq!(*outcomes.lock().unwrap(), vec!["error"]);
    assert_eq!(xhr.ready_state(), XhrReadyState::Done);
    assert_eq!(xhr.status(), 0);
    assert_eq!(xhr.response_text(), None);
}

#[test]
fn timeout_failure_is_distinguished_from_other_errors() {
    let provider = Arc::new(MemoryResourceProvider::new());
    provider.insert_error(
        "http://x/slow",
        FetchError::Timeout {
            url: "http://x/slow".to_string(),
        },
    );
    let xhr = XmlHttpRequest::new(
        provider,
        Arc::new(marlin_browser::ImmediateContext::new()),
    );

    let timed_out = Arc::new(AtomicUsize::new(0));
    {
        let timed_out = Arc::clone(&timed_out);
        xhr.on_timeout(Arc::new(move || {
            let _ = timed_out.fetch_add(1, Ordering::SeqCst);
        }));
    }

    xhr.open("GET", "http://x/slow", false);
    xhr.send(None).unwrap();
    assert_eq!(timed_out.load(Ordering::SeqCst), 1);
}

#[test]
fn response_headers_join_with_crlf() {
    /// Provider returning canned headers.
    struct HeaderProvider;
    impl ResourceProvider for HeaderProvider {
        fn send_request(&self, _request: &Request) -> Result<Response, FetchError> {
            Ok(Response {
                status: 200,
                headers: vec![
                    ("Content-Type".to_string(), "text/plain".to_string()),
                    ("X-Engine".to_string(), "marlin".to_string()),
                ],
                body: b"ok".to_vec(),
            })
        }
    }

    let xhr = XmlHttpRequest::new(
        Arc::new(HeaderProvider),
        Arc::new(marlin_browser::ImmediateContext::new()),
    );
    assert_eq!(xhr.get_all_response_headers(), "");

    xhr.open("GET", "http://x/anything", false);
    xhr.send(None).unwrap();
    assert_eq!(
        xhr.get_all_response_headers(),
        "Content-Type: text/plain\r\nX-Engine: marlin"
    );
}

#[test]
fn pages_hand_out_wired_request_clients() {
    let provider = provider_with("http://x/api", "from page");
    let page = Page::new(provider, Box::new(NoopExecutor::new()));
    let xhr = page.create_xhr();

    xhr.open("GET", "http://x/api", false);
    xhr.send(None).unwrap();
    assert_eq!(xhr.response_text().as_deref(), Some("from page"));
}
