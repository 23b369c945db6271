//! JavaScript global objects.
//!
//! Registers the built-in globals available to every script run by the
//! runtime.
//!
//! # Implemented
//!
//! - `console` — [Console Standard](https://console.spec.whatwg.org/)
//!
//! # Not Yet Implemented
//!
//! - `document` — requires handing a DOM handle across the runtime
//!   boundary
//! - `window`, `location`, `navigator`
//! - `setTimeout`/`setInterval` — requires event-loop integration

mod console;

use boa_engine::Context;

/// Register all global objects on the context.
///
/// Called once when creating a new [`crate::JsRuntime`].
pub fn register_globals(context: &mut Context) {
    console::register_console(context);
}
