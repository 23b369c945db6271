//! Console API implementation.
//!
//! [Console Standard](https://console.spec.whatwg.org/)
//!
//! Implements the `console` global with `log`, `warn`, and `error`
//! methods writing to stdout/stderr. The remaining Console Standard
//! surface (counting, grouping, timing, tables) is not implemented.

use boa_engine::{
    Context, JsResult, JsValue, NativeFunction, js_string, object::ObjectInitializer,
    property::Attribute,
};

/// Register the `console` global object on the context.
///
/// [§ 1.1 Logging](https://console.spec.whatwg.org/#logging)
///
/// # Panics
///
/// Panics if a `console` global is already registered.
pub fn register_console(context: &mut Context) {
    let console = ObjectInitializer::new(context)
        .function(
            NativeFunction::from_copy_closure(console_log),
            js_string!("log"),
            0,
        )
        .function(
            NativeFunction::from_copy_closure(console_warn),
            js_string!("warn"),
            0,
        )
        .function(
            NativeFunction::from_copy_closure(console_error),
            js_string!("error"),
            0,
        )
        .build();

    context
        .register_global_property(js_string!("console"), console, Attribute::all())
        .expect("console global should not already exist");
}

/// `console.log(...args)` — logs arguments to stdout.
///
/// [§ 1.1.1 log](https://console.spec.whatwg.org/#log)
fn console_log(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let output = format_console_args(args, context)?;
    println!("[JS] {output}");
    Ok(JsValue::undefined())
}

/// `console.warn(...args)` — logs arguments to stdout with a warning
/// prefix.
///
/// [§ 1.1.3 warn](https://console.spec.whatwg.org/#warn)
fn console_warn(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let output = format_console_args(args, context)?;
    println!("[JS WARN] {output}");
    Ok(JsValue::undefined())
}

/// `console.error(...args)` — logs arguments to stderr.
///
/// [§ 1.1.2 error](https://console.spec.whatwg.org/#error)
fn console_error(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let output = format_console_args(args, context)?;
    eprintln!("[JS ERROR] {output}");
    Ok(JsValue::undefined())
}

/// Convert each argument to a string and join with spaces.
///
/// [§ 2.1 Formatter](https://console.spec.whatwg.org/#formatter)
fn format_console_args(args: &[JsValue], context: &mut Context) -> JsResult<String> {
    let strings: Result<Vec<String>, _> = args
        .iter()
        .map(|arg| arg.to_string(context).map(|s| s.to_std_string_escaped()))
        .collect();

    Ok(strings?.join(" "))
}
