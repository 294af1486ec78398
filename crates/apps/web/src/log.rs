use runtime::event_bus::Event;
use wasm_bindgen::JsValue;

const PREFIX: &str = "busflow:";

pub(crate) fn info(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(&format!("{PREFIX} {msg}")));
}

pub(crate) fn warn(msg: &str) {
    web_sys::console::warn_1(&JsValue::from_str(&format!("{PREFIX} {msg}")));
}

pub(crate) fn error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(&format!("{PREFIX} {msg}")));
}

pub(crate) fn debug(msg: &str) {
    web_sys::console::debug_1(&JsValue::from_str(&format!("{PREFIX} {msg}")));
}

/// Formats a recorded event as one console line.
pub(crate) fn format_event(event: &Event) -> String {
    format!("[{}ms] {} {}", event.at.as_millis(), event.kind, event.message)
}

/// Writes recorded events to the console. Invalid stops are warnings, the rest
/// is debug output.
pub(crate) fn flush(events: Vec<Event>) {
    for event in &events {
        let line = format_event(event);
        match event.kind {
            "stop.invalid" => warn(&line),
            _ => debug(&line),
        }
    }
}
