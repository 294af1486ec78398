use std::cell::RefCell;
use std::sync::OnceLock;

use tracker::{MapConfig, RevealConfig};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Document, Window};

mod backend;
mod dom;
mod interval;
mod leaflet;
mod live;
mod log;
mod reveal;

pub use backend::LeafletBackend;
pub use interval::IntervalHandle;
pub use live::LiveMapSession;
pub use reveal::RevealSession;

static PANIC_HOOK_SET: OnceLock<()> = OnceLock::new();

thread_local! {
    static REVEAL: RefCell<Option<RevealSession>> = const { RefCell::new(None) };
    static LIVE_MAP: RefCell<MountSlot<LiveMapSession>> = const { RefCell::new(MountSlot::Empty) };
    static BOOT_LISTENER: RefCell<Option<Closure<dyn FnMut()>>> = const { RefCell::new(None) };
}

pub(crate) fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Live map state. `Failed` means an attempt errored after Leaflet may have
/// claimed the mount element, which Leaflet refuses to initialize twice.
enum MountSlot<T> {
    Empty,
    Live(T),
    Failed,
}

impl<T> MountSlot<T> {
    fn claim(&self) -> Result<(), &'static str> {
        match self {
            MountSlot::Empty => Ok(()),
            MountSlot::Live(_) => Err("live map already initialized"),
            MountSlot::Failed => Err("live map already initialized (previous attempt failed)"),
        }
    }

    /// Stores the outcome of a start attempt. `Ok(None)` (no mount point)
    /// leaves the slot free.
    fn settle<E>(&mut self, outcome: Result<Option<T>, E>) -> Result<bool, E> {
        match outcome {
            Ok(Some(session)) => {
                *self = MountSlot::Live(session);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => {
                *self = MountSlot::Failed;
                Err(err)
            }
        }
    }

    fn live(&self) -> Option<&T> {
        match self {
            MountSlot::Live(session) => Some(session),
            _ => None,
        }
    }

    fn live_mut(&mut self) -> Option<&mut T> {
        match self {
            MountSlot::Live(session) => Some(session),
            _ => None,
        }
    }
}

fn init_panic_hook() {
    PANIC_HOOK_SET.get_or_init(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = info.to_string();
            web_sys::console::error_1(&JsValue::from_str(&msg));
        }));
    });
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    init_panic_hook();
    Ok(())
}

/// Wires both components once the DOM is ready.
///
/// If the document is still loading this waits for `DOMContentLoaded`;
/// otherwise it runs immediately. The two components are independent: a
/// failure in one is logged and does not stop the other.
#[wasm_bindgen]
pub fn boot() -> Result<(), JsValue> {
    init_panic_hook();
    let document = document()?;
    if document.ready_state() != "loading" {
        boot_now();
        return Ok(());
    }

    let callback = Closure::wrap(Box::new(boot_now) as Box<dyn FnMut()>);
    let opts = AddEventListenerOptions::new();
    opts.set_once(true);
    document.add_event_listener_with_callback_and_add_event_listener_options(
        "DOMContentLoaded",
        callback.as_ref().unchecked_ref(),
        &opts,
    )?;
    BOOT_LISTENER.with(|slot| *slot.borrow_mut() = Some(callback));
    Ok(())
}

fn boot_now() {
    if let Err(err) = init_reveal() {
        log::error(&format!("reveal init failed: {err:?}"));
    }
    if let Err(err) = init_live_map() {
        log::error(&format!("live map init failed: {err:?}"));
    }
}

/// Starts the reveal controller with the default selector, class and threshold.
///
/// Returns the number of observed elements. Calling it again is a no-op.
#[wasm_bindgen]
pub fn init_reveal() -> Result<u32, JsValue> {
    start_reveal(RevealConfig::default())
}

#[wasm_bindgen]
pub fn init_reveal_with_config(config_json: &str) -> Result<u32, JsValue> {
    start_reveal(RevealConfig::from_json(config_json).map_err(js_err)?)
}

fn start_reveal(config: RevealConfig) -> Result<u32, JsValue> {
    if let Some(count) = REVEAL.with(|r| r.borrow().as_ref().map(|s| s.target_count() as u32)) {
        return Ok(count);
    }
    let session = RevealSession::start(&document()?, &config)?;
    let count = session.as_ref().map(|s| s.target_count() as u32).unwrap_or(0);
    REVEAL.with(|r| *r.borrow_mut() = session);
    Ok(count)
}

#[wasm_bindgen]
pub fn reveal_shown_count() -> u32 {
    REVEAL.with(|r| r.borrow().as_ref().map(|s| s.shown_count() as u32).unwrap_or(0))
}

/// Starts the live map with default settings.
///
/// Returns `false` when the page has no mount point. Once an attempt has
/// mounted or failed, later calls return an "already initialized" error.
/// Reload the page to retry.
#[wasm_bindgen]
pub fn init_live_map() -> Result<bool, JsValue> {
    start_live_map(MapConfig::default())
}

/// Starts the live map with a partial JSON override of [`MapConfig`].
#[wasm_bindgen]
pub fn init_live_map_with_config(config_json: &str) -> Result<bool, JsValue> {
    start_live_map(MapConfig::from_json(config_json).map_err(js_err)?)
}

fn start_live_map(config: MapConfig) -> Result<bool, JsValue> {
    LIVE_MAP
        .with(|m| m.borrow().claim())
        .map_err(JsValue::from_str)?;
    let outcome = LiveMapSession::start(&window()?, &document()?, config);
    LIVE_MAP.with(|m| m.borrow_mut().settle(outcome))
}

/// Cancels the marker simulation. Returns `false` if it was not running.
#[wasm_bindgen]
pub fn stop_live_map() -> bool {
    LIVE_MAP.with(|m| {
        m.borrow_mut()
            .live_mut()
            .map(|s| s.stop_motion())
            .unwrap_or(false)
    })
}

#[wasm_bindgen]
pub fn live_map_is_moving() -> bool {
    LIVE_MAP.with(|m| m.borrow().live().is_some_and(|s| s.is_moving()))
}

#[wasm_bindgen]
pub fn live_map_marker_count() -> u32 {
    LIVE_MAP.with(|m| {
        m.borrow()
            .live()
            .map(|s| s.marker_count() as u32)
            .unwrap_or(0)
    })
}

/// Focuses marker `index` as if its stop item had been clicked.
#[wasm_bindgen]
pub fn focus_stop(index: u32) -> Result<(), JsValue> {
    LIVE_MAP.with(|m| match m.borrow().live() {
        Some(session) => session.focus(index),
        None => Err(JsValue::from_str("live map not initialized")),
    })
}

#[cfg(test)]
mod tests {
    use super::MountSlot;

    #[test]
    fn failed_start_blocks_retry() {
        let mut slot: MountSlot<()> = MountSlot::Empty;
        assert_eq!(slot.claim(), Ok(()));
        assert_eq!(slot.settle::<&str>(Err("L.marker threw")), Err("L.marker threw"));
        assert!(slot.claim().is_err());
        assert!(slot.live().is_none());
    }

    #[test]
    fn missing_mount_leaves_slot_free() {
        let mut slot: MountSlot<()> = MountSlot::Empty;
        assert_eq!(slot.settle::<&str>(Ok(None)), Ok(false));
        assert_eq!(slot.claim(), Ok(()));

        assert_eq!(slot.settle::<&str>(Ok(Some(()))), Ok(true));
        assert_eq!(slot.claim(), Err("live map already initialized"));
        assert!(slot.live_mut().is_some());
    }
}
