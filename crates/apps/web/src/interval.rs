use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::Window;

/// A `setInterval` registration that is cleared on [`IntervalHandle::stop`] or drop.
pub struct IntervalHandle {
    window: Window,
    id: Option<i32>,
    _callback: Closure<dyn FnMut()>,
}

impl IntervalHandle {
    pub fn start(
        window: &Window,
        period_ms: u64,
        f: impl FnMut() + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::wrap(Box::new(f) as Box<dyn FnMut()>);
        let timeout = period_ms.min(i32::MAX as u64) as i32;
        let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            timeout,
        )?;
        Ok(Self {
            window: window.clone(),
            id: Some(id),
            _callback: callback,
        })
    }

    pub fn is_running(&self) -> bool {
        self.id.is_some()
    }

    /// Returns `true` if the interval was still registered.
    pub fn stop(&mut self) -> bool {
        let Some(id) = self.id.take() else {
            return false;
        };
        self.window.clear_interval_with_handle(id);
        true
    }
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
