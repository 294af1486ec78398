use std::cell::RefCell;
use std::rc::Rc;

use foundation::ids::MarkerId;
use foundation::time::Time;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracker::{LiveMap, MapConfig, StopItem};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Window};

use crate::backend::LeafletBackend;
use crate::dom::{query_all, stop_item};
use crate::interval::IntervalHandle;
use crate::{js_err, log};

type ClickCallback = Closure<dyn FnMut(web_sys::Event)>;

fn now(window: &Window) -> Time {
    let ms = window.performance().map(|p| p.now()).unwrap_or(0.0);
    Time::from_millis(ms.max(0.0) as u64)
}

fn motion_seed() -> u64 {
    let r = (js_sys::Math::random() * (1u64 << 53) as f64) as u64;
    r ^ (js_sys::Date::now() as u64).rotate_left(17)
}

/// Browser-side owner of a [`LiveMap`]: the click listeners on the stop list
/// and the `setInterval` driving the simulation.
pub struct LiveMapSession {
    live: Rc<RefCell<LiveMap<LeafletBackend>>>,
    clicks: Vec<(Element, ClickCallback)>,
    motion: Option<IntervalHandle>,
}

impl LiveMapSession {
    /// Returns `None` when the page has no mount point.
    pub fn start(window: &Window, document: &Document, config: MapConfig) -> Result<Option<Self>, JsValue> {
        let mount_present = document.get_element_by_id(&config.mount_id).is_some();
        let elements = if mount_present {
            query_all(document, &config.stop_selector)?
        } else {
            Vec::new()
        };
        let items: Vec<StopItem> = elements
            .iter()
            .map(|el| stop_item(el, &config.lat_key, &config.lng_key))
            .collect();

        let backend = LeafletBackend::new(config.mount_id.clone());
        let Some(mut live) = LiveMap::mount(mount_present, backend, config, &items).map_err(js_err)?
        else {
            log::debug("live map: no mount point, skipping");
            return Ok(None);
        };
        live.set_clock(now(window));
        log::flush(live.drain_events());

        let interval_ms = live.config().motion.interval_ms;
        let wiring = live.click_bindings();
        let live = Rc::new(RefCell::new(live));

        let mut clicks = Vec::with_capacity(wiring.len());
        for (source_index, id) in wiring {
            let Some(el) = elements.get(source_index).cloned() else {
                continue;
            };
            let callback: ClickCallback = {
                let live = live.clone();
                let window = window.clone();
                Closure::wrap(Box::new(move |_e: web_sys::Event| {
                    let Ok(mut live) = live.try_borrow_mut() else {
                        return;
                    };
                    live.set_clock(now(&window));
                    if let Err(err) = live.focus(id) {
                        log::error(&format!("focus failed: {err}"));
                    }
                    log::flush(live.drain_events());
                }) as Box<dyn FnMut(web_sys::Event)>)
            };
            el.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())?;
            clicks.push((el, callback));
        }

        let motion = {
            let live = live.clone();
            let tick_window = window.clone();
            let mut rng = SmallRng::seed_from_u64(motion_seed());
            IntervalHandle::start(window, interval_ms, move || {
                let Ok(mut live) = live.try_borrow_mut() else {
                    return;
                };
                live.set_clock(now(&tick_window));
                if let Err(err) = live.tick(&mut rng) {
                    log::error(&format!("motion tick failed: {err}"));
                }
                log::flush(live.drain_events());
            })?
        };

        log::info(&format!(
            "live map: {} markers, moving every {interval_ms} ms",
            clicks.len()
        ));

        Ok(Some(Self {
            live,
            clicks,
            motion: Some(motion),
        }))
    }

    pub fn marker_count(&self) -> usize {
        self.live.borrow().marker_count()
    }

    /// Same as clicking the stop item behind marker `index`.
    pub fn focus(&self, index: u32) -> Result<(), JsValue> {
        let mut live = self.live.borrow_mut();
        let result = live.focus(MarkerId::new(index)).map_err(js_err);
        log::flush(live.drain_events());
        result
    }

    pub fn is_moving(&self) -> bool {
        self.motion.as_ref().is_some_and(|m| m.is_running())
    }

    /// Cancels the simulation interval. Markers stay where they are and the
    /// stop list keeps working.
    pub fn stop_motion(&mut self) -> bool {
        let Some(mut motion) = self.motion.take() else {
            return false;
        };
        let stopped = motion.stop();
        if stopped {
            log::info(&format!(
                "live map: motion stopped after {} ticks",
                self.live.borrow().ticks()
            ));
        }
        stopped
    }
}

impl Drop for LiveMapSession {
    fn drop(&mut self) {
        for (el, callback) in &self.clicks {
            let _ = el.remove_event_listener_with_callback("click", callback.as_ref().unchecked_ref());
        }
    }
}
