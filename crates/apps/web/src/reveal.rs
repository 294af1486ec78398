use std::cell::RefCell;
use std::rc::Rc;

use foundation::ids::TargetId;
use tracker::{IntersectionEntry, RevealConfig, RevealController};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::dom::query_all;
use crate::log;

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

/// Keeps the observer and its callback alive for the page's lifetime.
pub struct RevealSession {
    observer: IntersectionObserver,
    controller: Rc<RefCell<RevealController>>,
    _callback: ObserverCallback,
}

impl RevealSession {
    /// Observes every element matching the reveal selector right now. Elements
    /// added later are not picked up. Returns `None` when nothing matches.
    pub fn start(document: &Document, config: &RevealConfig) -> Result<Option<Self>, JsValue> {
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let targets = query_all(document, &config.selector)?;
        if targets.is_empty() {
            return Ok(None);
        }

        let controller = Rc::new(RefCell::new(RevealController::from_config(config)));
        let ids = controller.borrow_mut().observe(targets.len());
        let targets = Rc::new(targets);

        let callback: ObserverCallback = {
            let controller = controller.clone();
            let targets = targets.clone();
            let shown_class = config.shown_class.clone();
            Closure::wrap(Box::new(move |entries: js_sys::Array, observer: IntersectionObserver| {
                let batch: Vec<IntersectionEntry> = entries
                    .iter()
                    .filter_map(|v| v.dyn_into::<IntersectionObserverEntry>().ok())
                    .filter_map(|entry| {
                        let target = entry.target();
                        let index = targets.iter().position(|t| *t == target)?;
                        Some(IntersectionEntry {
                            target: TargetId::new(index as u32),
                            is_intersecting: entry.is_intersecting(),
                            ratio: entry.intersection_ratio(),
                        })
                    })
                    .collect();

                let shown = controller.borrow_mut().on_intersections(&batch);
                for id in shown {
                    let el = &targets[id.index() as usize];
                    if let Err(err) = el.class_list().add_1(&shown_class) {
                        log::error(&format!("reveal: add class failed: {err:?}"));
                    }
                    // Shown is final; no need to keep watching this element.
                    observer.unobserve(el);
                }
                if controller.borrow().is_complete() {
                    observer.disconnect();
                }
            })
                as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>)
        };

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(config.threshold));
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        for el in targets.iter() {
            observer.observe(el);
        }
        log::debug(&format!("reveal: observing {} elements", ids.len()));

        Ok(Some(Self {
            observer,
            controller,
            _callback: callback,
        }))
    }

    pub fn target_count(&self) -> usize {
        self.controller.borrow().target_count()
    }

    pub fn shown_count(&self) -> usize {
        self.controller.borrow().shown_count()
    }
}

impl Drop for RevealSession {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
