use tracker::StopItem;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element};

/// `dataset` key to attribute name: `lat` -> `data-lat`, `stopLat` -> `data-stop-lat`.
pub fn data_attribute(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 5);
    out.push_str("data-");
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Every element matching `selector`, in document order.
pub fn query_all(document: &Document, selector: &str) -> Result<Vec<Element>, JsValue> {
    let list = document.query_selector_all(selector)?;
    let mut out = Vec::with_capacity(list.length() as usize);
    for i in 0..list.length() {
        let Some(node) = list.item(i) else {
            continue;
        };
        if let Ok(el) = node.dyn_into::<Element>() {
            out.push(el);
        }
    }
    Ok(out)
}

/// Reads the raw coordinate attributes and text of one stop item.
pub fn stop_item(el: &Element, lat_key: &str, lng_key: &str) -> StopItem {
    StopItem {
        lat: el.get_attribute(&data_attribute(lat_key)),
        lng: el.get_attribute(&data_attribute(lng_key)),
        text: el.text_content().unwrap_or_default(),
    }
}
