//! Bindings to the subset of Leaflet (`window.L`) the live map uses.

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = L, js_name = Map)]
    #[derive(Debug, Clone)]
    pub type LeafletMap;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    pub fn map(element_id: &str) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(catch, method, js_name = setView)]
    pub fn set_view(
        this: &LeafletMap,
        center: &JsValue,
        zoom: f64,
        options: &JsValue,
    ) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(js_namespace = L, js_name = TileLayer)]
    pub type TileLayer;

    #[wasm_bindgen(catch, js_namespace = L, js_name = tileLayer)]
    pub fn tile_layer(url_template: &str, options: &JsValue) -> Result<TileLayer, JsValue>;

    #[wasm_bindgen(catch, method, js_name = addTo)]
    pub fn add_layer_to(this: &TileLayer, map: &LeafletMap) -> Result<TileLayer, JsValue>;

    #[wasm_bindgen(js_namespace = L, js_name = Marker)]
    #[derive(Debug, Clone)]
    pub type Marker;

    #[wasm_bindgen(catch, js_namespace = L, js_name = marker)]
    pub fn marker(at: &JsValue) -> Result<Marker, JsValue>;

    #[wasm_bindgen(catch, method, js_name = addTo)]
    pub fn add_marker_to(this: &Marker, map: &LeafletMap) -> Result<Marker, JsValue>;

    #[wasm_bindgen(catch, method, js_name = bindPopup)]
    pub fn bind_popup(this: &Marker, content: &str) -> Result<Marker, JsValue>;

    #[wasm_bindgen(catch, method, js_name = openPopup)]
    pub fn open_popup(this: &Marker) -> Result<Marker, JsValue>;

    #[wasm_bindgen(method, js_name = getLatLng)]
    pub fn get_lat_lng(this: &Marker) -> LeafletLatLng;

    #[wasm_bindgen(catch, method, js_name = setLatLng)]
    pub fn set_lat_lng(this: &Marker, at: &JsValue) -> Result<Marker, JsValue>;

    #[wasm_bindgen(js_namespace = L, js_name = LatLng)]
    pub type LeafletLatLng;

    #[wasm_bindgen(method, getter)]
    pub fn lat(this: &LeafletLatLng) -> f64;

    #[wasm_bindgen(method, getter)]
    pub fn lng(this: &LeafletLatLng) -> f64;
}

/// `[lat, lng]` array, the form every Leaflet call above accepts.
pub fn lat_lng_array(lat: f64, lng: f64) -> JsValue {
    js_sys::Array::of2(&JsValue::from_f64(lat), &JsValue::from_f64(lng)).into()
}

/// Plain options object built from `(key, value)` pairs.
pub fn options(pairs: &[(&str, JsValue)]) -> Result<JsValue, JsValue> {
    let obj = js_sys::Object::new();
    for (key, value) in pairs {
        js_sys::Reflect::set(&obj, &JsValue::from_str(key), value)?;
    }
    Ok(obj.into())
}
