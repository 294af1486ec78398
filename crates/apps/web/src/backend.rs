use foundation::latlng::LatLng;
use tracker::{MapBackend, TileLayerConfig, TrackerError};
use wasm_bindgen::JsValue;

use crate::leaflet::{self, LeafletMap, Marker, lat_lng_array, options};

fn backend_err(what: &str, err: JsValue) -> TrackerError {
    TrackerError::Backend(format!("{what}: {err:?}"))
}

/// [`MapBackend`] over a Leaflet map mounted on the element with `mount_id`.
pub struct LeafletBackend {
    mount_id: String,
    map: Option<LeafletMap>,
}

impl LeafletBackend {
    pub fn new(mount_id: impl Into<String>) -> Self {
        Self {
            mount_id: mount_id.into(),
            map: None,
        }
    }

    fn map(&self) -> Result<&LeafletMap, TrackerError> {
        self.map
            .as_ref()
            .ok_or_else(|| TrackerError::Backend("map view not created".to_string()))
    }
}

impl MapBackend for LeafletBackend {
    type Marker = Marker;

    fn create_view(&mut self, center: LatLng, zoom: f64) -> Result<(), TrackerError> {
        let map = leaflet::map(&self.mount_id).map_err(|e| backend_err("L.map", e))?;
        map.set_view(&lat_lng_array(center.lat, center.lng), zoom, &JsValue::UNDEFINED)
            .map_err(|e| backend_err("setView", e))?;
        self.map = Some(map);
        Ok(())
    }

    fn add_tile_layer(&mut self, tiles: &TileLayerConfig) -> Result<(), TrackerError> {
        let opts = options(&[
            ("maxZoom", JsValue::from_f64(tiles.max_zoom as f64)),
            ("attribution", JsValue::from_str(&tiles.attribution)),
        ])
        .map_err(|e| backend_err("tile options", e))?;
        let layer = leaflet::tile_layer(&tiles.url_template, &opts)
            .map_err(|e| backend_err("L.tileLayer", e))?;
        layer
            .add_layer_to(self.map()?)
            .map_err(|e| backend_err("tileLayer.addTo", e))?;
        Ok(())
    }

    fn create_marker(&mut self, at: LatLng) -> Result<Marker, TrackerError> {
        leaflet::marker(&lat_lng_array(at.lat, at.lng)).map_err(|e| backend_err("L.marker", e))
    }

    fn add_to_map(&mut self, marker: &Marker) -> Result<(), TrackerError> {
        marker
            .add_marker_to(self.map()?)
            .map_err(|e| backend_err("marker.addTo", e))?;
        Ok(())
    }

    fn bind_popup(&mut self, marker: &Marker, text: &str) -> Result<(), TrackerError> {
        marker
            .bind_popup(text)
            .map_err(|e| backend_err("bindPopup", e))?;
        Ok(())
    }

    fn set_view(&mut self, center: LatLng, zoom: f64, animate: bool) -> Result<(), TrackerError> {
        let opts = options(&[("animate", JsValue::from_bool(animate))])
            .map_err(|e| backend_err("view options", e))?;
        self.map()?
            .set_view(&lat_lng_array(center.lat, center.lng), zoom, &opts)
            .map_err(|e| backend_err("setView", e))?;
        Ok(())
    }

    fn open_popup(&mut self, marker: &Marker) -> Result<(), TrackerError> {
        marker
            .open_popup()
            .map_err(|e| backend_err("openPopup", e))?;
        Ok(())
    }

    fn marker_position(&self, marker: &Marker) -> LatLng {
        let at = marker.get_lat_lng();
        LatLng::from([at.lat(), at.lng()])
    }

    fn set_marker_position(&mut self, marker: &Marker, at: LatLng) -> Result<(), TrackerError> {
        marker
            .set_lat_lng(&lat_lng_array(at.lat, at.lng))
            .map_err(|e| backend_err("setLatLng", e))?;
        Ok(())
    }
}
