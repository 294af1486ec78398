use foundation::latlng::LatLng;

use crate::config::TileLayerConfig;
use crate::error::TrackerError;

/// The map-rendering collaborator.
///
/// The browser build implements this over Leaflet; tests use [`InMemoryMap`].
/// Calls are made in the order the live map needs them, and the backend is
/// never asked about a marker it did not create.
pub trait MapBackend {
    type Marker;

    fn create_view(&mut self, center: LatLng, zoom: f64) -> Result<(), TrackerError>;
    fn add_tile_layer(&mut self, tiles: &TileLayerConfig) -> Result<(), TrackerError>;
    fn create_marker(&mut self, at: LatLng) -> Result<Self::Marker, TrackerError>;
    fn add_to_map(&mut self, marker: &Self::Marker) -> Result<(), TrackerError>;
    fn bind_popup(&mut self, marker: &Self::Marker, text: &str) -> Result<(), TrackerError>;
    fn set_view(&mut self, center: LatLng, zoom: f64, animate: bool) -> Result<(), TrackerError>;
    fn open_popup(&mut self, marker: &Self::Marker) -> Result<(), TrackerError>;
    fn marker_position(&self, marker: &Self::Marker) -> LatLng;
    fn set_marker_position(&mut self, marker: &Self::Marker, at: LatLng)
    -> Result<(), TrackerError>;
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    CreateView { center: LatLng, zoom: f64 },
    AddTileLayer { url_template: String, max_zoom: u32 },
    CreateMarker { marker: usize, at: LatLng },
    AddToMap { marker: usize },
    BindPopup { marker: usize, text: String },
    SetView { center: LatLng, zoom: f64, animate: bool },
    OpenPopup { marker: usize },
    SetMarkerPosition { marker: usize, at: LatLng },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryMarker {
    pub position: LatLng,
    pub popup: Option<String>,
    pub on_map: bool,
}

/// In-memory map that records every call.
#[derive(Debug, Default)]
pub struct InMemoryMap {
    calls: Vec<MapCall>,
    view: Option<(LatLng, f64)>,
    tile_layers: Vec<TileLayerConfig>,
    markers: Vec<InMemoryMarker>,
    open_popup: Option<usize>,
    record_moves: bool,
}

impl InMemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also record `SetMarkerPosition` calls. Off by default since every tick
    /// produces one per marker.
    pub fn recording_moves(mut self) -> Self {
        self.record_moves = true;
        self
    }

    pub fn calls(&self) -> &[MapCall] {
        &self.calls
    }

    pub fn view(&self) -> Option<(LatLng, f64)> {
        self.view
    }

    pub fn tile_layers(&self) -> &[TileLayerConfig] {
        &self.tile_layers
    }

    pub fn markers(&self) -> &[InMemoryMarker] {
        &self.markers
    }

    /// Marker whose popup is currently open.
    pub fn popup_marker(&self) -> Option<usize> {
        self.open_popup
    }

    fn marker_mut(&mut self, marker: usize) -> Result<&mut InMemoryMarker, TrackerError> {
        self.markers
            .get_mut(marker)
            .ok_or_else(|| TrackerError::Backend(format!("no marker {marker}")))
    }
}

impl MapBackend for InMemoryMap {
    type Marker = usize;

    fn create_view(&mut self, center: LatLng, zoom: f64) -> Result<(), TrackerError> {
        self.view = Some((center, zoom));
        self.calls.push(MapCall::CreateView { center, zoom });
        Ok(())
    }

    fn add_tile_layer(&mut self, tiles: &TileLayerConfig) -> Result<(), TrackerError> {
        if self.view.is_none() {
            return Err(TrackerError::Backend("tile layer added before view".to_string()));
        }
        self.tile_layers.push(tiles.clone());
        self.calls.push(MapCall::AddTileLayer {
            url_template: tiles.url_template.clone(),
            max_zoom: tiles.max_zoom,
        });
        Ok(())
    }

    fn create_marker(&mut self, at: LatLng) -> Result<usize, TrackerError> {
        let marker = self.markers.len();
        self.markers.push(InMemoryMarker {
            position: at,
            popup: None,
            on_map: false,
        });
        self.calls.push(MapCall::CreateMarker { marker, at });
        Ok(marker)
    }

    fn add_to_map(&mut self, marker: &usize) -> Result<(), TrackerError> {
        if self.view.is_none() {
            return Err(TrackerError::Backend("marker added before view".to_string()));
        }
        self.marker_mut(*marker)?.on_map = true;
        self.calls.push(MapCall::AddToMap { marker: *marker });
        Ok(())
    }

    fn bind_popup(&mut self, marker: &usize, text: &str) -> Result<(), TrackerError> {
        self.marker_mut(*marker)?.popup = Some(text.to_string());
        self.calls.push(MapCall::BindPopup {
            marker: *marker,
            text: text.to_string(),
        });
        Ok(())
    }

    fn set_view(&mut self, center: LatLng, zoom: f64, animate: bool) -> Result<(), TrackerError> {
        self.view = Some((center, zoom));
        self.calls.push(MapCall::SetView {
            center,
            zoom,
            animate,
        });
        Ok(())
    }

    fn open_popup(&mut self, marker: &usize) -> Result<(), TrackerError> {
        let m = self.marker_mut(*marker)?;
        if m.popup.is_none() {
            return Err(TrackerError::Backend(format!("marker {marker} has no popup")));
        }
        self.open_popup = Some(*marker);
        self.calls.push(MapCall::OpenPopup { marker: *marker });
        Ok(())
    }

    fn marker_position(&self, marker: &usize) -> LatLng {
        self.markers
            .get(*marker)
            .map(|m| m.position)
            .unwrap_or(LatLng::new(f64::NAN, f64::NAN))
    }

    fn set_marker_position(&mut self, marker: &usize, at: LatLng) -> Result<(), TrackerError> {
        self.marker_mut(*marker)?.position = at;
        if self.record_moves {
            self.calls.push(MapCall::SetMarkerPosition {
                marker: *marker,
                at,
            });
        }
        Ok(())
    }
}
