use foundation::ids::MarkerId;
use foundation::latlng::LatLng;
use foundation::time::Time;
use rand::Rng;
use runtime::event_bus::{Event, EventBus};
use runtime::scheduler::TimerQueue;
use runtime::task::{Firing, TaskHandle};

use crate::backend::MapBackend;
use crate::config::MapConfig;
use crate::error::TrackerError;
use crate::marker::Marker;
use crate::motion;
use crate::stops::{StopItem, read_stops};

/// Center and zoom last requested from the backend.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: f64,
}

/// Initialization-scoped context for the live map: owns the backend, the view
/// and every marker.
///
/// The marker set is fixed once `init` returns. Focus and motion are the only
/// writers of marker/view state and both run on the caller's thread, so the
/// last call wins.
pub struct LiveMap<B: MapBackend> {
    backend: B,
    config: MapConfig,
    view: MapView,
    markers: Vec<Marker<B::Marker>>,
    events: EventBus,
    clock: Time,
    motion: Option<TaskHandle>,
    ticks: u64,
}

impl<B: MapBackend> LiveMap<B> {
    /// Runs `init` only when the mount point is present.
    ///
    /// Without a mount point the backend is dropped untouched and `Ok(None)` is
    /// returned.
    pub fn mount(
        mount_present: bool,
        backend: B,
        config: MapConfig,
        items: &[StopItem],
    ) -> Result<Option<Self>, TrackerError> {
        if !mount_present {
            return Ok(None);
        }
        Self::init(backend, config, items).map(Some)
    }

    /// Creates the view, the tile layer and one marker per accepted stop, in
    /// that order.
    pub fn init(mut backend: B, config: MapConfig, items: &[StopItem]) -> Result<Self, TrackerError> {
        config.validate()?;
        let mut events = EventBus::new();
        let clock = Time::ZERO;

        backend.create_view(config.center, config.zoom)?;
        backend.add_tile_layer(&config.tiles)?;
        events.emit(
            clock,
            "map.init",
            format!(
                "center=({}, {}) zoom={}",
                config.center.lat, config.center.lng, config.zoom
            ),
        );

        let readout = read_stops(items, config.coordinate_policy)?;
        for err in &readout.invalid {
            events.emit(clock, "stop.invalid", err.to_string());
        }

        let mut markers = Vec::with_capacity(readout.stops.len());
        for (i, stop) in readout.stops.iter().enumerate() {
            let handle = backend.create_marker(stop.position())?;
            backend.add_to_map(&handle)?;
            backend.bind_popup(&handle, stop.label())?;

            let id = MarkerId::new(i as u32);
            events.emit(
                clock,
                "marker.placed",
                format!(
                    "#{} {:?} at ({}, {})",
                    id.index(),
                    stop.label(),
                    stop.position().lat,
                    stop.position().lng
                ),
            );
            markers.push(Marker::new(
                id,
                handle,
                stop.position(),
                stop.label().to_string(),
                stop.source_index(),
            ));
        }

        Ok(Self {
            backend,
            view: MapView {
                center: config.center,
                zoom: config.zoom,
            },
            config,
            markers,
            events,
            clock,
            motion: None,
            ticks: 0,
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn markers(&self) -> &[Marker<B::Marker>] {
        &self.markers
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker<B::Marker>> {
        self.markers.get(id.index() as usize)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// `(stop item index, marker)` pairs for wiring stop-list clicks, in
    /// document order. Items dropped by the coordinate policy have no entry.
    pub fn click_bindings(&self) -> Vec<(usize, MarkerId)> {
        self.markers
            .iter()
            .map(|m| (m.source_index(), m.id()))
            .collect()
    }

    /// Number of simulation ticks applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Timestamp used for recorded events.
    pub fn set_clock(&mut self, now: Time) {
        self.clock = now;
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    /// Stop-list click: re-center on the stop's original coordinate at the
    /// focus zoom and open the marker's popup.
    pub fn focus(&mut self, id: MarkerId) -> Result<(), TrackerError> {
        let marker = self
            .markers
            .get(id.index() as usize)
            .ok_or(TrackerError::UnknownMarker(id))?;
        let origin = marker.origin();

        self.backend
            .set_view(origin, self.config.focus_zoom, self.config.animate_focus)?;
        self.backend.open_popup(marker.handle())?;

        self.view = MapView {
            center: origin,
            zoom: self.config.focus_zoom,
        };
        self.events.emit(
            self.clock,
            "map.focus",
            format!("#{} {:?}", id.index(), marker.popup()),
        );
        Ok(())
    }

    /// One simulation tick: perturb every marker from its current backend
    /// position. Returns the number of markers moved.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, TrackerError> {
        for marker in &mut self.markers {
            let current = self.backend.marker_position(marker.handle());
            let next = motion::step(current, marker.origin(), &self.config.motion, rng);
            self.backend.set_marker_position(marker.handle(), next)?;
            marker.set_position(next);
        }
        self.ticks += 1;
        let max_drift = self
            .markers
            .iter()
            .map(|m| m.drift_m())
            .fold(0.0_f64, f64::max);
        self.events.emit(
            self.clock,
            "motion.tick",
            format!(
                "tick={} markers={} max_drift={:.1}m",
                self.ticks,
                self.markers.len(),
                max_drift
            ),
        );
        Ok(self.markers.len())
    }

    /// Registers the repeating motion task on `timers`.
    ///
    /// A previously started task is stopped first, so at most one is live.
    pub fn start_motion(&mut self, timers: &mut TimerQueue) -> TaskHandle {
        self.stop_motion();
        let handle = timers.every("motion", self.config.motion.interval_ms);
        self.motion = Some(handle.clone());
        handle
    }

    /// Returns `true` if a running task was stopped.
    pub fn stop_motion(&mut self) -> bool {
        let Some(handle) = self.motion.take() else {
            return false;
        };
        let was_running = !handle.is_stopped();
        handle.stop();
        if was_running {
            self.events
                .emit(self.clock, "motion.stopped", format!("after {} ticks", self.ticks));
        }
        was_running
    }

    pub fn is_moving(&self) -> bool {
        self.motion.as_ref().is_some_and(|h| !h.is_stopped())
    }

    /// Applies `firing` if it belongs to this map's motion task.
    pub fn on_firing<R: Rng + ?Sized>(
        &mut self,
        firing: &Firing,
        rng: &mut R,
    ) -> Result<bool, TrackerError> {
        let ours = self
            .motion
            .as_ref()
            .is_some_and(|h| !h.is_stopped() && h.id() == firing.task);
        if !ours {
            return Ok(false);
        }
        self.clock = firing.at;
        self.tick(rng)?;
        Ok(true)
    }

    /// Advances `timers` to `until`, ticking for every motion firing on the
    /// way. Firings of other tasks are consumed and ignored. Returns the number
    /// of ticks applied.
    pub fn run_until<R: Rng + ?Sized>(
        &mut self,
        timers: &mut TimerQueue,
        until: Time,
        rng: &mut R,
    ) -> Result<u64, TrackerError> {
        let mut ran = 0;
        while let Some(firing) = timers.pop_due(until) {
            if self.on_firing(&firing, rng)? {
                ran += 1;
            }
        }
        self.clock = self.clock.max(until);
        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use super::LiveMap;
    use crate::backend::{InMemoryMap, MapBackend, MapCall};
    use crate::config::{CoordinatePolicy, MapConfig, MotionConfig};
    use crate::error::TrackerError;
    use crate::stops::StopItem;
    use foundation::ids::MarkerId;
    use foundation::latlng::LatLng;
    use foundation::time::Time;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use runtime::scheduler::TimerQueue;

    const JITTER: f64 = 0.00075;
    // Adding the offset in `LatLng::offset` can round the observed delta just past JITTER.
    const EPS: f64 = 1e-12;

    fn three_stops() -> Vec<StopItem> {
        vec![
            StopItem::new("28.70", "77.10", "Route 5"),
            StopItem::new("28.61", "77.21", "Route 9"),
            StopItem::new("28.53", "77.39", "Route 12"),
        ]
    }

    fn live(items: &[StopItem]) -> LiveMap<InMemoryMap> {
        LiveMap::init(InMemoryMap::new(), MapConfig::default(), items).unwrap()
    }

    #[test]
    fn init_calls_the_backend_in_order() {
        let map = live(&[StopItem::new("28.70", "77.10", "Route 5")]);
        let cfg = MapConfig::default();
        assert_eq!(
            map.backend().calls(),
            &[
                MapCall::CreateView {
                    center: LatLng::new(28.7041, 77.1025),
                    zoom: 13.0
                },
                MapCall::AddTileLayer {
                    url_template: cfg.tiles.url_template.clone(),
                    max_zoom: 19
                },
                MapCall::CreateMarker {
                    marker: 0,
                    at: LatLng::new(28.70, 77.10)
                },
                MapCall::AddToMap { marker: 0 },
                MapCall::BindPopup {
                    marker: 0,
                    text: "Route 5".to_string()
                },
            ]
        );
        assert_eq!(map.backend().tile_layers()[0].attribution, "© OpenStreetMap");
    }

    #[test]
    fn missing_mount_point_is_inert() {
        let out = LiveMap::mount(false, InMemoryMap::new(), MapConfig::default(), &three_stops())
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn one_marker_per_stop_item() {
        let map = live(&three_stops());
        assert_eq!(map.marker_count(), 3);
        assert_eq!(map.backend().markers().len(), 3);
        assert!(map.backend().markers().iter().all(|m| m.on_map));
    }

    #[test]
    fn empty_list_places_no_markers() {
        let map = live(&[]);
        assert_eq!(map.marker_count(), 0);
        assert_eq!(map.view().zoom, 13.0);
    }

    #[test]
    fn popups_match_item_text_and_survive_ticks() {
        let mut map = live(&three_stops());
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..20 {
            map.tick(&mut rng).unwrap();
        }
        let popups: Vec<_> = map.markers().iter().map(|m| m.popup().to_string()).collect();
        assert_eq!(popups, vec!["Route 5", "Route 9", "Route 12"]);
        let bound: Vec<_> = map
            .backend()
            .markers()
            .iter()
            .map(|m| m.popup.clone().unwrap())
            .collect();
        assert_eq!(bound, popups);
    }

    #[test]
    fn one_tick_moves_each_axis_by_less_than_the_jitter() {
        let mut map = live(&three_stops());
        let before: Vec<LatLng> = map.markers().iter().map(|m| m.position()).collect();
        let mut rng = SmallRng::seed_from_u64(9);
        assert_eq!(map.tick(&mut rng).unwrap(), 3);

        for (marker, prev) in map.markers().iter().zip(&before) {
            let now = marker.position();
            assert_ne!(now, *prev);
            assert!((now.lat - prev.lat).abs() < JITTER + EPS);
            assert!((now.lng - prev.lng).abs() < JITTER + EPS);
            assert_eq!(map.backend().marker_position(marker.handle()), now);
        }
    }

    #[test]
    fn focus_uses_original_coordinate_after_drift() {
        let mut map = live(&three_stops());
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..50 {
            map.tick(&mut rng).unwrap();
        }
        let drifted = map.marker(MarkerId::new(1)).unwrap().position();
        assert_ne!(drifted, LatLng::new(28.61, 77.21));

        map.focus(MarkerId::new(1)).unwrap();
        assert_eq!(map.view().center, LatLng::new(28.61, 77.21));
        assert_eq!(map.view().zoom, 15.0);
        assert_eq!(
            map.backend().calls().last(),
            Some(&MapCall::OpenPopup { marker: 1 })
        );
        assert_eq!(
            map.backend().view(),
            Some((LatLng::new(28.61, 77.21), 15.0))
        );
        assert!(map.backend().calls().contains(&MapCall::SetView {
            center: LatLng::new(28.61, 77.21),
            zoom: 15.0,
            animate: true
        }));
        // Focus re-centers the view; it does not move the marker.
        assert_eq!(map.marker(MarkerId::new(1)).unwrap().position(), drifted);
    }

    #[test]
    fn focus_unknown_marker_fails() {
        let mut map = live(&three_stops());
        assert_eq!(
            map.focus(MarkerId::new(3)),
            Err(TrackerError::UnknownMarker(MarkerId::new(3)))
        );
    }

    #[test]
    fn ticks_never_touch_the_view() {
        let mut map = live(&three_stops());
        map.focus(MarkerId::new(0)).unwrap();
        let view = map.view();
        let mut rng = SmallRng::seed_from_u64(1);
        map.tick(&mut rng).unwrap();
        assert_eq!(map.view(), view);
        assert_eq!(map.backend().view(), Some((view.center, view.zoom)));
    }

    #[test]
    fn route_5_scenario() {
        let items = vec![StopItem::new("28.70", "77.10", "Route 5")];
        let mut map = live(&items);
        assert_eq!(map.marker_count(), 1);
        let m = &map.markers()[0];
        assert_eq!(m.position(), LatLng::new(28.70, 77.10));
        assert_eq!(m.popup(), "Route 5");

        let mut timers = TimerQueue::new();
        let mut rng = SmallRng::seed_from_u64(2024);
        map.start_motion(&mut timers);
        assert_eq!(map.run_until(&mut timers, Time(2999), &mut rng).unwrap(), 0);
        assert_eq!(map.markers()[0].position(), LatLng::new(28.70, 77.10));

        assert_eq!(map.run_until(&mut timers, Time(3000), &mut rng).unwrap(), 1);
        let p = map.markers()[0].position();
        assert_ne!(p, LatLng::new(28.70, 77.10));
        assert!(p.max_axis_delta(&LatLng::new(28.70, 77.10)) < JITTER + EPS);
    }

    #[test]
    fn stopping_motion_halts_ticks() {
        let mut map = live(&three_stops());
        let mut timers = TimerQueue::new();
        let mut rng = SmallRng::seed_from_u64(8);
        let handle = map.start_motion(&mut timers);
        assert!(map.is_moving());

        assert_eq!(map.run_until(&mut timers, Time(9000), &mut rng).unwrap(), 3);
        handle.stop();
        assert!(!map.is_moving());
        let frozen: Vec<LatLng> = map.markers().iter().map(|m| m.position()).collect();
        assert_eq!(map.run_until(&mut timers, Time(60_000), &mut rng).unwrap(), 0);
        let after: Vec<LatLng> = map.markers().iter().map(|m| m.position()).collect();
        assert_eq!(after, frozen);
        assert_eq!(map.ticks(), 3);
    }

    #[test]
    fn restarting_motion_replaces_the_old_task() {
        let mut map = live(&three_stops());
        let mut timers = TimerQueue::new();
        let mut rng = SmallRng::seed_from_u64(8);
        let first = map.start_motion(&mut timers);
        map.start_motion(&mut timers);
        assert!(first.is_stopped());
        assert_eq!(timers.active_count(), 1);
        assert_eq!(map.run_until(&mut timers, Time(3000), &mut rng).unwrap(), 1);
        assert!(map.stop_motion());
        assert!(!map.stop_motion());
        assert_eq!(map.events().iter().filter(|e| e.kind == "motion.stopped").count(), 2);
    }

    #[test]
    fn foreign_firings_are_ignored() {
        let mut map = live(&three_stops());
        let mut timers = TimerQueue::new();
        let mut rng = SmallRng::seed_from_u64(8);
        timers.every("other", 1000);
        map.start_motion(&mut timers);
        assert_eq!(map.run_until(&mut timers, Time(6000), &mut rng).unwrap(), 2);
    }

    #[test]
    fn invalid_stops_follow_the_policy() {
        let items = vec![
            StopItem::new("north", "77.10", "Broken"),
            StopItem::new("28.70", "77.10", "Fine"),
        ];

        let map = live(&items);
        assert_eq!(map.marker_count(), 1);
        assert_eq!(map.markers()[0].popup(), "Fine");
        assert_eq!(map.markers()[0].source_index(), 1);
        assert_eq!(map.events().iter().filter(|e| e.kind == "stop.invalid").count(), 1);

        let cfg = MapConfig {
            coordinate_policy: CoordinatePolicy::PassThrough,
            ..MapConfig::default()
        };
        let map = LiveMap::init(InMemoryMap::new(), cfg, &items).unwrap();
        assert_eq!(map.marker_count(), 2);
        assert!(map.markers()[0].position().lat.is_nan());

        let cfg = MapConfig {
            coordinate_policy: CoordinatePolicy::Reject,
            ..MapConfig::default()
        };
        assert!(matches!(
            LiveMap::init(InMemoryMap::new(), cfg, &items),
            Err(TrackerError::InvalidCoordinate { index: 0, .. })
        ));
    }

    #[test]
    fn skipped_items_get_no_click_binding() {
        let items = vec![
            StopItem::new("", "77.10", "Broken"),
            StopItem::new("28.61", "77.21", "Route 9"),
            StopItem::new("28.53", "77.39", "Route 12"),
        ];
        let mut map = live(&items);
        let bindings = map.click_bindings();
        assert_eq!(bindings, vec![(1, MarkerId::new(0)), (2, MarkerId::new(1))]);

        // Clicking item 1 focuses the marker built from item 1.
        let (_, id) = bindings[0];
        map.focus(id).unwrap();
        assert_eq!(map.view().center, LatLng::new(28.61, 77.21));
        assert_eq!(map.marker(id).unwrap().popup(), "Route 9");

        let (_, id) = bindings[1];
        map.focus(id).unwrap();
        assert_eq!(map.view().center, LatLng::new(28.53, 77.39));
    }

    #[test]
    fn nan_marker_keeps_ticking_without_panicking() {
        let items = vec![StopItem::new("", "", "Ghost")];
        let cfg = MapConfig {
            motion: MotionConfig {
                max_drift_deg: Some(0.01),
                ..MotionConfig::default()
            },
            coordinate_policy: CoordinatePolicy::PassThrough,
            ..MapConfig::default()
        };
        let mut map = LiveMap::init(InMemoryMap::new(), cfg, &items).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        map.tick(&mut rng).unwrap();
        assert!(!map.markers()[0].position().is_finite());
    }

    #[test]
    fn invalid_config_is_rejected_before_touching_the_backend() {
        let cfg = MapConfig {
            mount_id: String::new(),
            ..MapConfig::default()
        };
        assert!(matches!(
            LiveMap::init(InMemoryMap::new(), cfg, &three_stops()),
            Err(TrackerError::Config(_))
        ));
    }
}
