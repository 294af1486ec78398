use foundation::ids::MarkerId;
use foundation::latlng::LatLng;
use foundation::math::haversine_m;

/// A stop's marker on the live map.
///
/// `origin` and `popup` are fixed at creation; only `position` moves.
#[derive(Debug, Clone)]
pub struct Marker<H> {
    id: MarkerId,
    handle: H,
    origin: LatLng,
    position: LatLng,
    popup: String,
    source_index: usize,
}

impl<H> Marker<H> {
    pub(crate) fn new(
        id: MarkerId,
        handle: H,
        origin: LatLng,
        popup: String,
        source_index: usize,
    ) -> Self {
        Self {
            id,
            handle,
            origin,
            position: origin,
            popup,
            source_index,
        }
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Coordinate of the stop this marker was created for.
    pub fn origin(&self) -> LatLng {
        self.origin
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    /// Great-circle distance from the stop, in meters.
    pub fn drift_m(&self) -> f64 {
        haversine_m(self.origin, self.position)
    }

    pub fn popup(&self) -> &str {
        &self.popup
    }

    /// Index of the stop item this marker came from, in document order.
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    pub(crate) fn set_position(&mut self, at: LatLng) {
        self.position = at;
    }
}

#[cfg(test)]
mod tests {
    use super::Marker;
    use foundation::ids::MarkerId;
    use foundation::latlng::LatLng;

    #[test]
    fn drift_is_zero_until_moved() {
        let mut m = Marker::new(MarkerId::new(0), (), LatLng::new(28.70, 77.10), "Route 5".into(), 0);
        assert_eq!(m.drift_m(), 0.0);

        // 0.001 deg of latitude is roughly 111 m anywhere on the globe.
        m.set_position(LatLng::new(28.701, 77.10));
        assert!((m.drift_m() - 111.2).abs() < 0.5, "{}", m.drift_m());
    }
}
