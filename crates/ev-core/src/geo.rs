//! Geographic coordinate type and spatial utilities.
//!
//! `GeoPoint` uses `f64` latitude/longitude.  Signal proximity tests work at
//! the scale of tens of metres and ambulance positions are integrated over
//! thousands of small steps, so single precision would accumulate visible
//! drift.

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Metres per degree of latitude on the mean-radius sphere.
pub const METRES_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Approximate bounding-box check, much cheaper than `distance_m` for
    /// quick rejection.
    #[inline]
    pub fn within_bbox(self, center: GeoPoint, half_deg: f64) -> bool {
        (self.lat - center.lat).abs() <= half_deg
            && (self.lon - center.lon).abs() <= half_deg
    }

    /// Point displaced `north_m` metres north and `east_m` metres east.
    ///
    /// Flat-earth approximation; exact along the equator and along meridians,
    /// which is what synthetic test networks use.
    pub fn offset_m(self, north_m: f64, east_m: f64) -> GeoPoint {
        let d_lat = north_m / METRES_PER_DEGREE;
        let d_lon = east_m / (METRES_PER_DEGREE * self.lat.to_radians().cos());
        GeoPoint::new(self.lat + d_lat, self.lon + d_lon)
    }

    /// Linear interpolation in coordinate space.  `t = 0` is `self`.
    #[inline]
    pub fn lerp(self, other: GeoPoint, t: f64) -> GeoPoint {
        GeoPoint::new(
            self.lat + (other.lat - self.lat) * t,
            self.lon + (other.lon - self.lon) * t,
        )
    }

    /// Position of `self` projected onto the segment `a → b`, as a fraction
    /// of the segment clamped to `[0, 1]`.
    ///
    /// The projection is done in lat/lon space.  A degenerate segment
    /// (`a == b`) gives 0.
    pub fn segment_fraction(self, a: GeoPoint, b: GeoPoint) -> f64 {
        let ab_lat = b.lat - a.lat;
        let ab_lon = b.lon - a.lon;
        let ab2 = ab_lat * ab_lat + ab_lon * ab_lon;
        if ab2 == 0.0 {
            return 0.0;
        }
        let ap_lat = self.lat - a.lat;
        let ap_lon = self.lon - a.lon;
        ((ap_lat * ab_lat + ap_lon * ab_lon) / ab2).clamp(0.0, 1.0)
    }

    /// Minimum distance in metres from `self` to the segment `a → b`.
    ///
    /// Measures with haversine to the clamped projection from
    /// [`segment_fraction`](Self::segment_fraction).  A degenerate segment
    /// measures to `a`.
    pub fn segment_distance_m(self, a: GeoPoint, b: GeoPoint) -> f64 {
        let t = self.segment_fraction(a, b);
        let closest = if t <= 0.0 {
            a
        } else if t >= 1.0 {
            b
        } else {
            a.lerp(b, t)
        };
        self.distance_m(closest)
    }

    /// Move from `self` toward `target` by at most `step_m` metres.
    ///
    /// Returns the new position and whether the target was reached.  When the
    /// remaining distance is `<= step_m` the result snaps exactly to `target`.
    pub fn move_towards(self, target: GeoPoint, step_m: f64) -> (GeoPoint, bool) {
        let remaining = self.distance_m(target);
        if remaining <= step_m {
            return (target, true);
        }
        (self.lerp(target, step_m / remaining), false)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}
