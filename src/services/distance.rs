//! Great-circle distance (haversine)

use crate::domain::types::Coordinate;

/// Mean Earth radius used for all distances
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres to statute miles
pub const KM_TO_MILES: f64 = 0.621371;

/// Great-circle distance between two coordinates in miles
#[inline]
pub fn distance_miles(a: Coordinate, b: Coordinate) -> f64 {
    distance_km(a, b) * KM_TO_MILES
}

/// Great-circle distance between two coordinates in kilometres
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Clamp guards against h drifting just above 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}
