use geo::{HaversineDistance, Point};

use crate::models::{BoundingBox, Coordinates};

/// Great-circle distance between two points in kilometers
#[inline]
pub fn haversine_distance(from: Coordinates, to: Coordinates) -> f64 {
    let a = Point::new(from.longitude, from.latitude);
    let b = Point::new(to.longitude, to.latitude);

    a.haversine_distance(&b) / 1000.0
}

/// Calculate a bounding box around a center point
///
/// Cheaper than Haversine for pre-filtering.
/// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude)
pub fn calculate_bounding_box(center: Coordinates, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / 111.0;

    // Near the poles every longitude qualifies
    let cos_lat = center.latitude.to_radians().cos().abs();
    let lon_delta = if cos_lat < 1e-6 || center.latitude.abs() + lat_delta >= 90.0 {
        180.0
    } else {
        radius_km / (111.0 * cos_lat)
    };

    BoundingBox {
        min_lat: center.latitude - lat_delta,
        max_lat: center.latitude + lat_delta,
        min_lon: center.longitude - lon_delta,
        max_lon: center.longitude + lon_delta,
    }
}

/// Check if a point is within a bounding box
///
/// Longitude bounds past ±180 wrap around the antimeridian.
#[inline]
pub fn is_within_bounding_box(point: Coordinates, bbox: &BoundingBox) -> bool {
    if point.latitude < bbox.min_lat || point.latitude > bbox.max_lat {
        return false;
    }

    let lon = point.longitude;
    if bbox.max_lon - bbox.min_lon >= 360.0 {
        true
    } else if bbox.min_lon < -180.0 {
        lon >= bbox.min_lon + 360.0 || lon <= bbox.max_lon
    } else if bbox.max_lon > 180.0 {
        lon >= bbox.min_lon || lon <= bbox.max_lon - 360.0
    } else {
        lon >= bbox.min_lon && lon <= bbox.max_lon
    }
}
