//! Distance, bearing and area helpers over latitude/longitude pairs.
//!
//! `polygon_area` and `center_of` are planar approximations on raw degrees.
//! They are only meaningful at field scale (a few kilometers).

use crate::error::{Result, TelemetryError};
use crate::models::path::{Location, PathPoint, Positioned};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Haversine great-circle distance in meters.
pub fn distance<A: Positioned + ?Sized, B: Positioned + ?Sized>(p1: &A, p2: &B) -> f64 {
    let (a, b) = (p1.location(), p2.location());
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial compass bearing from `p1` to `p2`, degrees in [0, 360).
pub fn bearing<A: Positioned + ?Sized, B: Positioned + ?Sized>(p1: &A, p2: &B) -> f64 {
    let (a, b) = (p1.location(), p2.location());
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let x = delta_lon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    let deg = x.atan2(y).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}

/// Sum of consecutive haversine distances, meters.
pub fn path_distance<P: Positioned>(points: &[P]) -> f64 {
    points.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// Shoelace area of a lat/lon polygon in hectares.
pub fn polygon_area<P: Positioned>(vertices: &[P]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }

    let n = vertices.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = vertices[i].location();
        let b = vertices[(i + 1) % n].location();
        area += a.latitude * b.longitude;
        area -= b.latitude * a.longitude;
    }
    let area_deg2 = area.abs() / 2.0;

    let meters_per_degree = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
    area_deg2 * meters_per_degree.powi(2) / SQUARE_METERS_PER_HECTARE
}

/// Ray-casting containment test with latitude as x and longitude as y.
pub fn point_in_polygon<A: Positioned + ?Sized, P: Positioned>(point: &A, polygon: &[P]) -> bool {
    let x = point.location().latitude;
    let y = point.location().longitude;
    let mut inside = false;

    let n = polygon.len();
    if n == 0 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (polygon[i].location().latitude, polygon[i].location().longitude);
        let (xj, yj) = (polygon[j].location().latitude, polygon[j].location().longitude);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Arithmetic mean of the coordinates.
pub fn center_of<P: Positioned>(points: &[P]) -> Result<Location> {
    if points.is_empty() {
        return Err(TelemetryError::EmptyInput("cannot calculate center of empty points"));
    }
    let n = points.len() as f64;
    let (sum_lat, sum_lon) = points.iter().fold((0.0, 0.0), |(lat, lon), p| {
        (lat + p.location().latitude, lon + p.location().longitude)
    });
    Ok(Location::new(sum_lat / n, sum_lon / n))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

pub fn bounds_of<P: Positioned>(points: &[P]) -> Result<Bounds> {
    let first = points
        .first()
        .ok_or(TelemetryError::EmptyInput("cannot calculate bounds of empty points"))?
        .location();
    let init = Bounds {
        north: first.latitude,
        south: first.latitude,
        east: first.longitude,
        west: first.longitude,
    };
    Ok(points.iter().skip(1).fold(init, |b, p| {
        let l = p.location();
        Bounds {
            north: b.north.max(l.latitude),
            south: b.south.min(l.latitude),
            east: b.east.max(l.longitude),
            west: b.west.min(l.longitude),
        }
    }))
}

/// Sliding-window mean. A window larger than the input (or zero) returns the input as is.
pub fn moving_average(values: &[f64], window_size: usize) -> Vec<f64> {
    if window_size == 0 || window_size > values.len() {
        return values.to_vec();
    }
    values
        .windows(window_size)
        .map(|w| w.iter().sum::<f64>() / window_size as f64)
        .collect()
}

/// Mean of the sampled speeds, km/h.
pub fn average_speed(points: &[PathPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| p.speed).sum::<f64>() / points.len() as f64
}

/// Liters per 100 km.
pub fn fuel_per_100km(fuel_consumed: f64, distance_km: f64) -> f64 {
    if distance_km == 0.0 {
        return 0.0;
    }
    fuel_consumed / distance_km * 100.0
}

/// Hectares covered by the working points with an implement of the given width (m).
pub fn area_covered(points: &[PathPoint], implement_width: f64) -> f64 {
    let working: Vec<&PathPoint> = points.iter().filter(|p| p.is_working()).collect();
    if working.len() < 2 {
        return 0.0;
    }
    let meters: f64 = working.windows(2).map(|w| distance(w[0], w[1])).sum();
    meters * implement_width / SQUARE_METERS_PER_HECTARE
}

/// Percentage of `total_hours` spent working.
pub fn utilization(working_hours: f64, total_hours: f64) -> f64 {
    if total_hours == 0.0 {
        return 0.0;
    }
    working_hours / total_hours * 100.0
}

pub const FUEL_WEIGHT: f64 = 0.4;
pub const TIME_WEIGHT: f64 = 0.4;
pub const QUALITY_WEIGHT: f64 = 0.2;

/// Composite 0-100 score with fixed weights.
pub fn efficiency_score(fuel_efficiency: f64, time_efficiency: f64, quality: f64) -> f64 {
    fuel_efficiency * FUEL_WEIGHT + time_efficiency * TIME_WEIGHT + quality * QUALITY_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(lat: f64, lon: f64) -> Location {
        Location::new(lat, lon)
    }

    #[test]
    fn test_distance_identity_and_symmetry() {
        let a = loc(50.45, 30.52);
        let b = loc(50.46, 30.55);
        assert_eq!(distance(&a, &a), 0.0);
        assert_eq!(distance(&a, &b), distance(&b, &a));
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        // 1 degree of arc on a 6371 km sphere
        let d = distance(&loc(0.0, 0.0), &loc(1.0, 0.0));
        assert!((d - 111_194.93).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = loc(0.0, 0.0);
        assert!((bearing(&origin, &loc(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((bearing(&origin, &loc(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(&origin, &loc(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((bearing(&origin, &loc(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_path_distance_short_inputs() {
        assert_eq!(path_distance::<Location>(&[]), 0.0);
        assert_eq!(path_distance(&[loc(1.0, 1.0)]), 0.0);
        let pts = [loc(0.0, 0.0), loc(0.0, 0.01), loc(0.0, 0.02)];
        let expected = distance(&pts[0], &pts[1]) + distance(&pts[1], &pts[2]);
        assert!((path_distance(&pts) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_area_planar_square() {
        let square = [loc(0.0, 0.0), loc(0.0, 0.01), loc(0.01, 0.01), loc(0.01, 0.0)];
        let side = EARTH_RADIUS_M * std::f64::consts::PI / 180.0 * 0.01;
        let expected = side * side / 10_000.0;
        assert!((polygon_area(&square) - expected).abs() < 1e-6);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [loc(0.0, 0.0), loc(0.0, 1.0), loc(1.0, 1.0), loc(1.0, 0.0)];
        assert!(point_in_polygon(&loc(0.5, 0.5), &square));
        assert!(!point_in_polygon(&loc(1.5, 0.5), &square));
        assert!(!point_in_polygon(&loc(0.5, 0.5), &[] as &[Location]));
    }

    #[test]
    fn test_center_and_bounds() {
        let pts = [loc(10.0, 20.0), loc(12.0, 24.0), loc(11.0, 19.0)];
        let center = center_of(&pts).unwrap();
        assert!((center.latitude - 11.0).abs() < 1e-12);
        assert!((center.longitude - 21.0).abs() < 1e-12);

        let b = bounds_of(&pts).unwrap();
        assert_eq!(b, Bounds { north: 12.0, south: 10.0, east: 24.0, west: 19.0 });

        assert!(center_of::<Location>(&[]).is_err());
        assert!(bounds_of::<Location>(&[]).is_err());
    }

    #[test]
    fn test_moving_average() {
        assert_eq!(moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3), vec![2.0, 3.0, 4.0]);
        assert_eq!(moving_average(&[1.0, 2.0], 3), vec![1.0, 2.0]);
        assert_eq!(moving_average(&[4.0, 8.0], 2), vec![6.0]);
    }

    #[test]
    fn test_scalar_helpers() {
        assert_eq!(fuel_per_100km(8.0, 100.0), 8.0);
        assert_eq!(fuel_per_100km(8.0, 0.0), 0.0);
        assert_eq!(utilization(6.0, 8.0), 75.0);
        assert_eq!(utilization(1.0, 0.0), 0.0);
        assert!((efficiency_score(100.0, 50.0, 0.0) - 60.0).abs() < 1e-12);
    }
}
