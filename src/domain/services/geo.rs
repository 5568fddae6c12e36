//! Static place table and great-circle distance.
//!
//! This is not geocoding: a location resolves only if its normalized text is
//! an exact key of the table below.

use crate::domain::entities::GeoPoint;

/// Candidates farther than this from the resolved place are not "nearby".
pub const MATCH_RADIUS_KM: f64 = 10.0;

const EARTH_RADIUS_KM: f64 = 6371.0;

const PLACES: &[(&[&str], f64, f64)] = &[
    (&["tel aviv", "tel-aviv", "tel aviv-yafo", "tel aviv yafo", "תל אביב", "תל אביב-יפו"], 32.0853, 34.7818),
    (&["jerusalem", "ירושלים"], 31.7683, 35.2137),
    (&["haifa", "חיפה"], 32.7940, 34.9896),
    (&["ramat gan", "רמת גן"], 32.0684, 34.8248),
    (&["givatayim", "גבעתיים"], 32.0722, 34.8125),
    (&["bnei brak", "בני ברק"], 32.0807, 34.8338),
    (&["holon", "חולון"], 32.0158, 34.7874),
    (&["bat yam", "בת ים"], 32.0171, 34.7454),
    (&["petah tikva", "petach tikva", "פתח תקווה", "פתח תקוה"], 32.0840, 34.8878),
    (&["rishon lezion", "rishon le zion", "ראשון לציון"], 31.9730, 34.7925),
    (&["herzliya", "הרצליה"], 32.1624, 34.8447),
    (&["ramat hasharon", "רמת השרון"], 32.1461, 34.8394),
    (&["raanana", "ra'anana", "רעננה"], 32.1848, 34.8713),
    (&["kfar saba", "כפר סבא"], 32.1750, 34.9070),
    (&["netanya", "נתניה"], 32.3215, 34.8532),
    (&["ashdod", "אשדוד"], 31.8014, 34.6435),
    (&["beer sheva", "beersheba", "באר שבע"], 31.2518, 34.7913),
    (&["rehovot", "רחובות"], 31.8928, 34.8113),
    (&["modiin", "מודיעין"], 31.8980, 35.0104),
];

/// Lowercases and collapses runs of whitespace.
pub fn normalize_place(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn resolve_place(text: &str) -> Option<GeoPoint> {
    let key = normalize_place(text);
    if key.is_empty() {
        return None;
    }
    PLACES
        .iter()
        .find(|(names, _, _)| names.contains(&key.as_str()))
        .map(|(_, lat, lng)| GeoPoint::new(*lat, *lng))
}

/// Haversine distance in kilometres.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
