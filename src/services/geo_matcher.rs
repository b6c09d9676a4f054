//! GeoMatcher
//!
//! Distancia de gran círculo (haversine, esfera de 6371 km) y búsqueda de
//! candidatos en un radio: prefiltro por caja envolvente corregida por
//! `cos(lat)` y refinamiento exacto con orden estable por distancia.

use serde::Serialize;

use crate::models::{Location, Partner, Request};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilómetros por grado de latitud usados por el prefiltro
pub const KM_PER_DEGREE: f64 = 111.0;

pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// Entidades con una ubicación opcional que pueden participar en el matching
pub trait Locatable {
    fn location(&self) -> Option<Location>;
}

impl Locatable for Partner {
    fn location(&self) -> Option<Location> {
        self.location
    }
}

impl Locatable for Request {
    fn location(&self) -> Option<Location> {
        Some(self.location)
    }
}

impl Locatable for Location {
    fn location(&self) -> Option<Location> {
        Some(*self)
    }
}

/// Distancia haversine en kilómetros
pub fn distance(a: Location, b: Location) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    // `h` puede exceder 1.0 por redondeo en puntos antipodales
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_RADIUS_KM * c
}

/// Caja envolvente en grados alrededor de un origen
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    /// La caja cruza el antimeridiano: el rango válido es
    /// `lng >= min_lng || lng <= max_lng`
    pub wraps: bool,
}

impl BoundingBox {
    pub fn around(origin: Location, radius_km: f64) -> Self {
        let lat_delta = radius_km / KM_PER_DEGREE;
        let min_lat = (origin.latitude - lat_delta).max(-90.0);
        let max_lat = (origin.latitude + lat_delta).min(90.0);

        let cos_lat = origin.latitude.to_radians().cos();
        let lng_delta = if cos_lat <= f64::EPSILON {
            f64::INFINITY
        } else {
            let approx = radius_km / (KM_PER_DEGREE * cos_lat);
            // extensión real del círculo: asin(sin(r/R) / cos φ). Con radios
            // grandes a latitudes altas supera a la aproximación lineal.
            let ratio = (radius_km / EARTH_RADIUS_KM)
                .min(std::f64::consts::FRAC_PI_2)
                .sin()
                / cos_lat;
            if ratio >= 1.0 {
                f64::INFINITY
            } else {
                approx.max(ratio.asin().to_degrees())
            }
        };

        // Cerca de los polos o con radios enormes la caja cubre todas las longitudes
        if lng_delta >= 180.0 || min_lat <= -90.0 || max_lat >= 90.0 {
            return Self {
                min_lat,
                max_lat,
                min_lng: -180.0,
                max_lng: 180.0,
                wraps: false,
            };
        }

        let mut min_lng = origin.longitude - lng_delta;
        let mut max_lng = origin.longitude + lng_delta;
        let mut wraps = false;
        if min_lng < -180.0 {
            min_lng += 360.0;
            wraps = true;
        } else if max_lng > 180.0 {
            max_lng -= 360.0;
            wraps = true;
        }

        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
            wraps,
        }
    }

    pub fn contains(&self, location: Location) -> bool {
        let lat_ok = location.latitude >= self.min_lat && location.latitude <= self.max_lat;
        let lng_ok = if self.wraps {
            location.longitude >= self.min_lng || location.longitude <= self.max_lng
        } else {
            location.longitude >= self.min_lng && location.longitude <= self.max_lng
        };
        lat_ok && lng_ok
    }
}

/// Candidato dentro del radio con su distancia al origen
#[derive(Debug, Clone, PartialEq)]
pub struct Match<T> {
    pub item: T,
    pub distance_km: f64,
}

/// Filtrar y ordenar candidatos dentro de `radius_km` (más cercano primero).
///
/// Los candidatos sin ubicación se descartan. El orden es estable: a igual
/// distancia se conserva el orden de entrada.
pub fn find_nearby<T, I>(origin: Location, radius_km: f64, candidates: I) -> Vec<Match<T>>
where
    T: Locatable,
    I: IntoIterator<Item = T>,
{
    let bbox = BoundingBox::around(origin, radius_km);

    let mut matches: Vec<Match<T>> = candidates
        .into_iter()
        .filter_map(|item| {
            let location = item.location()?;
            if !bbox.contains(location) {
                return None;
            }
            let distance_km = distance(origin, location);
            (distance_km <= radius_km).then_some(Match { item, distance_km })
        })
        .collect();

    // sort_by es estable
    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const ALGIERS: Location = Location {
        latitude: 36.75,
        longitude: 3.06,
    };

    /// Punto desplazado `km` kilómetros al norte del origen
    fn north_of(origin: Location, km: f64) -> Location {
        Location::new(origin.latitude + (km / EARTH_RADIUS_KM).to_degrees(), origin.longitude)
    }

    fn partner_at(location: Option<Location>) -> Partner {
        let mut partner = Partner::new(Uuid::new_v4(), 1);
        partner.is_available = true;
        partner.location = location;
        partner
    }

    #[test]
    fn test_distance_identity_and_symmetry() {
        let samples = [
            ALGIERS,
            Location::new(48.8566, 2.3522),
            Location::new(-33.8688, 151.2093),
            Location::new(0.0, 179.9),
            Location::new(0.0, -179.9),
            Location::new(89.9, 0.0),
        ];

        for a in samples {
            assert_eq!(distance(a, a), 0.0);
            for b in samples {
                assert!((distance(a, b) - distance(b, a)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_distance_known_value() {
        // Argel - París ~ 1344 km
        let d = distance(ALGIERS, Location::new(48.8566, 2.3522));
        assert!((d - 1344.0).abs() < 10.0, "distance was {}", d);

        let d = distance(ALGIERS, north_of(ALGIERS, 5.0));
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_find_nearby_keeps_only_within_radius() {
        let p = partner_at(Some(north_of(ALGIERS, 5.0)));
        let q = partner_at(Some(north_of(ALGIERS, 20.0)));

        let result = find_nearby(ALGIERS, 10.0, vec![p.clone(), q]);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].item.id, p.id);
        assert!((result[0].distance_km - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_find_nearby_sorted_and_excludes_missing_location() {
        let far = partner_at(Some(north_of(ALGIERS, 8.0)));
        let none = partner_at(None);
        let near = partner_at(Some(north_of(ALGIERS, 1.0)));
        let mid = partner_at(Some(Location::new(ALGIERS.latitude, ALGIERS.longitude + 0.05)));

        let result = find_nearby(ALGIERS, 50.0, vec![far.clone(), none, near.clone(), mid.clone()]);
        let ids: Vec<Uuid> = result.iter().map(|m| m.item.id).collect();

        assert_eq!(ids, vec![near.id, mid.id, far.id]);
        assert!(result.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
        assert!(result.iter().all(|m| m.distance_km <= 50.0));
    }

    #[test]
    fn test_find_nearby_stable_on_ties() {
        let spot = north_of(ALGIERS, 3.0);
        let first = partner_at(Some(spot));
        let second = partner_at(Some(spot));

        let result = find_nearby(ALGIERS, 10.0, vec![first.clone(), second.clone()]);
        assert_eq!(result[0].item.id, first.id);
        assert_eq!(result[1].item.id, second.id);
    }

    #[test]
    fn test_bounding_box_longitude_is_cosine_corrected() {
        let bbox = BoundingBox::around(Location::new(60.0, 10.0), 111.0);
        // cos(60°) = 0.5 -> ±2 grados de longitud
        assert!((bbox.max_lng - 12.0).abs() < 1e-9);
        assert!((bbox.min_lng - 8.0).abs() < 1e-9);
        assert!((bbox.max_lat - 61.0).abs() < 1e-9);

        // Un punto a 1.5° de longitud (≈83 km) queda dentro de la caja y del radio
        let east = Location::new(60.0, 11.5);
        assert!(bbox.contains(east));
        assert_eq!(find_nearby(Location::new(60.0, 10.0), 111.0, vec![east]).len(), 1);
    }

    #[test]
    fn test_bounding_box_keeps_circle_edge_at_high_latitude() {
        let origin = Location::new(60.0, 0.0);
        // punto de máxima longitud del círculo de 999 km: 61.2566°N, 18.1994°E
        let edge = Location::new(61.256_618_76, 18.199_400_09);
        assert!(distance(origin, edge) < 1000.0);
        assert!(edge.longitude > 1000.0 / (KM_PER_DEGREE * 0.5));

        let bbox = BoundingBox::around(origin, 1000.0);
        assert!(bbox.contains(edge));
        assert!((bbox.max_lng - 18.2181).abs() < 1e-3);
        assert_eq!(find_nearby(origin, 1000.0, vec![edge]).len(), 1);
    }

    #[test]
    fn test_bounding_box_wraps_antimeridian() {
        let origin = Location::new(0.0, 179.95);
        let across = Location::new(0.0, -179.95);

        let bbox = BoundingBox::around(origin, 50.0);
        assert!(bbox.wraps);
        assert!(bbox.contains(across));

        let result = find_nearby(origin, 50.0, vec![across]);
        assert_eq!(result.len(), 1);
        assert!(result[0].distance_km < 12.0);
    }

    #[test]
    fn test_bounding_box_near_pole_covers_all_longitudes() {
        let bbox = BoundingBox::around(Location::new(89.9, 0.0), 50.0);
        assert_eq!(bbox.min_lng, -180.0);
        assert_eq!(bbox.max_lng, 180.0);
        assert!(bbox.contains(Location::new(89.95, 170.0)));
    }
}
