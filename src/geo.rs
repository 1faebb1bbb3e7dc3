/// A closed ring of (lon, lat) coordinates
pub type Ring = Vec<(f64, f64)>;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Axis-aligned lon/lat bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn from_point(lon: f64, lat: f64) -> Self {
        Self {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon,
            max_lat: lat,
        }
    }

    /// Bounds of every coordinate in the rings, `None` if there are none.
    pub fn of_rings<'a>(rings: impl IntoIterator<Item = &'a Ring>) -> Option<Self> {
        rings
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<Bounds>, &(lon, lat)| match acc {
                None => Some(Bounds::from_point(lon, lat)),
                Some(b) => Some(b.extend(lon, lat)),
            })
    }

    pub fn extend(self, lon: f64, lat: f64) -> Self {
        Self {
            min_lon: self.min_lon.min(lon),
            min_lat: self.min_lat.min(lat),
            max_lon: self.max_lon.max(lon),
            max_lat: self.max_lat.max(lat),
        }
    }

    pub fn union(self, other: Bounds) -> Self {
        Self {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        self.contains(other.min_lon, other.min_lat) && self.contains(other.max_lon, other.max_lat)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) * 0.5,
            (self.min_lat + self.max_lat) * 0.5,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_rings() {
        let rings = vec![
            vec![(0.0, 0.0), (2.0, 1.0), (1.0, 3.0)],
            vec![(-1.0, 0.5)],
        ];
        let b = Bounds::of_rings(&rings).unwrap();
        assert_eq!(b, Bounds { min_lon: -1.0, min_lat: 0.0, max_lon: 2.0, max_lat: 3.0 });
        assert!(Bounds::of_rings(&Vec::<Ring>::new()).is_none());
    }

    #[test]
    fn test_union_and_contains() {
        let a = Bounds::from_point(0.0, 0.0);
        let b = Bounds::from_point(4.0, 2.0);
        let u = a.union(b);
        assert!(u.contains_bounds(&a));
        assert!(u.contains_bounds(&b));
        assert_eq!(u.center(), (2.0, 1.0));
        assert!(!u.contains(5.0, 1.0));
    }
}
