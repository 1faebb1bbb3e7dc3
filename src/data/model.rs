use crate::geo::{Bounds, Ring};

/// Index of a parcel within its [`Dataset`]. Only ever handed out by the
/// dataset itself, so it stays valid for the dataset's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub(crate) usize);

impl FeatureId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Precomputed per-property fields from the `properties` bag.
///
/// Numeric fields are `None` when absent, null or not a number.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParcelProperties {
    pub label: String,
    pub land_value_per_m2: Option<f64>,
    pub area: Option<f64>,
    pub land_value_combined: Option<f64>,
    pub building_value_combined: Option<f64>,
    /// LVT equivalent of the council tax, per year
    pub council_tax_amount: Option<f64>,
    /// LVT equivalent of the LBTT
    pub lbtt_amount: Option<f64>,
}

/// One land parcel
#[derive(Clone, Debug)]
pub struct Parcel {
    pub properties: ParcelProperties,
    /// Every ring of every polygon, exterior and holes alike (even-odd fill)
    pub rings: Vec<Ring>,
    pub bounds: Option<Bounds>,
}

impl Parcel {
    pub fn new(properties: ParcelProperties, rings: Vec<Ring>) -> Self {
        let bounds = Bounds::of_rings(&rings);
        Self {
            properties,
            rings,
            bounds,
        }
    }

    pub fn has_geometry(&self) -> bool {
        self.bounds.is_some()
    }
}

/// The parcels in source order. Never mutated after loading.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    parcels: Vec<Parcel>,
}

impl Dataset {
    pub fn new(parcels: Vec<Parcel>) -> Self {
        Self { parcels }
    }

    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }

    pub fn get(&self, id: FeatureId) -> Option<&Parcel> {
        self.parcels.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &Parcel)> + '_ {
        self.parcels.iter().enumerate().map(|(i, p)| (FeatureId(i), p))
    }

    /// Union of all parcel bounds
    pub fn bounds(&self) -> Option<Bounds> {
        self.parcels
            .iter()
            .filter_map(|p| p.bounds)
            .reduce(Bounds::union)
    }

    /// Case-insensitive label lookup: an exact match wins, otherwise the
    /// first parcel whose label starts with the query.
    pub fn find_by_label(&self, query: &str) -> Option<FeatureId> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        let labels = || {
            self.parcels
                .iter()
                .enumerate()
                .map(|(i, p)| (i, p.properties.label.to_lowercase()))
        };
        labels()
            .find(|(_, label)| *label == query)
            .or_else(|| labels().find(|(_, label)| label.starts_with(&query)))
            .map(|(i, _)| FeatureId(i))
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::compute(self)
    }
}

/// Min / mean / max summary over one numeric field, ignoring missing values
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        (count > 0).then(|| Summary {
            count,
            mean: sum / count as f64,
            min,
            max,
        })
    }
}

/// Whole-dataset figures shown in the information panel
#[derive(Clone, Debug, PartialEq)]
pub struct Statistics {
    pub total_properties: usize,
    pub land_value: Option<Summary>,
    pub building_value: Option<Summary>,
    pub council_tax: Option<Summary>,
    pub lbtt: Option<Summary>,
}

impl Statistics {
    pub fn compute(dataset: &Dataset) -> Self {
        let field = |f: fn(&ParcelProperties) -> Option<f64>| {
            Summary::of(dataset.parcels.iter().filter_map(move |p| f(&p.properties)))
        };
        Self {
            total_properties: dataset.len(),
            land_value: field(|p| p.land_value_combined),
            building_value: field(|p| p.building_value_combined),
            council_tax: field(|p| p.council_tax_amount),
            lbtt: field(|p| p.lbtt_amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel(label: &str, land: Option<f64>, ct: Option<f64>) -> Parcel {
        Parcel::new(
            ParcelProperties {
                label: label.to_string(),
                land_value_combined: land,
                council_tax_amount: ct,
                ..Default::default()
            },
            vec![vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]],
        )
    }

    #[test]
    fn test_find_by_label() {
        let ds = Dataset::new(vec![
            parcel("SCT0007216800", None, None),
            parcel("SCT0007", None, None),
            parcel("ABN0001", None, None),
        ]);
        assert_eq!(ds.find_by_label("sct0007"), Some(FeatureId(1)));
        assert_eq!(ds.find_by_label("SCT00072"), Some(FeatureId(0)));
        assert_eq!(ds.find_by_label(" abn "), Some(FeatureId(2)));
        assert_eq!(ds.find_by_label("XYZ"), None);
        assert_eq!(ds.find_by_label("  "), None);
    }

    #[test]
    fn test_statistics_skip_missing() {
        let ds = Dataset::new(vec![
            parcel("a", Some(100.0), Some(10.0)),
            parcel("b", Some(300.0), None),
            parcel("c", None, Some(30.0)),
        ]);
        let stats = ds.statistics();
        assert_eq!(stats.total_properties, 3);
        let land = stats.land_value.unwrap();
        assert_eq!((land.count, land.mean, land.min, land.max), (2, 200.0, 100.0, 300.0));
        let ct = stats.council_tax.unwrap();
        assert_eq!((ct.count, ct.mean), (2, 20.0));
        assert!(stats.lbtt.is_none());
    }

    #[test]
    fn test_bounds_skip_empty_geometry() {
        let ds = Dataset::new(vec![
            parcel("a", None, None),
            Parcel::new(ParcelProperties::default(), Vec::new()),
        ]);
        let b = ds.bounds().unwrap();
        assert_eq!((b.min_lon, b.max_lat), (0.0, 1.0));
        assert!(!ds.get(FeatureId(1)).unwrap().has_geometry());
    }
}
