//! Batch-level normalization and ordering of assembled fires.

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;

use crate::record::{FireRecord, round_to};

/// The sorted, normalized output of a run.
///
/// Serializes as a GeoJSON `FeatureCollection` of `Point` features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<FireRecord>,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Normalize acreage across the batch and order by ignition date.
///
/// `relative_area` is `(acres - min) / (max - min)` rounded to five
/// decimals. When every record has the same acreage the range is empty and
/// `relative_area` is 0 for all of them. Records sharing an ignition date
/// keep their input order.
pub fn aggregate(mut records: Vec<FireRecord>) -> FeatureCollection {
    let Some((min_acres, max_acres)) = acre_range(&records) else {
        return FeatureCollection::default();
    };

    let range = max_acres - min_acres;
    for record in &mut records {
        record.relative_area = if range > 0.0 {
            round_to((record.acres - min_acres) / range, 5)
        } else {
            0.0
        };
    }

    records.sort_by_key(|record| record.ignition_date);
    debug!(
        features = records.len(),
        min_acres, max_acres, "Aggregated collection"
    );

    FeatureCollection { features: records }
}

fn acre_range(records: &[FireRecord]) -> Option<(f64, f64)> {
    records.iter().fold(None, |range, record| match range {
        None => Some((record.acres, record.acres)),
        Some((min, max)) => Some((min.min(record.acres), max.max(record.acres))),
    })
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let features: Vec<Feature<'_>> = self.features.iter().map(Feature).collect();
        let mut state = serializer.serialize_struct("FeatureCollection", 2)?;
        state.serialize_field("type", "FeatureCollection")?;
        state.serialize_field("features", &features)?;
        state.end()
    }
}

struct Feature<'a>(&'a FireRecord);

#[derive(serde::Serialize)]
struct Point<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: &'a [f64; 2],
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Properties<'a> {
    id: &'a str,
    name: &'a str,
    hydrologic_unit: &'a str,
    acres: f64,
    ignition_date: NaiveDate,
    severity_acres: &'a [f64; 6],
    forest_acres: f64,
    auxiliary_ref: Option<&'a str>,
    relative_area: f64,
}

impl Serialize for Feature<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.0;
        let mut state = serializer.serialize_struct("Feature", 3)?;
        state.serialize_field("type", "Feature")?;
        state.serialize_field(
            "geometry",
            &Point {
                kind: "Point",
                coordinates: &record.coordinates,
            },
        )?;
        state.serialize_field(
            "properties",
            &Properties {
                id: &record.id,
                name: &record.name,
                hydrologic_unit: &record.hydrologic_unit,
                acres: record.acres,
                ignition_date: record.ignition_date,
                severity_acres: &record.severity_acres,
                forest_acres: record.forest_acres,
                auxiliary_ref: record.auxiliary_ref.as_deref(),
                relative_area: record.relative_area,
            },
        )?;
        state.end()
    }
}
