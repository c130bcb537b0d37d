//! Turning one fire's decoded tables into a [`FireRecord`].
//!
//! A bundle contributes two record classes:
//!
//! - `desc`: exactly one row describing the fire (id, name, acreage,
//!   ignition date, burn severity acreages, location)
//! - `rep`: zero or more land-cover rows, each an acreage tagged with a
//!   cover class; only `Forest` rows contribute to [`FireRecord::forest_acres`]

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::catalog::ItemIdentifier;
use crate::dbf::{FieldValue, Row};
use crate::error::{Error, Result, ShapeProblem};

pub const DESCRIPTIVE_CLASS: &str = "desc";
pub const REPRESENTATIVE_CLASS: &str = "rep";

/// Land-cover class counted towards forest acreage
pub const FOREST_CLASS: &str = "Forest";

/// Column names of the descriptive table
mod desc {
    pub const ID: &str = "FIRE_ID";
    pub const NAME: &str = "FIRENAME";
    pub const HYDROLOGIC_UNIT: &str = "HUC4_NAME";
    pub const ACRES: &str = "ACRES";
    pub const YEAR: &str = "YEAR";
    pub const MONTH: &str = "STARTMONTH";
    pub const DAY: &str = "STARTDAY";
    pub const LONGITUDE: &str = "LONG";
    pub const LATITUDE: &str = "LAT";
    /// Unburned-to-low, low, moderate, high, increased greenness, non-mapping
    pub const SEVERITY: [&str; 6] = [
        "UNBURNED",
        "LOW",
        "MODERATE",
        "HIGH",
        "INC_GREEN",
        "NON_MAPPED",
    ];
}

/// Column names of the land-cover table
mod rep {
    pub const CLASS: &str = "LC_TYPE";
    pub const ACRES: &str = "ACRES";
}

/// Decoded rows of one bundle, keyed by class tag
pub type RowSet = BTreeMap<String, Vec<Row>>;

/// One fully assembled fire
#[derive(Debug, Clone, PartialEq)]
pub struct FireRecord {
    pub id: String,
    pub name: String,
    pub hydrologic_unit: String,
    pub acres: f64,
    pub ignition_date: NaiveDate,
    pub severity_acres: [f64; 6],
    pub forest_acres: f64,
    /// Relative path of the exported auxiliary member, if any
    pub auxiliary_ref: Option<String>,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
    /// Acreage normalized against the batch, set during aggregation
    pub relative_area: f64,
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Build a record from a bundle's rows.
///
/// The row set must hold exactly the `desc` and `rep` classes.
pub fn assemble(item: &ItemIdentifier, mut rows: RowSet) -> Result<FireRecord> {
    if let Some(unexpected) = rows
        .keys()
        .find(|class| *class != DESCRIPTIVE_CLASS && *class != REPRESENTATIVE_CLASS)
    {
        return Err(Error::incomplete(
            item,
            unexpected.as_str(),
            ShapeProblem::Unexpected,
        ));
    }

    let desc_rows = rows
        .remove(DESCRIPTIVE_CLASS)
        .ok_or_else(|| missing(item, DESCRIPTIVE_CLASS))?;
    let rep_rows = rows
        .remove(REPRESENTATIVE_CLASS)
        .ok_or_else(|| missing(item, REPRESENTATIVE_CLASS))?;

    let [desc_row] = <[Row; 1]>::try_from(desc_rows).map_err(|rows| {
        Error::malformed(
            item,
            format!("expected one `desc` row, found {}", rows.len()),
        )
    })?;

    let fields = Fields { item, row: &desc_row };

    let year = fields.integer(desc::YEAR)?;
    let month = fields.integer(desc::MONTH)?;
    let day = fields.integer(desc::DAY)?;
    // Table months are 1-based, as NaiveDate expects
    let ignition_date = i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .zip(u32::try_from(day).ok())
        .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
        .ok_or_else(|| {
            Error::malformed(item, format!("invalid ignition date {year}-{month}-{day}"))
        })?;

    let mut severity_acres = [0.0; 6];
    for (slot, column) in severity_acres.iter_mut().zip(desc::SEVERITY) {
        *slot = fields.number(column)?;
    }

    Ok(FireRecord {
        id: fields.text(desc::ID)?,
        name: fields.text(desc::NAME)?,
        hydrologic_unit: fields.text(desc::HYDROLOGIC_UNIT)?,
        acres: fields.number(desc::ACRES)?,
        ignition_date,
        severity_acres,
        forest_acres: forest_acres(item, &rep_rows)?,
        auxiliary_ref: None,
        coordinates: [
            fields.number(desc::LONGITUDE)?,
            fields.number(desc::LATITUDE)?,
        ],
        relative_area: 0.0,
    })
}

/// Sum of `Forest` acreage, rounded to hundredths
fn forest_acres(item: &ItemIdentifier, rows: &[Row]) -> Result<f64> {
    let mut total = 0.0;
    for row in rows {
        let is_forest = row
            .get(rep::CLASS)
            .and_then(FieldValue::as_str)
            .is_some_and(|class| class.trim() == FOREST_CLASS);
        if !is_forest {
            continue;
        }
        total += match row.get(rep::ACRES) {
            None | Some(FieldValue::Null) => 0.0,
            Some(value) => value.as_f64().ok_or_else(|| {
                Error::malformed(item, format!("non-numeric `{}` in rep row", rep::ACRES))
            })?,
        };
    }
    Ok(round_to(total, 2))
}

fn missing(item: &ItemIdentifier, class: &str) -> Error {
    Error::incomplete(item, class, ShapeProblem::Missing)
}

/// Required-field access on the descriptive row
struct Fields<'a> {
    item: &'a ItemIdentifier,
    row: &'a Row,
}

impl Fields<'_> {
    fn value(&self, column: &str) -> Result<&FieldValue> {
        self.row
            .get(column)
            .filter(|value| !value.is_null())
            .ok_or_else(|| Error::malformed(self.item, format!("missing `{column}`")))
    }

    fn text(&self, column: &str) -> Result<String> {
        match self.value(column)? {
            FieldValue::Text(s) => Ok(s.clone()),
            FieldValue::Number(n) => Ok(n.to_string()),
            other => Err(Error::malformed(
                self.item,
                format!("`{column}` is not text: {other:?}"),
            )),
        }
    }

    fn number(&self, column: &str) -> Result<f64> {
        self.value(column)?
            .as_f64()
            .ok_or_else(|| Error::malformed(self.item, format!("`{column}` is not numeric")))
    }

    fn integer(&self, column: &str) -> Result<i64> {
        let n = self.number(column)?;
        if n.fract() != 0.0 {
            return Err(Error::malformed(
                self.item,
                format!("`{column}` is not a whole number: {n}"),
            ));
        }
        Ok(n as i64)
    }
}
