//! Average cost (CM) by age band and sex
//!
//! Annual projected cost of a member is `average cost × 12`, with the average
//! taken from this table for the member's age band and sex.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReadjustError, ReadjustResult};

/// The ten canonical age bands of the cost table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBand {
    Age0To18,
    Age19To23,
    Age24To28,
    Age29To33,
    Age34To38,
    Age39To43,
    Age44To48,
    Age49To53,
    Age54To58,
    Age59Plus,
}

impl AgeBand {
    pub const ALL: [AgeBand; 10] = [
        AgeBand::Age0To18,
        AgeBand::Age19To23,
        AgeBand::Age24To28,
        AgeBand::Age29To33,
        AgeBand::Age34To38,
        AgeBand::Age39To43,
        AgeBand::Age44To48,
        AgeBand::Age49To53,
        AgeBand::Age54To58,
        AgeBand::Age59Plus,
    ];

    /// Label used in the cost table ("0-18", ..., "59-999")
    pub fn label(&self) -> &'static str {
        match self {
            AgeBand::Age0To18 => "0-18",
            AgeBand::Age19To23 => "19-23",
            AgeBand::Age24To28 => "24-28",
            AgeBand::Age29To33 => "29-33",
            AgeBand::Age34To38 => "34-38",
            AgeBand::Age39To43 => "39-43",
            AgeBand::Age44To48 => "44-48",
            AgeBand::Age49To53 => "49-53",
            AgeBand::Age54To58 => "54-58",
            AgeBand::Age59Plus => "59-999",
        }
    }

    /// Label used in the member extract ("0 A 18", ..., "ACIMA DE 59")
    pub fn member_label(&self) -> &'static str {
        match self {
            AgeBand::Age0To18 => "0 A 18",
            AgeBand::Age19To23 => "19 A 23",
            AgeBand::Age24To28 => "24 A 28",
            AgeBand::Age29To33 => "29 A 33",
            AgeBand::Age34To38 => "34 A 38",
            AgeBand::Age39To43 => "39 A 43",
            AgeBand::Age44To48 => "44 A 48",
            AgeBand::Age49To53 => "49 A 53",
            AgeBand::Age54To58 => "54 A 58",
            AgeBand::Age59Plus => "ACIMA DE 59",
        }
    }

    pub fn from_label(label: &str) -> Option<AgeBand> {
        let label = label.trim();
        AgeBand::ALL.iter().copied().find(|b| b.label() == label)
    }

    /// Map a free-text member-extract label. Case and surrounding spaces are ignored;
    /// anything else unrecognised is `None` and the row gets dropped.
    pub fn from_member_label(label: &str) -> Option<AgeBand> {
        let label = label.trim().to_uppercase();
        AgeBand::ALL.iter().copied().find(|b| b.member_label() == label)
    }
}

/// Sex as reported in the member extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

impl Sex {
    pub fn from_label(label: &str) -> Sex {
        match label.trim().to_uppercase().as_str() {
            "MASCULINO" => Sex::Male,
            "FEMININO" => Sex::Female,
            _ => Sex::Unknown,
        }
    }
}

/// One band of the cost table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRow {
    pub band: AgeBand,
    pub male: f64,
    pub female: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostTable {
    rows: Vec<CostRow>,
}

impl Default for CostTable {
    fn default() -> Self {
        let male = [350.57, 154.03, 187.26, 219.73, 236.74, 277.15, 353.56, 400.63, 570.91, 1074.40];
        let female = [246.35, 234.78, 335.68, 386.81, 401.83, 457.36, 501.02, 561.06, 615.32, 1058.30];
        Self {
            rows: AgeBand::ALL
                .iter()
                .zip(male.iter().zip(female.iter()))
                .map(|(&band, (&male, &female))| CostRow { band, male, female })
                .collect(),
        }
    }
}

impl CostTable {
    pub fn from_rows(rows: Vec<CostRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CostRow] {
        &self.rows
    }

    /// Monthly average cost for a band. Unknown sex falls into the female column.
    pub fn average_cost(&self, band: AgeBand, sex: Sex) -> Option<f64> {
        self.rows.iter().find(|r| r.band == band).map(|r| match sex {
            Sex::Male => r.male,
            Sex::Female | Sex::Unknown => r.female,
        })
    }

    /// Load an override table from CSV (`faixa_etaria,cm_masculino,cm_feminino`)
    pub fn load_csv(path: &Path) -> ReadjustResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> ReadjustResult<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut rows = Vec::new();

        for result in reader.records() {
            let record = result?;
            let label = record.get(0).unwrap_or("");
            let band = AgeBand::from_label(label).ok_or_else(|| {
                ReadjustError::InvalidReferenceTable(format!("unknown age band '{}'", label))
            })?;
            let male = parse_cost(record.get(1), band)?;
            let female = parse_cost(record.get(2), band)?;
            rows.push(CostRow { band, male, female });
        }

        if let Some(band) = AgeBand::ALL.iter().find(|b| !rows.iter().any(|r| r.band == **b)) {
            return Err(ReadjustError::InvalidReferenceTable(format!(
                "age band '{}' is missing",
                band.label()
            )));
        }

        log::info!("Loaded cost table override with {} bands", rows.len());
        Ok(Self { rows })
    }
}

fn parse_cost(cell: Option<&str>, band: AgeBand) -> ReadjustResult<f64> {
    cell.and_then(crate::table::parse_number).ok_or_else(|| {
        ReadjustError::InvalidReferenceTable(format!("bad average cost for band '{}'", band.label()))
    })
}
