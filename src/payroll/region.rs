use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use super::PayrollError;

/// Government-defined wage zone. Selects the statutory minimum wage floor.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    EnumIter,
    AsRefStr,
    Display,
)]
#[allow(clippy::upper_case_acronyms)]
pub enum Region {
    I,
    II,
    III,
    IV,
}

impl Region {
    /// Parses a region code as typed into a form ("ii", " III ").
    pub fn from_code(code: &str) -> Result<Self, PayrollError> {
        let normalized = code.trim().to_ascii_uppercase();
        Region::from_str(&normalized).map_err(|_| PayrollError::UnknownRegion(code.trim().to_string()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Region::I => "Region I",
            Region::II => "Region II",
            Region::III => "Region III",
            Region::IV => "Region IV",
        }
    }
}
