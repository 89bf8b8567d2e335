use std::path::Path;

use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PayrollError, Region};

/// Minimum monthly wage per region, in VND.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegionalWageTable {
    #[serde(rename = "I")]
    pub region_i: Decimal,
    #[serde(rename = "II")]
    pub region_ii: Decimal,
    #[serde(rename = "III")]
    pub region_iii: Decimal,
    #[serde(rename = "IV")]
    pub region_iv: Decimal,
}

impl RegionalWageTable {
    pub fn floor_for(&self, region: Region) -> Decimal {
        match region {
            Region::I => self.region_i,
            Region::II => self.region_ii,
            Region::III => self.region_iii,
            Region::IV => self.region_iv,
        }
    }
}

/// Statutory percentages (as fractions) and fixed allowances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeductionRates {
    pub social_insurance: Decimal,
    pub health_insurance: Decimal,
    pub unemployment_insurance: Decimal,
    /// Flat approximation of the progressive PIT schedule.
    pub personal_income_tax: Decimal,
    /// Self exemption subtracted from taxable income.
    pub personal_deduction: Decimal,
    /// Insurance base is capped at this many times the regional floor.
    pub insurance_cap_multiplier: Decimal,
}

/// Versioned rate configuration handed to [`super::compute`] and [`super::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollPolicy {
    #[schema(example = "VN-2022-07")]
    pub version: String,
    pub wage_floors: RegionalWageTable,
    pub rates: DeductionRates,
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self::statutory()
    }
}

impl PayrollPolicy {
    /// Regional floors from Decree 38/2022, personal deduction from Resolution 954/2020.
    pub fn statutory() -> Self {
        Self {
            version: "VN-2022-07".to_string(),
            wage_floors: RegionalWageTable {
                region_i: dec!(4680000),
                region_ii: dec!(4160000),
                region_iii: dec!(3640000),
                region_iv: dec!(3250000),
            },
            rates: DeductionRates {
                social_insurance: dec!(0.08),
                health_insurance: dec!(0.015),
                unemployment_insurance: dec!(0.01),
                personal_income_tax: dec!(0.10),
                personal_deduction: dec!(11000000),
                insurance_cap_multiplier: dec!(20),
            },
        }
    }

    pub fn floor_for(&self, region: Region) -> Decimal {
        self.wage_floors.floor_for(region)
    }

    pub fn insurance_cap(&self, region: Region) -> Decimal {
        self.floor_for(region)
            .saturating_mul(self.rates.insurance_cap_multiplier)
    }

    /// Rejects tables that would make the arithmetic meaningless.
    pub fn check(&self) -> Result<(), PayrollError> {
        if self.version.trim().is_empty() {
            return Err(PayrollError::InvalidPolicy("version must not be empty".into()));
        }

        let floors = [
            ("I", self.wage_floors.region_i),
            ("II", self.wage_floors.region_ii),
            ("III", self.wage_floors.region_iii),
            ("IV", self.wage_floors.region_iv),
        ];
        for (code, floor) in floors {
            if floor <= Decimal::ZERO {
                return Err(PayrollError::InvalidPolicy(format!(
                    "wage floor for region {} must be positive",
                    code
                )));
            }
        }

        let rates = [
            ("social_insurance", self.rates.social_insurance),
            ("health_insurance", self.rates.health_insurance),
            ("unemployment_insurance", self.rates.unemployment_insurance),
            ("personal_income_tax", self.rates.personal_income_tax),
        ];
        for (name, rate) in rates {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(PayrollError::InvalidPolicy(format!(
                    "{} rate must be between 0 and 1, got {}",
                    name, rate
                )));
            }
        }

        if self.rates.personal_deduction < Decimal::ZERO {
            return Err(PayrollError::InvalidPolicy(
                "personal_deduction must not be negative".into(),
            ));
        }
        if self.rates.insurance_cap_multiplier <= Decimal::ZERO {
            return Err(PayrollError::InvalidPolicy(
                "insurance_cap_multiplier must be positive".into(),
            ));
        }

        Ok(())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, PayrollError> {
        let policy: PayrollPolicy =
            serde_json::from_str(raw).map_err(|e| PayrollError::InvalidPolicy(e.to_string()))?;
        policy.check()?;
        Ok(policy)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payroll policy {}", path.display()))?;
        let policy = Self::from_json_str(&raw)
            .with_context(|| format!("failed to load payroll policy {}", path.display()))?;
        Ok(policy)
    }
}
