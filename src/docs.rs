use crate::api::payroll::{
    PaginatedPayrollResponse, PayrollForm, PayrollQuery, PreviewResponse, RegionResponse,
    SavedPayrollResponse,
};
use crate::api::payslip::{Payslip, PayslipEmployee, PayslipLine};
use crate::model::payroll::PayrollRecord;
use crate::payroll::{
    PayPeriod, PayrollInput, PayrollPolicy, PayrollResult, Region,
    policy::{DeductionRates, RegionalWageTable},
    submission::{PayrollPayload, PayrollStatus},
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Payroll API",
        version = "1.0.0",
        description = r#"
## Payroll

Computes statutory deductions and net pay for Vietnamese payroll and stores the result.

### Calculation
- Social (8%), health (1.5%) and unemployment (1%) insurance on the base salary,
  capped at 20x the regional minimum wage
- Flat 10% personal income tax on income above insurance and the 11.000.000 ₫ personal deduction
- Amounts are rounded to whole dong only when saved

### Regions
Four wage regions (I-IV), each with its own minimum wage. A payroll below the regional
minimum is previewed but cannot be saved.

### Security
Endpoints are protected using **JWT Bearer authentication**. HR and Admin manage payroll;
employees can read their own records and payslips.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::payroll::preview_payroll,
        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::get_payroll,
        crate::api::payroll::get_payslip,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::list_regions,
        crate::api::payroll::get_policy
    ),
    components(
        schemas(
            PayrollForm,
            PreviewResponse,
            RegionResponse,
            SavedPayrollResponse,
            PayrollQuery,
            PaginatedPayrollResponse,
            PayrollRecord,
            Payslip,
            PayslipEmployee,
            PayslipLine,
            PayrollInput,
            PayrollResult,
            PayrollPayload,
            PayrollStatus,
            PayrollPolicy,
            RegionalWageTable,
            DeductionRates,
            PayPeriod,
            Region
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Payroll", description = "Payroll computation and records"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_payroll_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/api/payroll/preview"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/payroll/{payroll_id}/payslip"));
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}
