use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::api::error::{ApiError, db_error};
use crate::api::payslip::build_payslip;
use crate::auth::auth::AuthUser;
use crate::model::{employee::EmployeeProfile, payroll::PayrollRecord};
use crate::payroll::{
    PayPeriod, PayrollError, PayrollInput, PayrollPolicy, PayrollResult, PayrollSubmission,
    Region, compute,
    currency::format_vnd,
    input::{lenient_amount, lenient_id, non_negative},
    submission::{PayrollPayload, PayrollStatus, prepare},
};

/// Payroll form as sent by the UI. Amount fields accept numbers or strings;
/// anything unparsable counts as zero.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PayrollForm {
    #[serde(default, deserialize_with = "lenient_id")]
    #[schema(value_type = Option<u64>, example = 1001)]
    pub employee_id: Option<u64>,

    #[serde(default)]
    #[schema(example = "I")]
    pub region: String,

    #[serde(default, deserialize_with = "lenient_amount")]
    #[schema(value_type = String, example = "20000000")]
    pub base_salary: Decimal,

    #[serde(default, deserialize_with = "lenient_amount")]
    #[schema(value_type = String, example = "2000000")]
    pub allowances: Decimal,

    #[serde(default, deserialize_with = "lenient_amount")]
    #[schema(value_type = String, example = "0")]
    pub other_deductions: Decimal,

    #[serde(default)]
    pub pay_period: PayPeriod,

    /// First day of the pay month. Defaults to the current month on create.
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "date", example = "2026-01-01")]
    pub month: Option<NaiveDate>,
}

impl PayrollForm {
    pub fn submission(&self) -> Result<PayrollSubmission, PayrollError> {
        Ok(PayrollSubmission {
            employee_id: self.employee_id,
            input: PayrollInput {
                base_salary: self.base_salary,
                allowances: non_negative(self.allowances),
                other_deductions: non_negative(self.other_deductions),
                region: Region::from_code(&self.region)?,
                pay_period: self.pay_period,
            },
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewResponse {
    /// False while base salary is empty or non-positive.
    pub computed: bool,
    pub result: Option<PayrollResult>,
    pub minimum_wage: Decimal,
    #[schema(example = "4.680.000 ₫")]
    pub minimum_wage_display: String,
    /// Submission would be rejected at this salary.
    pub below_minimum_wage: bool,
    pub policy_version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegionResponse {
    pub code: Region,
    #[schema(example = "Region I")]
    pub label: String,
    pub minimum_wage: Decimal,
    #[schema(example = "4.680.000 ₫")]
    pub minimum_wage_display: String,
    pub insurance_cap: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavedPayrollResponse {
    pub id: u64,
    #[schema(value_type = String, format = "date")]
    pub month: NaiveDate,
    pub payroll: PayrollPayload,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,

    #[schema(example = 1001)]
    pub employee_id: Option<u64>,

    pub status: Option<PayrollStatus>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedPayrollResponse {
    pub data: Vec<PayrollRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

fn current_month() -> NaiveDate {
    let today = Local::now().date_naive();
    NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today)
}

fn is_integrity_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

async fn fetch_record(pool: &MySqlPool, payroll_id: u64) -> Result<PayrollRecord, ApiError> {
    sqlx::query_as::<_, PayrollRecord>(
        r#"
        SELECT id, employee_id, month, region, pay_period, base_salary, allowances,
               other_deductions, social_insurance, health_insurance, unemployment_insurance,
               personal_income_tax, total_deductions, net_salary, status
        FROM payroll
        WHERE id = ?
        "#,
    )
    .bind(payroll_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error("Failed to fetch payroll"))?
    .ok_or(ApiError::NotFound("Payroll not found"))
}

fn preview_for(form: &PayrollForm, policy: &PayrollPolicy) -> Result<PreviewResponse, ApiError> {
    let submission = form.submission()?;
    let input = &submission.input;
    let result = compute(input, policy)?;
    let floor = policy.floor_for(input.region);

    Ok(PreviewResponse {
        computed: result.is_some(),
        below_minimum_wage: result.is_some() && input.base_salary < floor,
        result,
        minimum_wage: floor,
        minimum_wage_display: format_vnd(floor),
        policy_version: policy.version.clone(),
    })
}

/// Recomputes a payroll form without saving it.
#[utoipa::path(
    post,
    path = "/api/payroll/preview",
    request_body = PayrollForm,
    responses(
        (status = 200, body = PreviewResponse),
        (status = 400, description = "Unknown region code"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn preview_payroll(
    auth: AuthUser,
    policy: web::Data<PayrollPolicy>,
    form: web::Json<PayrollForm>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_manager()?;

    let preview = preview_for(&form, &policy)?;
    debug!(computed = preview.computed, "Payroll preview");

    Ok(HttpResponse::Ok().json(preview))
}

#[utoipa::path(
    post,
    path = "/api/payroll",
    request_body = PayrollForm,
    responses(
        (status = 201, description = "Payroll created", body = SavedPayrollResponse),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "message": "Base salary must be at least the Region I minimum wage of 4.680.000 ₫"
        })),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
#[instrument(name = "payroll_create", skip_all, fields(user_id = auth.user_id))]
pub async fn create_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    policy: web::Data<PayrollPolicy>,
    form: web::Json<PayrollForm>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_manager()?;

    let submission = form.submission().map_err(ApiError::from)?;
    let payload = prepare(&submission, None, &policy).map_err(ApiError::from)?;
    let month = form.month.unwrap_or_else(current_month);

    let inserted = sqlx::query(
        r#"
        INSERT INTO payroll
            (employee_id, month, region, pay_period, base_salary, allowances, other_deductions,
             social_insurance, health_insurance, unemployment_insurance, personal_income_tax,
             total_deductions, net_salary, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(month)
    .bind(payload.region.as_ref())
    .bind(payload.pay_period.to_string())
    .bind(payload.base_salary)
    .bind(payload.allowances)
    .bind(payload.other_deductions)
    .bind(payload.social_insurance)
    .bind(payload.health_insurance)
    .bind(payload.unemployment_insurance)
    .bind(payload.personal_income_tax)
    .bind(payload.total_deductions)
    .bind(payload.net_salary)
    .bind(&payload.status)
    .execute(pool.get_ref())
    .await;

    let inserted = match inserted {
        Ok(r) => r,
        Err(e) if is_integrity_violation(&e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Unknown employee or duplicate payroll"
            })));
        }
        Err(e) => return Err(db_error("Failed to create payroll")(e).into()),
    };

    let id = inserted.last_insert_id();
    info!(payroll_id = id, employee_id = payload.employee_id, "Payroll created");

    Ok(HttpResponse::Created().json(SavedPayrollResponse {
        id,
        month,
        payroll: payload,
    }))
}

#[utoipa::path(
    put,
    path = "/api/payroll/{payroll_id}",
    request_body = PayrollForm,
    params(
        ("payroll_id" = u64, Path, description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll updated", body = SavedPayrollResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
#[instrument(name = "payroll_update", skip_all, fields(user_id = auth.user_id))]
pub async fn update_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    policy: web::Data<PayrollPolicy>,
    path: web::Path<u64>,
    form: web::Json<PayrollForm>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_manager()?;

    let payroll_id = path.into_inner();
    let current = fetch_record(pool.get_ref(), payroll_id).await?;

    let submission = form.submission().map_err(ApiError::from)?;
    let payload =
        prepare(&submission, Some(current.status.as_str()), &policy).map_err(ApiError::from)?;
    let month = form.month.unwrap_or(current.month);

    let updated = sqlx::query(
        r#"
        UPDATE payroll
        SET employee_id = ?, month = ?, region = ?, pay_period = ?, base_salary = ?,
            allowances = ?, other_deductions = ?, social_insurance = ?, health_insurance = ?,
            unemployment_insurance = ?, personal_income_tax = ?, total_deductions = ?,
            net_salary = ?, status = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.employee_id)
    .bind(month)
    .bind(payload.region.as_ref())
    .bind(payload.pay_period.to_string())
    .bind(payload.base_salary)
    .bind(payload.allowances)
    .bind(payload.other_deductions)
    .bind(payload.social_insurance)
    .bind(payload.health_insurance)
    .bind(payload.unemployment_insurance)
    .bind(payload.personal_income_tax)
    .bind(payload.total_deductions)
    .bind(payload.net_salary)
    .bind(&payload.status)
    .bind(payroll_id)
    .execute(pool.get_ref())
    .await;

    match updated {
        Ok(_) => {}
        Err(e) if is_integrity_violation(&e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Unknown employee or duplicate payroll"
            })));
        }
        Err(e) => return Err(db_error("Failed to update payroll")(e).into()),
    }

    info!(payroll_id, status = %payload.status, "Payroll updated");

    Ok(HttpResponse::Ok().json(SavedPayrollResponse {
        id: payroll_id,
        month,
        payroll: payload,
    }))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}",
    params(
        ("payroll_id" = u64, Path, description = "Payroll ID")
    ),
    responses(
        (status = 200, body = PayrollRecord),
        (status = 403),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let record = fetch_record(pool.get_ref(), path.into_inner()).await?;

    if !auth.can_view_payroll_of(record.employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your payroll"));
    }

    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}/payslip",
    params(
        ("payroll_id" = u64, Path, description = "Payroll ID")
    ),
    responses(
        (status = 200, body = Payslip),
        (status = 403),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payslip(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    policy: web::Data<PayrollPolicy>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let record = fetch_record(pool.get_ref(), path.into_inner()).await?;

    if !auth.can_view_payroll_of(record.employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your payroll"));
    }

    let employee = sqlx::query_as::<_, EmployeeProfile>(
        r#"
        SELECT e.id, e.employee_code, e.first_name, e.last_name, e.email,
               jt.title AS position
        FROM employees e
        LEFT JOIN job_titles jt ON jt.id = e.job_title_id
        WHERE e.id = ?
        "#,
    )
    .bind(record.employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(db_error("Failed to fetch employee for payslip"))?
    .ok_or(ApiError::NotFound("Employee not found"))?;

    let payslip = build_payslip(&record, &employee, &policy).map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(payslip))
}

fn push_filters(
    builder: &mut QueryBuilder<'_, MySql>,
    employee_id: Option<u64>,
    status: Option<PayrollStatus>,
) {
    let mut separator = " WHERE ";
    if let Some(employee_id) = employee_id {
        builder.push(separator).push("employee_id = ").push_bind(employee_id);
        separator = " AND ";
    }
    if let Some(status) = status {
        builder.push(separator).push("status = ").push_bind(status.to_string());
    }
}

/// Page number, page size and row offset; the offset is widened so huge pages cannot wrap.
fn page_window(page: Option<u32>, per_page: Option<u32>) -> (u32, u32, u64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(10).clamp(1, 100);
    let offset = u64::from(page - 1) * u64::from(per_page);
    (page, per_page, offset)
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PaginatedPayrollResponse),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = if auth.role.manages_payroll() {
        query.employee_id
    } else {
        // Employees are pinned to their own records.
        Some(
            auth.employee_id
                .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?,
        )
    };

    let (page, per_page, offset) = page_window(query.page, query.per_page);

    let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM payroll");
    push_filters(&mut count, employee_id, query.status);
    let total: i64 = count
        .build_query_scalar::<i64>()
        .fetch_one(pool.get_ref())
        .await
        .map_err(db_error("Failed to count payrolls"))?;

    let mut select = QueryBuilder::<MySql>::new(
        "SELECT id, employee_id, month, region, pay_period, base_salary, allowances, \
         other_deductions, social_insurance, health_insurance, unemployment_insurance, \
         personal_income_tax, total_deductions, net_salary, status FROM payroll",
    );
    push_filters(&mut select, employee_id, query.status);
    select
        .push(" ORDER BY month DESC, id DESC LIMIT ")
        .push_bind(u64::from(per_page))
        .push(" OFFSET ")
        .push_bind(offset);

    let data = select
        .build_query_as::<PayrollRecord>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(db_error("Failed to fetch payroll list"))?;

    Ok(HttpResponse::Ok().json(PaginatedPayrollResponse {
        data,
        page,
        per_page,
        total,
    }))
}

fn regions_for(policy: &PayrollPolicy) -> Vec<RegionResponse> {
    Region::iter()
        .map(|region| {
            let floor = policy.floor_for(region);
            RegionResponse {
                code: region,
                label: region.label().to_string(),
                minimum_wage: floor,
                minimum_wage_display: format_vnd(floor),
                insurance_cap: policy.insurance_cap(region),
            }
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/api/payroll/regions",
    responses(
        (status = 200, body = [RegionResponse])
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_regions(
    _auth: AuthUser,
    policy: web::Data<PayrollPolicy>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(regions_for(&policy)))
}

#[utoipa::path(
    get,
    path = "/api/payroll/policy",
    responses(
        (status = 200, body = PayrollPolicy),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_policy(
    auth: AuthUser,
    policy: web::Data<PayrollPolicy>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    Ok(HttpResponse::Ok().json(policy.get_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{Subject, generate_access_token};
    use crate::config::Config;
    use actix_web::{App, http::StatusCode, test as actix_test};
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    fn token(role: u8) -> String {
        let subject = Subject {
            user_id: 1,
            username: "hr".into(),
            role,
            employee_id: None,
        };
        generate_access_token(&subject, &Config::for_tests().jwt_secret, 900).unwrap()
    }

    macro_rules! app {
        () => {
            actix_test::init_service(
                App::new()
                    .app_data(web::Data::new(Config::for_tests()))
                    .app_data(web::Data::new(PayrollPolicy::statutory()))
                    .route("/api/payroll/preview", web::post().to(preview_payroll))
                    .route("/api/payroll/regions", web::get().to(list_regions)),
            )
            .await
        };
    }

    #[test]
    fn form_clamps_negative_amounts() {
        let form: PayrollForm = serde_json::from_value(json!({
            "employee_id": 3,
            "region": "ii",
            "base_salary": "5000000",
            "allowances": -100,
            "other_deductions": "-5",
        }))
        .unwrap();

        let submission = form.submission().unwrap();
        assert_eq!(submission.input.region, Region::II);
        assert_eq!(submission.input.allowances, Decimal::ZERO);
        assert_eq!(submission.input.other_deductions, Decimal::ZERO);
        assert_eq!(submission.input.pay_period, PayPeriod::Monthly);
    }

    #[test]
    fn preview_flags_salary_below_floor() {
        let form: PayrollForm = serde_json::from_value(json!({
            "region": "I",
            "base_salary": 4000000,
        }))
        .unwrap();

        let preview = preview_for(&form, &PayrollPolicy::statutory()).unwrap();
        assert!(preview.computed);
        assert!(preview.below_minimum_wage);
        assert_eq!(preview.minimum_wage_display, "4.680.000 ₫");
    }

    #[test]
    fn page_window_defaults_and_clamps() {
        assert_eq!(page_window(None, None), (1, 10, 0));
        assert_eq!(page_window(Some(0), Some(500)), (1, 100, 0));
        assert_eq!(page_window(Some(3), Some(25)), (3, 25, 50));
    }

    #[test]
    fn page_window_huge_page_does_not_wrap() {
        let (page, per_page, offset) = page_window(Some(u32::MAX), Some(10));
        assert_eq!(page, u32::MAX);
        assert_eq!(per_page, 10);
        assert_eq!(offset, (u64::from(u32::MAX) - 1) * 10);
    }

    #[test]
    fn preview_rejects_oversized_amounts() {
        let form: PayrollForm = serde_json::from_value(json!({
            "region": "I",
            "base_salary": "7e28",
            "allowances": "7e28",
        }))
        .unwrap();

        let err = preview_for(&form, &PayrollPolicy::statutory()).unwrap_err();
        assert!(matches!(err, ApiError::Payroll(PayrollError::AmountOutOfRange)));
    }

    #[test]
    fn regions_follow_policy() {
        let regions = regions_for(&PayrollPolicy::statutory());
        assert_eq!(regions.len(), 4);
        assert_eq!(regions[0].code, Region::I);
        assert_eq!(regions[3].minimum_wage, dec!(3250000));
        assert_eq!(regions[3].insurance_cap, dec!(65000000));
    }

    #[actix_web::test]
    async fn preview_endpoint_computes() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/api/payroll/preview")
            .insert_header(("Authorization", format!("Bearer {}", token(2))))
            .set_json(json!({
                "employee_id": "",
                "region": "I",
                "base_salary": "4680000",
                "allowances": "",
                "other_deductions": null,
                "pay_period": "Monthly"
            }))
            .to_request();

        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["computed"], json!(true));
        assert_eq!(body["below_minimum_wage"], json!(false));

        let net: Decimal = serde_json::from_value(body["result"]["net_salary"].clone()).unwrap();
        assert_eq!(net, dec!(4188600));
    }

    #[actix_web::test]
    async fn preview_endpoint_skips_empty_salary() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/api/payroll/preview")
            .insert_header(("Authorization", format!("Bearer {}", token(1))))
            .set_json(json!({ "region": "III", "base_salary": "" }))
            .to_request();

        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["computed"], json!(false));
        assert_eq!(body["result"], Value::Null);
    }

    #[actix_web::test]
    async fn preview_endpoint_rejects_unknown_region() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/api/payroll/preview")
            .insert_header(("Authorization", format!("Bearer {}", token(2))))
            .set_json(json!({ "region": "V", "base_salary": 5000000 }))
            .to_request();

        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn preview_endpoint_answers_oversized_amounts_with_bad_request() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/api/payroll/preview")
            .insert_header(("Authorization", format!("Bearer {}", token(2))))
            .set_json(json!({
                "region": "I",
                "base_salary": "7e28",
                "allowances": "7e28"
            }))
            .to_request();

        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["message"], json!("amounts are too large to compute"));
    }

    #[actix_web::test]
    async fn preview_requires_payroll_role() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/api/payroll/preview")
            .insert_header(("Authorization", format!("Bearer {}", token(3))))
            .set_json(json!({ "region": "I", "base_salary": 5000000 }))
            .to_request();

        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn regions_endpoint_needs_a_token() {
        let app = app!();

        let req = actix_test::TestRequest::get().uri("/api/payroll/regions").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = actix_test::TestRequest::get()
            .uri("/api/payroll/regions")
            .insert_header(("Authorization", format!("Bearer {}", token(3))))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["code"], json!("I"));
        assert_eq!(body[0]["minimum_wage_display"], json!("4.680.000 ₫"));
    }
}
