use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Display fields for payslips: who is paid, and in what position.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "Lan",
        "last_name": "Nguyen",
        "email": "lan.nguyen@company.com",
        "position": "Accountant"
    })
)]
pub struct EmployeeProfile {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "Lan")]
    pub first_name: String,

    #[schema(example = "Nguyen")]
    pub last_name: String,

    #[schema(example = "lan.nguyen@company.com")]
    pub email: String,

    #[schema(example = "Accountant", nullable = true)]
    pub position: Option<String>,
}

impl EmployeeProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}
