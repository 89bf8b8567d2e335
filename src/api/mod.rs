pub mod error;
pub mod payroll;
pub mod payslip;
