//! Server-side role policy. Mutating handlers resolve the acting employee
//! from the `X-Employee-Id` header and check the role here before any
//! write reaches the ledger.

use axum::http::HeaderMap;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::{Employee, EmployeeRole};

pub const EMPLOYEE_HEADER: &str = "x-employee-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create/update/delete products, bulk import.
    ManageCatalog,
    /// Create/update/delete clients and employees.
    ManagePeople,
    /// Checkout and returns at the register.
    OperateRegister,
}

/// Role capability matrix. Admins can do everything; cashiers work the
/// register; inventory staff manage the catalog.
pub fn is_allowed(role: EmployeeRole, action: Action) -> bool {
    match role {
        EmployeeRole::Admin => true,
        EmployeeRole::Cashier => matches!(action, Action::OperateRegister),
        EmployeeRole::Inventory => matches!(action, Action::ManageCatalog),
    }
}

/// Resolves the acting employee from request headers and checks the policy.
/// Returns the employee so handlers can log who acted.
pub async fn authorize(pool: &PgPool, headers: &HeaderMap, action: Action) -> AppResult<Employee> {
    let id = headers
        .get(EMPLOYEE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Forbidden(format!("missing {} header", EMPLOYEE_HEADER))
        })?;

    let id: Uuid = id
        .parse()
        .map_err(|_| AppError::Forbidden(format!("{} is not a valid employee id", id)))?;

    let employee = match db::fetch_employee_by_id(pool, id).await {
        Ok(employee) => employee,
        Err(AppError::NotFound(_)) => {
            return Err(AppError::Forbidden(format!("unknown employee {}", id)))
        }
        Err(other) => return Err(other),
    };

    if !is_allowed(employee.role, action) {
        return Err(AppError::Forbidden(format!(
            "role '{:?}' may not perform this operation",
            employee.role
        )));
    }

    Ok(employee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_allowed_everything() {
        for action in [
            Action::ManageCatalog,
            Action::ManagePeople,
            Action::OperateRegister,
        ] {
            assert!(is_allowed(EmployeeRole::Admin, action));
        }
    }

    #[test]
    fn cashier_only_operates_register() {
        assert!(is_allowed(EmployeeRole::Cashier, Action::OperateRegister));
        assert!(!is_allowed(EmployeeRole::Cashier, Action::ManageCatalog));
        assert!(!is_allowed(EmployeeRole::Cashier, Action::ManagePeople));
    }

    #[test]
    fn inventory_only_manages_catalog() {
        assert!(is_allowed(EmployeeRole::Inventory, Action::ManageCatalog));
        assert!(!is_allowed(EmployeeRole::Inventory, Action::OperateRegister));
        assert!(!is_allowed(EmployeeRole::Inventory, Action::ManagePeople));
    }
}
