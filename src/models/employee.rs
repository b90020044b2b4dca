use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "employee_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmployeeRole {
    Admin,
    Cashier,
    Inventory,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub role: EmployeeRole,
    /// 4-digit quick-access code. A placeholder, not real authentication.
    #[serde(skip_serializing)]
    pub pin: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEmployee {
    pub name: String,
    pub role: EmployeeRole,
    pub pin: String,
}

impl CreateEmployee {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        validate_pin(&self.pin)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmployee {
    pub name: Option<String>,
    pub role: Option<EmployeeRole>,
    pub pin: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PinLogin {
    pub pin: String,
}

pub fn validate_pin(pin: &str) -> Result<(), String> {
    if pin.len() != 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err("pin must be exactly 4 digits".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_must_be_four_digits() {
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("12345").is_err());
        assert!(validate_pin("12a4").is_err());
        assert!(validate_pin("").is_err());
    }

    #[test]
    fn create_employee_rejects_bad_pin() {
        let payload = CreateEmployee {
            name: "Ana".to_string(),
            role: EmployeeRole::Cashier,
            pin: "12ab".to_string(),
        };
        assert!(payload.validate().is_err());
    }
}
