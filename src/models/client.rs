use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Loyalty points balance.
    pub points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl CreateClient {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        // Light-weight check; real address verification is not this service's job.
        if !self.email.contains('@') {
            return Err(format!("'{}' is not a valid email", self.email));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub points: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_client_rejects_blank_name() {
        let payload = CreateClient {
            name: "  ".to_string(),
            email: "a@b.com".to_string(),
            phone: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn create_client_rejects_bad_email() {
        let payload = CreateClient {
            name: "Carlos".to_string(),
            email: "not-an-email".to_string(),
            phone: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn create_client_accepts_valid_payload() {
        let payload = CreateClient {
            name: "Carlos".to_string(),
            email: "carlos.r@email.com".to_string(),
            phone: Some("3101234567".to_string()),
        };
        assert!(payload.validate().is_ok());
    }
}
