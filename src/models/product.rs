use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable configuration of a product (size, color, ...) with its own sku,
/// price, and stock count. Owned exclusively by its product.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Variant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    /// Unique across the whole catalog (enforced on import and by the DB).
    pub sku: String,
    /// Price stored as integer cents (e.g. 999 = $9.99)
    pub price_cents: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Canonical product representation: the row fields plus its assembled
/// variants. Store rows never leak past the db boundary.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub min_stock_threshold: i32,
    pub lead_time_days: i32,
    pub daily_sale_rate: f64,
    pub variants: Vec<Variant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat `products` row as stored; assembled into `Product` by the db layer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub min_stock_threshold: i32,
    pub lead_time_days: i32,
    pub daily_sale_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    pub fn into_product(self, variants: Vec<Variant>) -> Product {
        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            min_stock_threshold: self.min_stock_threshold,
            lead_time_days: self.lead_time_days,
            daily_sale_rate: self.daily_sale_rate,
            variants,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read-only stock classification used by catalog views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    LowStock,
    Normal,
}

impl Product {
    /// Total stock is derived, never stored: the sum of variant quantities.
    pub fn total_stock(&self) -> i64 {
        self.variants.iter().map(|v| v.quantity as i64).sum()
    }

    /// Classifies the product against its low-stock threshold.
    pub fn stock_level(&self) -> StockLevel {
        classify(self.total_stock(), self.min_stock_threshold)
    }
}

/// Pure classification: out of stock at zero, low at or below the threshold
/// (while still above zero), normal above it.
pub fn classify(total_stock: i64, min_stock_threshold: i32) -> StockLevel {
    if total_stock == 0 {
        StockLevel::OutOfStock
    } else if total_stock <= min_stock_threshold as i64 {
        StockLevel::LowStock
    } else {
        StockLevel::Normal
    }
}

// ── Request payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateVariant {
    pub name: String,
    pub sku: String,
    /// Price in cents
    pub price_cents: i64,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub min_stock_threshold: i32,
    pub lead_time_days: Option<i32>,
    pub daily_sale_rate: Option<f64>,
    /// Must be non-empty: a product without variants is not sellable.
    pub variants: Vec<CreateVariant>,
}

impl CreateProduct {
    /// Field-level validation shared by the create and update paths.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.min_stock_threshold < 0 {
            return Err("min_stock_threshold must be >= 0".to_string());
        }
        if self.lead_time_days.is_some_and(|d| d < 0) {
            return Err("lead_time_days must be >= 0".to_string());
        }
        if self.daily_sale_rate.is_some_and(|r| r < 0.0) {
            return Err("daily_sale_rate must be >= 0".to_string());
        }
        if self.variants.is_empty() {
            return Err("a product needs at least one variant".to_string());
        }
        for variant in &self.variants {
            if variant.name.trim().is_empty() || variant.sku.trim().is_empty() {
                return Err("every variant needs a name and a sku".to_string());
            }
            if variant.price_cents <= 0 {
                return Err(format!("variant '{}': price_cents must be > 0", variant.sku));
            }
            if variant.quantity < 0 {
                return Err(format!("variant '{}': quantity must be >= 0", variant.sku));
            }
        }
        Ok(())
    }
}

// ── Query parameters ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ProductFilters {
    /// Only products classified out-of-stock or low-stock.
    pub low_stock_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_variant(qty: i32) -> CreateVariant {
        CreateVariant {
            name: "Standard".to_string(),
            sku: "STD-001".to_string(),
            price_cents: 1000,
            quantity: qty,
        }
    }

    fn make_payload(variants: Vec<CreateVariant>) -> CreateProduct {
        CreateProduct {
            name: "Shirt".to_string(),
            description: None,
            min_stock_threshold: 2,
            lead_time_days: None,
            daily_sale_rate: None,
            variants,
        }
    }

    // ── classify boundaries ───────────────────────────────────────────────────

    #[test]
    fn classify_zero_stock_is_out_of_stock() {
        assert_eq!(classify(0, 5), StockLevel::OutOfStock);
    }

    #[test]
    fn classify_at_threshold_is_low_stock() {
        assert_eq!(classify(5, 5), StockLevel::LowStock);
    }

    #[test]
    fn classify_one_above_threshold_is_normal() {
        assert_eq!(classify(6, 5), StockLevel::Normal);
    }

    #[test]
    fn classify_below_threshold_is_low_stock() {
        assert_eq!(classify(1, 5), StockLevel::LowStock);
    }

    #[test]
    fn classify_zero_threshold_nonzero_stock_is_normal() {
        assert_eq!(classify(1, 0), StockLevel::Normal);
    }

    // ── payload validation ────────────────────────────────────────────────────

    #[test]
    fn create_product_requires_variants() {
        assert!(make_payload(vec![]).validate().is_err());
    }

    #[test]
    fn create_product_rejects_negative_quantity() {
        assert!(make_payload(vec![make_variant(-1)]).validate().is_err());
    }

    #[test]
    fn create_product_rejects_zero_price() {
        let mut variant = make_variant(5);
        variant.price_cents = 0;
        assert!(make_payload(vec![variant]).validate().is_err());
    }

    #[test]
    fn create_product_accepts_valid_payload() {
        assert!(make_payload(vec![make_variant(5)]).validate().is_ok());
    }
}
