use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

/// A sale is created `Completed` and may transition to `Returned` exactly
/// once. There is no other lifecycle and sales are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sale_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Completed,
    Returned,
}

/// Line item with product/variant fields snapshotted at sale time, so the
/// receipt survives later catalog edits and deletions.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SaleLineItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_name: String,
    pub sku: String,
    pub unit_price_cents: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sale {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub employee_id: Uuid,
    pub items: Vec<SaleLineItem>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Only meaningful for cash payments; null otherwise.
    pub amount_paid_cents: Option<i64>,
    pub change_cents: Option<i64>,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

/// Flat `sales` row as stored; assembled into `Sale` by the db layer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SaleRow {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub employee_id: Uuid,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub amount_paid_cents: Option<i64>,
    pub change_cents: Option<i64>,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

impl SaleRow {
    pub fn into_sale(self, items: Vec<SaleLineItem>) -> Sale {
        Sale {
            id: self.id,
            client_id: self.client_id,
            employee_id: self.employee_id,
            items,
            subtotal_cents: self.subtotal_cents,
            discount_cents: self.discount_cents,
            total_cents: self.total_cents,
            payment_method: self.payment_method,
            amount_paid_cents: self.amount_paid_cents,
            change_cents: self.change_cents,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

// ── Request payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleItem {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateSale {
    pub client_id: Option<Uuid>,
    pub items: Vec<CreateSaleItem>,
    pub payment_method: PaymentMethod,
    /// Required (and only meaningful) for cash payments.
    pub amount_paid_cents: Option<i64>,
    pub discount_cents: Option<i64>,
}

impl CreateSale {
    /// Structural validation before any store round-trip: non-empty cart,
    /// positive quantities, and no two lines targeting the same variant
    /// (each line must hit a disjoint variant so apply order is irrelevant).
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("a sale needs at least one line item".to_string());
        }
        let mut seen: HashSet<Uuid> = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if item.quantity <= 0 {
                return Err(format!(
                    "line item for variant {} has non-positive quantity",
                    item.variant_id
                ));
            }
            if !seen.insert(item.variant_id) {
                return Err(format!(
                    "variant {} appears in more than one line item",
                    item.variant_id
                ));
            }
        }
        if self.discount_cents.is_some_and(|d| d < 0) {
            return Err("discount_cents must be >= 0".to_string());
        }
        Ok(())
    }
}

/// Payment arithmetic for a priced cart. Returns `(total, amount_paid, change)`.
///
/// Cash requires tendering at least the total; the change is the difference.
/// Card/transfer settle exactly, so paid/change stay null.
pub fn settle_payment(
    subtotal_cents: i64,
    discount_cents: i64,
    method: PaymentMethod,
    amount_paid_cents: Option<i64>,
) -> Result<(i64, Option<i64>, Option<i64>), String> {
    if discount_cents > subtotal_cents {
        return Err(format!(
            "discount ({discount_cents}) exceeds subtotal ({subtotal_cents})"
        ));
    }
    let total = subtotal_cents - discount_cents;

    match method {
        PaymentMethod::Cash => {
            let paid = amount_paid_cents
                .ok_or_else(|| "amount_paid_cents is required for cash payments".to_string())?;
            if paid < total {
                return Err(format!(
                    "amount paid ({paid}) is less than the total ({total})"
                ));
            }
            Ok((total, Some(paid), Some(paid - total)))
        }
        PaymentMethod::Card | PaymentMethod::Transfer => Ok((total, None, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(variant_id: Uuid, quantity: i32) -> CreateSaleItem {
        CreateSaleItem {
            product_id: Uuid::new_v4(),
            variant_id,
            quantity,
        }
    }

    fn payload(items: Vec<CreateSaleItem>) -> CreateSale {
        CreateSale {
            client_id: None,
            items,
            payment_method: PaymentMethod::Cash,
            amount_paid_cents: Some(10_000),
            discount_cents: None,
        }
    }

    // ── structural validation ─────────────────────────────────────────────────

    #[test]
    fn empty_cart_is_rejected() {
        assert!(payload(vec![]).validate().is_err());
    }

    #[test]
    fn zero_quantity_line_is_rejected() {
        assert!(payload(vec![item(Uuid::new_v4(), 0)]).validate().is_err());
    }

    #[test]
    fn duplicate_variant_lines_are_rejected() {
        let variant_id = Uuid::new_v4();
        let p = payload(vec![item(variant_id, 1), item(variant_id, 2)]);
        assert!(p.validate().is_err());
    }

    #[test]
    fn disjoint_lines_are_accepted() {
        let p = payload(vec![item(Uuid::new_v4(), 1), item(Uuid::new_v4(), 2)]);
        assert!(p.validate().is_ok());
    }

    // ── payment settlement ────────────────────────────────────────────────────

    #[test]
    fn cash_change_is_paid_minus_total() {
        let (total, paid, change) =
            settle_payment(4_500, 500, PaymentMethod::Cash, Some(5_000)).unwrap();
        assert_eq!(total, 4_000);
        assert_eq!(paid, Some(5_000));
        assert_eq!(change, Some(1_000));
    }

    #[test]
    fn cash_exact_payment_has_zero_change() {
        let (_, _, change) = settle_payment(4_000, 0, PaymentMethod::Cash, Some(4_000)).unwrap();
        assert_eq!(change, Some(0));
    }

    #[test]
    fn cash_underpayment_is_rejected() {
        assert!(settle_payment(4_000, 0, PaymentMethod::Cash, Some(3_999)).is_err());
    }

    #[test]
    fn cash_without_amount_paid_is_rejected() {
        assert!(settle_payment(4_000, 0, PaymentMethod::Cash, None).is_err());
    }

    #[test]
    fn card_payment_has_null_paid_and_change() {
        let (total, paid, change) = settle_payment(4_000, 0, PaymentMethod::Card, None).unwrap();
        assert_eq!(total, 4_000);
        assert_eq!(paid, None);
        assert_eq!(change, None);
    }

    #[test]
    fn discount_over_subtotal_is_rejected() {
        assert!(settle_payment(1_000, 1_001, PaymentMethod::Card, None).is_err());
    }

    #[test]
    fn full_discount_totals_zero() {
        let (total, _, _) = settle_payment(1_000, 1_000, PaymentMethod::Card, None).unwrap();
        assert_eq!(total, 0);
    }
}
