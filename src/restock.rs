//! Restock-quantity suggestion: a reorder-point computation over current
//! stock, supplier lead time, and daily sale rate. Consumes catalog
//! read-only fields plus recent sales history; never mutates anything.

use serde::Serialize;

use crate::models::Product;

#[derive(Debug, Clone, Serialize)]
pub struct RestockSuggestion {
    pub recommended_quantity: i64,
    pub rationale: String,
}

/// Computes a suggestion for one product.
///
/// `units_sold_recently` / `window_days` come from completed-sale history; if
/// the window saw any sales, the observed rate replaces the product's stored
/// `daily_sale_rate`. Demand over the lead time plus the minimum-stock safety
/// buffer is the target level; the recommendation is whatever is missing to
/// reach it.
pub fn suggest(product: &Product, units_sold_recently: i64, window_days: i64) -> RestockSuggestion {
    let total_stock = product.total_stock();

    let observed_rate = if window_days > 0 && units_sold_recently > 0 {
        units_sold_recently as f64 / window_days as f64
    } else {
        product.daily_sale_rate
    };

    let lead_time_demand = (observed_rate * product.lead_time_days as f64).ceil() as i64;
    let target = lead_time_demand + product.min_stock_threshold as i64;
    let recommended_quantity = (target - total_stock).max(0);

    let rationale = if recommended_quantity == 0 {
        format!(
            "Current stock ({total_stock}) already covers the expected demand of \
             {lead_time_demand} units over the {}-day lead time plus the minimum \
             stock of {}. No restock needed.",
            product.lead_time_days, product.min_stock_threshold
        )
    } else {
        format!(
            "At {observed_rate:.2} units/day, the {}-day lead time consumes about \
             {lead_time_demand} units. Keeping the minimum stock of {} on hand \
             means a target of {target} units; with {total_stock} in stock, \
             ordering {recommended_quantity} covers the gap.",
            product.lead_time_days, product.min_stock_threshold
        )
    };

    RestockSuggestion {
        recommended_quantity,
        rationale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Variant;
    use chrono::Utc;
    use uuid::Uuid;

    fn product(stock: i32, min_stock: i32, lead_time: i32, rate: f64) -> Product {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Product {
            id,
            name: "Laptop Pro 15".to_string(),
            description: None,
            min_stock_threshold: min_stock,
            lead_time_days: lead_time,
            daily_sale_rate: rate,
            variants: vec![Variant {
                id: Uuid::new_v4(),
                product_id: id,
                name: "256GB SSD".to_string(),
                sku: "LP-15-256".to_string(),
                price_cents: 4_500_000,
                quantity: stock,
                created_at: now,
                updated_at: now,
            }],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn suggests_gap_to_target_level() {
        // 0.8/day over 14 days = 11.2 -> 12; + min stock 5 = 17; 17 - 10 = 7
        let s = suggest(&product(10, 5, 14, 0.8), 0, 30);
        assert_eq!(s.recommended_quantity, 7);
        assert!(s.rationale.contains("14-day"));
    }

    #[test]
    fn ample_stock_suggests_zero() {
        let s = suggest(&product(100, 5, 14, 0.8), 0, 30);
        assert_eq!(s.recommended_quantity, 0);
        assert!(s.rationale.contains("No restock needed"));
    }

    #[test]
    fn observed_sales_override_stored_rate() {
        // 60 units over 30 days = 2/day; 2 * 10 = 20; + 5 = 25; 25 - 10 = 15
        let s = suggest(&product(10, 5, 10, 0.1), 60, 30);
        assert_eq!(s.recommended_quantity, 15);
    }

    #[test]
    fn no_recent_sales_falls_back_to_stored_rate() {
        // 0.5 * 10 = 5; + 5 = 10; 10 - 2 = 8
        let s = suggest(&product(2, 5, 10, 0.5), 0, 30);
        assert_eq!(s.recommended_quantity, 8);
    }

    #[test]
    fn zero_rate_suggests_only_threshold_gap() {
        let s = suggest(&product(1, 5, 14, 0.0), 0, 30);
        assert_eq!(s.recommended_quantity, 4);
    }
}
