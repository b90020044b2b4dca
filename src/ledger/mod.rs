//! Inventory ledger: the only writers of stock quantities and sale records.
//!
//! Every operation here is one transaction — a reader sees either the
//! pre-state or the fully applied post-state, never a partial one. Stock
//! decrements are conditional (`... AND quantity >= $n`), so two concurrent
//! sales of the last unit cannot drive a quantity negative: the store
//! serializes the row updates and the loser gets a conflict.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::import::ProductDraft;
use crate::models::{
    settle_payment, CreateSale, Product, ProductRow, Sale, SaleLineItem, SaleRow, Variant,
};

/// Product + variant fields captured at commit time, copied onto the sale's
/// line items so the receipt survives later catalog edits.
#[derive(Debug, sqlx::FromRow)]
struct LineSnapshot {
    variant_id: Uuid,
    product_id: Uuid,
    product_name: String,
    variant_name: String,
    sku: String,
    price_cents: i64,
}

// ── Sale commit ───────────────────────────────────────────────────────────────

/// Commits a sale: persists the sale record with its line-item snapshots and
/// decrements each targeted variant's stock, all in one transaction.
///
/// Fails without any observable effect when a line's product+variant cannot
/// be matched (`NotFound`), when stock is insufficient (`Conflict`), or when
/// the payment does not cover the total (`BadRequest`).
pub async fn commit_sale(pool: &PgPool, employee_id: Uuid, payload: &CreateSale) -> AppResult<Sale> {
    payload.validate().map_err(AppError::BadRequest)?;

    let mut tx = pool.begin().await?;

    // Resolve and snapshot every line before mutating anything, so payment
    // validation failures abort with zero writes.
    let mut snapshots: Vec<LineSnapshot> = Vec::with_capacity(payload.items.len());
    let mut subtotal_cents: i64 = 0;

    for item in &payload.items {
        let snapshot = sqlx::query_as::<_, LineSnapshot>(
            r#"
            SELECT v.id AS variant_id, v.product_id, p.name AS product_name,
                   v.name AS variant_name, v.sku, v.price_cents
            FROM variants v
            JOIN products p ON p.id = v.product_id
            WHERE v.id = $1 AND v.product_id = $2
            "#,
        )
        .bind(item.variant_id)
        .bind(item.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "line item not found: variant {} of product {}",
                item.variant_id, item.product_id
            ))
        })?;

        subtotal_cents += snapshot.price_cents * item.quantity as i64;
        snapshots.push(snapshot);
    }

    let discount_cents = payload.discount_cents.unwrap_or(0);
    let (total_cents, amount_paid_cents, change_cents) = settle_payment(
        subtotal_cents,
        discount_cents,
        payload.payment_method,
        payload.amount_paid_cents,
    )
    .map_err(AppError::BadRequest)?;

    // Atomic compare-and-decrement per line. Zero rows means another sale won
    // the race (or an admin edit shrank the stock) — abort the whole unit.
    for (item, snapshot) in payload.items.iter().zip(&snapshots) {
        let result = sqlx::query(
            r#"
            UPDATE variants
            SET quantity = quantity - $1, updated_at = NOW()
            WHERE id = $2 AND product_id = $3 AND quantity >= $1
            "#,
        )
        .bind(item.quantity)
        .bind(item.variant_id)
        .bind(item.product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "insufficient stock for sku '{}' (requested {})",
                snapshot.sku, item.quantity
            )));
        }
    }

    let sale_row = sqlx::query_as::<_, SaleRow>(
        r#"
        INSERT INTO sales (client_id, employee_id, subtotal_cents, discount_cents,
                           total_cents, payment_method, amount_paid_cents, change_cents, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'completed')
        RETURNING id, client_id, employee_id, subtotal_cents, discount_cents,
                  total_cents, payment_method, amount_paid_cents, change_cents,
                  status, created_at
        "#,
    )
    .bind(payload.client_id)
    .bind(employee_id)
    .bind(subtotal_cents)
    .bind(discount_cents)
    .bind(total_cents)
    .bind(payload.payment_method)
    .bind(amount_paid_cents)
    .bind(change_cents)
    .fetch_one(&mut *tx)
    .await?;

    let mut items: Vec<SaleLineItem> = Vec::with_capacity(payload.items.len());
    for (item, snapshot) in payload.items.iter().zip(&snapshots) {
        let inserted = sqlx::query_as::<_, SaleLineItem>(
            r#"
            INSERT INTO sale_items (sale_id, product_id, variant_id, product_name,
                                    variant_name, sku, unit_price_cents, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, sale_id, product_id, variant_id, product_name, variant_name,
                      sku, unit_price_cents, quantity, created_at
            "#,
        )
        .bind(sale_row.id)
        .bind(snapshot.product_id)
        .bind(snapshot.variant_id)
        .bind(&snapshot.product_name)
        .bind(&snapshot.variant_name)
        .bind(&snapshot.sku)
        .bind(snapshot.price_cents)
        .bind(item.quantity)
        .fetch_one(&mut *tx)
        .await?;
        items.push(inserted);
    }

    tx.commit().await?;

    info!(
        sale_id = %sale_row.id,
        employee_id = %employee_id,
        total_cents = sale_row.total_cents,
        items = items.len(),
        "Sale committed"
    );

    Ok(sale_row.into_sale(items))
}

// ── Sale reversal ─────────────────────────────────────────────────────────────

/// Reverses a completed sale: flips its status to returned and restores every
/// line item's stock, in one transaction.
///
/// The status update is guarded on `status = 'completed'`, so a second return
/// of the same sale is rejected (`NotFound`), not silently idempotent. If any
/// line's product+variant no longer exists the whole unit aborts — the status
/// flip does not survive a failed restoration.
pub async fn reverse_sale(pool: &PgPool, sale_id: Uuid) -> AppResult<Sale> {
    let mut tx = pool.begin().await?;

    let sale_row = sqlx::query_as::<_, SaleRow>(
        r#"
        UPDATE sales
        SET status = 'returned'
        WHERE id = $1 AND status = 'completed'
        RETURNING id, client_id, employee_id, subtotal_cents, discount_cents,
                  total_cents, payment_method, amount_paid_cents, change_cents,
                  status, created_at
        "#,
    )
    .bind(sale_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!("Sale {} not found or already returned", sale_id))
    })?;

    let items = sqlx::query_as::<_, SaleLineItem>(
        r#"
        SELECT id, sale_id, product_id, variant_id, product_name, variant_name,
               sku, unit_price_cents, quantity, created_at
        FROM sale_items
        WHERE sale_id = $1
        ORDER BY created_at, id
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *tx)
    .await?;

    // Exact inverse of the commit's decrements: same (product, variant,
    // quantity) pairs, keyed the same way.
    for item in &items {
        let result = sqlx::query(
            r#"
            UPDATE variants
            SET quantity = quantity + $1, updated_at = NOW()
            WHERE id = $2 AND product_id = $3
            "#,
        )
        .bind(item.quantity)
        .bind(item.variant_id)
        .bind(item.product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "cannot restore stock for sku '{}': the variant no longer exists",
                item.sku
            )));
        }
    }

    tx.commit().await?;

    info!(sale_id = %sale_id, items = items.len(), "Sale returned, stock restored");

    Ok(sale_row.into_sale(items))
}

// ── Bulk import ───────────────────────────────────────────────────────────────

/// Persists an already parsed and grouped catalog batch in one transaction.
/// Rejects the whole batch if any sku is already taken in the catalog.
pub async fn bulk_import(pool: &PgPool, drafts: &[ProductDraft]) -> AppResult<Vec<Product>> {
    let skus: Vec<&str> = drafts
        .iter()
        .flat_map(|d| d.variants.iter().map(|v| v.sku.as_str()))
        .collect();

    let taken: Vec<String> =
        sqlx::query_scalar("SELECT sku FROM variants WHERE sku = ANY($1) ORDER BY sku")
            .bind(&skus)
            .fetch_all(pool)
            .await?;
    if !taken.is_empty() {
        return Err(AppError::Conflict(format!(
            "these skus already exist in the catalog: {}",
            taken.join(", ")
        )));
    }

    let mut tx = pool.begin().await?;
    let mut products: Vec<Product> = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (name, min_stock_threshold, lead_time_days, daily_sale_rate)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, min_stock_threshold, lead_time_days,
                      daily_sale_rate, created_at, updated_at
            "#,
        )
        .bind(&draft.name)
        .bind(draft.min_stock_threshold)
        .bind(draft.lead_time_days)
        .bind(draft.daily_sale_rate)
        .fetch_one(&mut *tx)
        .await?;

        let mut variants: Vec<Variant> = Vec::with_capacity(draft.variants.len());
        for variant in &draft.variants {
            let inserted = sqlx::query_as::<_, Variant>(
                r#"
                INSERT INTO variants (product_id, name, sku, price_cents, quantity)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, product_id, name, sku, price_cents, quantity, created_at, updated_at
                "#,
            )
            .bind(row.id)
            .bind(&variant.name)
            .bind(&variant.sku)
            .bind(variant.price_cents)
            .bind(variant.quantity)
            .fetch_one(&mut *tx)
            .await?;
            variants.push(inserted);
        }

        products.push(row.into_product(variants));
    }

    tx.commit().await?;

    info!(
        products = products.len(),
        variants = skus.len(),
        "Bulk import committed"
    );

    Ok(products)
}

/// Convenience wrapper for the restock suggestion: loads the product and its
/// trailing 30-day sales, then runs the pure computation.
pub async fn restock_suggestion(
    pool: &PgPool,
    product_id: Uuid,
) -> AppResult<(Product, crate::restock::RestockSuggestion)> {
    const WINDOW_DAYS: i64 = 30;

    let product = db::fetch_product_by_id(pool, product_id).await?;
    let units_sold = db::units_sold_since_days(pool, product_id, WINDOW_DAYS).await?;
    let suggestion = crate::restock::suggest(&product, units_sold, WINDOW_DAYS);

    Ok((product, suggestion))
}
