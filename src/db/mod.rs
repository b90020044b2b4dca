use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::*;

// ── Products ──────────────────────────────────────────────────────────────────

/// Loads the variants for a set of products and groups them by product id.
/// This is the one place store rows become the canonical `Product` shape.
async fn fetch_variants_for(
    pool: &PgPool,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<Variant>>> {
    let variants = sqlx::query_as::<_, Variant>(
        r#"
        SELECT id, product_id, name, sku, price_cents, quantity, created_at, updated_at
        FROM variants
        WHERE product_id = ANY($1)
        ORDER BY created_at, id
        "#,
    )
    .bind(product_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<Variant>> = HashMap::with_capacity(product_ids.len());
    for variant in variants {
        grouped.entry(variant.product_id).or_default().push(variant);
    }
    Ok(grouped)
}

pub async fn fetch_all_products(pool: &PgPool, filters: &ProductFilters) -> AppResult<Vec<Product>> {
    let limit = filters.limit.unwrap_or(1000).min(10_000);
    let offset = filters.offset.unwrap_or(0);

    let rows = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, description, min_stock_threshold, lead_time_days,
               daily_sale_rate, created_at, updated_at
        FROM products
        ORDER BY name, id
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut variants = fetch_variants_for(pool, &ids).await?;

    let mut products: Vec<Product> = rows
        .into_iter()
        .map(|row| {
            let vs = variants.remove(&row.id).unwrap_or_default();
            row.into_product(vs)
        })
        .collect();

    // Total stock is derived, so the low-stock filter runs after assembly.
    if filters.low_stock_only.unwrap_or(false) {
        products.retain(|p| p.stock_level() != StockLevel::Normal);
    }

    Ok(products)
}

pub async fn fetch_product_by_id(pool: &PgPool, id: Uuid) -> AppResult<Product> {
    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, description, min_stock_threshold, lead_time_days,
               daily_sale_rate, created_at, updated_at
        FROM products
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

    let mut variants = fetch_variants_for(pool, &[id]).await?;
    Ok(row.into_product(variants.remove(&id).unwrap_or_default()))
}

pub async fn insert_product(pool: &PgPool, payload: &CreateProduct) -> AppResult<Product> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        INSERT INTO products (name, description, min_stock_threshold, lead_time_days, daily_sale_rate)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, description, min_stock_threshold, lead_time_days,
                  daily_sale_rate, created_at, updated_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.min_stock_threshold)
    .bind(payload.lead_time_days.unwrap_or(7))
    .bind(payload.daily_sale_rate.unwrap_or(0.0))
    .fetch_one(&mut *tx)
    .await?;

    let mut variants = Vec::with_capacity(payload.variants.len());
    for variant in &payload.variants {
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

    tx.commit().await?;
    Ok(row.into_product(variants))
}

/// Replaces a product wholesale: row fields and the full variant set, in one
/// transaction. Sale line items keep their snapshots, so regenerating variant
/// ids here does not rewrite history (it can only make a later reversal fail).
pub async fn update_product(pool: &PgPool, id: Uuid, payload: &CreateProduct) -> AppResult<Product> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        UPDATE products
        SET name                = $1,
            description         = $2,
            min_stock_threshold = $3,
            lead_time_days      = $4,
            daily_sale_rate     = $5,
            updated_at          = NOW()
        WHERE id = $6
        RETURNING id, name, description, min_stock_threshold, lead_time_days,
                  daily_sale_rate, created_at, updated_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.min_stock_threshold)
    .bind(payload.lead_time_days.unwrap_or(7))
    .bind(payload.daily_sale_rate.unwrap_or(0.0))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

    sqlx::query("DELETE FROM variants WHERE product_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let mut variants = Vec::with_capacity(payload.variants.len());
    for variant in &payload.variants {
        let inserted = sqlx::query_as::<_, Variant>(
            r#"
            INSERT INTO variants (product_id, name, sku, price_cents, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, product_id, name, sku, price_cents, quantity, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&variant.name)
        .bind(&variant.sku)
        .bind(variant.price_cents)
        .bind(variant.quantity)
        .fetch_one(&mut *tx)
        .await?;
        variants.push(inserted);
    }

    tx.commit().await?;
    Ok(row.into_product(variants))
}

pub async fn delete_product(pool: &PgPool, id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Product {} not found", id)));
    }
    Ok(())
}

/// Units of a product sold on completed sales in the trailing window.
/// Feeds the restock suggestion's observed daily rate.
pub async fn units_sold_since_days(pool: &PgPool, product_id: Uuid, days: i64) -> AppResult<i64> {
    let total: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT SUM(si.quantity)::bigint
        FROM sale_items si
        JOIN sales s ON s.id = si.sale_id
        WHERE si.product_id = $1
          AND s.status = 'completed'
          AND s.created_at >= NOW() - make_interval(days => $2::int)
        "#,
    )
    .bind(product_id)
    .bind(days)
    .fetch_one(pool)
    .await?;

    Ok(total.unwrap_or(0))
}

// ── Clients ───────────────────────────────────────────────────────────────────

pub async fn fetch_all_clients(pool: &PgPool) -> AppResult<Vec<Client>> {
    let clients = sqlx::query_as::<_, Client>(
        "SELECT id, name, email, phone, points, created_at, updated_at
         FROM clients ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(clients)
}

pub async fn fetch_client_by_id(pool: &PgPool, id: Uuid) -> AppResult<Client> {
    sqlx::query_as::<_, Client>(
        "SELECT id, name, email, phone, points, created_at, updated_at
         FROM clients WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))
}

pub async fn insert_client(pool: &PgPool, payload: &CreateClient) -> AppResult<Client> {
    let client = sqlx::query_as::<_, Client>(
        r#"
        INSERT INTO clients (name, email, phone)
        VALUES ($1, $2, $3)
        RETURNING id, name, email, phone, points, created_at, updated_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .fetch_one(pool)
    .await?;

    Ok(client)
}

pub async fn update_client(pool: &PgPool, id: Uuid, payload: &UpdateClient) -> AppResult<Client> {
    // Fetch existing to merge optional fields
    let existing = fetch_client_by_id(pool, id).await?;

    let client = sqlx::query_as::<_, Client>(
        r#"
        UPDATE clients
        SET name       = $1,
            email      = $2,
            phone      = $3,
            points     = $4,
            updated_at = NOW()
        WHERE id = $5
        RETURNING id, name, email, phone, points, created_at, updated_at
        "#,
    )
    .bind(payload.name.as_deref().unwrap_or(&existing.name))
    .bind(payload.email.as_deref().unwrap_or(&existing.email))
    .bind(payload.phone.as_deref().or(existing.phone.as_deref()))
    .bind(payload.points.unwrap_or(existing.points))
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(client)
}

pub async fn delete_client(pool: &PgPool, id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM clients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Client {} not found", id)));
    }
    Ok(())
}

// ── Employees ─────────────────────────────────────────────────────────────────

pub async fn fetch_all_employees(pool: &PgPool) -> AppResult<Vec<Employee>> {
    let employees = sqlx::query_as::<_, Employee>(
        "SELECT id, name, role, pin, created_at, updated_at
         FROM employees ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(employees)
}

pub async fn fetch_employee_by_id(pool: &PgPool, id: Uuid) -> AppResult<Employee> {
    sqlx::query_as::<_, Employee>(
        "SELECT id, name, role, pin, created_at, updated_at
         FROM employees WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", id)))
}

pub async fn fetch_employee_by_pin(pool: &PgPool, pin: &str) -> AppResult<Employee> {
    sqlx::query_as::<_, Employee>(
        "SELECT id, name, role, pin, created_at, updated_at
         FROM employees WHERE pin = $1",
    )
    .bind(pin)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No employee matches that pin".to_string()))
}

pub async fn insert_employee(pool: &PgPool, payload: &CreateEmployee) -> AppResult<Employee> {
    let employee = sqlx::query_as::<_, Employee>(
        r#"
        INSERT INTO employees (name, role, pin)
        VALUES ($1, $2, $3)
        RETURNING id, name, role, pin, created_at, updated_at
        "#,
    )
    .bind(&payload.name)
    .bind(payload.role)
    .bind(&payload.pin)
    .fetch_one(pool)
    .await?;

    Ok(employee)
}

pub async fn update_employee(
    pool: &PgPool,
    id: Uuid,
    payload: &UpdateEmployee,
) -> AppResult<Employee> {
    let existing = fetch_employee_by_id(pool, id).await?;

    let employee = sqlx::query_as::<_, Employee>(
        r#"
        UPDATE employees
        SET name       = $1,
            role       = $2,
            pin        = $3,
            updated_at = NOW()
        WHERE id = $4
        RETURNING id, name, role, pin, created_at, updated_at
        "#,
    )
    .bind(payload.name.as_deref().unwrap_or(&existing.name))
    .bind(payload.role.unwrap_or(existing.role))
    .bind(payload.pin.as_deref().unwrap_or(&existing.pin))
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(employee)
}

pub async fn delete_employee(pool: &PgPool, id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM employees WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Employee {} not found", id)));
    }
    Ok(())
}

// ── Sales (reads — all writes go through the ledger) ─────────────────────────

async fn fetch_items_for(
    pool: &PgPool,
    sale_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<SaleLineItem>>> {
    let items = sqlx::query_as::<_, SaleLineItem>(
        r#"
        SELECT id, sale_id, product_id, variant_id, product_name, variant_name,
               sku, unit_price_cents, quantity, created_at
        FROM sale_items
        WHERE sale_id = ANY($1)
        ORDER BY created_at, id
        "#,
    )
    .bind(sale_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<SaleLineItem>> = HashMap::with_capacity(sale_ids.len());
    for item in items {
        grouped.entry(item.sale_id).or_default().push(item);
    }
    Ok(grouped)
}

pub async fn fetch_all_sales(pool: &PgPool, limit: i64, offset: i64) -> AppResult<Vec<Sale>> {
    let rows = sqlx::query_as::<_, SaleRow>(
        r#"
        SELECT id, client_id, employee_id, subtotal_cents, discount_cents,
               total_cents, payment_method, amount_paid_cents, change_cents,
               status, created_at
        FROM sales
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit.min(10_000))
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut items = fetch_items_for(pool, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let sale_items = items.remove(&row.id).unwrap_or_default();
            row.into_sale(sale_items)
        })
        .collect())
}

pub async fn fetch_sale_by_id(pool: &PgPool, id: Uuid) -> AppResult<Sale> {
    let row = sqlx::query_as::<_, SaleRow>(
        r#"
        SELECT id, client_id, employee_id, subtotal_cents, discount_cents,
               total_cents, payment_method, amount_paid_cents, change_cents,
               status, created_at
        FROM sales
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Sale {} not found", id)))?;

    let mut items = fetch_items_for(pool, &[id]).await?;
    Ok(row.into_sale(items.remove(&id).unwrap_or_default()))
}
