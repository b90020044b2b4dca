use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use crate::db;
use crate::error::AppResult;
use crate::import::{ProductDraft, VariantDraft};
use crate::ledger;
use crate::models::{CreateClient, Product};

static ADJECTIVES: &[&str] = &[
    "Premium", "Deluxe", "Ultra", "Pro", "Classic", "Elite", "Smart", "Eco",
    "Compact", "Portable", "Heavy-Duty", "Lightweight", "Advanced", "Basic",
    "Professional", "Essential", "Signature", "Exclusive", "Standard", "Plus",
];

static NOUNS: &[&str] = &[
    "Laptop", "Mouse", "Keyboard", "Monitor", "Webcam", "Headset", "Speaker",
    "Charger", "Dock", "Hub", "Cable", "Stand", "Backpack", "Sleeve", "Lamp",
];

static VARIANT_NAMES: &[&str] = &[
    "Black", "White", "Silver", "Small", "Medium", "Large", "Standard",
    "256GB", "512GB", "Red Switch", "Blue Switch",
];

#[derive(Debug, Serialize)]
pub struct SeedSummary {
    pub products: usize,
    pub clients: usize,
    pub employees: usize,
}

/// A small fixed showcase catalog, only inserted into an empty catalog so
/// repeated seeding never trips the sku constraint.
fn showcase_catalog() -> Vec<ProductDraft> {
    vec![
        ProductDraft {
            name: "Laptop Pro 15\"".to_string(),
            min_stock_threshold: 5,
            lead_time_days: 14,
            daily_sale_rate: 0.8,
            variants: vec![
                VariantDraft {
                    name: "256GB SSD".to_string(),
                    sku: "LP-15-256".to_string(),
                    price_cents: 4_500_000,
                    quantity: 15,
                },
                VariantDraft {
                    name: "512GB SSD".to_string(),
                    sku: "LP-15-512".to_string(),
                    price_cents: 5_200_000,
                    quantity: 10,
                },
            ],
        },
        ProductDraft {
            name: "Ergo Wireless Mouse".to_string(),
            min_stock_threshold: 20,
            lead_time_days: 7,
            daily_sale_rate: 1.5,
            variants: vec![
                VariantDraft {
                    name: "Black".to_string(),
                    sku: "MS-ERG-BLK".to_string(),
                    price_cents: 180_000,
                    quantity: 8,
                },
                VariantDraft {
                    name: "White".to_string(),
                    sku: "MS-ERG-WHT".to_string(),
                    price_cents: 180_000,
                    quantity: 15,
                },
            ],
        },
        ProductDraft {
            name: "Mechanical RGB Keyboard".to_string(),
            min_stock_threshold: 15,
            lead_time_days: 10,
            daily_sale_rate: 0.5,
            variants: vec![
                VariantDraft {
                    name: "Red Switch".to_string(),
                    sku: "KB-MECH-RED".to_string(),
                    price_cents: 420_000,
                    quantity: 25,
                },
                VariantDraft {
                    name: "Blue Switch".to_string(),
                    sku: "KB-MECH-BLU".to_string(),
                    price_cents: 435_000,
                    quantity: 15,
                },
            ],
        },
        ProductDraft {
            name: "Ultrawide Monitor 34\"".to_string(),
            min_stock_threshold: 5,
            lead_time_days: 21,
            daily_sale_rate: 0.4,
            variants: vec![VariantDraft {
                name: "Standard".to_string(),
                sku: "MN-UW-34".to_string(),
                price_cents: 2_800_000,
                quantity: 12,
            }],
        },
        ProductDraft {
            name: "HD Webcam 1080p".to_string(),
            min_stock_threshold: 10,
            lead_time_days: 5,
            daily_sale_rate: 1.2,
            variants: vec![VariantDraft {
                name: "Standard".to_string(),
                sku: "WC-HD-1080".to_string(),
                price_cents: 250_000,
                quantity: 0,
            }],
        },
    ]
}

/// Generate a random product draft; the serial keeps names and skus unique.
fn random_product(rng: &mut impl Rng, serial: usize) -> ProductDraft {
    let adj = ADJECTIVES.choose(rng).unwrap_or(&"Standard");
    let noun = NOUNS.choose(rng).unwrap_or(&"Widget");
    let variant_count = rng.gen_range(1..=3);

    let variants = (0..variant_count)
        .map(|i| VariantDraft {
            name: VARIANT_NAMES.choose(rng).unwrap_or(&"Standard").to_string(),
            sku: format!("SEED-{serial:05}-{i}"),
            price_cents: rng.gen_range(99..=999_99),
            quantity: rng.gen_range(0..=500),
        })
        .collect();

    ProductDraft {
        name: format!("{} {} #{:05}", adj, noun, serial),
        min_stock_threshold: rng.gen_range(0..=25),
        lead_time_days: rng.gen_range(3..=21),
        daily_sale_rate: rng.gen_range(0.0..3.0),
        variants,
    }
}

/// Seed the database with the showcase catalog, `count` random products, and
/// a demo roster of clients and employees.
pub async fn seed_demo(pool: &PgPool, count: usize) -> AppResult<SeedSummary> {
    info!("Seeding demo data ({} random products)...", count);

    // StdRng is Send + Sync — safe to hold across async await points
    let mut rng = StdRng::from_entropy();

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;

    let mut drafts: Vec<ProductDraft> = Vec::new();
    if existing == 0 {
        drafts.extend(showcase_catalog());
    }
    let serial_base = existing as usize;
    for i in 0..count {
        drafts.push(random_product(&mut rng, serial_base + i));
    }

    let batch_size = 500_usize;
    let mut products: Vec<Product> = Vec::with_capacity(drafts.len());
    for chunk in drafts.chunks(batch_size) {
        products.extend(ledger::bulk_import(pool, chunk).await?);
    }

    let clients = seed_clients(pool).await?;
    let employees = seed_employees(pool).await?;

    info!(
        products = products.len(),
        clients, employees, "Seeding complete"
    );

    Ok(SeedSummary {
        products: products.len(),
        clients,
        employees,
    })
}

async fn seed_clients(pool: &PgPool) -> AppResult<usize> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(0);
    }

    let roster = [
        ("Carlos Ramírez", "carlos.r@email.com", "3101234567"),
        ("Luisa Fernanda", "luisa.f@email.com", "3209876543"),
    ];

    for (name, email, phone) in roster {
        db::insert_client(
            pool,
            &CreateClient {
                name: name.to_string(),
                email: email.to_string(),
                phone: Some(phone.to_string()),
            },
        )
        .await?;
    }

    Ok(roster.len())
}

async fn seed_employees(pool: &PgPool) -> AppResult<usize> {
    // Conflict target is the pin, so repeated seeding is a no-op.
    let roster = [
        ("Marta Gómez", "admin", "1234"),
        ("Andrés Peña", "cashier", "5678"),
        ("Sofía Torres", "inventory", "4321"),
    ];

    let mut inserted = 0;
    for (name, role, pin) in roster {
        let result = sqlx::query(
            r#"
            INSERT INTO employees (name, role, pin)
            VALUES ($1, $2::employee_role, $3)
            ON CONFLICT (pin) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(role)
        .bind(pin)
        .execute(pool)
        .await?;
        inserted += result.rows_affected() as usize;
    }

    Ok(inserted)
}
