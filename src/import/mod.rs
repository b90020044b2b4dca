//! CSV bulk-import parsing: flat rows grouped into products with variants.
//!
//! Rows sharing a product name become variants of one product, first-seen
//! order preserved. Parsing is pure — persistence happens in the ledger, in
//! one transaction, only after every row has validated (all-or-nothing).

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{AppError, AppResult};

pub const REQUIRED_COLUMNS: &[&str] = &[
    "productName",
    "variantName",
    "sku",
    "unitPrice",
    "quantity",
    "minStockThreshold",
];

/// One data row as read from the file. Numeric fields stay as text here so
/// validation can report exactly which field of which row failed to parse.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "productName")]
    product_name: String,
    #[serde(rename = "variantName")]
    variant_name: String,
    sku: String,
    #[serde(rename = "unitPrice")]
    unit_price: String,
    quantity: String,
    #[serde(rename = "minStockThreshold")]
    min_stock_threshold: String,
    #[serde(rename = "leadTimeDays", default)]
    lead_time_days: Option<String>,
    #[serde(rename = "dailySaleRate", default)]
    daily_sale_rate: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantDraft {
    pub name: String,
    pub sku: String,
    pub price_cents: i64,
    pub quantity: i32,
}

/// A validated, grouped product ready for a batch insert. Ids are assigned
/// by the store on persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub min_stock_threshold: i32,
    pub lead_time_days: i32,
    pub daily_sale_rate: f64,
    pub variants: Vec<VariantDraft>,
}

/// Default supplier lead time when the file does not carry the column.
const DEFAULT_LEAD_TIME_DAYS: i32 = 7;

/// Parses, validates, and groups a catalog CSV. The first invalid row aborts
/// the whole import; row numbers in errors are 1-based and account for the
/// header row (data row k is reported as row k + 1).
pub fn parse_catalog(bytes: &[u8]) -> AppResult<Vec<ProductDraft>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("unreadable CSV header: {e}")))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(AppError::BadRequest(format!(
                "missing required column '{column}'"
            )));
        }
    }

    let mut grouped: IndexMap<String, ProductDraft> = IndexMap::new();
    // sku -> row number of first occurrence, for duplicate reporting
    let mut seen_skus: HashMap<String, usize> = HashMap::new();

    for (index, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row_number = index + 2; // 1-based, header is row 1

        let row = record
            .map_err(|e| AppError::BadRequest(format!("row {row_number}: unreadable ({e})")))?;

        let variant = validate_row(&row, row_number)?;

        if let Some(first_seen) = seen_skus.insert(variant.sku.clone(), row_number) {
            return Err(AppError::Conflict(format!(
                "row {row_number}: sku '{}' already used at row {first_seen}",
                variant.sku
            )));
        }

        // First row of a group fixes the product-level fields; later rows for
        // the same name only contribute variants.
        let entry = grouped.entry(row.product_name.clone());
        let product = match entry {
            indexmap::map::Entry::Occupied(o) => o.into_mut(),
            indexmap::map::Entry::Vacant(v) => {
                let min_stock_threshold = parse_non_negative_int(
                    &row.min_stock_threshold,
                    "minStockThreshold",
                    row_number,
                )?;
                let lead_time_days = match &row.lead_time_days {
                    Some(s) if !s.is_empty() => {
                        parse_non_negative_int(s, "leadTimeDays", row_number)?
                    }
                    _ => DEFAULT_LEAD_TIME_DAYS,
                };
                let daily_sale_rate = match &row.daily_sale_rate {
                    Some(s) if !s.is_empty() => {
                        parse_non_negative_float(s, "dailySaleRate", row_number)?
                    }
                    _ => 0.0,
                };
                v.insert(ProductDraft {
                    name: row.product_name.clone(),
                    min_stock_threshold,
                    lead_time_days,
                    daily_sale_rate,
                    variants: Vec::new(),
                })
            }
        };

        product.variants.push(variant);
    }

    if grouped.is_empty() {
        return Err(AppError::BadRequest(
            "the file contains no data rows".to_string(),
        ));
    }

    Ok(grouped.into_values().collect())
}

fn validate_row(row: &CsvRow, row_number: usize) -> AppResult<VariantDraft> {
    for (field, value) in [
        ("productName", &row.product_name),
        ("variantName", &row.variant_name),
        ("sku", &row.sku),
        ("unitPrice", &row.unit_price),
        ("quantity", &row.quantity),
        ("minStockThreshold", &row.min_stock_threshold),
    ] {
        if value.is_empty() {
            return Err(AppError::BadRequest(format!(
                "row {row_number}: '{field}' is empty"
            )));
        }
    }

    let price: f64 = row.unit_price.parse().map_err(|_| {
        AppError::BadRequest(format!(
            "row {row_number}: 'unitPrice' is not a number ('{}')",
            row.unit_price
        ))
    })?;
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::BadRequest(format!(
            "row {row_number}: 'unitPrice' must be positive"
        )));
    }

    let quantity = parse_non_negative_int(&row.quantity, "quantity", row_number)?;

    // minStockThreshold is validated here even for non-first rows of a group,
    // so a bad value is always reported against its own row.
    parse_non_negative_int(&row.min_stock_threshold, "minStockThreshold", row_number)?;

    Ok(VariantDraft {
        name: row.variant_name.clone(),
        sku: row.sku.clone(),
        price_cents: (price * 100.0).round() as i64,
        quantity,
    })
}

fn parse_non_negative_int(value: &str, field: &str, row_number: usize) -> AppResult<i32> {
    let parsed: i32 = value.parse().map_err(|_| {
        AppError::BadRequest(format!(
            "row {row_number}: '{field}' is not an integer ('{value}')"
        ))
    })?;
    if parsed < 0 {
        return Err(AppError::BadRequest(format!(
            "row {row_number}: '{field}' must be >= 0"
        )));
    }
    Ok(parsed)
}

fn parse_non_negative_float(value: &str, field: &str, row_number: usize) -> AppResult<f64> {
    let parsed: f64 = value.parse().map_err(|_| {
        AppError::BadRequest(format!(
            "row {row_number}: '{field}' is not a number ('{value}')"
        ))
    })?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(AppError::BadRequest(format!(
            "row {row_number}: '{field}' must be >= 0"
        )));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "productName,variantName,sku,unitPrice,quantity,minStockThreshold";

    fn parse(rows: &[&str]) -> AppResult<Vec<ProductDraft>> {
        let csv = format!("{HEADER}\n{}", rows.join("\n"));
        parse_catalog(csv.as_bytes())
    }

    fn message(result: AppResult<Vec<ProductDraft>>) -> String {
        result.expect_err("expected import to fail").to_string()
    }

    // ── grouping ──────────────────────────────────────────────────────────────

    #[test]
    fn rows_with_same_name_group_into_one_product() {
        let products = parse(&[
            "Shirt,Red,SH-R,10000,5,2",
            "Shirt,Blue,SH-B,12000,3,2",
        ])
        .unwrap();

        assert_eq!(products.len(), 1);
        let shirt = &products[0];
        assert_eq!(shirt.name, "Shirt");
        assert_eq!(shirt.min_stock_threshold, 2);
        assert_eq!(shirt.variants.len(), 2);
        assert_eq!(shirt.variants[0].sku, "SH-R");
        assert_eq!(shirt.variants[0].quantity, 5);
        assert_eq!(shirt.variants[0].price_cents, 1_000_000);
        assert_eq!(shirt.variants[1].sku, "SH-B");
        assert_eq!(shirt.variants[1].quantity, 3);
        assert_eq!(shirt.variants[1].price_cents, 1_200_000);
    }

    #[test]
    fn first_seen_order_is_preserved() {
        let products = parse(&[
            "Mouse,Black,MS-B,180,8,20",
            "Laptop,256GB,LP-256,45000,15,5",
            "Mouse,White,MS-W,180,15,20",
        ])
        .unwrap();

        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Mouse", "Laptop"]);
        assert_eq!(products[0].variants.len(), 2);
    }

    #[test]
    fn threshold_comes_from_first_row_of_group() {
        let products = parse(&[
            "Shirt,Red,SH-R,100,5,2",
            "Shirt,Blue,SH-B,100,3,99",
        ])
        .unwrap();
        assert_eq!(products[0].min_stock_threshold, 2);
    }

    #[test]
    fn optional_columns_are_parsed_when_present() {
        let csv = format!(
            "{HEADER},leadTimeDays,dailySaleRate\nLaptop,256GB,LP-256,45000,15,5,14,0.8"
        );
        let products = parse_catalog(csv.as_bytes()).unwrap();
        assert_eq!(products[0].lead_time_days, 14);
        assert!((products[0].daily_sale_rate - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn optional_columns_default_when_absent() {
        let products = parse(&["Laptop,256GB,LP-256,45000,15,5"]).unwrap();
        assert_eq!(products[0].lead_time_days, 7);
        assert_eq!(products[0].daily_sale_rate, 0.0);
    }

    // ── per-row validation ────────────────────────────────────────────────────

    #[test]
    fn empty_field_reports_row_and_field() {
        let msg = message(parse(&[
            "Shirt,Red,SH-R,100,5,2",
            "Shirt,,SH-B,100,3,2",
        ]));
        assert!(msg.contains("row 3"), "message was: {msg}");
        assert!(msg.contains("variantName"), "message was: {msg}");
    }

    #[test]
    fn non_numeric_quantity_reports_row_and_field() {
        let msg = message(parse(&["Shirt,Red,SH-R,100,lots,2"]));
        assert!(msg.contains("row 2"), "message was: {msg}");
        assert!(msg.contains("quantity"), "message was: {msg}");
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let msg = message(parse(&["Shirt,Red,SH-R,100,-1,2"]));
        assert!(msg.contains("quantity"), "message was: {msg}");
    }

    #[test]
    fn zero_price_is_rejected() {
        let msg = message(parse(&["Shirt,Red,SH-R,0,5,2"]));
        assert!(msg.contains("unitPrice"), "message was: {msg}");
    }

    #[test]
    fn bad_threshold_on_later_row_is_reported_against_that_row() {
        let msg = message(parse(&[
            "Shirt,Red,SH-R,100,5,2",
            "Shirt,Blue,SH-B,100,3,-4",
        ]));
        assert!(msg.contains("row 3"), "message was: {msg}");
        assert!(msg.contains("minStockThreshold"), "message was: {msg}");
    }

    #[test]
    fn missing_column_is_rejected_up_front() {
        let csv = "productName,variantName,sku,unitPrice,quantity\nShirt,Red,SH-R,100,5";
        let msg = message(parse_catalog(csv.as_bytes()));
        assert!(msg.contains("minStockThreshold"), "message was: {msg}");
    }

    #[test]
    fn empty_file_is_rejected() {
        let msg = message(parse(&[]));
        assert!(msg.contains("no data rows"), "message was: {msg}");
    }

    // ── sku uniqueness ────────────────────────────────────────────────────────

    #[test]
    fn duplicate_sku_across_products_is_rejected() {
        let msg = message(parse(&[
            "Shirt,Red,SAME-SKU,100,5,2",
            "Pants,Blue,SAME-SKU,200,3,2",
        ]));
        assert!(msg.contains("SAME-SKU"), "message was: {msg}");
        assert!(msg.contains("row 3"), "message was: {msg}");
    }

    #[test]
    fn duplicate_sku_within_a_product_is_rejected() {
        let result = parse(&[
            "Shirt,Red,SH-1,100,5,2",
            "Shirt,Blue,SH-1,100,3,2",
        ]);
        assert!(result.is_err());
    }
}
