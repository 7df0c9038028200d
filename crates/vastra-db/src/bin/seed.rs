//! # Seed Data Generator
//!
//! Populates the database with a clothing catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p vastra-db --bin seed
//!
//! # Fewer variants per style
//! cargo run -p vastra-db --bin seed -- --variants 3
//!
//! # Specify database path
//! cargo run -p vastra-db --bin seed -- --db ./data/kalan_vastralya.db
//! ```
//!
//! ## Generated Products
//! Every style gets `--variants` barcodes (sizes / colours), e.g.
//! `SAR-KAN-003`, with a stock of 0-40 and a cost of 55-75% of the sale
//! price. Rows go through the same importer as an uploaded sheet, so
//! categories and manufacturers are created on the way.

use std::env;
use vastra_core::ImportCells;
use vastra_db::{Database, DbConfig};

/// (category, barcode prefix, base price in rupees, styles)
const CATEGORIES: &[(&str, &str, i64, &[&str])] = &[
    ("Sarees", "SAR", 1800, &["Kanjivaram", "Banarasi", "Chanderi", "Paithani", "Patola"]),
    ("Kurtis", "KUR", 650, &["Anarkali", "Straight Cut", "A-Line", "Kaftan"]),
    ("Lehengas", "LEH", 4500, &["Bridal", "Festive", "Chaniya Choli"]),
    ("Dupattas", "DUP", 350, &["Phulkari", "Bandhani", "Chikankari"]),
    ("Dress Materials", "DRM", 900, &["Cotton Suit", "Silk Suit", "Georgette Suit"]),
    ("Kids Wear", "KID", 450, &["Pattu Pavadai", "Kurta Set", "Frock"]),
];

const MANUFACTURERS: &[&str] = &[
    "Kanchi Weavers",
    "Varanasi Silk House",
    "Jaipur Prints",
    "Lucknow Chikan Co",
    "Surat Textiles",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut variants: usize = 6;
    let mut db_path = String::from("./data/kalan_vastralya.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-v" | "--variants" => {
                if i + 1 < args.len() {
                    variants = args[i + 1].parse().unwrap_or(6);
                    i += 1;
                }
            }
            "-d" | "--db" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "-h" | "--help" => {
                println!("Vastra POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -v, --variants <N> Barcodes per style (default: 6)");
                println!("  -d, --db <PATH>    Database file path (default: ./data/kalan_vastralya.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Vastra POS Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().list().await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid overwriting stock.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let rows = generate_rows(variants);
    let start = std::time::Instant::now();
    let report = db.importer().import(&rows).await?;

    println!(
        "✓ Imported {} products in {:?}",
        report.imported(),
        start.elapsed()
    );
    for failure in &report.errors {
        eprintln!("  row {}: {}", failure.row, failure.error);
    }

    println!(
        "  Categories: {}, manufacturers: {}",
        db.catalog().categories().await?.len(),
        db.catalog().manufacturers().await?.len()
    );
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

fn generate_rows(variants: usize) -> Vec<ImportCells> {
    let mut rows = Vec::new();
    let mut seed: usize = 0;

    for (category, prefix, base_price, styles) in CATEGORIES {
        for style in styles.iter() {
            let style_code: String = style
                .chars()
                .filter(|c| c.is_ascii_alphabetic())
                .take(3)
                .collect::<String>()
                .to_uppercase();

            for variant in 1..=variants {
                seed += 1;

                let sale_price = base_price + ((seed * 37) % 20) as i64 * 50;
                let cost_pct = 55 + (seed % 21) as i64;
                let cost_price = sale_price * cost_pct / 100;

                rows.push(ImportCells {
                    barcode: format!("{prefix}-{style_code}-{variant:03}"),
                    category: category.to_string(),
                    manufacturer: MANUFACTURERS[seed % MANUFACTURERS.len()].to_string(),
                    quantity: ((seed * 7) % 41).to_string(),
                    cost_price: cost_price.to_string(),
                    sale_price: sale_price.to_string(),
                });
            }
        }
    }

    rows
}
