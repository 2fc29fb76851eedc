//! # Seed Data Generator
//!
//! Stocks one store with a demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default store "Sinkor"
//! cargo run -p lonestar-db --bin seed
//!
//! # Another store, another file
//! cargo run -p lonestar-db --bin seed -- --store Paynesville --db ./data/lonestar.db
//!
//! # Price USD items at a different rate (fresh database only)
//! cargo run -p lonestar-db --bin seed -- --rate 192.5
//! ```
//!
//! Products priced in USD get their LRD price from the rate; LRD-only
//! products carry no USD price and are left alone by rate updates.

use lonestar_core::period;
use lonestar_core::{ExchangeRate, Money, Product, DEFAULT_LRD_PER_USD};
use lonestar_db::{generate_id, Database, DbConfig};
use std::env;
use tracing_subscriber::EnvFilter;

/// (category, shelf prefix, [(name, usd cents or 0, lrd cents)])
const CATALOG: &[(&str, &str, &[(&str, i64, i64)])] = &[
    (
        "Grocery",
        "A",
        &[
            ("Rice 25kg Bag", 1_800, 0),
            ("Rice 50kg Bag", 3_400, 0),
            ("Palm Oil 1L", 0, 45_000),
            ("Palm Oil 5L", 0, 210_000),
            ("Cassava Flour 2kg", 0, 30_000),
            ("Sugar 1kg", 150, 0),
            ("Bouillon Cubes (box)", 0, 12_500),
            ("Tomato Paste 400g", 0, 9_000),
        ],
    ),
    (
        "Beverages",
        "B",
        &[
            ("Club Beer 600ml", 0, 25_000),
            ("Coca-Cola 35cl", 0, 10_000),
            ("Bottled Water 1.5L", 0, 7_500),
            ("Malta Guinness", 0, 15_000),
        ],
    ),
    (
        "Household",
        "C",
        &[
            ("Bar Soap", 0, 5_000),
            ("Laundry Powder 1kg", 300, 0),
            ("Kerosene 1L", 0, 35_000),
            ("Charcoal Bag", 0, 40_000),
        ],
    ),
    (
        "Phones",
        "D",
        &[
            ("Lonestar Scratch Card $5", 500, 0),
            ("Orange Scratch Card $5", 500, 0),
            ("Phone Charger", 700, 0),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut store = String::from("Sinkor");
    let mut db_path = String::from("./lonestar_dev.db");
    let mut rate = DEFAULT_LRD_PER_USD;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--store" | "-s" => {
                if i + 1 < args.len() {
                    store = args[i + 1].clone();
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--rate" | "-r" => {
                if i + 1 < args.len() {
                    rate = args[i + 1].parse().unwrap_or(DEFAULT_LRD_PER_USD);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Lonestar POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --store <NAME>   Store to stock (default: Sinkor)");
                println!("  -d, --db <PATH>      Database file path (default: ./lonestar_dev.db)");
                println!("  -r, --rate <LRD>     LRD per USD for USD-priced items (default: {DEFAULT_LRD_PER_USD})");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let requested = ExchangeRate::from_decimal(rate)?;

    println!("🌱 Lonestar POS Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!("Store:    {}", store);

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // An existing database keeps its rate so seeded prices match the catalog
    let rate = db.currency_rates().current(requested).await?.rate;
    println!("Rate:     {} LRD/USD", rate);
    println!();

    let existing = db.products().count(&store).await?;
    if existing > 0 {
        println!("⚠ {} already has {} products", store, existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut generated = 0;
    let mut seq = 0;
    for (category, shelf, products) in CATALOG {
        for (idx, (name, usd, lrd)) in products.iter().enumerate() {
            seq += 1;
            let product = demo_product(&store, category, shelf, idx, seq, name, *usd, *lrd, rate);
            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }
            generated += 1;
        }
    }

    let stocked = db.products().list_by_store(&store).await?;
    let value: Money = stocked.iter().map(|p| p.stock_value_lrd()).sum();

    println!();
    println!("✓ Generated {} products", generated);
    println!("  Stock value: L${}", value);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn demo_product(
    store: &str,
    category: &str,
    shelf: &str,
    idx: usize,
    seq: usize,
    name: &str,
    usd_cents: i64,
    lrd_cents: i64,
    rate: ExchangeRate,
) -> Product {
    let now = period::now();
    let price_usd = (usd_cents > 0).then(|| Money::from_cents(usd_cents));
    let price_lrd = match price_usd {
        Some(usd) => rate.to_lrd(usd),
        None => Money::from_cents(lrd_cents),
    };
    let quantity = 10 + ((idx * 7) % 40) as i64;

    Product {
        id: generate_id(),
        store: store.to_string(),
        name: name.to_string(),
        quantity,
        price_usd,
        price_lrd,
        total_lrd: Some(price_lrd.times(quantity)),
        category: Some(category.to_string()),
        barcode: Some(format!("6180{:09}", seq)),
        shelf_location: Some(format!("{}{}", shelf, idx + 1)),
        created_at: now,
        updated_at: now,
    }
}
