//! # Seed Data Generator
//!
//! Populates a pharmacy database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./pharmacy_dev.db with 200 products (default)
//! cargo run -p pharmacy-db --bin seed
//!
//! # Generate a custom amount
//! cargo run -p pharmacy-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p pharmacy-db --bin seed -- --db ./data/pharmacy.db
//! ```
//!
//! ## Generated Data
//! - Categories and companies from fixed lists
//! - Products cycling through both, every third one a drug with two batches
//! - A handful of clients
//! - An `admin` account with every permission (password `admin` unless
//!   `--admin-password` is given)

use chrono::{Days, Local};
use std::env;

use pharmacy_core::{Drug, DrugBatch, NewClient, NewUser, Product, UserPermissions};
use pharmacy_db::{Database, DbConfig};

const CATEGORIES: &[&str] = &[
    "Painkillers",
    "Antibiotics",
    "Vitamins",
    "Baby care",
    "Skin care",
    "First aid",
];

const COMPANIES: &[&str] = &["Bayer", "Pfizer", "Sanofi", "Novartis", "Cinfa"];

/// Base product names; combined with a strength to make each one unique.
const PRODUCTS: &[&str] = &[
    "Aspirin",
    "Ibuprofen",
    "Paracetamol",
    "Amoxicillin",
    "Vitamin C",
    "Vitamin D",
    "Zinc tablets",
    "Nappy cream",
    "Sun lotion",
    "Plasters",
    "Gauze",
    "Antiseptic",
];

const STRENGTHS: &[&str] = &["", "100mg", "250mg", "500mg", "1g", "family pack"];

const CLIENTS: &[(&str, &str, &str)] = &[
    ("Ana Ruiz", "12 High Street", "+34 600 111 222"),
    ("Luis Gil", "3 Low Road", "+34 600 333 444"),
    ("Marta Sanz", "48 Church Lane", ""),
    ("Pablo Ortega", "", "+34 611 555 666"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./pharmacy_dev.db");
    let mut admin_password = String::from("admin");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-password" => {
                if i + 1 < args.len() {
                    admin_password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Pharmacy Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>            Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>            Database file path (default: ./pharmacy_dev.db)");
                println!("      --admin-password <PW>  Password for the admin account (default: admin)");
                println!("  -h, --help                 Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Pharmacy Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalogue
    let mut category_codes = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        category_codes.push(db.categories().create(name).await?.code);
    }
    let mut company_codes = Vec::with_capacity(COMPANIES.len());
    for name in COMPANIES {
        company_codes.push(db.companies().create(name).await?.code);
    }
    println!(
        "✓ {} categories, {} companies",
        category_codes.len(),
        company_codes.len()
    );

    // Products and drugs
    let start = std::time::Instant::now();
    let today = Local::now().date_naive();
    let mut generated = 0;
    let mut drugs = 0;

    'outer: for strength in STRENGTHS {
        for name in PRODUCTS {
            if generated >= count {
                break 'outer;
            }

            let seed = generated + 1;
            let product = generate_product(
                seed as i64,
                name,
                strength,
                company_codes[seed % company_codes.len()],
                category_codes[seed % category_codes.len()],
            );

            let result = if seed % 3 == 0 {
                let mut drug = Drug::new(product.clone(), seed % 2 == 0);
                let half = product.quantity / 2;
                for (n, (qty, days)) in [(half, 20 + seed as u64 % 30), (product.quantity - half, 365)]
                    .into_iter()
                    .enumerate()
                {
                    drug.batches.push(DrugBatch {
                        batch_code: format!("L{:06}-{}", seed, n + 1),
                        product_code: product.code,
                        quantity: qty,
                        expiration_date: today
                            .checked_add_days(Days::new(days))
                            .unwrap_or(today),
                    });
                }
                drugs += 1;
                db.drugs().insert(&drug).await
            } else {
                db.products().insert(&product).await
            };

            if let Err(e) = result {
                eprintln!("Failed to insert {}: {}", product.display_code(), e);
                continue;
            }

            generated += 1;

            if generated % 100 == 0 {
                println!("  Generated {} products...", generated);
            }
        }
    }

    let elapsed = start.elapsed();
    println!(
        "✓ Generated {} products ({} drugs) in {:?}",
        generated, drugs, elapsed
    );

    // Clients
    for (fullname, address, phone) in CLIENTS {
        db.clients()
            .insert(&NewClient {
                fullname: fullname.to_string(),
                address: address.to_string(),
                phone: phone.to_string(),
            })
            .await?;
    }
    println!("✓ {} clients", CLIENTS.len());

    // Administrator
    if db.users().get_by_username("admin").await?.is_none() {
        let admin = db
            .users()
            .insert(&NewUser {
                username: "admin".to_string(),
                password: admin_password,
                full_name: "Administrator".to_string(),
                permissions: UserPermissions::all(),
            })
            .await?;
        println!("✓ Created user '{}' with every permission", admin.username);
    }

    let low = db.products().below_limit().await?;
    println!();
    println!("Verifying...");
    println!("  Products at or below their limit: {}", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with plausible prices and stock levels.
fn generate_product(
    code: i64,
    name: &str,
    strength: &str,
    company_code: i64,
    category_code: i64,
) -> Product {
    let seed = code as usize;

    // Cost: 0.50 - 15.49
    let purchase_cost_cents = 50 + ((seed * 37) % 1500) as i64;

    // Markup: 30% - 79%
    let markup_pct = 130 + (seed % 50) as i64;
    let selling_price_cents = purchase_cost_cents * markup_pct / 100;

    let full_name = if strength.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, strength)
    };

    Product {
        code,
        name: full_name,
        purchase_cost_cents,
        selling_price_cents,
        quantity: (seed % 61) as i64,
        quantity_limit: 5 + (seed % 6) as i64,
        company_code: Some(company_code),
        category_code: Some(category_code),
    }
}
