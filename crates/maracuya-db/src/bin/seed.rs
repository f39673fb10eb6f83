//! # Seed Data Generator
//!
//! Populates a fresh database with the demo data a new installation needs:
//! users, the canteen menu and a handful of registered families.
//!
//! ## Usage
//! ```bash
//! cargo run -p maracuya-db --bin seed
//!
//! # Specify database path
//! cargo run -p maracuya-db --bin seed -- --db ./data/maracuya.db
//! ```
//!
//! ## Default Credentials
//! | code  | PIN  | role    |
//! |-------|------|---------|
//! | admin | 1234 | admin   |
//! | caja1 | 5678 | cashier |
//!
//! Change both PINs before going live.

use chrono::Utc;
use std::env;
use uuid::Uuid;

use maracuya_core::{Client, Product, Role, User};
use maracuya_db::{Database, DbConfig};

/// The canteen menu: (name, category, price in céntimos, needs kitchen).
const MENU: &[(&str, &str, i64, bool)] = &[
    ("Menú del día", "Almuerzo", 850, true),
    ("Menú escolar", "Almuerzo", 700, true),
    ("Segundo solo", "Almuerzo", 600, true),
    ("Sopa del día", "Almuerzo", 350, true),
    ("Empanada de pollo", "Snacks", 350, true),
    ("Empanada de carne", "Snacks", 350, true),
    ("Sandwich mixto", "Snacks", 450, true),
    ("Papa rellena", "Snacks", 400, true),
    ("Galletas de avena", "Snacks", 200, false),
    ("Queque de plátano", "Snacks", 250, false),
    ("Jugo de maracuyá", "Bebidas", 450, false),
    ("Jugo de papaya", "Bebidas", 450, false),
    ("Chicha morada", "Bebidas", 300, false),
    ("Limonada", "Bebidas", 300, false),
    ("Agua mineral", "Bebidas", 200, false),
    ("Infusión", "Bebidas", 200, false),
];

/// Demo families: (code, names, last names, grade, level, has account).
const FAMILIES: &[(&str, &str, &str, &str, &str, bool)] = &[
    ("C001", "Ana", "Quispe Mamani", "3B", "Primaria", true),
    ("C002", "Bruno", "Díaz Torres", "5A", "Primaria", true),
    ("C003", "Carla", "Huamán Rojas", "1C", "Secundaria", true),
    ("C004", "Diego", "Flores Paredes", "2A", "Secundaria", false),
    ("C005", "Elena", "Castro Vega", "4B", "Primaria", true),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./maracuya_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Maracuyá POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./maracuya_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Maracuyá POS Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().list_all().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} products", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Users
    println!();
    println!("Creating users...");
    seed_user(&db, "admin", "Administración", "1234", Role::Admin).await?;
    seed_user(&db, "caja1", "Caja Uno", "5678", Role::Cashier).await?;
    println!("✓ 2 users (admin/1234, caja1/5678; change before going live)");

    // Menu
    println!();
    println!("Creating products...");
    let now = Utc::now();
    for (name, category, price_centimos, is_kitchen) in MENU {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: (*name).to_string(),
            category: Some((*category).to_string()),
            price_centimos: *price_centimos,
            is_kitchen: *is_kitchen,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
    }
    println!("✓ {} products", MENU.len());

    // Families
    println!();
    println!("Creating clients...");
    for (code, names, last_names, grade, level, has_account) in FAMILIES {
        let client = Client {
            id: Uuid::new_v4().to_string(),
            code: (*code).to_string(),
            names: (*names).to_string(),
            last_names: (*last_names).to_string(),
            full_name: format!("{} {}", names, last_names),
            has_account: *has_account,
            is_active: true,
            grade: Some((*grade).to_string()),
            level: Some((*level).to_string()),
            debt_centimos: 0,
            created_at: now,
            updated_at: now,
        };
        db.clients().insert(&client).await?;
    }
    println!("✓ {} clients (plus the walk-in sentinel from migrations)", FAMILIES.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

async fn seed_user(
    db: &Database,
    code: &str,
    name: &str,
    pin: &str,
    role: Role,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        name: name.to_string(),
        pin_hash: bcrypt::hash(pin, bcrypt::DEFAULT_COST)?,
        role,
        is_active: true,
        created_at: Utc::now(),
    };
    db.users().insert(&user).await?;
    Ok(())
}
