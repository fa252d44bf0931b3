//! Edit Session Walkthrough
//!
//! Stages a small menu restructure against the in-memory backend, commits it
//! with one injected failure, then retries.
//!
//! Run: RUST_LOG=menu_editor=debug cargo run --example edit_session

use std::sync::Arc;

use menu_editor::{EditSession, EditorConfig, EntityKind, MemoryBackend, PersistError};
use rust_decimal::Decimal;
use shared::models::{Category, Dish, Restaurant, RestaurantUpdate};
use shared::staged::ActionKind;
use tracing_subscriber::EnvFilter;

fn print_menu(session: &EditSession) {
    for category in session.merged_menu() {
        println!("  [{}] {}", category.id(), category.category.name);
        for dish in &category.dishes {
            println!("      {} {} ({})", dish.id, dish.title, dish.price);
        }
    }
    println!("  unsaved changes: {}\n", session.has_unsaved_changes());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let backend = Arc::new(MemoryBackend::new());
    backend.insert_restaurant(Restaurant {
        id: 1,
        name: "Corner Cafe".to_string(),
        logo_url: None,
        slug: "corner-cafe".to_string(),
        user_id: "owner-1".to_string(),
        created_at: None,
        updated_at: None,
    });
    let drinks = backend.insert_category(1, "Drinks");
    let espresso = backend.insert_dish(Dish::draft(drinks.id, "Espresso", Decimal::new(250, 2)));

    let session = EditSession::new(backend.clone(), EditorConfig::from_env());
    session.load(1).await?;
    println!("Loaded:");
    print_menu(&session);

    // New category with a dish under its temporary id
    let pastries = Category::draft(1, "Pastries");
    session.stage_category(pastries.id, ActionKind::Create, pastries.clone())?;
    let croissant = Dish::draft(pastries.id, "Croissant", Decimal::new(320, 2));
    session.stage_dish(croissant.id, ActionKind::Create, croissant)?;

    // Price change on an existing dish
    let mut repriced = espresso.clone();
    repriced.price = Decimal::new(280, 2);
    session.stage_dish(repriced.id, ActionKind::Update, repriced)?;

    session.update_restaurant(RestaurantUpdate::new(1).with_name("Corner Cafe & Bakery"))?;
    let slug = session.assign_slug("Corner Cafe & Bakery").await?;
    println!("Staged (slug {slug}):");
    print_menu(&session);

    backend.fail_on(
        EntityKind::Dish,
        espresso.id,
        PersistError::Transport("connection reset by peer".to_string()),
    );
    let report = session.commit().await?;
    println!("First commit, complete: {}", report.is_complete());
    for failure in report.failures() {
        println!("  {} {} {}: {}", failure.action, failure.kind, failure.id, failure.status);
    }
    print_menu(&session);

    let report = session.commit().await?;
    println!("Retry, complete: {}", report.is_complete());
    print_menu(&session);

    Ok(())
}
