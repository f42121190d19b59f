//! Demo catalog and accounts for local runs.

use common::Money;
use domain::{Category, Product, ProductDraft, Role, User};
use store::Store;

use crate::error::Result;

const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300";

/// What [`seed_demo_data`] inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub products: usize,
}

fn demo_users() -> Vec<(&'static str, &'static str, Role)> {
    vec![
        ("Admin User", "admin@example.com", Role::Admin),
        ("John Doe", "john@example.com", Role::User),
    ]
}

fn demo_products() -> Vec<ProductDraft> {
    let draft = |name: &str,
                 description: &str,
                 cents: i64,
                 category: Category,
                 stock: i64,
                 brand: &str,
                 featured: bool| ProductDraft {
        name: name.to_string(),
        description: description.to_string(),
        price: Money::from_cents(cents),
        category,
        stock,
        images: vec![PLACEHOLDER_IMAGE.to_string()],
        featured,
        brand: Some(brand.to_string()),
        sku: None,
    };

    vec![
        draft(
            "Wireless Headphones",
            "High-quality wireless headphones with noise cancellation",
            19999,
            Category::Electronics,
            50,
            "AudioTech",
            true,
        ),
        draft(
            "Smart Watch",
            "Fitness tracking smartwatch with heart rate monitor",
            29999,
            Category::Electronics,
            30,
            "TechWear",
            true,
        ),
        draft(
            "Running Shoes",
            "Comfortable running shoes for all terrains",
            8999,
            Category::Sports,
            100,
            "SportPro",
            false,
        ),
        draft(
            "Cotton T-Shirt",
            "Premium cotton t-shirt, available in multiple colors",
            2499,
            Category::Clothing,
            200,
            "FashionCo",
            false,
        ),
        draft(
            "Coffee Maker",
            "Programmable coffee maker with thermal carafe",
            7999,
            Category::Home,
            40,
            "BrewMaster",
            false,
        ),
    ]
}

/// Inserts the demo users and products.
///
/// Users whose email is already registered are skipped, and products are
/// only inserted into an empty catalog, so running it twice is harmless.
pub async fn seed_demo_data<S: Store>(store: &S) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for (name, email, role) in demo_users() {
        if store.find_user_by_email(email).await?.is_some() {
            continue;
        }
        store.insert_user(User::register(name, email, role)?).await?;
        summary.users += 1;
    }

    if store.count_products().await? == 0 {
        for draft in demo_products() {
            store.insert_product(Product::create(draft)?).await?;
            summary.products += 1;
        }
    }

    tracing::info!(users = summary.users, products = summary.products, "demo data seeded");
    Ok(summary)
}
