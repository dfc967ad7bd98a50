//! Demo catalog seeding.
//!
//! Inserts a small catalog so a fresh database has something to browse.
//! Seeding is idempotent by slug: a product whose slug already exists is
//! skipped entirely, variants included, so re-running never duplicates or
//! overwrites anything an admin may have edited since.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use super::ConnectError;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Could not reach the database.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// An insert failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

struct SeedVariant {
    name: &'static str,
    sku: &'static str,
    /// `None` inherits the product price.
    price: Option<Decimal>,
    /// `None` inherits the product stock count.
    inventory_quantity: Option<i32>,
    position: i32,
}

struct SeedProduct {
    slug: &'static str,
    name: &'static str,
    description: &'static str,
    price: Decimal,
    inventory_quantity: i32,
    track_inventory: bool,
    featured: bool,
    variants: Vec<SeedVariant>,
}

/// Insert the demo catalog, reporting how many products were new.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), SeedError> {
    let pool = super::connect().await?;

    let mut inserted = 0_usize;
    let mut skipped = 0_usize;

    for product in demo_catalog() {
        match insert_product(&pool, &product).await? {
            Some(product_id) => {
                inserted += 1;
                for variant in &product.variants {
                    insert_variant(&pool, product_id, variant).await?;
                }
                tracing::info!(slug = product.slug, "Seeded product");
            }
            None => {
                skipped += 1;
                tracing::debug!(slug = product.slug, "Slug already exists, skipping");
            }
        }
    }

    tracing::info!(inserted, skipped, "Seeding complete");
    Ok(())
}

/// Insert one product unless its slug is taken. Returns the new id, or
/// `None` when the slug already existed.
async fn insert_product(pool: &PgPool, product: &SeedProduct) -> Result<Option<i32>, SeedError> {
    let id: Option<i32> = sqlx::query_scalar(
        "INSERT INTO shop.products
             (slug, name, description, price, inventory_quantity,
              track_inventory, active, featured)
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7)
         ON CONFLICT (slug) DO NOTHING
         RETURNING id",
    )
    .bind(product.slug)
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.inventory_quantity)
    .bind(product.track_inventory)
    .bind(product.featured)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

async fn insert_variant(
    pool: &PgPool,
    product_id: i32,
    variant: &SeedVariant,
) -> Result<(), SeedError> {
    sqlx::query(
        "INSERT INTO shop.product_variants
             (product_id, name, sku, price, inventory_quantity, position)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(product_id)
    .bind(variant.name)
    .bind(variant.sku)
    .bind(variant.price)
    .bind(variant.inventory_quantity)
    .bind(variant.position)
    .execute(pool)
    .await?;

    Ok(())
}

fn demo_catalog() -> Vec<SeedProduct> {
    vec![
        SeedProduct {
            slug: "california-golden-poppy",
            name: "California Golden Poppy",
            description: "The classic orange poppy that carpets hillsides every spring. \
                          Drought-tolerant once established and happy in poor soil. \
                          Each packet sows about two square meters.",
            price: Decimal::new(450, 2),
            inventory_quantity: 120,
            track_inventory: true,
            featured: true,
            variants: vec![],
        },
        SeedProduct {
            slug: "prairie-wildflower-mix",
            name: "Prairie Wildflower Mix",
            description: "Nineteen native prairie species blended for a long bloom, \
                          coneflower through blazing star. Sow in fall or early \
                          spring on bare ground.",
            price: Decimal::new(600, 2),
            inventory_quantity: 80,
            track_inventory: true,
            featured: true,
            variants: vec![
                SeedVariant {
                    name: "Packet",
                    sku: "WB-PRAIRIE-P",
                    price: None,
                    inventory_quantity: None,
                    position: 0,
                },
                SeedVariant {
                    name: "Half-pound bag",
                    sku: "WB-PRAIRIE-HP",
                    price: Some(Decimal::new(1800, 2)),
                    inventory_quantity: Some(25),
                    position: 1,
                },
            ],
        },
        SeedProduct {
            slug: "butterfly-milkweed",
            name: "Butterfly Milkweed",
            description: "Bright orange clusters and the monarch's host plant. \
                          Cold-stratify for a month before sowing for the best \
                          germination.",
            price: Decimal::new(525, 2),
            inventory_quantity: 60,
            track_inventory: true,
            featured: false,
            variants: vec![],
        },
        SeedProduct {
            slug: "purple-coneflower",
            name: "Purple Coneflower",
            description: "Echinacea purpurea. Tough, long-blooming, and beloved by \
                          bees in summer and goldfinches in winter. Leave the seed \
                          heads standing.",
            price: Decimal::new(575, 2),
            inventory_quantity: 90,
            track_inventory: true,
            featured: false,
            variants: vec![],
        },
        SeedProduct {
            slug: "black-eyed-susan",
            name: "Black-Eyed Susan",
            description: "Cheerful gold daisies from midsummer to frost. Self-sows \
                          politely and shrugs off drought.",
            price: Decimal::new(495, 2),
            inventory_quantity: 110,
            track_inventory: true,
            featured: false,
            variants: vec![],
        },
        SeedProduct {
            slug: "cornflower-blue",
            name: "Cornflower Blue",
            description: "True-blue bachelor's buttons for cutting gardens and \
                          meadow edges. Direct sow; blooms in about ten weeks.",
            price: Decimal::new(425, 2),
            inventory_quantity: 75,
            track_inventory: true,
            featured: false,
            variants: vec![],
        },
        SeedProduct {
            slug: "terracotta-starter-trays",
            name: "Terracotta Starter Trays",
            description: "A dozen unglazed terracotta cells that wick away excess \
                          water. Reusable for years; plant out without disturbing \
                          roots.",
            price: Decimal::new(2400, 2),
            inventory_quantity: 15,
            track_inventory: true,
            featured: false,
            variants: vec![],
        },
        SeedProduct {
            slug: "gift-card",
            name: "Wildbloom Gift Card",
            description: "Delivered by email with a note from you. Never expires.",
            price: Decimal::new(2500, 2),
            inventory_quantity: 0,
            track_inventory: false,
            featured: false,
            variants: vec![
                SeedVariant {
                    name: "$25",
                    sku: "WB-GIFT-25",
                    price: None,
                    inventory_quantity: None,
                    position: 0,
                },
                SeedVariant {
                    name: "$50",
                    sku: "WB-GIFT-50",
                    price: Some(Decimal::new(5000, 2)),
                    inventory_quantity: None,
                    position: 1,
                },
                SeedVariant {
                    name: "$100",
                    sku: "WB-GIFT-100",
                    price: Some(Decimal::new(10000, 2)),
                    inventory_quantity: None,
                    position: 2,
                },
            ],
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use wildbloom_core::Slug;

    use super::*;

    #[test]
    fn test_demo_slugs_are_unique_and_valid() {
        let catalog = demo_catalog();
        let mut seen = HashSet::new();

        for product in &catalog {
            Slug::parse(product.slug).unwrap();
            assert!(seen.insert(product.slug), "duplicate slug {}", product.slug);
        }
    }

    #[test]
    fn test_demo_skus_are_unique() {
        let mut seen = HashSet::new();

        for product in demo_catalog() {
            for variant in &product.variants {
                assert!(seen.insert(variant.sku), "duplicate sku {}", variant.sku);
            }
        }
    }

    #[test]
    fn test_untracked_products_carry_no_variant_stock() {
        for product in demo_catalog() {
            if !product.track_inventory {
                for variant in &product.variants {
                    assert!(variant.inventory_quantity.is_none());
                }
            }
        }
    }
}
