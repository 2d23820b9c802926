use clap::{Args, Subcommand};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{
        collection_products::{self, Entity as CollectionProducts},
        collections::{self, Entity as Collections},
        enums::{ReviewStatus, Role},
        product_attribute_terms::{self, Entity as ProductAttributeTerms},
        product_attributes::{self, Entity as ProductAttributes},
        product_variants,
        products::{self, Entity as Products},
        reviews::{self, Entity as Reviews},
        users::{self, Entity as Users},
    },
    services::{auth_service, wallet_service},
    slug::slugify,
    swatch::{self, ColorMatch},
};

#[derive(Debug, Args)]
pub struct SeedCommand {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[command(subcommand)]
    target: SeedTarget,
}

#[derive(Debug, Subcommand)]
enum SeedTarget {
    /// Staff accounts and demo customers, each with a wallet
    Users(SeedUsersArgs),
    /// Hair catalog with color attribute, terms, variants and collections
    Products,
    /// Approved reviews from seeded customers
    Reviews,
}

#[derive(Debug, Args)]
struct SeedUsersArgs {
    /// Password given to newly created accounts
    #[arg(long, env = "SEED_PASSWORD", hide_env_values = true, default_value = "ChangeMe123!")]
    password: String,
}

pub async fn run(command: SeedCommand) -> anyhow::Result<()> {
    let conn = super::connect(&command.database_url).await?;
    match command.target {
        SeedTarget::Users(args) => seed_users(&conn, &args.password).await,
        SeedTarget::Products => seed_products(&conn).await,
        SeedTarget::Reviews => seed_reviews(&conn).await,
    }
}

pub const COLOR_ATTRIBUTE: &str = "Color";

const SEED_USERS: [(&str, &str, Role); 7] = [
    ("admin@hairstore.test", "Store Admin", Role::Admin),
    ("manager@hairstore.test", "Store Manager", Role::Manager),
    ("staff@hairstore.test", "Store Staff", Role::Staff),
    ("amaka@hairstore.test", "Amaka Obi", Role::Customer),
    ("tolu@hairstore.test", "Tolu Adeyemi", Role::Customer),
    ("zainab@hairstore.test", "Zainab Bello", Role::Customer),
    ("chioma@hairstore.test", "Chioma Eze", Role::Customer),
];

struct SeedProduct {
    name: &'static str,
    collection: &'static str,
    description: &'static str,
    price: i64,
    featured: bool,
    colors: &'static [&'static str],
}

const CATALOG: [SeedProduct; 6] = [
    SeedProduct {
        name: "Body Wave Lace Front Wig 22\"",
        collection: "Wigs",
        description: "Pre-plucked 13x4 lace front, 180% density, human hair.",
        price: 18_500_000,
        featured: true,
        colors: &["Natural Black", "1B/27 Ombre", "Burgundy 99J"],
    },
    SeedProduct {
        name: "Bone Straight Bob Wig 12\"",
        collection: "Wigs",
        description: "Blunt cut bob on a 4x4 closure cap.",
        price: 9_800_000,
        featured: true,
        colors: &["Jet Black", "Honey Blonde"],
    },
    SeedProduct {
        name: "Kinky Curly Bundles 3pcs",
        collection: "Bundles",
        description: "Three bundles of Brazilian kinky curly hair.",
        price: 12_000_000,
        featured: false,
        colors: &["Natural Black", "Dark Brown 4"],
    },
    SeedProduct {
        name: "Straight Bundles 3pcs",
        collection: "Bundles",
        description: "Silky straight virgin bundles, 100g each.",
        price: 10_500_000,
        featured: false,
        colors: &["Natural Black", "613 Platinum Blonde", "Ginger"],
    },
    SeedProduct {
        name: "HD Lace Closure 5x5",
        collection: "Closures",
        description: "Transparent HD lace with free parting.",
        price: 4_500_000,
        featured: false,
        colors: &["Natural Black", "Auburn 30"],
    },
    SeedProduct {
        name: "Frontal 13x6 Deep Wave",
        collection: "Closures",
        description: "Ear to ear deep wave frontal with baby hair.",
        price: 6_200_000,
        featured: true,
        colors: &["Natural Black", "Grey"],
    },
];

const REVIEW_BODIES: [&str; 4] = [
    "Soft, full and barely sheds. Would buy again.",
    "Color matched the pictures and the lace melted well.",
    "Arrived quickly and the length was as described.",
    "Good value for the price, needed a little plucking.",
];

const VARIANT_STOCK: i32 = 8;

/// Swatch suggestion from the keyword dictionary alone.
fn keyword_swatch(color: &str) -> Option<String> {
    match swatch::match_color::<&str>(color, &[]) {
        Some(ColorMatch::Keyword { path, .. }) => Some(path.to_string()),
        _ => None,
    }
}

/// Rating 3..=5, stable for a given product and customer position.
fn seeded_rating(product_index: usize, customer_index: usize) -> i32 {
    3 + ((product_index + customer_index) % 3) as i32
}

async fn seed_users(conn: &DatabaseConnection, password: &str) -> anyhow::Result<()> {
    let password_hash = auth_service::hash_password(password)?;
    let (mut created, mut updated) = (0, 0);

    for (email, full_name, role) in SEED_USERS {
        let txn = conn.begin().await?;
        let user = match Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&txn)
            .await?
        {
            Some(existing) => {
                let mut active: users::ActiveModel = existing.into();
                active.role = Set(role);
                active.full_name = Set(Some(full_name.to_string()));
                updated += 1;
                active.update(&txn).await?
            }
            None => {
                created += 1;
                users::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    email: Set(email.to_string()),
                    password_hash: Set(password_hash.clone()),
                    full_name: Set(Some(full_name.to_string())),
                    phone: Set(None),
                    role: Set(role),
                    created_at: NotSet,
                    updated_at: NotSet,
                }
                .insert(&txn)
                .await?
            }
        };
        wallet_service::ensure_wallet(&txn, user.id).await?;
        txn.commit().await?;
        tracing::debug!(%email, role = role.as_str(), "seeded user");
    }

    tracing::info!(created, updated, "users seeded");
    Ok(())
}

async fn color_attribute(conn: &DatabaseConnection) -> anyhow::Result<product_attributes::Model> {
    let slug = slugify(COLOR_ATTRIBUTE);
    if let Some(existing) = ProductAttributes::find()
        .filter(product_attributes::Column::Slug.eq(slug.as_str()))
        .one(conn)
        .await?
    {
        return Ok(existing);
    }
    Ok(product_attributes::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(COLOR_ATTRIBUTE.to_string()),
        slug: Set(slug),
        created_at: NotSet,
    }
    .insert(conn)
    .await?)
}

async fn ensure_term(
    conn: &DatabaseConnection,
    attribute_id: Uuid,
    name: &str,
) -> anyhow::Result<bool> {
    let slug = slugify(name);
    let exists = ProductAttributeTerms::find()
        .filter(product_attribute_terms::Column::AttributeId.eq(attribute_id))
        .filter(product_attribute_terms::Column::Slug.eq(slug.as_str()))
        .one(conn)
        .await?
        .is_some();
    if exists {
        return Ok(false);
    }
    product_attribute_terms::ActiveModel {
        id: Set(Uuid::new_v4()),
        attribute_id: Set(attribute_id),
        name: Set(name.to_string()),
        slug: Set(slug),
        swatch_image: Set(keyword_swatch(name)),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(true)
}

async fn ensure_collection(conn: &DatabaseConnection, name: &str) -> anyhow::Result<collections::Model> {
    let slug = slugify(name);
    if let Some(existing) = Collections::find()
        .filter(collections::Column::Slug.eq(slug.as_str()))
        .one(conn)
        .await?
    {
        return Ok(existing);
    }
    Ok(collections::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug),
        description: Set(None),
        image_url: Set(None),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(conn)
    .await?)
}

async fn add_to_collection(
    conn: &DatabaseConnection,
    collection_id: Uuid,
    product_id: Uuid,
) -> anyhow::Result<()> {
    let existing = CollectionProducts::find()
        .filter(collection_products::Column::CollectionId.eq(collection_id))
        .filter(collection_products::Column::ProductId.eq(product_id))
        .one(conn)
        .await?;
    if existing.is_some() {
        return Ok(());
    }
    let position = CollectionProducts::find()
        .filter(collection_products::Column::CollectionId.eq(collection_id))
        .count(conn)
        .await?;
    collection_products::ActiveModel {
        id: Set(Uuid::new_v4()),
        collection_id: Set(collection_id),
        product_id: Set(product_id),
        position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
    }
    .insert(conn)
    .await?;
    Ok(())
}

async fn seed_products(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let attribute = color_attribute(conn).await?;
    let (mut products_created, mut terms_created) = (0, 0);

    for item in &CATALOG {
        for color in item.colors {
            if ensure_term(conn, attribute.id, color).await? {
                terms_created += 1;
            }
        }

        let collection = ensure_collection(conn, item.collection).await?;
        let slug = slugify(item.name);
        let product = match Products::find()
            .filter(products::Column::Slug.eq(slug.as_str()))
            .one(conn)
            .await?
        {
            Some(existing) => existing,
            None => {
                let txn = conn.begin().await?;
                let product = products::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(item.name.to_string()),
                    slug: Set(slug),
                    description: Set(Some(item.description.to_string())),
                    price: Set(item.price),
                    compare_at_price: Set(None),
                    stock: Set(VARIANT_STOCK * item.colors.len() as i32),
                    image_url: Set(None),
                    is_active: Set(true),
                    is_featured: Set(item.featured),
                    meta_title: Set(Some(item.name.to_string())),
                    meta_description: Set(Some(item.description.to_string())),
                    created_at: NotSet,
                    updated_at: NotSet,
                }
                .insert(&txn)
                .await?;
                for color in item.colors {
                    product_variants::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        product_id: Set(product.id),
                        name: Set(COLOR_ATTRIBUTE.to_string()),
                        value: Set(color.to_string()),
                        image_url: Set(None),
                        stock: Set(VARIANT_STOCK),
                        price: Set(None),
                        created_at: NotSet,
                    }
                    .insert(&txn)
                    .await?;
                }
                txn.commit().await?;
                products_created += 1;
                product
            }
        };
        add_to_collection(conn, collection.id, product.id).await?;
    }

    tracing::info!(
        products_created,
        terms_created,
        catalog = CATALOG.len(),
        "catalog seeded"
    );
    Ok(())
}

async fn seed_reviews(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let customers = Users::find()
        .filter(users::Column::Role.eq(Role::Customer))
        .order_by_asc(users::Column::Email)
        .all(conn)
        .await?;
    if customers.is_empty() {
        anyhow::bail!("no customers found, run `seed users` first");
    }
    let products = Products::find()
        .filter(products::Column::IsActive.eq(true))
        .order_by_asc(products::Column::Slug)
        .all(conn)
        .await?;

    let mut created = 0;
    for (product_index, product) in products.iter().enumerate() {
        for (customer_index, customer) in customers.iter().enumerate() {
            let exists = Reviews::find()
                .filter(reviews::Column::ProductId.eq(product.id))
                .filter(reviews::Column::UserId.eq(customer.id))
                .one(conn)
                .await?
                .is_some();
            if exists {
                continue;
            }
            let body = REVIEW_BODIES[(product_index + customer_index) % REVIEW_BODIES.len()];
            reviews::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                user_id: Set(customer.id),
                rating: Set(seeded_rating(product_index, customer_index)),
                title: Set(None),
                body: Set(body.to_string()),
                status: Set(ReviewStatus::Approved),
                created_at: NotSet,
            }
            .insert(conn)
            .await?;
            created += 1;
        }
    }

    tracing::info!(created, products = products.len(), "reviews seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_slugs_are_unique() {
        let mut slugs: Vec<String> = CATALOG.iter().map(|p| slugify(p.name)).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), CATALOG.len());
    }

    #[test]
    fn ratings_stay_in_range() {
        for p in 0..10 {
            for c in 0..10 {
                assert!((3..=5).contains(&seeded_rating(p, c)));
            }
        }
        assert_eq!(seeded_rating(0, 0), seeded_rating(0, 0));
    }

    #[test]
    fn seed_colors_resolve_to_swatches() {
        assert_eq!(
            keyword_swatch("Burgundy 99J").as_deref(),
            Some("/swatches/burgundy.jpg")
        );
        assert_eq!(keyword_swatch("Lilac"), None);
    }
}
