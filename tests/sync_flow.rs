mod common;

use hair_storefront_api::{
    entity::{
        collection_products, collections, product_attribute_terms, product_attributes,
        product_variants::{self, Entity as ProductVariants},
        products::{self, Entity as Products},
        settings,
    },
    maintenance::sync::{SyncReport, Tally, sync},
    state::AppState,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    Set, Statement,
};
use uuid::Uuid;

const TARGET_DATABASE: &str = "hair_storefront_sync_target";

/// Same server and credentials, different database name.
fn sibling_url(url: &str, database: &str) -> Option<String> {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };
    let authority_start = base.find("://")? + 3;
    let slash = base[authority_start..].find('/').map(|i| authority_start + i);
    let server = slash.map_or(base, |i| &base[..i]);
    Some(match query {
        Some(query) => format!("{server}/{database}?{query}"),
        None => format!("{server}/{database}"),
    })
}

async fn target_state(source: &AppState, source_url: &str) -> anyhow::Result<Option<AppState>> {
    let backend = source.orm.get_database_backend();
    let exists = source
        .orm
        .query_one(Statement::from_string(
            backend,
            format!("SELECT 1 FROM pg_database WHERE datname = '{TARGET_DATABASE}'"),
        ))
        .await?
        .is_some();
    if !exists {
        let created = source
            .orm
            .execute(Statement::from_string(
                backend,
                format!("CREATE DATABASE {TARGET_DATABASE}"),
            ))
            .await;
        if let Err(err) = created {
            eprintln!("Skipping sync test: cannot create {TARGET_DATABASE}: {err}");
            return Ok(None);
        }
    }
    let Some(url) = sibling_url(source_url, TARGET_DATABASE) else {
        return Ok(None);
    };
    Ok(Some(common::setup_state(&url).await?))
}

fn tally(created: u32, updated: u32, unchanged: u32) -> Tally {
    Tally {
        created,
        updated,
        unchanged,
    }
}

async fn seed_source(state: &AppState) -> anyhow::Result<()> {
    let color = product_attributes::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Color".into()),
        slug: Set("color".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    product_attribute_terms::ActiveModel {
        id: Set(Uuid::new_v4()),
        attribute_id: Set(color.id),
        name: Set("Honey Blonde".into()),
        slug: Set("honey-blonde".into()),
        swatch_image: Set(Some("/swatches/honey-blonde.jpg".into())),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let bob = common::create_product(state, "bob-wig", 20_000, 5).await?;
    common::create_variant(state, bob.id, "Honey Blonde", 3).await?;
    common::create_product(state, "lace-closure", 30_000, 4).await?;

    let best = collections::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Best Sellers".into()),
        slug: Set("best-sellers".into()),
        description: Set(None),
        image_url: Set(None),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    collection_products::ActiveModel {
        id: Set(Uuid::new_v4()),
        collection_id: Set(best.id),
        product_id: Set(bob.id),
        position: Set(0),
    }
    .insert(&state.orm)
    .await?;

    settings::ActiveModel {
        key: Set("shipping_fee".into()),
        value: Set(serde_json::json!(1_500)),
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

async fn target_product(state: &AppState, slug: &str) -> anyhow::Result<products::Model> {
    Ok(Products::find()
        .filter(products::Column::Slug.eq(slug))
        .one(&state.orm)
        .await?
        .unwrap())
}

// Dry run reports without writing; a real run converges; a second run is a no-op.
#[tokio::test]
async fn sync_reconciles_by_natural_key() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let source = common::setup_state(&database_url).await?;
    let Some(target) = target_state(&source, &database_url).await? else {
        return Ok(());
    };

    seed_source(&source).await?;
    // target has diverged: older price, its own stock
    common::create_product(&target, "bob-wig", 15_000, 40).await?;
    common::create_product(&target, "lace-closure", 30_000, 99).await?;

    let expected = SyncReport {
        attributes: tally(1, 0, 0),
        terms: tally(1, 0, 0),
        products: tally(0, 1, 1),
        variants: tally(1, 0, 0),
        collections: tally(1, 0, 0),
        collection_products: tally(1, 0, 0),
        settings: tally(1, 0, 0),
    };

    let planned = sync(&source.orm, &target.orm, true).await?;
    assert_eq!(planned, expected);
    assert_eq!(target_product(&target, "bob-wig").await?.price, 15_000);
    assert!(product_attributes::Entity::find().one(&target.orm).await?.is_none());

    let applied = sync(&source.orm, &target.orm, false).await?;
    assert_eq!(applied, expected);

    let bob = target_product(&target, "bob-wig").await?;
    assert_eq!(bob.price, 20_000);
    assert_eq!(bob.stock, 40);
    assert_eq!(target_product(&target, "lace-closure").await?.stock, 99);
    let variant = ProductVariants::find()
        .filter(product_variants::Column::ProductId.eq(bob.id))
        .one(&target.orm)
        .await?
        .unwrap();
    assert_eq!(variant.value, "Honey Blonde");
    assert_eq!(variant.stock, 3);
    let fee = settings::Entity::find_by_id("shipping_fee".to_string())
        .one(&target.orm)
        .await?
        .unwrap();
    assert_eq!(fee.value, serde_json::json!(1_500));

    let again = sync(&source.orm, &target.orm, false).await?;
    assert_eq!(
        again,
        SyncReport {
            attributes: tally(0, 0, 1),
            terms: tally(0, 0, 1),
            products: tally(0, 0, 2),
            variants: tally(0, 0, 1),
            collections: tally(0, 0, 1),
            collection_products: tally(0, 0, 1),
            settings: tally(0, 0, 1),
        }
    );

    Ok(())
}

#[test]
fn sibling_url_swaps_only_the_database_name() {
    assert_eq!(
        sibling_url("postgres://u:p@localhost:5432/shop?sslmode=disable", "other").as_deref(),
        Some("postgres://u:p@localhost:5432/other?sslmode=disable")
    );
    assert_eq!(
        sibling_url("postgres://localhost", "other").as_deref(),
        Some("postgres://localhost/other")
    );
}
