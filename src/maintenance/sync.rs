//! Copies catalog data and settings from one environment to another.
//!
//! Rows are matched by natural key (slugs, setting keys, variant name and
//! value) rather than id, so the two databases may have diverged ids. Stock
//! is only copied when a product or variant is first created; after that it
//! belongs to the target environment.

use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use clap::Args;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::db::create_orm_conn;
use crate::entity::{
    collection_products::{self, Entity as CollectionProducts},
    collections::{self, Entity as Collections},
    product_attribute_terms::{self, Entity as ProductAttributeTerms},
    product_attributes::{self, Entity as ProductAttributes},
    product_variants::{self, Entity as ProductVariants},
    products::{self, Entity as Products},
    settings::{self, Entity as Settings},
};

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Connection string of the database to read from
    #[arg(long)]
    source: String,

    /// Connection string of the database to write to
    #[arg(long)]
    target: String,

    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} updated={} unchanged={}",
            self.created, self.updated, self.unchanged
        )
    }
}

/// What to do with one source row.
#[derive(Debug, PartialEq, Eq)]
pub enum Plan<T> {
    Create,
    Update(T),
    Keep(T),
}

/// Compare a source row with its counterpart found by natural key.
pub fn plan<T>(existing: Option<T>, differs: impl FnOnce(&T) -> bool) -> Plan<T> {
    match existing {
        None => Plan::Create,
        Some(row) if differs(&row) => Plan::Update(row),
        Some(row) => Plan::Keep(row),
    }
}

impl Tally {
    fn count<T>(&mut self, plan: &Plan<T>) {
        match plan {
            Plan::Create => self.created += 1,
            Plan::Update(_) => self.updated += 1,
            Plan::Keep(_) => self.unchanged += 1,
        }
    }
}

pub fn product_differs(source: &products::Model, target: &products::Model) -> bool {
    source.name != target.name
        || source.description != target.description
        || source.price != target.price
        || source.compare_at_price != target.compare_at_price
        || source.image_url != target.image_url
        || source.is_active != target.is_active
        || source.is_featured != target.is_featured
        || source.meta_title != target.meta_title
        || source.meta_description != target.meta_description
}

pub fn variant_differs(source: &product_variants::Model, target: &product_variants::Model) -> bool {
    source.image_url != target.image_url || source.price != target.price
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub attributes: Tally,
    pub terms: Tally,
    pub products: Tally,
    pub variants: Tally,
    pub collections: Tally,
    pub collection_products: Tally,
    pub settings: Tally,
}

impl SyncArgs {
    /// Only a real run brings the target schema up to date. The source is
    /// never migrated.
    pub fn migrates_target(&self) -> bool {
        !self.dry_run
    }
}

struct Syncer<'a> {
    source: &'a DatabaseConnection,
    target: &'a DatabaseConnection,
    dry_run: bool,
}

pub async fn run(args: SyncArgs) -> anyhow::Result<()> {
    let source = create_orm_conn(&args.source).await?;
    let target = if args.migrates_target() {
        super::connect(&args.target).await?
    } else {
        create_orm_conn(&args.target).await?
    };

    let report = sync(&source, &target, args.dry_run).await?;
    println!("attributes: {}", report.attributes);
    println!("terms: {}", report.terms);
    println!("products: {}", report.products);
    println!("variants: {}", report.variants);
    println!("collections: {}", report.collections);
    println!("collection products: {}", report.collection_products);
    println!("settings: {}", report.settings);

    tracing::info!(dry_run = args.dry_run, "sync finished");
    Ok(())
}

/// Reconcile `target` with `source`. With `dry_run` nothing is written and
/// the report counts what a real run would do.
pub async fn sync(
    source: &DatabaseConnection,
    target: &DatabaseConnection,
    dry_run: bool,
) -> anyhow::Result<SyncReport> {
    let syncer = Syncer {
        source,
        target,
        dry_run,
    };

    let (attributes, terms) = syncer.attributes().await?;
    let (products, variants, product_ids) = syncer.products().await?;
    let (collections, collection_products) = syncer.collections(&product_ids).await?;
    let settings = syncer.settings().await?;

    Ok(SyncReport {
        attributes,
        terms,
        products,
        variants,
        collections,
        collection_products,
        settings,
    })
}

impl Syncer<'_> {
    async fn attributes(&self) -> anyhow::Result<(Tally, Tally)> {
        let mut attributes = Tally::default();
        let mut terms = Tally::default();

        let source_attributes = ProductAttributes::find()
            .order_by_asc(product_attributes::Column::Slug)
            .all(self.source)
            .await?;

        for source in source_attributes {
            let existing = ProductAttributes::find()
                .filter(product_attributes::Column::Slug.eq(source.slug.as_str()))
                .one(self.target)
                .await?;
            let step = plan(existing, |t| t.name != source.name);
            attributes.count(&step);

            let target_id = match step {
                Plan::Create if self.dry_run => None,
                Plan::Create => Some(
                    product_attributes::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        name: Set(source.name.clone()),
                        slug: Set(source.slug.clone()),
                        created_at: NotSet,
                    }
                    .insert(self.target)
                    .await?
                    .id,
                ),
                Plan::Update(row) => {
                    let id = row.id;
                    if !self.dry_run {
                        let mut active: product_attributes::ActiveModel = row.into();
                        active.name = Set(source.name.clone());
                        active.update(self.target).await?;
                    }
                    Some(id)
                }
                Plan::Keep(row) => Some(row.id),
            };

            let source_terms = ProductAttributeTerms::find()
                .filter(product_attribute_terms::Column::AttributeId.eq(source.id))
                .all(self.source)
                .await?;
            let Some(target_id) = target_id else {
                terms.created += source_terms.len() as u32;
                continue;
            };

            for term in source_terms {
                let existing = ProductAttributeTerms::find()
                    .filter(product_attribute_terms::Column::AttributeId.eq(target_id))
                    .filter(product_attribute_terms::Column::Slug.eq(term.slug.as_str()))
                    .one(self.target)
                    .await?;
                let step = plan(existing, |t| {
                    t.name != term.name || t.swatch_image != term.swatch_image
                });
                terms.count(&step);
                if self.dry_run {
                    continue;
                }
                match step {
                    Plan::Create => {
                        product_attribute_terms::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            attribute_id: Set(target_id),
                            name: Set(term.name),
                            slug: Set(term.slug),
                            swatch_image: Set(term.swatch_image),
                            created_at: NotSet,
                        }
                        .insert(self.target)
                        .await?;
                    }
                    Plan::Update(row) => {
                        let mut active: product_attribute_terms::ActiveModel = row.into();
                        active.name = Set(term.name);
                        active.swatch_image = Set(term.swatch_image);
                        active.update(self.target).await?;
                    }
                    Plan::Keep(_) => {}
                }
            }
        }

        Ok((attributes, terms))
    }

    /// Returns the tallies and a map from source product id to target product id.
    async fn products(&self) -> anyhow::Result<(Tally, Tally, HashMap<Uuid, Uuid>)> {
        let mut products = Tally::default();
        let mut variants = Tally::default();
        let mut ids = HashMap::new();

        let source_products = Products::find()
            .order_by_asc(products::Column::Slug)
            .all(self.source)
            .await?;

        for source in source_products {
            let existing = Products::find()
                .filter(products::Column::Slug.eq(source.slug.as_str()))
                .one(self.target)
                .await?;
            let step = plan(existing, |t| product_differs(&source, t));
            products.count(&step);

            let target_id = match step {
                Plan::Create if self.dry_run => None,
                Plan::Create => Some(
                    products::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        name: Set(source.name.clone()),
                        slug: Set(source.slug.clone()),
                        description: Set(source.description.clone()),
                        price: Set(source.price),
                        compare_at_price: Set(source.compare_at_price),
                        stock: Set(source.stock),
                        image_url: Set(source.image_url.clone()),
                        is_active: Set(source.is_active),
                        is_featured: Set(source.is_featured),
                        meta_title: Set(source.meta_title.clone()),
                        meta_description: Set(source.meta_description.clone()),
                        created_at: NotSet,
                        updated_at: NotSet,
                    }
                    .insert(self.target)
                    .await?
                    .id,
                ),
                Plan::Update(row) => {
                    let id = row.id;
                    if !self.dry_run {
                        let mut active: products::ActiveModel = row.into();
                        active.name = Set(source.name.clone());
                        active.description = Set(source.description.clone());
                        active.price = Set(source.price);
                        active.compare_at_price = Set(source.compare_at_price);
                        active.image_url = Set(source.image_url.clone());
                        active.is_active = Set(source.is_active);
                        active.is_featured = Set(source.is_featured);
                        active.meta_title = Set(source.meta_title.clone());
                        active.meta_description = Set(source.meta_description.clone());
                        active.updated_at = Set(Utc::now().into());
                        active.update(self.target).await?;
                    }
                    Some(id)
                }
                Plan::Keep(row) => Some(row.id),
            };

            let source_variants = ProductVariants::find()
                .filter(product_variants::Column::ProductId.eq(source.id))
                .all(self.source)
                .await?;
            let Some(target_id) = target_id else {
                variants.created += source_variants.len() as u32;
                continue;
            };
            ids.insert(source.id, target_id);

            for variant in source_variants {
                let existing = ProductVariants::find()
                    .filter(product_variants::Column::ProductId.eq(target_id))
                    .filter(product_variants::Column::Name.eq(variant.name.as_str()))
                    .filter(product_variants::Column::Value.eq(variant.value.as_str()))
                    .one(self.target)
                    .await?;
                let step = plan(existing, |t| variant_differs(&variant, t));
                variants.count(&step);
                if self.dry_run {
                    continue;
                }
                match step {
                    Plan::Create => {
                        product_variants::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            product_id: Set(target_id),
                            name: Set(variant.name),
                            value: Set(variant.value),
                            image_url: Set(variant.image_url),
                            stock: Set(variant.stock),
                            price: Set(variant.price),
                            created_at: NotSet,
                        }
                        .insert(self.target)
                        .await?;
                    }
                    Plan::Update(row) => {
                        let mut active: product_variants::ActiveModel = row.into();
                        active.image_url = Set(variant.image_url);
                        active.price = Set(variant.price);
                        active.update(self.target).await?;
                    }
                    Plan::Keep(_) => {}
                }
            }
        }

        Ok((products, variants, ids))
    }

    async fn collections(&self, product_ids: &HashMap<Uuid, Uuid>) -> anyhow::Result<(Tally, Tally)> {
        let mut collections = Tally::default();
        let mut members = Tally::default();

        let source_collections = Collections::find()
            .order_by_asc(collections::Column::Slug)
            .all(self.source)
            .await?;

        for source in source_collections {
            let existing = Collections::find()
                .filter(collections::Column::Slug.eq(source.slug.as_str()))
                .one(self.target)
                .await?;
            let step = plan(existing, |t| {
                t.name != source.name
                    || t.description != source.description
                    || t.image_url != source.image_url
                    || t.is_active != source.is_active
            });
            collections.count(&step);

            let target_id = match step {
                Plan::Create if self.dry_run => None,
                Plan::Create => Some(
                    collections::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        name: Set(source.name.clone()),
                        slug: Set(source.slug.clone()),
                        description: Set(source.description.clone()),
                        image_url: Set(source.image_url.clone()),
                        is_active: Set(source.is_active),
                        created_at: NotSet,
                    }
                    .insert(self.target)
                    .await?
                    .id,
                ),
                Plan::Update(row) => {
                    let id = row.id;
                    if !self.dry_run {
                        let mut active: collections::ActiveModel = row.into();
                        active.name = Set(source.name.clone());
                        active.description = Set(source.description.clone());
                        active.image_url = Set(source.image_url.clone());
                        active.is_active = Set(source.is_active);
                        active.update(self.target).await?;
                    }
                    Some(id)
                }
                Plan::Keep(row) => Some(row.id),
            };

            let source_members = CollectionProducts::find()
                .filter(collection_products::Column::CollectionId.eq(source.id))
                .order_by_asc(collection_products::Column::Position)
                .all(self.source)
                .await?;
            let Some(target_id) = target_id else {
                members.created += source_members.len() as u32;
                continue;
            };

            for member in source_members {
                // products only created in a dry run have no target id yet
                let Some(&product_id) = product_ids.get(&member.product_id) else {
                    members.created += 1;
                    continue;
                };
                let existing = CollectionProducts::find()
                    .filter(collection_products::Column::CollectionId.eq(target_id))
                    .filter(collection_products::Column::ProductId.eq(product_id))
                    .one(self.target)
                    .await?;
                let step = plan(existing, |t| t.position != member.position);
                members.count(&step);
                if self.dry_run {
                    continue;
                }
                match step {
                    Plan::Create => {
                        collection_products::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            collection_id: Set(target_id),
                            product_id: Set(product_id),
                            position: Set(member.position),
                        }
                        .insert(self.target)
                        .await?;
                    }
                    Plan::Update(row) => {
                        let mut active: collection_products::ActiveModel = row.into();
                        active.position = Set(member.position);
                        active.update(self.target).await?;
                    }
                    Plan::Keep(_) => {}
                }
            }
        }

        Ok((collections, members))
    }

    async fn settings(&self) -> anyhow::Result<Tally> {
        let mut tally = Tally::default();
        let source_settings = Settings::find()
            .order_by_asc(settings::Column::Key)
            .all(self.source)
            .await?;

        for source in source_settings {
            let existing = Settings::find_by_id(source.key.clone())
                .one(self.target)
                .await?;
            let step = plan(existing, |t| t.value != source.value);
            tally.count(&step);
            if self.dry_run {
                continue;
            }
            match step {
                Plan::Create => {
                    settings::ActiveModel {
                        key: Set(source.key),
                        value: Set(source.value),
                        updated_at: NotSet,
                    }
                    .insert(self.target)
                    .await?;
                }
                Plan::Update(row) => {
                    let mut active: settings::ActiveModel = row.into();
                    active.value = Set(source.value);
                    active.updated_at = Set(Utc::now().into());
                    active.update(self.target).await?;
                }
                Plan::Keep(_) => {}
            }
        }

        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, stock: i32) -> products::Model {
        products::Model {
            id: Uuid::new_v4(),
            name: "Bob Wig".into(),
            slug: "bob-wig".into(),
            description: None,
            price,
            compare_at_price: None,
            stock,
            image_url: None,
            is_active: true,
            is_featured: false,
            meta_title: None,
            meta_description: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn planning_by_natural_key() {
        assert_eq!(plan::<i32>(None, |_| true), Plan::Create);
        assert_eq!(plan(Some(1), |v| *v == 1), Plan::Update(1));
        assert_eq!(plan(Some(1), |v| *v == 2), Plan::Keep(1));
    }

    #[test]
    fn stock_differences_do_not_trigger_updates() {
        let source = product(10_000, 3);
        let target = product(10_000, 40);
        assert!(!product_differs(&source, &target));
        assert!(product_differs(&product(12_000, 3), &target));
    }

    #[test]
    fn tally_counts_each_plan() {
        let mut tally = Tally::default();
        tally.count(&Plan::<()>::Create);
        tally.count(&Plan::Update(()));
        tally.count(&Plan::Keep(()));
        tally.count(&Plan::Keep(()));
        assert_eq!(
            tally,
            Tally {
                created: 1,
                updated: 1,
                unchanged: 2
            }
        );
        assert_eq!(tally.to_string(), "created=1 updated=1 unchanged=2");
    }
}
