use clap::Args;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    entity::{
        product_attribute_terms::{self, Entity as ProductAttributeTerms},
        product_attributes::{self, Entity as ProductAttributes},
        product_variants::{self, Entity as ProductVariants},
    },
    slug::slugify,
    swatch::{self, ColorMatch, MatchTier},
};

use super::seed::COLOR_ATTRIBUTE;

#[derive(Debug, Args)]
pub struct MatchSwatchesArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Write the suggested image to each variant instead of only printing it
    #[arg(long)]
    apply: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub path: String,
    pub tier: MatchTier,
    /// Term name the path came from, if any.
    pub source: Option<String>,
}

/// Resolve a variant color to a swatch path. A matched term without its own
/// image falls back to the keyword dictionary.
pub fn suggest(color: &str, terms: &[product_attribute_terms::Model]) -> Option<Suggestion> {
    let names: Vec<&str> = terms.iter().map(|t| t.name.as_str()).collect();
    match swatch::match_color(color, &names)? {
        ColorMatch::Candidate { index, tier } => {
            let term = &terms[index];
            match &term.swatch_image {
                Some(path) => Some(Suggestion {
                    path: path.clone(),
                    tier,
                    source: Some(term.name.clone()),
                }),
                None => keyword_only(color),
            }
        }
        ColorMatch::Keyword { path, .. } => Some(Suggestion {
            path: path.to_string(),
            tier: MatchTier::Keyword,
            source: None,
        }),
    }
}

fn keyword_only(color: &str) -> Option<Suggestion> {
    match swatch::match_color::<&str>(color, &[])? {
        ColorMatch::Keyword { path, .. } => Some(Suggestion {
            path: path.to_string(),
            tier: MatchTier::Keyword,
            source: None,
        }),
        ColorMatch::Candidate { .. } => None,
    }
}

async fn color_terms(
    conn: &DatabaseConnection,
) -> anyhow::Result<Vec<product_attribute_terms::Model>> {
    let Some(attribute) = ProductAttributes::find()
        .filter(product_attributes::Column::Slug.eq(slugify(COLOR_ATTRIBUTE)))
        .one(conn)
        .await?
    else {
        tracing::warn!("no Color attribute found, using the keyword dictionary only");
        return Ok(Vec::new());
    };

    Ok(ProductAttributeTerms::find()
        .filter(product_attribute_terms::Column::AttributeId.eq(attribute.id))
        .order_by_asc(product_attribute_terms::Column::Name)
        .all(conn)
        .await?)
}

pub async fn run(args: MatchSwatchesArgs) -> anyhow::Result<()> {
    let conn = super::connect(&args.database_url).await?;
    let terms = color_terms(&conn).await?;

    let variants = ProductVariants::find()
        .filter(product_variants::Column::ImageUrl.is_null())
        .order_by_asc(product_variants::Column::ProductId)
        .all(&conn)
        .await?
        .into_iter()
        .filter(|v| v.name.eq_ignore_ascii_case(COLOR_ATTRIBUTE));

    let (mut matched, mut unmatched, mut applied) = (0, 0, 0);
    for variant in variants {
        let Some(suggestion) = suggest(&variant.value, &terms) else {
            unmatched += 1;
            println!("{}\t{}\t-\tno match", variant.id, variant.value);
            continue;
        };
        matched += 1;
        println!(
            "{}\t{}\t{:?}\t{}{}",
            variant.id,
            variant.value,
            suggestion.tier,
            suggestion.path,
            suggestion
                .source
                .as_deref()
                .map(|s| format!(" (term {s})"))
                .unwrap_or_default()
        );

        if args.apply {
            let mut active: product_variants::ActiveModel = variant.into();
            active.image_url = Set(Some(suggestion.path));
            active.update(&conn).await?;
            applied += 1;
        }
    }

    tracing::info!(matched, unmatched, applied, apply = args.apply, "swatch matching done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn term(name: &str, swatch_image: Option<&str>) -> product_attribute_terms::Model {
        product_attribute_terms::Model {
            id: Uuid::new_v4(),
            attribute_id: Uuid::nil(),
            name: name.into(),
            slug: slugify(name),
            swatch_image: swatch_image.map(str::to_string),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn term_image_is_preferred() {
        let terms = [
            term("Natural Black", Some("/uploads/natural.png")),
            term("Honey Blonde", None),
        ];
        let s = suggest("natural-black", &terms).unwrap();
        assert_eq!(s.path, "/uploads/natural.png");
        assert_eq!(s.tier, MatchTier::Exact);
        assert_eq!(s.source.as_deref(), Some("Natural Black"));
    }

    #[test]
    fn term_without_image_falls_back_to_keyword() {
        let terms = [term("Honey Blonde", None)];
        let s = suggest("Honey Blonde", &terms).unwrap();
        assert_eq!(s.path, "/swatches/honey-blonde.jpg");
        assert_eq!(s.tier, MatchTier::Keyword);
        assert!(s.source.is_none());
    }

    #[test]
    fn unknown_color_has_no_suggestion() {
        assert_eq!(suggest("Lilac", &[]), None);
    }
}
