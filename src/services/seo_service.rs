//! Meta tag audit across products and blog posts.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::seo::{SeoAudit, SeoIssue, SeoProblem, SeoSubject, UpdateSeoRequest},
    entity::{
        blog_posts::{self, Entity as BlogPosts},
        products::{self, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    models::{BlogPost, Product},
    response::{ApiResponse, Meta},
    slug,
    state::AppState,
    validation,
};

pub const MAX_META_TITLE: usize = 60;
pub const MAX_META_DESCRIPTION: usize = 160;

/// Fields the audit looks at, for either kind of page.
#[derive(Debug, Clone)]
pub struct SeoEntry {
    pub subject: SeoSubject,
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

impl From<products::Model> for SeoEntry {
    fn from(p: products::Model) -> Self {
        Self {
            subject: SeoSubject::Product,
            id: p.id,
            slug: p.slug,
            title: p.name,
            meta_title: p.meta_title,
            meta_description: p.meta_description,
        }
    }
}

impl From<blog_posts::Model> for SeoEntry {
    fn from(p: blog_posts::Model) -> Self {
        Self {
            subject: SeoSubject::BlogPost,
            id: p.id,
            slug: p.slug,
            title: p.title,
            meta_title: p.meta_title,
            meta_description: p.meta_description,
        }
    }
}

fn meta_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Problems per entry; entries without problems are left out.
pub fn audit_entries(entries: Vec<SeoEntry>) -> Vec<SeoIssue> {
    let mut title_counts: HashMap<String, usize> = HashMap::new();
    for entry in &entries {
        if let Some(title) = meta_text(&entry.meta_title) {
            *title_counts.entry(title.to_lowercase()).or_default() += 1;
        }
    }

    entries
        .into_iter()
        .filter_map(|entry| {
            let mut problems = Vec::new();
            match meta_text(&entry.meta_title) {
                None => problems.push(SeoProblem::MissingMetaTitle),
                Some(title) => {
                    if title.chars().count() > MAX_META_TITLE {
                        problems.push(SeoProblem::MetaTitleTooLong);
                    }
                    if title_counts.get(&title.to_lowercase()).copied().unwrap_or(0) > 1 {
                        problems.push(SeoProblem::DuplicateMetaTitle);
                    }
                }
            }
            match meta_text(&entry.meta_description) {
                None => problems.push(SeoProblem::MissingMetaDescription),
                Some(desc) if desc.chars().count() > MAX_META_DESCRIPTION => {
                    problems.push(SeoProblem::MetaDescriptionTooLong)
                }
                Some(_) => {}
            }
            if !slug::is_valid_slug(&entry.slug) {
                problems.push(SeoProblem::InvalidSlug);
            }

            (!problems.is_empty()).then(|| SeoIssue {
                subject: entry.subject,
                id: entry.id,
                slug: entry.slug,
                title: entry.title,
                problems,
            })
        })
        .collect()
}

pub async fn run_audit(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<SeoAudit>> {
    ensure_manager(user)?;
    let products = Products::find()
        .order_by_asc(products::Column::Name)
        .all(&state.orm)
        .await?;
    let posts = BlogPosts::find()
        .order_by_asc(blog_posts::Column::Title)
        .all(&state.orm)
        .await?;

    let checked_products = products.len();
    let checked_posts = posts.len();
    let entries: Vec<SeoEntry> = products
        .into_iter()
        .map(SeoEntry::from)
        .chain(posts.into_iter().map(SeoEntry::from))
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        SeoAudit {
            checked_products,
            checked_posts,
            issues: audit_entries(entries),
        },
        Some(Meta::empty()),
    ))
}

fn resolved_slug(raw: &str) -> AppResult<String> {
    slug::resolve(Some(raw), "").ok_or_else(|| AppError::BadRequest("Invalid slug".into()))
}

pub async fn update_product_seo(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateSeoRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_manager(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: products::ActiveModel = existing.into();
    if let Some(title) = payload.meta_title {
        active.meta_title = Set(validation::optional(Some(title)));
    }
    if let Some(desc) = payload.meta_description {
        active.meta_description = Set(validation::optional(Some(desc)));
    }
    if let Some(raw) = payload.slug {
        active.slug = Set(resolved_slug(&raw)?);
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "seo_update",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success("SEO updated", product.into(), None))
}

pub async fn update_post_seo(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateSeoRequest,
) -> AppResult<ApiResponse<BlogPost>> {
    ensure_manager(user)?;
    let existing = BlogPosts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: blog_posts::ActiveModel = existing.into();
    if let Some(title) = payload.meta_title {
        active.meta_title = Set(validation::optional(Some(title)));
    }
    if let Some(desc) = payload.meta_description {
        active.meta_description = Set(validation::optional(Some(desc)));
    }
    if let Some(raw) = payload.slug {
        active.slug = Set(resolved_slug(&raw)?);
    }
    active.updated_at = Set(Utc::now().into());
    let post = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "seo_update",
        "blog_posts",
        serde_json::json!({ "post_id": id }),
    )
    .await;

    Ok(ApiResponse::success("SEO updated", post.into(), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(slug: &str, title: Option<&str>, desc: Option<&str>) -> SeoEntry {
        SeoEntry {
            subject: SeoSubject::Product,
            id: Uuid::new_v4(),
            slug: slug.into(),
            title: "Bob Wig".into(),
            meta_title: title.map(str::to_string),
            meta_description: desc.map(str::to_string),
        }
    }

    #[test]
    fn clean_entries_are_not_reported() {
        let issues = audit_entries(vec![entry("bob-wig", Some("Bob Wig"), Some("Short bob"))]);
        assert!(issues.is_empty());
    }

    #[test]
    fn missing_and_long_meta_are_flagged() {
        let long_title = "t".repeat(MAX_META_TITLE + 1);
        let long_desc = "d".repeat(MAX_META_DESCRIPTION + 1);
        let issues = audit_entries(vec![
            entry("a", None, Some("   ")),
            entry("b", Some(&long_title), Some(&long_desc)),
        ]);
        assert_eq!(
            issues[0].problems,
            vec![SeoProblem::MissingMetaTitle, SeoProblem::MissingMetaDescription]
        );
        assert_eq!(
            issues[1].problems,
            vec![SeoProblem::MetaTitleTooLong, SeoProblem::MetaDescriptionTooLong]
        );
    }

    #[test]
    fn limits_are_inclusive() {
        let title = "t".repeat(MAX_META_TITLE);
        let desc = "d".repeat(MAX_META_DESCRIPTION);
        assert!(audit_entries(vec![entry("ok", Some(&title), Some(&desc))]).is_empty());
    }

    #[test]
    fn duplicate_titles_ignore_case() {
        let issues = audit_entries(vec![
            entry("one", Some("Body Wave Wig"), Some("x")),
            entry("two", Some("body wave wig "), Some("y")),
        ]);
        assert_eq!(issues.len(), 2);
        assert!(issues
            .iter()
            .all(|i| i.problems == vec![SeoProblem::DuplicateMetaTitle]));
    }

    #[test]
    fn invalid_slug_is_flagged() {
        let issues = audit_entries(vec![entry("Bad Slug", Some("t"), Some("d"))]);
        assert_eq!(issues[0].problems, vec![SeoProblem::InvalidSlug]);
    }
}
