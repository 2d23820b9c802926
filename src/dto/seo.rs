use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SeoSubject {
    Product,
    BlogPost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SeoProblem {
    MissingMetaTitle,
    MetaTitleTooLong,
    MissingMetaDescription,
    MetaDescriptionTooLong,
    DuplicateMetaTitle,
    InvalidSlug,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SeoIssue {
    pub subject: SeoSubject,
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub problems: Vec<SeoProblem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SeoAudit {
    pub checked_products: usize,
    pub checked_posts: usize,
    pub issues: Vec<SeoIssue>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSeoRequest {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub slug: Option<String>,
}
