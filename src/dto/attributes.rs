use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Attribute, AttributeTerm};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAttributeRequest {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TermRequest {
    pub name: String,
    pub slug: Option<String>,
    pub swatch_image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttributeWithTerms {
    pub attribute: Attribute,
    pub terms: Vec<AttributeTerm>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttributeList {
    pub items: Vec<AttributeWithTerms>,
}
