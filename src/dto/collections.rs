use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Collection, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CollectionRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCollectionRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Replaces membership; list order becomes display position.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetProductsRequest {
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionList {
    pub items: Vec<Collection>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionDetail {
    pub collection: Collection,
    pub products: Vec<Product>,
}
