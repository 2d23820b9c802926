use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::NewsletterSubscriber;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriberList {
    pub items: Vec<NewsletterSubscriber>,
}
