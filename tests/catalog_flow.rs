mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use hair_storefront_api::{
    dto::{
        admin::UpdateRoleRequest,
        collections::{CollectionRequest, SetProductsRequest},
        flash_sales::FlashSaleRequest,
        newsletter::SubscribeRequest,
        reviews::CreateReviewRequest,
    },
    entity::enums::Role,
    error::AppError,
    routes::{build_app, params::Pagination},
    services::{
        auth_service::issue_token, collection_service, flash_sale_service, newsletter_service,
        product_service, review_service, user_service,
    },
    state::AppState,
};
use tower::ServiceExt;

// Manager curates a collection and a flash sale; a customer reviews once.
#[tokio::test]
async fn collections_flash_sales_and_reviews() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&database_url).await?;

    let manager = common::create_user(&state, Role::Manager, "manager@example.com").await?;
    let customer = common::create_user(&state, Role::Customer, "reviewer@example.com").await?;
    let bob = common::create_product(&state, "bob-wig", 20_000, 5).await?;
    let bundle = common::create_product(&state, "kinky-curly-bundle", 12_000, 5).await?;

    let collection = collection_service::create_collection(
        &state,
        &manager,
        CollectionRequest {
            name: "Best Sellers".into(),
            slug: None,
            description: None,
            image_url: None,
            is_active: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(collection.slug, "best-sellers");

    let denied = collection_service::create_collection(
        &state,
        &customer,
        CollectionRequest {
            name: "Nope".into(),
            slug: None,
            description: None,
            image_url: None,
            is_active: None,
        },
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    collection_service::set_products(
        &state,
        &manager,
        collection.id,
        SetProductsRequest {
            product_ids: vec![bundle.id, bob.id, bundle.id],
        },
    )
    .await?;
    let detail = collection_service::get_collection_by_slug(&state, "best-sellers".into())
        .await?
        .data
        .unwrap();
    let order: Vec<_> = detail.products.iter().map(|p| p.id).collect();
    assert_eq!(order, vec![bundle.id, bob.id]);

    let now = Utc::now();
    let bad_window = flash_sale_service::create_flash_sale(
        &state,
        &manager,
        FlashSaleRequest {
            name: "Backwards".into(),
            discount_percent: 10,
            starts_at: now,
            ends_at: now - Duration::hours(1),
            is_active: None,
        },
    )
    .await;
    assert!(matches!(bad_window, Err(AppError::BadRequest(_))));

    let sale = flash_sale_service::create_flash_sale(
        &state,
        &manager,
        FlashSaleRequest {
            name: "Weekend".into(),
            discount_percent: 25,
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::hours(1),
            is_active: None,
        },
    )
    .await?
    .data
    .unwrap();
    flash_sale_service::set_products(
        &state,
        &manager,
        sale.flash_sale.id,
        SetProductsRequest {
            product_ids: vec![bob.id],
        },
    )
    .await?;

    let bob_detail = product_service::get_product_by_slug(&state, "bob-wig".into())
        .await?
        .data
        .unwrap();
    assert_eq!(bob_detail.flash_sale_percent, Some(25));
    assert_eq!(bob_detail.product.sale_price, Some(15_000));
    let bundle_detail = product_service::get_product_by_slug(&state, "kinky-curly-bundle".into())
        .await?
        .data
        .unwrap();
    assert_eq!(bundle_detail.product.sale_price, None);

    let review = |rating| CreateReviewRequest {
        rating,
        title: None,
        body: "Soft and full".into(),
    };
    let invalid = review_service::create_review(
        &state,
        &customer,
        "kinky-curly-bundle".into(),
        review(6),
    )
    .await;
    assert!(matches!(invalid, Err(AppError::BadRequest(_))));

    review_service::create_review(&state, &customer, "kinky-curly-bundle".into(), review(5))
        .await?;
    let repeat = review_service::create_review(
        &state,
        &customer,
        "kinky-curly-bundle".into(),
        review(4),
    )
    .await;
    assert!(matches!(repeat, Err(AppError::Conflict(_))));

    // pending reviews are not public
    let public = review_service::list_product_reviews(
        &state,
        "kinky-curly-bundle".into(),
        Pagination::default(),
    )
    .await?;
    assert!(public.data.unwrap().items.is_empty());

    newsletter_subscriptions(&state).await?;
    role_changes(&state).await
}

fn email(raw: &str) -> SubscribeRequest {
    SubscribeRequest { email: raw.into() }
}

async fn newsletter_subscriptions(state: &AppState) -> anyhow::Result<()> {
    let first = newsletter_service::subscribe(state, email("Fan@Example.com"))
        .await?
        .data
        .unwrap();
    assert_eq!(first.email, "fan@example.com");
    let again = newsletter_service::subscribe(state, email("fan@example.com "))
        .await?
        .data
        .unwrap();
    assert_eq!(again.id, first.id);

    let gone = newsletter_service::unsubscribe(state, email("fan@example.com"))
        .await?
        .data
        .unwrap();
    assert!(!gone.is_active);
    assert!(gone.unsubscribed_at.is_some());

    let back = newsletter_service::subscribe(state, email("fan@example.com"))
        .await?
        .data
        .unwrap();
    assert_eq!(back.id, first.id);
    assert!(back.is_active);
    assert!(back.unsubscribed_at.is_none());

    let unknown = newsletter_service::unsubscribe(state, email("nobody@example.com")).await;
    assert!(matches!(unknown, Err(AppError::NotFound)));
    Ok(())
}

async fn dashboard_status(state: &AppState, token: &str) -> anyhow::Result<StatusCode> {
    let response = build_app(state.clone())
        .oneshot(
            Request::get("/api/admin/dashboard")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;
    Ok(response.status())
}

// An admin cannot demote themselves, and a demotion applies to tokens already issued.
async fn role_changes(state: &AppState) -> anyhow::Result<()> {
    let owner = common::create_user(state, Role::Admin, "owner@example.com").await?;
    let deputy = common::create_user(state, Role::Admin, "deputy@example.com").await?;

    let self_demotion = user_service::update_role(
        state,
        &owner,
        owner.user_id,
        UpdateRoleRequest {
            role: Role::Customer,
        },
    )
    .await;
    assert!(matches!(self_demotion, Err(AppError::BadRequest(_))));

    let token = issue_token(deputy.user_id, Role::Admin, &state.config.jwt_secret, 1)?;
    assert_eq!(dashboard_status(state, &token).await?, StatusCode::OK);

    user_service::update_role(
        state,
        &owner,
        deputy.user_id,
        UpdateRoleRequest {
            role: Role::Customer,
        },
    )
    .await?;
    assert_eq!(dashboard_status(state, &token).await?, StatusCode::FORBIDDEN);
    Ok(())
}
