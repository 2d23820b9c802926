use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    entity::{
        blog_posts::{self, Entity as BlogPosts},
        collections::{self, Entity as Collections},
        enums::PostStatus,
        products::{self, Entity as Products},
    },
    error::AppResult,
    state::AppState,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapUrl {
    pub path: String,
    pub last_modified: Option<DateTime<Utc>>,
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn render(site_url: &str, urls: &[SitemapUrl]) -> String {
    let base = site_url.trim_end_matches('/');
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for url in urls {
        xml.push_str("  <url><loc>");
        xml.push_str(&escape(&format!("{base}{}", url.path)));
        xml.push_str("</loc>");
        if let Some(at) = url.last_modified {
            xml.push_str(&format!("<lastmod>{}</lastmod>", at.format("%Y-%m-%d")));
        }
        xml.push_str("</url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

pub async fn build_sitemap(state: &AppState) -> AppResult<String> {
    let mut urls = vec![
        SitemapUrl {
            path: "/".into(),
            last_modified: None,
        },
        SitemapUrl {
            path: "/blog".into(),
            last_modified: None,
        },
    ];

    let products = Products::find()
        .filter(products::Column::IsActive.eq(true))
        .order_by_asc(products::Column::Slug)
        .all(&state.orm)
        .await?;
    urls.extend(products.into_iter().map(|p| SitemapUrl {
        path: format!("/products/{}", p.slug),
        last_modified: Some(p.updated_at.with_timezone(&Utc)),
    }));

    let collections = Collections::find()
        .filter(collections::Column::IsActive.eq(true))
        .order_by_asc(collections::Column::Slug)
        .all(&state.orm)
        .await?;
    urls.extend(collections.into_iter().map(|c| SitemapUrl {
        path: format!("/collections/{}", c.slug),
        last_modified: None,
    }));

    let posts = BlogPosts::find()
        .filter(blog_posts::Column::Status.eq(PostStatus::Published))
        .order_by_desc(blog_posts::Column::PublishedAt)
        .all(&state.orm)
        .await?;
    urls.extend(posts.into_iter().map(|p| SitemapUrl {
        path: format!("/blog/{}", p.slug),
        last_modified: Some(p.updated_at.with_timezone(&Utc)),
    }));

    Ok(render(&state.config.site_url, &urls))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn renders_locations_and_lastmod() {
        let at = Utc.with_ymd_and_hms(2025, 5, 1, 8, 30, 0).unwrap();
        let xml = render(
            "https://shop.example/",
            &[
                SitemapUrl {
                    path: "/products/bob-wig".into(),
                    last_modified: Some(at),
                },
                SitemapUrl {
                    path: "/blog?a=1&b=2".into(),
                    last_modified: None,
                },
            ],
        );
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(
            "<url><loc>https://shop.example/products/bob-wig</loc><lastmod>2025-05-01</lastmod></url>"
        ));
        assert!(xml.contains("<loc>https://shop.example/blog?a=1&amp;b=2</loc>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }
}
