use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    /// Meta for a page whose total came from a SeaORM `count`.
    pub fn counted(page: i64, per_page: i64, total: u64) -> Self {
        Self::new(page, per_page, i64::try_from(total).unwrap_or(i64::MAX))
    }

    /// Meta for an unpaginated list: everything on page one.
    pub fn single_page(total: usize) -> Self {
        let total = i64::try_from(total).unwrap_or(i64::MAX);
        Self::new(1, total.max(1), total)
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// Acknowledgement with an empty object as data.
    pub fn done(message: impl Into<String>) -> Self {
        Self::success(message, serde_json::json!({}), Some(Meta::empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::Meta;

    #[test]
    fn single_page_never_reports_zero_per_page() {
        let empty = Meta::single_page(0);
        assert_eq!((empty.page, empty.per_page, empty.total), (Some(1), Some(1), Some(0)));

        let three = Meta::single_page(3);
        assert_eq!((three.per_page, three.total), (Some(3), Some(3)));
    }
}
