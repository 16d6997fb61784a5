// src/services/listing.rs

use std::sync::Arc;

use crate::{
    error::AppError,
    models::session::{PagedResult, SessionStatus, TestSession},
    services::Viewer,
    store::{PageWindow, SessionFilter, SessionStore},
};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Normalized pagination input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Values below 1 fall back to the defaults; `limit` is capped.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        Self { page, limit }
    }

    pub fn window(&self) -> PageWindow {
        PageWindow {
            offset: (self.page - 1).saturating_mul(self.limit),
            limit: self.limit,
        }
    }

    /// `ceil(total_items / limit)`, never below 1.
    pub fn total_pages(&self, total_items: i64) -> i64 {
        if total_items <= 0 {
            return 1;
        }
        (total_items + self.limit - 1) / self.limit
    }
}

/// Filtered, paginated session listings.
#[derive(Clone)]
pub struct SessionLister {
    store: Arc<dyn SessionStore>,
}

impl SessionLister {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Lists the viewer's own sessions, or every session for full-access
    /// viewers, most recently updated first.
    pub async fn list(
        &self,
        viewer: Viewer,
        pagination: Pagination,
        statuses: Vec<SessionStatus>,
    ) -> Result<PagedResult<TestSession>, AppError> {
        let filter = SessionFilter {
            owner: (!viewer.full_access).then_some(viewer.user_id),
            statuses,
        };

        let (items, total_items) = self
            .store
            .list_sessions(&filter, pagination.window())
            .await?;

        Ok(PagedResult {
            items,
            page: pagination.page,
            limit: pagination.limit,
            total_items,
            total_pages: pagination.total_pages(total_items),
        })
    }
}
