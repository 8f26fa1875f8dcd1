//! Tag catalog lookups.

use forkful_common::{AppError, AppResult, id};
use forkful_db::{entities::tag, repositories::TagRepository};

/// Read-only tag catalog service.
#[derive(Clone)]
pub struct TagService {
    repo: TagRepository,
}

impl TagService {
    #[must_use]
    pub const fn new(repo: TagRepository) -> Self {
        Self { repo }
    }

    /// List all tags sorted by name.
    pub async fn list(&self) -> AppResult<Vec<tag::Model>> {
        self.repo.find_all().await
    }

    /// Look up one tag by id.
    pub async fn get(&self, tag_id: &str) -> AppResult<tag::Model> {
        if !id::is_well_formed(tag_id) {
            return Err(AppError::InvalidIdentifier(tag_id.to_string()));
        }
        self.repo.get_by_id(tag_id).await
    }
}
