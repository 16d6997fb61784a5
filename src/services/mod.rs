// src/services/mod.rs

pub mod listing;
pub mod permission_gate;
pub mod result;
pub mod scoring;

pub use listing::{Pagination, SessionLister};
pub use permission_gate::PermissionGate;
pub use result::ResultAssembler;
pub use scoring::ScoringEngine;

/// Who is asking, and whether they may see sessions they do not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: i64,
    pub full_access: bool,
}

impl Viewer {
    pub fn owner(user_id: i64) -> Self {
        Self {
            user_id,
            full_access: false,
        }
    }

    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            full_access: true,
        }
    }
}
