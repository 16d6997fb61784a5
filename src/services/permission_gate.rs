// src/services/permission_gate.rs

use std::{collections::HashSet, sync::Arc};

use crate::{
    error::AppError,
    models::permission::{Permission, Role},
    store::RoleStore,
};

/// Union of the permissions granted by every role.
pub fn effective_permissions(roles: &[Role]) -> HashSet<Permission> {
    roles
        .iter()
        .flat_map(|role| role.permissions.iter().copied())
        .collect()
}

/// True when `granted` is a superset of `required`.
pub fn grants_all(granted: &HashSet<Permission>, required: &[Permission]) -> bool {
    required.iter().all(|permission| granted.contains(permission))
}

/// Fails with `Unauthorized` unless `granted` covers every permission in
/// `required`. There is no partial success.
pub fn ensure(granted: &HashSet<Permission>, required: &[Permission]) -> Result<(), AppError> {
    if grants_all(granted, required) {
        return Ok(());
    }

    tracing::debug!("Granted {:?} lacks one of {:?}", granted, required);
    Err(AppError::Unauthorized(
        "You do not have permission to perform this action.".to_string(),
    ))
}

/// Resolves whether a user holds a set of capabilities through their roles.
#[derive(Clone)]
pub struct PermissionGate {
    roles: Arc<dyn RoleStore>,
}

impl PermissionGate {
    pub fn new(roles: Arc<dyn RoleStore>) -> Self {
        Self { roles }
    }

    /// Everything the user's roles grant, from a single role lookup.
    pub async fn granted(&self, user_id: i64) -> Result<HashSet<Permission>, AppError> {
        let roles = self.roles.roles_for_user(user_id).await?;
        Ok(effective_permissions(&roles))
    }

    /// Whether the user holds every permission in `required`.
    pub async fn has_permissions(
        &self,
        user_id: i64,
        required: &[Permission],
    ) -> Result<bool, AppError> {
        if required.is_empty() {
            return Ok(true);
        }

        Ok(grants_all(&self.granted(user_id).await?, required))
    }

    /// Fails with `Unauthorized` unless the user holds every permission in
    /// `required`.
    pub async fn check_permissions(
        &self,
        user_id: i64,
        required: &[Permission],
    ) -> Result<(), AppError> {
        if required.is_empty() {
            return Ok(());
        }

        ensure(&self.granted(user_id).await?, required)
    }
}
