use std::sync::Arc;

use crate::api::AdminApiState;
use crate::error::ApiError;
use crate::loading::LoadingFlag;
use crate::models::{AdminUpdate, UserRecord};
use crate::session::SessionStore;

/// AdminDirectory
///
/// User administration for the `/admin/users` view. Nothing is cached: each call
/// goes to the server, which enforces the admin requirement itself.
pub struct AdminDirectory {
    session: Arc<SessionStore>,
    api: AdminApiState,
    loading: LoadingFlag,
}

impl AdminDirectory {
    pub fn new(session: Arc<SessionStore>, api: AdminApiState) -> Self {
        Self {
            session,
            api,
            loading: LoadingFlag::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, ApiError> {
        let _loading = self.loading.begin();
        let token = self.session.token();
        self.api
            .list_users(token.as_deref())
            .await
            .map_err(|e| self.on_error(e))
    }

    /// Grants or revokes administrator rights for `id`.
    pub async fn set_user_admin(&self, id: i64, is_admin: bool) -> Result<UserRecord, ApiError> {
        let _loading = self.loading.begin();
        let token = self.session.token();
        let user = self
            .api
            .set_user_admin(token.as_deref(), id, AdminUpdate { is_admin })
            .await
            .map_err(|e| self.on_error(e))?;
        tracing::info!(user_id = id, is_admin, "user admin flag changed");
        Ok(user)
    }

    /// Deletes the user. The server removes their events with them.
    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        let _loading = self.loading.begin();
        let token = self.session.token();
        self.api
            .delete_user(token.as_deref(), id)
            .await
            .map_err(|e| self.on_error(e))?;
        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }

    fn on_error(&self, e: ApiError) -> ApiError {
        if e.is_unauthorized() {
            self.session.handle_unauthorized();
        }
        e
    }
}
