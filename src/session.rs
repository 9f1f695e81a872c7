//! Authenticated session: the current user and bearer token, persisted through
//! [`Storage`] so a restarted client picks up where it left off.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use log::{info, warn};
use crate::api::auth::AuthApi;
use crate::error::ApiError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, Role, User};
use crate::navigation::{Navigator, Route};
use crate::utils::storage::{Storage, TOKEN_KEY, USER_KEY};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
}

struct Inner {
    storage: Arc<dyn Storage>,
    navigator: Navigator,
    state: RwLock<SessionState>,
}

/// Cheap to clone; every clone sees the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Restores `{user, token}` from storage. A stored user that no longer parses
    /// discards both keys.
    pub fn rehydrate(storage: Arc<dyn Storage>, navigator: Navigator) -> Self {
        let mut state = SessionState::default();

        if let (Some(token), Some(raw_user)) = (storage.get(TOKEN_KEY), storage.get(USER_KEY)) {
            match serde_json::from_str::<User>(&raw_user) {
                Ok(user) => {
                    info!("Restored session for {}", user.username);
                    state.token = Some(token);
                    state.user = Some(user);
                }
                Err(e) => {
                    warn!("Error parsing stored user, discarding session: {}", e);
                    remove_keys(storage.as_ref());
                }
            }
        }

        SessionStore {
            inner: Arc::new(Inner { storage, navigator, state: RwLock::new(state) }),
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    pub fn navigator(&self) -> &Navigator {
        &self.inner.navigator
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    // The HTTP layer reads the token from storage, not from memory.
    pub fn persisted_token(&self) -> Option<String> {
        self.inner.storage.get(TOKEN_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        let state = self.read();
        state.token.is_some() && state.user.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.read().user.as_ref().map(|u| u.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn is_student(&self) -> bool {
        self.role() == Some(Role::Student)
    }

    pub fn can_visit(&self, route: Route) -> bool {
        if !route.requires_auth() {
            return true;
        }
        self.is_authenticated() && (!route.requires_admin() || self.is_admin())
    }

    /// Stores the token and derived user from an auth response, in memory and on disk.
    pub fn establish(&self, response: &AuthResponse) -> Result<User, ApiError> {
        let user = response.to_user();
        let raw_user = serde_json::to_string(&user).map_err(|e| ApiError::Storage(e.to_string()))?;

        self.inner.storage.set(TOKEN_KEY, &response.token)?;
        // A token without its user would rehydrate as a half session.
        if let Err(err) = self.inner.storage.set(USER_KEY, &raw_user) {
            if let Err(e) = self.inner.storage.remove(TOKEN_KEY) {
                warn!("Failed to roll back stored token: {:#}", e);
            }
            return Err(err.into());
        }

        let mut state = self.write();
        state.token = Some(response.token.clone());
        state.user = Some(user.clone());
        Ok(user)
    }

    pub async fn login(&self, auth: &AuthApi, credentials: &LoginRequest) -> Result<User, ApiError> {
        let response = auth.login(credentials).await?;
        let user = self.establish(&response)?;
        info!("Logged in as {} ({})", user.username, user.role);
        self.inner.navigator.redirect(Route::home(user.role));
        Ok(user)
    }

    pub async fn register(&self, auth: &AuthApi, request: &RegisterRequest) -> Result<User, ApiError> {
        let response = auth.register(request).await?;
        let user = self.establish(&response)?;
        info!("Registered {} ({})", user.username, user.role);
        self.inner.navigator.redirect(Route::home(user.role));
        Ok(user)
    }

    /// Replaces the stored user with the backend's view of the current account.
    pub async fn refresh_user(&self, auth: &AuthApi) -> Result<User, ApiError> {
        let mut user = auth.me().await?;
        // `/auth/me` may omit the student number the login response carried.
        if user.student_id.is_none() {
            user.student_id = self.user().and_then(|u| u.student_id);
        }
        let raw_user = serde_json::to_string(&user).map_err(|e| ApiError::Storage(e.to_string()))?;
        self.inner.storage.set(USER_KEY, &raw_user)?;
        self.write().user = Some(user.clone());
        Ok(user)
    }

    pub fn logout(&self) {
        self.clear();
        self.inner.navigator.redirect(Route::Login);
        info!("Logged out");
    }

    /// Called when the backend rejects the token: drop the session and force the login screen.
    pub fn expire(&self) {
        if self.is_authenticated() || self.persisted_token().is_some() {
            warn!("Session rejected by the backend, logging out");
        }
        self.clear();
        self.inner.navigator.redirect(Route::Login);
    }

    fn clear(&self) {
        {
            let mut state = self.write();
            state.user = None;
            state.token = None;
        }
        remove_keys(self.inner.storage.as_ref());
    }
}

fn remove_keys(storage: &dyn Storage) {
    for key in [TOKEN_KEY, USER_KEY] {
        if let Err(e) = storage.remove(key) {
            warn!("Failed to remove {} from storage: {:#}", key, e);
        }
    }
}
