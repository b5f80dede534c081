//! # User Store
//!
//! Admin view-model over `/users`. Same shape as the product store, with
//! two twists:
//! - `get_user` falls back to the already fetched list when the backend
//!   cannot answer, and does not report that failure globally
//! - `create_user` builds the user locally since the backend only echoes an id

use std::sync::Arc;

use parking_lot::RwLock;
use shopfront_core::{CreatedId, User, UserId, UserInput, UserPatch};
use tracing::{debug, info, warn};

use super::{begin, error_message, track, ActionStatus, StoreState};
use crate::api::Api;
use crate::handler::ErrorHandler;

#[derive(Debug, Default)]
struct UserState {
    users: Vec<User>,
    user: Option<User>,
    status: ActionStatus,
}

impl StoreState for UserState {
    type Category = ();

    fn status_mut(&mut self, _: ()) -> &mut ActionStatus {
        &mut self.status
    }
}

impl UserState {
    fn next_id(&self) -> UserId {
        self.users.iter().map(|u| u.id).max().unwrap_or(0).max(0) + 1
    }

    fn replace(&mut self, updated: &User) {
        if let Some(slot) = self.users.iter_mut().find(|u| u.id == updated.id) {
            *slot = updated.clone();
        }
        if self.user.as_ref().map(|u| u.id) == Some(updated.id) {
            self.user = Some(updated.clone());
        }
    }

    fn forget(&mut self, id: UserId) {
        self.users.retain(|u| u.id != id);
        if self.user.as_ref().map(|u| u.id) == Some(id) {
            self.user = None;
        }
    }
}

/// User administration store.
pub struct UserStore {
    api: Arc<dyn Api>,
    handler: Arc<dyn ErrorHandler>,
    state: RwLock<UserState>,
}

impl UserStore {
    pub fn new(api: Arc<dyn Api>, handler: Arc<dyn ErrorHandler>) -> Self {
        UserStore {
            api,
            handler,
            state: RwLock::new(UserState::default()),
        }
    }

    pub fn users(&self) -> Vec<User> {
        self.state.read().users.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.read().status.loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().status.error.clone()
    }

    /// `GET /users`; replaces the list.
    pub async fn get_users(&self) -> Vec<User> {
        debug!("Fetching users");
        track(
            &self.state,
            (),
            self.handler.as_ref(),
            "Failed to fetch users",
            self.api.get_json::<Vec<User>>("/users"),
            |state, users| state.users = users.clone(),
        )
        .await
        .unwrap_or_default()
    }

    /// `GET /users/{id}`, falling back to the fetched list on failure.
    ///
    /// The error slot is only set when no local entry exists, and the
    /// failure is never forwarded to the error handler.
    pub async fn get_user(&self, id: UserId) -> Option<User> {
        debug!(user_id = id, "Fetching user");
        begin(&self.state, ());
        let result = self.api.get_json::<User>(&format!("/users/{}", id)).await;

        let mut state = self.state.write();
        state.status.loading = false;
        match result {
            Ok(user) => {
                state.user = Some(user.clone());
                Some(user)
            }
            Err(err) => {
                let local = state.users.iter().find(|u| u.id == id).cloned();
                if local.is_none() {
                    state.status.error = Some(error_message(&err, "Failed to fetch user"));
                } else {
                    warn!(user_id = id, error = %err, "Using cached user");
                }
                state.user = local.clone();
                local
            }
        }
    }

    /// `POST /users`; the new user is built from `input` and prepended.
    ///
    /// The id comes from the response, or is one past the highest known id
    /// when the backend does not send one.
    pub async fn create_user(&self, input: &UserInput) -> Option<User> {
        debug!(username = %input.username, "Creating user");

        let created = track(
            &self.state,
            (),
            self.handler.as_ref(),
            "Failed to create user",
            self.api.post_json::<CreatedId, _>("/users", input),
            |_, _| {},
        )
        .await?;

        let user = {
            let mut state = self.state.write();
            let user = User {
                id: created.id.unwrap_or_else(|| state.next_id()),
                username: input.username.clone(),
                email: input.email.clone(),
                password: input.password.clone(),
            };
            state.users.insert(0, user.clone());
            state.user = Some(user.clone());
            user
        };

        info!(user_id = user.id, "User created");
        Some(user)
    }

    /// `PUT /users/{id}`; replaces the matching entries in place.
    pub async fn update_user(&self, id: UserId, patch: &UserPatch) -> Option<User> {
        debug!(user_id = id, "Updating user");
        let path = format!("/users/{}", id);
        track(
            &self.state,
            (),
            self.handler.as_ref(),
            "Failed to update user",
            self.api.put_json::<User, _>(&path, patch),
            UserState::replace,
        )
        .await
    }

    /// `DELETE /users/{id}`; drops it locally once the backend agrees.
    pub async fn delete_user(&self, id: UserId) -> bool {
        debug!(user_id = id, "Deleting user");
        let path = format!("/users/{}", id);
        track(
            &self.state,
            (),
            self.handler.as_ref(),
            "Failed to delete user",
            self.api.delete(&path),
            |state, _| state.forget(id),
        )
        .await
        .is_some()
    }
}
