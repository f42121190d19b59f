//! User registration and profiles.

use domain::{Actor, ProfileUpdate, Role, User};
use domain::user::normalize_email;
use store::Store;

use crate::error::{CommerceError, Result};

#[derive(Clone)]
pub struct UserService<S: Store> {
    store: S,
}

impl<S: Store> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a regular user. Fails with `AlreadyExists` if the email is taken.
    #[tracing::instrument(skip(self, name))]
    pub async fn register(&self, name: &str, email: &str) -> Result<User> {
        let email = normalize_email(email)?;
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(CommerceError::AlreadyExists(format!(
                "user with email {email} already exists"
            )));
        }

        let user = User::register(name, &email, Role::User)?;
        self.store.insert_user(user.clone()).await?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn get_profile(&self, actor: &Actor) -> Result<User> {
        self.store
            .get_user(actor.user_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("User", actor.user_id))
    }

    /// Applies a partial profile edit to the actor's own record.
    #[tracing::instrument(skip(self, update), fields(user_id = %actor.user_id))]
    pub async fn update_profile(&self, actor: &Actor, update: ProfileUpdate) -> Result<User> {
        let mut user = self.get_profile(actor).await?;
        user.apply_update(update)?;
        self.store.update_user(user.clone()).await?;
        Ok(user)
    }
}
