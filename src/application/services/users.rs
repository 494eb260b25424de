//! User administration and profiles.

use std::sync::Arc;

use tracing::info;

use crate::domain::{Caller, DomainError, DomainResult, Storage, User};
use crate::infrastructure::cache::{CacheEntity, CacheLayer};

/// Partial profile update for the calling user.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub pin_code: Option<String>,
}

pub struct UserService {
    storage: Arc<dyn Storage>,
    cache: CacheLayer,
}

impl UserService {
    pub fn new(storage: Arc<dyn Storage>, cache: CacheLayer) -> Self {
        Self { storage, cache }
    }

    /// All registered accounts, admin only.
    pub async fn list_users(&self, caller: &Caller) -> DomainResult<Vec<User>> {
        caller.require_admin()?;
        self.storage.list_users().await
    }

    /// Ban a user. Admin accounts cannot be banned.
    pub async fn ban(&self, caller: &Caller, user_id: &str) -> DomainResult<()> {
        caller.require_admin()?;
        let mut user = self.require_user(user_id).await?;
        if user.is_admin() {
            return Err(DomainError::Conflict("cannot ban an admin account".into()));
        }
        user.banned = true;
        self.storage.update_user(user).await?;
        info!(user_id, "user banned");
        self.cache
            .invalidate(&[CacheEntity::User(user_id.to_string())])
            .await;
        Ok(())
    }

    /// Lift a ban.
    pub async fn unban(&self, caller: &Caller, user_id: &str) -> DomainResult<()> {
        caller.require_admin()?;
        let mut user = self.require_user(user_id).await?;
        user.banned = false;
        self.storage.update_user(user).await?;
        info!(user_id, "user unbanned");
        self.cache
            .invalidate(&[CacheEntity::User(user_id.to_string())])
            .await;
        Ok(())
    }

    /// The calling user's own profile.
    pub async fn profile(&self, caller: &Caller) -> DomainResult<User> {
        let (user_id, _) = caller.require_user()?;
        self.require_user(user_id).await
    }

    /// Update the calling user's own profile.
    pub async fn update_profile(
        &self,
        caller: &Caller,
        update: ProfileUpdate,
    ) -> DomainResult<User> {
        let (user_id, _) = caller.require_user()?;
        let mut user = self.require_user(user_id).await?;

        if let Some(username) = update.username {
            if username.trim().is_empty() {
                return Err(DomainError::Validation("username must not be empty".into()));
            }
            user.username = username;
        }
        if let Some(email) = update.email {
            if !email.contains('@') {
                return Err(DomainError::Validation("invalid email address".into()));
            }
            user.email = email;
        }
        if let Some(address) = update.address {
            user.address = Some(address);
        }
        if let Some(pin_code) = update.pin_code {
            user.pin_code = Some(pin_code);
        }

        self.storage.update_user(user.clone()).await?;
        self.cache
            .invalidate(&[CacheEntity::User(user_id.to_string())])
            .await;
        Ok(user)
    }

    async fn require_user(&self, user_id: &str) -> DomainResult<User> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", user_id))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::infrastructure::storage::InMemoryStorage;

    async fn fixture() -> (UserService, Arc<InMemoryStorage>, User) {
        let storage = Arc::new(InMemoryStorage::new());
        let user = storage
            .insert_user(User::new("alice", "alice@example.com", "h", Role::User))
            .await
            .unwrap();
        (
            UserService::new(storage.clone(), CacheLayer::disabled()),
            storage,
            user,
        )
    }

    #[tokio::test]
    async fn ban_and_unban_toggle_flag() {
        let (service, storage, user) = fixture().await;
        let admin = Caller::admin("a1", "root");

        service.ban(&admin, &user.id).await.unwrap();
        assert!(storage.get_user(&user.id).await.unwrap().unwrap().banned);

        service.unban(&admin, &user.id).await.unwrap();
        assert!(!storage.get_user(&user.id).await.unwrap().unwrap().banned);
    }

    #[tokio::test]
    async fn ban_requires_admin() {
        let (service, _, user) = fixture().await;
        let err = service
            .ban(&Caller::user("u2", "bob"), &user.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admins_cannot_be_banned() {
        let (service, storage, _) = fixture().await;
        let other_admin = storage
            .insert_user(User::new("root2", "root2@example.com", "h", Role::Admin))
            .await
            .unwrap();

        let err = service
            .ban(&Caller::admin("a1", "root"), &other_admin.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn profile_update_validates_email() {
        let (service, _, user) = fixture().await;
        let caller = Caller::user(user.id.clone(), user.username.clone());

        let err = service
            .update_profile(
                &caller,
                ProfileUpdate {
                    email: Some("not-an-email".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let updated = service
            .update_profile(
                &caller,
                ProfileUpdate {
                    address: Some("5 Oak Ave".into()),
                    pin_code: Some("110002".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.address.as_deref(), Some("5 Oak Ave"));
        assert_eq!(updated.pin_code.as_deref(), Some("110002"));
    }
}
