//! User directory and the delivery roster projected from it.

use crate::LifecycleError;
use chrono::Utc;
use dairy_storage::StorageService;
use dairy_types::{NewUser, Role, StorageKey, User, UserPatch};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Owns every user record and the username index.
pub struct UserDirectory {
	storage: Arc<StorageService>,
	/// Serializes writes so username reservation and activity flips are atomic.
	write_lock: Mutex<()>,
}

impl UserDirectory {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			write_lock: Mutex::new(()),
		}
	}

	/// Blocks every roster write until the guard drops.
	pub(crate) async fn lock_roster(&self) -> MutexGuard<'_, ()> {
		self.write_lock.lock().await
	}

	fn username_key(username: &str) -> String {
		username.trim().to_lowercase()
	}

	fn validate(new_user: &NewUser) -> Result<(), LifecycleError> {
		if new_user.username.trim().is_empty() {
			return Err(LifecycleError::Validation("username cannot be blank".into()));
		}
		Ok(())
	}

	/// Registers a new user. Usernames are unique, ignoring case.
	pub async fn register(&self, new_user: NewUser) -> Result<User, LifecycleError> {
		Self::validate(&new_user)?;
		let _guard = self.write_lock.lock().await;
		self.insert(Uuid::new_v4().to_string(), new_user).await
	}

	/// Ensures a user with this exact id exists, creating it if absent.
	///
	/// Used to materialize identities that come from configuration.
	pub async fn seed(&self, id: &str, new_user: NewUser) -> Result<User, LifecycleError> {
		Self::validate(&new_user)?;
		let _guard = self.write_lock.lock().await;
		match self.get(id).await {
			Ok(user) => Ok(user),
			Err(LifecycleError::NotFound { .. }) => self.insert(id.to_string(), new_user).await,
			Err(e) => Err(e),
		}
	}

	async fn insert(&self, id: String, new_user: NewUser) -> Result<User, LifecycleError> {
		let name_key = Self::username_key(&new_user.username);
		if self
			.storage
			.exists(StorageKey::UserByName.as_str(), &name_key)
			.await?
		{
			return Err(LifecycleError::Validation(format!(
				"username '{}' is already taken",
				new_user.username.trim()
			)));
		}

		let user = User {
			id,
			username: new_user.username.trim().to_string(),
			role: new_user.role,
			phone: new_user.phone,
			address: new_user.address,
			is_active: true,
			created_at: Utc::now(),
		};

		self.storage
			.store(StorageKey::Users.as_str(), &user.id, &user)
			.await?;
		self.storage
			.store(StorageKey::UserByName.as_str(), &name_key, &user.id)
			.await?;

		tracing::info!(user_id = %user.id, role = %user.role, "Registered user");
		Ok(user)
	}

	pub async fn get(&self, id: &str) -> Result<User, LifecycleError> {
		self.storage
			.retrieve(StorageKey::Users.as_str(), id)
			.await
			.map_err(|e| LifecycleError::from_lookup("User", id, e))
	}

	/// Lists users, optionally restricted to one role, ordered by username.
	pub async fn list(&self, role: Option<Role>) -> Result<Vec<User>, LifecycleError> {
		let mut users: Vec<User> = self
			.storage
			.retrieve_all(StorageKey::Users.as_str())
			.await?;
		users.retain(|user| role.is_none_or(|r| user.role == r));
		users.sort_by(|a, b| a.username.cmp(&b.username));
		Ok(users)
	}

	pub async fn set_active(&self, id: &str, is_active: bool) -> Result<User, LifecycleError> {
		let _guard = self.write_lock.lock().await;
		let mut user = self.get(id).await?;
		user.is_active = is_active;
		self.storage
			.update(StorageKey::Users.as_str(), id, &user)
			.await?;
		tracing::info!(user_id = %id, is_active, "Updated user activity");
		Ok(user)
	}

	/// Applies a profile, role or activity change.
	///
	/// A rename moves the username index entry; the new name must be free,
	/// ignoring case, unless it only changes the case of the current one.
	pub async fn update(&self, id: &str, patch: UserPatch) -> Result<User, LifecycleError> {
		if let Some(username) = &patch.username {
			if username.trim().is_empty() {
				return Err(LifecycleError::Validation("username cannot be blank".into()));
			}
		}

		let _guard = self.write_lock.lock().await;
		let mut user = self.get(id).await?;

		let old_key = Self::username_key(&user.username);
		let mut renamed_key = None;
		if let Some(username) = patch.username {
			let new_key = Self::username_key(&username);
			if new_key != old_key
				&& self
					.storage
					.exists(StorageKey::UserByName.as_str(), &new_key)
					.await?
			{
				return Err(LifecycleError::Validation(format!(
					"username '{}' is already taken",
					username.trim()
				)));
			}
			user.username = username.trim().to_string();
			if new_key != old_key {
				renamed_key = Some(new_key);
			}
		}
		if let Some(role) = patch.role {
			user.role = role;
		}
		if let Some(phone) = patch.phone {
			user.phone = Some(phone);
		}
		if let Some(address) = patch.address {
			user.address = Some(address);
		}
		if let Some(is_active) = patch.is_active {
			user.is_active = is_active;
		}

		if let Some(new_key) = &renamed_key {
			self.storage
				.store(StorageKey::UserByName.as_str(), new_key, &user.id)
				.await?;
		}
		self.storage
			.update(StorageKey::Users.as_str(), id, &user)
			.await?;
		if renamed_key.is_some() {
			self.storage
				.remove(StorageKey::UserByName.as_str(), &old_key)
				.await?;
		}

		tracing::info!(user_id = %id, role = %user.role, "Updated user");
		Ok(user)
	}

	/// Removes a user and frees the username.
	///
	/// Orders keep the removed id as customer or courier reference.
	pub async fn delete(&self, id: &str) -> Result<(), LifecycleError> {
		let _guard = self.write_lock.lock().await;
		let user = self.get(id).await?;
		self.storage
			.remove(StorageKey::Users.as_str(), id)
			.await?;
		self.storage
			.remove(StorageKey::UserByName.as_str(), &Self::username_key(&user.username))
			.await?;
		tracing::info!(user_id = %id, "Deleted user");
		Ok(())
	}

	/// All delivery-role users.
	pub async fn personnel(&self) -> Result<Vec<User>, LifecycleError> {
		self.list(Some(Role::Delivery)).await
	}

	/// Delivery-role users that can currently take orders.
	pub async fn available(&self) -> Result<Vec<User>, LifecycleError> {
		let mut personnel = self.personnel().await?;
		personnel.retain(|user| user.is_active);
		Ok(personnel)
	}

	/// Resolves an id to an active delivery person.
	pub(crate) async fn active_courier(&self, id: &str) -> Result<User, LifecycleError> {
		let user = self.get(id).await?;
		if user.role != Role::Delivery {
			return Err(LifecycleError::Validation(format!(
				"user {} is not a delivery person",
				id
			)));
		}
		if !user.is_active {
			return Err(LifecycleError::Validation(format!(
				"delivery person {} is inactive",
				id
			)));
		}
		Ok(user)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use dairy_storage::implementations::memory::MemoryStorage;

	fn directory() -> UserDirectory {
		UserDirectory::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))))
	}

	#[tokio::test]
	async fn test_register_and_get() {
		let users = directory();
		let user = users
			.register(NewUser::new("  milkman ", Role::Delivery))
			.await
			.unwrap();
		assert_eq!(user.username, "milkman");
		assert!(user.is_active);
		assert_eq!(users.get(&user.id).await.unwrap(), user);
	}

	#[tokio::test]
	async fn test_duplicate_username_rejected_case_insensitively() {
		let users = directory();
		users
			.register(NewUser::new("Alice", Role::Customer))
			.await
			.unwrap();
		let err = users
			.register(NewUser::new("alice", Role::Delivery))
			.await
			.unwrap_err();
		assert!(matches!(err, LifecycleError::Validation(_)));
	}

	#[tokio::test]
	async fn test_blank_username_rejected() {
		let users = directory();
		let err = users
			.register(NewUser::new("   ", Role::Customer))
			.await
			.unwrap_err();
		assert!(matches!(err, LifecycleError::Validation(_)));
	}

	#[tokio::test]
	async fn test_roster_projection() {
		let users = directory();
		let d1 = users
			.register(NewUser::new("d1", Role::Delivery))
			.await
			.unwrap();
		let d2 = users
			.register(NewUser::new("d2", Role::Delivery))
			.await
			.unwrap();
		users
			.register(NewUser::new("c1", Role::Customer))
			.await
			.unwrap();

		users.set_active(&d2.id, false).await.unwrap();

		assert_eq!(users.personnel().await.unwrap().len(), 2);
		let available = users.available().await.unwrap();
		assert_eq!(available.len(), 1);
		assert_eq!(available[0].id, d1.id);
		assert_eq!(users.list(None).await.unwrap().len(), 3);
	}

	#[tokio::test]
	async fn test_active_courier_checks() {
		let users = directory();
		let customer = users
			.register(NewUser::new("c1", Role::Customer))
			.await
			.unwrap();
		let rider = users
			.register(NewUser::new("d1", Role::Delivery))
			.await
			.unwrap();

		assert!(matches!(
			users.active_courier(&customer.id).await,
			Err(LifecycleError::Validation(_))
		));
		assert!(matches!(
			users.active_courier("ghost").await,
			Err(LifecycleError::NotFound { .. })
		));
		assert!(users.active_courier(&rider.id).await.is_ok());
	}

	#[tokio::test]
	async fn test_seed_is_idempotent() {
		let users = directory();
		let first = users
			.seed("admin-1", NewUser::new("admin", Role::Admin))
			.await
			.unwrap();
		let second = users
			.seed("admin-1", NewUser::new("admin", Role::Admin))
			.await
			.unwrap();
		assert_eq!(first, second);
		assert_eq!(users.list(Some(Role::Admin)).await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_update_profile_and_role() {
		let users = directory();
		let user = users
			.register(NewUser::new("carol", Role::Customer))
			.await
			.unwrap();

		let updated = users
			.update(
				&user.id,
				UserPatch {
					role: Some(Role::Delivery),
					phone: Some("555-0101".into()),
					address: Some("3 Creamery Row".into()),
					..UserPatch::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(updated.username, "carol");
		assert_eq!(updated.role, Role::Delivery);
		assert_eq!(updated.phone.as_deref(), Some("555-0101"));
		assert_eq!(users.get(&user.id).await.unwrap(), updated);
		assert!(users.active_courier(&user.id).await.is_ok());

		let updated = users
			.update(
				&user.id,
				UserPatch {
					is_active: Some(false),
					..UserPatch::default()
				},
			)
			.await
			.unwrap();
		assert!(!updated.is_active);
		assert!(users.available().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_rename_moves_username_index() {
		let users = directory();
		let carol = users
			.register(NewUser::new("carol", Role::Customer))
			.await
			.unwrap();
		users
			.register(NewUser::new("otto", Role::Customer))
			.await
			.unwrap();

		let err = users
			.update(
				&carol.id,
				UserPatch {
					username: Some("OTTO".into()),
					..UserPatch::default()
				},
			)
			.await
			.unwrap_err();
		assert!(matches!(err, LifecycleError::Validation(_)));
		assert_eq!(users.get(&carol.id).await.unwrap().username, "carol");

		let renamed = users
			.update(
				&carol.id,
				UserPatch {
					username: Some(" caroline ".into()),
					..UserPatch::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(renamed.username, "caroline");

		// The old name is free again, the new one is taken.
		assert!(users
			.register(NewUser::new("Carol", Role::Customer))
			.await
			.is_ok());
		assert!(matches!(
			users.register(NewUser::new("CAROLINE", Role::Customer)).await,
			Err(LifecycleError::Validation(_))
		));

		let recased = users
			.update(
				&carol.id,
				UserPatch {
					username: Some("Caroline".into()),
					..UserPatch::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(recased.username, "Caroline");
		assert!(matches!(
			users.register(NewUser::new("caroline", Role::Customer)).await,
			Err(LifecycleError::Validation(_))
		));
	}

	#[tokio::test]
	async fn test_update_rejects_blank_name_and_unknown_user() {
		let users = directory();
		let user = users
			.register(NewUser::new("carol", Role::Customer))
			.await
			.unwrap();
		let blank = UserPatch {
			username: Some("  ".into()),
			..UserPatch::default()
		};
		assert!(matches!(
			users.update(&user.id, blank).await,
			Err(LifecycleError::Validation(_))
		));
		assert!(matches!(
			users.update("ghost", UserPatch::default()).await,
			Err(LifecycleError::NotFound { .. })
		));
	}

	#[tokio::test]
	async fn test_delete_frees_username() {
		let users = directory();
		let rider = users
			.register(NewUser::new("dora", Role::Delivery))
			.await
			.unwrap();

		users.delete(&rider.id).await.unwrap();
		assert!(matches!(
			users.get(&rider.id).await,
			Err(LifecycleError::NotFound { .. })
		));
		assert!(users.personnel().await.unwrap().is_empty());
		assert!(matches!(
			users.delete(&rider.id).await,
			Err(LifecycleError::NotFound { .. })
		));

		let again = users
			.register(NewUser::new("Dora", Role::Delivery))
			.await
			.unwrap();
		assert_ne!(again.id, rider.id);
	}

	#[tokio::test]
	async fn test_set_active_unknown_user() {
		let users = directory();
		assert!(matches!(
			users.set_active("nobody", true).await,
			Err(LifecycleError::NotFound { .. })
		));
	}
}
