//! Admin flows: dashboard counts, user and store listings, user editing.

use thiserror::Error;

use store_ratings_core::{
    Role, SortOrder, UserId, ValidationError, filter_by_search_term, in_rating_band, sort_by_key,
    validate_address, validate_email, validate_name, validate_new_password,
};

use crate::db::{DocumentStore, RepositoryError};
use crate::identity::{IdentityError, IdentityProvider};
use crate::models::{NewStore, Store, User, UserUpdate};
use crate::services::ratings::{RatingService, StoreSummary};

/// Errors from admin flows.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("identity provider: {0}")]
    Identity(#[from] IdentityError),

    #[error("document store: {0}")]
    Repository(#[from] RepositoryError),
}

impl AdminError {
    /// Stable code for `?error=` query strings.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::Identity(e) => e.code(),
            Self::Repository(RepositoryError::NotFound) => "user-not-found",
            Self::Repository(_) => "internal",
        }
    }
}

/// Collection sizes for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardCounts {
    pub users: i64,
    pub stores: i64,
    pub ratings: i64,
}

impl DashboardCounts {
    /// Ratings per store to one decimal, 0 without stores.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratings_per_store(&self) -> f64 {
        if self.stores == 0 {
            return 0.0;
        }
        (self.ratings as f64 / self.stores as f64 * 10.0).round() / 10.0
    }
}

/// Admin user form input. `password` fields are only read on create.
#[derive(Debug, Clone)]
pub struct UserForm<'f> {
    pub name: &'f str,
    pub email: &'f str,
    pub address: &'f str,
    pub password: &'f str,
    pub confirm_password: &'f str,
    pub role: Role,
    pub store_name: Option<&'f str>,
}

impl<'f> UserForm<'f> {
    /// Trimmed store name when one was entered for a store owner.
    fn store_name(&self) -> Option<&'f str> {
        if self.role != Role::StoreOwner {
            return None;
        }
        self.store_name.map(str::trim).filter(|s| !s.is_empty())
    }
}

/// What a user form submission did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSaved {
    UserCreated,
    StoreOwnerAndStoreCreated,
    UserUpdated,
}

impl UserSaved {
    /// Stable code for `?success=` query strings.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UserCreated => "user-created",
            Self::StoreOwnerAndStoreCreated => "store-owner-created",
            Self::UserUpdated => "user-updated",
        }
    }
}

/// Sortable columns of the user list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortField {
    #[default]
    Name,
    Email,
    Address,
    Role,
}

impl UserSortField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Address => "address",
            Self::Role => "role",
        }
    }
}

impl std::str::FromStr for UserSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "address" => Ok(Self::Address),
            "role" => Ok(Self::Role),
            _ => Err(format!("invalid user sort field: {s}")),
        }
    }
}

/// Sortable columns of the admin store list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreSortField {
    #[default]
    Name,
    Email,
    Address,
    Rating,
}

impl StoreSortField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Address => "address",
            Self::Rating => "rating",
        }
    }
}

impl std::str::FromStr for StoreSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "address" => Ok(Self::Address),
            "rating" => Ok(Self::Rating),
            _ => Err(format!("invalid store sort field: {s}")),
        }
    }
}

/// User list filters.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: String,
    pub role: Option<Role>,
    pub sort: UserSortField,
    pub order: SortOrder,
}

/// Store list filters. `band` keeps averages in `[band, band + 1)`.
#[derive(Debug, Clone, Default)]
pub struct StoreFilter {
    pub search: String,
    pub band: Option<u8>,
    pub sort: StoreSortField,
    pub order: SortOrder,
}

/// Number of profiles per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCounts {
    pub admins: usize,
    pub store_owners: usize,
    pub users: usize,
}

/// A filtered user list.
#[derive(Debug, Clone)]
pub struct UserListing {
    pub users: Vec<User>,
    pub total: usize,
    pub role_counts: RoleCounts,
}

/// A filtered store list.
#[derive(Debug, Clone)]
pub struct StoreListing {
    pub stores: Vec<StoreSummary>,
    pub total: usize,
}

/// Admin operations over the identity provider and the document store.
pub struct AdminService<'a> {
    identity: &'a dyn IdentityProvider,
    store: &'a dyn DocumentStore,
}

impl<'a> AdminService<'a> {
    #[must_use]
    pub const fn new(identity: &'a dyn IdentityProvider, store: &'a dyn DocumentStore) -> Self {
        Self { identity, store }
    }

    /// Sizes of the three collections.
    ///
    /// # Errors
    ///
    /// Returns an error if any count fails.
    pub async fn dashboard(&self) -> Result<DashboardCounts, RepositoryError> {
        Ok(DashboardCounts {
            users: self.store.count_users().await?,
            stores: self.store.count_stores().await?,
            ratings: self.store.count_ratings().await?,
        })
    }

    /// Filter, search, and sort all profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the profiles cannot be loaded.
    pub async fn list_users(&self, filter: &UserFilter) -> Result<UserListing, RepositoryError> {
        let all = self.store.list_users().await?;
        let total = all.len();

        let mut role_counts = RoleCounts::default();
        for user in &all {
            match user.role {
                Role::Admin => role_counts.admins += 1,
                Role::StoreOwner => role_counts.store_owners += 1,
                Role::User => role_counts.users += 1,
            }
        }

        let by_role: Vec<User> = match filter.role {
            Some(role) => all.into_iter().filter(|u| u.role == role).collect(),
            None => all,
        };
        let found = filter_by_search_term(by_role, &filter.search, |u| {
            [u.name.as_str(), u.email.as_str(), u.address.as_str()]
        });
        let users = match filter.sort {
            UserSortField::Name => sort_by_key(found, |u| u.name.to_lowercase(), filter.order),
            UserSortField::Email => sort_by_key(found, |u| u.email.normalized(), filter.order),
            UserSortField::Address => {
                sort_by_key(found, |u| u.address.to_lowercase(), filter.order)
            }
            UserSortField::Role => sort_by_key(found, |u| u.role.as_str(), filter.order),
        };

        Ok(UserListing {
            users,
            total,
            role_counts,
        })
    }

    /// Filter, search, and sort all stores with their averages.
    ///
    /// # Errors
    ///
    /// Returns an error if stores or ratings cannot be loaded.
    pub async fn list_stores(&self, filter: &StoreFilter) -> Result<StoreListing, RepositoryError> {
        let all = RatingService::new(self.store).store_summaries().await?;
        let total = all.len();

        let banded: Vec<StoreSummary> = match filter.band {
            Some(band) => all
                .into_iter()
                .filter(|s| in_rating_band(s.average, band))
                .collect(),
            None => all,
        };
        let found = filter_by_search_term(banded, &filter.search, |s| {
            [
                s.store.name.as_str(),
                s.store.email.as_str(),
                s.store.address.as_str(),
            ]
        });
        let stores = match filter.sort {
            StoreSortField::Name => {
                sort_by_key(found, |s| s.store.name.to_lowercase(), filter.order)
            }
            StoreSortField::Email => {
                sort_by_key(found, |s| s.store.email.normalized(), filter.order)
            }
            StoreSortField::Address => {
                sort_by_key(found, |s| s.store.address.to_lowercase(), filter.order)
            }
            StoreSortField::Rating => sort_by_key(found, |s| s.average, filter.order),
        };

        Ok(StoreListing { stores, total })
    }

    /// Profile for the edit form.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be loaded.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.store.get_user(id).await
    }

    /// Create an identity and profile, then a store for a new store owner.
    ///
    /// The two steps are not atomic. When the store insert fails the new
    /// account stays as a store owner without a store.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, or the provider/store error.
    pub async fn create_user(&self, form: &UserForm<'_>) -> Result<UserSaved, AdminError> {
        let name = form.name.trim();
        let address = form.address.trim();
        validate_name(name)?;
        let email = validate_email(form.email.trim())?;
        validate_address(address)?;
        validate_new_password(form.password, form.confirm_password)?;
        let store_name = form.store_name();
        if let Some(store_name) = store_name {
            validate_name(store_name)?;
        }

        let identity = self.identity.create_account(&email, form.password).await?;
        let profile = User {
            id: identity.uid,
            name: name.to_string(),
            email: identity.email.clone(),
            address: address.to_string(),
            role: form.role,
            created_at: chrono::Utc::now(),
        };
        if let Err(e) = self.store.put_user(&profile).await {
            tracing::warn!(
                uid = %identity.uid,
                error = %e,
                "Identity created but profile write failed"
            );
            return Err(e.into());
        }
        tracing::info!(uid = %profile.id, role = %profile.role, "User created by admin");

        let Some(store_name) = store_name else {
            return Ok(UserSaved::UserCreated);
        };
        self.create_owned_store(&profile, store_name, address)
            .await?;
        Ok(UserSaved::StoreOwnerAndStoreCreated)
    }

    /// Update name, address, and role, then create a store when a store
    /// owner was given a store name.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, `NotFound` for an unknown user,
    /// or the store error.
    pub async fn update_user(
        &self,
        id: UserId,
        form: &UserForm<'_>,
    ) -> Result<UserSaved, AdminError> {
        let name = form.name.trim();
        let address = form.address.trim();
        validate_name(name)?;
        validate_address(address)?;
        let store_name = form.store_name();
        if let Some(store_name) = store_name {
            validate_name(store_name)?;
        }

        let profile = self
            .store
            .update_user(
                id,
                &UserUpdate {
                    name: name.to_string(),
                    address: address.to_string(),
                    role: form.role,
                },
            )
            .await?;
        tracing::info!(uid = %id, role = %profile.role, "User updated by admin");

        if let Some(store_name) = store_name {
            self.create_owned_store(&profile, store_name, address)
                .await?;
        }
        Ok(UserSaved::UserUpdated)
    }

    /// Create an admin account unless an identity already uses its email.
    ///
    /// Returns `true` when the account was created.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, or the provider/store error.
    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        address: &str,
        password: &str,
    ) -> Result<bool, AdminError> {
        let parsed = validate_email(email.trim())?;
        if let Some(existing) = self.identity.find_by_email(&parsed).await? {
            tracing::debug!(uid = %existing.uid, "Admin account already exists");
            return Ok(false);
        }

        self.create_user(&UserForm {
            name,
            email,
            address,
            password,
            confirm_password: password,
            role: Role::Admin,
            store_name: None,
        })
        .await?;
        Ok(true)
    }

    async fn create_owned_store(
        &self,
        owner: &User,
        store_name: &str,
        address: &str,
    ) -> Result<Store, AdminError> {
        let result = self
            .store
            .insert_store(&NewStore {
                name: store_name.to_string(),
                email: owner.email.clone(),
                address: address.to_string(),
                owner_id: Some(owner.id),
            })
            .await;

        match result {
            Ok(store) => {
                tracing::info!(store_id = %store.id, owner_id = %owner.id, "Store created");
                Ok(store)
            }
            Err(e) => {
                tracing::warn!(
                    owner_id = %owner.id,
                    error = %e,
                    "Store owner saved without a store"
                );
                Err(e.into())
            }
        }
    }
}
