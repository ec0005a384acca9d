use std::{mem, sync::Arc};

use serde_json::Value;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument};

use super::dispatch::Command;
use super::domain::{CreateUserInput, EditUserInput, LoginInput, LoginOutcome, StoredEntry, UserRecord, DEFAULT_ROLE};
use super::password::{hash_password, verify_password};
use super::validation::{check_new_password, normalize_email, validate_new_user, validate_profile};
use crate::errors::DirectoryError;
use crate::storage::UserStore;

/// Directory service configuration
#[derive(Clone, Debug)]
pub struct DirectoryConfig {
    /// Serialize read-modify-write cycles on the store's shared write lock.
    pub serialize_writes: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self { Self { serialize_writes: true } }
}

/// Outcome of a dispatched command: HTTP status plus the `data` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub data: Value,
}

/// User directory business service independent of web framework.
///
/// Holds no records itself: each operation loads the collection from the
/// store, and each mutation writes the complete collection back. Stored
/// elements that are not user objects keep their position and content.
pub struct DirectoryService {
    store: Arc<dyn UserStore>,
    serialize_writes: bool,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn UserStore>, cfg: DirectoryConfig) -> Self {
        Self { store, serialize_writes: cfg.serialize_writes }
    }

    /// Held for the whole load-mutate-save cycle; dropped on every return path.
    async fn write_guard(&self) -> Option<OwnedMutexGuard<()>> {
        if !self.serialize_writes {
            return None;
        }
        Some(self.store.write_lock().lock_owned().await)
    }

    /// Run a resolved command and wrap its result with the success status.
    pub async fn execute(&self, cmd: Command) -> Result<Reply, DirectoryError> {
        let reply = match cmd {
            Command::List => Reply { status: 200, data: serde_json::to_value(self.list().await?)? },
            Command::Login(input) => Reply { status: 200, data: serde_json::to_value(self.login(input).await?)? },
            Command::Create(input) => Reply { status: 201, data: serde_json::to_value(self.create(input).await?)? },
            Command::Edit(input) => Reply { status: 200, data: serde_json::to_value(self.edit(input).await?)? },
            Command::Delete { index } => Reply { status: 200, data: serde_json::to_value(self.delete(index).await?)? },
        };
        Ok(reply)
    }

    /// Current collection, unchanged.
    pub async fn list(&self) -> Result<Vec<StoredEntry>, DirectoryError> {
        self.store.load().await
    }

    /// Check credentials and report the user's role.
    ///
    /// # Examples
    /// ```
    /// use service::directory::{service::{DirectoryService, DirectoryConfig}, domain::{CreateUserInput, LoginInput}};
    /// use service::storage::mock::MemoryUserStore;
    /// use std::sync::Arc;
    /// let svc = DirectoryService::new(Arc::new(MemoryUserStore::default()), DirectoryConfig::default());
    /// let input = CreateUserInput { name: "Ana".into(), email: "Ana@X.com".into(), password: "secret12".into(), role: "admin".into() };
    /// tokio_test::block_on(svc.create(input)).unwrap();
    /// let outcome = tokio_test::block_on(svc.login(LoginInput { email: "ana@x.com".into(), password: "secret12".into() })).unwrap();
    /// assert_eq!(outcome.role, "admin");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email.trim()))]
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutcome, DirectoryError> {
        let email = input.email.trim();
        if email.is_empty() || input.password.is_empty() {
            return Err(DirectoryError::validation("email and password are required"));
        }
        let wanted = email.to_lowercase();
        let entries = self.store.load().await?;
        let user = entries
            .iter()
            .filter_map(StoredEntry::user)
            .find(|r| r.has_email(&wanted))
            .ok_or_else(|| DirectoryError::Unauthorized("user not found".into()))?;

        if !verify_password(&input.password, &user.password_hash) {
            debug!("password mismatch");
            return Err(DirectoryError::Unauthorized("invalid credentials".into()));
        }

        let role = if user.role.is_empty() { DEFAULT_ROLE.to_string() } else { user.role.clone() };
        info!(role = %role, "user_logged_in");
        Ok(LoginOutcome { role })
    }

    /// Append a new user and return the updated collection.
    ///
    /// # Examples
    /// ```
    /// use service::directory::{service::{DirectoryService, DirectoryConfig}, domain::CreateUserInput};
    /// use service::storage::mock::MemoryUserStore;
    /// use std::sync::Arc;
    /// let svc = DirectoryService::new(Arc::new(MemoryUserStore::default()), DirectoryConfig::default());
    /// let input = CreateUserInput { name: " Ana ".into(), email: "Ana@X.com".into(), password: "secret12".into(), role: "usuario".into() };
    /// let users = tokio_test::block_on(svc.create(input)).unwrap();
    /// let ana = users[0].user().unwrap();
    /// assert_eq!(ana.email, "ana@x.com");
    /// assert_eq!(ana.name, "Ana");
    /// assert_ne!(ana.password_hash, "secret12");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email.trim()))]
    pub async fn create(&self, input: CreateUserInput) -> Result<Vec<StoredEntry>, DirectoryError> {
        let _guard = self.write_guard().await;

        let name = input.name.trim();
        let email = input.email.trim();
        let password = input.password.trim();
        let role = input.role.trim();
        validate_new_user(name, email, password, role)?;
        let normalized = normalize_email(email);

        let mut entries = self.store.load().await?;
        if entries.iter().filter_map(StoredEntry::user).any(|r| r.has_email(&normalized)) {
            return Err(DirectoryError::Conflict("a user with that email already exists".into()));
        }

        let password_hash = hash_password(password)?;
        entries.push(UserRecord::new(name, normalized, password_hash, role).into());
        self.store.save_all(&entries).await?;
        info!(index = entries.len() - 1, total = entries.len(), "user_created");
        Ok(entries)
    }

    /// Overwrite the record at `input.index` and return the updated collection.
    ///
    /// A missing or blank password keeps the stored hash, and keys the record
    /// carries beyond the four known fields are kept. A non-user element at
    /// `index` is replaced by a record built from the input.
    #[instrument(skip(self, input), fields(index = ?input.index))]
    pub async fn edit(&self, input: EditUserInput) -> Result<Vec<StoredEntry>, DirectoryError> {
        let _guard = self.write_guard().await;

        let index = input
            .index
            .ok_or_else(|| DirectoryError::validation("the \"index\" parameter is required to edit"))?;
        let mut entries = self.store.load().await?;
        if index >= entries.len() {
            return Err(DirectoryError::index_not_found());
        }

        let name = input.name.trim();
        let email = input.email.trim();
        validate_profile(name, email)?;
        let normalized = normalize_email(email);

        let taken = entries
            .iter()
            .enumerate()
            .any(|(i, e)| i != index && e.user().is_some_and(|r| r.has_email(&normalized)));
        if taken {
            return Err(DirectoryError::Conflict("another user already has that email".into()));
        }

        let new_hash = match input.password.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(plain) => {
                check_new_password(plain)?;
                Some(hash_password(plain)?)
            }
            None => None,
        };

        let Some(slot) = entries.get_mut(index) else {
            return Err(DirectoryError::index_not_found());
        };
        let mut record = match mem::replace(slot, StoredEntry::Unrecognised(Value::Null)) {
            StoredEntry::User(record) => record,
            StoredEntry::Unrecognised(_) => UserRecord::default(),
        };
        record.name = name.to_string();
        record.email = normalized;
        record.role = input.role.trim().to_string();
        let password_changed = new_hash.is_some();
        if let Some(hash) = new_hash {
            record.password_hash = hash;
        }
        *slot = record.into();

        self.store.save_all(&entries).await?;
        info!(index, password_changed, "user_updated");
        Ok(entries)
    }

    /// Remove the record at `index`; later records shift down by one.
    #[instrument(skip(self))]
    pub async fn delete(&self, index: Option<usize>) -> Result<Vec<StoredEntry>, DirectoryError> {
        let _guard = self.write_guard().await;

        let index = index.ok_or_else(|| DirectoryError::validation("the \"index\" parameter is required to delete"))?;
        let mut entries = self.store.load().await?;
        if index >= entries.len() {
            return Err(DirectoryError::index_not_found());
        }
        let removed = entries.remove(index);
        self.store.save_all(&entries).await?;
        let email = removed.user().map(|u| u.email.as_str()).unwrap_or_default();
        info!(index, email, remaining = entries.len(), "user_deleted");
        Ok(entries)
    }
}
