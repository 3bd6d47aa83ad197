//! Identity service - user lookup, registration and credential flows.
//!
//! Lookups never fail for a missing or inactive user; they return `Ok(None)`
//! so callers can branch on presence. Only storage failures are errors.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use once_cell::sync::Lazy;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult, CredentialConfig, OptionExt};
use domain::validation::{self, Uniqueness, FIELD_ROLE_ID, FIELD_STATUS_ID, FIELD_USER_TYPE_ID};
use domain::{
    to_lookup_list, token, LookupKind, LookupList, NewUser, Password, UpdateUser, User,
    UserOverview, UserResponse, ValidationErrors, STATUS_ACTIVE,
};

use crate::repository::{LookupRepository, ProfileRepository, StatusFilter, UserRepository};

/// Verified against when the username is unknown, so a failed login costs
/// the same whether or not the account exists.
static DUMMY_PASSWORD: Lazy<Password> = Lazy::new(|| {
    Password::new(&token::random_string(24)).unwrap_or_else(|_| Password::from_hash(""))
});

const ACTIVE_ONLY: StatusFilter = StatusFilter::Only(STATUS_ACTIVE);

/// Identity service trait for dependency injection.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Active user by primary key
    async fn find_identity(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Active user whose remember-me key equals `token`
    async fn find_identity_by_access_token(&self, token: &str) -> AppResult<Option<User>>;

    /// Active user by exact username
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Active user holding `token`, if the token has not expired under the
    /// configured lifetime
    async fn find_by_password_reset_token(&self, token: &str) -> AppResult<Option<User>>;

    /// Like [`IdentityService::find_by_password_reset_token`] with an
    /// explicit lifetime and clock (unix seconds)
    async fn find_by_password_reset_token_at(
        &self,
        token: &str,
        expire_seconds: i64,
        now: i64,
    ) -> AppResult<Option<User>>;

    /// Validate and store a new user with a hashed password and a fresh auth key
    async fn register(&self, input: NewUser) -> AppResult<User>;

    /// Apply and validate changes to any user, guarded against concurrent edits
    async fn update_user(&self, id: Uuid, changes: UpdateUser) -> AppResult<User>;

    /// Check a username/password pair against an active user
    async fn login(&self, username: &str, password: &str) -> AppResult<User>;

    /// Replace a user's password
    async fn change_password(&self, id: Uuid, password: &str) -> AppResult<User>;

    /// Rotate an active user's remember-me key, invalidating the old one
    async fn regenerate_auth_key(&self, id: Uuid) -> AppResult<String>;

    /// Issue (or reuse a still valid) reset token for the active user with
    /// this email. `None` when there is no such user.
    async fn request_password_reset(&self, email: &str) -> AppResult<Option<String>>;

    /// Set a new password using a reset token, then discard the token
    async fn reset_password(&self, token: &str, password: &str) -> AppResult<User>;

    /// Value → name list of one lookup table
    async fn lookup_list(&self, kind: LookupKind) -> AppResult<LookupList>;

    /// User with related lookup names and profile id resolved
    async fn overview(&self, id: Uuid) -> AppResult<Option<UserOverview>>;

    async fn role_list(&self) -> AppResult<LookupList> {
        self.lookup_list(LookupKind::Role).await
    }

    async fn status_list(&self) -> AppResult<LookupList> {
        self.lookup_list(LookupKind::Status).await
    }

    async fn user_type_list(&self) -> AppResult<LookupList> {
        self.lookup_list(LookupKind::UserType).await
    }
}

/// Concrete implementation of IdentityService using repositories.
pub struct IdentityManager {
    users: Arc<dyn UserRepository>,
    lookups: Arc<dyn LookupRepository>,
    profiles: Arc<dyn ProfileRepository>,
    credentials: CredentialConfig,
}

impl IdentityManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        lookups: Arc<dyn LookupRepository>,
        profiles: Arc<dyn ProfileRepository>,
        credentials: CredentialConfig,
    ) -> Self {
        Self {
            users,
            lookups,
            profiles,
            credentials,
        }
    }

    fn password_errors(&self, password: &str) -> ValidationErrors {
        validation::validate_password_policy(password, self.credentials.min_password_length)
    }

    fn check_password_policy(&self, password: &str) -> AppResult<()> {
        self.password_errors(password)
            .into_result()
            .map_err(AppError::from)
    }

    /// Hash `password` under the configured policy.
    fn apply_password(&self, user: &mut User, password: &str) -> AppResult<()> {
        user.set_password(password, self.credentials.min_password_length)?;
        Ok(())
    }

    /// Run every rule for `user`: lookup ranges first, then the username and
    /// email rules with uniqueness looked up for non-blank values, then the
    /// password policy when a new password is given.
    async fn validate(
        &self,
        user: &mut User,
        excluding: Option<Uuid>,
        password: Option<&str>,
    ) -> AppResult<()> {
        let mut errors = ValidationErrors::new();

        for (field, kind, value) in [
            (FIELD_STATUS_ID, LookupKind::Status, user.status_id),
            (FIELD_ROLE_ID, LookupKind::Role, user.role_id),
            (FIELD_USER_TYPE_ID, LookupKind::UserType, user.user_type_id),
        ] {
            let allowed = self.lookups.list(kind).await?;
            if let Err(e) = validation::in_range(field, value, allowed.iter().map(|e| e.value)) {
                errors.add(e);
            }
        }

        validation::normalize_user_fields(user);
        let uniqueness = Uniqueness {
            username_taken: !user.username.is_empty()
                && self.users.exists_with_username(&user.username, excluding).await?,
            email_taken: !user.email.is_empty()
                && self.users.exists_with_email(&user.email, excluding).await?,
        };

        errors.merge(validation::validate_user_fields_with(user, uniqueness));
        if let Some(password) = password {
            errors.merge(self.password_errors(password));
        }

        errors.into_result().map_err(AppError::from)
    }

    /// Stamp `updated_at` and write the user, expecting the stored row to
    /// still carry `expected`.
    async fn persist(&self, mut user: User, expected: DateTime<Utc>) -> AppResult<User> {
        user.touch(next_version(expected));
        self.users.update(&user, expected).await
    }
}

/// Current time at storage precision (microseconds).
fn db_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A version strictly newer than `previous`.
fn next_version(previous: DateTime<Utc>) -> DateTime<Utc> {
    db_now().max(previous + Duration::microseconds(1))
}

#[async_trait]
impl IdentityService for IdentityManager {
    async fn find_identity(&self, id: Uuid) -> AppResult<Option<User>> {
        self.users.find_by_id(id, ACTIVE_ONLY).await
    }

    async fn find_identity_by_access_token(&self, token: &str) -> AppResult<Option<User>> {
        if token.is_empty() {
            return Ok(None);
        }
        self.users.find_by_auth_key(token, ACTIVE_ONLY).await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.users.find_by_username(username, ACTIVE_ONLY).await
    }

    async fn find_by_password_reset_token(&self, token: &str) -> AppResult<Option<User>> {
        self.find_by_password_reset_token_at(
            token,
            self.credentials.password_reset_token_expire_seconds,
            Utc::now().timestamp(),
        )
        .await
    }

    async fn find_by_password_reset_token_at(
        &self,
        token: &str,
        expire_seconds: i64,
        now: i64,
    ) -> AppResult<Option<User>> {
        if !token::is_password_reset_token_valid(token, expire_seconds, now) {
            tracing::warn!("Password reset token is malformed or expired");
            return Ok(None);
        }
        self.users
            .find_by_password_reset_token(token, ACTIVE_ONLY)
            .await
    }

    async fn register(&self, input: NewUser) -> AppResult<User> {
        let mut user = User::new(Uuid::new_v4(), input.username, input.email, db_now());
        if let Some(status_id) = input.status_id {
            user.status_id = status_id;
        }
        if let Some(role_id) = input.role_id {
            user.role_id = role_id;
        }
        if let Some(user_type_id) = input.user_type_id {
            user.user_type_id = user_type_id;
        }

        self.validate(&mut user, None, Some(&input.password)).await?;

        self.apply_password(&mut user, &input.password)?;
        user.generate_auth_key();

        let user = self.users.insert(&user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UpdateUser) -> AppResult<User> {
        let mut user = self
            .users
            .find_by_id(id, StatusFilter::Any)
            .await?
            .ok_or_not_found()?;
        let expected = user.updated_at;

        changes.apply_to(&mut user);
        self.validate(&mut user, Some(id), None).await?;

        self.persist(user, expected).await
    }

    async fn login(&self, username: &str, password: &str) -> AppResult<User> {
        let username = username.trim();
        let found = self.find_by_username(username).await?;

        let user = match found {
            Some(user) if user.validate_password(password) => user,
            Some(_) => {
                tracing::warn!(username = %username, "Login failed: wrong password");
                return Err(AppError::InvalidCredentials);
            }
            None => {
                let _ = DUMMY_PASSWORD.verify(password);
                tracing::warn!(username = %username, "Login failed: unknown or inactive user");
                return Err(AppError::InvalidCredentials);
            }
        };

        if user.auth_key.is_some() {
            return Ok(user);
        }

        let expected = user.updated_at;
        let mut user = user;
        user.generate_auth_key();

        match self.persist(user, expected).await {
            // A concurrent login stored a key first; use that one
            Err(AppError::Conflict(msg)) => match self.find_by_username(username).await? {
                Some(current) if current.auth_key.is_some() => Ok(current),
                _ => Err(AppError::Conflict(msg)),
            },
            result => result,
        }
    }

    async fn change_password(&self, id: Uuid, password: &str) -> AppResult<User> {
        self.check_password_policy(password)?;

        let mut user = self
            .users
            .find_by_id(id, StatusFilter::Any)
            .await?
            .ok_or_not_found()?;
        let expected = user.updated_at;

        self.apply_password(&mut user, password)?;
        let user = self.persist(user, expected).await?;
        tracing::info!(user_id = %user.id, "Password changed");
        Ok(user)
    }

    async fn regenerate_auth_key(&self, id: Uuid) -> AppResult<String> {
        let mut user = self.find_identity(id).await?.ok_or_not_found()?;
        let expected = user.updated_at;

        user.generate_auth_key();
        let user = self.persist(user, expected).await?;

        user.auth_key
            .ok_or_else(|| AppError::internal("Auth key missing after generation"))
    }

    async fn request_password_reset(&self, email: &str) -> AppResult<Option<String>> {
        let Some(mut user) = self.users.find_by_email(email.trim(), ACTIVE_ONLY).await? else {
            tracing::debug!("Password reset requested for unknown or inactive email");
            return Ok(None);
        };

        let now = Utc::now().timestamp();
        let expire = self.credentials.password_reset_token_expire_seconds;
        if let Some(existing) = user.password_reset_token.as_deref() {
            if token::is_password_reset_token_valid(existing, expire, now) {
                return Ok(Some(existing.to_string()));
            }
        }

        let expected = user.updated_at;
        user.generate_password_reset_token_at(now);
        let user = self.persist(user, expected).await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");
        Ok(user.password_reset_token)
    }

    async fn reset_password(&self, token: &str, password: &str) -> AppResult<User> {
        if token.trim().is_empty() {
            return Err(AppError::bad_request("Password reset token cannot be blank."));
        }
        self.check_password_policy(password)?;

        let mut user = self
            .find_by_password_reset_token(token)
            .await?
            .ok_or_else(|| AppError::bad_request("Wrong password reset token."))?;
        let expected = user.updated_at;

        self.apply_password(&mut user, password)?;
        user.remove_password_reset_token();

        let user = self.persist(user, expected).await?;
        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(user)
    }

    async fn lookup_list(&self, kind: LookupKind) -> AppResult<LookupList> {
        Ok(to_lookup_list(self.lookups.list(kind).await?))
    }

    async fn overview(&self, id: Uuid) -> AppResult<Option<UserOverview>> {
        let Some(user) = self.users.find_by_id(id, StatusFilter::Any).await? else {
            return Ok(None);
        };

        let role = self.lookups.find_by_value(LookupKind::Role, user.role_id).await?;
        let status = self
            .lookups
            .find_by_value(LookupKind::Status, user.status_id)
            .await?;
        let user_type = self
            .lookups
            .find_by_value(LookupKind::UserType, user.user_type_id)
            .await?;
        let profile = self.profiles.find_by_user_id(user.id).await?;

        Ok(Some(UserOverview {
            user: UserResponse::from(&user),
            role_name: role.map(|r| r.name),
            status_name: status.map(|s| s.name),
            user_type_pk: user_type.as_ref().map(|t| t.id),
            user_type_name: user_type.map(|t| t.name),
            profile_id: profile.map(|p| p.id),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use mockall::predicate::eq;

    use domain::validation::{FIELD_EMAIL, FIELD_PASSWORD, FIELD_USERNAME};
    use domain::{Identity, LookupEntry, Profile, MIN_PASSWORD_LENGTH, ROLE_NOT_FOUND_LABEL};

    use crate::repository::{MockLookupRepository, MockProfileRepository, MockUserRepository};

    const EXPIRE: i64 = 3600;

    fn entry(id: i32, value: i32, name: &str) -> LookupEntry {
        LookupEntry {
            id,
            value,
            name: name.to_string(),
        }
    }

    fn lookups_with_seed_data() -> MockLookupRepository {
        let mut lookups = MockLookupRepository::new();
        lookups.expect_list().returning(|kind| {
            Ok(match kind {
                LookupKind::Status => vec![entry(1, 10, "Active"), entry(2, 0, "Banned")],
                LookupKind::Role => vec![entry(1, 10, "User"), entry(2, 20, "Admin")],
                LookupKind::UserType => vec![entry(1, 10, "Free"), entry(2, 30, "Paid")],
            })
        });
        lookups
    }

    fn manager(users: MockUserRepository, lookups: MockLookupRepository) -> IdentityManager {
        manager_with(users, lookups, CredentialConfig::default())
    }

    fn manager_with(
        users: MockUserRepository,
        lookups: MockLookupRepository,
        credentials: CredentialConfig,
    ) -> IdentityManager {
        IdentityManager::new(
            Arc::new(users),
            Arc::new(lookups),
            Arc::new(MockProfileRepository::new()),
            credentials,
        )
    }

    fn stored_user(username: &str, status_id: i32) -> User {
        let mut user = User::new(
            Uuid::new_v4(),
            username.to_string(),
            format!("{}@example.com", username),
            db_now(),
        );
        user.status_id = status_id;
        user.set_password("correct-password", MIN_PASSWORD_LENGTH).unwrap();
        user.generate_auth_key();
        user
    }

    /// Answers status-filtered lookups the way the database would.
    fn matching(user: &User, status: StatusFilter) -> Option<User> {
        match status {
            StatusFilter::Only(s) if s != user.status_id => None,
            _ => Some(user.clone()),
        }
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret-password".to_string(),
            status_id: None,
            role_id: None,
            user_type_id: None,
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    #[tokio::test]
    async fn test_find_identity_returns_active_user() {
        let user = stored_user("alice", STATUS_ACTIVE);
        let id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .with(eq(id), eq(ACTIVE_ONLY))
            .returning(move |_, status| Ok(matching(&user, status)));

        let service = manager(users, MockLookupRepository::new());
        let found = service.find_identity(id).await.unwrap().unwrap();

        assert_eq!(found.id(), id);
    }

    #[tokio::test]
    async fn test_inactive_user_is_not_found_by_id_or_username() {
        let user = stored_user("banned", 0);
        let id = user.id;
        let by_id = user.clone();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_, status| Ok(matching(&by_id, status)));
        users
            .expect_find_by_username()
            .returning(move |_, status| Ok(matching(&user, status)));

        let service = manager(users, MockLookupRepository::new());

        assert!(service.find_identity(id).await.unwrap().is_none());
        assert!(service.find_by_username("banned").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_access_token_lookup_requires_active_status() {
        let user = stored_user("sleepy", 5);
        let key = user.auth_key.clone().unwrap();

        let mut users = MockUserRepository::new();
        users.expect_find_by_auth_key().returning(move |token, status| {
            Ok(matching(&user, status).filter(|u| u.auth_key.as_deref() == Some(token)))
        });

        let service = manager(users, MockLookupRepository::new());

        assert!(service
            .find_identity_by_access_token(&key)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_access_token_never_reaches_storage() {
        let service = manager(MockUserRepository::new(), MockLookupRepository::new());

        assert!(service.find_identity_by_access_token("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reset_token_expiry_window() {
        let issued = 1_700_000_000;
        let mut user = stored_user("alice", STATUS_ACTIVE);
        user.generate_password_reset_token_at(issued);
        let token = user.password_reset_token.clone().unwrap();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_password_reset_token()
            .times(1)
            .returning(move |token, status| {
                Ok(matching(&user, status)
                    .filter(|u| u.password_reset_token.as_deref() == Some(token)))
            });

        let service = manager(users, MockLookupRepository::new());

        let fresh = service
            .find_by_password_reset_token_at(&token, EXPIRE, issued + 3599)
            .await
            .unwrap();
        assert!(fresh.is_some());

        let expired = service
            .find_by_password_reset_token_at(&token, EXPIRE, issued + 3601)
            .await
            .unwrap();
        assert!(expired.is_none());
    }

    #[tokio::test]
    async fn test_reset_token_of_inactive_user_is_not_found() {
        let issued = 1_700_000_000;
        let mut user = stored_user("pending", 5);
        user.generate_password_reset_token_at(issued);
        let token = user.password_reset_token.clone().unwrap();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_password_reset_token()
            .times(1)
            .returning(move |token, status| {
                Ok(matching(&user, status)
                    .filter(|u| u.password_reset_token.as_deref() == Some(token)))
            });

        let service = manager(users, MockLookupRepository::new());
        let found = service
            .find_by_password_reset_token_at(&token, EXPIRE, issued + 10)
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_malformed_reset_token_is_not_found() {
        let service = manager(MockUserRepository::new(), MockLookupRepository::new());

        for token in ["", "no-timestamp", "abc_", "abc_12ab"] {
            let found = service
                .find_by_password_reset_token_at(token, EXPIRE, 0)
                .await
                .unwrap();
            assert!(found.is_none(), "token {:?} should not resolve", token);
        }
    }

    // =========================================================================
    // Registration and updates
    // =========================================================================

    #[tokio::test]
    async fn test_register_applies_defaults_and_credentials() {
        let mut users = MockUserRepository::new();
        users.expect_exists_with_username().returning(|_, _| Ok(false));
        users.expect_exists_with_email().returning(|_, _| Ok(false));
        users.expect_insert().times(1).returning(|user| Ok(user.clone()));

        let service = manager(users, lookups_with_seed_data());
        let user = service
            .register(new_user("  alice ", "alice@example.com "))
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.status_id, STATUS_ACTIVE);
        assert_eq!(user.role_id, 10);
        assert_eq!(user.user_type_id, 10);
        assert!(user.validate_password("secret-password"));
        assert!(!user.validate_password("secret-passwort"));
        assert!(user.auth_key.is_some());
        assert!(user.password_reset_token.is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username_before_insert() {
        let mut users = MockUserRepository::new();
        users
            .expect_exists_with_username()
            .returning(|username, _| Ok(username == "alice"));
        users.expect_exists_with_email().returning(|_, _| Ok(false));
        users.expect_insert().never();

        let service = manager(users, lookups_with_seed_data());
        let err = service
            .register(new_user("alice", "other@example.com"))
            .await
            .unwrap_err();

        let fields = err.field_errors().expect("field errors");
        assert_eq!(fields.for_field(FIELD_USERNAME).unwrap().code, "unique");
        assert!(fields.for_field(FIELD_EMAIL).is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email_before_insert() {
        let mut users = MockUserRepository::new();
        users.expect_exists_with_username().returning(|_, _| Ok(false));
        users
            .expect_exists_with_email()
            .returning(|email, _| Ok(email == "taken@example.com"));
        users.expect_insert().never();

        let service = manager(users, lookups_with_seed_data());
        let err = service
            .register(new_user("bob", " taken@example.com "))
            .await
            .unwrap_err();

        let fields = err.field_errors().expect("field errors");
        assert_eq!(fields.for_field(FIELD_EMAIL).unwrap().code, "unique");
        assert!(fields.for_field(FIELD_USERNAME).is_none());
    }

    #[tokio::test]
    async fn test_register_reports_every_invalid_field() {
        let mut users = MockUserRepository::new();
        users.expect_exists_with_username().returning(|_, _| Ok(false));
        users.expect_exists_with_email().returning(|_, _| Ok(false));
        users.expect_insert().never();

        let service = manager(users, lookups_with_seed_data());
        let mut input = new_user("a", "not-an-email");
        input.password = "12345".to_string();
        input.role_id = Some(99);
        input.user_type_id = Some(30);

        let err = service.register(input).await.unwrap_err();
        let fields = err.field_errors().expect("field errors");

        assert_eq!(fields.len(), 4);
        assert_eq!(fields.for_field(FIELD_ROLE_ID).unwrap().code, "in");
        assert_eq!(fields.for_field(FIELD_USERNAME).unwrap().code, "too_short");
        assert_eq!(fields.for_field(FIELD_EMAIL).unwrap().code, "email");
        assert_eq!(fields.for_field(FIELD_PASSWORD).unwrap().code, "too_short");
        assert!(fields.for_field(FIELD_USER_TYPE_ID).is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let mut users = MockUserRepository::new();
        users.expect_exists_with_username().returning(|_, _| Ok(false));
        users.expect_exists_with_email().returning(|_, _| Ok(false));
        users.expect_insert().never();

        let service = manager(users, lookups_with_seed_data());
        let mut input = new_user("alice", "alice@example.com");
        input.password = "12345".to_string();

        let err = service.register(input).await.unwrap_err();
        let fields = err.field_errors().expect("field errors");

        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields.for_field(FIELD_PASSWORD).unwrap().message,
            "Password should contain at least 6 characters."
        );
    }

    #[tokio::test]
    async fn test_configured_password_minimum_applies_both_ways() {
        let mut users = MockUserRepository::new();
        users.expect_exists_with_username().returning(|_, _| Ok(false));
        users.expect_exists_with_email().returning(|_, _| Ok(false));
        users.expect_insert().times(1).returning(|user| Ok(user.clone()));

        let lenient = manager_with(
            users,
            lookups_with_seed_data(),
            CredentialConfig {
                min_password_length: 4,
                ..CredentialConfig::default()
            },
        );
        let mut input = new_user("carol", "carol@example.com");
        input.password = "abcd".to_string();

        let user = lenient.register(input).await.unwrap();
        assert!(user.validate_password("abcd"));

        let mut users = MockUserRepository::new();
        users.expect_find_by_id().never();
        let strict = manager_with(
            users,
            MockLookupRepository::new(),
            CredentialConfig {
                min_password_length: 10,
                ..CredentialConfig::default()
            },
        );

        let err = strict
            .change_password(Uuid::new_v4(), "only-nine")
            .await
            .unwrap_err();
        let fields = err.field_errors().expect("field errors");
        assert_eq!(
            fields.for_field(FIELD_PASSWORD).unwrap().message,
            "Password should contain at least 10 characters."
        );
    }

    #[tokio::test]
    async fn test_update_user_excludes_self_from_uniqueness_and_bumps_version() {
        let user = stored_user("alice", STATUS_ACTIVE);
        let id = user.id;
        let previous = user.updated_at;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_, _| Ok(Some(user.clone())));
        users
            .expect_exists_with_username()
            .withf(move |_, excluding| *excluding == Some(id))
            .returning(|_, _| Ok(false));
        users
            .expect_exists_with_email()
            .withf(move |_, excluding| *excluding == Some(id))
            .returning(|_, _| Ok(false));
        users
            .expect_update()
            .withf(move |_, expected| *expected == previous)
            .returning(|user, _| Ok(user.clone()));

        let service = manager(users, lookups_with_seed_data());
        let updated = service
            .update_user(
                id,
                UpdateUser {
                    role_id: Some(20),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.role_id, 20);
        assert!(updated.updated_at > previous);
    }

    #[tokio::test]
    async fn test_update_user_propagates_concurrent_modification() {
        let user = stored_user("alice", STATUS_ACTIVE);
        let id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_, _| Ok(Some(user.clone())));
        users.expect_exists_with_username().returning(|_, _| Ok(false));
        users.expect_exists_with_email().returning(|_, _| Ok(false));
        users
            .expect_update()
            .returning(|_, _| Err(AppError::conflict("User was modified concurrently")));

        let service = manager(users, lookups_with_seed_data());
        let err = service
            .update_user(id, UpdateUser::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    #[tokio::test]
    async fn test_login_checks_password() {
        let user = stored_user("alice", STATUS_ACTIVE);

        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(move |username, status| {
            Ok(matching(&user, status).filter(|u| u.username == username))
        });

        let service = manager(users, MockLookupRepository::new());

        assert!(service.login("alice", "correct-password").await.is_ok());
        assert!(matches!(
            service.login("alice", "wrong-password").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody", "correct-password").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_issues_missing_auth_key() {
        let mut user = stored_user("alice", STATUS_ACTIVE);
        user.auth_key = None;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .returning(move |_, _| Ok(Some(user.clone())));
        users
            .expect_update()
            .times(1)
            .returning(|user, _| Ok(user.clone()));

        let service = manager(users, MockLookupRepository::new());
        let logged_in = service.login("alice", "correct-password").await.unwrap();

        let key = logged_in.auth_key.clone().unwrap();
        assert!(logged_in.validate_auth_key(&key));
    }

    #[tokio::test]
    async fn test_login_race_returns_key_stored_by_other_login() {
        let mut user = stored_user("alice", STATUS_ACTIVE);
        user.auth_key = None;
        let mut winner = user.clone();
        winner.generate_auth_key();
        let winning_key = winner.auth_key.clone();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .times(1)
            .returning(move |_, _| Ok(Some(user.clone())));
        users
            .expect_find_by_username()
            .times(1)
            .returning(move |_, _| Ok(Some(winner.clone())));
        users
            .expect_update()
            .times(1)
            .returning(|_, _| Err(AppError::conflict("User was modified concurrently")));

        let service = manager(users, MockLookupRepository::new());
        let logged_in = service.login("alice", "correct-password").await.unwrap();

        assert_eq!(logged_in.auth_key, winning_key);
    }

    #[tokio::test]
    async fn test_regenerate_auth_key_invalidates_old_key() {
        let user = stored_user("alice", STATUS_ACTIVE);
        let id = user.id;
        let old_key = user.auth_key.clone().unwrap();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_, status| Ok(matching(&user, status)));
        users.expect_update().returning(|user, _| Ok(user.clone()));

        let service = manager(users, MockLookupRepository::new());
        let new_key = service.regenerate_auth_key(id).await.unwrap();

        assert_ne!(new_key, old_key);
    }

    #[tokio::test]
    async fn test_password_reset_round_trip_consumes_token() {
        let store = Arc::new(Mutex::new(stored_user("alice", STATUS_ACTIVE)));

        let mut users = MockUserRepository::new();
        let by_email = store.clone();
        users.expect_find_by_email().returning(move |email, status| {
            let user = by_email.lock().unwrap();
            Ok(matching(&user, status).filter(|u| u.email == email))
        });
        let by_token = store.clone();
        users
            .expect_find_by_password_reset_token()
            .returning(move |token, status| {
                let user = by_token.lock().unwrap();
                Ok(matching(&user, status)
                    .filter(|u| u.password_reset_token.as_deref() == Some(token)))
            });
        let on_update = store.clone();
        users.expect_update().returning(move |user, expected| {
            let mut stored = on_update.lock().unwrap();
            if stored.updated_at != expected {
                return Err(AppError::conflict("User was modified concurrently"));
            }
            *stored = user.clone();
            Ok(user.clone())
        });

        let service = manager(users, MockLookupRepository::new());

        let token = service
            .request_password_reset("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        let again = service
            .request_password_reset("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token, again, "a valid token is reused");

        let user = service.reset_password(&token, "brand-new-password").await.unwrap();
        assert!(user.validate_password("brand-new-password"));
        assert!(!user.validate_password("correct-password"));
        assert!(user.password_reset_token.is_none());

        assert!(service
            .find_by_password_reset_token(&token)
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            service.reset_password(&token, "another-password").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_request_password_reset_for_unknown_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_, _| Ok(None));
        users.expect_update().never();

        let service = manager(users, MockLookupRepository::new());

        assert!(service
            .request_password_reset("ghost@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_reset_password_rejects_blank_token() {
        let service = manager(MockUserRepository::new(), MockLookupRepository::new());

        let err = service.reset_password("  ", "new-password").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    // =========================================================================
    // Presentation helpers
    // =========================================================================

    #[tokio::test]
    async fn test_overview_resolves_relations() {
        let mut user = stored_user("alice", STATUS_ACTIVE);
        user.role_id = 42;
        user.user_type_id = 30;
        let id = user.id;
        let profile_id = Uuid::new_v4();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_, _| Ok(Some(user.clone())));

        let mut lookups = MockLookupRepository::new();
        lookups
            .expect_find_by_value()
            .returning(|kind, value| {
                Ok(match (kind, value) {
                    (LookupKind::Status, 10) => Some(entry(1, 10, "Active")),
                    (LookupKind::UserType, 30) => Some(entry(2, 30, "Paid")),
                    _ => None,
                })
            });

        let mut profiles = MockProfileRepository::new();
        profiles.expect_find_by_user_id().returning(move |user_id| {
            Ok(Some(Profile {
                id: profile_id,
                user_id,
                first_name: Some("Alice".to_string()),
                last_name: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });

        let service = IdentityManager::new(
            Arc::new(users),
            Arc::new(lookups),
            Arc::new(profiles),
            CredentialConfig::default(),
        );
        let overview = service.overview(id).await.unwrap().unwrap();

        assert_eq!(overview.role_name, None);
        assert_eq!(overview.role_name_or_default(), ROLE_NOT_FOUND_LABEL);
        assert_eq!(overview.status_name_or_default(), "Active");
        assert_eq!(overview.user_type_name.as_deref(), Some("Paid"));
        assert_eq!(overview.user_type_pk, Some(2));
        assert_eq!(overview.profile_id, Some(profile_id));
    }

    #[tokio::test]
    async fn test_role_list_is_keyed_by_value() {
        let service = manager(MockUserRepository::new(), lookups_with_seed_data());
        let roles = service.role_list().await.unwrap();

        assert_eq!(roles.get(&20).map(String::as_str), Some("Admin"));
        assert_eq!(roles.len(), 2);
    }
}
