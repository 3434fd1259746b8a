//! Account service - login, registration, recovery and profile use cases.
//!
//! Expected failures come back as the matching `AppError` taxonomy variant
//! with a caller-facing message; successes come back as a `Reply`.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt, Reply, ServiceResult};
use domain::{recovery_token_key, FieldKind, NewUser, PasswordDigest, ProfilePatch, User};

use crate::infra::RecoveryTokenCache;
use crate::repository::UserRepository;

/// Account service trait for dependency injection.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Authenticate by username and password
    async fn login(&self, username: &str, password: &str) -> ServiceResult<User>;

    /// Create a customer account after both uniqueness checks pass
    async fn register(&self, candidate: NewUser) -> ServiceResult<()>;

    /// Succeeds when `value` is free to use for the named field
    async fn check_valid(&self, value: &str, field_type: &str) -> ServiceResult<()>;

    /// Recovery question of an existing user
    async fn select_question(&self, username: &str) -> ServiceResult<String>;

    /// Issue a recovery token when the answer matches
    async fn check_answer(&self, username: &str, question: &str, answer: &str)
        -> ServiceResult<String>;

    /// Set a new password using a recovery token
    async fn forget_reset_password(
        &self,
        username: &str,
        new_password: &str,
        forget_token: &str,
    ) -> ServiceResult<()>;

    /// Change the password of an already authenticated user
    async fn reset_password(
        &self,
        old_password: &str,
        new_password: &str,
        current_user: &User,
    ) -> ServiceResult<()>;

    /// Update email, phone and recovery pair
    async fn update_information(&self, patch: ProfilePatch) -> ServiceResult<ProfilePatch>;

    /// Fetch a user's profile
    async fn get_information(&self, user_id: Uuid) -> ServiceResult<User>;
}

/// Concrete implementation of AccountService.
pub struct AccountManager {
    repo: Arc<dyn UserRepository>,
    tokens: Arc<dyn RecoveryTokenCache>,
    password_salt: String,
}

impl AccountManager {
    /// Create new account service instance
    pub fn new(
        repo: Arc<dyn UserRepository>,
        tokens: Arc<dyn RecoveryTokenCache>,
        password_salt: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            tokens,
            password_salt: password_salt.into(),
        }
    }

    fn digest(&self, plain_text: &str) -> PasswordDigest {
        PasswordDigest::compute(plain_text, &self.password_salt)
    }

    /// Single existence check behind `check_valid`, `select_question` and
    /// `forget_reset_password`. The first reads `true` as a conflict, the
    /// other two read `false` as a missing user.
    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        Ok(self.repo.count_by_username(username).await? > 0)
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        Ok(self.repo.count_by_email(email).await? > 0)
    }
}

#[async_trait]
impl AccountService for AccountManager {
    async fn login(&self, username: &str, password: &str) -> ServiceResult<User> {
        if !self.username_exists(username).await? {
            return Err(AppError::not_found("username does not exist"));
        }

        let digest = self.digest(password);
        let user = self
            .repo
            .find_by_credentials(username, digest.as_str())
            .await?
            .ok_or_else(|| AppError::invalid_credential("incorrect password"))?;

        tracing::info!(username = %username, "User logged in");
        Ok(Reply::with_message(user.without_password(), "login succeeded"))
    }

    async fn register(&self, candidate: NewUser) -> ServiceResult<()> {
        self.check_valid(&candidate.username, domain::FIELD_USERNAME)
            .await?;
        self.check_valid(&candidate.email, domain::FIELD_EMAIL).await?;

        let digest = self.digest(&candidate.password).into_string();
        let user = User::register(candidate, digest);
        let username = user.username.clone();

        if self.repo.insert(user).await? == 0 {
            return Err(AppError::persistence_failure("registration failed"));
        }

        tracing::info!(username = %username, "User registered");
        Ok(Reply::message("registration succeeded"))
    }

    async fn check_valid(&self, value: &str, field_type: &str) -> ServiceResult<()> {
        let kind: FieldKind = field_type.parse()?;

        let taken = match kind {
            FieldKind::Username => self.username_exists(value).await?,
            FieldKind::Email => self.email_exists(value).await?,
        };

        if taken {
            return Err(match kind {
                FieldKind::Username => AppError::already_exists("username already exists"),
                FieldKind::Email => AppError::already_exists("email already exists"),
            });
        }

        Ok(Reply::message("validation passed, field does not exist"))
    }

    async fn select_question(&self, username: &str) -> ServiceResult<String> {
        if !self.username_exists(username).await? {
            return Err(AppError::not_found("username does not exist"));
        }

        match self.repo.find_recovery_question(username).await? {
            Some(question) if !question.trim().is_empty() => Ok(Reply::data(question)),
            _ => Ok(Reply::message("recovery question is empty")),
        }
    }

    async fn check_answer(
        &self,
        username: &str,
        question: &str,
        answer: &str,
    ) -> ServiceResult<String> {
        if self
            .repo
            .count_matching_answer(username, question, answer)
            .await?
            == 0
        {
            return Err(AppError::invalid_credential("incorrect answer to the question"));
        }

        let token = Uuid::new_v4().to_string();
        self.tokens.set(&recovery_token_key(username), &token).await?;

        tracing::info!(username = %username, cache = self.tokens.backend(), "Recovery token issued");
        Ok(Reply::data(token))
    }

    async fn forget_reset_password(
        &self,
        username: &str,
        new_password: &str,
        forget_token: &str,
    ) -> ServiceResult<()> {
        if forget_token.trim().is_empty() {
            return Err(AppError::invalid_argument("parameter error, token is required"));
        }

        // Checked before the cache so a blank username never forms a key
        if !self.username_exists(username).await? {
            return Err(AppError::not_found("user does not exist"));
        }

        let cached = self
            .tokens
            .get(&recovery_token_key(username))
            .await?
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AppError::invalid_credential("token invalid or expired"))?;

        if cached != forget_token {
            tracing::warn!(username = %username, "Recovery token mismatch");
            return Err(AppError::invalid_credential(
                "token incorrect, request a new reset token",
            ));
        }

        let digest = self.digest(new_password);
        if self
            .repo
            .update_password_by_username(username, digest.as_str())
            .await?
            == 0
        {
            return Err(AppError::persistence_failure("password update failed"));
        }

        // TODO: invalidate the token here once single-use recovery is agreed on
        tracing::info!(username = %username, "Password reset via recovery token");
        Ok(Reply::message("password reset succeeded"))
    }

    async fn reset_password(
        &self,
        old_password: &str,
        new_password: &str,
        current_user: &User,
    ) -> ServiceResult<()> {
        let old_digest = self.digest(old_password);
        if self
            .repo
            .verify_password_by_id(old_digest.as_str(), current_user.id)
            .await?
            == 0
        {
            return Err(AppError::invalid_credential("old password incorrect"));
        }

        let new_digest = self.digest(new_password);
        if self
            .repo
            .update_password_by_id(current_user.id, new_digest.as_str())
            .await?
            == 0
        {
            return Err(AppError::persistence_failure("password update failed"));
        }

        tracing::info!(user_id = %current_user.id, "Password changed");
        Ok(Reply::message("password updated"))
    }

    async fn update_information(&self, patch: ProfilePatch) -> ServiceResult<ProfilePatch> {
        if self
            .repo
            .count_email_excluding_id(&patch.email, patch.id)
            .await?
            > 0
        {
            return Err(AppError::already_exists(
                "email already exists, use a different email",
            ));
        }

        if self.repo.update_profile(&patch).await? == 0 {
            return Err(AppError::persistence_failure("profile update failed"));
        }

        tracing::info!(user_id = %patch.id, "Profile updated");
        Ok(Reply::with_message(patch, "profile updated"))
    }

    async fn get_information(&self, user_id: Uuid) -> ServiceResult<User> {
        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("user does not exist")?;

        Ok(Reply::data(user.without_password()))
    }
}
