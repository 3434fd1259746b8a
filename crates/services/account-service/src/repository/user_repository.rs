//! User repository: the persistence contract the account service relies on.
//!
//! Every write reports the number of rows it touched; callers treat zero as a
//! failed write rather than inspecting why.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, SqlErr,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{ProfilePatch, User};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Number of users with this username (0 or 1)
    async fn count_by_username(&self, username: &str) -> AppResult<u64>;

    /// Number of users with this email (0 or 1)
    async fn count_by_email(&self, email: &str) -> AppResult<u64>;

    /// User whose username and password digest both match
    async fn find_by_credentials(&self, username: &str, password_digest: &str)
        -> AppResult<Option<User>>;

    /// Insert a fully prepared user, returning rows affected
    async fn insert(&self, user: User) -> AppResult<u64>;

    /// Stored recovery question for a username
    async fn find_recovery_question(&self, username: &str) -> AppResult<Option<String>>;

    /// Number of users matching username, question and answer together
    async fn count_matching_answer(&self, username: &str, question: &str, answer: &str)
        -> AppResult<u64>;

    /// Replace the password digest of the user with this username
    async fn update_password_by_username(&self, username: &str, password_digest: &str)
        -> AppResult<u64>;

    /// Number of users with this id and password digest (0 or 1)
    async fn verify_password_by_id(&self, password_digest: &str, id: Uuid) -> AppResult<u64>;

    /// Replace the password digest of the user with this id
    async fn update_password_by_id(&self, id: Uuid, password_digest: &str) -> AppResult<u64>;

    /// Write the email of `patch.id` plus whichever of phone, question and
    /// answer are present. Absent fields keep their stored value.
    async fn update_profile(&self, patch: &ProfilePatch) -> AppResult<u64>;

    /// Number of users other than `id` using this email
    async fn count_email_excluding_id(&self, email: &str, id: Uuid) -> AppResult<u64>;

    /// Find user by primary key
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
}

/// SeaORM implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn into_domain(model: Option<user::Model>) -> AppResult<Option<User>> {
    model.map(User::try_from).transpose().map_err(AppError::from)
}

#[async_trait]
impl UserRepository for UserStore {
    async fn count_by_username(&self, username: &str) -> AppResult<u64> {
        let count = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn count_by_email(&self, email: &str) -> AppResult<u64> {
        let count = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn find_by_credentials(
        &self,
        username: &str,
        password_digest: &str,
    ) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::Password.eq(password_digest))
            .one(&self.db)
            .await?;

        into_domain(model)
    }

    async fn insert(&self, user: User) -> AppResult<u64> {
        let active = ActiveModel::from(user);

        match UserEntity::insert(active).exec_without_returning(&self.db).await {
            Ok(rows) => Ok(rows),
            // A concurrent registration won the unique index
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::warn!("User insert rejected by unique constraint");
                Ok(0)
            }
            Err(e) => Err(AppError::from(e)),
        }
    }

    async fn find_recovery_question(&self, username: &str) -> AppResult<Option<String>> {
        let question = UserEntity::find()
            .select_only()
            .column(user::Column::Question)
            .filter(user::Column::Username.eq(username))
            .into_tuple::<Option<String>>()
            .one(&self.db)
            .await?;

        Ok(question.flatten())
    }

    async fn count_matching_answer(
        &self,
        username: &str,
        question: &str,
        answer: &str,
    ) -> AppResult<u64> {
        let count = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::Question.eq(question))
            .filter(user::Column::Answer.eq(answer))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn update_password_by_username(
        &self,
        username: &str,
        password_digest: &str,
    ) -> AppResult<u64> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::Password, Expr::value(password_digest))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Username.eq(username))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn verify_password_by_id(&self, password_digest: &str, id: Uuid) -> AppResult<u64> {
        let count = UserEntity::find()
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::Password.eq(password_digest))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn update_password_by_id(&self, id: Uuid, password_digest: &str) -> AppResult<u64> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::Password, Expr::value(password_digest))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn update_profile(&self, patch: &ProfilePatch) -> AppResult<u64> {
        let mut update = UserEntity::update_many()
            .col_expr(user::Column::Email, Expr::value(patch.email.clone()));

        let optional = [
            (user::Column::Phone, &patch.phone),
            (user::Column::Question, &patch.question),
            (user::Column::Answer, &patch.answer),
        ];
        for (column, value) in optional {
            if let Some(value) = value {
                update = update.col_expr(column, Expr::value(value.clone()));
            }
        }

        let result = update
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(patch.id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn count_email_excluding_id(&self, email: &str, id: Uuid) -> AppResult<u64> {
        let count = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::Id.ne(id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let model = UserEntity::find_by_id(id).one(&self.db).await?;
        into_domain(model)
    }
}
