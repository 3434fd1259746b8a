//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{DomainError, User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    /// Password digest
    pub password: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub role: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl TryFrom<Model> for User {
    type Error = DomainError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(User {
            id: model.id,
            username: model.username,
            password: model.password,
            email: model.email,
            phone: model.phone,
            question: model.question,
            answer: model.answer,
            role: UserRole::try_from(model.role)?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        use sea_orm::Set;

        ActiveModel {
            id: Set(user.id),
            username: Set(user.username),
            password: Set(user.password),
            email: Set(user.email),
            phone: Set(user.phone),
            question: Set(user.question),
            answer: Set(user.answer),
            role: Set(i32::from(user.role)),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
    }
}
