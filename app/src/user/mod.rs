use crate::{
    auth,
    database::{self, Database},
};
use thiserror::Error;

mod entities;

pub use entities::{Email, Id, ImageUrl, NewUser, ProfileUpdate, User, ValidationError};

#[derive(Debug, Error)]
pub enum Error {
    #[error("email is already registered")]
    EmailTaken,
    #[error("user not found")]
    NotFound,
    #[error("storage failure")]
    Storage(#[from] sqlx::Error),
}

/// Persists a validated registration. A duplicate email is detected by the
/// unique index, not by a racy pre-read.
pub async fn register(db: &Database, new_user: NewUser) -> Result<(), Error> {
    queries::insert(db, &new_user).await.map_err(|e| {
        if database::is_unique_violation(&e) {
            Error::EmailTaken
        } else {
            e.into()
        }
    })
}

pub async fn get(grant: &auth::Grant, db: &Database) -> Result<Option<User>, Error> {
    Ok(queries::get(db, grant.user_id).await?)
}

/// Renames the account. The authenticated identity can only be stale if the
/// user row was removed out of band, which surfaces as [`Error::NotFound`].
pub async fn update_profile(
    grant: &auth::Grant,
    db: &Database,
    update: &ProfileUpdate,
) -> Result<User, Error> {
    queries::update_profile(db, grant.user_id, update)
        .await?
        .ok_or(Error::NotFound)
}

pub async fn set_profile_image(
    grant: &auth::Grant,
    db: &Database,
    image: &ImageUrl,
) -> Result<User, Error> {
    queries::set_profile_image(db, grant.user_id, image)
        .await?
        .ok_or(Error::NotFound)
}

mod queries {
    use super::{Email, Id, ImageUrl, NewUser, ProfileUpdate, User};
    use crate::{database::Database, money::Rupiah};
    use chrono::{DateTime, Utc};
    use const_format::formatcp;
    use uuid::Uuid;

    const COLUMNS: &str = "id, email, first_name, last_name, balance, profile_image, created";

    pub(super) async fn insert(db: &Database, new_user: &NewUser) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO users (id, email, password_hash, first_name, last_name, balance, profile_image, created)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(new_user.id.0)
        .bind(&new_user.email.0)
        .bind(new_user.password_hash.as_str())
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(0_i64)
        .bind(Option::<String>::None)
        .bind(new_user.created)
        .execute(db)
        .await?;
        Ok(())
    }

    pub(super) async fn get(db: &Database, id: Id) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(formatcp!(
            "SELECT {} FROM users WHERE id = $1",
            COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(db)
        .await?;
        Ok(row.map(|row| row.into_entity()))
    }

    pub(super) async fn update_profile(
        db: &Database,
        id: Id,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(formatcp!(
            "UPDATE users SET first_name = $1, last_name = $2 WHERE id = $3 RETURNING {}",
            COLUMNS
        ))
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(id.0)
        .fetch_optional(db)
        .await?;
        Ok(row.map(|row| row.into_entity()))
    }

    pub(super) async fn set_profile_image(
        db: &Database,
        id: Id,
        image: &ImageUrl,
    ) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(formatcp!(
            "UPDATE users SET profile_image = $1 WHERE id = $2 RETURNING {}",
            COLUMNS
        ))
        .bind(&image.0)
        .bind(id.0)
        .fetch_optional(db)
        .await?;
        Ok(row.map(|row| row.into_entity()))
    }

    #[derive(Debug, sqlx::FromRow)]
    struct UserRow {
        id: Uuid,
        email: String,
        first_name: String,
        last_name: String,
        balance: i64,
        profile_image: Option<String>,
        created: DateTime<Utc>,
    }

    impl UserRow {
        fn into_entity(self) -> User {
            User {
                id: Id(self.id),
                email: Email(self.email),
                first_name: self.first_name,
                last_name: self.last_name,
                balance: Rupiah(self.balance),
                profile_image: self.profile_image,
                created: self.created,
            }
        }
    }
}
