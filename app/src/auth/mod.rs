use crate::database::Database;
use thiserror::Error;

mod entities;

pub use entities::{AccessDenied, Grant, PasswordHash, Session, SessionId, SessionToken, TokenHash};

#[derive(Debug, Error)]
pub enum Error {
    #[error("access denied")]
    AccessDenied(#[from] AccessDenied),
    #[error("wrong email or password")]
    InvalidCredentials,
    #[error("storage failure")]
    Storage(#[from] sqlx::Error),
}

/// Session lifetime, injected from the process configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub expiry: std::time::Duration,
}

/// Verifies the credentials and opens a new session. Unknown emails and wrong
/// passwords are indistinguishable to the caller.
pub async fn login(
    db: &Database,
    config: &SessionConfig,
    email: &str,
    password: &str,
) -> Result<SessionToken, Error> {
    let credentials = queries::credentials(db, email)
        .await?
        .ok_or(Error::InvalidCredentials)?;
    if !credentials.password_hash.verify(password) {
        return Err(Error::InvalidCredentials);
    }

    let token = SessionToken::generate();
    let session = Session::create(credentials.user_id, config.expiry);
    queries::insert_session(db, &session, &TokenHash::generate(token.as_str())).await?;
    Ok(token)
}

/// Resolves a bearer token to a grant. Unknown and expired tokens both fail
/// with [`AccessDenied`].
pub async fn get_grant(db: &Database, token: &str) -> Result<Grant, Error> {
    let session = queries::session_by_hash(db, &TokenHash::generate(token))
        .await?
        .ok_or(AccessDenied)?;
    Ok(session.grant()?)
}

struct Credentials {
    user_id: crate::user::Id,
    password_hash: PasswordHash,
}

mod queries {
    use super::{Credentials, PasswordHash, Session, SessionId, TokenHash};
    use crate::{database::Database, user};
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    pub(super) async fn credentials(
        db: &Database,
        email: &str,
    ) -> Result<Option<Credentials>, sqlx::Error> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(row.map(|row| row.into_entity()))
    }

    pub(super) async fn insert_session(
        db: &Database,
        session: &Session,
        token_hash: &TokenHash,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO auth_sessions (id, user_id, token_hash, created, expires)
                VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(session.id.0)
        .bind(session.user_id.0)
        .bind(token_hash.as_str())
        .bind(session.created)
        .bind(session.expires)
        .execute(db)
        .await?;
        Ok(())
    }

    pub(super) async fn session_by_hash(
        db: &Database,
        token_hash: &TokenHash,
    ) -> Result<Option<Session>, sqlx::Error> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id, user_id, created, expires FROM auth_sessions WHERE token_hash = $1",
        )
        .bind(token_hash.as_str())
        .fetch_optional(db)
        .await?;
        Ok(row.map(|row| row.into_entity()))
    }

    #[derive(Debug, sqlx::FromRow)]
    struct CredentialsRow {
        id: Uuid,
        password_hash: String,
    }

    impl CredentialsRow {
        fn into_entity(self) -> Credentials {
            Credentials {
                user_id: user::Id(self.id),
                password_hash: PasswordHash::from_stored(self.password_hash),
            }
        }
    }

    #[derive(Debug, sqlx::FromRow)]
    struct SessionRow {
        id: Uuid,
        user_id: Uuid,
        created: DateTime<Utc>,
        expires: DateTime<Utc>,
    }

    impl SessionRow {
        fn into_entity(self) -> Session {
            Session {
                id: SessionId(self.id),
                user_id: user::Id(self.user_id),
                created: self.created,
                expires: self.expires,
            }
        }
    }
}
