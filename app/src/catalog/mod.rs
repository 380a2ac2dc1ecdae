use crate::{auth, database::Database};
use thiserror::Error;

mod entities;

pub use entities::{Banner, Service, ServiceCode};

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage failure")]
    Storage(#[from] sqlx::Error),
}

/// The grant is only a proof of authentication here; the catalog itself is
/// the same for every user.
pub async fn services(_grant: &auth::Grant, db: &Database) -> Result<Vec<Service>, Error> {
    Ok(queries::services(db).await?)
}

pub async fn banners(db: &Database) -> Result<Vec<Banner>, Error> {
    Ok(queries::banners(db).await?)
}

/// Resolves one catalog entry for the ledger.
pub(crate) async fn get(db: &Database, code: &str) -> Result<Option<Service>, sqlx::Error> {
    queries::get(db, code).await
}

mod queries {
    use super::{Banner, Service, ServiceCode};
    use crate::{database::Database, money::Rupiah};
    use const_format::formatcp;

    const COLUMNS: &str = "service_code, service_name, service_icon, service_tariff";

    pub(super) async fn services(db: &Database) -> Result<Vec<Service>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ServiceRow>(formatcp!(
            "SELECT {} FROM service ORDER BY service_code",
            COLUMNS
        ))
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(|row| row.into_entity()).collect())
    }

    pub(super) async fn get(db: &Database, code: &str) -> Result<Option<Service>, sqlx::Error> {
        let row = sqlx::query_as::<_, ServiceRow>(formatcp!(
            "SELECT {} FROM service WHERE service_code = $1",
            COLUMNS
        ))
        .bind(code)
        .fetch_optional(db)
        .await?;
        Ok(row.map(|row| row.into_entity()))
    }

    pub(super) async fn banners(db: &Database) -> Result<Vec<Banner>, sqlx::Error> {
        let rows = sqlx::query_as::<_, BannerRow>(
            "SELECT banner_name, banner_image, description FROM banner ORDER BY banner_name",
        )
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(|row| row.into_entity()).collect())
    }

    #[derive(Debug, sqlx::FromRow)]
    struct ServiceRow {
        service_code: String,
        service_name: String,
        service_icon: String,
        service_tariff: i64,
    }

    impl ServiceRow {
        fn into_entity(self) -> Service {
            Service {
                code: ServiceCode(self.service_code),
                name: self.service_name,
                icon: self.service_icon,
                tariff: Rupiah(self.service_tariff),
            }
        }
    }

    #[derive(Debug, sqlx::FromRow)]
    struct BannerRow {
        banner_name: String,
        banner_image: String,
        description: String,
    }

    impl BannerRow {
        fn into_entity(self) -> Banner {
            Banner {
                name: self.banner_name,
                image: self.banner_image,
                description: self.description,
            }
        }
    }
}
