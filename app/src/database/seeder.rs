use super::{Database, Transaction};
use crate::auth;
use uuid::Uuid;

/// Seeds a login-able account and a small catalog for local development.
/// Only compiled into debug builds; safe to run repeatedly.
pub async fn seed_development_data(db: &Database) {
    let mut data_tx = db.begin().await.unwrap();
    seed_test_user(&mut data_tx).await;
    seed_services(&mut data_tx).await;
    seed_banners(&mut data_tx).await;
    data_tx.commit().await.unwrap();
}

async fn seed_test_user(data_tx: &mut Transaction) {
    let row = sqlx::query("SELECT id FROM users WHERE id = $1")
        .bind(Uuid::from_u128(1))
        .fetch_optional(&mut *data_tx)
        .await
        .unwrap();
    if row.is_some() {
        return;
    }
    sqlx::query(
        r#"INSERT INTO users (id, email, password_hash, first_name, last_name, balance, profile_image, created)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
    )
    .bind(Uuid::from_u128(1))
    .bind("test@user.net")
    .bind(auth::PasswordHash::generate("password123").as_str())
    .bind("Test")
    .bind("User")
    .bind(50_000_i64)
    .bind(Option::<String>::None)
    .bind(chrono::Utc::now())
    .execute(&mut *data_tx)
    .await
    .unwrap();
}

async fn seed_services(data_tx: &mut Transaction) {
    let services = [
        ("PAJAK", "Pajak PBB", "/icons/pajak.png", 40_000_i64),
        ("PLN10", "Listrik Prabayar", "/icons/pln.png", 20_000),
        ("PDAM", "PDAM Berlangganan", "/icons/pdam.png", 40_000),
        ("PULSA", "Pulsa", "/icons/pulsa.png", 40_000),
        ("PGN", "PGN Berlangganan", "/icons/pgn.png", 50_000),
    ];
    for (code, name, icon, tariff) in services {
        sqlx::query(
            r#"INSERT INTO service (service_code, service_name, service_icon, service_tariff)
                VALUES ($1, $2, $3, $4) ON CONFLICT (service_code) DO NOTHING"#,
        )
        .bind(code)
        .bind(name)
        .bind(icon)
        .bind(tariff)
        .execute(&mut *data_tx)
        .await
        .unwrap();
    }
}

async fn seed_banners(data_tx: &mut Transaction) {
    let banners = [
        ("Banner 1", "/banners/banner-1.png", "Lorem ipsum dolor sit amet"),
        ("Banner 2", "/banners/banner-2.png", "Cashback untuk top up pertama"),
    ];
    for (name, image, description) in banners {
        sqlx::query(
            r#"INSERT INTO banner (banner_name, banner_image, description)
                VALUES ($1, $2, $3) ON CONFLICT (banner_name) DO NOTHING"#,
        )
        .bind(name)
        .bind(image)
        .bind(description)
        .execute(&mut *data_tx)
        .await
        .unwrap();
    }
}
