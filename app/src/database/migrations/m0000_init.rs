use super::{Migration, SimpleSqlMigration};

pub fn migration() -> impl Migration {
    SimpleSqlMigration {
        serial_number: 0,
        sql: vec![
            r#"
            CREATE TABLE users (
                id UUID PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                balance BIGINT NOT NULL,
                profile_image TEXT,
                created TIMESTAMP WITH TIME ZONE NOT NULL
            )"#,
            r#"CREATE INDEX user_email ON users (email)"#,
            r#"
            CREATE TABLE auth_sessions (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users,
                token_hash TEXT UNIQUE NOT NULL,
                created TIMESTAMP WITH TIME ZONE NOT NULL,
                expires TIMESTAMP WITH TIME ZONE NOT NULL
            )"#,
            r#"
            CREATE TABLE service (
                service_code TEXT PRIMARY KEY,
                service_name TEXT NOT NULL,
                service_icon TEXT NOT NULL,
                service_tariff BIGINT NOT NULL
            )"#,
            r#"
            CREATE TABLE banner (
                banner_name TEXT PRIMARY KEY,
                banner_image TEXT NOT NULL,
                description TEXT NOT NULL
            )"#,
            r#"
            CREATE TABLE transaction_history (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users,
                invoice_number TEXT UNIQUE NOT NULL,
                transaction_type INT NOT NULL,
                total_amount BIGINT NOT NULL,
                service_code TEXT REFERENCES service,
                created TIMESTAMP WITH TIME ZONE NOT NULL
            )"#,
            r#"CREATE INDEX transaction_history_user_created ON transaction_history (user_id, created DESC)"#,
        ],
    }
}
