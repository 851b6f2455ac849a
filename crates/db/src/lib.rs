use db_migration::Migrator;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;

pub mod entities;
pub mod models;
pub mod retry;
pub mod types;

pub use sea_orm::{
    DatabaseConnection, DatabaseTransaction, DbErr, TransactionSession, TransactionTrait,
};

#[derive(Clone)]
pub struct DBService {
    pub conn: DatabaseConnection,
}

impl DBService {
    /// Connects and brings the schema up to date. `database_url` is
    /// expected in sea-orm form, e.g. `sqlite://ops.sqlite?mode=rwc`.
    pub async fn new(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url);
        options.sqlx_logging(false);
        let conn = Database::connect(options).await?;
        Migrator::up(&conn, None).await?;
        tracing::debug!("database ready at {}", database_url);
        Ok(DBService { conn })
    }
}
