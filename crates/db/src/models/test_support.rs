use std::path::PathBuf;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Set};
use uuid::Uuid;

use crate::{
    DBService,
    entities::{client, employee},
};

/// Migrated temp-file sqlite database, removed on drop. An in-memory
/// database would hand each pooled connection its own empty schema.
pub(crate) struct TestDb {
    pub service: DBService,
    path: PathBuf,
}

impl TestDb {
    pub async fn new() -> TestDb {
        let path = std::env::temp_dir().join(format!("assignments-test-{}.sqlite", Uuid::new_v4()));
        let url = format!("sqlite://{}?mode=rwc", path.to_string_lossy());
        let service = DBService::new(&url).await.expect("test database");
        TestDb { service, path }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.service.conn
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        let _ = std::fs::remove_file(self.path.with_extension("sqlite-wal"));
        let _ = std::fs::remove_file(self.path.with_extension("sqlite-shm"));
    }
}

pub(crate) async fn seed_client<C: ConnectionTrait>(db: &C, build: &str, company_name: &str) {
    let now = Utc::now();
    client::ActiveModel {
        uuid: Set(Uuid::new_v4()),
        build: Set(build.to_string()),
        company_name: Set(company_name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed client");
}

pub(crate) async fn seed_employee<C: ConnectionTrait>(
    db: &C,
    employee_id: &str,
    full_name: &str,
    nick_name: Option<&str>,
) {
    let now = Utc::now();
    employee::ActiveModel {
        uuid: Set(Uuid::new_v4()),
        employee_id: Set(employee_id.to_string()),
        full_name: Set(full_name.to_string()),
        nick_name: Set(nick_name.map(str::to_string)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed employee");
}
