use log::*;

use crate::SqliteDatabase;

/// Creates a fresh, migrated database at `url`, and initialises logging.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Created Sqlite database {url}");
    db
}

/// A database path that is unique to the calling test, in the system's temp directory.
pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("order_relay_test_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}
