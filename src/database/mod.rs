use mongodb::{
    bson::{doc, Document},
    options::{ClientOptions, IndexOptions},
    Client, Collection, Database, IndexModel,
};
use std::time::Duration;

use crate::utils::AppError;

pub const USERS: &str = "users";
pub const SHEETS: &str = "sheets";
pub const PROBLEMS: &str = "problems";

const DEFAULT_DB_NAME: &str = "kudos";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: Option<&str>) -> Result<Self, AppError> {
        let mut client_options = ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(Duration::from_secs(300));
        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        // Explicit name wins, then the one in the URI path.
        let name = db_name
            .map(String::from)
            .or_else(|| client_options.default_database.clone())
            .unwrap_or_else(|| DEFAULT_DB_NAME.to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&name);

        db.list_collection_names().await?;
        log::info!("📊 Using database: {}", name);

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    async fn ensure_indexes(&self) -> Result<(), AppError> {
        log::info!("🔧 Creating database indexes...");

        let users = self.collection::<Document>(USERS);
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users.create_index(email_index).await?;
        log::info!("   ✅ Index ready: users(email) unique");

        let sheets = self.collection::<Document>(SHEETS);
        let owner_index = IndexModel::builder().keys(doc! { "createdBy": 1 }).build();
        sheets.create_index(owner_index).await?;
        log::info!("   ✅ Index ready: sheets(createdBy)");

        let problems = self.collection::<Document>(PROBLEMS);
        let sheet_index = IndexModel::builder().keys(doc! { "sheet": 1 }).build();
        problems.create_index(sheet_index).await?;
        log::info!("   ✅ Index ready: problems(sheet)");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn health_check(&self) -> bool {
        match self.db.run_command(doc! { "ping": 1 }).await {
            Ok(_) => true,
            Err(e) => {
                log::warn!("⚠️  Database ping failed: {}", e);
                false
            }
        }
    }
}
