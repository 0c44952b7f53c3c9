use bson::doc;
use mongodb::{options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel};

use crate::config::DatabaseConfig;
use crate::error::ApiError;
use crate::models::{
    Activity, AuditLogEntry, Client, Company, Payment, Phase, Project, Task, User,
};

/// Handle to the document store. The access-control core only relies on the
/// driver's single-document primitives: find / find_one / insert_one /
/// update_one / delete_one / delete_many / count_documents.
#[derive(Clone)]
pub struct Store {
    client: MongoClient,
    db: Database,
}

impl Store {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ApiError> {
        tracing::info!(uri = %config.mongo_url, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(&config.mongo_url).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", config.mongo_url, e);
            ApiError::from(e)
        })?;
        let db = client.database(&config.db_name);
        tracing::info!(database = %config.db_name, "Connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), ApiError> {
        tracing::info!("Creating MongoDB indexes");

        // Unique email lookups for login and registration duplicate checks
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("unique_email".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.users().create_index(unique_email, None).await?;

        // Tenant-partition index for every business collection
        for name in ["clients", "activities", "projects", "tasks", "phases", "payments"] {
            let idx = IndexModel::builder()
                .keys(doc! { "company_id": 1 })
                .options(
                    IndexOptions::builder()
                        .name("tenant_lookup".to_string())
                        .build(),
                )
                .build();
            self.db
                .collection::<bson::Document>(name)
                .create_index(idx, None)
                .await?;
        }

        // Newest-first audit reads and cutoff-based retention sweeps
        let audit_ts = IndexModel::builder()
            .keys(doc! { "company_id": 1, "timestamp": -1 })
            .options(
                IndexOptions::builder()
                    .name("audit_tenant_recent".to_string())
                    .build(),
            )
            .build();
        self.audit_logs().create_index(audit_ts, None).await?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), ApiError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                ApiError::service_unavailable("database unavailable")
            })?;
        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn companies(&self) -> Collection<Company> {
        self.db.collection("companies")
    }

    pub fn clients(&self) -> Collection<Client> {
        self.db.collection("clients")
    }

    pub fn activities(&self) -> Collection<Activity> {
        self.db.collection("activities")
    }

    pub fn projects(&self) -> Collection<Project> {
        self.db.collection("projects")
    }

    pub fn tasks(&self) -> Collection<Task> {
        self.db.collection("tasks")
    }

    pub fn phases(&self) -> Collection<Phase> {
        self.db.collection("phases")
    }

    pub fn payments(&self) -> Collection<Payment> {
        self.db.collection("payments")
    }

    pub fn audit_logs(&self) -> Collection<AuditLogEntry> {
        self.db.collection("activity_logs")
    }
}
