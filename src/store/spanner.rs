use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gcloud_gax::grpc::Code;
use gcloud_googleapis::spanner::admin::database::v1::{
    CreateDatabaseRequest, GetDatabaseDdlRequest, GetDatabaseRequest, UpdateDatabaseDdlRequest,
};
use gcloud_googleapis::spanner::admin::instance::v1::{
    CreateInstanceRequest, GetInstanceRequest, Instance,
};
use gcloud_spanner::admin::client::Client as AdminClient;
use gcloud_spanner::admin::AdminClientConfig;
use gcloud_spanner::client::{Client, ClientConfig};
use gcloud_spanner::key::Key;
use gcloud_spanner::mutation::{delete, insert, update};
use gcloud_spanner::row::Row;
use gcloud_spanner::statement::{Statement, ToKind};
use gcloud_spanner::value::CommitTimestamp;
use std::sync::Arc;
use uuid::Uuid;

use super::TodoStore;
use crate::config::SpannerConfig;
use crate::models::{NewTodo, Todo, TodoChanges};

const TABLE: &str = "todos";

const SELECT_BY_ID: &str =
    "SELECT id, title, description, completed, created_at, updated_at FROM todos WHERE id = @id";

const CREATE_TABLE_DDL: &str = r#"
CREATE TABLE todos (
    id STRING(36) NOT NULL,
    title STRING(MAX) NOT NULL,
    description STRING(MAX) NOT NULL,
    completed BOOL NOT NULL,
    created_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
    updated_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
) PRIMARY KEY (id)
"#;

/// Todo store backed by Google Cloud Spanner
///
/// Cheap to clone; all clones share one session pool.
#[derive(Clone)]
pub struct SpannerStore {
    inner: Arc<Client>,
}

impl SpannerStore {
    /// Connect to the configured database, provisioning the instance,
    /// database and `todos` table first if they are missing.
    ///
    /// gcloud-spanner picks up `SPANNER_EMULATOR_HOST` from the environment on
    /// its own, so the same code path serves the emulator and production.
    pub async fn from_config(config: &SpannerConfig) -> Result<Self> {
        auto_provision(config).await?;

        let database_path = config.database_path();

        match config.emulator_host.as_deref() {
            Some(host) => tracing::info!("Connecting to Spanner emulator at: {}", host),
            None => tracing::info!("Connecting to production Spanner"),
        }

        let client = Client::new(&database_path, ClientConfig::default())
            .await
            .context("Failed to create Spanner client")?;

        tracing::info!(
            "Successfully connected to Spanner database: {}",
            database_path
        );

        Ok(Self {
            inner: Arc::new(client),
        })
    }

    async fn read_todo(&self, id: &str) -> Result<Option<Todo>> {
        let id = id.to_string();
        let mut statement = Statement::new(SELECT_BY_ID);
        statement.add_param("id", &id);

        let mut tx = self.inner
            .single()
            .await
            .context("Failed to create read transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to query todo from Spanner")?;

        match result_set.next().await? {
            Some(row) => Ok(Some(todo_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Read back a row this store has just written
    async fn read_written(&self, id: &str) -> Result<Todo> {
        self.read_todo(id)
            .await?
            .ok_or_else(|| anyhow!("todo {} vanished after write", id))
    }
}

#[async_trait]
impl TodoStore for SpannerStore {
    async fn create(&self, new: NewTodo) -> Result<Todo> {
        let id = Uuid::new_v4().to_string();

        let mutation = insert(
            TABLE,
            &["id", "title", "description", "completed", "created_at", "updated_at"],
            &[
                &id,
                &new.title,
                &new.description,
                &new.completed,
                &CommitTimestamp::new(),
                &CommitTimestamp::new(),
            ],
        );

        self.inner
            .apply(vec![mutation])
            .await
            .context("Failed to insert todo into Spanner")?;

        tracing::debug!("Inserted todo with id: {}", id);
        self.read_written(&id).await
    }

    async fn update(&self, id: &str, changes: TodoChanges) -> Result<Todo> {
        let id_value = id.to_string();
        let now = CommitTimestamp::new();

        // Only the supplied columns are written, plus the refreshed timestamp
        let mutation = {
            let mut columns: Vec<&str> = vec!["id"];
            let mut values: Vec<&dyn ToKind> = vec![&id_value];
            if let Some(title) = &changes.title {
                columns.push("title");
                values.push(title);
            }
            if let Some(description) = &changes.description {
                columns.push("description");
                values.push(description);
            }
            if let Some(completed) = &changes.completed {
                columns.push("completed");
                values.push(completed);
            }
            columns.push("updated_at");
            values.push(&now);
            update(TABLE, &columns, &values)
        };

        // Spanner rejects an update mutation whose row does not exist
        self.inner
            .apply(vec![mutation])
            .await
            .with_context(|| format!("Failed to update todo {} in Spanner", id))?;

        if changes.is_empty() {
            tracing::debug!("Touched todo with id: {} (no field changes)", id);
        } else {
            tracing::debug!("Updated todo with id: {}", id);
        }
        self.read_written(id).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>> {
        let todo = self.read_todo(id).await?;
        if todo.is_none() {
            tracing::debug!("Todo not found with id: {}", id);
        }
        Ok(todo)
    }

    async fn delete(&self, id: &str) -> Result<Todo> {
        // Spanner treats deleting a missing key as success, so check first
        let snapshot = self
            .read_todo(id)
            .await?
            .ok_or_else(|| anyhow!("no todo with id {}", id))?;

        let key = id.to_string();
        let mutation = delete(TABLE, Key::new(&key));
        self.inner
            .apply(vec![mutation])
            .await
            .with_context(|| format!("Failed to delete todo {} from Spanner", id))?;

        tracing::debug!("Deleted todo with id: {}", id);
        Ok(snapshot)
    }

    async fn health_check(&self) -> Result<()> {
        let statement = Statement::new("SELECT 1");

        let mut tx = self.inner
            .single()
            .await
            .context("Failed to create health check transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to execute health check query")?;

        if result_set.next().await?.is_some() {
            tracing::debug!("Health check query succeeded");
            Ok(())
        } else {
            Err(anyhow!("Health check query returned no results"))
        }
    }
}

fn todo_from_row(row: &Row) -> Result<Todo> {
    // Timestamps come back as RFC 3339 strings
    let created_at: String = row.column_by_name("created_at")?;
    let updated_at: String = row.column_by_name("updated_at")?;

    Ok(Todo {
        id: row.column_by_name("id")?,
        title: row.column_by_name("title")?,
        description: row.column_by_name("description")?,
        completed: row.column_by_name("completed")?,
        created_at: parse_timestamp(&created_at).context("Failed to parse created_at timestamp")?,
        updated_at: parse_timestamp(&updated_at).context("Failed to parse updated_at timestamp")?,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

/// Create the instance, database and table if any of them is missing
async fn auto_provision(config: &SpannerConfig) -> Result<()> {
    tracing::info!("Starting auto-provisioning checks...");

    let admin_client = AdminClient::new(AdminClientConfig::default())
        .await
        .context("Failed to create Spanner admin client")?;

    let project_path = format!("projects/{}", config.project);
    let instance_path = format!("{}/instances/{}", project_path, config.instance);
    let database_path = config.database_path();

    ensure_instance_exists(&admin_client, config, &project_path, &instance_path).await?;
    ensure_database_exists(&admin_client, config, &instance_path, &database_path).await?;
    ensure_todos_table_exists(&admin_client, &database_path).await?;

    tracing::info!("Auto-provisioning complete");
    Ok(())
}

async fn ensure_instance_exists(
    admin_client: &AdminClient,
    config: &SpannerConfig,
    project_path: &str,
    instance_path: &str,
) -> Result<()> {
    let get_request = GetInstanceRequest {
        name: instance_path.to_string(),
        field_mask: None,
    };

    match admin_client.instance().get_instance(get_request, None).await {
        Ok(_) => {
            tracing::info!("Instance already exists: {}", instance_path);
            Ok(())
        }
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("Instance not found, creating: {}", instance_path);

            let instance_config = match config.emulator_host {
                Some(_) => format!("{}/instanceConfigs/emulator-config", project_path),
                None => format!("{}/instanceConfigs/regional-us-central1", project_path),
            };

            let create_request = CreateInstanceRequest {
                parent: project_path.to_string(),
                instance_id: config.instance.clone(),
                instance: Some(Instance {
                    name: instance_path.to_string(),
                    config: instance_config,
                    display_name: format!("{} todos", config.instance),
                    node_count: 1,
                    ..Default::default()
                }),
            };

            admin_client
                .instance()
                .create_instance(create_request, None)
                .await
                .context("Failed to start instance creation")?
                .wait(None)
                .await
                .context("Failed to create instance")?;

            tracing::info!("Instance created: {}", instance_path);
            Ok(())
        }
        Err(e) => Err(anyhow!(
            "Failed to check instance existence: {}",
            e.message()
        )),
    }
}

async fn ensure_database_exists(
    admin_client: &AdminClient,
    config: &SpannerConfig,
    instance_path: &str,
    database_path: &str,
) -> Result<()> {
    let get_request = GetDatabaseRequest {
        name: database_path.to_string(),
    };

    match admin_client
        .database()
        .get_database(get_request, None)
        .await
    {
        Ok(_) => {
            tracing::info!("Database already exists: {}", database_path);
            Ok(())
        }
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("Database not found, creating: {}", database_path);

            let create_request = CreateDatabaseRequest {
                parent: instance_path.to_string(),
                create_statement: format!("CREATE DATABASE `{}`", config.database),
                extra_statements: vec![],
                encryption_config: None,
                database_dialect: 1, // Google Standard SQL
                proto_descriptors: vec![],
            };

            admin_client
                .database()
                .create_database(create_request, None)
                .await
                .context("Failed to start database creation")?
                .wait(None)
                .await
                .context("Failed to create database")?;

            tracing::info!("Database created: {}", database_path);
            Ok(())
        }
        Err(e) => Err(anyhow!(
            "Failed to check database existence: {}",
            e.message()
        )),
    }
}

async fn ensure_todos_table_exists(admin_client: &AdminClient, database_path: &str) -> Result<()> {
    let ddl = admin_client
        .database()
        .get_database_ddl(
            GetDatabaseDdlRequest {
                database: database_path.to_string(),
            },
            None,
        )
        .await
        .context("Failed to get database DDL")?
        .into_inner();

    if ddl.statements.iter().any(|stmt| defines_todos_table(stmt)) {
        tracing::info!("Table '{}' already exists", TABLE);
        return Ok(());
    }

    tracing::info!("Table '{}' not found, creating...", TABLE);

    let update_request = UpdateDatabaseDdlRequest {
        database: database_path.to_string(),
        statements: vec![CREATE_TABLE_DDL.trim().to_string()],
        operation_id: String::new(),
        proto_descriptors: vec![],
        throughput_mode: false,
    };

    admin_client
        .database()
        .update_database_ddl(update_request, None)
        .await
        .context("Failed to start table creation")?
        .wait(None)
        .await
        .context("Failed to create table")?;

    tracing::info!("Table '{}' created", TABLE);
    Ok(())
}

fn defines_todos_table(statement: &str) -> bool {
    statement.contains("CREATE TABLE todos ") || statement.contains("CREATE TABLE `todos`")
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests talk to the Spanner emulator on localhost:9010 and skip
    // themselves when it is not running.
    async fn emulator_store(name: &str) -> Option<SpannerStore> {
        // Held until the clients have read SPANNER_EMULATOR_HOST
        let _guard = crate::config::ENV_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        unsafe {
            std::env::set_var("SPANNER_EMULATOR_HOST", "localhost:9010");
        }

        let config = SpannerConfig {
            emulator_host: Some("localhost:9010".to_string()),
            project: "test-project".to_string(),
            instance: format!("{}-instance", name),
            database: format!("{}-db", name),
        };

        match SpannerStore::from_config(&config).await {
            Ok(store) => Some(store),
            Err(e) => {
                println!("{} test skipped (emulator may not be running): {}", name, e);
                None
            }
        }
    }

    fn new_todo() -> NewTodo {
        NewTodo {
            title: "hello world".to_string(),
            description: "this is a pretty long description".to_string(),
            completed: false,
        }
    }

    #[test]
    fn test_store_is_clonable_and_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<SpannerStore>();
    }

    #[test]
    fn test_defines_todos_table() {
        assert!(defines_todos_table(CREATE_TABLE_DDL.trim()));
        assert!(defines_todos_table("CREATE TABLE `todos` (\n  id STRING(36)"));
        assert!(!defines_todos_table("CREATE TABLE todos_archive (\n  id STRING(36)"));
        assert!(!defines_todos_table("CREATE TABLE users (\n  id STRING(36)"));
    }

    #[test]
    fn test_parse_timestamp() {
        let parsed = parse_timestamp("2025-03-01T12:30:45.123456Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-03-01T12:30:45.123456+00:00");
        assert!(parse_timestamp("not a timestamp").is_err());
    }

    #[tokio::test]
    async fn test_create_find_update_delete() {
        let Some(store) = emulator_store("crud-test").await else {
            return;
        };

        let created = store.create(new_todo()).await.unwrap();
        assert_eq!(created.title, "hello world");
        assert!(!created.completed);

        let found = store.find_by_id(&created.id).await.unwrap();
        assert_eq!(found, Some(created.clone()));

        let updated = store
            .update(
                &created.id,
                TodoChanges {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);

        let deleted = store.delete(&created.id).await.unwrap();
        assert_eq!(deleted, updated);
        assert_eq!(store.find_by_id(&created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_rows_fail_update_and_delete() {
        let Some(store) = emulator_store("missing-row-test").await else {
            return;
        };

        let id = Uuid::new_v4().to_string();
        assert!(store.update(&id, TodoChanges::default()).await.is_err());
        assert!(store.delete(&id).await.is_err());
        assert_eq!(store.find_by_id(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_auto_provisioning_idempotent() {
        let Some(_) = emulator_store("idempotent-test").await else {
            return;
        };

        let second = emulator_store("idempotent-test").await;
        assert!(second.is_some(), "Second auto-provisioning call should succeed");
    }

    #[tokio::test]
    async fn test_health_check() {
        let Some(store) = emulator_store("health-test").await else {
            return;
        };
        assert!(store.health_check().await.is_ok());
    }
}
