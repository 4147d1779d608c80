use datakit_model::schema::{
    SUB_TASKS_PATH,
    TASK_LIST_PATH,
    TASK_PAGE_SIZE,
    TASK_SAVE_PATH,
    TASK_START_PATH,
    default_task_name,
};
use datakit_model::{MigrationTask, SourceEndpoint, SubTaskSpec, TargetEndpoint, TaskSaveRequest};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::MigrationControlPlane;
use crate::error::{DataKitError, DataKitResult, EndpointSide};
use crate::gateway::ApiScope;

/// Coordinates of a MySQL to openGauss migration to create.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub source_ip: String,
    pub source_port: String,
    pub source_db: String,
    pub target_ip: String,
    pub target_port: String,
    pub target_db: String,
    /// Defaults to `task_<source_db>_to_<target_db>` when absent or blank.
    pub task_name: Option<String>,
}

impl CreateTaskRequest {
    #[must_use]
    pub fn resolved_task_name(&self) -> String {
        match self.task_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => default_task_name(&self.source_db, &self.target_db),
        }
    }
}

impl MigrationControlPlane {
    /// Validates both endpoints, then submits a single sub-task migration.
    /// Nothing is sent to the save endpoint unless every check passes.
    ///
    /// # Errors
    /// Returns `InvalidEndpointReference` when either side does not resolve,
    /// `NoEligibleHosts` when no execution host is ready, and
    /// `TaskCreationRejected` when `DataKit` refuses the task.
    pub async fn create_task(&self, request: CreateTaskRequest) -> DataKitResult<String> {
        let source = self
            .resolve_source(&request.source_ip, &request.source_port, &request.source_db)
            .await?;
        let target = self
            .resolve_target(&request.target_ip, &request.target_port, &request.target_db)
            .await?;
        let descriptor = SubTaskSpec::new(&source, &request.source_db, &target, &request.target_db);

        let host_ids = self.list_ready_host_ids().await?;
        let task_name = request.resolved_task_name();

        let body = TaskSaveRequest {
            task_name: task_name.clone(),
            global_params: Vec::new(),
            host_ids,
            tasks: vec![descriptor],
        };
        let response = self
            .gateway
            .post_json(ApiScope::Migration, TASK_SAVE_PATH, &body)
            .await?;

        match response.ensure_success() {
            Ok(()) => {
                info!(%task_name, "created migration task");
                Ok(task_name)
            }
            Err(DataKitError::UpstreamRejected { reason, .. }) => {
                warn!(%task_name, %reason, "migration task creation rejected");
                Err(DataKitError::TaskCreationRejected { task_name, reason })
            }
            Err(err) => Err(err),
        }
    }

    /// Lists migration tasks, each carrying the coordinates of its first
    /// sub-task. Tasks without sub-tasks keep unset coordinates.
    ///
    /// # Errors
    /// Returns `DataKitError` if the task or any sub-task listing fails.
    pub async fn list_tasks(&self) -> DataKitResult<Vec<MigrationTask>> {
        let path = format!("{TASK_LIST_PATH}?pageNum=1&pageSize={TASK_PAGE_SIZE}");
        let response = self.gateway.get(ApiScope::Migration, &path).await?;
        response.ensure_success()?;
        let mut tasks: Vec<MigrationTask> = response.decode("/rows")?;

        for task in &mut tasks {
            let sub_tasks = self.list_sub_tasks(&task.task_id).await?;
            if let Some(first) = sub_tasks.into_iter().next() {
                task.coordinates = first.coordinates;
            }
        }
        Ok(tasks)
    }

    /// Lists the sub-tasks of one task.
    ///
    /// # Errors
    /// Returns `DataKitError` if the listing fails.
    pub async fn list_sub_tasks(&self, task_id: &str) -> DataKitResult<Vec<MigrationTask>> {
        let path = format!("{SUB_TASKS_PATH}/{task_id}?pageNum=1&pageSize={TASK_PAGE_SIZE}");
        let response = self.gateway.get(ApiScope::Migration, &path).await?;
        response.ensure_success()?;
        response.decode("/rows")
    }

    /// Finds a task by exact name. With duplicate names the first listed wins.
    ///
    /// # Errors
    /// Returns `TaskNotFound` when no task has that name.
    pub async fn find_task(&self, task_name: &str) -> DataKitResult<MigrationTask> {
        self.list_tasks()
            .await?
            .into_iter()
            .find(|task| task.task_name == task_name)
            .ok_or_else(|| DataKitError::TaskNotFound {
                task_name: task_name.to_string(),
            })
    }

    /// Starts a task by name.
    ///
    /// # Errors
    /// Returns `TaskNotFound` without issuing the start call when the name is
    /// unknown, and `TaskStartRejected` when `DataKit` refuses the start.
    pub async fn start_task(&self, task_name: &str) -> DataKitResult<()> {
        let task = self.find_task(task_name).await?;
        let path = format!("{TASK_START_PATH}/{}", task.task_id);
        let response = self.gateway.post(ApiScope::Migration, &path).await?;

        match response.ensure_success() {
            Ok(()) => {
                info!(task_name, task_id = %task.task_id, "started migration task");
                Ok(())
            }
            Err(DataKitError::UpstreamRejected { reason, .. }) => {
                warn!(task_name, %reason, "migration task start rejected");
                Err(DataKitError::TaskStartRejected {
                    task_name: task_name.to_string(),
                    reason,
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn resolve_source(&self, ip: &str, port: &str, database: &str) -> DataKitResult<SourceEndpoint> {
        let invalid = || invalid_reference(EndpointSide::Source, ip, port, database);
        let endpoint = match self.find_source_endpoint(ip, port).await {
            Ok(endpoint) => endpoint,
            Err(DataKitError::EndpointNotFound { .. }) => return Err(invalid()),
            Err(err) => return Err(err),
        };
        let names = self.source_database_names(&endpoint).await?;
        if names.iter().any(|name| name == database) {
            Ok(endpoint)
        } else {
            Err(invalid())
        }
    }

    async fn resolve_target(&self, ip: &str, port: &str, database: &str) -> DataKitResult<TargetEndpoint> {
        let invalid = || invalid_reference(EndpointSide::Target, ip, port, database);
        let endpoint = match self.find_target_endpoint(ip, port).await {
            Ok(endpoint) => endpoint,
            Err(DataKitError::EndpointNotFound { .. }) => return Err(invalid()),
            Err(err) => return Err(err),
        };
        let names = self.target_database_names(&endpoint).await?;
        if names.iter().any(|name| name == database) {
            Ok(endpoint)
        } else {
            Err(invalid())
        }
    }
}

fn invalid_reference(side: EndpointSide, ip: &str, port: &str, database: &str) -> DataKitError {
    DataKitError::InvalidEndpointReference {
        side,
        ip: ip.to_string(),
        port: port.to_string(),
        database: database.to_string(),
    }
}
