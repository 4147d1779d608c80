//! `DataKit` endpoint paths and protocol constants.

pub const LOGIN_PATH: &str = "/login";
pub const PLUGIN_BASE_PATH: &str = "/plugins/data-migration";

pub const RESOURCE_SCOPE: &str = "resource";
pub const MIGRATION_SCOPE: &str = "migration";

pub const SOURCE_CLUSTERS_PATH: &str = "/sourceClusters";
pub const TARGET_CLUSTERS_PATH: &str = "/targetClusters";
pub const SOURCE_CLUSTER_DBS_PATH: &str = "/getSourceClusterDbs";
pub const TARGET_CLUSTER_DBS_PATH: &str = "/getTargetClusterDbs";
pub const HOSTS_PATH: &str = "/getHosts";

pub const TASK_SAVE_PATH: &str = "/save";
pub const TASK_LIST_PATH: &str = "/list";
pub const SUB_TASKS_PATH: &str = "/subTasks";
pub const TASK_START_PATH: &str = "/start";

/// Logical success code carried in every response body.
pub const SUCCESS_CODE: i64 = 200;
/// Logical code `DataKit` reports when the bearer token is no longer accepted.
pub const UNAUTHORIZED_CODE: i64 = 401;

/// Install status of an execution host that can run migration sub-tasks.
pub const HOST_INSTALL_STATUS_READY: i64 = 2;

/// Page size used for task and sub-task listings.
pub const TASK_PAGE_SIZE: u32 = 100;

/// The only migration model `DataKit` offers for MySQL to openGauss.
pub const MIGRATION_MODEL_ID: i64 = 1;

/// Replacement for password fields returned to callers.
pub const PASSWORD_MASK: &str = "******";

/// Builds the name used when the caller does not supply one.
#[must_use]
pub fn default_task_name(source_db: &str, target_db: &str) -> String {
    format!("task_{source_db}_to_{target_db}")
}
