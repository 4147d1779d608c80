use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::schema::{HOST_INSTALL_STATUS_READY, MIGRATION_MODEL_ID, PASSWORD_MASK};

/// A MySQL database server registered in `DataKit` as a migration source.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SourceEndpoint {
    #[serde(rename = "clusterNodeId", default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ip: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub port: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub password: String,
    /// JDBC url used by `DataKit` to connect to the server.
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
}

impl SourceEndpoint {
    #[must_use]
    pub fn matches(&self, ip: &str, port: &str) -> bool {
        self.ip == ip && self.port == port
    }

    /// Returns a copy with the password replaced by the mask.
    #[must_use]
    pub fn redacted(mut self) -> Self {
        PASSWORD_MASK.clone_into(&mut self.password);
        self
    }
}

impl fmt::Debug for SourceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceEndpoint")
            .field("id", &self.id)
            .field("ip", &self.ip)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &PASSWORD_MASK)
            .field("url", &self.url)
            .finish()
    }
}

/// An openGauss database server registered in `DataKit` as a migration target.
///
/// The serialized form is also the request body of the target database-name
/// lookup, so field names follow the `DataKit` node representation.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TargetEndpoint {
    #[serde(rename = "nodeId", default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(rename = "publicIp", default, deserialize_with = "lenient_string")]
    pub ip: String,
    #[serde(rename = "dbPort", default, deserialize_with = "lenient_string")]
    pub port: String,
    #[serde(rename = "dbUser", default, deserialize_with = "lenient_string")]
    pub username: String,
    #[serde(rename = "dbUserPassword", default, deserialize_with = "lenient_string")]
    pub password: String,
    /// Database used for the initial connection.
    #[serde(rename = "dbName", default, deserialize_with = "lenient_string")]
    pub database_name: String,
    /// SSH port of the machine hosting the database.
    #[serde(rename = "hostPort", default, deserialize_with = "lenient_string")]
    pub host_port: String,
}

impl TargetEndpoint {
    #[must_use]
    pub fn matches(&self, ip: &str, port: &str) -> bool {
        self.ip == ip && self.port == port
    }

    /// Returns a copy with the password replaced by the mask.
    #[must_use]
    pub fn redacted(mut self) -> Self {
        PASSWORD_MASK.clone_into(&mut self.password);
        self
    }
}

impl fmt::Debug for TargetEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetEndpoint")
            .field("id", &self.id)
            .field("ip", &self.ip)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &PASSWORD_MASK)
            .field("database_name", &self.database_name)
            .field("host_port", &self.host_port)
            .finish()
    }
}

/// Grouping of endpoints as reported by `DataKit`. Only used while decoding.
pub trait Cluster {
    type Node;

    fn into_nodes(self) -> Vec<Self::Node>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCluster {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub cluster_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<SourceEndpoint>,
}

impl Cluster for SourceCluster {
    type Node = SourceEndpoint;

    fn into_nodes(self) -> Vec<SourceEndpoint> {
        self.nodes
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCluster {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub cluster_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub cluster_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cluster_nodes: Vec<TargetEndpoint>,
}

impl Cluster for TargetCluster {
    type Node = TargetEndpoint;

    fn into_nodes(self) -> Vec<TargetEndpoint> {
        self.cluster_nodes
    }
}

/// Flattens clusters into one ordered endpoint list, dropping the grouping.
pub fn flatten<C: Cluster>(clusters: impl IntoIterator<Item = C>) -> Vec<C::Node> {
    clusters.into_iter().flat_map(Cluster::into_nodes).collect()
}

/// `data` payload of the source cluster listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceClusterPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_clusters: Vec<SourceCluster>,
}

/// `data` payload of the target cluster listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetClusterPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_clusters: Vec<TargetCluster>,
}

/// One entry of the target database-name lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TargetDatabaseName {
    #[serde(default, deserialize_with = "lenient_string")]
    pub db_name: String,
    #[serde(rename = "isSelect", default)]
    pub selected: bool,
}

/// Entry of the execution host listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRecord {
    #[serde(default)]
    pub install_info: Option<InstallInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallInfo {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub install_status: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub run_host_id: Option<String>,
}

impl HostRecord {
    /// Returns the run host id when the host is installed and ready.
    #[must_use]
    pub fn ready_host_id(&self) -> Option<&str> {
        let info = self.install_info.as_ref()?;
        if info.install_status != Some(HOST_INSTALL_STATUS_READY) {
            return None;
        }
        info.run_host_id.as_deref()
    }
}

/// Execution status of a migration task as reported by `DataKit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    NotStarted,
    Running,
    Completed,
    /// A status code outside the three documented states.
    Other(i64),
}

impl TaskStatus {
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::NotStarted,
            1 => Self::Running,
            2 => Self::Completed,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::NotStarted => 0,
            Self::Running => 1,
            Self::Completed => 2,
            Self::Other(code) => code,
        }
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NotStarted => serializer.serialize_str("not_started"),
            Self::Running => serializer.serialize_str("running"),
            Self::Completed => serializer.serialize_str("completed"),
            Self::Other(code) => serializer.serialize_i64(*code),
        }
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(lenient_opt_i64(deserializer)?.map_or_else(Self::default, Self::from_code))
    }
}

/// Source and target coordinates of a migration (sub-)task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TaskCoordinates {
    #[serde(rename = "sourceDbHost", default, deserialize_with = "lenient_opt_string")]
    pub source_ip: Option<String>,
    #[serde(rename = "sourceDbPort", default, deserialize_with = "lenient_opt_string")]
    pub source_port: Option<String>,
    #[serde(rename = "sourceDb", default, deserialize_with = "lenient_opt_string")]
    pub source_database: Option<String>,
    #[serde(rename = "targetDbHost", default, deserialize_with = "lenient_opt_string")]
    pub target_ip: Option<String>,
    #[serde(rename = "targetDbPort", default, deserialize_with = "lenient_opt_string")]
    pub target_port: Option<String>,
    #[serde(rename = "targetDb", default, deserialize_with = "lenient_opt_string")]
    pub target_database: Option<String>,
}

/// A migration task, or one of its sub-tasks when read from a sub-task listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MigrationTask {
    #[serde(rename = "id", default, deserialize_with = "lenient_string")]
    pub task_id: String,
    #[serde(rename = "taskName", default, deserialize_with = "lenient_string")]
    pub task_name: String,
    #[serde(rename = "execStatus", default)]
    pub status: TaskStatus,
    #[serde(flatten)]
    pub coordinates: TaskCoordinates,
}

/// Sub-task descriptor embedded in a task submission.
#[derive(Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubTaskSpec {
    #[serde(rename = "isAdjustKernelParam")]
    pub adjust_kernel_param: bool,
    pub migration_model_id: i64,
    pub source_db: String,
    pub source_db_host: String,
    pub source_db_port: String,
    pub source_db_user: String,
    pub source_db_pass: String,
    pub source_node_id: String,
    pub target_db: String,
    pub target_db_host: String,
    pub target_db_port: String,
    pub target_db_user: String,
    pub target_db_pass: String,
    pub target_db_version: Option<String>,
    pub target_node_id: String,
    #[serde(rename = "isSystemAdmin")]
    pub system_admin: bool,
    /// Comma separated table filter; empty selects every table.
    pub source_tables: String,
    pub task_params: Vec<Value>,
}

impl SubTaskSpec {
    /// Builds a descriptor migrating `source_db` on `source` into `target_db`
    /// on `target`, with kernel tuning off and every table selected.
    #[must_use]
    pub fn new(
        source: &SourceEndpoint,
        source_db: &str,
        target: &TargetEndpoint,
        target_db: &str,
    ) -> Self {
        Self {
            adjust_kernel_param: false,
            migration_model_id: MIGRATION_MODEL_ID,
            source_db: source_db.to_string(),
            source_db_host: source.ip.clone(),
            source_db_port: source.port.clone(),
            source_db_user: source.username.clone(),
            source_db_pass: source.password.clone(),
            source_node_id: source.id.clone(),
            target_db: target_db.to_string(),
            target_db_host: target.ip.clone(),
            target_db_port: target.port.clone(),
            target_db_user: target.username.clone(),
            target_db_pass: target.password.clone(),
            target_db_version: None,
            target_node_id: target.id.clone(),
            system_admin: true,
            source_tables: String::new(),
            task_params: Vec::new(),
        }
    }
}

impl fmt::Debug for SubTaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubTaskSpec")
            .field("source_db", &self.source_db)
            .field("source_db_host", &self.source_db_host)
            .field("source_db_port", &self.source_db_port)
            .field("source_node_id", &self.source_node_id)
            .field("target_db", &self.target_db)
            .field("target_db_host", &self.target_db_host)
            .field("target_db_port", &self.target_db_port)
            .field("target_node_id", &self.target_node_id)
            .finish_non_exhaustive()
    }
}

/// Body of the task save call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSaveRequest {
    pub task_name: String,
    pub global_params: Vec<Value>,
    pub host_ids: Vec<String>,
    pub tasks: Vec<SubTaskSpec>,
}

/// Body of the login call. The password is already encrypted.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Accepts strings, numbers, booleans and null; null and missing become empty.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(Value::Number(value)) => Ok(Some(value.to_string())),
        Some(Value::Bool(value)) => Ok(Some(value.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

fn lenient_opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(value)) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected an integer, found {value}"))),
        Some(Value::String(value)) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected an integer, found {value:?}"))),
        Some(other) => Err(D::Error::custom(format!("expected an integer, found {other}"))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
