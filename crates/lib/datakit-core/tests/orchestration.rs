use datakit_core::{
    CreateTaskRequest,
    Credential,
    DataKitError,
    EndpointSide,
    Gateway,
    MigrationControlPlane,
    SessionConfig,
};
use datakit_model::{TaskCoordinates, TaskStatus};
use datakit_model::schema::PASSWORD_MASK;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method, path, path_regex, query_param};
use reqwest::Client;
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";
const BEARER: &str = "Bearer test-token";

fn resource(endpoint: &str) -> String {
    format!("/plugins/data-migration/resource{endpoint}")
}

fn migration(endpoint: &str) -> String {
    format!("/plugins/data-migration/migration{endpoint}")
}

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"code": 200, "msg": "success", "data": data}))
}

fn rows(rows: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"code": 200, "msg": "success", "rows": rows}))
}

async fn connect(server: &MockServer) -> MigrationControlPlane {
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("\"username\":\"admin\""))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 200, "msg": "ok", "token": TOKEN})),
        )
        .mount(server)
        .await;

    MigrationControlPlane::connect(&SessionConfig::new(server.uri(), "admin", "Datakit@123"))
        .await
        .expect("login should succeed")
}

/// Two MySQL servers on one host (ports 3306 and 3307) and two openGauss
/// servers on another (ports 5432 and 5433).
async fn mount_inventory(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(resource("/sourceClusters")))
        .and(header("authorization", BEARER))
        .respond_with(ok(json!({
            "sourceClusters": [
                {"clusterId": "c1", "name": "alpha", "nodes": [{
                    "clusterNodeId": "s-alpha",
                    "ip": "10.0.0.1",
                    "port": "3306",
                    "username": "alpha",
                    "password": "alpha-pass",
                    "url": "jdbc:mysql://10.0.0.1:3306"
                }]},
                {"clusterId": "c2", "name": "beta", "nodes": [{
                    "clusterNodeId": "s-beta",
                    "ip": "10.0.0.1",
                    "port": 3307,
                    "username": "beta",
                    "password": "beta-pass",
                    "url": "jdbc:mysql://10.0.0.1:3307"
                }]}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(resource("/targetClusters")))
        .and(header("authorization", BEARER))
        .respond_with(ok(json!({
            "targetClusters": [
                {"clusterId": "g1", "clusterName": "gauss", "clusterNodes": [{
                    "nodeId": "t-gauss",
                    "publicIp": "10.0.0.2",
                    "dbPort": "5432",
                    "dbUser": "gaussdb",
                    "dbUserPassword": "gauss-pass",
                    "dbName": "postgres",
                    "hostPort": "22"
                }, {
                    "nodeId": "t-gauss-b",
                    "publicIp": "10.0.0.2",
                    "dbPort": 5433,
                    "dbUser": "gaussdb",
                    "dbUserPassword": "gauss-b-pass",
                    "dbName": "postgres",
                    "hostPort": "22"
                }]}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(resource("/getSourceClusterDbs")))
        .and(body_string_contains("username=alpha"))
        .respond_with(ok(json!(["sales", "inventory"])))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(resource("/getSourceClusterDbs")))
        .and(body_string_contains("username=beta"))
        .respond_with(ok(json!(["billing"])))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(resource("/getTargetClusterDbs")))
        .and(body_string_contains("\"nodeId\":\"t-gauss\""))
        .respond_with(ok(json!([
            {"dbName": "postgres", "isSelect": false},
            {"dbName": "sales_gauss", "isSelect": false}
        ])))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(resource("/getTargetClusterDbs")))
        .and(body_string_contains("\"nodeId\":\"t-gauss-b\""))
        .respond_with(ok(json!([{"dbName": "archive", "isSelect": false}])))
        .mount(server)
        .await;
}

async fn mount_hosts(server: &MockServer, hosts: Value) {
    Mock::given(method("GET"))
        .and(path(resource("/getHosts")))
        .respond_with(ok(hosts))
        .mount(server)
        .await;
}

async fn mount_save(server: &MockServer, response: ResponseTemplate, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(migration("/save")))
        .and(header("authorization", BEARER))
        .respond_with(response)
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_tasks(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(migration("/list")))
        .and(query_param("pageNum", "1"))
        .and(query_param("pageSize", "100"))
        .respond_with(rows(json!([
            {"id": 7, "taskName": "nightly", "execStatus": 0},
            {"id": 8, "taskName": "draft", "execStatus": 2},
            {"id": 9, "taskName": "nightly", "execStatus": 1}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(migration("/subTasks/7")))
        .and(query_param("pageSize", "100"))
        .respond_with(rows(json!([
            {"id": 70, "sourceDbHost": "10.0.0.1", "sourceDbPort": "3306", "sourceDb": "sales",
             "targetDbHost": "10.0.0.2", "targetDbPort": "5432", "targetDb": "sales_gauss"},
            {"id": 71, "sourceDbHost": "10.0.0.9", "sourceDbPort": "3306", "sourceDb": "other",
             "targetDbHost": "10.0.0.9", "targetDbPort": "5432", "targetDb": "other"}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(migration("/subTasks/8")))
        .respond_with(rows(json!([])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(migration("/subTasks/9")))
        .respond_with(rows(Value::Null))
        .mount(server)
        .await;
}

fn sales_request(task_name: Option<&str>) -> CreateTaskRequest {
    CreateTaskRequest {
        source_ip: "10.0.0.1".to_string(),
        source_port: "3306".to_string(),
        source_db: "sales".to_string(),
        target_ip: "10.0.0.2".to_string(),
        target_port: "5432".to_string(),
        target_db: "sales_gauss".to_string(),
        task_name: task_name.map(str::to_string),
    }
}

async fn saved_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("request recording should be enabled")
        .into_iter()
        .filter(|request| request.url.path() == migration("/save"))
        .map(|request| serde_json::from_slice(&request.body).expect("save body should be JSON"))
        .collect()
}

#[tokio::test]
async fn rejected_login_names_the_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 500, "msg": "bad credentials"})),
        )
        .mount(&server)
        .await;

    let err = MigrationControlPlane::connect(&SessionConfig::new(server.uri(), "admin", "wrong"))
        .await
        .expect_err("login should be rejected");
    assert!(matches!(err, DataKitError::AuthenticationFailed { ref username } if username == "admin"));
    assert!(err.to_string().contains("admin"));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let err = MigrationControlPlane::connect(&SessionConfig::new("http://127.0.0.1:1", "admin", "pw"))
        .await
        .expect_err("nothing listens on port 1");
    assert!(matches!(err, DataKitError::ServiceUnreachable { .. }), "got {err:?}");
    assert!(err.is_transport());
}

#[tokio::test]
async fn unreachable_service_after_login_is_a_transport_error() {
    let credential = Credential::bearer("t").expect("token should be a header value");
    let control = MigrationControlPlane::new(Gateway::new(Client::new(), "http://127.0.0.1:1", credential));

    let err = control.list_tasks().await.expect_err("nothing listens on port 1");
    assert!(matches!(err, DataKitError::ServiceUnreachable { .. }), "got {err:?}");
}

#[tokio::test]
async fn login_sends_an_encrypted_password() {
    let server = MockServer::start().await;
    let _control = connect(&server).await;

    let requests = server
        .received_requests()
        .await
        .expect("request recording should be enabled");
    let body: Value = serde_json::from_slice(&requests[0].body).expect("login body should be JSON");
    let password = body["password"].as_str().expect("password should be a string");
    assert_ne!(password, "Datakit@123");
    assert_eq!(password.len(), 172, "base64 of one 1024-bit RSA block");
}

#[tokio::test]
async fn database_listings_mask_passwords() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_inventory(&server).await;

    let sources = control
        .list_source_databases()
        .await
        .expect("source listing should succeed");
    assert_eq!(sources.len(), 2);
    assert!(sources.iter().all(|endpoint| endpoint.password == PASSWORD_MASK));
    assert_eq!(sources[1].port, "3307");

    let targets = control
        .list_target_databases()
        .await
        .expect("target listing should succeed");
    assert_eq!(targets.len(), 2);
    assert!(targets.iter().all(|endpoint| endpoint.password == PASSWORD_MASK));
    assert_eq!(targets[0].database_name, "postgres");
    assert_eq!(targets[1].port, "5433");
}

#[tokio::test]
async fn database_names_resolve_the_exact_endpoint() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_inventory(&server).await;

    let alpha = control
        .list_source_database_names("10.0.0.1", "3306")
        .await
        .expect("alpha lookup should succeed");
    assert_eq!(alpha, ["sales", "inventory"]);

    let beta = control
        .list_source_database_names("10.0.0.1", "3307")
        .await
        .expect("beta lookup should succeed");
    assert_eq!(beta, ["billing"]);

    let err = control
        .list_source_database_names("10.0.0.1", "3308")
        .await
        .expect_err("unknown port should not resolve");
    assert!(matches!(
        err,
        DataKitError::EndpointNotFound { side: EndpointSide::Source, ref port, .. } if port == "3308"
    ));

    let target = control
        .list_target_database_names("10.0.0.2", "5432")
        .await
        .expect("target lookup should succeed");
    assert_eq!(target, ["postgres", "sales_gauss"]);

    let other = control
        .list_target_database_names("10.0.0.2", "5433")
        .await
        .expect("second target lookup should succeed");
    assert_eq!(other, ["archive"]);

    let err = control
        .list_target_database_names("10.0.0.1", "5432")
        .await
        .expect_err("source ip is not a target");
    assert!(matches!(err, DataKitError::EndpointNotFound { side: EndpointSide::Target, .. }));
}

#[tokio::test]
async fn rejected_name_lookup_is_an_upstream_rejection() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_inventory(&server).await;
    Mock::given(method("POST"))
        .and(path(resource("/getSourceClusterDbs")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": 500, "msg": "Access denied for user 'alpha'"})),
        )
        .with_priority(1)
        .mount(&server)
        .await;

    let err = control
        .list_source_database_names("10.0.0.1", "3306")
        .await
        .expect_err("lookup should be rejected");
    assert!(matches!(
        err,
        DataKitError::UpstreamRejected { code: 500, ref reason, .. } if reason.contains("Access denied")
    ));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn create_task_submits_default_name_and_ready_hosts() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_inventory(&server).await;
    mount_hosts(
        &server,
        json!([
            {"hostId": "a", "installInfo": {"installStatus": 2, "runHostId": "h1"}},
            {"hostId": "b", "installInfo": {"installStatus": 1, "runHostId": "h2"}},
            {"hostId": "c", "installInfo": null}
        ]),
    )
    .await;
    mount_save(&server, ok(Value::Null), 1).await;

    let task_name = control
        .create_task(sales_request(None))
        .await
        .expect("task creation should succeed");
    assert_eq!(task_name, "task_sales_to_sales_gauss");

    let bodies = saved_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["taskName"], "task_sales_to_sales_gauss");
    assert_eq!(body["globalParams"], json!([]));
    assert_eq!(body["hostIds"], json!(["h1"]));

    let task = &body["tasks"][0];
    assert_eq!(task["sourceDb"], "sales");
    assert_eq!(task["sourceDbHost"], "10.0.0.1");
    assert_eq!(task["sourceDbPort"], "3306");
    assert_eq!(task["sourceDbUser"], "alpha");
    assert_eq!(task["sourceDbPass"], "alpha-pass");
    assert_eq!(task["sourceNodeId"], "s-alpha");
    assert_eq!(task["targetDb"], "sales_gauss");
    assert_eq!(task["targetDbUser"], "gaussdb");
    assert_eq!(task["targetDbPass"], "gauss-pass");
    assert_eq!(task["targetNodeId"], "t-gauss");
    assert_eq!(task["isAdjustKernelParam"], false);
    assert_eq!(task["migrationModelId"], 1);
}

#[tokio::test]
async fn create_task_keeps_caller_name() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_inventory(&server).await;
    mount_hosts(&server, json!([{"installInfo": {"installStatus": 2, "runHostId": "h1"}}])).await;
    mount_save(&server, ok(Value::Null), 1).await;

    let task_name = control
        .create_task(sales_request(Some("sales-nightly")))
        .await
        .expect("task creation should succeed");
    assert_eq!(task_name, "sales-nightly");
    assert_eq!(saved_bodies(&server).await[0]["taskName"], "sales-nightly");
}

#[tokio::test]
async fn create_task_rejects_missing_source_database_without_saving() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_inventory(&server).await;
    mount_hosts(&server, json!([{"installInfo": {"installStatus": 2, "runHostId": "h1"}}])).await;
    mount_save(&server, ok(Value::Null), 0).await;

    let mut request = sales_request(None);
    request.source_db = "missing".to_string();
    let err = control
        .create_task(request)
        .await
        .expect_err("unknown source database should fail");
    assert!(matches!(
        err,
        DataKitError::InvalidEndpointReference { side: EndpointSide::Source, ref database, .. }
            if database == "missing"
    ));
}

#[tokio::test]
async fn create_task_rejects_unknown_source_endpoint_without_saving() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_inventory(&server).await;
    mount_hosts(&server, json!([{"installInfo": {"installStatus": 2, "runHostId": "h1"}}])).await;
    mount_save(&server, ok(Value::Null), 0).await;

    let mut request = sales_request(None);
    request.source_port = "9999".to_string();
    let err = control
        .create_task(request)
        .await
        .expect_err("unknown source endpoint should fail");
    assert!(matches!(
        err,
        DataKitError::InvalidEndpointReference { side: EndpointSide::Source, ref port, .. }
            if port == "9999"
    ));
}

#[tokio::test]
async fn create_task_rejects_missing_target_database_without_saving() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_inventory(&server).await;
    mount_hosts(&server, json!([{"installInfo": {"installStatus": 2, "runHostId": "h1"}}])).await;
    mount_save(&server, ok(Value::Null), 0).await;

    let mut request = sales_request(None);
    request.target_db = "nope".to_string();
    let err = control
        .create_task(request)
        .await
        .expect_err("unknown target database should fail");
    assert!(matches!(
        err,
        DataKitError::InvalidEndpointReference { side: EndpointSide::Target, ref database, .. }
            if database == "nope"
    ));
    assert_eq!(
        err.to_string(),
        "target database nope at 10.0.0.2:5432 does not exist; make sure the database exists"
    );
}

#[tokio::test]
async fn create_task_rejects_unknown_target_endpoint_without_saving() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_inventory(&server).await;
    mount_hosts(&server, json!([{"installInfo": {"installStatus": 2, "runHostId": "h1"}}])).await;
    mount_save(&server, ok(Value::Null), 0).await;

    let mut request = sales_request(None);
    request.target_port = "15432".to_string();
    let err = control
        .create_task(request)
        .await
        .expect_err("unknown target endpoint should fail");
    assert!(matches!(
        err,
        DataKitError::InvalidEndpointReference { side: EndpointSide::Target, ref port, .. }
            if port == "15432"
    ));
}

#[tokio::test]
async fn create_task_requires_a_ready_host() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_inventory(&server).await;
    mount_hosts(&server, json!([{"installInfo": {"installStatus": 1, "runHostId": "h1"}}])).await;
    mount_save(&server, ok(Value::Null), 0).await;

    let err = control
        .create_task(sales_request(None))
        .await
        .expect_err("no ready host should fail");
    assert!(matches!(err, DataKitError::NoEligibleHosts));
}

#[tokio::test]
async fn create_task_surfaces_upstream_reason() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_inventory(&server).await;
    mount_hosts(&server, json!([{"installInfo": {"installStatus": 2, "runHostId": "h1"}}])).await;
    mount_save(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"code": 500, "data": "task name already exists"})),
        1,
    )
    .await;

    let err = control
        .create_task(sales_request(None))
        .await
        .expect_err("save should be rejected");
    assert!(matches!(
        err,
        DataKitError::TaskCreationRejected { ref reason, .. } if reason == "task name already exists"
    ));
    assert!(err.to_string().contains("task name already exists"));
}

#[tokio::test]
async fn list_tasks_merges_first_sub_task() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_tasks(&server).await;

    let tasks = control.list_tasks().await.expect("task listing should succeed");
    assert_eq!(tasks.len(), 3);

    let nightly = &tasks[0];
    assert_eq!(nightly.task_id, "7");
    assert_eq!(nightly.status, TaskStatus::NotStarted);
    assert_eq!(nightly.coordinates.source_ip.as_deref(), Some("10.0.0.1"));
    assert_eq!(nightly.coordinates.source_database.as_deref(), Some("sales"));
    assert_eq!(nightly.coordinates.target_port.as_deref(), Some("5432"));
    assert_eq!(nightly.coordinates.target_database.as_deref(), Some("sales_gauss"));

    let draft = &tasks[1];
    assert_eq!(draft.status, TaskStatus::Completed);
    assert_eq!(draft.coordinates, TaskCoordinates::default());
    assert_eq!(tasks[2].coordinates, TaskCoordinates::default());
}

#[tokio::test]
async fn start_unknown_task_does_not_call_start() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_tasks(&server).await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/plugins/data-migration/migration/start/.*$"))
        .respond_with(ok(Value::Null))
        .expect(0)
        .mount(&server)
        .await;

    let err = control
        .start_task("nonexistent")
        .await
        .expect_err("unknown task should fail");
    assert!(matches!(err, DataKitError::TaskNotFound { ref task_name } if task_name == "nonexistent"));
}

#[tokio::test]
async fn start_task_uses_first_matching_task_id() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_tasks(&server).await;
    Mock::given(method("POST"))
        .and(path(migration("/start/7")))
        .and(header("authorization", BEARER))
        .respond_with(ok(Value::Null))
        .expect(1)
        .mount(&server)
        .await;

    control
        .start_task("nightly")
        .await
        .expect("start should succeed");
}

#[tokio::test]
async fn start_task_surfaces_upstream_reason() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    mount_tasks(&server).await;
    Mock::given(method("POST"))
        .and(path(migration("/start/8")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 500, "data": "task already finished"})),
        )
        .mount(&server)
        .await;

    let err = control
        .start_task("draft")
        .await
        .expect_err("start should be rejected");
    assert!(matches!(
        err,
        DataKitError::TaskStartRejected { ref task_name, ref reason }
            if task_name == "draft" && reason == "task already finished"
    ));
}

#[tokio::test]
async fn expired_token_is_reported_as_session_expiry() {
    let server = MockServer::start().await;
    let control = connect(&server).await;
    Mock::given(method("GET"))
        .and(path(migration("/list")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 401, "msg": "token expired"})),
        )
        .mount(&server)
        .await;

    let err = control.list_tasks().await.expect_err("expired token should fail");
    assert!(matches!(err, DataKitError::SessionExpired { ref reason } if reason == "token expired"));
}
