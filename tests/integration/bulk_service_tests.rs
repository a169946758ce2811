//! Bulk service integration tests
//!
//! Drives `BulkService` against the recording client and checks the requests
//! it issues, the results it returns and how failures are classified.

#[cfg(test)]
mod tests {
    use crate::common::{BatchResultAssertions, RecordingClient, TaskEntryFactory, fast_overrides};
    use clickup_bulk::{
        BatchOptions, BatchOverrides, BulkConfig, BulkError, BulkRequest, BulkService,
        HttpMethod, ListSelector, ResourceKind, SchedulerContext, progress_fn,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn entry(value: serde_json::Value) -> clickup_bulk::TaskEntry {
        TaskEntryFactory::from_json(value)
    }

    // ==================== Create ====================

    #[tokio::test]
    async fn test_create_many_tasks_in_default_list() {
        let client = RecordingClient::new().with_list("Backlog", "901").shared();
        let service = BulkService::new(client.clone());

        let result = service
            .execute(
                BulkRequest::Create {
                    tasks: TaskEntryFactory::named(25),
                    default_list: ListSelector::name("Backlog"),
                    team_id: None,
                },
                &BatchOverrides {
                    batch_size: Some(10),
                    ..fast_overrides()
                },
            )
            .await
            .unwrap();

        result.assert_complete();
        result.assert_counts(25, 0);
        assert!(client.paths().iter().all(|p| p == "/list/901/task"));

        // default list resolved once, outside the per-item loop
        let list_lookups = client
            .resolutions()
            .into_iter()
            .filter(|(kind, _, _)| *kind == ResourceKind::List)
            .count();
        assert_eq!(list_lookups, 1);
    }

    #[tokio::test]
    async fn test_create_payload_shape() {
        let client = RecordingClient::new().shared();
        let service = BulkService::new(client.clone());

        service
            .execute(
                BulkRequest::Create {
                    tasks: vec![entry(json!({
                        "name": "Release notes",
                        "description": "",
                        "markdownDescription": "# Notes",
                        "priority": 2,
                        "assignees": [183],
                        "startDate": 1700000000000u64,
                        "notifyAll": true,
                        "listId": "777"
                    }))],
                    default_list: ListSelector::default(),
                    team_id: Some(55),
                },
                &fast_overrides(),
            )
            .await
            .unwrap();

        let request = &client.requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.path, "/list/777/task");
        assert_eq!(request.team_id, Some(55));
        assert_eq!(
            request.body,
            Some(json!({
                "name": "Release notes",
                "markdown_description": "# Notes",
                "priority": 2,
                "assignees": [183],
                "start_date": 1700000000000u64,
                "notify_all": true
            }))
        );
        assert!(request.query.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_entry_stops_whole_request() {
        let client = RecordingClient::new().shared();
        let service = BulkService::new(client.clone());

        let mut tasks = TaskEntryFactory::named(5);
        tasks[3].remove("name");

        let err = service
            .execute(
                BulkRequest::Create {
                    tasks,
                    default_list: ListSelector::id("901"),
                    team_id: None,
                },
                &fast_overrides(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), "INVALID_PARAMETER");
        assert!(err.is_pre_dispatch());
        assert_eq!(client.call_count(), 0);
    }

    // ==================== Update / Move / Delete ====================

    #[tokio::test]
    async fn test_update_resolves_names_within_list() {
        let client = RecordingClient::new()
            .with_list("Sprint 12", "902")
            .with_task(Some("902"), "Fix login", "abc9876")
            .shared();
        let service = BulkService::new(client.clone());

        let result = service
            .execute(
                BulkRequest::Update {
                    tasks: vec![entry(json!({
                        "taskName": "Fix login",
                        "listName": "Sprint 12",
                        "status": "in review",
                        "tags": ["auth"]
                    }))],
                    team_id: None,
                },
                &fast_overrides(),
            )
            .await
            .unwrap();

        result.assert_counts(1, 0);
        let request = &client.requests()[0];
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.path, "/task/abc9876");
        assert_eq!(request.body, Some(json!({"status": "in review", "tags": ["auth"]})));

        let task_lookup = client
            .resolutions()
            .into_iter()
            .find(|(kind, _, _)| *kind == ResourceKind::Task)
            .unwrap();
        assert_eq!(task_lookup.2.list_id.as_deref(), Some("902"));
        assert_eq!(task_lookup.2.team_id, Some(1234));
    }

    #[tokio::test]
    async fn test_unknown_task_name_is_not_found() {
        let client = RecordingClient::new().shared();
        let service = BulkService::new(client.clone());

        let err = service
            .execute(
                BulkRequest::Delete {
                    tasks: vec![entry(json!({"task_name": "Ghost"}))],
                    team_id: None,
                },
                &fast_overrides(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(err.context()["lookup"]["task_name"], "Ghost");
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_move_with_custom_ids() {
        let client = RecordingClient::new().shared();
        let service = BulkService::new(client.clone());

        service
            .execute(
                BulkRequest::Move {
                    tasks: vec![
                        entry(json!({"custom_id": "OPS-1"})),
                        entry(json!({"taskId": "abc1234"})),
                    ],
                    target_list: ListSelector::id("990"),
                    team_id: Some(42),
                },
                &fast_overrides(),
            )
            .await
            .unwrap();

        let requests = client.requests();
        let custom = requests.iter().find(|r| r.path == "/task/OPS-1/move").unwrap();
        assert_eq!(custom.body, Some(json!({"list_id": "990"})));
        assert_eq!(custom.query["custom_task_ids"], "true");
        assert_eq!(custom.query["team_id"], "42");

        let standard = requests.iter().find(|r| r.path == "/task/abc1234/move").unwrap();
        assert!(standard.query.is_empty());
    }

    #[tokio::test]
    async fn test_oauth_delete_carries_team() {
        let client = RecordingClient::new().with_oauth().shared();
        let service = BulkService::new(client.clone());

        service
            .execute(
                BulkRequest::Delete {
                    tasks: TaskEntryFactory::by_id(&["abc1234"]),
                    team_id: None,
                },
                &fast_overrides(),
            )
            .await
            .unwrap();

        let request = &client.requests()[0];
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(request.body, None);
        assert_eq!(request.query["team_id"], "1234");
    }

    #[tokio::test]
    async fn test_missing_team_is_invalid_parameter() {
        let client = RecordingClient::new().without_default_team().shared();
        let service = BulkService::new(client);

        let err = service
            .execute(
                BulkRequest::Delete {
                    tasks: TaskEntryFactory::by_id(&["abc1234"]),
                    team_id: None,
                },
                &fast_overrides(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMETER");
    }

    // ==================== Retries and failures ====================

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let client = RecordingClient::new()
            .failing("/task/abc1234", 2)
            .shared();
        let service = BulkService::new(client.clone());

        let result = service
            .execute(
                BulkRequest::Delete {
                    tasks: TaskEntryFactory::by_id(&["abc1234", "def5678"]),
                    team_id: None,
                },
                &fast_overrides(),
            )
            .await
            .unwrap();

        result.assert_counts(2, 0);
        assert_eq!(client.call_count(), 4);
    }

    #[tokio::test]
    async fn test_exhausted_item_reported_with_entry() {
        let client = RecordingClient::new()
            .always_failing("/task/def5678")
            .shared();
        let service = BulkService::new(client.clone());

        let result = service
            .execute(
                BulkRequest::Delete {
                    tasks: TaskEntryFactory::by_id(&["abc1234", "def5678", "ghi9012"]),
                    team_id: None,
                },
                &BatchOverrides {
                    retry_count: Some(2),
                    ..fast_overrides()
                },
            )
            .await
            .unwrap();

        result.assert_complete();
        result.assert_counts(2, 1);
        let failure = &result.failed[0];
        assert_eq!(failure.index, 1);
        assert_eq!(failure.item["taskId"], "def5678");
        assert_eq!(failure.error, "Transport error: connection reset on /task/def5678");
        assert_eq!(client.call_count(), 5);

        let body = serde_json::to_value(&result).unwrap();
        assert_eq!(body["totals"], json!({"success": 2, "failure": 1, "total": 3}));
    }

    #[tokio::test]
    async fn test_abort_surfaces_partial_progress() {
        let client = RecordingClient::new()
            .always_failing("/task/def5678")
            .shared();
        let service = BulkService::new(client.clone());

        let err = service
            .execute(
                BulkRequest::Delete {
                    tasks: TaskEntryFactory::by_id(&["abc1234", "def5678", "ghi9012", "jkl3456"]),
                    team_id: None,
                },
                &BatchOverrides {
                    concurrency: Some(1),
                    retry_count: Some(0),
                    continue_on_error: Some(false),
                    ..fast_overrides()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BulkError::BatchAborted { .. }));
        let response = err.to_response();
        assert_eq!(response.code, "BATCH_ABORTED");
        assert_eq!(response.message, "Batch processing halted due to failure.");
        let context = response.context.unwrap();
        assert_eq!(context["totals"]["total"], 4);
        assert_eq!(context["failed"][0]["item"]["taskId"], "def5678");
        assert_eq!(client.call_count(), 2);
    }

    // ==================== Options and progress ====================

    #[tokio::test]
    async fn test_concurrency_override_bounds_client_calls() {
        let client = RecordingClient::new()
            .with_latency(Duration::from_millis(5))
            .shared();
        let service = BulkService::new(client.clone()).with_defaults(
            BatchOptions::new()
                .with_concurrency(8)
                .with_retry_delay(Duration::ZERO),
        );

        let ids: Vec<String> = (0..16).map(|n| format!("task{:04}", n)).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let result = service
            .execute(
                BulkRequest::Delete {
                    tasks: TaskEntryFactory::by_id(&id_refs),
                    team_id: None,
                },
                &BatchOverrides {
                    concurrency: Some(2),
                    ..BatchOverrides::default()
                },
            )
            .await
            .unwrap();

        result.assert_counts(16, 0);
        assert!(client.peak_concurrency() <= 2);
    }

    #[tokio::test]
    async fn test_progress_sink_sees_every_item() {
        let client = RecordingClient::new().shared();
        let service = BulkService::new(client);
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let sink = snapshots.clone();

        service
            .execute(
                BulkRequest::Create {
                    tasks: TaskEntryFactory::named(7),
                    default_list: ListSelector::id("901"),
                    team_id: None,
                },
                &BatchOverrides {
                    batch_size: Some(3),
                    progress: Some(progress_fn(move |s| sink.lock().unwrap().push(s))),
                    ..fast_overrides()
                },
            )
            .await
            .unwrap();

        let snapshots = snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 7);
        let last = snapshots.last().unwrap();
        assert_eq!((last.completed, last.success, last.total), (7, 7, 7));
    }

    #[test]
    fn test_service_from_config_in_sync_code() {
        let config = BulkConfig {
            batch_size: 2,
            concurrency: 1,
            retry_count: 0,
            retry_delay_secs: 0.0,
            ..BulkConfig::default()
        };
        let client = RecordingClient::new().shared();
        let service = BulkService::from_config(client.clone(), &config);
        assert_eq!(service.defaults().concurrency, 1);

        let result = service
            .update_bulk_tasks(
                vec![entry(json!({"id": "abc1234", "priority": 1}))],
                None,
                &BatchOverrides::default(),
            )
            .unwrap();
        result.assert_counts(1, 0);

        let result = service
            .execute_blocking(
                SchedulerContext::Detached,
                BulkRequest::Move {
                    tasks: TaskEntryFactory::by_id(&["abc1234"]),
                    target_list: ListSelector::id("1"),
                    team_id: None,
                },
                &BatchOverrides::default(),
            )
            .unwrap();
        result.assert_counts(1, 0);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_blocking_helpers_inside_runtime() {
        let client = RecordingClient::new().with_list("Done", "950").shared();
        let service = BulkService::new(client.clone());

        let result = service
            .move_bulk_tasks(
                TaskEntryFactory::by_id(&["abc1234", "def5678"]),
                ListSelector::name("Done"),
                None,
                &fast_overrides(),
            )
            .unwrap();
        result.assert_counts(2, 0);

        let result = service
            .delete_bulk_tasks(TaskEntryFactory::by_id(&["abc1234"]), None, &fast_overrides())
            .unwrap();
        result.assert_counts(1, 0);
        assert_eq!(client.call_count(), 3);
    }
}
