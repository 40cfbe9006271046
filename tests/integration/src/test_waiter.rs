#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::Method;
    use ocisdk_http::{
        CompositeOperation, RequestOptions, RetryPolicy, SdkError, WaitCondition, WaitOutcome,
        WaiterConfig, wait_until,
    };
    use ocisdk_model::TypeDescriptor;
    use ocisdk_model::samples::Alarm;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::configured_client;

    const ALARM_PATH: &str = "/20180401/alarms/ocid1.alarm.oc1..aaaa";

    fn fast(max_wait: Duration) -> WaiterConfig {
        WaiterConfig::builder()
            .initial_interval(Duration::from_millis(10))
            .max_interval(Duration::from_millis(20))
            .max_wait(max_wait)
            .build()
    }

    fn get_alarm() -> RequestOptions {
        RequestOptions::builder()
            .response_type(TypeDescriptor::model("Alarm"))
            .retry(RetryPolicy::NoRetry)
            .build()
    }

    async fn mount_state(server: &MockServer, state: &str, times: Option<u64>) {
        let mock = Mock::given(method("GET")).and(path(ALARM_PATH)).respond_with(
            ResponseTemplate::new(200)
                .insert_header("opc-request-id", state)
                .set_body_json(json!({"id": "ocid1.alarm.oc1..aaaa", "lifecycleState": state})),
        );
        match times {
            Some(n) => mock.up_to_n_times(n).mount(server).await,
            None => mock.mount(server).await,
        }
    }

    #[tokio::test]
    async fn test_should_wait_for_lifecycle_state() {
        let server = MockServer::start().await;
        mount_state(&server, "CREATING", Some(2)).await;
        mount_state(&server, "ACTIVE", None).await;

        let client = configured_client();
        let endpoint = server.uri();
        let outcome = wait_until(
            || client.call(Method::GET, ALARM_PATH, &endpoint, get_alarm()),
            &WaitCondition::field_equals("lifecycle_state", "ACTIVE"),
            &fast(Duration::from_secs(5)),
        )
        .await
        .unwrap();

        let response = outcome.response().unwrap();
        assert_eq!(response.request_id(), Some("ACTIVE"));
        let alarm: Alarm = response.data_as().unwrap().unwrap();
        assert_eq!(alarm.id, "ocid1.alarm.oc1..aaaa");
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_should_give_up_after_max_wait_with_last_response() {
        let server = MockServer::start().await;
        mount_state(&server, "CREATING", None).await;

        let client = configured_client();
        let endpoint = server.uri();
        let err = wait_until(
            || client.call(Method::GET, ALARM_PATH, &endpoint, get_alarm()),
            &WaitCondition::field_equals("lifecycleState", "ACTIVE"),
            &fast(Duration::from_millis(60)),
        )
        .await
        .unwrap_err();

        let SdkError::MaximumWaitTimeExceeded { last_response, .. } = err else {
            panic!("expected a timeout");
        };
        assert_eq!(last_response.unwrap().request_id(), Some("CREATING"));
    }

    #[tokio::test]
    async fn test_should_treat_not_found_as_deleted() {
        let server = MockServer::start().await;
        mount_state(&server, "DELETING", Some(1)).await;
        Mock::given(method("GET"))
            .and(path(ALARM_PATH))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("opc-request-id", "gone")
                    .set_body_json(json!({"code": "NotAuthorizedOrNotFound", "message": "gone"})),
            )
            .mount(&server)
            .await;

        let client = configured_client();
        let endpoint = server.uri();
        let config = WaiterConfig::builder()
            .initial_interval(Duration::from_millis(10))
            .max_wait(Duration::from_secs(5))
            .succeed_on_not_found(true)
            .build();
        let outcome = wait_until(
            || client.call(Method::GET, ALARM_PATH, &endpoint, get_alarm()),
            &WaitCondition::field_equals("lifecycle_state", "DELETED"),
            &config,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, WaitOutcome::NotFoundTreatedAsSuccess));
    }

    #[tokio::test]
    async fn test_should_delete_then_wait_for_work_request() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(ALARM_PATH))
            .respond_with(
                ResponseTemplate::new(204)
                    .insert_header("opc-request-id", "delete")
                    .insert_header("opc-work-request-id", "wr9"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/20180401/workRequests/wr9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "wr9", "status": "IN_PROGRESS", "percentComplete": 50.0
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/20180401/workRequests/wr9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "wr9", "status": "SUCCEEDED", "percentComplete": 100.0
            })))
            .mount(&server)
            .await;

        let client = configured_client();
        let endpoint = server.uri();
        let delete = client.call(
            Method::DELETE,
            ALARM_PATH,
            &endpoint,
            RequestOptions::builder().retry(RetryPolicy::NoRetry).build(),
        );
        let done = CompositeOperation::execute_and_wait_for_work_request(
            &client,
            delete,
            &endpoint,
            |id| format!("/20180401/workRequests/{id}"),
            &fast(Duration::from_secs(5)),
        )
        .await
        .unwrap();

        assert_eq!(done.initial.request_id(), Some("delete"));
        assert!(done.outcome.response().is_some());
    }
}
