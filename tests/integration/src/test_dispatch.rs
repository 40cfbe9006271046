#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::Method;
    use ocisdk_http::{RequestOptions, RetryConfig, RetryPolicy, SdkError};
    use ocisdk_model::TypeDescriptor;
    use ocisdk_model::samples::Alarm;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::configured_client;

    fn no_retry() -> RequestOptions {
        RequestOptions::builder().retry(RetryPolicy::NoRetry).build()
    }

    fn quick_retry() -> RetryPolicy {
        RetryPolicy::Custom(
            RetryConfig::builder()
                .max_attempts(3)
                .base_sleep(Duration::from_millis(5))
                .max_sleep_between_attempts(Duration::from_millis(20))
                .build(),
        )
    }

    #[tokio::test]
    async fn test_should_dispatch_configured_client_and_decode_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/20180401/alarms"))
            .and(query_param("compartmentId", "ocid1.compartment.oc1..aaaa"))
            .and(header_exists("authorization"))
            .and(header_exists("user-agent"))
            .and(header_exists("opc-request-id"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("opc-request-id", "list-1")
                    .set_body_json(json!([
                        {"id": "ocid1.alarm.oc1..one", "displayName": "cpu", "lifecycleState": "ACTIVE"},
                        {"id": "ocid1.alarm.oc1..two", "isEnabled": false}
                    ])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let options = RequestOptions::builder()
            .query(ocisdk_http::QueryParams::new().scalar("compartmentId", "ocid1.compartment.oc1..aaaa"))
            .response_type(TypeDescriptor::array(TypeDescriptor::model("Alarm")))
            .build();
        let response = configured_client()
            .call(Method::GET, "/20180401/alarms", &server.uri(), options)
            .await
            .unwrap();

        assert_eq!(response.request_id(), Some("list-1"));
        let alarms: Vec<Alarm> = response.data_as().unwrap().unwrap();
        assert_eq!(alarms.len(), 2);
        assert_eq!(alarms[0].display_name.as_deref(), Some("cpu"));
        assert_eq!(alarms[1].is_enabled, Some(false));
    }

    #[tokio::test]
    async fn test_should_classify_service_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("opc-request-id", "missing")
                    .set_body_json(json!({
                        "code": "NotAuthorizedOrNotFound",
                        "message": "Authorization failed or requested resource not found"
                    })),
            )
            .mount(&server)
            .await;

        let err = configured_client()
            .call(Method::GET, "/20180401/alarms/x", &server.uri(), no_retry())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.service_code(), Some("NotAuthorizedOrNotFound"));
        let SdkError::Service { request_id, message, request, .. } = err else {
            panic!("expected a service error");
        };
        assert_eq!(request_id.as_deref(), Some("missing"));
        assert!(message.starts_with("Authorization failed"));
        assert!(request.to_string().contains("/20180401/alarms/x"));
    }

    #[tokio::test]
    async fn test_should_classify_proxy_pages_as_network_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = configured_client()
            .call(Method::GET, "/alarms", &server.uri(), no_retry())
            .await
            .unwrap_err();

        assert!(matches!(err, SdkError::Network { status: 502, timeout: false, .. }));
    }

    #[tokio::test]
    async fn test_should_report_unreachable_hosts_with_status_zero() {
        let err = configured_client()
            .call(Method::GET, "/alarms", "http://127.0.0.1:1", no_retry())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(0));
    }

    #[tokio::test]
    async fn test_should_retry_throttled_requests_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("opc-request-id", "throttled")
                    .set_body_json(json!({"code": "TooManyRequests", "message": "slow down"})),
            )
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a1"})))
            .expect(1)
            .mount(&server)
            .await;

        let options = RequestOptions::builder()
            .response_type(TypeDescriptor::model("Alarm"))
            .retry(quick_retry())
            .build();
        let response = configured_client()
            .call(Method::GET, "/alarms/a1", &server.uri(), options)
            .await
            .unwrap();

        let alarm: Alarm = response.data_as().unwrap().unwrap();
        assert_eq!(alarm.id, "a1");
    }

    #[tokio::test]
    async fn test_should_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .insert_header("opc-request-id", "bad")
                    .set_body_json(json!({"code": "InvalidParameter", "message": "nope"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let options = RequestOptions::builder().retry(quick_retry()).build();
        let err = configured_client()
            .call(Method::POST, "/alarms", &server.uri(), options)
            .await
            .unwrap_err();

        assert_eq!(err.service_code(), Some("InvalidParameter"));
    }

    #[tokio::test]
    async fn test_should_accept_uppercase_region_short_code() {
        let mut config = crate::test_config();
        config.region = Some("PHX".to_owned());

        let client = ocisdk_http::ApiClient::from_config(&config).unwrap();
        let endpoint = client.service_endpoint("iaas").await.unwrap();
        assert_eq!(endpoint, "https://iaas.us-phoenix-1.oraclecloud.com");
    }

    #[tokio::test]
    async fn test_should_reject_invalid_configuration_before_io() {
        let mut config = crate::test_config();
        config.fingerprint = Some("not-a-fingerprint".to_owned());

        let err = ocisdk_http::ApiClient::from_config(&config).unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }
}
