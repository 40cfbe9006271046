#[cfg(test)]
mod tests {
    use http::Method;
    use ocisdk_auth::OperationSigningStrategy;
    use ocisdk_core::SigningStrategy;
    use ocisdk_http::{QueryParams, RequestBody, RequestOptions, Response, RetryPolicy};
    use ocisdk_model::TypeDescriptor;
    use serde_json::{Value, json};
    use wiremock::{Mock, MockServer};

    use crate::{VerifySignature, client_with_strategy};

    async fn verifying_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(VerifySignature::new())
            .mount(&server)
            .await;
        server
    }

    fn signed_headers(response: &Response) -> Vec<String> {
        let data = response
            .data()
            .and_then(|p| p.as_json())
            .cloned()
            .unwrap_or(Value::Null);
        serde_json::from_value(data["signedHeaders"].clone()).unwrap()
    }

    fn options() -> RequestOptions {
        RequestOptions::builder()
            .response_type(TypeDescriptor::Object)
            .retry(RetryPolicy::NoRetry)
            .build()
    }

    #[tokio::test]
    async fn test_should_verify_signed_get_with_query() {
        let server = verifying_server().await;
        let client = client_with_strategy(SigningStrategy::Standard);

        let options = RequestOptions::builder()
            .query(
                QueryParams::new()
                    .scalar("compartmentId", "ocid1.compartment.oc1..aaaa")
                    .scalar("displayName", "cpu alarm"),
            )
            .response_type(TypeDescriptor::Object)
            .retry(RetryPolicy::NoRetry)
            .build();
        let response = client
            .call(Method::GET, "/20180401/alarms", &server.uri(), options)
            .await
            .unwrap();

        assert_eq!(response.request_id(), Some("verified"));
        assert_eq!(signed_headers(&response), ["date", "(request-target)", "host"]);
    }

    #[tokio::test]
    async fn test_should_verify_signed_post_with_body_digest() {
        let server = verifying_server().await;
        let client = client_with_strategy(SigningStrategy::Standard);

        let mut options = options();
        options.body = RequestBody::Json(json!({"displayName": "cpu", "isEnabled": true}));
        let response = client
            .call(Method::POST, "/20180401/alarms", &server.uri(), options)
            .await
            .unwrap();

        assert_eq!(
            signed_headers(&response),
            [
                "date",
                "(request-target)",
                "host",
                "content-length",
                "content-type",
                "x-content-sha256"
            ]
        );
    }

    #[tokio::test]
    async fn test_should_leave_put_body_unsigned_for_object_storage() {
        let server = verifying_server().await;
        let client = client_with_strategy(SigningStrategy::ObjectStorage);

        let mut options = options();
        options.body = RequestBody::Text("hello".to_owned());
        let response = client
            .call(Method::PUT, "/n/ns/b/bucket/o/greeting.txt", &server.uri(), options)
            .await
            .unwrap();

        assert_eq!(signed_headers(&response), ["date", "(request-target)", "host"]);
    }

    #[tokio::test]
    async fn test_should_honor_exclude_body_operations() {
        let server = verifying_server().await;
        let client = client_with_strategy(SigningStrategy::Standard);

        let mut options = options();
        options.body = RequestBody::Bytes("payload".into());
        options.signing_strategy = OperationSigningStrategy::ExcludeBody;
        let response = client
            .call(Method::POST, "/upload", &server.uri(), options)
            .await
            .unwrap();

        assert_eq!(signed_headers(&response), ["date", "(request-target)", "host"]);
    }
}
