#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use http::Method;
    use ocisdk_http::{
        PagingError, Paginator, RequestOptions, RetryPolicy, SdkError, list_all_items,
    };
    use ocisdk_model::TypeDescriptor;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::configured_client;

    fn list_options() -> RequestOptions {
        RequestOptions::builder()
            .response_type(TypeDescriptor::array(TypeDescriptor::model("Alarm")))
            .retry(RetryPolicy::NoRetry)
            .build()
    }

    async fn mount_page(server: &MockServer, page: Option<&str>, ids: &[&str], next: Option<&str>) {
        let body: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
        let mut template = ResponseTemplate::new(200).set_body_json(body);
        if let Some(next) = next {
            template = template.insert_header("opc-next-page", next);
        }
        let mock = Mock::given(method("GET")).and(path("/20180401/alarms"));
        let mock = match page {
            Some(page) => mock.and(query_param("page", page)),
            None => mock.and(query_param_is_missing("page")),
        };
        mock.respond_with(template).expect(1).mount(server).await;
    }

    #[tokio::test]
    async fn test_should_walk_pages_through_next_page_header() {
        let server = MockServer::start().await;
        mount_page(&server, None, &["a1", "a2"], Some("p2")).await;
        mount_page(&server, Some("p2"), &["a3"], Some("p3")).await;
        mount_page(&server, Some("p3"), &["a4"], None).await;

        let first = configured_client()
            .call(Method::GET, "/20180401/alarms", &server.uri(), list_options())
            .await
            .unwrap();
        assert_eq!(first.next_page(), Some("p2"));

        let pages: Vec<_> = Paginator::new(first).into_stream().collect().await;
        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn test_should_collect_items_of_every_page() {
        let server = MockServer::start().await;
        mount_page(&server, None, &["a1"], Some("p2")).await;
        mount_page(&server, Some("p2"), &["a2", "a3"], None).await;

        let first = configured_client()
            .call(Method::GET, "/20180401/alarms", &server.uri(), list_options())
            .await
            .unwrap();
        let items = list_all_items(first).await.unwrap();

        let ids: Vec<_> = items.iter().map(|v| v["id"].as_str().unwrap_or_default()).collect();
        assert_eq!(ids, ["a1", "a2", "a3"]);
    }

    #[tokio::test]
    async fn test_should_stop_when_service_repeats_token() {
        let server = MockServer::start().await;
        mount_page(&server, None, &["a1"], Some("same")).await;
        mount_page(&server, Some("same"), &["a2"], Some("same")).await;

        let first = configured_client()
            .call(Method::GET, "/20180401/alarms", &server.uri(), list_options())
            .await
            .unwrap();
        let mut pages = Paginator::new(first);

        assert!(pages.next_page().await.unwrap().is_ok());
        let err = pages.next_page().await.unwrap().unwrap_err();
        assert!(matches!(err, SdkError::Paging(PagingError::RepeatedToken(ref t)) if t == "same"));
        assert!(pages.next_page().await.is_none());
    }
}
