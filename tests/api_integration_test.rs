//! Integration tests for the Api facade against a mock services server

use ambra_sdk::domain::{AmbraError, ServiceErrorKind};
use ambra_sdk::service::{Field, StudyLocator};
use ambra_sdk::Api;
use futures::TryStreamExt;
use mockito::Matcher;
use serde_json::json;

fn page(number: usize) -> Matcher {
    Matcher::UrlEncoded("page.number".into(), number.to_string())
}

#[tokio::test]
async fn test_list_pages_until_short_page() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("POST", "/study/list")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("sid".into(), "sid-1".into()),
            Matcher::UrlEncoded("page.rows".into(), "2".into()),
            page(1),
        ]))
        .with_body(json!({"status": "OK", "studies": [{"uuid": "s1"}, {"uuid": "s2"}], "page": {"more": 1}}).to_string())
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("POST", "/study/list")
        .match_body(page(2))
        .with_body(json!({"status": "OK", "studies": [{"uuid": "s3"}], "page": {"more": 0}}).to_string())
        .expect(1)
        .create_async()
        .await;

    let api = Api::with_sid(server.url(), "sid-1").unwrap();
    let studies = api.study().list().rows(2).all().await.unwrap();

    let uuids: Vec<_> = studies.iter().map(|s| s["uuid"].as_str().unwrap()).collect();
    assert_eq!(uuids, vec!["s1", "s2", "s3"]);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_max_results_stops_paging() {
    let mut server = mockito::Server::new_async().await;
    let list = server
        .mock("POST", "/study/list")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page.rows".into(), "2".into()),
            page(1),
        ]))
        .with_body(json!({"status": "OK", "studies": [{"uuid": "s1"}, {"uuid": "s2"}]}).to_string())
        .expect(1)
        .create_async()
        .await;

    let api = Api::with_sid(server.url(), "sid-1").unwrap();
    let studies = api.study().list().max_results(2).all().await.unwrap();

    assert_eq!(studies.len(), 2);
    list.assert_async().await;
}

#[tokio::test]
async fn test_filters_and_sorting_are_sent() {
    let mut server = mockito::Server::new_async().await;
    let list = server
        .mock("POST", "/study/list")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("filter.patient_name.like".into(), "%DOE%".into()),
            Matcher::UrlEncoded("sort_by".into(), "created-desc".into()),
        ]))
        .with_body(json!({"status": "OK", "studies": []}).to_string())
        .create_async()
        .await;

    let api = Api::with_sid(server.url(), "sid-1").unwrap();
    let studies: Vec<_> = api
        .study()
        .list()
        .filter_by(Field::new("patient_name").like("%DOE%"))
        .sort_by(Field::new("created").desc())
        .stream()
        .try_collect()
        .await
        .unwrap();

    assert!(studies.is_empty());
    list.assert_async().await;
}

#[tokio::test]
async fn test_documented_error_description() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/study/delete")
        .with_status(412)
        .with_body(json!({"status": "ERROR", "error_type": "LOCKED"}).to_string())
        .create_async()
        .await;

    let api = Api::with_sid(server.url(), "sid-1").unwrap();
    let err = api.study().delete("s1").get().await.unwrap_err();

    let AmbraError::Service(service) = err else {
        panic!("expected a service error, got {err:?}");
    };
    assert_eq!(service.kind, ServiceErrorKind::PreconditionFailed);
    assert!(service.is("LOCKED"));
    assert_eq!(service.description.as_deref(), Some("The study is locked"));
}

#[tokio::test]
async fn test_storage_base_derived_from_services_url() {
    let mut server = mockito::Server::new_async().await;
    let schema = server
        .mock("GET", "/api/v3/storage/study/ns-1/1.2.3/schema")
        .match_query(Matcher::UrlEncoded("sid".into(), "sid-1".into()))
        .with_body(json!({"series": []}).to_string())
        .create_async()
        .await;

    let api = Api::with_sid(format!("{}/api/v3", server.url()), "sid-1").unwrap();
    let body = api
        .storage()
        .study_schema(&StudyLocator::new("ns-1", "1.2.3"))
        .await
        .unwrap();

    assert_eq!(body["series"], json!([]));
    schema.assert_async().await;
}

#[tokio::test]
async fn test_login_then_logout() {
    let mut server = mockito::Server::new_async().await;
    let login = server
        .mock("POST", "/session/login")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("login".into(), "me@example.com".into()),
            Matcher::UrlEncoded("password".into(), "pw".into()),
        ]))
        .with_body(json!({"status": "OK", "sid": "sid-7"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let user = server
        .mock("POST", "/session/user")
        .match_body(Matcher::UrlEncoded("sid".into(), "sid-7".into()))
        .with_body(json!({"status": "OK", "email": "me@example.com"}).to_string())
        .create_async()
        .await;
    let logout = server
        .mock("POST", "/session/logout")
        .match_body(Matcher::UrlEncoded("sid".into(), "sid-7".into()))
        .with_body(json!({"status": "OK"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let api = Api::with_creds(server.url(), "me@example.com", "pw").unwrap();
    let me = api.session().user().get().await.unwrap();
    assert_eq!(me["email"], "me@example.com");
    api.logout().await.unwrap();

    login.assert_async().await;
    user.assert_async().await;
    logout.assert_async().await;
}
