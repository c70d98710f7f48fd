// Integration tests for tryapi
// Document -> form state -> request -> response against a local server

mod common;

use common::{petstore, petstore_console};
use mockito::Matcher;
use serde_json::json;
use tryapi_client::{ExecutionOutcome, ResponseFormat};
use tryapi_core::{AuthorizationInput, Credential, Credentials, Error, SerializeOptions};

#[tokio::test]
async fn test_list_pets_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/pets")
        .match_query(Matcher::UrlEncoded("limit".into(), "5".into()))
        .match_header("authorization", "Bearer t0k")
        .match_header("x-request-id", "abc")
        .match_header("accept", "*/*")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":1,"name":"Rex"}]"#)
        .create_async()
        .await;

    let console = petstore_console(&server.url());
    console
        .update_parameter("listPets", "limit", Some(json!(5)), None)
        .unwrap();
    console
        .update_parameter("listPets", "X-Request-Id", Some(json!("abc")), None)
        .unwrap();

    let outcome = console.execute("listPets").await.unwrap();
    mock.assert_async().await;

    let ExecutionOutcome::Completed(response) = outcome else {
        panic!("expected a completed execution");
    };
    assert_eq!(response.status_line(), "200 OK");
    assert_eq!(response.format, ResponseFormat::Json);
    assert_eq!(
        response.display_body(SerializeOptions::pretty(2)),
        "[\n  {\n    \"id\": 1,\n    \"name\": \"Rex\"\n  }\n]"
    );
    assert_eq!(console.response("listPets").unwrap(), Some(response));
}

#[tokio::test]
async fn test_error_status_is_cached_like_any_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/pets/99")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_header("content-type", "text/plain")
        .with_body("no such pet")
        .create_async()
        .await;

    let console = petstore_console(&server.url());
    console
        .update_parameter("getPet", "petId", Some(json!(99)), None)
        .unwrap();

    let ExecutionOutcome::Completed(response) = console.execute("getPet").await.unwrap() else {
        panic!("expected a completed execution");
    };
    assert!(!response.is_success());
    assert_eq!(response.format, ResponseFormat::Text);
    assert_eq!(response.body, "no such pet");

    console.clear_response("getPet").unwrap();
    assert!(console.response("getPet").unwrap().is_none());
}

#[tokio::test]
async fn test_example_body_sent_in_selected_media_type() {
    let mut server = mockito::Server::new_async().await;
    let form_mock = server
        .mock("POST", "/v1/pets")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body("name=Rex&tag=dog")
        .with_status(201)
        .create_async()
        .await;

    let console = petstore_console(&server.url());
    let selected = console.apply_example("createPet", None, 0).unwrap().unwrap();
    assert_eq!(selected.media_type, "application/json");
    assert_eq!(selected.example.label(0), "rex");
    assert_eq!(selected.example.summary.as_deref(), Some("A dog"));

    console
        .set_content_type(
            "createPet",
            Some("application/x-www-form-urlencoded".to_string()),
        )
        .unwrap();

    let ExecutionOutcome::Completed(response) = console.execute("createPet").await.unwrap() else {
        panic!("expected a completed execution");
    };
    form_mock.assert_async().await;
    assert_eq!(response.status, 201);
}

#[test]
fn test_operation_security_layers_over_global() {
    let console = petstore_console("https://petstore.example.com");
    console
        .update_parameter("getPet", "petId", Some(json!(7)), None)
        .unwrap();
    console
        .set_operation_authorization(
            "getPet",
            AuthorizationInput::with_alternative(0).credential("apiKey", Credential::token("k 1")),
        )
        .unwrap();

    let request = console.build_request("getPet").unwrap();
    assert_eq!(
        request.url.as_str(),
        "https://petstore.example.com/v1/pets/7?api_key=k+1"
    );
    assert_eq!(request.headers.get("Authorization"), Some("Bearer t0k"));
    assert_eq!(request.credentials, Credentials::SameOrigin);
}

#[test]
fn test_curl_reproduces_request() {
    let console = petstore_console("https://petstore.example.com");
    console
        .update_parameter("listPets", "limit", Some(json!(10)), None)
        .unwrap();

    assert_eq!(
        console.curl("listPets").unwrap(),
        "curl -X 'GET' \\\n\
         \t'https://petstore.example.com/v1/pets?limit=10' \\\n\
         \t-H 'Accept: */*' \\\n\
         \t-H 'Authorization: Bearer t0k'"
    );
}

#[test]
fn test_configuration_errors_leave_state_untouched() {
    let console = petstore_console("https://petstore.example.com");
    console
        .update_parameter("getPet", "petId", None, None)
        .unwrap();

    let err = console.build_request("getPet").unwrap_err();
    assert!(err.is_configuration_error());
    assert!(matches!(
        err,
        tryapi_client::ClientError::Build(Error::MissingParameterValue { ref name }) if name == "petId"
    ));
    assert_eq!(console.form("getPet").unwrap().parameter_value("petId"), None);
}

#[test]
fn test_document_shape() {
    let document = petstore();
    assert_eq!(document.default_server(), Some("https://petstore.example.com/v1"));
    assert_eq!(document.security.labels(), vec!["bearerAuth (http)"]);

    let ids: Vec<_> = document
        .operations
        .iter()
        .map(|operation| operation.operation_id.as_str())
        .collect();
    assert_eq!(ids, vec!["listPets", "createPet", "getPet", "get_health"]);

    let create = document.operation("createPet").unwrap();
    assert_eq!(
        create.request_content_types(),
        ["application/json", "application/x-www-form-urlencoded"]
    );
}
