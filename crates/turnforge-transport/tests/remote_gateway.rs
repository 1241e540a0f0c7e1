//! RemoteGateway exercised against a scripted host API.

use std::sync::Mutex;

use turnforge_protocol::{FetchResponse, SendRequest, PAYLOAD_SIZE_LIMIT_BYTES};
use turnforge_transport::{
    ApiRequest, ApiResponse, ParticipantRef, RemoteApi, RemoteGateway, RemoteStatus,
    TransportError, TurnGateway,
};

/// Records every request and answers from a fixed script.
struct ScriptedHost {
    requests: Mutex<Vec<ApiRequest>>,
    responses: Mutex<Vec<ApiResponse>>,
}

impl ScriptedHost {
    fn new(responses: Vec<ApiResponse>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses),
        }
    }
}

impl RemoteApi for &'static ScriptedHost {
    async fn perform(&self, request: ApiRequest) -> ApiResponse {
        self.requests.lock().unwrap().push(request);
        self.responses.lock().unwrap().remove(0)
    }
}

fn host(responses: Vec<ApiResponse>) -> &'static ScriptedHost {
    Box::leak(Box::new(ScriptedHost::new(responses)))
}

fn fetch_body(associated_data: Option<&str>) -> String {
    serde_json::to_string(&FetchResponse {
        associated_data: associated_data.map(str::to_string),
        current_user_display_name: Some("alice".into()),
        other_user_display_name: Some("bob".into()),
    })
    .unwrap()
}

fn outbound(data: &str) -> SendRequest {
    SendRequest {
        score: Some(7.0),
        associated_data: data.to_string(),
        tappables: vec![],
        is_complete: true,
    }
}

#[tokio::test]
async fn test_fetch_hits_get_endpoint_and_decodes_body() {
    let host = host(vec![ApiResponse {
        status_code: 1,
        body: fetch_body(Some(r#"{"turnCount": 3}"#)),
        users: vec![ParticipantRef("user-resource-1".into())],
    }]);
    let gateway = RemoteGateway::new(host).with_tapped_key(Some("attack".into()));

    let inbound = gateway.fetch_inbound().await.unwrap();
    assert_eq!(inbound.associated_data.as_deref(), Some(r#"{"turnCount": 3}"#));
    assert_eq!(inbound.other_user, Some(ParticipantRef("user-resource-1".into())));
    assert_eq!(inbound.tapped_key.as_deref(), Some("attack"));

    let requests = host.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].endpoint, "get_prompt_data");
}

#[tokio::test]
async fn test_fetch_failure_degrades_to_no_prior_data() {
    // A failed fetch starts the game fresh instead of erroring out.
    let gateway = RemoteGateway::new(host(vec![ApiResponse::failed(6)]));
    let inbound = gateway.fetch_inbound().await.unwrap();
    assert!(inbound.associated_data.is_none());
    assert!(inbound.other_user.is_none());
}

#[tokio::test]
async fn test_fetch_malformed_body_degrades_to_no_prior_data() {
    let gateway = RemoteGateway::new(host(vec![ApiResponse::ok("not json")]));
    let inbound = gateway.fetch_inbound().await.unwrap();
    assert!(inbound.associated_data.is_none());
}

#[tokio::test]
async fn test_send_hits_set_endpoint_with_request_body() {
    let host = host(vec![ApiResponse::ok("")]);
    let gateway = RemoteGateway::new(host);

    gateway.try_send(&outbound(r#"{"turnCount": 0}"#)).await.unwrap();

    let requests = host.requests.lock().unwrap();
    assert_eq!(requests[0].endpoint, "set_prompt_data");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["score"], 7.0);
    assert_eq!(body["isComplete"], true);
    assert_eq!(body["associatedData"], r#"{"turnCount": 0}"#);
}

#[tokio::test]
async fn test_send_maps_host_status_to_error() {
    let gateway = RemoteGateway::new(host(vec![ApiResponse::failed(4)]));
    let err = gateway.try_send(&outbound("{}")).await.unwrap_err();
    match err {
        TransportError::Remote { status, .. } => assert_eq!(status, RemoteStatus::AccessDenied),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_oversized_send_is_refused_before_any_network_call() {
    let host = host(vec![]);
    let gateway = RemoteGateway::new(host);

    let huge = outbound(&"x".repeat(PAYLOAD_SIZE_LIMIT_BYTES));
    assert!(matches!(
        gateway.try_send(&huge).await,
        Err(TransportError::PayloadTooLarge)
    ));
    assert!(host.requests.lock().unwrap().is_empty());
}
