//! Event MCP tool handler (1 tool): report a CI/CD event.

use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;

use crate::client::UpwindClient;
use crate::types::EventRequest;

use super::server::{json_result, resolve_organization_id, CreateEventInput};

// upwind_create_event
pub(crate) async fn handle_create_event(
    client: &UpwindClient,
    p: CreateEventInput,
) -> Result<CallToolResult, McpError> {
    let org = resolve_organization_id(client, p.organization_id).await?;
    let event = EventRequest {
        event_type: p.event_type,
        reporter: p.reporter,
        data: p.data,
    };
    let created = client.create_event(&org, &event).await?;
    tracing::info!(
        event_type = ?event.event_type,
        reporter = ?event.reporter,
        count = created.len(),
        "reported event"
    );
    json_result(&created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credentials, TokenManager};
    use crate::types::{EventReporter, EventType};
    use httpmock::prelude::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn build_event_is_posted_unchanged() {
        let mock = MockServer::start();
        mock.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200)
                .json_body(serde_json::json!({"access_token": "tok", "expires_in": 3600}));
        });
        // No pull_request_ids, plus a key the vendor schema doesn't list.
        let data = serde_json::json!({
            "image": "registry.example/app",
            "image_sha": "sha256:abc",
            "commit_sha": "deadbeef",
            "version_control_platform": "github",
            "repository": "acme/app",
            "branch": "main",
            "build_time": "2024-06-01T12:00:00Z",
            "author": "ci-bot",
        });
        let post = mock.mock(|when, then| {
            when.method(POST)
                .path("/v1/organizations/org-1/events")
                .json_body(serde_json::json!({
                    "type": "IMAGE_BUILD",
                    "reporter": "GITHUB_ACTIONS",
                    "data": data.clone(),
                }));
            then.status(200).json_body(serde_json::json!([
                {"id": "ev-1", "type": "IMAGE_BUILD", "reporter": "GITHUB_ACTIONS", "data": data.clone()}
            ]));
        });

        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            Credentials::new("id", "secret", mock.base_url()),
        ));
        let client = UpwindClient::new(http, mock.base_url(), tokens);

        let serde_json::Value::Object(map) = data.clone() else {
            unreachable!()
        };
        let result = handle_create_event(
            &client,
            CreateEventInput {
                organization_id: Some("org-1".into()),
                event_type: EventType::ImageBuild,
                reporter: EventReporter::GithubActions,
                data: map,
            },
        )
        .await
        .unwrap();

        post.assert();
        let v = serde_json::to_value(&result).unwrap();
        let echoed: serde_json::Value =
            serde_json::from_str(v["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(echoed[0]["data"], data);
    }
}
