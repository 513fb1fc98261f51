use super::{decode_sse, ClientError, FalApi, WorkflowStream};
use crate::{config::AppConfig, staging::StagedImage, workflow::payload::WorkflowInput};
use futures_util::{future::BoxFuture, FutureExt, StreamExt};
use reqwest::{header, Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::RwLock;
use url::Url;

#[derive(Debug, Deserialize)]
struct InitiateUploadResponse {
    upload_url: Url,
    file_url: Url,
}

/// fal client over plain HTTP.
#[derive(Debug)]
pub struct FalClient {
    http: Client,
    run_url: Url,
    rest_url: Url,
    credentials: RwLock<Option<String>>,
}

impl FalClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: Client::new(),
            run_url: config.fal_run_url.clone(),
            rest_url: config.fal_rest_url.clone(),
            credentials: RwLock::new(None),
        }
    }

    fn authorization(&self) -> Result<String, ClientError> {
        let credentials = self
            .credentials
            .read()
            .map_err(|_| ClientError::MissingCredentials)?;

        credentials
            .as_ref()
            .map(|key| format!("Key {}", key))
            .ok_or(ClientError::MissingCredentials)
    }

    fn endpoint(base: &Url, path: &str) -> Result<Url, ClientError> {
        let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn upload_image(&self, image: &StagedImage) -> Result<Url, ClientError> {
        let authorization = self.authorization()?;

        let mut initiate_url = Self::endpoint(&self.rest_url, "storage/upload/initiate")?;
        initiate_url.set_query(Some("storage_type=fal-cdn-v3"));

        let response = self
            .http
            .post(initiate_url)
            .header(header::AUTHORIZATION, &authorization)
            .json(&json!({
                "content_type": image.content_type(),
                "file_name": image.name(),
            }))
            .send()
            .await?;
        let initiated = check_status(response)
            .await?
            .json::<InitiateUploadResponse>()
            .await?;

        tracing::debug!("upload initiated for {}: {}", image.name(), initiated.file_url);

        let response = self
            .http
            .put(initiated.upload_url)
            .header(header::CONTENT_TYPE, image.content_type())
            .body(image.data().to_vec())
            .send()
            .await?;
        check_status(response).await?;

        Ok(initiated.file_url)
    }

    async fn start_stream(
        &self,
        workflow_id: &str,
        input: &WorkflowInput,
    ) -> Result<WorkflowStream, ClientError> {
        let authorization = self.authorization()?;
        let url = Self::endpoint(&self.run_url, &format!("{}/stream", workflow_id))?;

        let response = self
            .http
            .post(url)
            .header(header::AUTHORIZATION, &authorization)
            .header(header::ACCEPT, "text/event-stream")
            .json(input)
            .send()
            .await?;
        let response = check_status(response).await?;

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from));

        Ok(WorkflowStream::new(decode_sse(chunks)))
    }

    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, ClientError> {
        let response = self.http.get(url.clone()).send().await?;
        let bytes = check_status(response).await?.bytes().await?;

        Ok(bytes.to_vec())
    }
}

/// Turn non-success responses into [`ClientError::Api`], keeping the body.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
    let message = body
        .get("detail")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
        body,
    })
}

impl FalApi for FalClient {
    fn configure(&self, credential: &str) {
        match self.credentials.write() {
            Ok(mut credentials) => *credentials = Some(credential.to_string()),
            Err(e) => tracing::error!("failed to store credentials: {}", e),
        }
    }

    fn upload<'a>(&'a self, image: &'a StagedImage) -> BoxFuture<'a, Result<Url, ClientError>> {
        self.upload_image(image).boxed()
    }

    fn stream<'a>(
        &'a self,
        workflow_id: &'a str,
        input: &'a WorkflowInput,
    ) -> BoxFuture<'a, Result<WorkflowStream, ClientError>> {
        self.start_stream(workflow_id, input).boxed()
    }

    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, ClientError>> {
        self.fetch_bytes(url).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{event::EventKind, payload::WORKFLOW_ID};
    use mockito::{mock, Matcher};

    fn client() -> FalClient {
        FalClient::new(&AppConfig::from_env())
    }

    fn mock_client() -> FalClient {
        let server = Url::parse(&mockito::server_url()).unwrap();
        let client = FalClient::new(&AppConfig {
            fal_run_url: server.clone(),
            fal_rest_url: server,
            ..AppConfig::from_env()
        });
        client.configure("key-id:key-secret");
        client
    }

    #[test]
    fn requires_credentials() {
        let client = client();
        assert!(matches!(
            client.authorization(),
            Err(ClientError::MissingCredentials)
        ));

        client.configure("key-id:key-secret");
        assert_eq!(client.authorization().unwrap(), "Key key-id:key-secret");
    }

    #[test]
    fn joins_endpoints() {
        let base = Url::parse("https://fal.run/").unwrap();
        let url = FalClient::endpoint(&base, "workflows/derek/wizarding-5-no-extend/stream")
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://fal.run/workflows/derek/wizarding-5-no-extend/stream"
        );
    }

    #[tokio::test]
    async fn uploads_through_fal_storage() {
        let file_url = "https://v3.fal.media/files/rabbit/a.png";
        let initiate = mock("POST", Matcher::Regex("^/storage/upload/initiate".to_string()))
            .match_query(Matcher::UrlEncoded(
                "storage_type".to_string(),
                "fal-cdn-v3".to_string(),
            ))
            .match_header("authorization", "Key key-id:key-secret")
            .match_body(Matcher::Json(json!({
                "content_type": "image/png",
                "file_name": "a.png",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "upload_url": format!("{}/upload/a.png", mockito::server_url()),
                    "file_url": file_url,
                })
                .to_string(),
            )
            .create();
        let put = mock("PUT", "/upload/a.png")
            .match_header("content-type", "image/png")
            .match_body("png-bytes")
            .with_status(200)
            .create();

        let image = StagedImage::new("a.png", "image/png", b"png-bytes".to_vec());
        let url = mock_client().upload(&image).await.unwrap();

        initiate.assert();
        put.assert();
        assert_eq!(url.as_str(), file_url);
    }

    #[tokio::test]
    async fn upload_rejection_uses_detail_message() {
        let initiate = mock("POST", Matcher::Regex("^/storage/upload/initiate".to_string()))
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"Invalid key"}"#)
            .create();

        let image = StagedImage::new("a.png", "image/png", vec![1, 2, 3]);
        let error = mock_client().upload(&image).await.unwrap_err();

        initiate.assert();
        assert_eq!(error.to_string(), "Invalid key");
        assert_eq!(error.details(), Some(json!({ "detail": "Invalid key" })));
    }

    #[tokio::test]
    async fn streams_workflow_events() {
        let body = concat!(
            "data: {\"type\":\"submit\",\"node_id\":\"nodes/any_llm/vision\"}\n\n",
            ": keep-alive\n\n",
            "data: {\"type\":\"output\",\"output\":{\"video\":{",
            "\"url\":\"https://v3.fal.media/files/final.mp4\",\"content_type\":\"video/mp4\",",
            "\"file_name\":\"final.mp4\",\"file_size\":2048}}}\n\n",
        );
        let stream = mock("POST", format!("/{}/stream", WORKFLOW_ID).as_str())
            .match_header("authorization", "Key key-id:key-secret")
            .match_header("accept", "text/event-stream")
            .match_body(Matcher::PartialJson(json!({
                "image_urls": ["https://v3.fal.media/files/a.png"],
                "reasoning": true,
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create();

        let input = WorkflowInput::new(vec![
            Url::parse("https://v3.fal.media/files/a.png").unwrap()
        ]);
        let mut events = mock_client().stream(WORKFLOW_ID, &input).await.unwrap();

        let first = events.next_event().await.unwrap().unwrap();
        assert_eq!(first.kind, EventKind::Submit);
        assert_eq!(first.node_id.as_deref(), Some("nodes/any_llm/vision"));

        let result = events.done().await.unwrap();
        stream.assert();
        assert_eq!(result.video().file_name, "final.mp4");
        assert_eq!(result.video().file_size, Some(2048));
    }

    #[tokio::test]
    async fn stream_rejection_keeps_body() {
        let body = json!({ "detail": [{ "loc": ["body", "image_urls"], "msg": "field required" }] });
        let stream = mock("POST", format!("/{}/stream", WORKFLOW_ID).as_str())
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create();

        let input = WorkflowInput::new(vec![]);
        let error = match mock_client().stream(WORKFLOW_ID, &input).await {
            Ok(_) => panic!("stream should be rejected"),
            Err(e) => e,
        };

        stream.assert();
        assert!(matches!(
            &error,
            ClientError::Api { status: 422, message, body: rejected }
                if message == "Unprocessable Entity" && *rejected == body
        ));
    }

    #[tokio::test]
    async fn fetches_remote_files() {
        let file = mock("GET", "/files/final.mp4")
            .with_status(200)
            .with_header("content-type", "video/mp4")
            .with_body("video-bytes")
            .create();

        let url = Url::parse(&format!("{}/files/final.mp4", mockito::server_url())).unwrap();
        let bytes = mock_client().fetch(&url).await.unwrap();

        file.assert();
        assert_eq!(bytes, b"video-bytes");
    }
}
