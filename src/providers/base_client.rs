use crate::core::error::AppError;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::{Client, Response};
use serde::Serialize;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::io::StreamReader;
use tracing::debug;

/// Thin wrapper around a reqwest client bound to one API endpoint.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpClient {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts `payload` as JSON and fails on any non-success status.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response, AppError> {
        let url = format!("{}/{}", self.endpoint, path);
        debug!(%url, "sending request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api(format!("{} returned {}: {}", url, status, body.trim())));
        }

        Ok(response)
    }
}

/// Reads a server-sent event body and yields the payload of each `data:` line.
///
/// Lines are reassembled across network chunks. The stream ends at `[DONE]` or
/// when the body is exhausted.
pub fn sse_data_lines(response: Response) -> BoxStream<'static, Result<String, AppError>> {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(io::Error::other));
    let lines = BufReader::new(StreamReader::new(byte_stream)).lines();

    stream::unfold(Some(lines), |state| async move {
        let mut lines = state?;
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data == "[DONE]" {
                        return None;
                    }
                    if data.is_empty() {
                        continue;
                    }
                    return Some((Ok(data.to_string()), Some(lines)));
                }
                Ok(None) => return None,
                Err(e) => {
                    let err = AppError::Network(format!("Stream read failed: {}", e));
                    return Some((Err(err), None));
                }
            }
        }
    })
    .boxed()
}
