//! Remote solving-service client: submits the escalated challenge to an
//! anti-captcha-style task API and polls for the proof token. Implements
//! both solving collaborators; the orchestrator neither knows nor cares
//! that images and audio land on the same backend.

use crate::config::{ProxyAuth, ServiceConfig};
use crate::driver::{AudioSolver, ImageSolver};
use crate::outcome::SolveOutcome;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Cadence of result polls.
const RESULT_POLL: Duration = Duration::from_millis(500);

/// Bounded wait for the service: 5 minutes at the poll cadence.
const MAX_POLLS: u32 = 600;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest {
    client_key: String,
    task: Task,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Task {
    #[serde(rename = "RecaptchaV2Task", rename_all = "camelCase")]
    Image {
        #[serde(rename = "websiteURL")]
        website_url: String,
        website_key: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        proxy_address: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        proxy_login: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        proxy_password: Option<String>,
    },
    #[serde(rename = "RecaptchaV2AudioTask", rename_all = "camelCase")]
    Audio {
        #[serde(rename = "websiteURL")]
        website_url: String,
        website_key: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        proxy_address: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        proxy_login: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        proxy_password: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskResponse {
    error_id: u32,
    error_code: Option<String>,
    task_id: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GetResultRequest {
    client_key: String,
    task_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetResultResponse {
    error_id: u32,
    error_code: Option<String>,
    #[serde(default)]
    ready: bool,
    solution: Option<Solution>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Solution {
    g_recaptcha_response: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum TaskKind {
    Image,
    Audio,
}

/// Solving collaborator backed by a remote task service.
pub struct RemoteSolver {
    client: reqwest::Client,
    service: ServiceConfig,
    website_url: String,
    website_key: String,
    proxy: Option<String>,
    proxy_auth: Option<ProxyAuth>,
}

impl RemoteSolver {
    /// `proxy`/`proxy_auth` are forwarded to the service opaquely so its
    /// workers exit from the same address as the browser session.
    pub fn new(
        service: ServiceConfig,
        website_url: String,
        website_key: String,
        proxy: Option<String>,
        proxy_auth: Option<ProxyAuth>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            service,
            website_url,
            website_key,
            proxy,
            proxy_auth,
        }
    }

    fn task(&self, kind: TaskKind) -> Task {
        let website_url = self.website_url.clone();
        let website_key = self.website_key.clone();
        let proxy_address = self.proxy.clone();
        let proxy_login = self.proxy_auth.as_ref().map(|a| a.username.clone());
        let proxy_password = self.proxy_auth.as_ref().map(|a| a.password.clone());
        match kind {
            TaskKind::Image => Task::Image {
                website_url,
                website_key,
                proxy_address,
                proxy_login,
                proxy_password,
            },
            TaskKind::Audio => Task::Audio {
                website_url,
                website_key,
                proxy_address,
                proxy_login,
                proxy_password,
            },
        }
    }

    async fn create_task(&self, kind: TaskKind) -> Result<u64> {
        let request = CreateTaskRequest {
            client_key: self.service.api_key.clone(),
            task: self.task(kind),
        };
        let response: CreateTaskResponse = self
            .client
            .post(format!("{}/createTask", self.service.url))
            .json(&request)
            .send()
            .await?
            .json()
            .await?;
        if response.error_id != 0 {
            return Err(Error::Service(format!(
                "create task failed: {} - {}",
                response.error_id,
                response.error_code.unwrap_or_default()
            )));
        }
        response
            .task_id
            .ok_or_else(|| Error::Service("no task id returned".into()))
    }

    async fn get_result(&self, task_id: u64) -> Result<GetResultResponse> {
        let request = GetResultRequest {
            client_key: self.service.api_key.clone(),
            task_id,
        };
        let response: GetResultResponse = self
            .client
            .post(format!("{}/getTaskResult", self.service.url))
            .json(&request)
            .send()
            .await?
            .json()
            .await?;
        Ok(response)
    }

    async fn solve(&self, kind: TaskKind) -> Result<SolveOutcome> {
        let task_id = self.create_task(kind).await?;
        debug!("task {} created", task_id);

        for attempt in 1..=MAX_POLLS {
            tokio::time::sleep(RESULT_POLL).await;

            let result = self.get_result(task_id).await?;
            if result.error_id != 0 {
                return Err(Error::Service(format!(
                    "task {}: {} - {}",
                    task_id,
                    result.error_id,
                    result.error_code.unwrap_or_default()
                )));
            }
            if result.ready {
                let token = result
                    .solution
                    .and_then(|s| s.g_recaptcha_response.or(s.text))
                    .unwrap_or_default();
                return Ok(SolveOutcome::success().with_token(token));
            }
            if attempt % 20 == 0 {
                debug!("task {} still solving ({}s)", task_id, attempt / 2);
            }
        }

        Ok(SolveOutcome::failed("solving service timed out"))
    }
}

#[async_trait]
impl ImageSolver for RemoteSolver {
    async fn solve_by_image(&self) -> Result<SolveOutcome> {
        self.solve(TaskKind::Image).await
    }
}

#[async_trait]
impl AudioSolver for RemoteSolver {
    async fn solve_by_audio(&self) -> Result<SolveOutcome> {
        self.solve(TaskKind::Audio).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_task_request_shape() {
        let solver = RemoteSolver::new(
            ServiceConfig {
                url: "https://api.example.com".into(),
                api_key: "key".into(),
            },
            "https://example.com".into(),
            "6Le-abc".into(),
            Some("http://10.0.0.1:8080".into()),
            Some(ProxyAuth {
                username: "user".into(),
                password: "pass".into(),
            }),
        );
        let request = CreateTaskRequest {
            client_key: solver.service.api_key.clone(),
            task: solver.task(TaskKind::Image),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["clientKey"], "key");
        assert_eq!(json["task"]["type"], "RecaptchaV2Task");
        assert_eq!(json["task"]["websiteURL"], "https://example.com");
        assert_eq!(json["task"]["websiteKey"], "6Le-abc");
        assert_eq!(json["task"]["proxyLogin"], "user");
    }

    #[test]
    fn test_proxy_fields_omitted_when_absent() {
        let solver = RemoteSolver::new(
            ServiceConfig {
                url: "https://api.example.com".into(),
                api_key: "key".into(),
            },
            "https://example.com".into(),
            "6Le-abc".into(),
            None,
            None,
        );
        let json = serde_json::to_value(solver.task(TaskKind::Audio)).unwrap();
        assert_eq!(json["type"], "RecaptchaV2AudioTask");
        assert!(json.get("proxyAddress").is_none());
        assert!(json.get("proxyLogin").is_none());
    }

    #[test]
    fn test_result_solution_parse() {
        let raw = r#"{
            "errorId": 0,
            "ready": true,
            "solution": { "gRecaptchaResponse": "tok-123" }
        }"#;
        let result: GetResultResponse = serde_json::from_str(raw).unwrap();
        assert!(result.ready);
        let token = result
            .solution
            .and_then(|s| s.g_recaptcha_response.or(s.text))
            .unwrap();
        assert_eq!(token, "tok-123");
    }
}
