//! PostgREST-style HTTP implementation of [`CommentTable`].

use super::{CommentTable, NewCommentRow, RemoteError, RemoteResult, COMMENTS_TABLE};
use crate::config::RemoteConfig;
use crate::model::comment::Comment;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use serde::Deserialize;
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Blocking HTTP client for the remote `comments` table.
pub struct RestCommentTable {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl RestCommentTable {
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.url.clone(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{COMMENTS_TABLE}", self.base_url)
    }

    fn authed(&self, method: Method) -> RequestBuilder {
        self.http
            .request(method, self.table_url())
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    fn select(&self, person_id: &str, since: Option<DateTime<Utc>>) -> RemoteResult<Vec<Comment>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("person_id", format!("eq.{person_id}")),
            ("order", "created_at.asc".to_string()),
        ];
        if let Some(since) = since {
            query.push((
                "created_at",
                format!("gte.{}", since.to_rfc3339_opts(SecondsFormat::Micros, true)),
            ));
        }

        let started_at = Instant::now();
        let response = send(self.authed(Method::GET).query(&query))?;
        let rows = response
            .json::<Vec<Comment>>()
            .map_err(|err| RemoteError::Decode(err.to_string()))?;
        debug!(
            "event=remote_select module=remote status=ok person_id={} rows={} duration_ms={}",
            person_id,
            rows.len(),
            started_at.elapsed().as_millis()
        );
        Ok(rows)
    }
}

impl CommentTable for RestCommentTable {
    fn select_for_person(&self, person_id: &str) -> RemoteResult<Vec<Comment>> {
        self.select(person_id, None)
    }

    fn select_since(&self, person_id: &str, since: DateTime<Utc>) -> RemoteResult<Vec<Comment>> {
        self.select(person_id, Some(since))
    }

    fn insert(&self, row: &NewCommentRow) -> RemoteResult<()> {
        send(
            self.authed(Method::POST)
                .header("Prefer", "return=minimal")
                .json(row),
        )?;
        Ok(())
    }
}

fn send(request: RequestBuilder) -> RemoteResult<Response> {
    let response = request
        .send()
        .map_err(|err| RemoteError::Transport(err.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let message = rejection_message(&body);
    warn!(
        "event=remote_request module=remote status=error http_status={} error={}",
        status.as_u16(),
        message
    );
    Err(RemoteError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Prefers the backend's JSON `message` field over the raw body.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .unwrap_or_else(|| body.trim().to_string())
}
