//! Bearer-token REST adapter for the remote mail service.
//!
//! Wire shape: `POST /delegate` exchanges the service token for a token scoped
//! to one identity; `GET /users` pages through the directory; `GET /messages`
//! pages through search results as reference ids; `GET /messages/{id}` returns
//! headers and a snippet.

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

use super::{AuthError, Directory, FetchError, ListError, Page, Remote, Session};
use crate::types::{Identity, MessageRecord, MessageRef};

pub struct HttpRemote {
    client: Client,
    base_url: String,
    token: String,
    /// Directory domain filter for `--all` enumeration, when configured.
    domain: Option<String>,
}

impl HttpRemote {
    pub fn new(base_url: &str, token: &str, domain: Option<String>) -> anyhow::Result<Self> {
        // No request timeout: bounded retry counts are the job's only give-up
        // mechanism, and a stalled call blocks its worker.
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            domain,
        })
    }
}

#[derive(Deserialize)]
struct DelegateResponse {
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsersResponse {
    #[serde(default)]
    users: Vec<UserEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserEntry {
    primary_email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<RefEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct RefEntry {
    id: String,
}

#[derive(Deserialize)]
struct HeaderEntry {
    name: String,
    value: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    headers: Vec<HeaderEntry>,
    #[serde(default)]
    snippet: String,
}

/// Status code plus a bounded slice of the body, for error detail.
fn status_detail(resp: Response) -> (u16, String) {
    let status = resp.status().as_u16();
    let detail: String = resp
        .text()
        .unwrap_or_default()
        .chars()
        .take(200)
        .collect();
    (status, detail)
}

impl Remote for HttpRemote {
    type Session = HttpSession;

    fn authorize(&self, identity: &str) -> Result<HttpSession, AuthError> {
        let url = format!("{}/delegate", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "identity": identity }))
            .send()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        if resp.status() == StatusCode::FORBIDDEN || resp.status() == StatusCode::UNAUTHORIZED {
            return Err(AuthError::Denied {
                identity: identity.to_string(),
            });
        }
        if !resp.status().is_success() {
            let (status, detail) = status_detail(resp);
            return Err(AuthError::Status { status, detail });
        }
        let body: DelegateResponse = resp.json().map_err(|e| AuthError::Transport(e.to_string()))?;
        log::debug!("delegated session for {identity}");
        Ok(HttpSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: body.token,
        })
    }
}

impl Directory for HttpRemote {
    fn list_identities(
        &self,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Identity>, ListError> {
        let url = format!("{}/users", self.base_url);
        let mut params = vec![("limit", page_size.to_string())];
        if let Some(domain) = &self.domain {
            params.push(("domain", domain.clone()));
        }
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&params)
            .send()
            .map_err(|e| ListError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            let (status, detail) = status_detail(resp);
            return Err(ListError::Status { status, detail });
        }
        let body: UsersResponse = resp.json().map_err(|e| ListError::Malformed(e.to_string()))?;
        Ok(Page {
            items: body.users.into_iter().map(|u| u.primary_email).collect(),
            next_cursor: body.next_page_token,
        })
    }
}

/// Identity-scoped session holding the delegated token.
pub struct HttpSession {
    client: Client,
    base_url: String,
    token: String,
}

impl Session for HttpSession {
    fn list_matching(
        &self,
        query: &str,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<Page<MessageRef>, ListError> {
        let url = format!("{}/messages", self.base_url);
        let mut params = vec![("q", query.to_string()), ("limit", page_size.to_string())];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&params)
            .send()
            .map_err(|e| ListError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            let (status, detail) = status_detail(resp);
            return Err(ListError::Status { status, detail });
        }
        let body: ListResponse = resp.json().map_err(|e| ListError::Malformed(e.to_string()))?;
        Ok(Page {
            items: body.messages.into_iter().map(|m| m.id).collect(),
            next_cursor: body.next_page_token,
        })
    }

    fn fetch(&self, reference: &str) -> Result<MessageRecord, FetchError> {
        let url = format!("{}/messages/{}", self.base_url, reference);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            let (status, detail) = status_detail(resp);
            return Err(FetchError::Status { status, detail });
        }
        // Snippets may carry invalid text bytes; replace them rather than fail
        // the whole message.
        let bytes = resp
            .bytes()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let text = MessageRecord::snippet_from_bytes(&bytes);
        let body: MessageResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::Malformed(e.to_string()))?;

        let mut record = MessageRecord {
            snippet: body.snippet,
            ..MessageRecord::default()
        };
        for header in body.headers {
            let value = Some(header.value);
            match header.name.as_str() {
                "To" => record.to = value,
                "From" => record.from = value,
                "Subject" => record.subject = value,
                "Message-ID" => record.message_id = value,
                "Date" => record.date = value,
                _ => {}
            }
        }
        Ok(record)
    }
}
