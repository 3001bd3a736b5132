//! # Remote Challenge Store
//!
//! Typed access to the two tables the rotation job touches:
//!
//! - `WeeklyChallengesUsers`: per-user progress (`challenge1`..`challenge5`, `completed`)
//! - `WeeklyChallenges`: the active challenge for each of the five slots
//!
//! [`RestStore`] speaks the PostgREST dialect exposed by Supabase. Every call
//! returns `Result<_, StoreError>`; success is decided by the HTTP status, never
//! by inspecting the body.

use async_trait::async_trait;
use log::debug;
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::common::config::StoreSecrets;

pub const PROGRESS_TABLE: &str = "WeeklyChallengesUsers";
pub const CHALLENGE_TABLE: &str = "WeeklyChallenges";

/// A user's progress on the current week's challenges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    #[serde(default)]
    pub challenge1: i64,
    #[serde(default)]
    pub challenge2: i64,
    #[serde(default)]
    pub challenge3: i64,
    #[serde(default)]
    pub challenge4: i64,
    #[serde(default)]
    pub challenge5: i64,
    #[serde(default)]
    pub completed: bool,
}

/// A row of the active-challenge table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveChallenge {
    /// Slot index, 0 to 4
    pub id: usize,
    pub name: String,
    pub criteria: String,
    pub value: i64,
    /// Fixed slot identifier
    pub challenge: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to remote store failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("remote store returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// Operations the rotation job needs from the remote store.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// All user progress rows.
    async fn fetch_progress(&self) -> Result<Vec<UserProgress>, StoreError>;

    /// Zero the five progress counters of `user_id`, leaving `completed` as is.
    async fn reset_progress(&self, user_id: &str) -> Result<(), StoreError>;

    /// Delete any active challenge bound to `slot`.
    async fn delete_active(&self, slot: &str) -> Result<(), StoreError>;

    async fn insert_active(&self, row: &ActiveChallenge) -> Result<(), StoreError>;
}

/// [`ChallengeStore`] over the Supabase REST API.
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(secrets: StoreSecrets) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: secrets.url.trim_end_matches('/').to_string(),
            api_key: secrets.api_key,
        }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ChallengeStore for RestStore {
    async fn fetch_progress(&self) -> Result<Vec<UserProgress>, StoreError> {
        let response = self
            .request(Method::GET, PROGRESS_TABLE)
            .query(&[("select", "*")])
            .send()
            .await?;
        let rows = Self::check(response).await?.json().await?;
        Ok(rows)
    }

    async fn reset_progress(&self, user_id: &str) -> Result<(), StoreError> {
        let response = self
            .request(Method::PATCH, PROGRESS_TABLE)
            .query(&[("user_id", format!("eq.{}", user_id))])
            .json(&json!({
                "challenge1": 0,
                "challenge2": 0,
                "challenge3": 0,
                "challenge4": 0,
                "challenge5": 0,
            }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_active(&self, slot: &str) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, CHALLENGE_TABLE)
            .query(&[("challenge", format!("eq.{}", slot))])
            .send()
            .await?;
        Self::check(response).await?;
        debug!("Deleted active challenge for slot {}", slot);
        Ok(())
    }

    async fn insert_active(&self, row: &ActiveChallenge) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, CHALLENGE_TABLE)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> RestStore {
        RestStore::new(StoreSecrets {
            url: format!("{}/", server.uri()),
            api_key: "service-key".to_string(),
        })
    }

    #[tokio::test]
    async fn test_fetch_progress() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/WeeklyChallengesUsers"))
            .and(query_param("select", "*"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"user_id": "u1", "challenge1": 3, "challenge2": 0, "challenge3": 1,
                 "challenge4": 0, "challenge5": 2, "completed": true}
            ])))
            .mount(&server)
            .await;

        let rows = store_for(&server).fetch_progress().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "u1");
        assert_eq!(rows[0].challenge1, 3);
        assert!(rows[0].completed);
    }

    #[tokio::test]
    async fn test_reset_progress_patches_counters_only() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/WeeklyChallengesUsers"))
            .and(query_param("user_id", "eq.u1"))
            .and(body_json(json!({
                "challenge1": 0, "challenge2": 0, "challenge3": 0,
                "challenge4": 0, "challenge5": 0
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server).reset_progress("u1").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_and_insert_active() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/WeeklyChallenges"))
            .and(query_param(
                "challenge",
                "eq.11111111-1111-1111-1111-111111111111",
            ))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/WeeklyChallenges"))
            .and(body_json(json!({
                "id": 0, "name": "Fiber Fan", "criteria": "fiber", "value": 5,
                "challenge": "11111111-1111-1111-1111-111111111111"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        store
            .delete_active("11111111-1111-1111-1111-111111111111")
            .await
            .unwrap();
        store
            .insert_active(&ActiveChallenge {
                id: 0,
                name: "Fiber Fan".to_string(),
                criteria: "fiber".to_string(),
                value: 5,
                challenge: "11111111-1111-1111-1111-111111111111".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        match store_for(&server).fetch_progress().await {
            Err(StoreError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
