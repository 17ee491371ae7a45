// credits_webhook_backend/src/store.rs
// Account-credit store: the single "upgrade user" write, backed by Supabase PostgREST

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::SupabaseConfig;

// ═══════════════════════════════════════════════════════════════════════════════
// CREDIT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Free,
    Pro,
}

/// How a purchase changes `credits_remaining`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreditPolicy {
    /// Set the balance to the grant, whatever it was before.
    Overwrite,
    /// Add the grant to the current balance.
    Increment,
}

impl FromStr for CreditPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite" | "set" => Ok(Self::Overwrite),
            "increment" | "add" => Ok(Self::Increment),
            other => Err(format!("unknown credit policy: {other}")),
        }
    }
}

/// What a completed purchase grants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreditGrant {
    pub plan: PlanStatus,
    pub credits: u32,
    pub policy: CreditPolicy,
}

impl Default for CreditGrant {
    fn default() -> Self {
        Self {
            plan: PlanStatus::Pro,
            credits: crate::config::DEFAULT_PRO_CREDITS,
            policy: CreditPolicy::Overwrite,
        }
    }
}

/// Column values written to the `user_credits` row.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreditRowUpdate {
    pub plan_status: PlanStatus,
    pub credits_remaining: u64,
}

#[derive(Debug, Deserialize)]
struct CreditBalance {
    credits_remaining: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// STORE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request to credit store failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("credit store rejected update ({status}): {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("no credit row for user {0}")]
    NotFound(String),

    #[error("credit row for user {0} changed concurrently")]
    Conflict(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

#[async_trait]
pub trait CreditStore: Send + Sync {
    /// Apply `grant` to the row keyed by `user_id`.
    async fn apply_grant(&self, user_id: &str, grant: &CreditGrant) -> Result<(), StoreError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUPABASE (POSTGREST) STORE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SupabaseCreditStore {
    config: SupabaseConfig,
    http_client: Client,
}

impl fmt::Debug for SupabaseCreditStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseCreditStore")
            .field("url", &self.config.url)
            .field("credits_table", &self.config.credits_table)
            .finish_non_exhaustive()
    }
}

impl SupabaseCreditStore {
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.credits_table)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
    }

    /// Cheap reachability check against the credits table.
    pub async fn probe(&self) -> Result<(), StoreError> {
        let resp = self
            .authorized(self.http_client.get(self.table_url()))
            .query(&[("select", "count"), ("limit", "1")])
            .send()
            .await?;
        ensure_success(resp).await.map(|_| ())
    }

    async fn overwrite(&self, user_id: &str, grant: &CreditGrant) -> Result<(), StoreError> {
        let update = CreditRowUpdate {
            plan_status: grant.plan,
            credits_remaining: u64::from(grant.credits),
        };

        let resp = self
            .authorized(self.http_client.patch(self.table_url()))
            .query(&[("user_id", format!("eq.{user_id}"))])
            .header("Prefer", "return=minimal")
            .json(&update)
            .send()
            .await?;
        ensure_success(resp).await.map(|_| ())
    }

    async fn increment(&self, user_id: &str, grant: &CreditGrant) -> Result<(), StoreError> {
        let resp = self
            .authorized(self.http_client.get(self.table_url()))
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("select", "credits_remaining".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<CreditBalance> = ensure_success(resp).await?.json().await?;
        let current = rows
            .first()
            .map(|row| row.credits_remaining)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;

        let update = CreditRowUpdate {
            plan_status: grant.plan,
            credits_remaining: current.saturating_add(u64::from(grant.credits)),
        };

        // Only matches if nobody touched the balance since we read it.
        let resp = self
            .authorized(self.http_client.patch(self.table_url()))
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("credits_remaining", format!("eq.{current}")),
            ])
            .header("Prefer", "return=representation")
            .json(&update)
            .send()
            .await?;
        let updated: Vec<serde_json::Value> = ensure_success(resp).await?.json().await?;
        if updated.is_empty() {
            return Err(StoreError::Conflict(user_id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CreditStore for SupabaseCreditStore {
    async fn apply_grant(&self, user_id: &str, grant: &CreditGrant) -> Result<(), StoreError> {
        match grant.policy {
            CreditPolicy::Overwrite => self.overwrite(user_id, grant).await,
            CreditPolicy::Increment => self.increment(user_id, grant).await,
        }
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Rejected { status, body })
}
