// credits_webhook_backend/src/config.rs
// Service configuration, read once at startup and shared read-only.

use std::fmt;

use crate::store::{CreditGrant, CreditPolicy, PlanStatus};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PRO_CREDITS: u32 = 100;
pub const DEFAULT_CREDITS_TABLE: &str = "user_credits";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

// ═══════════════════════════════════════════════════════════════════════════════
// SUPABASE CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    /// Service role key. Bypasses row-level security, never log it.
    pub service_role_key: String,
    pub credits_table: String,
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_role_key", &"<redacted>")
            .field("credits_table", &self.credits_table)
            .finish()
    }
}

impl SupabaseConfig {
    /// Both the URL and the key must be present and non-empty.
    pub fn from_env() -> Option<Self> {
        let url = non_empty_var("SUPABASE_URL")?;
        let service_role_key = non_empty_var("SUPABASE_SERVICE_ROLE_KEY")?;
        Some(Self {
            url: url.trim().trim_end_matches('/').to_string(),
            service_role_key,
            credits_table: non_empty_var("SUPABASE_CREDITS_TABLE")
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| DEFAULT_CREDITS_TABLE.to_string()),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERVICE CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Lemon Squeezy signing secret. `None` disables signature checks.
    pub webhook_secret: Option<String>,
    pub store: Option<SupabaseConfig>,
    pub credit_grant: CreditGrant,
    pub port: u16,
    /// Larger webhook bodies are rejected with 400 before any processing.
    pub max_body_bytes: usize,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self {
            webhook_secret: non_empty_var("LEMON_SQUEEZY_WEBHOOK_SECRET"),
            store: SupabaseConfig::from_env(),
            credit_grant: CreditGrant {
                plan: PlanStatus::Pro,
                credits: parse_var("PRO_CREDITS", DEFAULT_PRO_CREDITS),
                policy: parse_var("CREDIT_POLICY", CreditPolicy::Overwrite),
            },
            port: parse_var("PORT", DEFAULT_PORT),
            max_body_bytes: parse_var("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
        }
    }
}

/// Value as set; whitespace only matters for deciding it is blank.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Debug,
{
    match non_empty_var(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, ?default, "Unparseable value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns distinct variable names so they can run in parallel.

    #[test]
    fn empty_variable_counts_as_unset() {
        std::env::set_var("CFG_TEST_EMPTY", "   ");
        assert_eq!(non_empty_var("CFG_TEST_EMPTY"), None);
        assert_eq!(non_empty_var("CFG_TEST_NEVER_SET"), None);
    }

    #[test]
    fn secret_whitespace_is_preserved() {
        std::env::set_var("CFG_TEST_SECRET", " padded secret ");
        assert_eq!(
            non_empty_var("CFG_TEST_SECRET").as_deref(),
            Some(" padded secret ")
        );
    }

    #[test]
    fn numeric_values_tolerate_padding() {
        std::env::set_var("CFG_TEST_PADDED_PORT", " 8080 ");
        assert_eq!(parse_var("CFG_TEST_PADDED_PORT", DEFAULT_PORT), 8080);
    }

    #[test]
    fn debug_output_redacts_service_key() {
        let cfg = SupabaseConfig {
            url: "https://example.supabase.co".into(),
            service_role_key: "super-secret".into(),
            credits_table: DEFAULT_CREDITS_TABLE.into(),
        };
        let out = format!("{cfg:?}");
        assert!(out.contains("example.supabase.co"));
        assert!(!out.contains("super-secret"));
    }

    #[test]
    fn parse_var_falls_back_on_garbage() {
        std::env::set_var("CFG_TEST_PORT", "not-a-port");
        assert_eq!(parse_var("CFG_TEST_PORT", DEFAULT_PORT), DEFAULT_PORT);

        std::env::set_var("CFG_TEST_POLICY", "Increment");
        assert_eq!(
            parse_var("CFG_TEST_POLICY", CreditPolicy::Overwrite),
            CreditPolicy::Increment
        );
    }
}
