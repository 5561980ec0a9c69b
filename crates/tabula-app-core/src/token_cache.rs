// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Guest-token cache for embedded dashboards.
//!
//! Tokens are cached per dashboard id and reused until they are within
//! [`REFRESH_BUFFER`] of expiry. The clock is injected so expiry can be tested
//! without sleeping.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, SystemTime};

use thiserror::Error;

/// Tokens closer than this to expiry are refreshed.
pub const REFRESH_BUFFER: Duration = Duration::from_secs(30);
/// Lifetime assumed for issued tokens that carry no explicit expiry.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Time source.
pub trait Clock {
    /// Current wall-clock time.
    fn now(&self) -> SystemTime;
}

/// [`Clock`] backed by `SystemTime::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A short-lived guest token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestToken {
    /// Opaque token value.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: SystemTime,
}

impl GuestToken {
    /// Token issued at `now` with the default lifetime.
    pub fn issued_at(token: impl Into<String>, now: SystemTime) -> Self {
        Self {
            token: token.into(),
            expires_at: now + TOKEN_LIFETIME,
        }
    }

    /// Whether the token is still usable at `now`, allowing for the refresh buffer.
    pub fn is_fresh(&self, now: SystemTime) -> bool {
        self.expires_at > now + REFRESH_BUFFER
    }
}

/// Failure while issuing a guest token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The issuer rejected the login or the token request.
    #[error("token request for dashboard {dashboard} rejected: {message}")]
    Rejected {
        /// Dashboard id.
        dashboard: String,
        /// Issuer message.
        message: String,
    },
    /// The issuer could not be reached.
    #[error("token issuer unavailable: {0}")]
    Unavailable(String),
}

/// Exchanges a dashboard id for a fresh guest token.
pub trait TokenIssuer {
    /// Issue a token for `dashboard_id`.
    fn issue(
        &self,
        dashboard_id: &str,
        now: SystemTime,
    ) -> impl Future<Output = Result<GuestToken, TokenError>> + Send;
}

/// Per-dashboard token cache.
#[derive(Debug)]
pub struct TokenCache<C> {
    clock: C,
    tokens: HashMap<String, GuestToken>,
}

impl<C: Clock> TokenCache<C> {
    /// Empty cache reading time from `clock`.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            tokens: HashMap::new(),
        }
    }

    /// Cached token for `dashboard_id` if it is still fresh.
    pub fn cached(&self, dashboard_id: &str) -> Option<&GuestToken> {
        let now = self.clock.now();
        self.tokens.get(dashboard_id).filter(|t| t.is_fresh(now))
    }

    /// Fresh token for `dashboard_id`, asking `issuer` only when the cached one
    /// is missing or about to expire. A failed issue leaves the cache unchanged.
    pub async fn get_or_refresh<I: TokenIssuer>(
        &mut self,
        dashboard_id: &str,
        issuer: &I,
    ) -> Result<String, TokenError> {
        if let Some(token) = self.cached(dashboard_id) {
            return Ok(token.token.clone());
        }
        let issued = issuer.issue(dashboard_id, self.clock.now()).await?;
        let value = issued.token.clone();
        self.tokens.insert(dashboard_id.to_string(), issued);
        Ok(value)
    }

    /// Drop the cached token for `dashboard_id`.
    pub fn invalidate(&mut self, dashboard_id: &str) {
        self.tokens.remove(dashboard_id);
    }
}
