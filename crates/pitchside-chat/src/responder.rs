//! Response-production seam.
//!
//! A chat session hands each accepted query to a [`Responder`] on a spawned
//! task. The built-in [`RuleResponder`] waits out a fixed "thinking" delay
//! and answers from the keyword matcher; a network-backed prediction
//! service would implement the same trait.

use std::time::Duration;

use async_trait::async_trait;

use pitchside_core::config::ChatConfig;

use crate::error::RuleError;
use crate::matcher::Matcher;
use crate::rules::RuleTable;

/// Produces the assistant reply for a user query. Text in, text out; never fails.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, query: &str) -> String;
}

/// Local stand-in for a prediction backend.
#[derive(Debug, Clone)]
pub struct RuleResponder {
    matcher: Matcher,
    delay: Duration,
}

impl RuleResponder {
    pub fn new(matcher: Matcher, delay: Duration) -> Self {
        Self { matcher, delay }
    }

    /// Build from configuration: rule table plus `response_delay_ms`.
    pub fn from_config(config: &ChatConfig) -> Result<Self, RuleError> {
        let table = RuleTable::from_config(config)?;
        Ok(Self::new(
            Matcher::new(table),
            Duration::from_millis(config.response_delay_ms),
        ))
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl Responder for RuleResponder {
    async fn respond(&self, query: &str) -> String {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.matcher.respond(query).to_string()
    }
}
