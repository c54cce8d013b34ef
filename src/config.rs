//! Resolved generator configuration.
//!
//! A [`GeneratorConfig`] is assembled by whatever launches the generator
//! (the CLI, a config file loader, a test) and is read-only afterwards;
//! the generator never mutates it and instances never share state.

use crate::error::GeneratorError;

/// Immutable settings for one generator instance.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Maximum tokens to request per completion.
    pub max_tokens: u32,
    /// Sampling temperature, if the backend supports it.
    pub temperature: Option<f32>,
    /// Top-k sampling cutoff, if the backend supports it.
    pub top_k: Option<u32>,
    /// Context window length, if the backend needs it spelled out.
    pub context_len: Option<u32>,
    /// Opening marker of provider-injected commentary to strip from outputs.
    /// An empty string means "the block has no opening marker".
    pub skip_seq_start: Option<String>,
    /// Closing marker of provider-injected commentary.
    pub skip_seq_end: Option<String>,
    /// Number of simultaneous single-generation requests to keep in flight
    /// on the fan-out path. Values above 1 enable parallel fan-out and
    /// require `max_workers`.
    pub parallel_requests: Option<usize>,
    /// Upper bound on concurrent workers, regardless of `parallel_requests`.
    pub max_workers: Option<usize>,
    /// Whether one backend call can yield more than one completion.
    pub supports_multiple_generations: bool,
    /// Provider family, e.g. "openai".
    pub family_name: String,
    /// Model or deployment name within the family.
    pub instance_name: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            temperature: None,
            top_k: None,
            context_len: None,
            skip_seq_start: None,
            skip_seq_end: None,
            parallel_requests: None,
            max_workers: None,
            supports_multiple_generations: false,
            family_name: String::new(),
            instance_name: String::new(),
        }
    }
}

impl GeneratorConfig {
    /// Checks cross-field consistency. Called once at generator
    /// construction so misconfiguration fails before any backend call.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if matches!(self.parallel_requests, Some(p) if p > 1) && self.max_workers.is_none() {
            return Err(GeneratorError::InvalidConfig(
                "parallel_requests > 1 requires max_workers to be set".to_string(),
            ));
        }
        Ok(())
    }

    /// Human-readable `family:instance` label.
    pub fn fullname(&self) -> String {
        if self.family_name.is_empty() {
            self.instance_name.clone()
        } else {
            format!("{}:{}", self.family_name, self.instance_name)
        }
    }

    /// Pool size for parallel fan-out, or `None` when the configuration
    /// selects sequential fan-out.
    pub(crate) fn parallel_pool_size(&self, count: usize) -> Option<usize> {
        match (self.parallel_requests, self.max_workers) {
            (Some(parallel), Some(workers)) if parallel > 1 => {
                Some(count.min(parallel).min(workers))
            }
            _ => None,
        }
    }
}
