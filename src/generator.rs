//! The generation engine: turns "give me N completions for this prompt"
//! into the right sequence of backend calls.
//!
//! A [`Generator`] owns an immutable [`GeneratorConfig`] and a shared
//! [`Backend`]. Each `generate` call picks one of four strategies:
//!
//! * one generation requested: a single backend call,
//! * backend supports multiple generations: one batched backend call,
//! * otherwise sequential fan-out: N single-generation calls in order,
//! * or parallel fan-out when the configuration enables it: N independent
//!   single-generation calls through a bounded pool of workers, collected
//!   in completion order.
//!
//! Every single-generation response is checked against the backend
//! contract before it is accepted, and outputs are pruned of configured
//! skip sequences before they are returned.

use std::sync::Arc;

use futures::{stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info};

use crate::backend::Backend;
use crate::config::GeneratorConfig;
use crate::error::GeneratorError;
use crate::sanitize::SkipPruner;

/// Errno for "too many open files", the limit parallel fan-out runs into
/// first on most platforms.
const EMFILE: i32 = 24;

/// Widest progress label we render before truncating.
const PROGRESS_LABEL_WIDTH: usize = 55;

/// Orchestrates completions for one configured backend instance.
pub struct Generator {
    config: GeneratorConfig,
    backend: Arc<dyn Backend>,
    pruner: Option<SkipPruner>,
    fullname: String,
}

impl Generator {
    /// Builds a generator, validating the configuration and compiling the
    /// skip-sequence matcher up front so a misconfigured instance fails
    /// here rather than mid-scan.
    pub fn new(config: GeneratorConfig, backend: Arc<dyn Backend>) -> Result<Self, GeneratorError> {
        config.validate()?;
        // Skip-sequence pruning is all or nothing: both markers must be
        // configured, otherwise outputs pass through untouched.
        let pruner = match (&config.skip_seq_start, &config.skip_seq_end) {
            (Some(start), Some(end)) => Some(SkipPruner::new(start, end)?),
            _ => None,
        };
        let fullname = config.fullname();
        info!(generator = %fullname, "generator init");
        Ok(Self {
            config,
            backend,
            pruner,
            fullname,
        })
    }

    /// The configuration this generator was built with.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Produces `count` completions for `prompt`.
    ///
    /// On success the result always holds exactly `count` elements; a
    /// `None` element means the backend produced no output for that slot.
    /// Zero is a valid request and yields an empty result without touching
    /// the backend.
    pub async fn generate(
        &self,
        prompt: &str,
        count: usize,
    ) -> Result<Vec<Option<String>>, GeneratorError> {
        self.backend.pre_generate_hook();

        if count == 0 {
            debug!("generate() called with zero generations requested");
            return Ok(Vec::new());
        }

        let outputs = if count == 1 {
            let result = self.backend.call_model(prompt, 1).await?;
            vec![verify_single(result)?]
        } else if self.config.supports_multiple_generations {
            // The backend batches internally and is trusted to return
            // exactly `count` elements or raise.
            self.backend.call_model(prompt, count).await?
        } else {
            self.fan_out(prompt, count).await?
        };

        let outputs = self.backend.post_generate_hook(outputs);

        let outputs = match &self.pruner {
            Some(pruner) => pruner.prune(outputs),
            None => outputs,
        };

        Ok(outputs)
    }

    /// Satisfies a multi-generation request with `count` independent
    /// single-generation calls, in parallel when configured for it.
    async fn fan_out(
        &self,
        prompt: &str,
        count: usize,
    ) -> Result<Vec<Option<String>>, GeneratorError> {
        let bar = self.progress_bar(count);
        let mut outputs = Vec::with_capacity(count);

        match self.config.parallel_pool_size(count) {
            Some(pool_size) => {
                // Workers share nothing: each owns its request round-trip
                // and hands its result back here. Results arrive in
                // completion order, and only this task touches the bar.
                let mut results = stream::iter(0..count)
                    .map(|_| {
                        let backend = Arc::clone(&self.backend);
                        let prompt = prompt.to_owned();
                        async move { backend.call_model(&prompt, 1).await }
                    })
                    .buffer_unordered(pool_size);

                while let Some(result) = results.next().await {
                    let result = result.map_err(classify_dispatch_error)?;
                    outputs.push(verify_single(result)?);
                    bar.inc(1);
                }
            }
            None => {
                for _ in 0..count {
                    let result = self.backend.call_model(prompt, 1).await?;
                    outputs.push(verify_single(result)?);
                    bar.inc(1);
                }
            }
        }

        bar.finish_and_clear();
        Ok(outputs)
    }

    fn progress_bar(&self, count: usize) -> ProgressBar {
        let bar = ProgressBar::new(count as u64);
        if let Ok(style) = ProgressStyle::with_template("{msg} {wide_bar:.magenta} {pos}/{len}") {
            bar.set_style(style);
        }
        bar.set_message(
            self.fullname
                .chars()
                .take(PROGRESS_LABEL_WIDTH)
                .collect::<String>(),
        );
        bar
    }
}

/// Checks a single-generation response against the backend contract and
/// unwraps its only element.
fn verify_single(mut result: Vec<Option<String>>) -> Result<Option<String>, GeneratorError> {
    if result.len() != 1 {
        return Err(GeneratorError::ContractViolation(format!(
            "call_model must return exactly one output when asked for one generation, got {}",
            result.len()
        )));
    }
    Ok(result.remove(0))
}

/// Separates "the OS ran out of file descriptors" from ordinary backend
/// failures during parallel dispatch. The former gets remediation guidance
/// and a distinct error class so callers abort instead of under-producing;
/// everything else propagates unchanged.
fn classify_dispatch_error(err: anyhow::Error) -> GeneratorError {
    let fd_limit_hit = err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .map_or(false, |io_err| io_err.raw_os_error() == Some(EMFILE))
    });
    if fd_limit_hit {
        let msg = "parallelisation limit hit; reduce parallel_requests or raise \
                   the open file limit (e.g. ulimit -n 4096)";
        error!("{msg}");
        GeneratorError::ResourceExhausted(msg.to_string())
    } else {
        GeneratorError::Backend(err)
    }
}
