//! # PromptProbe
//!
//! **PromptProbe** probes text-generation services (LLMs and similar
//! providers) for vulnerabilities by sending crafted prompts and scoring
//! the responses.
//!
//! At its heart sits a generation engine that turns one "give me N
//! completions" request into the right sequence of backend calls,
//! batching, fanning out sequentially, or fanning out across a bounded
//! pool of parallel workers depending on what the backend and the
//! configuration allow, while staying defensive against misbehaving
//! backends along the way.
//!
//! ## Core Architecture
//!
//! 1.  **[Backend](crate::backend::Backend)**: wraps one concrete provider (e.g. OpenAI-compatible chat APIs); produces N completions for one prompt.
//! 2.  **[Generator](crate::generator::Generator)**: the engine; picks the call strategy, verifies every backend response against its contract, and strips configured skip sequences from outputs.
//! 3.  **[Probe](crate::probe::Probe)**: crafts the adversarial prompts (e.g. template injection, SQL injection echo).
//! 4.  **[Detector](crate::detector::Detector)**: scores each output for signs of the vulnerability the probe aimed at.
//! 5.  **[Runner](crate::runner::Runner)**: drives probe → generator → detector and collects the outcomes.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use promptprobe::backend::OpenAIBackend;
//! use promptprobe::config::GeneratorConfig;
//! use promptprobe::detector::JinjaTemplateDetector;
//! use promptprobe::generator::Generator;
//! use promptprobe::probe::TemplateInjectionProbe;
//! use promptprobe::runner::Runner;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Configure the generator for the system under test
//!     let api_key = std::env::var("OPENAI_API_KEY")?;
//!     let config = GeneratorConfig {
//!         supports_multiple_generations: true,
//!         family_name: "openai".to_string(),
//!         instance_name: "gpt-4".to_string(),
//!         ..Default::default()
//!     };
//!
//!     // 2. Wire the backend and the engine
//!     let backend = Arc::new(OpenAIBackend::new(api_key, "gpt-4".to_string(), &config));
//!     let generator = Arc::new(Generator::new(config, backend)?);
//!
//!     // 3. Pick what to probe for and how to detect it
//!     let probe = Arc::new(TemplateInjectionProbe::default());
//!     let detector = Arc::new(JinjaTemplateDetector::default());
//!
//!     // 4. Run the scan, 5 completions per prompt
//!     let runner = Runner::new(5);
//!     let outcomes = runner.run(generator, probe, detector).await?;
//!
//!     println!("Found {} vulnerable prompts.", outcomes.iter().filter(|o| o.vulnerable).count());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod detector;
pub mod error;
pub mod generator;
pub mod probe;
pub mod runner;
pub mod sanitize;

use serde::{Deserialize, Serialize};

/// A convenient type alias for `anyhow::Result`.
pub type ProbeResult<T> = anyhow::Result<T>;

/// The result of probing one prompt.
///
/// Captures what was sent, every completion that came back (a `None`
/// entry means the model produced no output for that slot), and how the
/// detector scored each completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// The prompt sent to the model, after probe templating.
    pub prompt: String,

    /// The raw completions, one per requested generation.
    pub outputs: Vec<Option<String>>,

    /// Detector score per completion, aligned with `outputs`.
    /// * `1.0`: the completion exhibits the vulnerability.
    /// * `0.0`: the completion is clean (or was null).
    pub scores: Vec<f64>,

    /// Whether any completion scored as vulnerable.
    pub vulnerable: bool,

    /// The name of the probe used (e.g. "Template Injection Echo").
    pub probe_name: String,
}
