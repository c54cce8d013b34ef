use promptprobe::backend::OpenAIBackend;
use promptprobe::config::GeneratorConfig;
use promptprobe::detector::{Detector, JinjaTemplateDetector, SqlInjectionDetector};
use promptprobe::generator::Generator;
use promptprobe::probe::{Probe, SqlInjectionEchoProbe, TemplateInjectionProbe};
use promptprobe::runner::Runner;

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use dotenv::dotenv;
use std::env;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "PromptProbe")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Scan {
        /// The model name (e.g., gpt-3.5-turbo)
        #[arg(short, long, default_value = "gpt-3.5-turbo")]
        model: String,

        /// Path to a file of injection payloads (one per line)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Which probe to run
        #[arg(short, long, value_enum, default_value_t = ProbeType::Template)]
        probe: ProbeType,

        /// Completions to request per prompt
        #[arg(short, long, default_value = "5")]
        generations: usize,

        /// Issue one request per completion instead of one batched request
        #[arg(long, default_value = "false")]
        fan_out: bool,

        /// Single-completion requests to keep in flight on the fan-out path
        #[arg(long)]
        parallel_requests: Option<usize>,

        /// Cap on concurrent fan-out workers
        #[arg(long)]
        max_workers: Option<usize>,

        /// Opening marker of provider commentary to strip from outputs
        #[arg(long)]
        skip_seq_start: Option<String>,

        /// Closing marker of provider commentary to strip from outputs
        #[arg(long)]
        skip_seq_end: Option<String>,

        #[arg(short, long, default_value = "report.json")]
        output: String,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum ProbeType {
    Template,
    Sql,
}

// Helper to read lines from a file
fn read_lines(path: PathBuf) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = io::BufReader::new(file);
    reader.lines().collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            model,
            file,
            probe,
            generations,
            fan_out,
            parallel_requests,
            max_workers,
            skip_seq_start,
            skip_seq_end,
            output,
        } => {
            println!("{}", "Initializing PromptProbe...".bold().cyan());

            let api_key = env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");

            // 1. Resolve the generator configuration
            let config = GeneratorConfig {
                skip_seq_start,
                skip_seq_end,
                parallel_requests,
                max_workers,
                // The chat API can batch via its `n` parameter unless the
                // user forces fan-out.
                supports_multiple_generations: !fan_out,
                family_name: "openai".to_string(),
                instance_name: model.clone(),
                ..Default::default()
            };

            // 2. Wire backend and generator
            let backend = Arc::new(OpenAIBackend::new(api_key, model, &config));
            let generator = Arc::new(Generator::new(config, backend)?);

            // 3. Select probe and its matching detector
            let payloads = match file {
                Some(path) => {
                    println!("Loading payloads from file: {:?}", path);
                    Some(read_lines(path)?)
                }
                None => None,
            };

            let (probe_impl, detector_impl): (Arc<dyn Probe>, Arc<dyn Detector>) = match probe {
                ProbeType::Template => {
                    println!("{}", "Probe: Template Injection Echo".yellow());
                    let probe = match payloads {
                        Some(p) => TemplateInjectionProbe::new(p),
                        None => TemplateInjectionProbe::default(),
                    };
                    (Arc::new(probe), Arc::new(JinjaTemplateDetector::default()))
                }
                ProbeType::Sql => {
                    println!("{}", "Probe: SQL Injection Echo".yellow());
                    let probe = match payloads {
                        Some(p) => SqlInjectionEchoProbe::new(p),
                        None => SqlInjectionEchoProbe::default(),
                    };
                    (Arc::new(probe), Arc::new(SqlInjectionDetector::default()))
                }
            };

            // 4. Run
            let runner = Runner::new(generations);
            let outcomes = runner.run(generator, probe_impl, detector_impl).await?;

            // 5. Report
            let vulnerable = outcomes.iter().filter(|o| o.vulnerable).count();
            println!("Total Prompts: {}", outcomes.len());
            println!(
                "Vulnerable Prompts: {}",
                format!("{}", vulnerable).red().bold()
            );

            let json = serde_json::to_string_pretty(&outcomes)?;
            let mut file = File::create(&output)?;
            file.write_all(json.as_bytes())?;
            println!("Report saved to {}", output);
        }
    }

    Ok(())
}
