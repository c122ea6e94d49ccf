mod cli;

use vidrelay::{
    chat::{self, DirectorySink, DiscordClient},
    config,
    pipeline::{PipelineOutcome, VideoPipeline},
};
use vidrelay_av::tools::FFPROBE;
use vidrelay_av::{CompressionPlan, FfprobeProber, ToolRegistry};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vidrelay=trace,vidrelay_av=trace,reqwest=debug".to_string()
        } else {
            "vidrelay=info,vidrelay_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Send {
            url,
            channel,
            message,
            notify,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(send(&url, &channel, &message, notify, cli.config.as_deref()))
        }
        Commands::Fetch { url, out, notify } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(fetch(&url, &out, notify, cli.config.as_deref()))
        }
        Commands::Plan {
            duration,
            max_upload_mb,
            json,
        } => show_plan(duration, max_upload_mb, json, cli.config.as_deref()),
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, json, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("vidrelay {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn finish(outcome: PipelineOutcome) -> Result<()> {
    match outcome {
        PipelineOutcome::Delivered(_) => {
            println!("{}", outcome);
            Ok(())
        }
        other => anyhow::bail!("{}", other),
    }
}

async fn send(
    url: &str,
    channel: &str,
    message: &str,
    notify: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let url = chat::parse_source(url)?;

    let client = DiscordClient::new(&config.discord)?;
    let pipeline = VideoPipeline::from_config(&config)?;
    let target = client.message(channel, message);

    tracing::info!("Delivering {} to channel {}", url, channel);
    let outcome = pipeline
        .deliver(&target, &url, notify || config.notify.errors)
        .await;

    finish(outcome)
}

async fn fetch(url: &str, out: &Path, notify: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let url = chat::parse_source(url)?;

    let pipeline = VideoPipeline::from_config(&config)?;
    let sink = DirectorySink::new(out);

    let outcome = pipeline
        .deliver(&sink, &url, notify || config.notify.errors)
        .await;

    for path in sink.delivered() {
        println!("Output: {}", path.display());
    }

    finish(outcome)
}

fn show_plan(
    duration: f64,
    max_upload_mb: Option<u64>,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let mut limits = config.limits;
    if let Some(mb) = max_upload_mb {
        if mb == 0 {
            anyhow::bail!("--max-upload-mb cannot be 0");
        }
        limits.max_upload_mb = mb;
    }

    let plan = CompressionPlan::new(limits.target_size_kb(), duration, None)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("Upload ceiling: {} bytes", limits.upload_ceiling_bytes());
        println!("Target size:    {} KB", plan.target_size_kb);
        println!("Duration:       {:.1} s", plan.duration_secs);
        println!("Total bitrate:  {:.0} bps", plan.total_bitrate_bps.floor());
        println!("Audio bitrate:  {} bps", plan.audio_bitrate_arg());
        println!("Video bitrate:  {} bps", plan.video_bitrate_arg());
    }

    Ok(())
}

async fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let registry = ToolRegistry::discover(&config.tools);
    let prober = FfprobeProber::new(registry.require(FFPROBE)?.clone());
    let summary = prober.probe(file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("File: {}", summary.file_path.display());
        println!("Container: {}", summary.container);
        println!("Size: {} bytes", summary.file_size);
        let secs = summary.duration.as_secs();
        println!(
            "Duration: {:02}:{:02}:{:02}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        );
        if let Some(ref codec) = summary.video_codec {
            println!("Video: {}", codec);
        }
        match summary.audio_bitrate {
            Some(bps) => println!("Audio bitrate: {} bps", bps),
            None => println!("Audio bitrate: unknown"),
        }
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them before delivering videos.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Max upload: {} MB", config.limits.max_upload_mb);
    println!("  Max duration: {} s", config.limits.max_duration_secs);
    println!("  Workspace root: {}", config.workspace.root.display());
    println!("  Discord API: {}", config.discord.api_base);
    println!(
        "  Discord token: {}",
        if config.discord.token.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!("  Error notices: {}", config.notify.errors);

    Ok(())
}
