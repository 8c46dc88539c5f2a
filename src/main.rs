mod cli;

use mediafx::{batch, config};
use mfx_av::{
    CapabilityDetector, FfmpegEngine, FfprobeProber, Prober, TempStore, Tool, ToolRegistry,
};
use mfx_fonts::{FontFilter, FontRegistry, FontUpload};
use mfx_graph::{CROSSFADE_CATALOG, FADE_FAMILY};
use mfx_ops::{run_batch, ItemResult, OpContext};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, FontCommands};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediafx=trace,mfx_ops=trace,mfx_av=debug,mfx_graph=debug,mfx_fonts=debug".to_string()
        } else {
            "mediafx=info,mfx_ops=info,mfx_av=info,mfx_fonts=info,mfx_graph=warn".to_string()
        }
    });

    // Logs go to stderr; stdout carries results.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run {
            batch,
            continue_on_fail,
            output_dir,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_batch_file(&batch, config_path, continue_on_fail, output_dir))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, config_path, json))
        }
        Commands::CheckTools => check_tools(config_path),
        Commands::Capabilities { json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(show_capabilities(config_path, json))
        }
        Commands::Fonts { command } => fonts(command, config_path),
        Commands::Sweep { max_age_hours } => sweep(config_path, max_age_hours),
    }
}

async fn run_batch_file(
    batch_path: &Path,
    config_path: Option<&Path>,
    continue_on_fail: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let continue_on_fail = continue_on_fail || config.batch.continue_on_fail;
    let output_dir = output_dir
        .or_else(|| config.batch.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let items = batch::read_batch(batch_path)?;
    let tools = ToolRegistry::discover(&config.tools);
    let ctx = OpContext::from_config(&config, &tools)?;

    tracing::info!("Running {} work items from {:?}", items.len(), batch_path);
    match run_batch(&ctx, &items, continue_on_fail).await {
        Ok(results) => {
            print_results(&results, &output_dir)?;
            let failed = results.iter().filter(|r| !r.is_success()).count();
            tracing::info!("Batch complete: {} ok, {} failed", results.len() - failed, failed);
            Ok(())
        }
        Err(aborted) => {
            print_results(&aborted.completed, &output_dir)?;
            Err(anyhow::Error::new(aborted).context("Batch aborted"))
        }
    }
}

fn print_results(results: &[ItemResult], output_dir: &Path) -> Result<()> {
    for (index, result) in results.iter().enumerate() {
        let record = batch::result_record(index, result, output_dir)?;
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}

async fn probe_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }
    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools);
    let prober = FfprobeProber::new(tools.path_or_name(Tool::Ffprobe));
    let probe = prober.probe(file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&probe)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("Duration: {:.3}s", probe.duration);
    println!("Audio: {}", if probe.has_audio { "yes" } else { "no" });
    match &probe.video {
        Some(video) => {
            println!("Video: {}x{}", video.width, video.height);
            println!("  Sample aspect ratio: {}", video.sample_aspect_ratio);
            println!("  Frame rate: {}", video.frame_rate);
        }
        None => println!("Video: none"),
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available() {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.tool);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
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
        println!("Some tools are missing. Install ffmpeg to enable media operations.");
    }

    Ok(())
}

async fn show_capabilities(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools);
    let engine = Arc::new(FfmpegEngine::new(tools.path_or_name(Tool::Ffmpeg)));
    let detector = CapabilityDetector::new(engine);
    let caps = detector.capabilities().await;

    let mut transitions = serde_json::Map::new();
    for name in FADE_FAMILY.iter().chain(CROSSFADE_CATALOG) {
        let support = detector.check_transition_support(name).await;
        transitions.insert(name.to_string(), serde_json::to_value(support)?);
    }

    if json {
        let value = serde_json::json!({
            "capabilities": caps,
            "transitions": transitions,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Engine version: {} ({})", caps.version, caps.raw);
    println!("Cross-fade transitions: {}", if caps.crossfade { "yes" } else { "no" });
    println!("OpenGL transitions: {}", if caps.gl_transitions { "yes" } else { "no" });
    if !caps.crossfade {
        println!("\nOnly fade, fadeblack and fadewhite run natively; other transitions fall back to 'fade'.");
    }
    Ok(())
}

fn fonts(command: FontCommands, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let registry = FontRegistry::new(&config.fonts);

    match command {
        FontCommands::List { filter, json } => {
            let filter: FontFilter = filter.parse()?;
            let fonts = registry.list(filter);
            if json {
                println!("{}", serde_json::to_string_pretty(&fonts)?);
            } else if fonts.is_empty() {
                println!("No fonts found in {}", config.fonts.dir.display());
            } else {
                for font in &fonts {
                    println!(
                        "{:<20} {:<24} {:?} - {}",
                        font.key,
                        font.name,
                        font.origin,
                        font.path.display()
                    );
                }
            }
        }
        FontCommands::Upload {
            file,
            key,
            name,
            description,
        } => {
            let data = std::fs::read(&file)
                .with_context(|| format!("Failed to read font file: {:?}", file))?;
            let file_name = file.file_name().map(|n| n.to_string_lossy().into_owned());
            let entry = registry.upload(FontUpload {
                key: &key,
                name: name.as_deref(),
                description: description.as_deref(),
                file_name: file_name.as_deref(),
                data: &data,
            })?;
            println!("✓ Uploaded '{}' to {}", entry.key, entry.path.display());
        }
        FontCommands::Delete { key } => {
            let entry = registry.delete(&key)?;
            println!("✓ Deleted '{}'", entry.key);
        }
        FontCommands::Validate { key } => {
            let validation = registry.validate_key(&key);
            println!("{}", serde_json::to_string(&validation)?);
        }
        FontCommands::Info { key } => {
            let entry = registry.info(&key)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
    }
    Ok(())
}

fn sweep(config_path: Option<&Path>, max_age_hours: Option<u64>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let store = TempStore::from_config(&config.temp);
    let report = match max_age_hours {
        Some(hours) => store.sweep_older_than(std::time::Duration::from_secs(hours * 3600)),
        None => store.sweep(),
    };
    println!(
        "Swept {}: removed {} of {} files ({} failed)",
        store.base_dir().display(),
        report.removed,
        report.scanned,
        report.failed
    );
    Ok(())
}
