use anyhow::{Context, Result};
use clap::Parser;
use shared::{
    ClaudeClient, Config, RetryingGenerator, SamplingProfile, SatireConfig, Scriptwriter,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "write-script")]
#[command(about = "Turn a saved news batch into a satirical audio script")]
struct Args {
    /// Path to a batch file (defaults to the newest saved batch)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Print the script JSON to stdout instead of saving it
    #[arg(long)]
    stdout: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;
    let satire = SatireConfig::load()?;

    let batch_file = if let Some(path) = args.file {
        path
    } else {
        newest_batch_file()?
    };

    println!("📖 Loading batch: {}", batch_file.display());
    let batch = shared::load_batch(&batch_file)?;
    println!(
        "✓ {} enriched articles from query \"{}\"",
        batch.articles.len(),
        batch.query
    );

    let generator = RetryingGenerator::new(
        ClaudeClient::new(config.anthropic_api_key, SamplingProfile::scripting())?,
        satire.retry.clone(),
    );
    let writer = Scriptwriter::new(&generator, satire.style_guide, satire.script)
        .context("Scriptwriter configuration is invalid")?;

    println!("\n✍️  Writing script...");
    let script = writer.write_script(&batch.articles).await;

    if script.metadata.is_fallback {
        println!(
            "⚠ Generation failed ({}), using fallback script.",
            script.metadata.error.as_deref().unwrap_or("unknown error")
        );
    } else {
        println!(
            "✓ Script generated: {} segments, {}s total",
            script.segments.len(),
            script.total_duration_seconds()
        );
    }

    if args.stdout {
        println!("{}", serde_json::to_string_pretty(&script)?);
        return Ok(());
    }

    let stem = batch_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("batch");
    let filepath = shared::save_script(&script, &format!("{}-script.json", stem))
        .context("Failed to save script")?;

    println!("\n✅ Script saved to: {}", filepath.display());

    Ok(())
}

fn newest_batch_file() -> Result<PathBuf> {
    let files = shared::list_batch_files()?;

    let Some((path, data)) = files.into_iter().next() else {
        anyhow::bail!("No batch files found. Run scout-news first.");
    };

    println!(
        "Using newest batch from {} ({} articles)",
        data.created_at,
        data.articles.len()
    );
    Ok(path)
}
