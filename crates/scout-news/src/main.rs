use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use shared::{
    Analyst, Article, BatchData, ClaudeClient, Config, ContentFetcher, Enricher, NewsClient,
    RetryingGenerator, SamplingProfile, SatireConfig, ScoreCache, Scorer,
};

#[derive(Parser)]
#[command(name = "scout-news")]
#[command(about = "Fetch AI headlines, score their comedy potential, and save an enriched batch")]
struct Args {
    /// Search query for headlines
    #[arg(short, long, default_value = "artificial intelligence")]
    query: String,

    /// How many headlines to fetch
    #[arg(short, long, default_value = "20")]
    page_size: usize,

    /// Minimum comedy score to keep (overrides config)
    #[arg(short, long)]
    threshold: Option<i64>,

    /// Also run comedy-brief analysis on the enriched articles
    #[arg(long)]
    analyze: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;
    let satire = SatireConfig::load()?;
    let threshold = args.threshold.unwrap_or(satire.scout.threshold);

    println!("📰 Fetching headlines for \"{}\"...", args.query);
    let news_client = NewsClient::new(config.newsapi_key)?;
    let articles: Vec<Article> = news_client
        .fetch_headlines(&args.query, args.page_size)
        .await
        .context("Failed to fetch headlines")?;

    if articles.is_empty() {
        println!("No usable headlines found for \"{}\".", args.query);
        return Ok(());
    }
    println!("✓ {} headlines fetched", articles.len());

    let cache_path = shared::get_default_cache_path()?;
    let cache = ScoreCache::open(&cache_path, satire.scout.cache_ttl_days)?;

    println!("\n🎭 Scoring comedy potential (threshold {})...", threshold);
    let scoring = RetryingGenerator::new(
        ClaudeClient::new(config.anthropic_api_key.clone(), SamplingProfile::scoring())?,
        satire.retry.clone(),
    );
    let scorer = Scorer::new(&scoring, &cache);
    let scored = scorer.score_batch(articles, threshold).await?;

    let purged = cache.purge_expired()?;
    if purged > 0 {
        println!("  (purged {} expired cache entries)", purged);
    }

    if scored.is_empty() {
        println!("Nothing scored above {} today. The news is too sane.", threshold);
        return Ok(());
    }
    println!("✓ {} stories above threshold", scored.len());

    println!("\n📄 Fetching full article text...");
    let fetcher = ContentFetcher::new(satire.scout.skip_domains.clone())?;
    let enricher = Enricher::new(&fetcher, satire.scout.enrich_cap);
    let enriched = enricher.enrich(scored).await?;

    if enriched.is_empty() {
        println!("Could not retrieve content for any story. Nothing to save.");
        return Ok(());
    }
    println!("✓ {} articles enriched", enriched.len());

    if args.analyze {
        println!("\n🔎 Extracting comedy briefs...");
        let analyst = Analyst::new(&scoring);
        let briefs = analyst.analyze_batch(&enriched).await;
        for brief in &briefs {
            for point in &brief.key_points {
                println!("  - {}", point);
            }
        }
    }

    let filename = format!("batch-{}.json", Utc::now().format("%Y%m%d-%H%M%S"));
    let data = BatchData::new(args.query, enriched);
    let filepath = shared::save_batch(&data, &filename).context("Failed to save batch")?;

    println!("\n✅ Batch saved to: {}", filepath.display());
    println!("Next: run write-script to turn it into a script.");

    Ok(())
}
