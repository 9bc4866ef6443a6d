use anyhow::Result;

use crate::cache::ScoreCache;
use crate::config::SatireConfig;
use crate::enricher::Enricher;
use crate::fetcher::ContentFetcher;
use crate::llm::Generator;
use crate::models::{Article, Script};
use crate::scorer::Scorer;
use crate::scriptwriter::Scriptwriter;

/// Explicit pipeline driver: Scorer -> Enricher -> Scriptwriter, strictly in
/// that order, each stage consuming the previous stage's validated output.
/// The score cache is the only state shared across runs; everything else is
/// handed off by value.
pub struct Pipeline<'a, G: Generator> {
    config: &'a SatireConfig,
    scoring_generator: &'a G,
    scripting_generator: &'a G,
    cache: &'a ScoreCache,
    fetcher: &'a ContentFetcher,
}

impl<'a, G: Generator> Pipeline<'a, G> {
    pub fn new(
        config: &'a SatireConfig,
        scoring_generator: &'a G,
        scripting_generator: &'a G,
        cache: &'a ScoreCache,
        fetcher: &'a ContentFetcher,
    ) -> Self {
        Self {
            config,
            scoring_generator,
            scripting_generator,
            cache,
            fetcher,
        }
    }

    pub async fn run(&self, articles: Vec<Article>) -> Result<Script> {
        let scorer = Scorer::new(self.scoring_generator, self.cache);
        let scored = scorer
            .score_batch(articles, self.config.scout.threshold)
            .await?;
        eprintln!("{} articles above threshold", scored.len());

        // Opportunistic sweep once the expensive calls are done
        self.cache.purge_expired()?;

        let enricher = Enricher::new(self.fetcher, self.config.scout.enrich_cap);
        let enriched = enricher.enrich(scored).await?;
        eprintln!("{} articles enriched", enriched.len());

        let writer = Scriptwriter::new(
            self.scripting_generator,
            self.config.style_guide.clone(),
            self.config.script.clone(),
        )?;
        Ok(writer.write_script(&enriched).await)
    }
}
