use anyhow::Result;

use crate::fetcher::BodyFetcher;
use crate::models::{EnrichedArticle, ScoredArticle};

/// Second pipeline stage: attach full body text to the top-scored items.
///
/// The cap is a deliberate cost boundary, not an accident: everything past
/// it is never fetched. Items whose retrieval comes back empty are dropped
/// and logged; partial enrichment is the normal case, and one unreachable
/// source must not fail the batch.
pub struct Enricher<'a, F: BodyFetcher> {
    fetcher: &'a F,
    cap: usize,
}

impl<'a, F: BodyFetcher> Enricher<'a, F> {
    pub fn new(fetcher: &'a F, cap: usize) -> Self {
        Self { fetcher, cap }
    }

    pub async fn enrich(&self, scored: Vec<ScoredArticle>) -> Result<Vec<EnrichedArticle>> {
        let mut enriched = Vec::new();

        for item in scored.into_iter().take(self.cap) {
            match self.fetcher.fetch_body(&item.article.url).await? {
                Some(body) => enriched.push(EnrichedArticle {
                    article: item.article,
                    score: item.score,
                    rationale: item.rationale,
                    body,
                }),
                None => {
                    eprintln!("No content for {}, dropping", item.article.url);
                }
            }
        }

        Ok(enriched)
    }
}
