use anyhow::Result;
use serde::Deserialize;

use crate::cache::ScoreCache;
use crate::error::PipelineError;
use crate::extract::extract_tagged;
use crate::llm::Generator;
use crate::models::{Article, ScoredArticle};

#[derive(Debug, Deserialize)]
struct QuickScore {
    score: i64,
    reason: String,
}

/// First pipeline stage: coarse comedy-potential scoring of raw headlines.
///
/// Scores come from the generative model but are cached by URL, so a
/// headline is only ever scored once per TTL window. A failed item scores 0
/// and stays in the batch flow; it never aborts the run. Cache write
/// failures do propagate - silently losing the result of a paid model call
/// is worse than stopping.
pub struct Scorer<'a, G: Generator> {
    generator: &'a G,
    cache: &'a ScoreCache,
}

impl<'a, G: Generator> Scorer<'a, G> {
    pub fn new(generator: &'a G, cache: &'a ScoreCache) -> Self {
        Self { generator, cache }
    }

    /// Score a batch and keep everything at or above `threshold`, highest
    /// score first. Ties keep their input order.
    pub async fn score_batch(
        &self,
        articles: Vec<Article>,
        threshold: i64,
    ) -> Result<Vec<ScoredArticle>> {
        let mut scored = Vec::new();

        for article in articles {
            // Unscoreable items can be neither judged nor cached
            if !article.is_scoreable() {
                eprintln!("Skipping unscoreable article: {}", article.title);
                continue;
            }

            if let Some(record) = self.cache.get(&article.url)? {
                scored.push(ScoredArticle {
                    article,
                    score: record.score,
                    rationale: record.rationale,
                });
                continue;
            }

            let (score, rationale) = match self.score_one(&article).await {
                Ok(quick) => {
                    // Cache every fresh score, pass or fail, so the next
                    // run never re-pays for this headline
                    self.cache
                        .put(&article.url, &article.title, quick.score, &quick.reason)?;
                    (quick.score, quick.reason)
                }
                Err(e) => {
                    eprintln!("Scoring failed for {}: {}", article.url, e);
                    (0, format!("scoring failed: {}", e))
                }
            };

            scored.push(ScoredArticle {
                article,
                score,
                rationale,
            });
        }

        scored.retain(|s| s.score >= threshold);
        // Stable sort: equal scores keep input order
        scored.sort_by_key(|s| std::cmp::Reverse(s.score));

        Ok(scored)
    }

    async fn score_one(&self, article: &Article) -> Result<QuickScore, PipelineError> {
        let prompt = build_score_prompt(article);
        let raw = self.generator.invoke(&prompt).await?;
        let quick: QuickScore = extract_tagged(&raw, "brief_json")?;

        // Out-of-range scores are failures, never clamped
        if !(1..=10).contains(&quick.score) {
            return Err(PipelineError::Validation(format!(
                "score {} outside 1-10",
                quick.score
            )));
        }

        Ok(quick)
    }
}

/// Scoring prompts carry only title and description. Full bodies would
/// balloon token cost for headlines that mostly score below threshold.
fn build_score_prompt(article: &Article) -> String {
    format!(
        r#"Rate the comedy potential (1-10) of this tech news story.
BE EXTREMELY SELECTIVE. A score of 7+ should be rare and means clear tech
industry ego, obvious irony, or rich personality-driven drama. Most stories
are regular news and should score below 7.

Title: {}
Description: {}

Return your score in <brief_json> format:
<brief_json>
{{
    "score": number (1-10),
    "reason": "one line explaining the score"
}}
</brief_json>"#,
        article.title,
        article.description.as_deref().unwrap_or("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockGenerator;

    fn article(url: &str, title: &str) -> Article {
        Article {
            url: url.to_string(),
            title: title.to_string(),
            description: Some("A short description".to_string()),
            source: Some("TechCrunch".to_string()),
            published_at: None,
        }
    }

    fn brief(score: i64, reason: &str) -> String {
        format!(
            "<brief_json>{{\"score\": {}, \"reason\": \"{}\"}}</brief_json>",
            score, reason
        )
    }

    #[tokio::test]
    async fn scores_and_caches_a_fresh_article() {
        let cache = ScoreCache::open_in_memory(7).unwrap();
        let mock = MockGenerator::always(&brief(9, "absurd premise"));
        let scorer = Scorer::new(&mock, &cache);

        let items = vec![article(
            "https://ex.com/u1",
            "AI Startup Claims Breakthrough in Sentient Toasters",
        )];

        let result = scorer.score_batch(items.clone(), 7).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].score, 9);
        assert_eq!(result[0].rationale, "absurd premise");
        assert_eq!(mock.call_count(), 1);

        // Second pass within TTL: zero further generative calls
        let again = scorer.score_batch(items, 7).await.unwrap();
        assert_eq!(again[0].score, 9);
        assert_eq!(again[0].rationale, "absurd premise");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn results_sorted_descending_with_stable_ties() {
        let cache = ScoreCache::open_in_memory(7).unwrap();
        cache.put("https://ex.com/a", "A", 7, "fine").unwrap();
        cache.put("https://ex.com/b", "B", 9, "gold").unwrap();
        cache.put("https://ex.com/c", "C", 7, "also fine").unwrap();
        let mock = MockGenerator::always_failing("should not be called");
        let scorer = Scorer::new(&mock, &cache);

        let items = vec![
            article("https://ex.com/a", "A headline long enough"),
            article("https://ex.com/b", "B headline long enough"),
            article("https://ex.com/c", "C headline long enough"),
        ];

        let result = scorer.score_batch(items, 7).await.unwrap();
        let order: Vec<&str> = result.iter().map(|s| s.article.url.as_str()).collect();
        assert_eq!(
            order,
            vec!["https://ex.com/b", "https://ex.com/a", "https://ex.com/c"]
        );
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn out_of_range_score_becomes_zero_not_clamped() {
        let cache = ScoreCache::open_in_memory(7).unwrap();
        let mock = MockGenerator::always(&brief(11, "over-enthusiastic model"));
        let scorer = Scorer::new(&mock, &cache);

        let items = vec![article("https://ex.com/a", "A headline long enough")];
        let result = scorer.score_batch(items, 1).await.unwrap();

        // Failed item scored 0, below any threshold >= 1
        assert!(result.is_empty());
        // Failures are not cached; the next run may retry
        assert!(cache.get("https://ex.com/a").unwrap().is_none());
    }

    #[tokio::test]
    async fn one_bad_item_does_not_abort_the_batch() {
        let cache = ScoreCache::open_in_memory(7).unwrap();
        let mock = MockGenerator::replying(vec![
            Ok("no tags here, just vibes".to_string()),
            Ok(brief(8, "solid hubris")),
        ]);
        let scorer = Scorer::new(&mock, &cache);

        let items = vec![
            article("https://ex.com/bad", "Bad response headline here"),
            article("https://ex.com/good", "Good response headline here"),
        ];

        let result = scorer.score_batch(items, 7).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].article.url, "https://ex.com/good");
    }

    #[tokio::test]
    async fn below_threshold_scores_are_cached_but_filtered() {
        let cache = ScoreCache::open_in_memory(7).unwrap();
        let mock = MockGenerator::always(&brief(3, "just a press release"));
        let scorer = Scorer::new(&mock, &cache);

        let items = vec![article("https://ex.com/a", "A headline long enough")];
        let result = scorer.score_batch(items, 7).await.unwrap();

        assert!(result.is_empty());
        let record = cache.get("https://ex.com/a").unwrap().unwrap();
        assert_eq!(record.score, 3);
    }

    #[tokio::test]
    async fn unscoreable_items_are_skipped_without_model_calls() {
        let cache = ScoreCache::open_in_memory(7).unwrap();
        let mock = MockGenerator::always(&brief(9, "unused"));
        let scorer = Scorer::new(&mock, &cache);

        let mut no_description = article("https://ex.com/a", "Has a title but no description");
        no_description.description = None;
        let no_url = article("", "Has no identifier at all");

        let result = scorer.score_batch(vec![no_description, no_url], 1).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(mock.call_count(), 0);
    }
}
