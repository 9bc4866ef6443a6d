use crate::extract::extract_tagged;
use crate::llm::Generator;
use crate::models::{ComedyBrief, EnrichedArticle};

/// Optional deep-analysis stage: mine one enriched article for comedic raw
/// material (mockable numbers, quotable lines, pop-culture hooks) that the
/// scriptwriter can draw on.
pub struct Analyst<'a, G: Generator> {
    generator: &'a G,
}

impl<'a, G: Generator> Analyst<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    /// Briefs for each article that analyzes cleanly. Failures drop the
    /// brief, not the batch.
    pub async fn analyze_batch(&self, items: &[EnrichedArticle]) -> Vec<ComedyBrief> {
        let mut briefs = Vec::new();

        for item in items {
            match self.analyze_one(item).await {
                Ok(brief) => briefs.push(brief),
                Err(e) => {
                    eprintln!("Analysis failed for {}: {}", item.article.url, e);
                }
            }
        }

        briefs
    }

    async fn analyze_one(
        &self,
        item: &EnrichedArticle,
    ) -> Result<ComedyBrief, crate::error::PipelineError> {
        let prompt = build_analysis_prompt(item);
        let raw = self.generator.invoke(&prompt).await?;
        extract_tagged(&raw, "brief_json")
    }
}

fn build_analysis_prompt(item: &EnrichedArticle) -> String {
    // Bound prompt size; article bodies can be arbitrarily long
    let body = truncate_utf8(&item.body, 10_000);

    format!(
        r#"You are a comedy researcher. Read this article and pull out the raw
material a satirist would want.

Title: {}

Article:
{}

Return your findings in <brief_json> format:
<brief_json>
{{
    "key_points": ["..."],
    "main_players": ["companies, researchers, VCs involved"],
    "quotable_quotes": ["funny or mockable quotes"],
    "numbers_to_mock": ["funding amounts, metrics worth joking about"],
    "pop_culture_hooks": ["Black Mirror episodes etc."],
    "callback_hooks": ["elements worth referencing later"]
}}
</brief_json>"#,
        item.article.title, body
    )
}

fn truncate_utf8(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockGenerator;
    use crate::models::Article;

    fn enriched(url: &str, body: &str) -> EnrichedArticle {
        EnrichedArticle {
            article: Article {
                url: url.to_string(),
                title: "Sentient Toasters".to_string(),
                description: Some("desc".to_string()),
                source: None,
                published_at: None,
            },
            score: 9,
            rationale: "absurd premise".to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn parses_brief_from_tagged_response() {
        let response = r#"Here you go.
<brief_json>
{
  "key_points": ["toaster attained sentience", "refuses to toast bagels"],
  "main_players": ["CrumbCo"],
  "quotable_quotes": ["we did not expect the toast to unionize"],
  "numbers_to_mock": ["$2B seed round"],
  "pop_culture_hooks": ["Black Mirror"],
  "callback_hooks": ["toast union"]
}
</brief_json>"#;
        let mock = MockGenerator::always(response);
        let analyst = Analyst::new(&mock);

        let briefs = analyst
            .analyze_batch(&[enriched("https://ex.com/a", "full text")])
            .await;
        assert_eq!(briefs.len(), 1);
        assert_eq!(briefs[0].key_points.len(), 2);
        assert_eq!(briefs[0].main_players, vec!["CrumbCo"]);
    }

    #[tokio::test]
    async fn failed_analysis_drops_the_brief_only() {
        let mock = MockGenerator::replying(vec![
            Ok("prose with no tags".to_string()),
            Ok(r#"<brief_json>{"key_points": ["one"]}</brief_json>"#.to_string()),
        ]);
        let analyst = Analyst::new(&mock);

        let briefs = analyst
            .analyze_batch(&[
                enriched("https://ex.com/a", "text"),
                enriched("https://ex.com/b", "text"),
            ])
            .await;
        assert_eq!(briefs.len(), 1);
        assert_eq!(briefs[0].key_points, vec!["one"]);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let s = "é".repeat(6000); // 12000 bytes
        let t = truncate_utf8(&s, 10_000);
        assert!(t.len() <= 10_000);
        assert!(t.chars().all(|c| c == 'é'));
    }
}
