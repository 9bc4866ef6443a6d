use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A raw headline as fetched from the news source. Immutable once fetched;
/// stages pass it by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub source: Option<String>,
    pub published_at: Option<String>,
}

impl Article {
    /// An article is scoreable when it has a stable identifier and enough
    /// text to judge it by. Anything else gets skipped, not scored.
    pub fn is_scoreable(&self) -> bool {
        !self.url.is_empty()
            && self.url.starts_with("http")
            && !self.title.is_empty()
            && self.description.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// An article that survived the scoring stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredArticle {
    pub article: Article,
    pub score: i64,
    pub rationale: String,
}

/// An article with its full body text attached. Only created when retrieval
/// actually produced content; there is no "enriched but empty" state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedArticle {
    pub article: Article,
    pub score: i64,
    pub rationale: String,
    pub body: String,
}

/// Comedic raw material extracted from one enriched article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComedyBrief {
    pub key_points: Vec<String>,
    #[serde(default)]
    pub main_players: Vec<String>,
    #[serde(default)]
    pub quotable_quotes: Vec<String>,
    #[serde(default)]
    pub numbers_to_mock: Vec<String>,
    #[serde(default)]
    pub pop_culture_hooks: Vec<String>,
    #[serde(default)]
    pub callback_hooks: Vec<String>,
}

/// The closed set of script segment kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Opener,
    Segment,
    TechnicalExplanation,
    Callback,
    Punchline,
}

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Opener => "opener",
            SegmentKind::Segment => "segment",
            SegmentKind::TechnicalExplanation => "technical_explanation",
            SegmentKind::Callback => "callback",
            SegmentKind::Punchline => "punchline",
        }
    }
}

/// The closed set of script tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Sarcastic,
    Serious,
    Absurd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptSegment {
    pub kind: SegmentKind,
    pub text: String,
    pub duration_seconds: u32,
    /// Only meaningful for callback segments: the kinds this one refers
    /// back to. Must all appear earlier in the script.
    #[serde(default)]
    pub references: Vec<SegmentKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptMetadata {
    pub generated_at: String,
    pub is_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ScriptMetadata {
    pub fn generated() -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            is_fallback: false,
            error: None,
            extra: HashMap::new(),
        }
    }

    pub fn fallback(error: impl Into<String>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            is_fallback: true,
            error: Some(error.into()),
            extra: HashMap::new(),
        }
    }
}

/// A complete satirical script. Always either a validated generated script
/// or the canonical fallback; callers never see a half-valid one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub segments: Vec<ScriptSegment>,
    pub tone: Tone,
    pub metadata: ScriptMetadata,
}

impl Script {
    pub fn total_duration_seconds(&self) -> u32 {
        self.segments.iter().map(|s| s.duration_seconds).sum()
    }
}
