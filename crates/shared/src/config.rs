use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::models::{ScriptSegment, SegmentKind, Tone};

/// API credentials, loaded from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub newsapi_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").context(
            "ANTHROPIC_API_KEY not found.\n\n\
            To fix this, create ~/.config/ai-satirist/.env with:\n  \
            ANTHROPIC_API_KEY=your_key_here\n  \
            NEWSAPI_KEY=your_key_here\n\n\
            Get your Anthropic API key from: https://console.anthropic.com/settings/keys",
        )?;

        let newsapi_key = env::var("NEWSAPI_KEY").context(
            "NEWSAPI_KEY not found.\n\n\
            To fix this, create ~/.config/ai-satirist/.env with:\n  \
            ANTHROPIC_API_KEY=your_key_here\n  \
            NEWSAPI_KEY=your_key_here\n\n\
            Get your NewsAPI key from: https://newsapi.org/account",
        )?;

        Ok(Self {
            anthropic_api_key,
            newsapi_key,
        })
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/ai-satirist/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("ai-satirist").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() && dotenvy::from_path(&home_path).is_ok() {
                return;
            }
        }

        // If none found, that's okay - environment variables might be set system-wide
    }
}

/// Retry policy for the generative call wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub attempts: u32,
    pub multiplier_ms: u64,
    pub max_wait_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            multiplier_ms: 1000,
            max_wait_ms: 60_000,
        }
    }
}

/// Editorial constraints the generated script must satisfy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleGuide {
    pub banned_topics: Vec<String>,
    pub required_elements: Vec<String>,
    pub max_joke_density: f64,
    pub joke_density_tolerance: f64,
    pub voice: String,
    pub tones: Vec<Tone>,
    pub structure: Vec<SegmentKind>,
}

impl Default for StyleGuide {
    fn default() -> Self {
        Self {
            banned_topics: vec![
                "violence".to_string(),
                "racism".to_string(),
                "sexism".to_string(),
            ],
            required_elements: vec!["skynet_reference".to_string(), "vc_mockery".to_string()],
            max_joke_density: 0.3,
            joke_density_tolerance: 0.1,
            voice: "late-night desk satirist".to_string(),
            tones: vec![Tone::Sarcastic, Tone::Serious, Tone::Absurd],
            structure: vec![
                SegmentKind::Opener,
                SegmentKind::Segment,
                SegmentKind::TechnicalExplanation,
                SegmentKind::Callback,
                SegmentKind::Punchline,
            ],
        }
    }
}

/// Structural limits and the canonical fallback for the scriptwriter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptSettings {
    pub max_script_seconds: u32,
    /// Per-kind ceiling on a single segment's duration, in seconds.
    pub segment_length_limits: HashMap<SegmentKind, u32>,
    /// How many of the top-scored items feed the script prompt.
    pub headline_count: usize,
    pub fallback_tone: Tone,
    pub fallback_segments: Vec<ScriptSegment>,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        let mut segment_length_limits = HashMap::new();
        segment_length_limits.insert(SegmentKind::Opener, 40);
        segment_length_limits.insert(SegmentKind::Segment, 50);
        segment_length_limits.insert(SegmentKind::TechnicalExplanation, 45);
        segment_length_limits.insert(SegmentKind::Callback, 30);
        segment_length_limits.insert(SegmentKind::Punchline, 25);

        Self {
            max_script_seconds: 180,
            segment_length_limits,
            headline_count: 5,
            fallback_tone: Tone::Sarcastic,
            fallback_segments: vec![
                ScriptSegment {
                    kind: SegmentKind::Opener,
                    text: "Our AI comedy writer is experiencing technical difficulties, \
                           which is honestly the most relatable thing it has done all week."
                        .to_string(),
                    duration_seconds: 20,
                    references: Vec::new(),
                },
                ScriptSegment {
                    kind: SegmentKind::Punchline,
                    text: "We asked it to write jokes about the news. It wrote an error \
                           message about itself. Singularity confirmed."
                        .to_string(),
                    duration_seconds: 15,
                    references: Vec::new(),
                },
            ],
        }
    }
}

/// Scoring-stage knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutSettings {
    pub threshold: i64,
    pub enrich_cap: usize,
    pub cache_ttl_days: i64,
    /// Domains we never even try to fetch (paywalls, anti-bot walls).
    pub skip_domains: Vec<String>,
}

impl Default for ScoutSettings {
    fn default() -> Self {
        Self {
            threshold: 7,
            enrich_cap: 10,
            cache_ttl_days: 7,
            skip_domains: vec![
                "wsj.com".to_string(),
                "ft.com".to_string(),
                "nytimes.com".to_string(),
                "bloomberg.com".to_string(),
                "reuters.com".to_string(),
                "economist.com".to_string(),
                "forbes.com".to_string(),
                "medium.com".to_string(),
                "venturebeat.com".to_string(),
                "techcrunch.com".to_string(),
                "wired.com".to_string(),
                "theverge.com".to_string(),
                "washingtonpost.com".to_string(),
            ],
        }
    }
}

/// Whole-pipeline configuration, resolved once per process and passed
/// explicitly into each stage's constructor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SatireConfig {
    pub style_guide: StyleGuide,
    pub script: ScriptSettings,
    pub scout: ScoutSettings,
    pub retry: RetryConfig,
}

impl SatireConfig {
    /// Load from `~/.config/ai-satirist/config.json` when present,
    /// otherwise use the compiled-in defaults.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ai-satirist").join("config.json"))
    }
}
