use serde::Deserialize;

use crate::config::{ScriptSettings, StyleGuide};
use crate::error::PipelineError;
use crate::extract::extract_tagged;
use crate::llm::Generator;
use crate::models::{
    EnrichedArticle, Script, ScriptMetadata, ScriptSegment, SegmentKind, Tone,
};

/// Stage marker the model is asked to embed where an audience laugh lands.
/// Counted by the joke-density check.
const LAUGH_CUE: &str = "<audience_laugh>";

/// Wire format of the generated script, as the prompt asks for it.
#[derive(Debug, Deserialize)]
struct RawScript {
    script: Vec<RawSegment>,
    tone: Tone,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    #[serde(rename = "type")]
    kind: SegmentKind,
    text: String,
    length_sec: u32,
    #[serde(default)]
    references: Vec<SegmentKind>,
}

/// Final pipeline stage: turn enriched articles into a satirical script.
///
/// A two-outcome state machine. Either the model's output survives tag
/// extraction plus every schema check, or the caller gets the canonical
/// fallback script stamped with the triggering error. Nothing in between
/// ever escapes, and `write_script` itself cannot fail: the fallback is
/// validated once at construction, where a broken one is a fatal
/// configuration error.
#[derive(Debug)]
pub struct Scriptwriter<'a, G: Generator> {
    generator: &'a G,
    style: StyleGuide,
    settings: ScriptSettings,
}

impl<'a, G: Generator> Scriptwriter<'a, G> {
    pub fn new(
        generator: &'a G,
        style: StyleGuide,
        settings: ScriptSettings,
    ) -> Result<Self, PipelineError> {
        let writer = Self {
            generator,
            style,
            settings,
        };

        // The safety net has to hold before we rely on it
        let fallback = writer.fallback_script("construction check");
        writer.validate(&fallback).map_err(|e| {
            PipelineError::Configuration(format!("fallback script is itself invalid: {}", e))
        })?;

        Ok(writer)
    }

    /// Always returns a structurally valid script. Generation or validation
    /// failures surface only through `metadata.is_fallback` and the
    /// embedded error message.
    pub async fn write_script(&self, items: &[EnrichedArticle]) -> Script {
        match self.try_generate(items).await {
            Ok(script) => script,
            Err(e) => {
                eprintln!("Script generation failed: {}", e);
                self.fallback_script(&e.to_string())
            }
        }
    }

    async fn try_generate(&self, items: &[EnrichedArticle]) -> Result<Script, PipelineError> {
        self.validate_input(items)?;

        let prompt = self.build_prompt(items);
        let raw_response = self.generator.invoke(&prompt).await?;

        let raw: RawScript = extract_tagged(&raw_response, "script_json")?;
        let mut script = Script {
            segments: raw
                .script
                .into_iter()
                .map(|s| ScriptSegment {
                    kind: s.kind,
                    text: s.text,
                    duration_seconds: s.length_sec,
                    references: s.references,
                })
                .collect(),
            tone: raw.tone,
            metadata: ScriptMetadata::generated(),
        };

        self.validate(&script)?;

        script
            .metadata
            .extra
            .insert("source_articles".to_string(), items.len().into());
        script.metadata.extra.insert(
            "total_length_sec".to_string(),
            script.total_duration_seconds().into(),
        );

        Ok(script)
    }

    fn validate_input(&self, items: &[EnrichedArticle]) -> Result<(), PipelineError> {
        if items.is_empty() {
            return Err(PipelineError::Validation(
                "no articles to write about".to_string(),
            ));
        }
        for item in items {
            if item.article.title.is_empty() || item.body.is_empty() {
                return Err(PipelineError::Validation(format!(
                    "article {} is missing title or body",
                    item.article.url
                )));
            }
        }
        Ok(())
    }

    fn build_prompt(&self, items: &[EnrichedArticle]) -> String {
        let headlines: Vec<String> = items
            .iter()
            .take(self.settings.headline_count)
            .map(|i| format!("- {}", i.article.title))
            .collect();

        let tones: Vec<&str> = self
            .style
            .tones
            .iter()
            .map(|t| match t {
                Tone::Sarcastic => "sarcastic",
                Tone::Serious => "serious",
                Tone::Absurd => "absurd",
            })
            .collect();

        let structure: Vec<&str> = self.style.structure.iter().map(|k| k.as_str()).collect();

        format!(
            r#"You are the {voice}. Write a satirical news script about these AI stories:
{headlines}

REQUIREMENTS:
1. Segment structure, in order: {structure}
2. Required elements: {required}
3. Mark each laugh line with {laugh_cue}
4. At most {density} jokes per word of script
5. Callback segments must list the earlier segment types they refer to
6. Total runtime must stay under {max_secs} seconds
7. Never touch these topics: {banned}

Return the script in <script_json> format:
<script_json>
{{
    "script": [
        {{"type": "opener", "text": "...", "length_sec": 20}},
        {{"type": "segment", "text": "...", "length_sec": 35}},
        {{"type": "callback", "text": "...", "length_sec": 20, "references": ["opener"]}},
        {{"type": "punchline", "text": "...", "length_sec": 15}}
    ],
    "tone": "one of: {tones}"
}}
</script_json>"#,
            voice = self.style.voice,
            headlines = headlines.join("\n"),
            structure = structure.join(", "),
            required = self.style.required_elements.join(", "),
            laugh_cue = LAUGH_CUE,
            density = self.style.max_joke_density,
            max_secs = self.settings.max_script_seconds,
            banned = self.style.banned_topics.join(", "),
            tones = tones.join(", "),
        )
    }

    /// Full schema validation per the script invariants. Any violation
    /// invalidates the whole script.
    fn validate(&self, script: &Script) -> Result<(), PipelineError> {
        if script.segments.is_empty() {
            return Err(PipelineError::Validation("script has no segments".to_string()));
        }

        if script.segments.first().map(|s| s.kind) != Some(SegmentKind::Opener) {
            return Err(PipelineError::Validation(
                "script must start with an opener".to_string(),
            ));
        }
        if script.segments.last().map(|s| s.kind) != Some(SegmentKind::Punchline) {
            return Err(PipelineError::Validation(
                "script must end with a punchline".to_string(),
            ));
        }

        if !self.style.tones.contains(&script.tone) {
            return Err(PipelineError::Validation(format!(
                "tone {:?} is not in the configured set",
                script.tone
            )));
        }

        // Callback closure: references only to kinds already seen
        let mut seen: Vec<SegmentKind> = Vec::new();
        for segment in &script.segments {
            if segment.kind == SegmentKind::Callback {
                for reference in &segment.references {
                    if !seen.contains(reference) {
                        return Err(PipelineError::Validation(format!(
                            "callback references {} before it appears",
                            reference.as_str()
                        )));
                    }
                }
            }
            seen.push(segment.kind);
        }

        let total = script.total_duration_seconds();
        if total > self.settings.max_script_seconds {
            return Err(PipelineError::Validation(format!(
                "script runs {}s, ceiling is {}s",
                total, self.settings.max_script_seconds
            )));
        }

        for segment in &script.segments {
            if let Some(&limit) = self.settings.segment_length_limits.get(&segment.kind) {
                if segment.duration_seconds > limit {
                    return Err(PipelineError::Validation(format!(
                        "{} segment runs {}s, limit is {}s",
                        segment.kind.as_str(),
                        segment.duration_seconds,
                        limit
                    )));
                }
            }
            if segment.text.trim().is_empty() {
                return Err(PipelineError::Validation(format!(
                    "{} segment has no text",
                    segment.kind.as_str()
                )));
            }
        }

        self.check_banned_topics(script)?;
        self.check_joke_density(script)?;

        Ok(())
    }

    fn check_banned_topics(&self, script: &Script) -> Result<(), PipelineError> {
        for segment in &script.segments {
            let text_lower = segment.text.to_lowercase();
            for topic in &self.style.banned_topics {
                if text_lower.contains(&topic.to_lowercase()) {
                    return Err(PipelineError::Validation(format!(
                        "script contains banned topic: {}",
                        topic
                    )));
                }
            }
        }
        Ok(())
    }

    /// Post-hoc density check with a tolerance band. A "joke" is a laugh
    /// cue or a callback/punchline segment; the denominator is total words.
    fn check_joke_density(&self, script: &Script) -> Result<(), PipelineError> {
        let mut jokes = 0usize;
        let mut words = 0usize;

        for segment in &script.segments {
            jokes += segment.text.matches(LAUGH_CUE).count();
            if matches!(segment.kind, SegmentKind::Callback | SegmentKind::Punchline) {
                jokes += 1;
            }
            words += segment.text.split_whitespace().count();
        }

        if words == 0 {
            return Err(PipelineError::Validation("script has no words".to_string()));
        }

        let density = jokes as f64 / words as f64;
        let ceiling = self.style.max_joke_density + self.style.joke_density_tolerance;
        if density > ceiling {
            return Err(PipelineError::Validation(format!(
                "joke density {:.3} exceeds {:.3}",
                density, ceiling
            )));
        }

        Ok(())
    }

    fn fallback_script(&self, error: &str) -> Script {
        Script {
            segments: self.settings.fallback_segments.clone(),
            tone: self.settings.fallback_tone,
            metadata: ScriptMetadata::fallback(error),
        }
    }
}
