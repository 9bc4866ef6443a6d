// Public modules
pub mod analyst;
pub mod cache;
pub mod config;
pub mod enricher;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod io;
pub mod llm;
pub mod models;
pub mod news;
pub mod pipeline;
pub mod scorer;
pub mod scriptwriter;

// Re-export commonly used types
pub use analyst::Analyst;
pub use cache::{ScoreCache, ScoreRecord};
pub use config::{Config, SatireConfig};
pub use enricher::Enricher;
pub use error::PipelineError;
pub use extract::extract_tagged;
pub use fetcher::{BodyFetcher, ContentFetcher};
pub use io::{get_default_batch_dir, get_default_cache_path, list_batch_files, load_batch, save_batch, save_script, BatchData};
pub use llm::{ClaudeClient, Generator, RetryingGenerator, SamplingProfile};
pub use models::{Article, ComedyBrief, EnrichedArticle, Script, ScoredArticle, ScriptSegment, SegmentKind, Tone};
pub use news::NewsClient;
pub use pipeline::Pipeline;
pub use scorer::Scorer;
pub use scriptwriter::Scriptwriter;
