//! External collaborators of the command handlers
//!
//! HTTP clients for the video platform and the local LLM, plus the
//! ingredient extraction and title matching built on top of them.

pub mod enrichment;
pub mod ollama_client;
pub mod title_matcher;
pub mod youtube_client;

pub use enrichment::{extract_patterns, Enricher, ExtractedIngredients, ExtractionSource};
pub use ollama_client::{LlmError, OllamaClient};
pub use title_matcher::{best_match, similarity, MATCH_THRESHOLD};
pub use youtube_client::{
    find_token, TokenSource, VideoAnalytics, VideoStats, YouTubeClient, YouTubeError,
};
