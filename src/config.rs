use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub session: SessionDefaults,
    pub capture: CaptureConfig,
    pub drafts: DraftConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionDefaults {
    /// Questions per session before auto-completion
    pub max_questions: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Answer buffer bound in characters
    pub answer_max_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftConfig {
    /// Seconds between autosave ticks
    pub autosave_interval_secs: u64,

    /// Directory for the file-backed draft store
    pub dir: String,
}

impl EngineConfig {
    /// Load configuration, layering an optional file over built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("session.max_questions", 10)?
            .set_default("capture.answer_max_chars", 2000)?
            .set_default("drafts.autosave_interval_secs", 30)?
            .set_default("drafts.dir", "drafts")?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.drafts.autosave_interval_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session: SessionDefaults { max_questions: 10 },
            capture: CaptureConfig {
                answer_max_chars: 2000,
            },
            drafts: DraftConfig {
                autosave_interval_secs: 30,
                dir: "drafts".to_string(),
            },
        }
    }
}
