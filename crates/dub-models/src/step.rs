//! Step catalog of the localization pipeline.

use std::fmt;
use std::str::FromStr;

use crate::artifact::ArtifactPath;
use crate::error::ModelError;
use crate::lang::Lang;

/// Name written to `currentStep` once a job has finished.
pub const TERMINAL_STEP: &str = "mux";

/// One stage of the pipeline.
///
/// `Upload` and `Mux` are accepted in step lists for compatibility with job
/// producers but carry no work: artifacts are uploaded by the step that makes
/// them, and muxing is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Ingest,
    Transcribe,
    Translate(Lang),
    Tts(Lang),
    Upload,
    Mux,
}

impl Step {
    /// Full pipeline used when a job does not list its steps.
    pub fn default_pipeline() -> Vec<Step> {
        vec![
            Step::Ingest,
            Step::Transcribe,
            Step::Translate(Lang::En),
            Step::Translate(Lang::Es),
            Step::Tts(Lang::En),
            Step::Tts(Lang::Es),
            Step::Upload,
            Step::Mux,
        ]
    }

    pub fn name(&self) -> String {
        match self {
            Step::Ingest => "ingest".to_string(),
            Step::Transcribe => "transcribe".to_string(),
            Step::Translate(lang) => format!("translate-{}", lang.code()),
            Step::Tts(lang) => format!("tts-{}", lang.code()),
            Step::Upload => "upload".to_string(),
            Step::Mux => TERMINAL_STEP.to_string(),
        }
    }

    /// Step whose output this step consumes.
    pub fn depends_on(&self) -> Option<Step> {
        match self {
            Step::Ingest | Step::Upload | Step::Mux => None,
            Step::Transcribe => Some(Step::Ingest),
            Step::Translate(_) => Some(Step::Transcribe),
            Step::Tts(lang) => Some(Step::Translate(*lang)),
        }
    }

    /// Canonical stored output. `None` means the step is never skipped.
    pub fn artifact(&self, video_id: &str) -> Option<ArtifactPath> {
        match self {
            Step::Transcribe => Some(ArtifactPath::subs(video_id, Lang::SOURCE)),
            Step::Translate(lang) => Some(ArtifactPath::subs(video_id, *lang)),
            Step::Tts(lang) => Some(ArtifactPath::dubs(video_id, *lang)),
            Step::Ingest | Step::Upload | Step::Mux => None,
        }
    }

    /// Whether running this step does any work.
    pub fn is_marker(&self) -> bool {
        matches!(self, Step::Upload | Step::Mux)
    }

    /// Parse a list of step names, failing on the first unknown one.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Step>, ModelError> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Step {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let unknown = || ModelError::UnknownStep(name.to_string());

        let step = match name {
            "ingest" => Step::Ingest,
            "transcribe" => Step::Transcribe,
            "upload" => Step::Upload,
            TERMINAL_STEP => Step::Mux,
            _ => {
                let (kind, code) = name.split_once('-').ok_or_else(unknown)?;
                let lang: Lang = code.parse().map_err(|_| unknown())?;
                if !lang.is_target() {
                    return Err(unknown());
                }
                match kind {
                    "translate" => Step::Translate(lang),
                    "tts" => Step::Tts(lang),
                    _ => return Err(unknown()),
                }
            }
        };
        Ok(step)
    }
}
