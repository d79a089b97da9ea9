//! Step pipeline executor.
//!
//! Runs one job's steps in order against the artifact store. A step whose
//! canonical artifact already exists is skipped, so a job that failed or was
//! interrupted can be re-run and only recomputes what is missing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tempfile::TempDir;
use tracing::{debug, error, Instrument};

use dub_firestore::JobLedger;
use dub_models::{
    ArtifactPath, Job, JobStatus, Lang, Step, SubtitleDocument, VideoSummary, TERMINAL_STEP,
};
use dub_storage::ArtifactStore;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::reporter::JobReporter;
use crate::services::{AudioSource, SpeechSynthesizer, Transcriber, Translator};
use crate::synthesis::{synthesize_dub, Synthesis};
use crate::translation::translate_srt;

/// Adapters shared by every job, built once at start-up.
pub struct PipelineContext {
    pub store: Arc<dyn ArtifactStore>,
    pub ledger: Arc<dyn JobLedger>,
    pub audio: Arc<dyn AudioSource>,
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    /// Parent of the per-job scratch directories.
    pub work_dir: PathBuf,
}

/// Files produced or fetched during one run, keyed by artifact key.
struct RunState {
    video_id: String,
    dir: TempDir,
    wav: Option<PathBuf>,
    local: HashMap<String, PathBuf>,
}

impl RunState {
    fn path(&self) -> &Path {
        self.dir.path()
    }
}

pub struct PipelineExecutor {
    ctx: Arc<PipelineContext>,
}

impl PipelineExecutor {
    pub fn new(ctx: Arc<PipelineContext>) -> Self {
        Self { ctx }
    }

    /// Run `job` to a terminal status and return it.
    ///
    /// Pipeline failures are recorded on the job and reported as
    /// `Ok(JobStatus::Failed)`; `Err` means the failure itself could not be
    /// written to the ledger.
    pub async fn execute(&self, job: &Job) -> WorkerResult<JobStatus> {
        let logger = JobLogger::new(&job.id, job.video_id());
        let span = logger.create_span();
        let reporter = JobReporter::new(Arc::clone(&self.ctx.ledger), job.id.clone(), logger);

        self.execute_reported(job, &reporter).instrument(span).await
    }

    async fn execute_reported(&self, job: &Job, reporter: &JobReporter) -> WorkerResult<JobStatus> {
        let Some(video_id) = job.video_id() else {
            reporter.logger().log_error("missing videoId");
            reporter.log("Job has no videoId").await?;
            reporter.set_status(JobStatus::Failed, None).await?;
            metrics::record_job_failed("rejected");
            return Ok(JobStatus::Failed);
        };

        reporter.logger().log_start(&format!("video {}", video_id));
        match self.run(job, video_id, reporter).await {
            Ok(()) => {
                reporter.logger().log_completion(video_id);
                metrics::record_job_completed();
                Ok(JobStatus::Done)
            }
            Err(e) => {
                let message = e.job_log_message();
                reporter.logger().log_error(&message);
                metrics::record_job_failed(if e.is_process_failure() {
                    "subprocess"
                } else {
                    "error"
                });

                let logged = reporter.log(&message).await;
                let status = reporter.set_status(JobStatus::Failed, None).await;
                if let Err(ledger_err) = logged.and(status) {
                    error!(job_id = %job.id, "Could not record job failure: {}", ledger_err);
                    return Err(ledger_err);
                }
                Ok(JobStatus::Failed)
            }
        }
    }

    async fn run(&self, job: &Job, video_id: &str, reporter: &JobReporter) -> WorkerResult<()> {
        let steps = job.resolved_steps()?;

        let first = steps.first().map(Step::name);
        let resume_at = job.current_step.as_deref().or(first.as_deref());
        reporter.set_status(JobStatus::Running, resume_at).await?;

        tokio::fs::create_dir_all(&self.ctx.work_dir).await?;
        let dir = tempfile::Builder::new()
            .prefix("job-")
            .tempdir_in(&self.ctx.work_dir)?;
        let mut state = RunState {
            video_id: video_id.to_string(),
            dir,
            wav: None,
            local: HashMap::new(),
        };

        for step in &steps {
            let name = step.name();
            reporter.set_status(JobStatus::Running, Some(&name)).await?;

            let started = Instant::now();
            let executed = self
                .run_step(*step, &mut state, reporter)
                .instrument(reporter.logger().step_span(&name))
                .await?;
            if executed {
                metrics::record_step_executed(&name, started.elapsed().as_secs_f64());
            } else {
                metrics::record_step_skipped(&name);
            }
        }

        // Scratch files are no longer needed once every artifact is uploaded.
        drop(state);

        self.ctx.ledger.upsert_video(&VideoSummary::ready(video_id)).await?;
        self.ctx.ledger.record_steps(&job.id, &steps).await?;
        reporter
            .set_status(JobStatus::Done, Some(TERMINAL_STEP))
            .await?;
        reporter.log("Completed").await?;
        Ok(())
    }

    /// Returns `false` when the step had nothing to do.
    async fn run_step(
        &self,
        step: Step,
        state: &mut RunState,
        reporter: &JobReporter,
    ) -> WorkerResult<bool> {
        if step == Step::Ingest {
            reporter.log("Downloading audio").await?;
            let wav = self.ctx.audio.fetch_wav(&state.video_id, state.path()).await?;
            reporter.log("Audio downloaded and converted to 16 kHz mono WAV").await?;
            state.wav = Some(wav);
            return Ok(true);
        }

        if step.is_marker() {
            debug!(step = %step, "Step has no work attached");
            return Ok(false);
        }
        let Some(target) = step.artifact(&state.video_id) else {
            return Ok(false);
        };
        let key = target.key();

        if self.ctx.store.exists(&key).await? {
            reporter
                .log(format!("{} already exists, skipping {}", key, step))
                .await?;
            return Ok(false);
        }

        let out = state.path().join(target.file_name());
        match step {
            Step::Transcribe => {
                let wav = state.wav.clone().ok_or_else(|| {
                    WorkerError::missing_input(
                        "no local audio to transcribe; the job must include the ingest step",
                    )
                })?;
                reporter.log(format!("Transcribing {} audio", Lang::SOURCE)).await?;
                let segments = self.ctx.transcriber.transcribe(&wav, Lang::SOURCE).await?;
                let doc = SubtitleDocument::from_segments(segments);
                reporter
                    .log(format!("Transcribed {} segments", doc.cues().len()))
                    .await?;
                tokio::fs::write(&out, doc.to_srt()).await?;
            }
            Step::Translate(lang) => {
                let src = self.dependency_input(step, state, reporter).await?;
                let srt = tokio::fs::read_to_string(&src).await?;

                reporter.log(format!("Translating subtitles to {}", lang)).await?;
                let translation = translate_srt(self.ctx.translator.as_ref(), &srt, lang).await?;
                if translation.is_degraded() {
                    metrics::record_degraded("translation");
                    reporter
                        .warn(format!(
                            "Translation unavailable ({}); {} subtitles copied from source",
                            self.ctx.translator.provider(),
                            lang
                        ))
                        .await?;
                }
                tokio::fs::write(&out, translation.text()).await?;
            }
            Step::Tts(lang) => {
                let src = self.dependency_input(step, state, reporter).await?;
                let srt = tokio::fs::read_to_string(&src).await?;

                reporter.log(format!("Synthesizing {} dub", lang)).await?;
                let outcome = synthesize_dub(self.ctx.synthesizer.as_ref(), &srt, lang, &out).await?;
                if outcome == Synthesis::Degraded {
                    metrics::record_degraded("synthesis");
                    reporter
                        .warn(format!(
                            "Speech synthesis unavailable; {} dub is a silent placeholder",
                            lang
                        ))
                        .await?;
                }
            }
            Step::Ingest | Step::Upload | Step::Mux => return Ok(false),
        }

        self.ctx.store.upload(&out, &key).await?;
        reporter.log(format!("Uploaded {}", key)).await?;
        state.local.insert(key, out);
        Ok(true)
    }

    /// Local copy of the artifact produced by the step `step` depends on.
    async fn dependency_input(
        &self,
        step: Step,
        state: &mut RunState,
        reporter: &JobReporter,
    ) -> WorkerResult<PathBuf> {
        let source = step
            .depends_on()
            .and_then(|dep| dep.artifact(&state.video_id))
            .ok_or_else(|| {
                WorkerError::missing_input(format!("{} has no stored input artifact", step))
            })?;
        self.input(&source, state, reporter).await
    }

    /// Local copy of `artifact`: produced earlier in this run, or downloaded now.
    async fn input(
        &self,
        artifact: &ArtifactPath,
        state: &mut RunState,
        reporter: &JobReporter,
    ) -> WorkerResult<PathBuf> {
        let key = artifact.key();
        if let Some(path) = state.local.get(&key) {
            return Ok(path.clone());
        }

        let dest = state
            .path()
            .join("inputs")
            .join(artifact.kind.prefix())
            .join(artifact.file_name());
        self.ctx.store.download(&key, &dest).await?;
        reporter.log(format!("Downloaded {}", key)).await?;
        state.local.insert(key, dest.clone());
        Ok(dest)
    }
}
