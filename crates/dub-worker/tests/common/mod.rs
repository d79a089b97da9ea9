//! In-memory adapters shared by the worker integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use dub_firestore::{FirestoreResult, JobLedger};
use dub_media::MediaError;
use dub_models::{Job, JobId, JobStatus, Lang, Segment, Step, VideoSummary};
use dub_storage::{ArtifactStore, StorageError, StorageResult};
use dub_worker::services::{
    AudioSource, PassthroughTranslator, ServiceResult, SpeechSynthesizer, Transcriber,
};
use dub_worker::{PipelineContext, PipelineExecutor};

pub const SAMPLE_SRT: &str = "1\n00:00:00,000 --> 00:00:02,000\nOlá mundo\n\n";

// ============================================================================
// Artifact store
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    pub uploads: AtomicUsize,
    pub downloads: AtomicUsize,
}

impl MemoryStore {
    pub fn with_object(self, key: &str, bytes: &[u8]) -> Self {
        self.put(key, bytes);
        self
    }

    pub fn put(&self, key: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn upload(&self, local_path: &Path, key: &str) -> StorageResult<()> {
        let bytes = tokio::fs::read(local_path).await?;
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.put(key, &bytes);
        Ok(())
    }

    async fn download(&self, key: &str, local_path: &Path) -> StorageResult<()> {
        let bytes = self.get(key).ok_or_else(|| StorageError::not_found(key))?;
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, bytes).await?;
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Ledger that enforces the job status lifecycle on every write.
#[derive(Default)]
pub struct MemoryLedger {
    jobs: Mutex<HashMap<String, Job>>,
    pub videos: Mutex<Vec<VideoSummary>>,
    pub recorded_steps: Mutex<HashMap<String, Vec<String>>>,
    /// Every status write, in order.
    pub history: Mutex<Vec<(JobStatus, Option<String>)>>,
    /// When set, every claim attempt loses.
    pub contended: bool,
}

impl MemoryLedger {
    pub fn contended() -> Self {
        Self {
            contended: true,
            ..Default::default()
        }
    }

    pub fn with_job(self, job: Job) -> Self {
        self.insert(job);
        self
    }

    pub fn insert(&self, job: Job) {
        self.jobs
            .lock()
            .unwrap()
            .insert(job.id.to_string(), job);
    }

    pub fn job(&self, id: &str) -> Job {
        self.jobs
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .expect("job not in ledger")
    }

    /// Log messages without their timestamp prefix.
    pub fn messages(&self, id: &str) -> Vec<String> {
        self.job(id)
            .log
            .iter()
            .map(|line| match line.split_once("] ") {
                Some((_, msg)) => msg.to_string(),
                None => line.clone(),
            })
            .collect()
    }

    pub fn logged(&self, id: &str, needle: &str) -> bool {
        self.messages(id).iter().any(|m| m.contains(needle))
    }
}

#[async_trait]
impl JobLedger for MemoryLedger {
    async fn find_by_status(&self, status: JobStatus, limit: u32) -> FirestoreResult<Vec<Job>> {
        let mut found: Vec<Job> = self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.status == status)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn append_log(&self, job_id: &JobId, message: &str) -> FirestoreResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(job_id.as_str()).expect("job not in ledger");
        if !job.log.iter().any(|l| l == message) {
            job.log.push(message.to_string());
        }
        Ok(())
    }

    async fn set_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        current_step: Option<&str>,
    ) -> FirestoreResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(job_id.as_str()).expect("job not in ledger");
        assert!(
            job.status.can_transition_to(status),
            "illegal transition {} -> {}",
            job.status,
            status
        );
        job.status = status;
        if let Some(step) = current_step {
            job.current_step = Some(step.to_string());
        }
        self.history
            .lock()
            .unwrap()
            .push((status, current_step.map(str::to_string)));
        Ok(())
    }

    async fn record_steps(&self, job_id: &JobId, steps: &[Step]) -> FirestoreResult<()> {
        self.recorded_steps.lock().unwrap().insert(
            job_id.to_string(),
            steps.iter().map(Step::name).collect(),
        );
        Ok(())
    }

    async fn upsert_video(&self, summary: &VideoSummary) -> FirestoreResult<()> {
        self.videos.lock().unwrap().push(summary.clone());
        Ok(())
    }

    async fn try_claim(&self, job: &Job, owner: &str) -> FirestoreResult<bool> {
        if self.contended {
            return Ok(false);
        }
        let mut jobs = self.jobs.lock().unwrap();
        let Some(stored) = jobs.get_mut(job.id.as_str()) else {
            return Ok(false);
        };
        if stored.status != JobStatus::Queued || stored.claimed_by.is_some() {
            return Ok(false);
        }
        stored.status = JobStatus::Running;
        stored.claimed_by = Some(owner.to_string());
        Ok(true)
    }
}

// ============================================================================
// Services
// ============================================================================

#[derive(Default)]
pub struct FakeAudio {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeAudio {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioSource for FakeAudio {
    async fn fetch_wav(&self, _video_id: &str, dir: &Path) -> ServiceResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(
                MediaError::process_failed("yt-dlp", Some(1), "ERROR: Video unavailable").into(),
            );
        }
        let wav = dir.join("audio.wav");
        tokio::fs::write(&wav, b"RIFF")
            .await
            .map_err(MediaError::from)?;
        Ok(wav)
    }
}

#[derive(Default)]
pub struct FakeTranscriber {
    pub calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _wav: &Path, _lang: Lang) -> ServiceResult<Vec<Segment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Segment {
            start: Duration::ZERO,
            end: Duration::from_secs(2),
            text: "Olá mundo".to_string(),
        }])
    }
}

/// Offline synthesizer producing a marker payload.
#[derive(Default)]
pub struct FakeSynth {
    pub texts: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    fn provider(&self) -> &str {
        "fake"
    }

    fn is_live(&self) -> bool {
        false
    }

    async fn synthesize(&self, text: &str, _lang: Lang) -> ServiceResult<Vec<u8>> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(b"ID3".to_vec())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub ledger: Arc<MemoryLedger>,
    pub audio: Arc<FakeAudio>,
    pub transcriber: Arc<FakeTranscriber>,
    pub synth: Arc<FakeSynth>,
    pub work_dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(store: MemoryStore, ledger: MemoryLedger) -> Self {
        Self::with_audio(store, ledger, FakeAudio::default())
    }

    pub fn with_audio(store: MemoryStore, ledger: MemoryLedger, audio: FakeAudio) -> Self {
        Self {
            store: Arc::new(store),
            ledger: Arc::new(ledger),
            audio: Arc::new(audio),
            transcriber: Arc::new(FakeTranscriber::default()),
            synth: Arc::new(FakeSynth::default()),
            work_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn executor(&self) -> PipelineExecutor {
        PipelineExecutor::new(Arc::new(PipelineContext {
            store: self.store.clone(),
            ledger: self.ledger.clone(),
            audio: self.audio.clone(),
            transcriber: self.transcriber.clone(),
            translator: Arc::new(PassthroughTranslator),
            synthesizer: self.synth.clone(),
            work_dir: self.work_dir.path().to_path_buf(),
        }))
    }

    /// Entries left in the scratch parent directory.
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.work_dir.path())
            .map(|d| d.count())
            .unwrap_or(0)
    }
}
