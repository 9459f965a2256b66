use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use vidsum_core::job::Job;
use vidsum_core::types::JobId;

use super::JobStore;
use crate::{StoreError, StoreResult};

/// Stores each job as `<jobs_dir>/<job_id>.json`.
///
/// Writes go to `<job_id>.json.tmp` first and are renamed into place, so a
/// concurrent poll sees either the previous record or the new one.
#[derive(Debug, Clone)]
pub struct FileJobStore {
    jobs_dir: PathBuf,
}

impl FileJobStore {
    pub fn new(jobs_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs_dir: jobs_dir.into(),
        }
    }

    pub fn jobs_dir(&self) -> &Path {
        &self.jobs_dir
    }

    /// Create the jobs directory if it does not exist.
    pub async fn ensure_dirs(&self) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.jobs_dir)
            .await
            .map_err(|source| StoreError::Io {
                path: self.jobs_dir.clone(),
                source,
            })
    }

    /// Whether a probe file can be created in the jobs directory.
    pub async fn is_writable(&self) -> bool {
        let probe = self.jobs_dir.join(".write-probe");
        match tokio::fs::write(&probe, b"").await {
            Ok(()) => {
                let _ = tokio::fs::remove_file(&probe).await;
                true
            }
            Err(_) => false,
        }
    }

    fn record_path(&self, id: JobId) -> PathBuf {
        self.jobs_dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn save(&self, job: &Job) -> StoreResult<()> {
        let path = self.record_path(job.id);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec(job)?;

        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::trace!(job_id = %job.id, status = %job.status, "Job record saved");
        Ok(())
    }

    async fn load(&self, id: JobId) -> StoreResult<Option<Job>> {
        let path = self.record_path(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                path,
                message: e.to_string(),
            })
    }

    async fn is_healthy(&self) -> bool {
        self.is_writable().await
    }
}
