//! Cooperative cancellation and progress reporting for network builds
//!
//! The builder checks the token between phases and inside its parallel
//! scans. A cancelled build returns [`Error::Cancelled`](crate::Error) and no
//! partial graph ever reaches the caller.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cooperative cancellation token, cheap to clone and share across threads
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Build phase about to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    CollectCandidates,
    MergeCandidates,
    CreateEdges,
    CreateTransfers,
    RepairConnectivity,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildPhase::CollectCandidates => "collecting candidates",
            BuildPhase::MergeCandidates => "merging candidates",
            BuildPhase::CreateEdges => "creating edges",
            BuildPhase::CreateTransfers => "creating transfers",
            BuildPhase::RepairConnectivity => "repairing connectivity",
        };
        f.write_str(name)
    }
}

type ProgressCallback = Arc<dyn Fn(BuildPhase) + Send + Sync>;

/// Cancellation and progress hooks of a build
#[derive(Clone, Default)]
pub struct BuildOptions {
    pub cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, callback: impl Fn(BuildPhase) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub(crate) fn enter(&self, phase: BuildPhase) {
        log::debug!("Network build: {phase}");
        if let Some(progress) = &self.progress {
            progress(phase);
        }
    }

    pub(crate) fn check(&self) -> Result<(), crate::Error> {
        if self.cancel.is_cancelled() {
            Err(crate::Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
