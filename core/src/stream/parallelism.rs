use serde::{Deserialize, Serialize};

/// How many workers decode chunks, and how many chunks may be in flight
/// between the splitter and the collector.
///
/// Deserialized profiles go through [`ParallelismProfile::new`], so zero
/// values are raised to one there too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ProfileFields")]
pub struct ParallelismProfile {
    pub worker_count: usize,
    pub inflight_chunks: usize,
}

impl ParallelismProfile {
    /// Zero values are raised to one.
    pub fn new(worker_count: usize, inflight_chunks: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
            inflight_chunks: inflight_chunks.max(1),
        }
    }

    pub fn single_threaded() -> Self {
        Self::new(1, 1)
    }

    /// One worker per logical CPU, leaving one core to the splitter thread,
    /// and two chunks in flight per worker.
    pub fn dynamic() -> Self {
        let worker_count = num_cpus::get().saturating_sub(1).max(1);
        Self::new(worker_count, worker_count * 2)
    }
}

#[derive(Deserialize)]
struct ProfileFields {
    worker_count: usize,
    inflight_chunks: usize,
}

impl From<ProfileFields> for ParallelismProfile {
    fn from(fields: ProfileFields) -> Self {
        Self::new(fields.worker_count, fields.inflight_chunks)
    }
}

impl Default for ParallelismProfile {
    fn default() -> Self {
        Self::dynamic()
    }
}
