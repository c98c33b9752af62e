use ckgraph::Fragment;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metrics collected while extracting fragments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuilderMetrics {
    /// Total files attempted
    pub files_attempted: usize,

    /// Files that produced a fragment
    pub files_succeeded: usize,

    /// Files that failed
    pub files_failed: usize,

    /// Total time spent extracting
    #[serde(with = "duration_millis")]
    pub total_build_time: Duration,

    pub total_nodes: usize,
    pub total_edges: usize,
    pub total_ambiguities: usize,
}

pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl BuilderMetrics {
    /// Record a successful extraction
    pub fn record_success(&mut self, fragment: &Fragment, elapsed: Duration) {
        self.files_attempted += 1;
        self.files_succeeded += 1;
        self.total_build_time += elapsed;
        self.total_nodes += fragment.nodes.len();
        self.total_edges += fragment.edges.len();
        self.total_ambiguities += fragment.ambiguities.len();
    }

    pub fn record_failure(&mut self, elapsed: Duration) {
        self.files_attempted += 1;
        self.files_failed += 1;
        self.total_build_time += elapsed;
    }

    /// Success rate (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.files_attempted == 0 {
            0.0
        } else {
            self.files_succeeded as f64 / self.files_attempted as f64
        }
    }

    /// Average extraction time per successful file
    pub fn avg_build_time(&self) -> Duration {
        if self.files_succeeded == 0 {
            Duration::ZERO
        } else {
            self.total_build_time / self.files_succeeded as u32
        }
    }

    /// Merge another builder's metrics into this one
    pub fn merge(&mut self, other: &BuilderMetrics) {
        self.files_attempted += other.files_attempted;
        self.files_succeeded += other.files_succeeded;
        self.files_failed += other.files_failed;
        self.total_build_time += other.total_build_time;
        self.total_nodes += other.total_nodes;
        self.total_edges += other.total_edges;
        self.total_ambiguities += other.total_ambiguities;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_rates() {
        let fragment = Fragment::new("a.css", "0".repeat(64), "css");
        let mut metrics = BuilderMetrics::default();
        metrics.record_success(&fragment, Duration::from_millis(10));
        metrics.record_failure(Duration::from_millis(2));

        assert_eq!(metrics.files_attempted, 2);
        assert!((metrics.success_rate() - 0.5).abs() < f64::EPSILON);
        assert_eq!(metrics.avg_build_time(), Duration::from_millis(12));
    }

    #[test]
    fn test_merge() {
        let mut a = BuilderMetrics {
            files_attempted: 2,
            files_succeeded: 2,
            total_nodes: 10,
            ..Default::default()
        };
        let b = BuilderMetrics {
            files_attempted: 1,
            files_failed: 1,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.files_attempted, 3);
        assert_eq!(a.files_failed, 1);
        assert_eq!(a.total_nodes, 10);
    }
}
