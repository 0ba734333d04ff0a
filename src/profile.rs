use std::thread;

/// Sizing for the tokio runtime, derived from the host.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeProfile {
    pub logical_cores: usize,
    pub worker_threads: usize,
}

impl RuntimeProfile {
    pub fn detect() -> Self {
        let cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self::for_cores(cores)
    }

    /// One worker per core, never fewer than two.
    pub fn for_cores(cores: usize) -> Self {
        Self {
            logical_cores: cores,
            worker_threads: cores.max(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_fewer_than_two_workers() {
        assert_eq!(RuntimeProfile::for_cores(1).worker_threads, 2);
        assert_eq!(RuntimeProfile::for_cores(8).worker_threads, 8);
        assert!(RuntimeProfile::detect().worker_threads >= 2);
    }
}
