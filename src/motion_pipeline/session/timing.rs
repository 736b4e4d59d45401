use std::time::{Duration, Instant};

use tracing::info;

#[derive(Debug, Clone)]
pub struct StageTiming {
    pub name: &'static str,
    pub total: Duration,
    pub calls: u64,
}

impl StageTiming {
    pub fn mean(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total.div_f64(self.calls as f64)
        }
    }
}

/// Per-stage durations accumulated over a whole session, in first-seen order.
#[derive(Debug, Default)]
pub struct PipelineTimings {
    stages: Vec<StageTiming>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, name: &'static str, duration: Duration) {
        match self.stages.iter_mut().find(|s| s.name == name) {
            Some(stage) => {
                stage.total += duration;
                stage.calls += 1;
            }
            None => self.stages.push(StageTiming {
                name,
                total: duration,
                calls: 1,
            }),
        }
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.total).sum()
    }

    pub fn get_stage(&self, name: &str) -> Option<&StageTiming> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    pub fn log_summary(&self) {
        let total = self.total_duration();
        info!("Pipeline timing summary:");
        for stage in &self.stages {
            let percentage = if total.as_secs_f64() > 0.0 {
                (stage.total.as_secs_f64() / total.as_secs_f64()) * 100.0
            } else {
                0.0
            };
            info!(
                "{:<20} {:>10.3}ms total {:>8.3}ms/frame ({:>5.1}%)",
                stage.name,
                stage.total.as_secs_f64() * 1000.0,
                stage.mean().as_secs_f64() * 1000.0,
                percentage
            );
        }
        info!("{:<20} {:>10.3}ms", "total", total.as_secs_f64() * 1000.0);
    }
}

pub struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    pub fn start(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    pub fn stop(self) -> (&'static str, Duration) {
        (self.name, self.start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_aggregate_by_name() {
        let mut timings = PipelineTimings::new();
        timings.add_step("extract_mask", Duration::from_millis(4));
        timings.add_step("debounce", Duration::from_millis(1));
        timings.add_step("extract_mask", Duration::from_millis(6));

        let mask = timings.get_stage("extract_mask").unwrap();
        assert_eq!(mask.calls, 2);
        assert_eq!(mask.total, Duration::from_millis(10));
        assert_eq!(mask.mean(), Duration::from_millis(5));
        assert_eq!(timings.stages()[0].name, "extract_mask");
        assert_eq!(timings.total_duration(), Duration::from_millis(11));
        assert!(timings.get_stage("sinks").is_none());
    }
}
