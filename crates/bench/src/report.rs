//! JSON reporting for scenario runs.

use crate::driver::{Measurement, ScenarioFailure};
use crate::scenario::ScenarioOutcome;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ScenarioStatus {
    Completed {
        iterations: usize,
        average_time_us: f64,
        cpu_frequency_mhz: f64,
    },
    Skipped {
        failure: ScenarioFailure,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: String,
    #[serde(flatten)]
    pub status: ScenarioStatus,
}

impl ScenarioReport {
    pub fn from_outcome(scenario: &str, outcome: &ScenarioOutcome) -> Self {
        let status = match outcome {
            ScenarioOutcome::Completed(Measurement {
                iterations,
                average_time_us,
                cpu_frequency_hz,
                ..
            }) => ScenarioStatus::Completed {
                iterations: *iterations,
                average_time_us: *average_time_us,
                cpu_frequency_mhz: *cpu_frequency_hz as f64 / 1.0e6,
            },
            ScenarioOutcome::Skipped(failure) => ScenarioStatus::Skipped {
                failure: failure.clone(),
            },
        };
        Self {
            scenario: scenario.to_string(),
            status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    pub generated_at_unix_ms: u128,
    pub scenarios: Vec<ScenarioReport>,
}

impl BenchReport {
    pub fn new(scenarios: Vec<ScenarioReport>) -> Self {
        let generated_at_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| Duration::from_secs(0))
            .as_millis();
        Self {
            generated_at_unix_ms,
            scenarios,
        }
    }

    pub fn completed(&self) -> usize {
        self.scenarios
            .iter()
            .filter(|s| matches!(s.status, ScenarioStatus::Completed { .. }))
            .count()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let report = serde_json::from_str(&json)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_scenarios_serialize_with_failure_kind() {
        let report = BenchReport::new(vec![ScenarioReport {
            scenario: "dwconv_up1x9__scalar/mobilenet_v1".to_string(),
            status: ScenarioStatus::Skipped {
                failure: ScenarioFailure::PlanBuild("no operators".to_string()),
            },
        }]);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("Skipped"));
        assert!(json.contains("PlanBuild"));
        assert_eq!(report.completed(), 0);

        let parsed: BenchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.scenarios.len(), 1);
    }
}
