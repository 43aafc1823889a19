use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentKind, SessionKind, SimulationConfig};
use crate::session::{DecisionSummary, SessionOutcome};

const CONFIDENCE: f64 = 0.95;
const FALLBACK_Z: f64 = 1.96;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("agent '{0}' appears in session results but not in the configuration")]
    UnknownAgent(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Accumulates per-agent results across sessions.
pub struct ReportCollector {
    run_id: String,
    kind: SessionKind,
    agents: HashMap<String, AgentAccumulator>,
    agent_order: Vec<String>,
    sessions: usize,
}

impl ReportCollector {
    pub fn new(config: &SimulationConfig) -> Self {
        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(agent.name.clone(), AgentAccumulator::new(agent.kind));
            order.push(agent.name.clone());
        }

        Self {
            run_id: config.run_id.clone(),
            kind: config.session.kind,
            agents,
            agent_order: order,
            sessions: 0,
        }
    }

    pub fn record_session(&mut self, outcome: &SessionOutcome) -> Result<(), ReportError> {
        for seat in &outcome.seat_results {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| ReportError::UnknownAgent(seat.agent_name.clone()))?;
            acc.record(seat.score, seat.won, &seat.metrics);
        }
        self.sessions += 1;
        Ok(())
    }

    pub fn finalize(mut self) -> ReportSummary {
        let z = z_score(CONFIDENCE);
        let agents = self
            .agent_order
            .iter()
            .filter_map(|name| {
                self.agents
                    .remove(name)
                    .map(|acc| acc.into_report(name.clone(), z))
            })
            .collect();

        ReportSummary {
            run_id: self.run_id,
            kind: self.kind,
            sessions: self.sessions,
            agents,
        }
    }
}

struct AgentAccumulator {
    kind: AgentKind,
    scores: Vec<f64>,
    wins: usize,
    total_ms: f64,
    decisions: u64,
}

impl AgentAccumulator {
    fn new(kind: AgentKind) -> Self {
        Self {
            kind,
            scores: Vec::new(),
            wins: 0,
            total_ms: 0.0,
            decisions: 0,
        }
    }

    fn record(&mut self, score: f64, won: bool, metrics: &DecisionSummary) {
        self.scores.push(score);
        if won {
            self.wins += 1;
        }
        self.total_ms += metrics.total_ms;
        self.decisions += u64::from(metrics.decisions);
    }

    fn into_report(self, name: String, z: f64) -> AgentReport {
        let seats = self.scores.len();
        let avg_score = if seats == 0 {
            0.0
        } else {
            self.scores.iter().sum::<f64>() / seats as f64
        };
        let avg_decisions = if seats == 0 {
            0.0
        } else {
            self.decisions as f64 / seats as f64
        };
        let average_ms_per_decision = if self.decisions == 0 {
            0.0
        } else {
            self.total_ms / self.decisions as f64
        };

        AgentReport {
            name,
            kind: self.kind,
            seats,
            avg_score,
            ci: confidence_interval(&self.scores, z),
            wins: self.wins,
            avg_decisions,
            average_ms_per_decision,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub run_id: String,
    pub kind: SessionKind,
    pub sessions: usize,
    pub agents: Vec<AgentReport>,
}

impl ReportSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        fs::write(path.as_ref(), self.to_markdown()).map_err(|e| ReportError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut rows = String::new();
        rows.push_str(&format!("# Session Summary: {}\n\n", self.run_id));
        rows.push_str(&format!(
            "{} {} sessions\n\n",
            self.sessions,
            self.kind.as_str()
        ));
        rows.push_str(&format!(
            "| Agent | Kind | Seats | Avg score | {:.0}% CI | Win % | Avg decisions | Avg ms/decision |\n",
            CONFIDENCE * 100.0
        ));
        rows.push_str("|-------|------|-------|-----------|--------|-------|---------------|-----------------|\n");

        for agent in &self.agents {
            let win_rate = if agent.seats == 0 {
                0.0
            } else {
                agent.wins as f64 / agent.seats as f64
            };

            rows.push_str(&format!(
                "| {name} | {kind:?} | {seats} | {avg:.3} | [{ci_low:.3}, {ci_high:.3}] | {win:.1}% | {decisions:.1} | {latency:.3} |\n",
                name = agent.name,
                kind = agent.kind,
                seats = agent.seats,
                avg = agent.avg_score,
                ci_low = agent.ci.0,
                ci_high = agent.ci.1,
                win = win_rate * 100.0,
                decisions = agent.avg_decisions,
                latency = agent.average_ms_per_decision,
            ));
        }

        rows
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub seats: usize,
    pub avg_score: f64,
    pub ci: (f64, f64),
    pub wins: usize,
    pub avg_decisions: f64,
    pub average_ms_per_decision: f64,
}

/// Two-sided normal quantile for `confidence`.
fn z_score(confidence: f64) -> f64 {
    Normal::new(0.0, 1.0)
        .map(|normal| normal.inverse_cdf(0.5 + confidence / 2.0))
        .unwrap_or(FALLBACK_Z)
}

fn confidence_interval(points: &[f64], z: f64) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = z * std_error;
    (mean - margin, mean + margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_score_matches_the_usual_constant() {
        assert!((z_score(0.95) - 1.959_96).abs() < 1e-3);
    }

    #[test]
    fn confidence_interval_is_centred_on_the_mean() {
        let (low, high) = confidence_interval(&[1.0, 2.0, 3.0, 4.0], FALLBACK_Z);
        assert!(((low + high) / 2.0 - 2.5).abs() < 1e-9);
        assert!(low < 2.5 && high > 2.5);
        assert_eq!(confidence_interval(&[5.0], FALLBACK_Z), (5.0, 5.0));
        assert_eq!(confidence_interval(&[], FALLBACK_Z), (0.0, 0.0));
    }

    #[test]
    fn markdown_lists_agents_in_config_order() {
        let summary = ReportSummary {
            run_id: "unit".into(),
            kind: SessionKind::Blackjack,
            sessions: 2,
            agents: vec![
                AgentReport {
                    name: "first".into(),
                    kind: AgentKind::Fixed,
                    seats: 2,
                    avg_score: 18.0,
                    ci: (17.0, 19.0),
                    wins: 1,
                    avg_decisions: 1.0,
                    average_ms_per_decision: 0.01,
                },
                AgentReport {
                    name: "noise".into(),
                    kind: AgentKind::Random,
                    seats: 2,
                    avg_score: 10.5,
                    ci: (0.0, 21.0),
                    wins: 0,
                    avg_decisions: 2.5,
                    average_ms_per_decision: 0.02,
                },
            ],
        };
        let markdown = summary.to_markdown();
        assert!(markdown.starts_with("# Session Summary: unit\n"));
        assert!(markdown.contains("2 blackjack sessions"));
        let first = markdown.find("| first | Fixed |").expect("first row");
        let noise = markdown.find("| noise | Random |").expect("noise row");
        assert!(first < noise);
        assert!(markdown.contains("50.0%"));
    }
}
