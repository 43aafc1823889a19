use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;
use std::time::{Duration, Instant};

use deckhand_bot::{BiasedStrategy, ConsoleStrategy, FixedStrategy, LinePrompt, RandomStrategy};
use deckhand_core::protocol::{Choice, Message, Strategy, StrategyError};
use thiserror::Error;

use crate::config::{AgentConfig, AgentKind};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid parameter for agent '{name}': {message}")]
    InvalidParam { name: String, message: String },
}

/// Validated agent definition; spawns a fresh strategy per session.
pub(crate) struct AgentBlueprint {
    pub(crate) name: String,
    pub(crate) kind: AgentKind,
    implementation: AgentImplementation,
}

enum AgentImplementation {
    Fixed(FixedOptions),
    Random,
    Biased(BiasedOptions),
    Console,
}

impl AgentBlueprint {
    pub(crate) fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, AgentError> {
        configs.iter().map(Self::from_config).collect()
    }

    pub(crate) fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let implementation = match config.kind {
            AgentKind::Fixed => {
                AgentImplementation::Fixed(FixedOptions::from_params(&config.name, &config.params)?)
            }
            AgentKind::Random => AgentImplementation::Random,
            AgentKind::Biased => AgentImplementation::Biased(BiasedOptions::from_params(
                &config.name,
                &config.params,
            )?),
            AgentKind::Console => AgentImplementation::Console,
        };

        Ok(Self {
            name: config.name.clone(),
            kind: config.kind,
            implementation,
        })
    }

    /// Strategy for one process run, timed into `metrics`.
    pub(crate) fn spawn<V, O>(
        &self,
        seed: u64,
        metrics: &Rc<RefCell<DecisionMetrics>>,
    ) -> Box<dyn Strategy<V, O>>
    where
        V: Display + 'static,
        O: Display + 'static,
    {
        let inner: Box<dyn Strategy<V, O>> = match &self.implementation {
            AgentImplementation::Fixed(opts) => Box::new(FixedStrategy::at(opts.index)),
            AgentImplementation::Random => Box::new(RandomStrategy::seeded(seed)),
            AgentImplementation::Biased(opts) => {
                Box::new(BiasedStrategy::seeded(seed).with_first_bias(opts.first_bias))
            }
            AgentImplementation::Console => Box::new(ConsoleStrategy::new(LinePrompt::stdio())),
        };
        Box::new(TimedStrategy {
            inner,
            metrics: Rc::clone(metrics),
        })
    }
}

struct FixedOptions {
    index: usize,
}

impl FixedOptions {
    fn from_params(name: &str, params: &serde_yaml::Value) -> Result<Self, AgentError> {
        let Some(value) = param(name, params, "index")? else {
            return Ok(Self { index: 0 });
        };
        let index = value.as_u64().ok_or_else(|| AgentError::InvalidParam {
            name: name.to_string(),
            message: "index must be a non-negative integer".to_string(),
        })?;
        Ok(Self {
            index: index as usize,
        })
    }
}

struct BiasedOptions {
    first_bias: f64,
}

impl BiasedOptions {
    fn from_params(name: &str, params: &serde_yaml::Value) -> Result<Self, AgentError> {
        let Some(value) = param(name, params, "first_bias")? else {
            return Ok(Self {
                first_bias: deckhand_bot::strategy::DEFAULT_FIRST_BIAS,
            });
        };
        let first_bias = value
            .as_f64()
            .filter(|bias| (0.0..=1.0).contains(bias))
            .ok_or_else(|| AgentError::InvalidParam {
                name: name.to_string(),
                message: "first_bias must be a number between 0 and 1".to_string(),
            })?;
        Ok(Self { first_bias })
    }
}

fn param<'a>(
    name: &str,
    params: &'a serde_yaml::Value,
    key: &str,
) -> Result<Option<&'a serde_yaml::Value>, AgentError> {
    if params.is_null() {
        return Ok(None);
    }
    let mapping = params.as_mapping().ok_or_else(|| AgentError::InvalidParam {
        name: name.to_string(),
        message: "expected mapping for agent params".to_string(),
    })?;
    Ok(mapping
        .iter()
        .find_map(|(k, value)| (k.as_str() == Some(key)).then_some(value)))
}

/// Measures the time every decision takes.
struct TimedStrategy<V, O> {
    inner: Box<dyn Strategy<V, O>>,
    metrics: Rc<RefCell<DecisionMetrics>>,
}

impl<V, O> Strategy<V, O> for TimedStrategy<V, O> {
    fn observe(&mut self, view: &V) {
        self.inner.observe(view);
    }

    fn decide(
        &mut self,
        choice: &Choice<O>,
        history: &[Message<V, O>],
    ) -> Result<usize, StrategyError> {
        let start = Instant::now();
        let answer = self.inner.decide(choice, history);
        self.metrics.borrow_mut().record(start.elapsed());
        answer
    }
}

#[derive(Debug, Default)]
pub(crate) struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) {
        self.total += duration;
        self.decisions += 1;
    }

    pub(crate) fn finalize(&self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}
