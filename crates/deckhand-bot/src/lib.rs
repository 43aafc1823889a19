pub mod console;
pub mod strategy;

pub use console::{ConsoleStrategy, LinePrompt, Prompt};
pub use strategy::{BiasedStrategy, FixedStrategy, RandomStrategy, StrategyKind};
