//! Run ids and token spend for a generation run.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Tokens consumed by one model call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.prompt_tokens as u64 + self.completion_tokens as u64
    }
}

/// Generate an id that tags every log line of one generation run.
pub fn generate_run_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("run-{}-{count:04x}", Utc::now().format("%Y%m%dT%H%M%S"))
}

/// USD per 1M tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub fn estimate_cost(&self, usage: TokenUsage) -> f64 {
        (usage.prompt_tokens as f64 / 1_000_000.0) * self.input_per_million
            + (usage.completion_tokens as f64 / 1_000_000.0) * self.output_per_million
    }
}

impl Default for ModelPricing {
    fn default() -> Self {
        Self {
            input_per_million: 2.50,
            output_per_million: 10.0,
        }
    }
}

/// Approximate pricing for an OpenAI model id. Unknown models fall back to
/// [`ModelPricing::default`].
pub fn pricing_for_model(model: &str) -> ModelPricing {
    let name = model.rsplit('/').next().unwrap_or(model).to_lowercase();

    if name.contains("4o-mini") || name.contains("4.1-mini") {
        ModelPricing {
            input_per_million: 0.15,
            output_per_million: 0.60,
        }
    } else if name.contains("4.1-nano") {
        ModelPricing {
            input_per_million: 0.10,
            output_per_million: 0.40,
        }
    } else if name.contains("gpt-4.1") {
        ModelPricing {
            input_per_million: 2.0,
            output_per_million: 8.0,
        }
    } else if name.starts_with("o1") || name.starts_with("o3") {
        ModelPricing {
            input_per_million: 15.0,
            output_per_million: 60.0,
        }
    } else {
        ModelPricing::default()
    }
}

/// Cumulative token counts and estimated cost across a run.
#[derive(Debug, Default, Clone)]
pub struct UsageTracker {
    pub calls: u32,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub estimated_cost_usd: f64,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, usage: TokenUsage, pricing: &ModelPricing) {
        self.calls += 1;
        self.prompt_tokens += usage.prompt_tokens as u64;
        self.completion_tokens += usage.completion_tokens as u64;
        self.estimated_cost_usd += pricing.estimate_cost(usage);
    }

    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    pub fn summary(&self) -> String {
        format!(
            "{} call(s), tokens: {} prompt + {} completion = {} total, est. cost: ${:.4}",
            self.calls,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens(),
            self.estimated_cost_usd,
        )
    }
}
