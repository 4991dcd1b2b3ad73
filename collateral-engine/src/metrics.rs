//! Metrics collection for observability
//!
//! Prometheus metrics for monitoring the engine. Each [`Metrics`] owns its
//! own registry, so several engines can live in one process.
//!
//! # Metrics
//!
//! - `engine_operations_total{operation,outcome}` - Top-level operations by result
//! - `engine_liquidations_total` - Successful liquidations
//! - `engine_reentrancy_blocked_total` - Nested calls rejected by the guard
//! - `engine_oracle_rejections_total` - Stale, corrupt or unreachable price reads

use crate::error::ErrorCategory;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Operations by name and outcome
    pub operations: IntCounterVec,

    /// Successful liquidations
    pub liquidations_total: IntCounter,

    /// Reentrant calls blocked
    pub reentrancy_blocked: IntCounter,

    /// Oracle reads rejected
    pub oracle_rejections: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let operations = IntCounterVec::new(
            Opts::new("engine_operations_total", "Top-level operations by result"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(operations.clone()))?;

        let liquidations_total =
            IntCounter::new("engine_liquidations_total", "Successful liquidations")?;
        registry.register(Box::new(liquidations_total.clone()))?;

        let reentrancy_blocked = IntCounter::new(
            "engine_reentrancy_blocked_total",
            "Nested calls rejected by the reentrancy guard",
        )?;
        registry.register(Box::new(reentrancy_blocked.clone()))?;

        let oracle_rejections = IntCounter::new(
            "engine_oracle_rejections_total",
            "Stale, corrupt or unreachable price reads",
        )?;
        registry.register(Box::new(oracle_rejections.clone()))?;

        Ok(Self {
            operations,
            liquidations_total,
            reentrancy_blocked,
            oracle_rejections,
            registry,
        })
    }

    /// Record a committed operation
    pub fn record_success(&self, operation: &str) {
        self.operations.with_label_values(&[operation, "ok"]).inc();
        if operation == "liquidate" {
            self.liquidations_total.inc();
        }
    }

    /// Record an aborted operation
    pub fn record_failure(&self, operation: &str, category: ErrorCategory) {
        self.operations
            .with_label_values(&[operation, category.as_str()])
            .inc();
        match category {
            ErrorCategory::Reentrancy => self.reentrancy_blocked.inc(),
            ErrorCategory::Oracle => self.oracle_rejections.inc(),
            _ => {}
        }
    }

    /// Count for one operation/outcome pair
    pub fn operation_count(&self, operation: &str, outcome: &str) -> u64 {
        self.operations
            .with_label_values(&[operation, outcome])
            .get()
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("liquidations_total", &self.liquidations_total.get())
            .field("reentrancy_blocked", &self.reentrancy_blocked.get())
            .field("oracle_rejections", &self.oracle_rejections.get())
            .finish_non_exhaustive()
    }
}
