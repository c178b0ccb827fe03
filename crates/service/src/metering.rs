use prometheus::{IntCounterVec, Opts, Registry};
use tracing::debug;

/// Billable operations on a service object config.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Read,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Read => "read",
        }
    }
}

/// Receives one report per successful document request.
pub trait UsageMeter: Send + Sync {
    fn report_operation_usage(&self, config_id: &str, operation: Operation);
}

/// Counts operations into `context_store_operations_total{operation}`.
#[derive(Clone)]
pub struct PrometheusMeter {
    operations: IntCounterVec,
}

impl PrometheusMeter {
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let operations = IntCounterVec::new(
            Opts::new("context_store_operations_total", "Document operations served, by kind of operation"),
            &["operation"],
        )?;
        registry.register(Box::new(operations.clone()))?;
        Ok(Self { operations })
    }

    pub fn count(&self, operation: Operation) -> u64 {
        self.operations.with_label_values(&[operation.as_str()]).get()
    }
}

impl UsageMeter for PrometheusMeter {
    fn report_operation_usage(&self, config_id: &str, operation: Operation) {
        self.operations.with_label_values(&[operation.as_str()]).inc();
        debug!(event = "operation_usage", config_id, operation = operation.as_str());
    }
}
