use serde::{Deserialize, Serialize};

/// Lifecycle of a background catalog job (e.g. a registry reconciliation run).
///
/// `InProgress` carries a completion percentage, `Completed` a JSON summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    InProgress(u32),
    Completed(String),
    Failed(String),
}
