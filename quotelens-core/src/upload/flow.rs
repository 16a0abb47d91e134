//! Per-upload state machine.
//!
//! ```text
//! NoFile ─receive→ FileReceived ─validate→ Validated ─render→ Rendered
//!                                                    └render→ Rejected
//! ```
//!
//! `receive` is valid from any state and restarts the machine for the new
//! file. `validate` and `render` are only valid from the state directly
//! before them.

use tracing::{debug, info};

use super::{missing_columns, RequiredColumns, UploadError, UploadedTable};
use crate::chart::ScatterSpec;

/// Where an upload currently is.
#[derive(Debug, Clone)]
pub enum UploadState {
    NoFile,
    FileReceived(UploadedTable),
    Validated {
        table: UploadedTable,
        required: RequiredColumns,
        missing: Vec<String>,
    },
    Rendered {
        table: UploadedTable,
        scatter: ScatterSpec,
    },
    Rejected {
        table: UploadedTable,
        message: String,
        missing: Vec<String>,
    },
}

/// State without its payload, for display and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    NoFile,
    FileReceived,
    Validated,
    Rendered,
    Rejected,
}

impl UploadPhase {
    pub fn name(self) -> &'static str {
        match self {
            UploadPhase::NoFile => "no file",
            UploadPhase::FileReceived => "file received",
            UploadPhase::Validated => "validated",
            UploadPhase::Rendered => "rendered",
            UploadPhase::Rejected => "rejected",
        }
    }
}

impl UploadState {
    pub fn phase(&self) -> UploadPhase {
        match self {
            UploadState::NoFile => UploadPhase::NoFile,
            UploadState::FileReceived(_) => UploadPhase::FileReceived,
            UploadState::Validated { .. } => UploadPhase::Validated,
            UploadState::Rendered { .. } => UploadPhase::Rendered,
            UploadState::Rejected { .. } => UploadPhase::Rejected,
        }
    }
}

/// Drives one upload from receipt to a chart or a rejection.
#[derive(Debug, Clone)]
pub struct UploadFlow {
    state: UploadState,
}

impl Default for UploadFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadFlow {
    /// Prompt shown while no file has been received.
    pub const PROMPT: &'static str = "Load a tips CSV file to visualize it.";

    pub fn new() -> Self {
        Self {
            state: UploadState::NoFile,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn phase(&self) -> UploadPhase {
        self.state.phase()
    }

    /// The table behind the current state, if any.
    pub fn table(&self) -> Option<&UploadedTable> {
        match &self.state {
            UploadState::NoFile => None,
            UploadState::FileReceived(table)
            | UploadState::Validated { table, .. }
            | UploadState::Rendered { table, .. }
            | UploadState::Rejected { table, .. } => Some(table),
        }
    }

    pub fn scatter(&self) -> Option<&ScatterSpec> {
        match &self.state {
            UploadState::Rendered { scatter, .. } => Some(scatter),
            _ => None,
        }
    }

    pub fn rejection(&self) -> Option<&str> {
        match &self.state {
            UploadState::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Back to `NoFile`.
    pub fn reset(&mut self) {
        self.state = UploadState::NoFile;
    }

    /// Accept a new file. Restarts the machine regardless of the current state.
    pub fn receive(&mut self, table: UploadedTable) {
        if self.phase() != UploadPhase::NoFile {
            debug!(from = self.phase().name(), "new upload restarts flow");
        }
        info!(
            file = table.file_name().unwrap_or("<memory>"),
            rows = table.height(),
            columns = table.width(),
            "upload received"
        );
        self.state = UploadState::FileReceived(table);
    }

    /// Check the received table for the required columns.
    pub fn validate(&mut self, required: &RequiredColumns) -> Result<UploadPhase, UploadError> {
        let state = std::mem::replace(&mut self.state, UploadState::NoFile);
        let table = match state {
            UploadState::FileReceived(table) => table,
            other => {
                let phase = other.phase();
                self.state = other;
                return Err(UploadError::InvalidTransition {
                    state: phase.name(),
                    action: "validate",
                });
            }
        };

        let missing = missing_columns(&table, required);
        debug!(?missing, "upload validated");
        self.state = UploadState::Validated {
            table,
            required: required.clone(),
            missing,
        };
        Ok(UploadPhase::Validated)
    }

    /// Build the scatter chart, or reject when required columns are missing.
    ///
    /// Returns the phase reached: `Rendered` or `Rejected`.
    pub fn render(&mut self) -> Result<UploadPhase, UploadError> {
        let state = std::mem::replace(&mut self.state, UploadState::NoFile);
        let (table, required, missing) = match state {
            UploadState::Validated {
                table,
                required,
                missing,
            } => (table, required, missing),
            other => {
                let phase = other.phase();
                self.state = other;
                return Err(UploadError::InvalidTransition {
                    state: phase.name(),
                    action: "render",
                });
            }
        };

        if !missing.is_empty() {
            let message = required.rejection_message();
            info!(?missing, "upload rejected");
            self.state = UploadState::Rejected {
                table,
                message,
                missing,
            };
            return Ok(UploadPhase::Rejected);
        }

        match ScatterSpec::tips(&table) {
            Ok(scatter) => {
                info!(
                    groups = scatter.groups.len(),
                    skipped = scatter.skipped_rows,
                    "tips scatter rendered"
                );
                self.state = UploadState::Rendered { table, scatter };
                Ok(UploadPhase::Rendered)
            }
            Err(e) => {
                self.state = UploadState::Rejected {
                    table,
                    message: e.to_string(),
                    missing,
                };
                Err(e.into())
            }
        }
    }

    /// `receive`, `validate` and `render` in one step.
    pub fn process(
        &mut self,
        table: UploadedTable,
        required: &RequiredColumns,
    ) -> Result<UploadPhase, UploadError> {
        self.receive(table);
        self.validate(required)?;
        self.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tips_table() -> UploadedTable {
        UploadedTable::from_csv_bytes(
            b"total_bill,tip,sex\n16.99,1.01,Female\n10.34,1.66,Male\n".to_vec(),
        )
        .unwrap()
    }

    fn no_sex_table() -> UploadedTable {
        UploadedTable::from_csv_bytes(b"total_bill,tip\n16.99,1.01\n".to_vec()).unwrap()
    }

    #[test]
    fn starts_with_prompt_state() {
        let flow = UploadFlow::new();
        assert_eq!(flow.phase(), UploadPhase::NoFile);
        assert!(flow.table().is_none());
    }

    #[test]
    fn happy_path_reaches_rendered() {
        let mut flow = UploadFlow::new();
        flow.receive(tips_table());
        assert_eq!(flow.phase(), UploadPhase::FileReceived);
        assert_eq!(
            flow.validate(&RequiredColumns::tips()).unwrap(),
            UploadPhase::Validated
        );
        assert_eq!(flow.render().unwrap(), UploadPhase::Rendered);
        assert_eq!(flow.scatter().unwrap().point_count(), 2);
    }

    #[test]
    fn missing_column_reaches_rejected() {
        let mut flow = UploadFlow::new();
        let phase = flow.process(no_sex_table(), &RequiredColumns::tips()).unwrap();
        assert_eq!(phase, UploadPhase::Rejected);
        assert_eq!(
            flow.rejection(),
            Some("The file must contain the columns 'total_bill', 'tip' and 'sex'.")
        );
        assert!(flow.scatter().is_none());
        assert!(flow.table().is_some());
    }

    #[test]
    fn render_before_validate_is_invalid() {
        let mut flow = UploadFlow::new();
        flow.receive(tips_table());
        let err = flow.render().unwrap_err();
        assert!(matches!(
            err,
            UploadError::InvalidTransition {
                action: "render",
                ..
            }
        ));
        assert_eq!(flow.phase(), UploadPhase::FileReceived);
    }

    #[test]
    fn validate_without_file_is_invalid() {
        let mut flow = UploadFlow::new();
        assert!(flow.validate(&RequiredColumns::tips()).is_err());
        assert_eq!(flow.phase(), UploadPhase::NoFile);
    }

    #[test]
    fn new_upload_restarts_from_rejected() {
        let mut flow = UploadFlow::new();
        flow.process(no_sex_table(), &RequiredColumns::tips()).unwrap();
        assert_eq!(flow.phase(), UploadPhase::Rejected);

        let phase = flow.process(tips_table(), &RequiredColumns::tips()).unwrap();
        assert_eq!(phase, UploadPhase::Rendered);
    }

    #[test]
    fn reset_returns_to_no_file() {
        let mut flow = UploadFlow::new();
        flow.process(tips_table(), &RequiredColumns::tips()).unwrap();
        flow.reset();
        assert_eq!(flow.phase(), UploadPhase::NoFile);
    }
}
