//! runner
//!
//! Batch execution of processing tasks over the scans of a database.
//!
//! # Design
//!
//! A [`DbRunner`] owns a [`Database`] handle, an ordered list of [`Task`]s and
//! a TOML table of per-task settings. Each task receives the section of the
//! table named after it (an empty table when absent). Tasks run in order for
//! a scan and the first failure stops that scan.
//!
//! # Example
//!
//! ```
//! use romidb::db::{Database, Entity, MemoryBackend, Scan};
//! use romidb::runner::{DbRunner, Task, TaskError};
//!
//! #[derive(Debug)]
//! struct Tag;
//!
//! impl Task for Tag {
//!     fn name(&self) -> &str {
//!         "tag"
//!     }
//!
//!     fn run(&self, scan: &Scan, config: &toml::Table) -> Result<(), TaskError> {
//!         let label = config.get("label").and_then(|v| v.as_str()).unwrap_or("none");
//!         scan.set_metadata_key("label", label.into())?;
//!         Ok(())
//!     }
//! }
//!
//! let db = Database::new(MemoryBackend::new());
//! let config: toml::Table = toml::from_str("[tag]\nlabel = \"arabidopsis\"").unwrap();
//! let runner = DbRunner::new(db.clone(), vec![Box::new(Tag)], config);
//!
//! runner.run_scan("scan1").unwrap();
//! let scan = db.get_scan("scan1", false).unwrap().unwrap();
//! assert_eq!(scan.get_metadata_key("label").unwrap(), Some("arabidopsis".into()));
//! ```

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::config::Config;
use crate::db::{Database, DbError, Entity, Scan};

/// Error type returned by tasks.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// A unit of processing applied to one scan.
pub trait Task: Send + Sync + fmt::Debug {
    /// Name of the task; also the config section it reads.
    fn name(&self) -> &str;

    /// Process `scan`.
    fn run(&self, scan: &Scan, config: &toml::Table) -> Result<(), TaskError>;
}

/// Errors from runner execution.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("task '{task}' failed on scan '{scan}': {source}")]
    Task {
        task: String,
        scan: String,
        #[source]
        source: TaskError,
    },

    /// The task's config entry exists but is not a table.
    #[error("config section for task '{0}' is not a table")]
    InvalidSection(String),
}

/// Outcome of [`DbRunner::run`].
#[derive(Debug, Default)]
pub struct RunReport {
    /// Scans every task completed on.
    pub processed: Vec<String>,
    /// Scans that failed, with the error.
    pub failures: Vec<(String, RunError)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs tasks over scans.
#[derive(Debug)]
pub struct DbRunner {
    db: Database,
    tasks: Vec<Box<dyn Task>>,
    config: toml::Table,
    continue_on_error: bool,
}

impl DbRunner {
    pub fn new(db: Database, tasks: Vec<Box<dyn Task>>, config: toml::Table) -> Self {
        Self {
            db,
            tasks,
            config,
            continue_on_error: false,
        }
    }

    /// Build a runner with defaults taken from the user configuration.
    pub fn from_config(
        db: Database,
        tasks: Vec<Box<dyn Task>>,
        config: toml::Table,
        user: &Config,
    ) -> Self {
        Self::new(db, tasks, config).continue_on_error(user.runner_continue_on_error())
    }

    /// Keep going over remaining scans when one fails.
    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn section(&self, task: &dyn Task) -> Result<toml::Table, RunError> {
        match self.config.get(task.name()) {
            None => Ok(toml::Table::new()),
            Some(toml::Value::Table(table)) => Ok(table.clone()),
            Some(_) => Err(RunError::InvalidSection(task.name().to_string())),
        }
    }

    /// Run every task on the scan `id`, creating the scan if needed.
    pub fn run_scan(&self, id: &str) -> Result<(), RunError> {
        self.db.connect()?;
        let scan = self.db.ensure_scan(id)?;
        self.run_tasks(&scan)
    }

    fn run_tasks(&self, scan: &Scan) -> Result<(), RunError> {
        for task in &self.tasks {
            let section = self.section(task.as_ref())?;
            debug!(task = task.name(), scan = %scan.id(), "running task");
            task.run(scan, &section).map_err(|source| RunError::Task {
                task: task.name().to_string(),
                scan: scan.id().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Run every task on every scan.
    ///
    /// Without `continue_on_error` the first failure is returned as the error.
    pub fn run(&self) -> Result<RunReport, RunError> {
        self.db.connect()?;
        let mut report = RunReport::default();

        for scan in self.db.get_scans()? {
            let id = scan.id().to_string();
            match self.run_tasks(&scan) {
                Ok(()) => report.processed.push(id),
                Err(e) if self.continue_on_error => {
                    warn!(scan = %id, error = %e, "scan failed, continuing");
                    report.failures.push((id, e));
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            processed = report.processed.len(),
            failed = report.failures.len(),
            "run finished"
        );
        Ok(report)
    }
}
