//! Test helpers for staging datasets and stubbing routing backends.

use super::*;
use crate::import::{ImportConfig, execute_import};
use crate::routing::{RoutingProviderBuilder, RoutingSelection};
use camino::{Utf8Path, Utf8PathBuf};
use rideshare_core::{EstimatorRoutingProvider, RoutingProvider};
use std::cell::RefCell;
use std::sync::Arc;
use tempfile::TempDir;

/// Monday commuters on Main Campus: a passenger in Kitsilano, a nearby
/// driver, a Richmond driver with a tight detour budget and a passenger
/// without a home. `sam` studies at an unregistered campus.
pub(super) const DATASET: &str = r#"{
  "users": [
    { "id": "pat", "name": "Pat", "campus": "Main Campus", "role": "PASSENGER",
      "homeArea": "Kitsilano", "homeLat": 49.2684, "homeLng": -123.1683 },
    { "id": "dana", "name": "Dana", "campus": "Main Campus", "role": "DRIVER",
      "homeArea": "Point Grey", "homeLat": 49.2650, "homeLng": -123.1900 },
    { "id": "rio", "name": "Rio", "campus": "Main Campus", "role": "BOTH",
      "homeArea": "Richmond", "homeLat": 49.1700, "homeLng": -123.1400 },
    { "id": "lee", "name": "Lee", "campus": "Main Campus", "role": "PASSENGER" },
    { "id": "sam", "name": "Sam", "campus": "Atlantis", "role": "PASSENGER" }
  ],
  "schedules": [
    { "userId": "pat", "dayOfWeek": 1, "toCampus": "08:00", "goHome": "17:00" },
    { "userId": "dana", "dayOfWeek": 1, "toCampus": "08:05", "goHome": "17:30" },
    { "userId": "rio", "dayOfWeek": 1, "toCampus": "07:55", "goHome": "16:45",
      "toCampusMaxDetourMin": 5 },
    { "userId": "lee", "dayOfWeek": 1, "toCampus": "08:10", "goHome": "17:00" },
    { "userId": "sam", "dayOfWeek": 1, "toCampus": "08:00", "goHome": "17:00" }
  ]
}"#;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write test file");
}

/// Scratch directory holding a dataset file and a database path.
#[derive(Debug)]
pub(super) struct Workspace {
    _tmp: TempDir,
    pub(super) dataset: Utf8PathBuf,
    pub(super) db: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        Self {
            dataset: root.join("dataset.json"),
            db: root.join("data/rideshare.sqlite"),
            _tmp: tmp,
        }
    }

    pub(super) fn write_dataset(&self) {
        write_utf8(&self.dataset, DATASET.as_bytes());
    }

    /// Write and import the sample dataset.
    pub(super) fn imported() -> Self {
        let workspace = Self::new();
        workspace.write_dataset();
        execute_import(&ImportConfig {
            dataset: workspace.dataset.clone(),
            db: workspace.db.clone(),
        })
        .expect("import sample dataset");
        workspace
    }
}

/// Serves the offline estimator and records which backend was requested.
#[derive(Debug, Default)]
pub(super) struct RecordingProviderBuilder {
    selections: RefCell<Vec<RoutingSelection>>,
}

impl RecordingProviderBuilder {
    pub(super) fn selections(&self) -> Vec<RoutingSelection> {
        self.selections.borrow().clone()
    }
}

impl RoutingProviderBuilder for RecordingProviderBuilder {
    fn build(&self, selection: &RoutingSelection) -> Result<Arc<dyn RoutingProvider>, CliError> {
        self.selections.borrow_mut().push(selection.clone());
        Ok(Arc::new(EstimatorRoutingProvider::new()))
    }
}
