//! Controller Module
//!
//! The controller is the application-side collaborator that remote commands
//! mutate: the open dataset, the axis selection and the window state. The
//! server only ever talks to the [`Controller`] trait, so a GUI, the headless
//! [`session::SessionController`] or a test double can sit behind it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub mod session;

/// The three axis-selection indices (x, y and data) of the viewer.
///
/// Index 0 is the blank entry at the top of each axis list; 1..=N select the
/// dataset's N parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxesSelection {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl AxesSelection {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn indices(&self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }
}

impl fmt::Display for AxesSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// Failures a controller may report while executing a command
#[derive(Error, Debug)]
pub enum ControllerError {
    /// An axis index does not name a parameter of the loaded dataset
    #[error("Axis index {index} out of range for {available} parameters")]
    AxisOutOfRange { index: i32, available: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure inside the host application
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Application-control interface consumed by the command server
pub trait Controller: Send {
    /// Load `path` as the active dataset and switch to the viewer.
    ///
    /// Returns `Ok(false)` if the application declines the file.
    fn load_file(&mut self, path: &Path) -> Result<bool, ControllerError>;

    /// Select the plotted axes and refresh the data
    fn set_axes(&mut self, axes: AxesSelection) -> Result<(), ControllerError>;

    /// Un-minimize and raise the main window
    fn bring_to_front(&mut self) -> Result<(), ControllerError>;

    fn current_file(&self) -> Option<PathBuf>;

    /// Redraw the export view
    fn refresh_export_view(&mut self) -> Result<(), ControllerError>;
}

/// Controller handle shared between connections.
///
/// Holding the lock for a whole batch is what serializes command execution.
pub type SharedController = Arc<Mutex<dyn Controller>>;
