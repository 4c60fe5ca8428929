//! Headless viewer session
//!
//! [`SessionController`] keeps the state a remote client can change (open
//! dataset, parameter list, axis selection, window and tab state) without any
//! GUI attached. The daemon drives it, and it is the reference behavior the
//! command tests are written against.

use super::{AxesSelection, Controller, ControllerError};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Dataset extensions the viewer opens
pub const SUPPORTED_EXTENSIONS: &[&str] = &["dat", "npy", "mtx"];

/// Upper bound on header lines scanned before giving up on a `.dat` file
const MAX_HEADER_LINES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Normal,
    Foreground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTab {
    Viewer,
    Export,
}

/// The dataset currently open in the session
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    /// Parameter names, when the format exposes them
    pub parameters: Option<Vec<String>>,
    pub loaded_at: DateTime<Local>,
}

#[derive(Debug)]
pub struct SessionController {
    file: Option<LoadedFile>,
    axes: AxesSelection,
    window: WindowState,
    tab: ActiveTab,
    data_refreshes: u64,
    export_refreshes: u64,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            file: None,
            axes: AxesSelection::new(0, 0, 0),
            window: WindowState::Normal,
            tab: ActiveTab::Viewer,
            data_refreshes: 0,
            export_refreshes: 0,
        }
    }

    pub fn loaded_file(&self) -> Option<&LoadedFile> {
        self.file.as_ref()
    }

    pub fn axes(&self) -> AxesSelection {
        self.axes
    }

    pub fn window_state(&self) -> WindowState {
        self.window
    }

    pub fn active_tab(&self) -> ActiveTab {
        self.tab
    }

    /// Number of data refreshes triggered so far
    pub fn data_refreshes(&self) -> u64 {
        self.data_refreshes
    }

    pub fn export_refreshes(&self) -> u64 {
        self.export_refreshes
    }

    fn refresh_data(&mut self) {
        self.data_refreshes += 1;
        debug!(
            "Data refresh #{} with axes {}",
            self.data_refreshes, self.axes
        );
    }
}

/// Whether `path` has one of the supported dataset extensions (case-insensitive)
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Read the parameter names of a `.dat` file.
///
/// Column names come from `# name: ...` header lines; a header without them
/// falls back to `Column N` for each field of the first data row.
pub fn read_dat_parameters(path: &Path) -> Result<Vec<String>, ControllerError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut names = Vec::new();
    let mut buf = Vec::new();

    for _ in 0..MAX_HEADER_LINES {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        // Headers are often Latin-1 (units like µ or °)
        let line = String::from_utf8_lossy(&buf);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed.strip_prefix('#') {
            Some(comment) => {
                if let Some(name) = comment.trim().strip_prefix("name:") {
                    names.push(name.trim().to_string());
                }
            }
            None => {
                if names.is_empty() {
                    let columns = trimmed.split_whitespace().count();
                    names = (1..=columns).map(|n| format!("Column {}", n)).collect();
                }
                break;
            }
        }
    }

    Ok(names)
}

impl Controller for SessionController {
    fn load_file(&mut self, path: &Path) -> Result<bool, ControllerError> {
        if !is_supported(path) {
            info!("Declining unsupported file {}", path.display());
            return Ok(false);
        }

        let is_dat = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("dat"));
        let parameters = if is_dat {
            Some(read_dat_parameters(path)?)
        } else {
            None
        };

        let reload = self
            .file
            .as_ref()
            .is_some_and(|loaded| loaded.path.as_path() == path);

        match &parameters {
            Some(names) => info!(
                "{} {} ({} parameters)",
                if reload { "Reloaded" } else { "Loaded" },
                path.display(),
                names.len()
            ),
            None => info!(
                "{} {}",
                if reload { "Reloaded" } else { "Loaded" },
                path.display()
            ),
        }

        self.file = Some(LoadedFile {
            path: path.to_path_buf(),
            parameters,
            loaded_at: Local::now(),
        });
        self.tab = ActiveTab::Viewer;
        self.refresh_data();
        Ok(true)
    }

    fn set_axes(&mut self, axes: AxesSelection) -> Result<(), ControllerError> {
        let available = self
            .file
            .as_ref()
            .and_then(|loaded| loaded.parameters.as_ref())
            .map(Vec::len);

        // Each axis list starts with a blank entry, so 1..=available name
        // parameters and 0 clears the axis.
        if let Some(available) = available {
            if let Some(&index) = axes
                .indices()
                .iter()
                .find(|&&index| index < 0 || index as usize > available)
            {
                return Err(ControllerError::AxisOutOfRange { index, available });
            }
        }

        info!("Axes set to {}", axes);
        self.axes = axes;
        self.refresh_data();
        Ok(())
    }

    fn bring_to_front(&mut self) -> Result<(), ControllerError> {
        if self.window != WindowState::Foreground {
            info!("Raising window from {:?}", self.window);
        }
        self.window = WindowState::Foreground;
        Ok(())
    }

    fn current_file(&self) -> Option<PathBuf> {
        self.file.as_ref().map(|loaded| loaded.path.clone())
    }

    fn refresh_export_view(&mut self) -> Result<(), ControllerError> {
        self.export_refreshes += 1;
        self.tab = ActiveTab::Export;
        debug!("Export view redraw #{}", self.export_refreshes);
        Ok(())
    }
}
