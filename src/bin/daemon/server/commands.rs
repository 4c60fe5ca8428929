//! Commands Module
//!
//! This module registers the remote commands with the command registry and
//! maps each one onto the controller.

use super::command_registry::{CommandRegistry, CommandResult, keyed_command};
use super::protocol::parse_axes;
use super::response_handler::Fragment;
use crate::controller::{Controller, ControllerError};
use std::path::Path;
use tracing::debug;

pub const FILE_ERROR: &str = "Error file path";
pub const INDEX_ERROR: &str = "Index error";

/// Initialize all available commands in the registry
///
/// - `FILE`: load a dataset and show it in the viewer
/// - `AXES`: select the x, y and data axes
/// - `SHOW`: raise the main window
/// - `REFR`: reload the open file if it is the one named
/// - `UPDA`: redraw the export view if the named file is open
pub fn init_commands() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register(
        "FILE",
        keyed_command("Load a data file and show it in the viewer", load_file),
    );

    registry.register(
        "AXES",
        keyed_command("Select axes as x,y,z parameter indices", select_axes),
    );

    registry.register(
        "SHOW",
        keyed_command("Restore and raise the main window", |key, _value, controller| {
            controller.bring_to_front()?;
            Ok(Some(Fragment::done(key)))
        }),
    );

    registry.register(
        "REFR",
        keyed_command("Reload the given file if it is currently open", |_key, value, controller| {
            let path = Path::new(value);
            if is_current_file(controller, path) {
                controller.load_file(path)?;
            } else {
                debug!("REFR ignored, {} is not the open file", value);
            }
            Ok(None)
        }),
    );

    registry.register(
        "UPDA",
        keyed_command(
            "Redraw the export view if the given file is currently open",
            |key, value, controller| {
                if is_current_file(controller, Path::new(value)) {
                    controller.refresh_export_view()?;
                    Ok(Some(Fragment::done(key)))
                } else {
                    Ok(Some(Fragment::failed(key, FILE_ERROR)))
                }
            },
        ),
    );

    registry
}

fn load_file(key: &str, value: &str, controller: &mut dyn Controller) -> CommandResult {
    let path = Path::new(value);
    if !path.is_file() {
        return Ok(Some(Fragment::failed(key, FILE_ERROR)));
    }

    if controller.load_file(path)? {
        Ok(Some(Fragment::done(key)))
    } else {
        Ok(Some(Fragment::failed(key, FILE_ERROR)))
    }
}

fn select_axes(key: &str, value: &str, controller: &mut dyn Controller) -> CommandResult {
    let Some(axes) = parse_axes(value) else {
        return Ok(Some(Fragment::failed(key, INDEX_ERROR)));
    };

    match controller.set_axes(axes) {
        Ok(()) => Ok(Some(Fragment::done(key))),
        Err(ControllerError::AxisOutOfRange { .. }) => {
            Ok(Some(Fragment::failed(key, INDEX_ERROR)))
        }
        Err(err) => Err(err.into()),
    }
}

/// Whether `path` names the controller's open file.
///
/// Paths are compared literally first and then canonicalized, so relative and
/// absolute spellings of the same file match.
fn is_current_file(controller: &dyn Controller, path: &Path) -> bool {
    let Some(current) = controller.current_file() else {
        return false;
    };
    if current.as_path() == path {
        return true;
    }
    match (current.canonicalize(), path.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
