//! Offline dismiss and restore against the persisted check result.

use std::io::{self, Write};

use revwatch::persistence::JsonFileStateStore;
use revwatch::{RevwatchConfig, RevwatchError, apply_stored_dismissal};

/// Dismisses (`dismiss == true`) or restores pull request `id`.
///
/// # Errors
///
/// Returns [`RevwatchError::UnknownPullRequest`] when `id` is not in the
/// expected list, or [`RevwatchError::Persistence`] when the state cannot be
/// read or written.
pub fn run(config: &RevwatchConfig, id: u64, dismiss: bool) -> Result<(), RevwatchError> {
    let store = JsonFileStateStore::open(&config.state_dir_path()?)?;
    if !apply_stored_dismissal(&store, id, dismiss)? {
        return Err(RevwatchError::UnknownPullRequest {
            id,
            list: if dismiss { "active" } else { "dismissed" },
        });
    }

    let verb = if dismiss { "Dismissed" } else { "Restored" };
    writeln!(io::stdout().lock(), "{verb} pull request {id}.")?;
    Ok(())
}
