//! Classification of raw notifier events.
//!
//! Maps `notify` event kinds onto [`Operation`] and decides which operations
//! should trigger the command. Everything here is pure.

use std::path::{Path, PathBuf};

use notify::event::{EventKind, ModifyKind, RenameMode};

use crate::types::{ChangeRecord, Operation};

/// Maps a `notify` event kind to an [`Operation`].
///
/// `Modify(Any)` counts as a write because several backends (kqueue, polling)
/// report content changes without further detail. The destination side of a
/// rename (`RenameMode::To`) is a creation: something new appeared in the tree.
#[must_use]
pub fn operation_of(kind: &EventKind) -> Operation {
    match kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            Operation::Create
        }
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
            Operation::Write
        }
        EventKind::Modify(ModifyKind::Name(_)) => Operation::Rename,
        EventKind::Remove(_) => Operation::Remove,
        EventKind::Modify(ModifyKind::Metadata(_))
        | EventKind::Modify(ModifyKind::Other)
        | EventKind::Access(_)
        | EventKind::Any
        | EventKind::Other => Operation::Other,
    }
}

/// Operation for the path at `index` within one event.
///
/// A paired rename (`RenameMode::Both`) carries `[from, to]`; the destination
/// is a creation, the source stays a rename.
#[must_use]
pub fn operation_for_path(kind: &EventKind, index: usize) -> Operation {
    match kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if index == 1 => Operation::Create,
        _ => operation_of(kind),
    }
}

/// Returns `true` if the operation should trigger the command.
#[must_use]
pub fn is_qualifying(operation: Operation) -> bool {
    matches!(operation, Operation::Create | Operation::Write)
}

/// Returns `true` if the record should trigger the command.
#[must_use]
pub fn qualifies(record: &ChangeRecord) -> bool {
    is_qualifying(record.operation)
}

/// Path of `path` relative to `root`, for log output.
///
/// Falls back to the full path when `path` is not under `root`.
#[must_use]
pub fn relative_path(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
