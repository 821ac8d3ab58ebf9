// File operations and the action hub that speaks for them.

mod actions;
mod archive;
mod clipboard;
mod create_file;
mod feedback;
mod rename;
mod size;
mod transfer;
mod txt2folder;

pub use actions::Actions;
pub use archive::{compress_files, CompressSummary};
pub use clipboard::{ArboardClipboard, ClipboardError, ClipboardSink};
pub use create_file::{CreateFileError, CreateFileRequest, CreatePolicy, CreateReport};
pub use feedback::{BeepCadence, ProgressBeeper};
pub use rename::{RenameError, RenameOutcome, RenameRequest, RenameTarget};
pub use size::{format_size, SizeReport, SizeWorker};
pub use transfer::{MirrorSummary, MirrorWorker, TransferMode, TransferStage};
pub use txt2folder::{ExpansionReport, Txt2FolderError};
