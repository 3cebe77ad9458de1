pub mod error;
pub mod export;
pub mod index;
pub mod model;
pub mod normalize;
pub mod source;
pub mod store;

pub use error::{ExportError, SkipReason, SourceError};
pub use export::{EndpointExport, EndpointRow, ExportFormat};
pub use index::{BuildReport, NodeView, Prefix, SiteIndex, SkippedEntry};
pub use model::{CapturedRequest, RawRecord, RecordId, SourceEntry};
pub use normalize::normalize;
pub use source::{CaptureDb, JsonFileSource, RecordSource, SqliteSource, open_source};
pub use store::{IndexStore, Snapshot};
