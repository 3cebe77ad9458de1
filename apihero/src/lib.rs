// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

pub mod logging;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    format_build_summary, format_records, load_snapshot, load_snapshot_from, parse_prefixes,
    resolve_path, select_records,
};

// Re-export the engine from apihero-core
pub use apihero_core::{
    EndpointExport, ExportFormat, IndexStore, Prefix, SiteIndex, Snapshot, normalize,
};
