//! Tabular data loaded once at startup

pub mod passthrough;
pub mod reference;

pub use passthrough::{PassthroughDataset, PassthroughDatasets};
pub use reference::ReferenceTable;
