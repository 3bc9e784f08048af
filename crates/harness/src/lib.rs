mod fixture;
mod recording;

pub use fixture::{BASE_CATALOG, LANGUAGE, TestCatalog, TestReverter, VIRTUAL_CATALOG};
pub use recording::{RecordingCache, RecordingDirectory, RecordingSchema};
