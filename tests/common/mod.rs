#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use playlog::fs::mock::MockFileSystem;
use playlog::fs::FileSystem;
use serde_yaml::Value;

/// Mock filesystem plus the trait-object handle the store wants.
pub fn mock_fs() -> (MockFileSystem, Arc<dyn FileSystem>) {
    let fs = MockFileSystem::new();
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    (fs, shared)
}

/// Parse a stream file (a YAML list of mappings) from the mock.
pub fn read_entries(fs: &MockFileSystem, path: impl AsRef<Path>) -> Vec<Value> {
    let path = path.as_ref();
    let bytes = fs
        .contents(path)
        .unwrap_or_else(|| panic!("missing log file {:?}", path));
    serde_yaml::from_slice(&bytes).expect("log file is a YAML sequence")
}

/// Parse a single YAML mapping document from the mock.
pub fn read_document(fs: &MockFileSystem, path: impl AsRef<Path>) -> Value {
    let path = path.as_ref();
    let bytes = fs
        .contents(path)
        .unwrap_or_else(|| panic!("missing file {:?}", path));
    serde_yaml::from_slice(&bytes).expect("valid YAML document")
}

pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}
