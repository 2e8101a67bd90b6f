//! Testing infrastructure for Trellis Core
//!
//! Centralized test helpers so unit and integration tests get the same
//! isolation guarantees: every catalog lives in its own temporary
//! directory, cleaned up when the context drops.

use std::path::Path;
use tempfile::TempDir;

use crate::catalog::Catalog;
use crate::types::LabelId;

/// Context for managing test resources and lifecycle
///
/// Holds the temporary directory a test's catalog lives in; the
/// directory is removed when the context is dropped.
pub struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    /// Create a new context with a unique temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory");
        Self { temp_dir }
    }

    /// Path to the temporary directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Create an isolated catalog backed by a fresh temporary directory
pub fn create_test_catalog() -> (Catalog, TestContext) {
    let ctx = TestContext::new();
    let catalog = Catalog::open(ctx.path()).expect("Failed to open test catalog");
    (catalog, ctx)
}

/// Create an isolated catalog whose graphs get a small label id space
///
/// Useful for exercising wraparound and exhaustion without registering
/// tens of thousands of labels.
pub fn create_test_catalog_with_label_id_max(max: LabelId) -> (Catalog, TestContext) {
    let ctx = TestContext::new();
    let catalog =
        Catalog::with_label_id_max(ctx.path(), max).expect("Failed to open test catalog");
    (catalog, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creates_directory() {
        let ctx = TestContext::new();
        assert!(ctx.path().exists());
        assert!(ctx.path().is_dir());
    }
}
