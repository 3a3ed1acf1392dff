//! Ordered interceptor registry

use super::Interceptor;
use std::sync::Arc;

/// A registered interceptor with its diagnostic name
#[derive(Clone)]
pub struct MiddlewareEntry {
    pub name: String,
    pub interceptor: Arc<dyn Interceptor>,
}

impl std::fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Registration-ordered interceptors; names need not be unique
///
/// Entries are only ever appended. The owning pipeline invalidates its
/// compiled chain under the same lock as the push.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareRegistry {
    entries: Vec<MiddlewareEntry>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>, name: impl Into<String>) {
        self.entries.push(MiddlewareEntry {
            name: name.into(),
            interceptor,
        });
    }

    pub fn entries(&self) -> &[MiddlewareEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }
}
