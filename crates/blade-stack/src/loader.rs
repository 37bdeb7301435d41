#![forbid(unsafe_code)]

//! Loader results and a few stock loaders.
//!
//! A loader is an async factory for a panel. Hosts pass any
//! `FnOnce() -> impl Future<Output = LoadResult>`; [`BladeLoader`] is the
//! type-erased form for code that stores loaders before running them.

use std::error::Error;
use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};

use crate::panel::BladePanel;

/// What a loader resolves to.
pub type LoadResult = Result<Box<dyn BladePanel>, LoadError>;

/// A type-erased loader.
pub type BladeLoader = Box<dyn FnOnce() -> LocalBoxFuture<'static, LoadResult>>;

/// A loader rejected.
#[derive(Debug)]
pub struct LoadError {
    message: String,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blade failed to load: {}", self.message)
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn Error + 'static))
    }
}

/// Erase a loader closure.
pub fn boxed<F, Fut>(loader: F) -> BladeLoader
where
    F: FnOnce() -> Fut + 'static,
    Fut: Future<Output = LoadResult> + 'static,
{
    Box::new(move || loader().boxed_local())
}

/// A loader that resolves immediately with `panel`.
pub fn immediate<P: BladePanel + 'static>(panel: P) -> BladeLoader {
    Box::new(move || future::ready::<LoadResult>(Ok(Box::new(panel))).boxed_local())
}

/// A loader that rejects immediately with `message`.
pub fn failing(message: impl Into<String>) -> BladeLoader {
    let error = LoadError::new(message);
    Box::new(move || future::ready::<LoadResult>(Err(error)).boxed_local())
}
