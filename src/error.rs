use thiserror::Error;

/// Failure inside the backing engine (connectivity, protocol).
///
/// The existence gate is never an error: a skipped conditional update comes
/// back as an ordinary `false`.
#[derive(Error, Debug)]
#[error("engine failure: {0}")]
pub struct EngineError(#[from] Box<dyn std::error::Error + Send + Sync>);

impl From<redis::RedisError> for EngineError {
    fn from(error: redis::RedisError) -> Self {
        Self(Box::new(error))
    }
}

/// An engine failure annotated with the operation and key it hit.
///
/// No retries, no fallback: the relational store stays authoritative, so the
/// caller decides whether a missed cache write matters.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{operation} failed for {key}")]
    Engine {
        operation: &'static str,
        key: String,
        #[source]
        source: EngineError,
    },
}

impl StoreError {
    pub(crate) fn engine(operation: &'static str, key: impl Into<String>) -> impl FnOnce(EngineError) -> Self {
        let key = key.into();
        move |source| Self::Engine {
            operation,
            key,
            source,
        }
    }
}
