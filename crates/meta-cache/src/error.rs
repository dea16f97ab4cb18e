use crate::list::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Node already linked: {0}")]
    NodeAlreadyLinked(NodeId),

    #[error("Stale node handle: {0}")]
    StaleNode(NodeId),

    #[error("No loader available for an uncached key")]
    MissingLoader,

    #[error(transparent)]
    Load(#[from] anyhow::Error),
}

impl CacheError {
    /// Misuse of the cache or list API, as opposed to a failed load.
    pub fn is_contract_violation(&self) -> bool {
        !matches!(self, CacheError::Load(_))
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violation_category() {
        assert!(CacheError::MissingLoader.is_contract_violation());
        assert!(!CacheError::Load(anyhow::anyhow!("boom")).is_contract_violation());
    }

    #[test]
    fn test_load_error_is_transparent() {
        let err = CacheError::from(anyhow::Error::new(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such table",
        )));
        assert_eq!(err.to_string(), "no such table");

        match err {
            CacheError::Load(inner) => {
                assert!(inner.downcast_ref::<std::io::Error>().is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
