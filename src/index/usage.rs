use super::{DependentKind, IndexError, ReverseIndex};
use std::sync::Arc;

/// Decides whether a secret is still needed by any dependent.
#[derive(Debug, Clone)]
pub struct UsageDetector {
    index: Arc<ReverseIndex>,
}

impl UsageDetector {
    #[must_use]
    pub fn new(index: Arc<ReverseIndex>) -> Self {
        Self { index }
    }

    /// `true` when at least one Certificate or Issuer references the secret.
    /// Index failures are returned as-is, never read as "unused".
    pub async fn is_used(&self, namespace: &str, name: &str) -> Result<bool, IndexError> {
        let key = format!("{namespace}/{name}");
        for kind in DependentKind::ALL {
            let dependents = self.index.lookup(kind, &key).await?;
            if let Some(first) = dependents.first() {
                tracing::trace!(
                    secret = %key,
                    dependent.kind = %kind,
                    dependent.name = %first,
                    "secret is in use"
                );
                return Ok(true);
            }
        }
        Ok(false)
    }
}
