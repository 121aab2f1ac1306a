//! Single-hop provider fallback.
//!
//! The primary provider is always tried first. Only when it fails is the
//! secondary tried, exactly once, and never concurrently with the primary.

use futures::future::BoxFuture;
use tracing::{debug, error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{error::AppError, providers::{ProviderKind, QuoteProvider}};

/// A value together with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T> {
    pub provider: ProviderKind,
    pub value: T,
}

pub async fn resolve_with_fallback<'a, T, F>(
    primary: &'a dyn QuoteProvider,
    secondary: Option<&'a dyn QuoteProvider>,
    op: F,
) -> Result<Resolution<T>, AppError>
where
    F: Fn(&'a dyn QuoteProvider) -> BoxFuture<'a, Result<T, AppError>>,
{
    let span = info_span!(
        "resolve",
        resolution_id = %Uuid::new_v4(),
        primary = %primary.kind(),
        secondary = secondary.map(|p| p.kind().as_str()).unwrap_or("none"),
    );

    async move {
        debug!("trying primary provider");
        let primary_err = match op(primary).await {
            Ok(value) => {
                return Ok(Resolution {
                    provider: primary.kind(),
                    value,
                })
            }
            Err(e) => e,
        };

        let Some(secondary) = secondary else {
            error!(error = %primary_err, "primary provider failed with no fallback configured");
            return Err(primary_err);
        };

        warn!(error = %primary_err, fallback = %secondary.kind(), "primary provider failed, falling back");
        match op(secondary).await {
            Ok(value) => Ok(Resolution {
                provider: secondary.kind(),
                value,
            }),
            Err(secondary_err) => {
                error!(error = %secondary_err, "fallback provider failed");
                Err(AppError::UpstreamError(format!(
                    "All providers failed ({}: {}; {}: {})",
                    primary.kind(),
                    primary_err,
                    secondary.kind(),
                    secondary_err
                )))
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::models::Quote;

    struct StubProvider {
        kind: ProviderKind,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(kind: ProviderKind, fail: bool) -> Self {
            Self {
                kind,
                fail,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteProvider for StubProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::UpstreamError(format!("{} is down", self.kind)));
            }
            Ok(symbols
                .iter()
                .map(|s| Quote::from_prices(s, 100.0, Some(99.0), 10))
                .collect())
        }
    }

    fn symbols() -> Vec<String> {
        vec!["AAPL".to_string(), "MSFT".to_string()]
    }

    #[tokio::test]
    async fn primary_success_skips_secondary() {
        let primary = StubProvider::new(ProviderKind::Backend, false);
        let secondary = StubProvider::new(ProviderKind::Yahoo, false);
        let symbols = symbols();

        let resolution = assert_ok!(
            resolve_with_fallback(&primary, Some(&secondary as &dyn QuoteProvider), |p| p.fetch_quotes(&symbols)).await
        );
        assert_eq!(resolution.provider, ProviderKind::Backend);
        assert_eq!(resolution.value.len(), 2);
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn primary_failure_falls_back_once() {
        let primary = StubProvider::new(ProviderKind::Backend, true);
        let secondary = StubProvider::new(ProviderKind::Yahoo, false);
        let symbols = symbols();

        let resolution = assert_ok!(
            resolve_with_fallback(&primary, Some(&secondary as &dyn QuoteProvider), |p| p.fetch_quotes(&symbols)).await
        );
        assert_eq!(resolution.provider, ProviderKind::Yahoo);
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn both_failing_names_both_errors() {
        let primary = StubProvider::new(ProviderKind::Backend, true);
        let secondary = StubProvider::new(ProviderKind::Yahoo, true);
        let symbols = symbols();

        let err = assert_err!(
            resolve_with_fallback(&primary, Some(&secondary as &dyn QuoteProvider), |p| p.fetch_quotes(&symbols)).await
        );
        let message = err.to_string();
        assert!(message.contains("backend"));
        assert!(message.contains("yahoo"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn no_secondary_returns_primary_error() {
        let primary = StubProvider::new(ProviderKind::Backend, true);
        let symbols = symbols();

        let err = assert_err!(resolve_with_fallback(&primary, None, |p| p.fetch_quotes(&symbols)).await);
        assert!(matches!(err, AppError::UpstreamError(_)));
        assert_eq!(primary.calls(), 1);
    }
}
