// ============================================================================
// Provider : chain
// ============================================================================
// Enchaîne plusieurs providers : le premier `fetch_live` qui réussit gagne.
// Si tous échouent, le repli est celui du premier provider de la chaîne
// (les données mock du scraper dans la configuration standard).
// ============================================================================

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::QuoteProvider;
use crate::models::TickerSnapshot;

pub struct ChainProvider {
    providers: Vec<Box<dyn QuoteProvider>>,
}

impl ChainProvider {
    pub fn new(providers: Vec<Box<dyn QuoteProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl QuoteProvider for ChainProvider {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn fetch_live(&self, ticker: &str) -> Result<TickerSnapshot> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            match provider.fetch_live(ticker).await {
                Ok(snapshot) => {
                    debug!(ticker, provider = provider.name(), "Chain resolved");
                    return Ok(snapshot);
                }
                Err(e) => {
                    warn!(ticker, provider = provider.name(), error = %e, "Provider failed, trying next");
                    failures.push(format!("{}: {:#}", provider.name(), e));
                }
            }
        }

        Err(anyhow!("every provider failed for {} ({})", ticker, failures.join("; ")))
    }

    fn fallback(&self, ticker: &str) -> TickerSnapshot {
        self.providers
            .first()
            .map(|provider| provider.fallback(ticker))
            .unwrap_or_else(TickerSnapshot::default_for_failure)
    }

    fn paced(&self) -> bool {
        self.providers.iter().any(|provider| provider.paced())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::models::{CompanyInfo, DataSource, Quote};

    /// Provider de test : réussit ou échoue, compte ses appels
    struct Stub {
        name: &'static str,
        succeed: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl QuoteProvider for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch_live(&self, _ticker: &str) -> Result<TickerSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(TickerSnapshot::live(
                    Quote::from_closes(2.0, 1.0),
                    CompanyInfo::new(self.name, 1.0),
                ))
            } else {
                Err(anyhow!("{} down", self.name))
            }
        }

        fn fallback(&self, _ticker: &str) -> TickerSnapshot {
            TickerSnapshot {
                quote: Quote::zero(),
                info: CompanyInfo::new(self.name, 1.0),
                source: DataSource::Mock,
            }
        }
    }

    fn stub(name: &'static str, succeed: bool, calls: &Arc<AtomicUsize>) -> Box<dyn QuoteProvider> {
        Box::new(Stub {
            name,
            succeed,
            calls: calls.clone(),
        })
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = ChainProvider::new(vec![
            stub("first", false, &calls),
            stub("second", true, &calls),
            stub("third", true, &calls),
        ]);

        let snapshot = chain.fetch("AAPL").await;
        assert_eq!(snapshot.info.sector, "second");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_fail_uses_first_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = ChainProvider::new(vec![stub("first", false, &calls), stub("second", false, &calls)]);

        let error = chain.fetch_live("AAPL").await.unwrap_err().to_string();
        assert!(error.contains("first down") && error.contains("second down"));

        let snapshot = chain.fetch("AAPL").await;
        assert_eq!(snapshot.source, DataSource::Mock);
        assert_eq!(snapshot.info.sector, "first");
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain = ChainProvider::new(Vec::new());
        assert!(chain.fetch_live("X").await.is_err());
        assert!(!chain.paced());
        assert_eq!(chain.fallback("X"), TickerSnapshot::default_for_failure());
    }
}
