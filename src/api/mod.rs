// ============================================================================
// Module : api
// ============================================================================
// Les différentes sources de données de marché. Chaque provider sait :
// - récupérer des données réelles (`fetch_live`), ce qui peut échouer
// - produire un snapshot de repli (`fallback`), ce qui ne peut pas échouer
//
// Providers disponibles :
// - scraper : appels directs à l'API Yahoo, retries, rotation, mock en repli
// - library : bibliothèque tierce yahoo_finance_api
// - basic   : une seule requête, aucun retry
// - chain   : essaie scraper, library puis basic
// ============================================================================

pub mod basic;     // Variante minimale
pub mod chain;     // Chaîne de repli entre providers
pub mod library;   // Wrapper yahoo_finance_api
pub mod retry;     // Backoff et boucle de retry
pub mod scraper;   // Scraper avec retries
pub mod transport; // Abstraction HTTP
pub mod yahoo;     // Structures JSON Yahoo

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::models::TickerSnapshot;

pub use basic::BasicProvider;
pub use chain::ChainProvider;
pub use library::LibraryProvider;
pub use scraper::ScraperProvider;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

/// Choix du provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Scraper,
    Library,
    Basic,
    Chain,
}

impl ProviderKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Scraper => "scraper",
            ProviderKind::Library => "library",
            ProviderKind::Basic => "basic",
            ProviderKind::Chain => "chain",
        }
    }

    /// Tous les providers, dans l'ordre de la chaîne de repli
    pub fn all() -> [ProviderKind; 4] {
        [
            ProviderKind::Scraper,
            ProviderKind::Library,
            ProviderKind::Basic,
            ProviderKind::Chain,
        ]
    }
}

/// Source de données de marché
///
/// CONCEPT RUST : trait objet + async-trait
/// - Le handler manipule un `Box<dyn QuoteProvider>`
/// - `fetch` a une implémentation par défaut qui combine les deux autres
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Nom court pour les logs
    fn name(&self) -> &'static str;

    /// Récupère des données réelles pour un ticker
    async fn fetch_live(&self, ticker: &str) -> Result<TickerSnapshot>;

    /// Snapshot de repli quand `fetch_live` échoue
    fn fallback(&self, ticker: &str) -> TickerSnapshot;

    /// Vrai si le handler doit espacer les tickers (anti rate limit)
    fn paced(&self) -> bool {
        false
    }

    /// Données réelles, ou repli en cas d'échec
    async fn fetch(&self, ticker: &str) -> TickerSnapshot {
        match self.fetch_live(ticker).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(provider = self.name(), ticker, error = %e, "Live fetch failed, using fallback");
                self.fallback(ticker)
            }
        }
    }
}

/// Construit le provider demandé par la configuration
///
/// Le transport HTTP est partagé par tous les providers qui en ont besoin.
pub fn build_provider(kind: ProviderKind, config: &Config) -> Result<Box<dyn QuoteProvider>> {
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
    build_provider_with(kind, config, transport)
}

/// Variante avec transport injecté (tests)
pub fn build_provider_with(
    kind: ProviderKind,
    config: &Config,
    transport: Arc<dyn HttpTransport>,
) -> Result<Box<dyn QuoteProvider>> {
    let provider: Box<dyn QuoteProvider> = match kind {
        ProviderKind::Scraper => Box::new(ScraperProvider::new(transport, config)),
        ProviderKind::Library => Box::new(LibraryProvider::new(config)?),
        ProviderKind::Basic => Box::new(BasicProvider::new(transport, config)),
        ProviderKind::Chain => Box::new(ChainProvider::new(vec![
            Box::new(ScraperProvider::new(transport.clone(), config)),
            Box::new(LibraryProvider::new(config)?),
            Box::new(BasicProvider::new(transport, config)),
        ])),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyInfo, DataSource, Quote};

    struct AlwaysFails;

    #[async_trait]
    impl QuoteProvider for AlwaysFails {
        fn name(&self) -> &'static str {
            "always-fails"
        }

        async fn fetch_live(&self, _ticker: &str) -> Result<TickerSnapshot> {
            anyhow::bail!("offline")
        }

        fn fallback(&self, _ticker: &str) -> TickerSnapshot {
            TickerSnapshot::default_for_failure()
        }
    }

    struct AlwaysWorks;

    #[async_trait]
    impl QuoteProvider for AlwaysWorks {
        fn name(&self) -> &'static str {
            "always-works"
        }

        async fn fetch_live(&self, _ticker: &str) -> Result<TickerSnapshot> {
            Ok(TickerSnapshot::live(
                Quote::from_closes(10.0, 8.0),
                CompanyInfo::new("Energy", 0.8),
            ))
        }

        fn fallback(&self, _ticker: &str) -> TickerSnapshot {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_fetch_uses_fallback_on_error() {
        let snapshot = AlwaysFails.fetch("AAPL").await;
        assert_eq!(snapshot.source, DataSource::Default);
    }

    #[tokio::test]
    async fn test_fetch_prefers_live() {
        let snapshot = AlwaysWorks.fetch("XOM").await;
        assert_eq!(snapshot.source, DataSource::Live);
        assert_eq!(snapshot.quote.change_percent, 25.0);
    }

    #[test]
    fn test_provider_kind_labels() {
        assert_eq!(ProviderKind::default(), ProviderKind::Scraper);
        let labels: Vec<_> = ProviderKind::all().iter().map(|k| k.label()).collect();
        assert_eq!(labels, vec!["scraper", "library", "basic", "chain"]);
    }
}
