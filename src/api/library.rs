// ============================================================================
// Provider : library
// ============================================================================
// Wrapper autour de la bibliothèque tierce `yahoo_finance_api`.
// La bibliothèque gère elle-même cookies et crumb ; on se contente de :
// - prendre les clôtures journalières des 5 derniers jours
// - lire secteur et beta dans le quoteSummary qu'elle expose
//
// CONCEPT RUST : tokio::sync::Mutex
// - get_ticker_info prend &mut self (il met à jour le crumb)
// - Le trait QuoteProvider ne donne que &self
// - Un Mutex async permet de garder le verrou à travers un .await
// ============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use yahoo_finance_api::{YQuoteSummary, YahooConnector};

use super::QuoteProvider;
use crate::config::Config;
use crate::models::{CompanyInfo, Quote, TickerSnapshot};
use crate::reference::default_company_info;

/// Provider basé sur yahoo_finance_api
pub struct LibraryProvider {
    connector: Mutex<YahooConnector>,
}

impl LibraryProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let connector = YahooConnector::builder()
            .timeout(config.chart_timeout)
            .build()
            .context("Échec de la création du connecteur yahoo_finance_api")?;

        Ok(Self {
            connector: Mutex::new(connector),
        })
    }
}

/// Cotation à partir des clôtures chronologiques
///
/// Dernière clôture = prix courant ; avant-dernière = clôture précédente
/// (ou le prix courant s'il n'y a qu'une seule séance).
pub fn quote_from_history(closes: &[f64]) -> Result<Quote> {
    let current = *closes.last().context("No historical data available")?;
    let previous = if closes.len() > 1 {
        closes[closes.len() - 2]
    } else {
        current
    };
    Ok(Quote::from_closes(current, previous))
}

/// Secteur et beta depuis le quoteSummary de la bibliothèque
fn company_info_from_summary(summary: YQuoteSummary) -> Option<CompanyInfo> {
    let data = summary.quote_summary?.result?.into_iter().next()?;

    let sector = data
        .asset_profile
        .as_ref()
        .and_then(|profile| profile.sector.clone())
        .filter(|sector| !sector.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    let beta = data
        .summary_detail
        .as_ref()
        .and_then(|detail| detail.beta)
        .unwrap_or(1.0);

    Some(CompanyInfo::new(sector, beta))
}

#[async_trait]
impl QuoteProvider for LibraryProvider {
    fn name(&self) -> &'static str {
        "library"
    }

    #[instrument(skip(self))]
    async fn fetch_live(&self, ticker: &str) -> Result<TickerSnapshot> {
        let mut connector = self.connector.lock().await;

        let response = connector
            .get_quote_range(ticker, "1d", "5d")
            .await
            .with_context(|| format!("Échec de la récupération de l'historique de {}", ticker))?;
        let closes: Vec<f64> = response
            .quotes()
            .context("Historique vide")?
            .iter()
            .map(|q| q.close)
            .collect();
        debug!(closes = closes.len(), "History received");

        let quote = quote_from_history(&closes)?;

        // Les infos société peuvent échouer (rate limit) sans invalider le prix
        let company = match connector.get_ticker_info(ticker).await {
            Ok(summary) => company_info_from_summary(summary),
            Err(e) => {
                warn!(error = %e, "Ticker info failed");
                None
            }
        };
        let company = company.unwrap_or_else(|| default_company_info(ticker));

        info!(quote = %quote.display(), sector = %company.sector, beta = company.beta, "Ticker processed");
        Ok(TickerSnapshot::live(quote, company))
    }

    fn fallback(&self, _ticker: &str) -> TickerSnapshot {
        TickerSnapshot::default_for_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataSource;

    #[test]
    fn test_quote_from_history() {
        let quote = quote_from_history(&[100.0, 102.0, 99.0]).unwrap();
        assert_eq!(quote, Quote::from_closes(99.0, 102.0));
    }

    #[test]
    fn test_single_session_has_no_change() {
        let quote = quote_from_history(&[42.5]).unwrap();
        assert_eq!(quote.price, 42.5);
        assert_eq!(quote.change, 0.0);
        assert_eq!(quote.change_percent, 0.0);
    }

    #[test]
    fn test_empty_history_is_an_error() {
        assert!(quote_from_history(&[]).is_err());
    }

    #[test]
    fn test_fallback_is_default_snapshot() {
        let provider = LibraryProvider::new(&Config::default()).unwrap();
        let snapshot = provider.fallback("AAPL");
        assert_eq!(snapshot.source, DataSource::Default);
        assert_eq!(snapshot.quote, Quote::zero());
    }
}
