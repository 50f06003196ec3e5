// ============================================================================
// Provider : basic
// ============================================================================
// Variante minimale : une seule requête par endpoint, aucun retry, aucune
// rotation. Le prix vient des métadonnées du chart (regularMarketPrice et
// previousClose) plutôt que des séries de clôtures.
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::transport::{HttpRequest, HttpTransport};
use super::yahoo::{self, ChartResponse, QuoteSummaryResponse};
use super::QuoteProvider;
use crate::config::Config;
use crate::models::{CompanyInfo, Quote, TickerSnapshot};

const USER_AGENT: &str = "Mozilla/5.0";

/// Provider sans retry
pub struct BasicProvider {
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl BasicProvider {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &Config) -> Self {
        Self {
            transport,
            timeout: config.chart_timeout,
        }
    }

    /// GET qui échoue sur tout statut non-200
    async fn get_ok(&self, request: HttpRequest) -> Result<String> {
        let url = request.url.clone();
        let response = self.transport.get(request).await?;
        if response.status != 200 {
            bail!("HTTP {} pour {}", response.status, url);
        }
        Ok(response.body)
    }

    /// Prix depuis les métadonnées du chart (1 jour)
    pub async fn fetch_quote(&self, ticker: &str) -> Result<Quote> {
        let request = HttpRequest::get(yahoo::chart_url("query1", ticker))
            .query("interval", "1d")
            .query("range", "1d")
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout);

        let body = self.get_ok(request).await?;
        let response: ChartResponse =
            serde_json::from_str(&body).context("Réponse chart invalide")?;
        let result = response.into_first_result().context("No data in response")?;

        let meta = result.meta.as_ref();
        let current = meta.and_then(|m| m.regular_market_price).unwrap_or(0.0);
        let previous = meta.and_then(|m| m.previous_close).unwrap_or(current);

        Ok(Quote::from_closes(current, previous))
    }

    /// Secteur (assetProfile) et beta (defaultKeyStatistics)
    ///
    /// Toute erreur donne Unknown / 1.0.
    pub async fn fetch_company_info(&self, ticker: &str) -> CompanyInfo {
        match self.try_company_info(ticker).await {
            Ok(info) => info,
            Err(e) => {
                warn!(ticker, error = %e, "Could not fetch detailed info");
                CompanyInfo::unknown()
            }
        }
    }

    async fn try_company_info(&self, ticker: &str) -> Result<CompanyInfo> {
        let request = HttpRequest::get(yahoo::quote_summary_url("query2", ticker))
            .query("modules", "assetProfile,defaultKeyStatistics")
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout);

        let body = self.get_ok(request).await?;
        let response: QuoteSummaryResponse =
            serde_json::from_str(&body).context("Réponse quoteSummary invalide")?;
        let result = response
            .into_first_result()
            .context("quoteSummary sans résultat")?;

        let sector = result.sector().unwrap_or("Unknown");
        let beta = result.key_statistics_beta().unwrap_or(1.0);
        Ok(CompanyInfo::new(sector, beta))
    }
}

#[async_trait]
impl QuoteProvider for BasicProvider {
    fn name(&self) -> &'static str {
        "basic"
    }

    #[instrument(skip(self))]
    async fn fetch_live(&self, ticker: &str) -> Result<TickerSnapshot> {
        let quote = self.fetch_quote(ticker).await?;
        debug!(quote = %quote.display(), "Quote fetched");

        let company = self.fetch_company_info(ticker).await;
        info!(sector = %company.sector, beta = company.beta, "Ticker processed");
        Ok(TickerSnapshot::live(quote, company))
    }

    fn fallback(&self, _ticker: &str) -> TickerSnapshot {
        TickerSnapshot::default_for_failure()
    }
}
