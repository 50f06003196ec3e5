// ============================================================================
// Provider : scraper
// ============================================================================
// Appels directs aux endpoints non documentés de Yahoo Finance :
// - prix : v8/finance/chart (3 tentatives, 10 s)
// - secteur/beta : v10/finance/quoteSummary (2 tentatives, 5 s)
//
// Chaque tentative tire au hasard un endpoint (query1/query2) et un
// User-Agent. En cas d'échec du prix, le repli est une donnée mock ;
// en cas d'échec des infos société, une table statique par groupe.
// ============================================================================

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::retry::{retry, RetryPolicy};
use super::transport::{HttpRequest, HttpTransport};
use super::yahoo::{self, ChartResponse, QuoteSummaryResponse, YAHOO_HOME};
use super::QuoteProvider;
use crate::config::Config;
use crate::error::MarketDataError;
use crate::models::{CompanyInfo, Quote, TickerSnapshot};
use crate::reference::{self, default_company_info, mock_snapshot};

/// Scraper Yahoo Finance avec retries
pub struct ScraperProvider {
    transport: Arc<dyn HttpTransport>,
    chart_policy: RetryPolicy,
    info_policy: RetryPolicy,
    endpoints: Vec<String>,
}

impl ScraperProvider {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &Config) -> Self {
        Self {
            transport,
            chart_policy: config.chart_policy(),
            info_policy: config.info_policy(),
            endpoints: config.endpoints.clone(),
        }
    }

    /// Tire endpoint et User-Agent pour une tentative
    ///
    /// Le ThreadRng est créé et détruit ici, jamais gardé à travers un .await
    fn pick_route(&self) -> (String, &'static str) {
        let mut rng = rand::rng();
        let endpoint = reference::random_endpoint(&self.endpoints, &mut rng).to_string();
        let user_agent = reference::random_user_agent(&mut rng);
        (endpoint, user_agent)
    }

    /// Prix courant et variation via l'API chart
    ///
    /// Retourne une erreur quand toutes les tentatives ont échoué.
    #[instrument(skip(self))]
    pub async fn fetch_chart_price(&self, ticker: &str) -> Result<Quote, MarketDataError> {
        let max = self.chart_policy.max_attempts;
        let result = retry(&self.chart_policy, ticker, move |attempt| {
            self.chart_attempt(ticker, attempt, max)
        })
        .await;

        match &result {
            Ok(quote) => info!(quote = %quote.display(), "Chart price fetched"),
            Err(e) => warn!(error = %e, "All chart attempts failed"),
        }
        result
    }

    async fn chart_attempt(&self, ticker: &str, attempt: u32, max: u32) -> Result<Quote, MarketDataError> {
        let (endpoint, user_agent) = self.pick_route();
        debug!(attempt = attempt + 1, max, endpoint = %endpoint, "Fetching chart");

        let request = HttpRequest::get(yahoo::chart_url(&endpoint, ticker))
            .query("range", "5d")
            .query("interval", "1d")
            .header("User-Agent", user_agent)
            .header("Accept", "application/json")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Referer", &format!("{}/", YAHOO_HOME))
            .header("Origin", YAHOO_HOME)
            .timeout(self.chart_policy.timeout);

        let body = self.send(request).await?;

        let response: ChartResponse =
            serde_json::from_str(&body).map_err(|e| MarketDataError::Parse(e.to_string()))?;
        let result = response
            .into_first_result()
            .ok_or_else(|| MarketDataError::EmptyResult(ticker.to_string()))?;

        let closes = result.valid_closes();
        if closes.len() < 2 {
            return Err(MarketDataError::InsufficientData(closes.len()));
        }

        let current = closes[closes.len() - 1];
        let previous = closes[closes.len() - 2];
        Ok(Quote::from_closes(current, previous))
    }

    /// Secteur et beta via quoteSummary
    ///
    /// Ne peut pas échouer : après la dernière tentative, on retombe sur
    /// la table statique par groupe de tickers.
    #[instrument(skip(self))]
    pub async fn fetch_company_info(&self, ticker: &str) -> CompanyInfo {
        let result = retry(&self.info_policy, ticker, move |_| self.info_attempt(ticker)).await;

        match result {
            Ok(info) => {
                debug!(sector = %info.sector, beta = info.beta, "Company info fetched");
                info
            }
            Err(e) => {
                let fallback = default_company_info(ticker);
                warn!(error = %e, sector = %fallback.sector, beta = fallback.beta, "Using default company info");
                fallback
            }
        }
    }

    async fn info_attempt(&self, ticker: &str) -> Result<CompanyInfo, MarketDataError> {
        let (endpoint, user_agent) = self.pick_route();

        let request = HttpRequest::get(yahoo::quote_summary_url(&endpoint, ticker))
            .query("modules", "summaryDetail,assetProfile")
            .header("User-Agent", user_agent)
            .header("Accept", "application/json")
            .timeout(self.info_policy.timeout);

        let body = self.send(request).await?;

        let response: QuoteSummaryResponse =
            serde_json::from_str(&body).map_err(|e| MarketDataError::Parse(e.to_string()))?;
        let result = response
            .into_first_result()
            .ok_or_else(|| MarketDataError::EmptyResult(ticker.to_string()))?;

        // Les deux champs sont requis, sinon on retente
        match (result.sector(), result.summary_beta()) {
            (Some(sector), Some(beta)) if !sector.is_empty() => Ok(CompanyInfo::new(sector, beta)),
            _ => Err(MarketDataError::IncompleteInfo(ticker.to_string())),
        }
    }

    /// Envoie la requête et convertit statut/erreur réseau en MarketDataError
    async fn send(&self, request: HttpRequest) -> Result<String, MarketDataError> {
        let response = self
            .transport
            .get(request)
            .await
            .map_err(|e| MarketDataError::Transport(format!("{:#}", e)))?;

        debug!(status = response.status, body_len = response.body.len(), "Response received");

        match response.status {
            200 => Ok(response.body),
            429 => Err(MarketDataError::RateLimited),
            status => Err(MarketDataError::Status(status)),
        }
    }
}

#[async_trait]
impl QuoteProvider for ScraperProvider {
    fn name(&self) -> &'static str {
        "scraper"
    }

    async fn fetch_live(&self, ticker: &str) -> Result<TickerSnapshot> {
        let quote = self.fetch_chart_price(ticker).await?;
        let info = self.fetch_company_info(ticker).await;
        Ok(TickerSnapshot::live(quote, info))
    }

    fn fallback(&self, ticker: &str) -> TickerSnapshot {
        let mut rng = rand::rng();
        mock_snapshot(ticker, &mut rng)
    }

    fn paced(&self) -> bool {
        true
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::scripted::ScriptedTransport;
    use crate::api::yahoo::fixtures::{chart_body, summary_body};
    use crate::models::DataSource;

    fn config() -> Config {
        Config {
            no_delay: true,
            ..Config::default()
        }
    }

    fn scraper(transport: Arc<ScriptedTransport>) -> ScraperProvider {
        ScraperProvider::new(transport, &config())
    }

    #[tokio::test]
    async fn test_chart_price_success() {
        let transport = Arc::new(
            ScriptedTransport::new().respond(200, &chart_body(&[Some(98.0), Some(100.0), None, Some(105.0)])),
        );
        let quote = scraper(transport.clone()).fetch_chart_price("AAPL").await.unwrap();

        assert_eq!(quote, Quote::from_closes(105.0, 100.0));

        let request = &transport.recorded()[0];
        assert!(request.url.ends_with("/v8/finance/chart/AAPL"));
        assert!(request.url.starts_with("https://query1.") || request.url.starts_with("https://query2."));
        assert!(request.query.contains(&("range".to_string(), "5d".to_string())));
        assert!(request.query.contains(&("interval".to_string(), "1d".to_string())));
        assert_eq!(request.header_value("Origin"), Some("https://finance.yahoo.com"));
        assert!(reference::USER_AGENTS.contains(&request.header_value("User-Agent").unwrap()));
    }

    #[tokio::test]
    async fn test_chart_price_retries_each_failure_kind() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(429, "")
                .fail("connection reset")
                .respond(200, &chart_body(&[Some(50.0), Some(51.0)])),
        );
        let quote = scraper(transport.clone()).fetch_chart_price("MSFT").await.unwrap();

        assert_eq!(quote.price, 51.0);
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_chart_price_exhausted() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(500, "oops")
                .respond(200, "not json")
                .respond(200, &chart_body(&[None, Some(10.0)])),
        );
        let result = scraper(transport.clone()).fetch_chart_price("TSLA").await;

        assert!(matches!(result, Err(MarketDataError::Exhausted { attempts: 3, .. })));
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_chart_result_is_retried() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(200, r#"{"chart":{"result":[],"error":null}}"#)
                .respond(200, &chart_body(&[Some(1.0), Some(2.0)])),
        );
        let quote = scraper(transport).fetch_chart_price("NVDA").await.unwrap();
        assert_eq!(quote.change_percent, 100.0);
    }

    #[tokio::test]
    async fn test_company_info_success() {
        let transport = Arc::new(ScriptedTransport::new().respond(200, &summary_body(Some("Technology"), Some(1.24))));
        let info = scraper(transport.clone()).fetch_company_info("AAPL").await;

        assert_eq!(info, CompanyInfo::new("Technology", 1.24));
        let request = &transport.recorded()[0];
        assert!(request.url.ends_with("/v10/finance/quoteSummary/AAPL"));
        assert_eq!(
            request.query,
            vec![("modules".to_string(), "summaryDetail,assetProfile".to_string())]
        );
    }

    #[tokio::test]
    async fn test_company_info_incomplete_then_fallback_table() {
        // Beta manquant sur les deux tentatives -> table statique
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(200, &summary_body(Some("Healthcare"), None))
                .respond(429, ""),
        );
        let info = scraper(transport.clone()).fetch_company_info("pfe").await;

        assert_eq!(info, CompanyInfo::new("Healthcare", 0.9));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_mock() {
        let transport = Arc::new(ScriptedTransport::new());
        let snapshot = scraper(transport.clone()).fetch("AMD").await;

        assert_eq!(snapshot.source, DataSource::Mock);
        assert_eq!(snapshot.info, CompanyInfo::new("Technology", 1.8));
        // Le prix a échoué : quoteSummary n'est jamais appelé
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_fetch_live_combines_price_and_info() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(200, &chart_body(&[Some(200.0), Some(210.0)]))
                .respond(200, &summary_body(Some("Financial Services"), Some(1.08))),
        );
        let snapshot = scraper(transport).fetch("JPM").await;

        assert_eq!(snapshot.source, DataSource::Live);
        assert_eq!(snapshot.quote.change, 10.0);
        assert_eq!(snapshot.info, CompanyInfo::new("Financial Services", 1.08));
    }
}
