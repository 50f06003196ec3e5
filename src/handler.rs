// ============================================================================
// Handler de la fonction
// ============================================================================
// Point d'entrée "serverless" : reçoit un événement JSON, renvoie une
// LambdaResponse { statusCode, body }.
//
// Déroulé :
// 1. Validation de l'événement (400 si invalide)
// 2. Construction du provider (500 si impossible)
// 3. Pour chaque ticker, dans l'ordre :
//    - doublon : réutilise le cache de l'invocation
//    - sinon : pause anti-burst (sauf premier ticker), puis fetch
// 4. 200 avec le rapport
// ============================================================================

use std::collections::HashMap;

use serde_json::Value;
use tracing::{error, info, instrument};

use crate::api::retry::JitterRange;
use crate::api::{build_provider, QuoteProvider};
use crate::config::Config;
use crate::models::{LambdaResponse, MarketDataEvent, MarketDataReport, TickerSnapshot};

/// Traite un événement brut avec la configuration donnée
#[instrument(skip_all, fields(provider = config.provider.label()))]
pub async fn handle_event(event: &Value, config: &Config) -> LambdaResponse {
    info!(event = %event, "Market data event received");

    let request = match MarketDataEvent::from_value(event) {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Invalid event");
            return LambdaResponse::bad_request(&e.to_string());
        }
    };

    let provider = match build_provider(config.provider, config) {
        Ok(provider) => provider,
        Err(e) => {
            error!(error = ?e, "Failed to build provider");
            return LambdaResponse::internal_error(&format!("{:#}", e));
        }
    };

    let report = fetch_report(&request, provider.as_ref(), config.effective_spacing()).await;
    respond(&report)
}

/// Variante avec un provider déjà construit
pub async fn handle_event_with(
    event: &Value,
    provider: &dyn QuoteProvider,
    spacing: JitterRange,
) -> LambdaResponse {
    match MarketDataEvent::from_value(event) {
        Ok(request) => respond(&fetch_report(&request, provider, spacing).await),
        Err(e) => LambdaResponse::bad_request(&e.to_string()),
    }
}

fn respond(report: &MarketDataReport) -> LambdaResponse {
    match LambdaResponse::ok(report) {
        Ok(response) => response,
        Err(e) => {
            error!(error = ?e, "Failed to serialize report");
            LambdaResponse::internal_error(&e.to_string())
        }
    }
}

/// Récupère les données de tous les tickers de l'événement
///
/// CONCEPT : cache d'invocation
/// - Un ticker répété n'est récupéré qu'une fois
/// - Le cache vit le temps de l'appel, rien n'est persisté
pub async fn fetch_report(
    request: &MarketDataEvent,
    provider: &dyn QuoteProvider,
    spacing: JitterRange,
) -> MarketDataReport {
    let mut report = MarketDataReport::new();
    let mut cache: HashMap<&str, TickerSnapshot> = HashMap::new();
    let total = request.tickers.len();

    for (idx, ticker) in request.tickers.iter().enumerate() {
        info!(ticker = %ticker, progress = idx + 1, total, "Processing ticker");

        if let Some(snapshot) = cache.get(ticker.as_str()) {
            info!(ticker = %ticker, "Using cached result");
            report.insert(ticker, snapshot);
            continue;
        }

        if idx > 0 && provider.paced() {
            let delay = {
                let mut rng = rand::rng();
                spacing.sample(&mut rng)
            };
            info!(wait_secs = delay.as_secs_f64(), "Sleeping to avoid burst rate limit");
            tokio::time::sleep(delay).await;
        }

        let snapshot = provider.fetch(ticker).await;
        info!(
            ticker = %ticker,
            price = snapshot.quote.price,
            sector = %snapshot.info.sector,
            beta = snapshot.info.beta,
            source = ?snapshot.source,
            "Ticker done"
        );

        report.insert(ticker, &snapshot);
        cache.insert(ticker.as_str(), snapshot);
    }

    info!(tickers = report.ticker_count(), requested = total, "Report ready");
    report
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::api::transport::scripted::ScriptedTransport;
    use crate::api::yahoo::fixtures::{chart_body, summary_body};
    use crate::api::ScraperProvider;
    use crate::models::{CompanyInfo, Quote};

    /// Provider qui compte les fetchs et renvoie un prix fixe
    struct Counting {
        calls: AtomicUsize,
        paced: bool,
    }

    impl Counting {
        fn new(paced: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                paced,
            }
        }
    }

    #[async_trait]
    impl QuoteProvider for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn fetch_live(&self, ticker: &str) -> Result<TickerSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ticker == "FAIL" {
                anyhow::bail!("unavailable");
            }
            Ok(TickerSnapshot::live(
                Quote::from_closes(101.0, 100.0),
                CompanyInfo::new("Technology", 1.2),
            ))
        }

        fn fallback(&self, _ticker: &str) -> TickerSnapshot {
            TickerSnapshot::default_for_failure()
        }

        fn paced(&self) -> bool {
            self.paced
        }
    }

    #[tokio::test]
    async fn test_invalid_event_returns_400() {
        let config = Config::default();
        for event in [json!({}), json!({"tickers": []}), json!({"tickers": "AAPL"})] {
            let response = handle_event(&event, &config).await;
            assert_eq!(response.status_code, 400);
            assert_eq!(
                response.body_json().unwrap(),
                json!({"error": "Invalid tickers array provided"})
            );
        }
    }

    #[tokio::test]
    async fn test_duplicates_hit_the_cache() {
        let provider = Counting::new(false);
        let event = json!({"tickers": ["AAPL", "MSFT", "AAPL"]});

        let response = handle_event_with(&event, &provider, JitterRange::ZERO).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

        let body = response.body_json().unwrap();
        assert_eq!(body["quotes"]["AAPL"]["price"], 101.0);
        assert_eq!(body["quotes"]["AAPL"]["changePercent"], 1.0);
        assert_eq!(body["sectors"]["MSFT"], "Technology");
        assert_eq!(body["betas"]["MSFT"], 1.2);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_failed_ticker_uses_provider_fallback() {
        let provider = Counting::new(false);
        let request = MarketDataEvent::from_symbols(["FAIL", "AAPL"]).unwrap();

        let report = fetch_report(&request, &provider, JitterRange::ZERO).await;
        assert_eq!(report.ticker_count(), 2);
        assert_eq!(report.quotes["FAIL"], Quote::zero());
        assert_eq!(report.sectors["FAIL"], "Unknown");
        assert_eq!(report.betas["FAIL"], 1.0);
    }

    #[tokio::test]
    async fn test_scraper_end_to_end_with_mock_fallback() {
        // AAPL réussit ; TSLA échoue 3 fois -> mock
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(200, &chart_body(&[Some(230.0), Some(234.6)]))
                .respond(200, &summary_body(Some("Technology"), Some(1.24)))
                .respond(503, "")
                .respond(429, "")
                .fail("timeout"),
        );
        let config = Config {
            no_delay: true,
            ..Config::default()
        };
        let provider = ScraperProvider::new(transport.clone(), &config);

        let event = json!({"tickers": ["AAPL", "TSLA"]});
        let response = handle_event_with(&event, &provider, config.effective_spacing()).await;
        let body = response.body_json().unwrap();

        assert_eq!(body["quotes"]["AAPL"]["price"], 234.6);
        assert_eq!(body["quotes"]["AAPL"]["change"], 4.6);
        assert_eq!(body["betas"]["AAPL"], 1.24);
        assert_eq!(body["sectors"]["TSLA"], "Consumer Cyclical");
        assert_eq!(body["betas"]["TSLA"], 2.0);
        assert_eq!(transport.request_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_provider_waits_once_between_distinct_tickers() {
        let provider = Counting::new(true);
        let request = MarketDataEvent::from_symbols(["A", "B", "A"]).unwrap();

        let start = tokio::time::Instant::now();
        fetch_report(&request, &provider, JitterRange::new(5.0, 5.0)).await;
        let elapsed = start.elapsed();

        // Pause avant B uniquement : ni avant le premier ticker, ni sur un hit du cache
        assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_millis(5100));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unpaced_provider_never_waits() {
        let provider = Counting::new(false);
        let request = MarketDataEvent::from_symbols(["A", "B", "C"]).unwrap();

        let start = tokio::time::Instant::now();
        fetch_report(&request, &provider, JitterRange::new(5.0, 5.0)).await;

        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_report_keeps_event_order() {
        let provider = Counting::new(false);
        let event = json!({"tickers": ["MSFT", "AAPL", "GOOGL", "MSFT"]});

        let response = handle_event_with(&event, &provider, JitterRange::ZERO).await;
        let body = response.body_json().unwrap();

        for section in ["quotes", "sectors", "betas"] {
            let keys: Vec<&String> = body[section].as_object().unwrap().keys().collect();
            assert_eq!(keys, ["MSFT", "AAPL", "GOOGL"], "section {}", section);
        }
    }
}
