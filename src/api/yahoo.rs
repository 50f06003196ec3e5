// ============================================================================
// API Yahoo Finance : structures JSON et URLs
// ============================================================================
// Structures partagées par les providers "scraper" et "basic" pour parser
// les réponses de deux endpoints non documentés :
// - v8/finance/chart/{ticker}          : historique de prix
// - v10/finance/quoteSummary/{ticker}  : profil société (secteur, beta)
//
// CONCEPT RUST : #[serde(rename_all = "camelCase")]
// - "regularMarketPrice" (JSON) -> regular_market_price (Rust)
//
// CONCEPT RUST : Option<T> partout
// - Yahoo omet régulièrement des champs, ou renvoie null
// - serde traite un champ Option absent comme None
// ============================================================================

use serde::Deserialize;

/// Domaine de l'API (préfixé par l'endpoint : query1, query2)
pub const YAHOO_DOMAIN: &str = "finance.yahoo.com";

/// Page d'accueil, utilisée pour les headers Referer/Origin
pub const YAHOO_HOME: &str = "https://finance.yahoo.com";

/// URL de l'API chart pour un ticker
pub fn chart_url(endpoint: &str, ticker: &str) -> String {
    format!("https://{}.{}/v8/finance/chart/{}", endpoint, YAHOO_DOMAIN, ticker)
}

/// URL de l'API quoteSummary pour un ticker
pub fn quote_summary_url(endpoint: &str, ticker: &str) -> String {
    format!(
        "https://{}.{}/v10/finance/quoteSummary/{}",
        endpoint, YAHOO_DOMAIN, ticker
    )
}

// ============================================================================
// v8/finance/chart
// ============================================================================

/// Réponse complète de l'API chart
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Option<Chart>,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: Option<Meta>,
    pub indicators: Option<Indicators>,
}

/// Métadonnées du ticker
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteBlock>,
}

/// Séries de prix ; seules les clôtures nous intéressent
#[derive(Debug, Deserialize)]
pub struct QuoteBlock {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Premier résultat, s'il existe
    pub fn into_first_result(self) -> Option<ChartResult> {
        self.chart?.result?.into_iter().next()
    }
}

impl ChartResult {
    /// Clôtures non nulles, dans l'ordre chronologique
    pub fn valid_closes(&self) -> Vec<f64> {
        self.indicators
            .as_ref()
            .and_then(|indicators| indicators.quote.first())
            .map(|block| block.close.iter().flatten().copied().collect())
            .unwrap_or_default()
    }
}

// ============================================================================
// v10/finance/quoteSummary
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    pub quote_summary: Option<QuoteSummary>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteSummary {
    pub result: Option<Vec<SummaryResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub asset_profile: Option<AssetProfile>,
    pub summary_detail: Option<SummaryDetail>,
    pub default_key_statistics: Option<KeyStatistics>,
}

#[derive(Debug, Deserialize)]
pub struct AssetProfile {
    pub sector: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryDetail {
    pub beta: Option<NumericField>,
}

#[derive(Debug, Deserialize)]
pub struct KeyStatistics {
    pub beta: Option<NumericField>,
}

/// Valeur numérique Yahoo : soit `{"raw": 1.2, "fmt": "1.20"}`, soit `1.2`
///
/// CONCEPT RUST : #[serde(untagged)]
/// - serde essaie chaque variante dans l'ordre
/// - `{}` (objet vide, fréquent chez Yahoo) donne Wrapped { raw: None }
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Plain(f64),
    Wrapped { raw: Option<f64> },
}

impl NumericField {
    pub fn value(&self) -> Option<f64> {
        match self {
            NumericField::Plain(v) => Some(*v),
            NumericField::Wrapped { raw } => *raw,
        }
    }
}

impl QuoteSummaryResponse {
    pub fn into_first_result(self) -> Option<SummaryResult> {
        self.quote_summary?.result?.into_iter().next()
    }
}

impl SummaryResult {
    /// Secteur depuis assetProfile
    pub fn sector(&self) -> Option<&str> {
        self.asset_profile.as_ref()?.sector.as_deref()
    }

    /// Beta depuis summaryDetail
    pub fn summary_beta(&self) -> Option<f64> {
        self.summary_detail.as_ref()?.beta.as_ref()?.value()
    }

    /// Beta depuis defaultKeyStatistics
    pub fn key_statistics_beta(&self) -> Option<f64> {
        self.default_key_statistics.as_ref()?.beta.as_ref()?.value()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    /// Réponse chart avec les clôtures données (None -> null)
    pub fn chart_body(closes: &[Option<f64>]) -> String {
        serde_json::json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "AAPL", "regularMarketPrice": 230.1, "previousClose": 225.0 },
                    "timestamp": [1, 2, 3, 4, 5],
                    "indicators": { "quote": [{ "close": closes }] }
                }],
                "error": null
            }
        })
        .to_string()
    }

    /// Réponse quoteSummary avec secteur et beta optionnels
    pub fn summary_body(sector: Option<&str>, beta: Option<f64>) -> String {
        let beta = match beta {
            Some(b) => serde_json::json!({ "raw": b, "fmt": format!("{:.2}", b) }),
            None => serde_json::json!({}),
        };
        serde_json::json!({
            "quoteSummary": {
                "result": [{
                    "assetProfile": { "sector": sector, "industry": "Consumer Electronics" },
                    "summaryDetail": { "beta": beta }
                }],
                "error": null
            }
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        assert_eq!(
            chart_url("query1", "AAPL"),
            "https://query1.finance.yahoo.com/v8/finance/chart/AAPL"
        );
        assert_eq!(
            quote_summary_url("query2", "JPM"),
            "https://query2.finance.yahoo.com/v10/finance/quoteSummary/JPM"
        );
    }

    #[test]
    fn test_valid_closes_skip_nulls() {
        let body = fixtures::chart_body(&[Some(1.0), None, Some(3.0), None]);
        let response: ChartResponse = serde_json::from_str(&body).unwrap();
        let result = response.into_first_result().unwrap();
        assert_eq!(result.valid_closes(), vec![1.0, 3.0]);
        assert_eq!(result.meta.unwrap().regular_market_price, Some(230.1));
    }

    #[test]
    fn test_empty_chart_result() {
        let response: ChartResponse =
            serde_json::from_str(r#"{"chart":{"result":null,"error":{"code":"Not Found"}}}"#).unwrap();
        assert!(response.into_first_result().is_none());

        let response: ChartResponse = serde_json::from_str(r#"{"chart":{"result":[]}}"#).unwrap();
        assert!(response.into_first_result().is_none());
    }

    #[test]
    fn test_summary_fields() {
        let body = fixtures::summary_body(Some("Technology"), Some(1.24));
        let response: QuoteSummaryResponse = serde_json::from_str(&body).unwrap();
        let result = response.into_first_result().unwrap();
        assert_eq!(result.sector(), Some("Technology"));
        assert_eq!(result.summary_beta(), Some(1.24));
        assert_eq!(result.key_statistics_beta(), None);
    }

    #[test]
    fn test_numeric_field_shapes() {
        let plain: NumericField = serde_json::from_str("0.87").unwrap();
        assert_eq!(plain.value(), Some(0.87));

        let wrapped: NumericField = serde_json::from_str(r#"{"raw": 1.5, "fmt": "1.50"}"#).unwrap();
        assert_eq!(wrapped.value(), Some(1.5));

        let empty: NumericField = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.value(), None);
    }
}
