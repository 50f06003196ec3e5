// ============================================================================
// Structures : MarketDataReport et LambdaResponse
// ============================================================================
// Le rapport agrège les snapshots de tous les tickers dans trois maps
// (quotes, sectors, betas) plus un horodatage. Il est sérialisé en JSON puis
// placé dans le champ "body" de la réponse.
//
// Les maps suivent l'ordre de première apparition des tickers dans l'événement.
// ============================================================================

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use serde_json::json;

use crate::models::{Quote, TickerSnapshot};

/// Rapport final renvoyé par la fonction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataReport {
    pub quotes: IndexMap<String, Quote>,
    pub sectors: IndexMap<String, String>,
    pub betas: IndexMap<String, f64>,
    /// Horodatage RFC 3339 (UTC) de la génération du rapport
    pub timestamp: String,
}

impl MarketDataReport {
    pub fn new() -> Self {
        Self {
            quotes: IndexMap::new(),
            sectors: IndexMap::new(),
            betas: IndexMap::new(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    /// Enregistre le snapshot d'un ticker (écrase une entrée existante)
    pub fn insert(&mut self, ticker: &str, snapshot: &TickerSnapshot) {
        self.quotes.insert(ticker.to_string(), snapshot.quote);
        self.sectors
            .insert(ticker.to_string(), snapshot.info.sector.clone());
        self.betas.insert(ticker.to_string(), snapshot.info.beta);
    }

    /// Nombre de tickers distincts du rapport
    pub fn ticker_count(&self) -> usize {
        self.quotes.len()
    }
}

impl Default for MarketDataReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Réponse au format Lambda : { "statusCode": 200, "body": "<json>" }
///
/// CONCEPT : le body est une *chaîne* JSON, pas un objet imbriqué
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaResponse {
    pub status_code: u16,
    pub body: String,
}

impl LambdaResponse {
    /// 200 avec le rapport sérialisé
    pub fn ok(report: &MarketDataReport) -> anyhow::Result<Self> {
        Ok(Self {
            status_code: 200,
            body: serde_json::to_string(report)?,
        })
    }

    /// 400 : événement invalide
    pub fn bad_request(message: &str) -> Self {
        Self {
            status_code: 400,
            body: json!({ "error": message }).to_string(),
        }
    }

    /// 500 : erreur inattendue
    pub fn internal_error(message: &str) -> Self {
        Self {
            status_code: 500,
            body: json!({
                "error": "Failed to fetch market data",
                "message": message,
            })
            .to_string(),
        }
    }

    /// Décode le body JSON (pratique pour les tests et la CLI)
    pub fn body_json(&self) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
