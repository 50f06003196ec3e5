// ============================================================================
// Structure : Quote
// ============================================================================
// Prix, variation absolue et variation en pourcentage d'un ticker sur une
// séance, plus les infos société (secteur, beta) qui l'accompagnent.
//
// CONCEPTS RUST :
// 1. #[serde(rename = "...")] : "changePercent" côté JSON, change_percent en Rust
// 2. Copy : Quote ne contient que des f64, on peut la copier librement
// ============================================================================

use serde::{Deserialize, Serialize};

/// Arrondit à 2 décimales, les demis vers le pair (0.125 -> 0.12)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Cotation d'un ticker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Dernier prix
    pub price: f64,

    /// Variation absolue depuis la clôture précédente
    pub change: f64,

    /// Variation en pourcentage
    #[serde(rename = "changePercent")]
    pub change_percent: f64,
}

impl Quote {
    /// Calcule la cotation à partir de la clôture courante et précédente
    ///
    /// Si la clôture précédente n'est pas strictement positive,
    /// la variation en pourcentage vaut 0.
    /// Toutes les valeurs sont arrondies à 2 décimales.
    pub fn from_closes(current: f64, previous: f64) -> Self {
        let change = current - previous;
        let change_percent = if previous > 0.0 {
            change / previous * 100.0
        } else {
            0.0
        };

        Self {
            price: round2(current),
            change: round2(change),
            change_percent: round2(change_percent),
        }
    }

    /// Cotation "vide" utilisée quand une requête a échoué
    pub fn zero() -> Self {
        Self {
            price: 0.0,
            change: 0.0,
            change_percent: 0.0,
        }
    }

    /// Formatte pour les logs : "$235.00 (+1.20%)"
    pub fn display(&self) -> String {
        format!("${:.2} ({:+.2}%)", self.price, self.change_percent)
    }
}

/// Secteur et beta d'une société
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub sector: String,
    pub beta: f64,
}

impl CompanyInfo {
    pub fn new(sector: impl Into<String>, beta: f64) -> Self {
        Self {
            sector: sector.into(),
            beta,
        }
    }

    /// Valeurs par défaut quand on ne sait rien du ticker
    pub fn unknown() -> Self {
        Self::new("Unknown", 1.0)
    }
}

/// Provenance des données d'un snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Données réelles récupérées depuis l'API
    Live,
    /// Données simulées (dernier recours du scraper)
    Mock,
    /// Valeurs nulles après un échec
    Default,
}

/// Résultat complet pour un ticker
#[derive(Debug, Clone, PartialEq)]
pub struct TickerSnapshot {
    pub quote: Quote,
    pub info: CompanyInfo,
    pub source: DataSource,
}

impl TickerSnapshot {
    pub fn live(quote: Quote, info: CompanyInfo) -> Self {
        Self {
            quote,
            info,
            source: DataSource::Live,
        }
    }

    /// Snapshot par défaut : prix à 0, secteur inconnu, beta 1.0
    pub fn default_for_failure() -> Self {
        Self {
            quote: Quote::zero(),
            info: CompanyInfo::unknown(),
            source: DataSource::Default,
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
