// ============================================================================
// Erreurs du crate
// ============================================================================
// Erreurs typées utilisées par les boucles de retry pour décider du délai
// d'attente, et par le handler pour choisir le code HTTP de la réponse.
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère l'implémentation de std::error::Error
// - #[error("...")] génère Display à partir d'un format
// - Les variantes restent matchables (contrairement à anyhow::Error)
// ============================================================================

use thiserror::Error;

/// Erreurs rencontrées lors d'un appel à Yahoo Finance
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Échec réseau (DNS, timeout, connexion refusée...)
    #[error("request failed: {0}")]
    Transport(String),

    /// HTTP 429 : trop de requêtes
    #[error("rate limited (HTTP 429)")]
    RateLimited,

    /// Tout autre statut que 200
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Corps de réponse non JSON ou structure inattendue
    #[error("invalid JSON payload: {0}")]
    Parse(String),

    /// `chart.result` (ou `quoteSummary.result`) absent ou vide
    #[error("empty result for {0}")]
    EmptyResult(String),

    /// Moins de deux clôtures non nulles
    #[error("insufficient close data (got {0})")]
    InsufficientData(usize),

    /// Sector ou beta manquant dans quoteSummary
    #[error("incomplete company info for {0}")]
    IncompleteInfo(String),

    /// Toutes les tentatives ont échoué
    #[error("all {attempts} attempts failed for {ticker}")]
    Exhausted { ticker: String, attempts: u32 },
}

/// Erreur de validation de l'événement d'entrée
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("Invalid tickers array provided")]
    InvalidTickers,
}
