// ============================================================================
// Structure : MarketDataEvent
// ============================================================================
// Événement reçu par la fonction : { "tickers": ["AAPL", "MSFT", ...] }
//
// L'événement est reçu sous forme de serde_json::Value brute et validé à la
// main : on veut distinguer "pas de tickers" / "pas une liste" / "liste vide"
// d'un JSON totalement invalide, et répondre 400 dans tous ces cas.
// ============================================================================

use serde_json::Value;

use crate::error::EventError;

/// Événement validé
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketDataEvent {
    /// Tickers dans l'ordre de l'événement (doublons conservés)
    pub tickers: Vec<String>,
}

impl MarketDataEvent {
    /// Valide l'événement brut
    ///
    /// Règles :
    /// - `tickers` doit exister et être un tableau non vide
    /// - chaque élément doit être une chaîne non vide (hors espaces)
    pub fn from_value(event: &Value) -> Result<Self, EventError> {
        let array = event
            .get("tickers")
            .and_then(Value::as_array)
            .ok_or(EventError::InvalidTickers)?;

        if array.is_empty() {
            return Err(EventError::InvalidTickers);
        }

        let tickers = array
            .iter()
            .map(|item| match item.as_str() {
                Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
                _ => Err(EventError::InvalidTickers),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { tickers })
    }

    /// Construit un événement à partir d'une liste de symboles (CLI)
    pub fn from_symbols<I, S>(symbols: I) -> Result<Self, EventError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tickers: Vec<Value> = symbols
            .into_iter()
            .map(|s| Value::String(s.into()))
            .collect();
        Self::from_value(&serde_json::json!({ "tickers": tickers }))
    }
}
