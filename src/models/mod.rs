// ============================================================================
// Module : models
// ============================================================================
// Structures de données : cotations, événement d'entrée, rapport de sortie
// ============================================================================

pub mod event;  // Événement { "tickers": [...] }
pub mod quote;  // Quote, CompanyInfo, TickerSnapshot
pub mod report; // MarketDataReport, LambdaResponse

// Re-export des structures principales pour simplifier les imports
pub use event::MarketDataEvent;
pub use quote::{round2, CompanyInfo, DataSource, Quote, TickerSnapshot};
pub use report::{LambdaResponse, MarketDataReport};
