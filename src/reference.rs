// ============================================================================
// Module : reference
// ============================================================================
// Tables statiques utilisées quand l'API ne répond pas :
// - pool de User-Agents et d'endpoints pour la rotation
// - secteur/beta par défaut par groupe de tickers
// - prix de référence pour générer des données mock réalistes
//
// CONCEPT RUST : const et &'static str
// - Les tables vivent dans le binaire, aucune allocation
// - Les recherches sont des parcours linéaires : les tables sont minuscules
// ============================================================================

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::info;

use crate::models::{CompanyInfo, DataSource, Quote, TickerSnapshot};

/// User-Agents de navigateurs réels, tirés au hasard à chaque tentative
pub const USER_AGENTS: [&str; 6] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1",
];

/// Sous-domaines de finance.yahoo.com qui répondent (query3 renvoie 404)
pub const ENDPOINTS: [&str; 2] = ["query1", "query2"];

/// Tire un User-Agent au hasard
pub fn random_user_agent<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0])
}

/// Tire un endpoint au hasard parmi ceux fournis
pub fn random_endpoint<'a, R: Rng + ?Sized>(endpoints: &'a [String], rng: &mut R) -> &'a str {
    endpoints
        .choose(rng)
        .map(String::as_str)
        .unwrap_or(ENDPOINTS[0])
}

// ============================================================================
// Secteur / beta par défaut
// ============================================================================

const TECHNOLOGY: [&str; 8] = ["AAPL", "MSFT", "GOOGL", "GOOG", "AMZN", "TSLA", "META", "NVDA"];
const FINANCIAL: [&str; 6] = ["JPM", "BAC", "WFC", "GS", "MS", "C"];
const HEALTHCARE: [&str; 5] = ["JNJ", "PFE", "UNH", "ABBV", "MRK"];

/// Secteur et beta supposés quand quoteSummary est indisponible
pub fn default_company_info(ticker: &str) -> CompanyInfo {
    let ticker = ticker.to_uppercase();
    let ticker = ticker.as_str();

    if TECHNOLOGY.contains(&ticker) {
        CompanyInfo::new("Technology", 1.2)
    } else if FINANCIAL.contains(&ticker) {
        CompanyInfo::new("Financial Services", 1.1)
    } else if HEALTHCARE.contains(&ticker) {
        CompanyInfo::new("Healthcare", 0.9)
    } else {
        CompanyInfo::unknown()
    }
}

// ============================================================================
// Données mock
// ============================================================================

/// Entrée de la table mock : prix de base, secteur, beta
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockStock {
    pub symbol: &'static str,
    pub price: f64,
    pub sector: &'static str,
    pub beta: f64,
}

const fn mock(symbol: &'static str, price: f64, sector: &'static str, beta: f64) -> MockStock {
    MockStock {
        symbol,
        price,
        sector,
        beta,
    }
}

/// Ordres de grandeur réalistes (octobre 2024)
pub const MOCK_STOCKS: [MockStock; 20] = [
    mock("AAPL", 235.0, "Technology", 1.2),
    mock("MSFT", 425.0, "Technology", 1.1),
    mock("GOOGL", 165.0, "Technology", 1.05),
    mock("GOOG", 167.0, "Technology", 1.05),
    mock("AMZN", 180.0, "Consumer Cyclical", 1.15),
    mock("TSLA", 265.0, "Consumer Cyclical", 2.0),
    mock("META", 580.0, "Technology", 1.3),
    mock("NVDA", 135.0, "Technology", 1.7),
    mock("JPM", 215.0, "Financial Services", 1.1),
    mock("BAC", 42.0, "Financial Services", 1.2),
    mock("WFC", 60.0, "Financial Services", 1.15),
    mock("JNJ", 160.0, "Healthcare", 0.6),
    mock("PFE", 29.0, "Healthcare", 0.7),
    mock("UNH", 570.0, "Healthcare", 0.75),
    mock("V", 285.0, "Financial Services", 1.0),
    mock("MA", 490.0, "Financial Services", 1.05),
    mock("WMT", 82.0, "Consumer Defensive", 0.55),
    mock("DIS", 115.0, "Communication Services", 1.15),
    mock("NFLX", 720.0, "Communication Services", 1.3),
    mock("AMD", 155.0, "Technology", 1.8),
];

/// Prix de base pour un ticker absent de la table
const GENERIC_BASE_PRICE: f64 = 100.0;

/// Amplitude maximale de la variation aléatoire (+/- 3%)
const MOCK_VARIATION: f64 = 0.03;

/// Cherche un ticker dans la table mock (insensible à la casse)
pub fn find_mock_stock(ticker: &str) -> Option<&'static MockStock> {
    MOCK_STOCKS
        .iter()
        .find(|stock| stock.symbol.eq_ignore_ascii_case(ticker))
}

/// Génère un snapshot mock pour un ticker
///
/// CONCEPT RUST : générique sur Rng
/// - En production : rand::rng()
/// - En test : StdRng::seed_from_u64 pour un résultat déterministe
pub fn mock_snapshot<R: Rng + ?Sized>(ticker: &str, rng: &mut R) -> TickerSnapshot {
    let (base_price, info) = match find_mock_stock(ticker) {
        Some(stock) => (stock.price, CompanyInfo::new(stock.sector, stock.beta)),
        None => (GENERIC_BASE_PRICE, CompanyInfo::unknown()),
    };

    let variation = rng.random_range(-MOCK_VARIATION..=MOCK_VARIATION);
    let current = base_price * (1.0 + variation);
    // La clôture précédente varie deux fois moins
    let previous = base_price * (1.0 - variation * 0.5);

    let quote = Quote::from_closes(current, previous);
    info!(ticker, quote = %quote.display(), "Using mock data");

    TickerSnapshot {
        quote,
        info,
        source: DataSource::Mock,
    }
}
