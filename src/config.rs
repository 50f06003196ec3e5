// ============================================================================
// Configuration
// ============================================================================
// Valeurs par défaut = constantes historiques de la fonction, surchargeables
// par variables d'environnement (c'est ainsi qu'on configure une fonction
// serverless), puis par les flags de la CLI.
//
// Variables reconnues :
// - MARKET_DATA_PROVIDER            scraper | library | basic | chain
// - MARKET_DATA_CHART_RETRIES       tentatives sur l'API chart (3)
// - MARKET_DATA_INFO_RETRIES        tentatives sur quoteSummary (2)
// - MARKET_DATA_CHART_TIMEOUT_SECS  timeout chart (10)
// - MARKET_DATA_INFO_TIMEOUT_SECS   timeout quoteSummary (5)
// - MARKET_DATA_SPACING_MIN_SECS    pause min entre tickers (4)
// - MARKET_DATA_SPACING_MAX_SECS    pause max entre tickers (8)
// - MARKET_DATA_ENDPOINTS           liste séparée par des virgules (query1,query2)
// - MARKET_DATA_NO_DELAY            1/true : aucune pause (tests locaux)
// - MARKET_DATA_LAYER_DIR           répertoire inspecté par le diagnostic (/opt)
// ============================================================================

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;

use crate::api::retry::{JitterRange, RetryPolicy};
use crate::api::ProviderKind;
use crate::reference::ENDPOINTS;

/// Plafond des durées configurables (timeouts et pauses), en secondes
const MAX_SECS: f64 = 300.0;

/// Configuration complète d'une invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub provider: ProviderKind,
    pub chart_retries: u32,
    pub info_retries: u32,
    pub chart_timeout: Duration,
    pub info_timeout: Duration,
    /// Pause entre deux tickers (anti burst rate limit)
    pub spacing: JitterRange,
    pub endpoints: Vec<String>,
    /// Désactive toutes les pauses
    pub no_delay: bool,
    pub layer_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Scraper,
            chart_retries: 3,
            info_retries: 2,
            chart_timeout: Duration::from_secs(10),
            info_timeout: Duration::from_secs(5),
            spacing: JitterRange::new(4.0, 8.0),
            endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
            no_delay: false,
            layer_dir: PathBuf::from("/opt"),
        }
    }
}

impl Config {
    /// Charge la configuration depuis l'environnement du process
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Charge la configuration depuis une fonction de lookup
    ///
    /// CONCEPT RUST : injection d'une closure
    /// - En production : std::env::var
    /// - En test : une HashMap, sans toucher à l'environnement global
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(value) = lookup("MARKET_DATA_PROVIDER") {
            config.provider = <ProviderKind as ValueEnum>::from_str(value.trim(), true)
                .map_err(|e| anyhow::anyhow!(e))
                .context("MARKET_DATA_PROVIDER invalide")?;
        }
        if let Some(n) = parse_var::<u32>(&lookup, "MARKET_DATA_CHART_RETRIES")? {
            config.chart_retries = n;
        }
        if let Some(n) = parse_var::<u32>(&lookup, "MARKET_DATA_INFO_RETRIES")? {
            config.info_retries = n;
        }
        if let Some(secs) = parse_var::<f64>(&lookup, "MARKET_DATA_CHART_TIMEOUT_SECS")? {
            config.chart_timeout = seconds(secs, "MARKET_DATA_CHART_TIMEOUT_SECS")?;
        }
        if let Some(secs) = parse_var::<f64>(&lookup, "MARKET_DATA_INFO_TIMEOUT_SECS")? {
            config.info_timeout = seconds(secs, "MARKET_DATA_INFO_TIMEOUT_SECS")?;
        }
        if let Some(secs) = parse_var::<f64>(&lookup, "MARKET_DATA_SPACING_MIN_SECS")? {
            config.spacing.min_secs = secs;
        }
        if let Some(secs) = parse_var::<f64>(&lookup, "MARKET_DATA_SPACING_MAX_SECS")? {
            config.spacing.max_secs = secs;
        }
        if let Some(value) = lookup("MARKET_DATA_ENDPOINTS") {
            config.endpoints = value
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = lookup("MARKET_DATA_NO_DELAY") {
            config.no_delay = matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(value) = lookup("MARKET_DATA_LAYER_DIR") {
            config.layer_dir = PathBuf::from(value);
        }

        config.validate()?;
        Ok(config)
    }

    /// Vérifie la cohérence des valeurs
    pub fn validate(&self) -> Result<()> {
        if self.chart_retries == 0 || self.info_retries == 0 {
            bail!("Le nombre de tentatives doit être au moins 1");
        }
        let JitterRange { min_secs, max_secs } = self.spacing;
        if !min_secs.is_finite()
            || !max_secs.is_finite()
            || min_secs < 0.0
            || max_secs < min_secs
            || max_secs > MAX_SECS
        {
            bail!(
                "Intervalle de pause invalide : [{}, {}]",
                self.spacing.min_secs,
                self.spacing.max_secs
            );
        }
        if self.endpoints.is_empty() {
            bail!("Au moins un endpoint Yahoo est requis");
        }
        Ok(())
    }

    /// Politique de retry de l'API chart
    pub fn chart_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::chart()
            .with_max_attempts(self.chart_retries)
            .with_timeout(self.chart_timeout);
        if self.no_delay {
            policy.immediate()
        } else {
            policy
        }
    }

    /// Politique de retry de l'API quoteSummary
    pub fn info_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::info()
            .with_max_attempts(self.info_retries)
            .with_timeout(self.info_timeout);
        if self.no_delay {
            policy.immediate()
        } else {
            policy
        }
    }

    /// Pause entre tickers effective
    pub fn effective_spacing(&self) -> JitterRange {
        if self.no_delay {
            JitterRange::ZERO
        } else {
            self.spacing
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => {
            let parsed = value
                .trim()
                .parse::<T>()
                .with_context(|| format!("{} invalide : {:?}", key, value))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn seconds(secs: f64, key: &str) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        bail!("{} doit être un nombre de secondes positif", key);
    }
    if secs > MAX_SECS {
        bail!("{} dépasse le plafond de {} secondes", key, MAX_SECS);
    }
    Ok(Duration::from_secs_f64(secs))
}
