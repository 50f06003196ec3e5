// ============================================================================
// Retry avec backoff aléatoire
// ============================================================================
// Chaque tentative échouée est suivie d'une pause dont la durée dépend de la
// nature de l'échec :
// - erreur réseau, statut non-200, payload invalide : pause courte aléatoire
// - HTTP 429 : backoff exponentiel 2^tentative * U(min, max)
// Aucune pause après la dernière tentative.
// ============================================================================

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::error::MarketDataError;

/// Intervalle de jitter, en secondes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl JitterRange {
    pub const ZERO: JitterRange = JitterRange::new(0.0, 0.0);

    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Tire une durée uniforme dans [min, max]
    ///
    /// Un intervalle non fini ou hors de portée de `Duration` donne une pause nulle.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if !self.min_secs.is_finite() || !self.max_secs.is_finite() {
            return Duration::ZERO;
        }
        let secs = if self.max_secs > self.min_secs {
            rng.random_range(self.min_secs..=self.max_secs)
        } else {
            self.min_secs
        };
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::ZERO)
    }
}

/// Politique de retry d'un appel
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Nombre total de tentatives
    pub max_attempts: u32,
    /// Timeout de chaque requête
    pub timeout: Duration,
    /// Pause après une erreur réseau
    pub on_transport_error: JitterRange,
    /// Pause après un statut non-200 (hors 429)
    pub on_bad_status: JitterRange,
    /// Pause après un JSON invalide ou incomplet
    pub on_bad_payload: JitterRange,
    /// Base du backoff exponentiel après un 429
    pub on_rate_limit: JitterRange,
}

impl RetryPolicy {
    /// Politique de l'API chart : 3 tentatives, 10 s
    pub fn chart() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(10),
            on_transport_error: JitterRange::new(0.5, 1.5),
            on_bad_status: JitterRange::new(0.5, 1.5),
            on_bad_payload: JitterRange::new(0.5, 1.0),
            on_rate_limit: JitterRange::new(2.0, 5.0),
        }
    }

    /// Politique de l'API quoteSummary : 2 tentatives, 5 s
    pub fn info() -> Self {
        Self {
            max_attempts: 2,
            timeout: Duration::from_secs(5),
            on_transport_error: JitterRange::new(0.5, 1.5),
            on_bad_status: JitterRange::new(0.5, 1.5),
            on_bad_payload: JitterRange::new(0.5, 1.0),
            on_rate_limit: JitterRange::new(2.0, 4.0),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Supprime toutes les pauses (tests, exécutions locales)
    pub fn immediate(mut self) -> Self {
        self.on_transport_error = JitterRange::ZERO;
        self.on_bad_status = JitterRange::ZERO;
        self.on_bad_payload = JitterRange::ZERO;
        self.on_rate_limit = JitterRange::ZERO;
        self
    }

    /// Durée de pause après l'échec de la tentative `attempt` (0-based)
    pub fn delay_for<R: Rng + ?Sized>(
        &self,
        error: &MarketDataError,
        attempt: u32,
        rng: &mut R,
    ) -> Duration {
        match error {
            MarketDataError::RateLimited => {
                let factor = 2u32.saturating_pow(attempt);
                self.on_rate_limit.sample(rng) * factor
            }
            MarketDataError::Transport(_) => self.on_transport_error.sample(rng),
            MarketDataError::Status(_) => self.on_bad_status.sample(rng),
            MarketDataError::Parse(_)
            | MarketDataError::EmptyResult(_)
            | MarketDataError::InsufficientData(_)
            | MarketDataError::IncompleteInfo(_) => self.on_bad_payload.sample(rng),
            MarketDataError::Exhausted { .. } => Duration::ZERO,
        }
    }
}

/// Exécute `operation` jusqu'au premier succès ou à l'épuisement des tentatives
///
/// CONCEPT RUST : closure qui retourne une Future
/// - FnMut(u32) -> Fut : la closure reçoit le numéro de tentative
/// - Chaque appel produit une nouvelle Future qu'on .await
///
/// Le ThreadRng n'est pas Send : on le crée dans un bloc qui se termine
/// avant le .await du sleep.
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    ticker: &str,
    mut operation: F,
) -> Result<T, MarketDataError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, MarketDataError>>,
{
    for attempt in 0..policy.max_attempts {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let is_last = attempt + 1 >= policy.max_attempts;
                if is_last {
                    warn!(ticker, attempt = attempt + 1, error = %error, "Last attempt failed");
                    break;
                }

                let delay = {
                    let mut rng = rand::rng();
                    policy.delay_for(&error, attempt, &mut rng)
                };

                if matches!(error, MarketDataError::RateLimited) {
                    warn!(ticker, wait_secs = delay.as_secs_f64(), "Rate limited, backing off");
                } else {
                    debug!(ticker, error = %error, wait_secs = delay.as_secs_f64(), "Attempt failed, retrying");
                }
                tokio::time::sleep(delay).await;
            }
        }
    }

    Err(MarketDataError::Exhausted {
        ticker: ticker.to_string(),
        attempts: policy.max_attempts,
    })
}
