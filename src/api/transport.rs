// ============================================================================
// Transport HTTP
// ============================================================================
// Abstraction minimale au-dessus de reqwest : une requête GET avec query,
// headers et timeout, une réponse avec statut et corps texte.
//
// CONCEPT RUST : trait + async-trait
// - Les providers dépendent de `dyn HttpTransport`, pas de reqwest
// - En test, un transport scripté rejoue des réponses préparées
// - async-trait permet les `async fn` dans un trait utilisé en objet (dyn)
// ============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

/// Requête GET à envoyer
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Valeur d'un header (recherche insensible à la casse)
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Réponse reçue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Client HTTP utilisé par les providers
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Envoie un GET. Une erreur signifie un échec réseau ;
    /// les statuts non-200 sont des réponses valides.
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Transport réel basé sur reqwest
///
/// Un seul `reqwest::Client` est partagé pour toute l'invocation
/// (pool de connexions, équivalent d'une session).
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Échec de la création du client HTTP")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .get(&request.url)
            .query(&request.query)
            .timeout(request.timeout);

        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        debug!(url = %request.url, "Sending HTTP request");
        let response = builder
            .send()
            .await
            .with_context(|| format!("Échec de la requête HTTP vers {}", request.url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .context("Échec de la lecture du corps de la réponse")?;

        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// Transport scripté pour les tests
// ============================================================================
