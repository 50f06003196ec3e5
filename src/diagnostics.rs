// ============================================================================
// Diagnostic de l'environnement d'exécution
// ============================================================================
// Indique ce qui est disponible là où la fonction tourne :
// - version du crate et plateforme cible
// - providers constructibles (ou l'erreur qui les en empêche)
// - variables d'environnement du runtime serverless
// - présence et contenu du répertoire de layers
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::api::{build_provider, ProviderKind};
use crate::config::Config;
use crate::models::LambdaResponse;

/// Variables renseignées par le runtime serverless
const RUNTIME_VARS: [&str; 3] = ["AWS_LAMBDA_FUNCTION_NAME", "AWS_EXECUTION_ENV", "AWS_REGION"];

/// Nombre maximum d'entrées listées pour le répertoire de layers
const MAX_LAYER_ENTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsReport {
    pub crate_name: String,
    pub crate_version: String,
    pub target_os: String,
    pub target_arch: String,
    pub providers: BTreeMap<String, String>,
    pub runtime: BTreeMap<String, String>,
    pub layer: LayerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerStatus {
    pub path: String,
    pub exists: bool,
    pub entries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collecte le diagnostic complet
pub fn collect(config: &Config) -> DiagnosticsReport {
    collect_with(config, |key| std::env::var(key).ok())
}

/// Variante avec lookup d'environnement injecté
pub fn collect_with<F>(config: &Config, lookup: F) -> DiagnosticsReport
where
    F: Fn(&str) -> Option<String>,
{
    let providers = ProviderKind::all()
        .iter()
        .map(|kind| {
            let status = match build_provider(*kind, config) {
                Ok(_) => "available".to_string(),
                Err(e) => {
                    warn!(provider = kind.label(), error = %e, "Provider unavailable");
                    format!("not available: {:#}", e)
                }
            };
            (kind.label().to_string(), status)
        })
        .collect();

    let runtime = RUNTIME_VARS
        .iter()
        .map(|key| {
            let value = lookup(key).unwrap_or_else(|| "not set".to_string());
            (key.to_string(), value)
        })
        .collect();

    DiagnosticsReport {
        crate_name: env!("CARGO_PKG_NAME").to_string(),
        crate_version: env!("CARGO_PKG_VERSION").to_string(),
        target_os: std::env::consts::OS.to_string(),
        target_arch: std::env::consts::ARCH.to_string(),
        providers,
        runtime,
        layer: inspect_layer(&config.layer_dir),
    }
}

/// Vérifie l'existence du répertoire et liste ses premières entrées (triées)
pub fn inspect_layer(path: &Path) -> LayerStatus {
    let mut status = LayerStatus {
        path: path.display().to_string(),
        exists: path.is_dir(),
        entries: Vec::new(),
        error: None,
    };

    if !status.exists {
        debug!(path = %status.path, "Layer directory not found");
        return status;
    }

    match std::fs::read_dir(path) {
        Ok(read_dir) => {
            let mut names: Vec<String> = read_dir
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names.truncate(MAX_LAYER_ENTRIES);
            status.entries = names;
        }
        Err(e) => status.error = Some(format!("cannot list: {}", e)),
    }

    status
}

/// Diagnostic au format réponse Lambda (body JSON indenté)
pub fn handle_diagnostics(config: &Config) -> LambdaResponse {
    let report = collect(config);
    match serde_json::to_string_pretty(&report) {
        Ok(body) => LambdaResponse {
            status_code: 200,
            body,
        },
        Err(e) => LambdaResponse::internal_error(&e.to_string()),
    }
}

/// Résumé lisible pour le terminal
pub fn render_human(report: &DiagnosticsReport) -> String {
    let mut lines = vec![
        format!("{} {}", report.crate_name, report.crate_version),
        format!("Platform: {}/{}", report.target_os, report.target_arch),
    ];

    for (name, status) in &report.providers {
        lines.push(format!("{} provider: {}", name, status));
    }
    for (key, value) in &report.runtime {
        lines.push(format!("{}: {}", key, value));
    }

    if report.layer.exists {
        lines.push(format!(
            "Layer directory {}: [{}]",
            report.layer.path,
            report.layer.entries.join(", ")
        ));
    } else {
        lines.push(format!("Layer directory not found at {}", report.layer.path));
    }

    lines.join("\n")
}
