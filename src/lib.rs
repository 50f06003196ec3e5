// ============================================================================
// market-data - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;         // Providers de données de marché
pub mod config;      // Configuration (environnement + CLI)
pub mod diagnostics; // Diagnostic de l'environnement d'exécution
pub mod error;       // Erreurs typées
pub mod handler;     // Handler serverless
pub mod models;      // Structures de données
pub mod reference;   // Tables statiques (User-Agents, mock, défauts)

pub use handler::handle_event;
