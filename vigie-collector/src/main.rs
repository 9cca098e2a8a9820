/**
 * VIGIE COLLECTOR - Point d'entrée du collecteur de statut
 *
 * RÔLE : Bootstrap du collecteur central : config, store JSON, API HTTP.
 * Les services du homelab rapportent leur vie (POST /), le dashboard montre
 * qui est à jour et qui est en retard, et si l'adresse de chaque site répond.
 *
 * ARCHITECTURE : requête/réponse synchrone — chaque rapport est traité
 * entièrement (load → merge → save) avant le suivant, un seul écrivain.
 */

mod config;
mod dashboard;
mod health;
mod http;
mod models;
mod probe;
mod reconcile;
mod store;

use crate::config::load_config;
use crate::health::HealthTracker;
use crate::http::AppState;
use crate::store::StatusStore;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    let cfg = load_config().await;

    // dossier de données du store
    if let Some(parent) = std::path::Path::new(&cfg.data_file).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                eprintln!("[vigie] warning: failed to create data dir: {e}");
            });
        }
    }

    let store = Arc::new(StatusStore::new(cfg.data_file.clone()));
    match store.load().await {
        Ok(records) => println!(
            "[vigie] {} services suivis dans {}",
            records.len(),
            cfg.data_file
        ),
        Err(e) => eprintln!("[vigie] store illisible au démarrage: {e}"),
    }

    let health_tracker = HealthTracker::new();

    let listen_port = cfg.listen_port;
    let app_state = AppState {
        cfg: Arc::new(cfg),
        store,
        health_tracker,
    };

    // HTTP — ConnectInfo expose l'adresse du rapporteur aux handlers
    let app = http::build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], listen_port));
    println!("[vigie] listening on http://{addr}");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr} impossible"))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("serveur HTTP arrêté")?;
    Ok(())
}
