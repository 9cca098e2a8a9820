/**
 * API REST VIGIE - Passerelle de rapports et dashboard
 *
 * RÔLE :
 * Reçoit les rapports de vie des services (POST /) et sert l'état agrégé :
 * dashboard HTML (GET /), vues JSON (/records, /sites/{site}) et santé du
 * collecteur (/health, /system/health).
 *
 * FONCTIONNEMENT :
 * - L'adresse du rapporteur vient de la connexion (ConnectInfo), jamais du corps.
 * - Un rapport traité = un cycle complet load → merge → save sous le verrou du
 *   store, dans l'ordre d'arrivée. Un rapport invalide ne touche pas au store.
 * - Les requêtes sans corps (GET /) ne font que du rendu, aucune réconciliation.
 */
use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use time::PrimitiveDateTime;

use crate::config::CollectorConfig;
use crate::dashboard::{self, RecordLine, SiteLine};
use crate::health::{CollectorHealth, HealthTracker};
use crate::models::{local_minute_now, minute_stamp, ReportIn, ServiceRecord};
use crate::probe;
use crate::reconcile;
use crate::store::StatusStore;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CollectorConfig>,
    pub store: Arc<StatusStore>,
    pub health_tracker: HealthTracker,
}

#[derive(Serialize)]
struct RecordView {
    site: String,
    host: String,
    process: String,
    interval_minutes: u32,
    last_update: String, // même format que le fichier : "YYYY-MM-DD HH:MM"
    source_address: String,
    overdue: bool,
    age_minutes: i64,
}

fn to_view(r: &ServiceRecord, now: PrimitiveDateTime) -> RecordView {
    let age = now - r.last_update;
    RecordView {
        site: r.site.clone(),
        host: r.host.clone(),
        process: r.process.clone(),
        interval_minutes: r.interval_minutes,
        last_update: minute_stamp::format(&r.last_update),
        source_address: r.source_address.clone(),
        overdue: reconcile::is_overdue(r, now),
        age_minutes: age.whole_minutes().max(0),
    }
}

#[derive(Serialize)]
struct SiteView {
    site: String,
    address: Option<String>,
    reachable: Option<bool>,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(get_dashboard).post(post_report))
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/records", get(get_records))
        .route("/sites/{site}", get(get_site))
        .with_state(app_state)
}

// POST / (rapport de vie d'un service)
async fn post_report(
    State(app): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(report): Json<ReportIn>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Err(e) = report.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "ok": false, "msg": e.to_string() })),
        );
    }

    // adresse observée sur la connexion, pas celle que le rapport prétend avoir
    let observed_address = peer.ip().to_string();
    let now = local_minute_now(app.cfg.utc_offset_hours);

    let _cycle = app.store.begin_cycle().await;
    let mut records = match app.store.load().await {
        Ok(records) => records,
        Err(e) => {
            eprintln!("[http] lecture du store impossible: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "ok": false, "msg": "store unreadable" })),
            );
        }
    };

    let inserted = reconcile::reconcile(&mut records, &report, &observed_address, now);

    if let Err(e) = app.store.save(&records).await {
        // la mise à jour est perdue : on le dit au rapporteur au lieu de l'avaler
        eprintln!("[http] écriture du store impossible: {e}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "msg": "save failed, report dropped" })),
        );
    }

    let identity = format!("{}/{}/{}", report.site, report.host, report.process);
    if inserted {
        println!("[vigie] nouveau service suivi: {identity} ({observed_address})");
    }
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "ok": true,
            "recorded": identity,
            "at": minute_stamp::format(&now),
        })),
    )
}

// GET / (dashboard HTML, aucune réconciliation)
async fn get_dashboard(State(app): State<AppState>) -> Html<String> {
    let records = match app.store.load().await {
        Ok(records) => records,
        Err(e) => {
            eprintln!("[http] lecture du store impossible: {e}");
            return Html(dashboard::render_unavailable());
        }
    };
    let now = local_minute_now(app.cfg.utc_offset_hours);

    // tri lexicographique imposé au rendu uniquement, le journal reste sans ordre
    let mut sorted: Vec<&ServiceRecord> = records.iter().collect();
    sorted.sort_by(|a, b| (&a.site, &a.host, &a.process).cmp(&(&b.site, &b.host, &b.process)));
    let record_lines: Vec<RecordLine> = sorted
        .iter()
        .map(|r| RecordLine {
            identity: r.identity(),
            overdue: reconcile::is_overdue(r, now),
        })
        .collect();

    let sites: BTreeSet<&str> = records.iter().map(|r| r.site.as_str()).collect();
    let mut site_lines = Vec::with_capacity(sites.len());
    for site in sites {
        let address = reconcile::current_address(&records, site, now).map(str::to_string);
        let reachable = match (&address, &app.cfg.probe) {
            (Some(addr), Some(conf)) => Some(probe::probe_address(conf, addr).await),
            _ => None,
        };
        site_lines.push(SiteLine {
            site: site.to_string(),
            address,
            reachable,
        });
    }

    Html(dashboard::render(&site_lines, &record_lines))
}

// GET /records (liste évaluée)
async fn get_records(State(app): State<AppState>) -> Result<Json<Vec<RecordView>>, StatusCode> {
    let records = app.store.load().await.map_err(|e| {
        eprintln!("[http] lecture du store impossible: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let now = local_minute_now(app.cfg.utc_offset_hours);

    let mut views: Vec<RecordView> = records.iter().map(|r| to_view(r, now)).collect();
    views.sort_by(|a, b| {
        (&a.site, &a.host, &a.process).cmp(&(&b.site, &b.host, &b.process))
    });
    Ok(Json(views))
}

// GET /sites/{site} (adresse courante + joignabilité)
async fn get_site(
    State(app): State<AppState>,
    Path(site): Path<String>,
) -> Result<Json<SiteView>, StatusCode> {
    let records = app.store.load().await.map_err(|e| {
        eprintln!("[http] lecture du store impossible: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    if !records.iter().any(|r| r.site == site) {
        return Err(StatusCode::NOT_FOUND);
    }

    let now = local_minute_now(app.cfg.utc_offset_hours);
    // None = aucun enregistrement frais, absence valide distincte d'une erreur
    let address = reconcile::current_address(&records, &site, now).map(str::to_string);
    let reachable = match (&address, &app.cfg.probe) {
        (Some(addr), Some(conf)) => Some(probe::probe_address(conf, addr).await),
        _ => None,
    };
    Ok(Json(SiteView {
        site,
        address,
        reachable,
    }))
}

// GET /system/health (état du collecteur)
async fn get_system_health(
    State(app): State<AppState>,
) -> Result<Json<CollectorHealth>, StatusCode> {
    let records = app.store.load().await.map_err(|e| {
        eprintln!("[http] lecture du store impossible: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let now = local_minute_now(app.cfg.utc_offset_hours);
    Ok(Json(app.health_tracker.get_health(&records, now)))
}
