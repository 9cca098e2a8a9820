/**
 * VIGIE REPORTER - Client heartbeat lancé par cron
 *
 * Envoie un rapport de vie {site, host, process, interval} au collecteur.
 * Une exécution = un rapport : la périodicité est celle de la crontab, et
 * l'intervalle déclaré doit lui correspondre. En cas d'échec le code retour
 * est non nul, cron prévient l'opérateur.
 *
 * Exemple crontab (toutes les 5 minutes) :
 * 0-59/5 * * * * VIGIE_PROCESS=heartbeat VIGIE_INTERVAL_MINUTES=5 vigie-reporter
 */

use anyhow::Context;
use gethostname::gethostname;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Report {
    site: String,
    host: String,
    process: String,
    interval_minutes: u32,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Identité machine par défaut, surchargée par l'environnement
    let hostname = gethostname().to_string_lossy().to_string();
    let report = Report {
        site: env_or("VIGIE_SITE", "home"),
        host: env_or("VIGIE_HOST", &hostname),
        process: env_or("VIGIE_PROCESS", "heartbeat"),
        interval_minutes: env_or("VIGIE_INTERVAL_MINUTES", "5")
            .parse()
            .context("VIGIE_INTERVAL_MINUTES invalide")?,
    };
    if report.interval_minutes == 0 {
        anyhow::bail!("VIGIE_INTERVAL_MINUTES doit être >= 1");
    }
    let url = env_or("VIGIE_URL", "http://localhost:8080/");

    // l'adresse source est observée côté collecteur, on n'envoie que l'identité
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .json(&report)
        .send()
        .await
        .with_context(|| format!("POST {url} impossible"))?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("le collecteur a répondu {status}: {body}");
    }
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    println!(
        "[reporter] {}/{}/{} enregistré à {}",
        report.site,
        report.host,
        report.process,
        ack["at"].as_str().unwrap_or("?")
    );
    Ok(())
}
