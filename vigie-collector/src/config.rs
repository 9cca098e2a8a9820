use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CollectorConfig {
    pub listen_port: u16,
    pub data_file: String,
    // décalage fixe par rapport à UTC pour les horodatages du collecteur
    pub utc_offset_hours: i8,
    pub probe: Option<ProbeConf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProbeConf {
    pub command: String, // ex: "ping -c 1 -W 2", l'adresse est ajoutée en dernier argument
    pub timeout_seconds: Option<u64>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            listen_port: 8080,
            data_file: "./data/status.json".into(),
            utc_offset_hours: 0,
            probe: Some(ProbeConf {
                command: "ping -c 1 -W 2".into(),
                timeout_seconds: None,
            }),
        }
    }
}

pub async fn load_config() -> CollectorConfig {
    let path = std::env::var("VIGIE_CONFIG").unwrap_or_else(|_| "vigie.yaml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        if txt.trim().is_empty() {
            return CollectorConfig::default();
        }
        serde_yaml::from_str(&txt).unwrap_or_else(|e| {
            eprintln!("[vigie] config invalide: {e}");
            CollectorConfig::default()
        })
    } else {
        eprintln!("[vigie] pas de vigie.yaml, usage config par défaut");
        CollectorConfig::default()
    }
}
