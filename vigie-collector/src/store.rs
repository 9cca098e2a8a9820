/**
 * STORE JSON - Persistance du journal de statut
 *
 * RÔLE : Charger/sauver le journal complet (pas d'écriture incrémentale) dans
 * un fichier JSON unique. Le fichier est la seule source de vérité : chaque
 * réconciliation fait un cycle complet load → merge → save sous verrou.
 */
use crate::models::RecordSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub struct StatusStore {
    path: PathBuf,
    // vrai dès la première sauvegarde réussie : un fichier absent ensuite
    // est une panne de stockage, pas un premier démarrage
    has_persisted: AtomicBool,
    cycle: Mutex<()>,
}

impl StatusStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            has_persisted: AtomicBool::new(false),
            cycle: Mutex::new(()),
        }
    }

    /// Prend le verrou d'écriture : un seul cycle load → merge → save à la fois.
    pub async fn begin_cycle(&self) -> MutexGuard<'_, ()> {
        self.cycle.lock().await
    }

    /// Charge le journal complet depuis le fichier JSON.
    pub async fn load(&self) -> Result<RecordSet, StoreError> {
        if !self.path.exists() {
            if self.has_persisted.load(Ordering::Relaxed) {
                eprintln!(
                    "[store] ATTENTION: {} a disparu après écriture, journal traité comme vide",
                    self.path.display()
                );
            } else {
                println!("[store] no existing status file, starting fresh");
            }
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        let records: RecordSet = serde_json::from_str(&content)?;
        Ok(records)
    }

    /// Sauvegarde le journal complet dans le fichier JSON.
    pub async fn save(&self, records: &RecordSet) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, content).await?;
        self.has_persisted.store(true, Ordering::Relaxed);
        Ok(())
    }
}
