/**
 * SONDE RÉSEAU - Test de joignabilité de l'adresse courante d'un site
 *
 * La commande vient de la config (ping par défaut), l'adresse est ajoutée en
 * dernier argument. Tout échec (lancement, timeout, code retour non nul) vaut
 * "injoignable" : c'est un signal négatif valide pour le dashboard, pas une erreur.
 */
use crate::config::ProbeConf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

pub async fn probe_address(conf: &ProbeConf, address: &str) -> bool {
    let mut argv = match shell_words::split(&conf.command) {
        Ok(argv) if !argv.is_empty() => argv,
        _ => {
            eprintln!("[probe] commande de sonde invalide: {:?}", conf.command);
            return false;
        }
    };
    argv.push(address.to_string());

    let timeout = Duration::from_secs(conf.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS));
    let status = Command::new(&argv[0])
        .args(&argv[1..])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match tokio::time::timeout(timeout, status).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(e)) => {
            eprintln!("[probe] lancement de {:?} impossible: {e}", argv[0]);
            false
        }
        Err(_) => false, // timeout = injoignable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_command_is_unreachable() {
        let conf = ProbeConf {
            command: "".into(),
            timeout_seconds: Some(1),
        };
        assert!(!probe_address(&conf, "127.0.0.1").await);
    }

    #[tokio::test]
    async fn test_missing_binary_is_unreachable() {
        let conf = ProbeConf {
            command: "/nonexistent/probe-binary -q".into(),
            timeout_seconds: Some(1),
        };
        assert!(!probe_address(&conf, "127.0.0.1").await);
    }

    #[tokio::test]
    async fn test_exit_code_drives_reachability() {
        let reachable = ProbeConf {
            command: "true".into(),
            timeout_seconds: Some(1),
        };
        assert!(probe_address(&reachable, "127.0.0.1").await);

        let unreachable = ProbeConf {
            command: "false".into(),
            timeout_seconds: Some(1),
        };
        assert!(!probe_address(&unreachable, "127.0.0.1").await);
    }
}
