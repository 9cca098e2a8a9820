/**
 * RÉCONCILIATION - Cœur du collecteur Vigie
 *
 * RÔLE : Fusionner un rapport entrant dans le journal de statut (mise à jour
 * en place ou insertion), évaluer le retard d'un service, et dériver
 * l'adresse courante d'un site depuis les enregistrements frais.
 *
 * Tout est pur : l'heure courante est passée en paramètre, jamais lue ici.
 */
use crate::models::{RecordSet, ReportIn, ServiceRecord};
use time::{Duration, PrimitiveDateTime};

// Tolérance : un service est "en retard" au-delà de 2x son intervalle déclaré
// (une pleine période de retard admise, la seconde absorbe jitter et dérive d'horloge).
const GRACE_FACTOR: i64 = 2;

/// Un enregistrement est en retard quand `now` dépasse last_update + 2x intervalle.
pub fn is_overdue(record: &ServiceRecord, now: PrimitiveDateTime) -> bool {
    let allowed = Duration::minutes(GRACE_FACTOR * i64::from(record.interval_minutes));
    now > record.last_update + allowed
}

/// Fusionne un rapport (déjà validé) dans le journal : le triplet existe → mise à
/// jour en place de l'intervalle, de l'horodatage et de l'adresse observée ;
/// sinon insertion d'un nouvel enregistrement. Retourne true si insertion.
///
/// Invariant : un seul enregistrement par triplet (site, host, process) après coup,
/// et rejouer le même rapport au même instant ne change plus rien.
pub fn reconcile(
    records: &mut RecordSet,
    report: &ReportIn,
    observed_address: &str,
    now: PrimitiveDateTime,
) -> bool {
    if let Some(existing) = records.iter_mut().find(|r| r.matches(report)) {
        existing.interval_minutes = report.interval_minutes;
        existing.last_update = now;
        existing.source_address = observed_address.to_string();
        false
    } else {
        records.push(ServiceRecord {
            site: report.site.clone(),
            host: report.host.clone(),
            process: report.process.clone(),
            interval_minutes: report.interval_minutes,
            last_update: now,
            source_address: observed_address.to_string(),
        });
        true
    }
}

/// Adresse courante d'un site : celle de l'enregistrement frais le plus récent.
/// None si le site n'a aucun enregistrement frais — absence valide, pas une erreur.
pub fn current_address<'a>(
    records: &'a [ServiceRecord],
    site: &str,
    now: PrimitiveDateTime,
) -> Option<&'a str> {
    records
        .iter()
        .filter(|r| r.site == site && !is_overdue(r, now))
        .max_by_key(|r| r.last_update)
        .map(|r| r.source_address.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::minute_stamp;

    fn stamp(s: &str) -> PrimitiveDateTime {
        minute_stamp::parse(s).unwrap()
    }

    fn report(site: &str, host: &str, process: &str, interval_minutes: u32) -> ReportIn {
        ReportIn {
            site: site.into(),
            host: host.into(),
            process: process.into(),
            interval_minutes,
        }
    }

    #[test]
    fn test_overdue_boundary() {
        let mut records = Vec::new();
        reconcile(
            &mut records,
            &report("home", "server", "heartbeat", 5),
            "47.33.18.178",
            stamp("2022-10-26 11:00"),
        );
        // à la limite exacte (2x5 min) le service est encore à jour
        assert!(!is_overdue(&records[0], stamp("2022-10-26 11:10")));
        assert!(is_overdue(&records[0], stamp("2022-10-26 11:11")));
    }

    #[test]
    fn test_reconcile_inserts_new_triple() {
        let mut records = Vec::new();
        let now = stamp("2022-10-26 11:00");
        let inserted = reconcile(
            &mut records,
            &report("home", "nas", "backup", 60),
            "10.0.0.4",
            now,
        );
        assert!(inserted);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity(), "home/nas/backup");
        assert_eq!(records[0].interval_minutes, 60);
        assert_eq!(records[0].last_update, now);
        assert_eq!(records[0].source_address, "10.0.0.4");
    }

    #[test]
    fn test_reconcile_updates_in_place() {
        let mut records = Vec::new();
        reconcile(
            &mut records,
            &report("home", "server", "heartbeat", 5),
            "47.33.18.178",
            stamp("2022-10-26 11:00"),
        );
        // même triplet, intervalle et adresse changés
        let inserted = reconcile(
            &mut records,
            &report("home", "server", "heartbeat", 10),
            "47.33.18.200",
            stamp("2022-10-26 11:05"),
        );
        assert!(!inserted);
        assert_eq!(records.len(), 1);
        // l'identité ne bouge jamais, seuls intervalle/horodatage/adresse suivent
        assert_eq!(records[0].identity(), "home/server/heartbeat");
        assert_eq!(records[0].interval_minutes, 10);
        assert_eq!(records[0].last_update, stamp("2022-10-26 11:05"));
        assert_eq!(records[0].source_address, "47.33.18.200");
    }

    #[test]
    fn test_reconcile_idempotent() {
        let mut records = Vec::new();
        let r = report("office", "nas", "heartbeat", 5);
        let now = stamp("2022-10-26 11:00");
        reconcile(&mut records, &r, "10.0.0.4", now);
        let snapshot = records.clone();
        reconcile(&mut records, &r, "10.0.0.4", now);
        assert_eq!(records, snapshot);
    }

    #[test]
    fn test_no_duplicate_triples() {
        let mut records = Vec::new();
        let reports = [
            report("home", "server", "heartbeat", 5),
            report("home", "server", "backup", 1440),
            report("home", "flowmeter", "heartbeat", 15),
            report("office", "nas", "heartbeat", 5),
        ];
        for minute in ["11:00", "11:05", "11:10"] {
            for r in &reports {
                reconcile(
                    &mut records,
                    r,
                    "10.0.0.9",
                    stamp(&format!("2022-10-26 {minute}")),
                );
            }
        }
        assert_eq!(records.len(), reports.len());
        for (i, a) in records.iter().enumerate() {
            for b in &records[i + 1..] {
                assert!(
                    !(a.site == b.site && a.host == b.host && a.process == b.process),
                    "triplet dupliqué: {}",
                    a.identity()
                );
            }
        }
    }

    #[test]
    fn test_current_address_none_without_fresh_records() {
        let now = stamp("2022-10-26 12:00");
        assert_eq!(current_address(&[], "home", now), None);

        let mut records = Vec::new();
        reconcile(
            &mut records,
            &report("home", "server", "heartbeat", 5),
            "47.33.18.178",
            stamp("2022-10-26 11:00"),
        );
        // une heure plus tard, plus rien de frais sur le site
        assert_eq!(current_address(&records, "home", now), None);
        // et un site inconnu reste sans adresse
        assert_eq!(current_address(&records, "office", now), None);
    }

    #[test]
    fn test_current_address_picks_freshest() {
        let mut records = Vec::new();
        reconcile(
            &mut records,
            &report("home", "server", "heartbeat", 60),
            "47.33.18.178",
            stamp("2022-10-26 10:00"),
        );
        reconcile(
            &mut records,
            &report("home", "nas", "heartbeat", 60),
            "47.33.18.179",
            stamp("2022-10-26 10:30"),
        );
        // l'adresse d'un autre site ne doit pas interférer
        reconcile(
            &mut records,
            &report("office", "desk", "heartbeat", 60),
            "92.14.7.21",
            stamp("2022-10-26 10:45"),
        );
        assert_eq!(
            current_address(&records, "home", stamp("2022-10-26 10:50")),
            Some("47.33.18.179")
        );
    }

    #[test]
    fn test_full_reporting_scenario() {
        let mut records = Vec::new();
        reconcile(
            &mut records,
            &report("home", "server", "heartbeat", 5),
            "47.33.18.178",
            stamp("2022-10-26 11:00"),
        );
        assert_eq!(records.len(), 1);
        assert!(!is_overdue(&records[0], stamp("2022-10-26 11:09")));
        assert!(is_overdue(&records[0], stamp("2022-10-26 11:11")));
        assert_eq!(
            current_address(&records, "home", stamp("2022-10-26 11:09")),
            Some("47.33.18.178")
        );
    }
}
