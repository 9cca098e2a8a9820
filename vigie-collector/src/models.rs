use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// Horodatage "YYYY-MM-DD HH:MM" (résolution minute), le format du fichier de statut.
pub mod minute_stamp {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::BorrowedFormatItem;
    use time::macros::format_description;
    use time::{Date, PrimitiveDateTime, Time};

    const FORMAT: &[BorrowedFormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]");
    const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
        format_description!("[year]-[month]-[day]");

    pub fn format(dt: &PrimitiveDateTime) -> String {
        dt.format(FORMAT).unwrap_or_default()
    }

    pub fn parse(s: &str) -> Result<PrimitiveDateTime, String> {
        let (date_part, time_part) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| format!("horodatage invalide: {s:?}"))?;
        let date = Date::parse(date_part, DATE_FORMAT)
            .map_err(|e| format!("date invalide {date_part:?}: {e}"))?;
        let (hh, mm) = time_part
            .split_once(':')
            .ok_or_else(|| format!("heure invalide: {time_part:?}"))?;
        let hour: u8 = hh
            .parse()
            .map_err(|_| format!("heure invalide: {time_part:?}"))?;
        let minute: u8 = mm
            .parse()
            .map_err(|_| format!("heure invalide: {time_part:?}"))?;
        let time = Time::from_hms(hour, minute, 0)
            .map_err(|e| format!("heure invalide {time_part:?}: {e}"))?;
        Ok(PrimitiveDateTime::new(date, time))
    }

    pub fn serialize<S>(dt: &PrimitiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = dt.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<PrimitiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Heure locale du collecteur (UTC + décalage fixe de déploiement), tronquée à la minute.
/// L'horodatage est toujours assigné côté collecteur, jamais repris du rapport.
pub fn local_minute_now(utc_offset_hours: i8) -> PrimitiveDateTime {
    let offset = UtcOffset::from_hms(utc_offset_hours, 0, 0).unwrap_or(UtcOffset::UTC);
    let now = OffsetDateTime::now_utc().to_offset(offset);
    let time = Time::from_hms(now.hour(), now.minute(), 0).unwrap_or(Time::MIDNIGHT);
    PrimitiveDateTime::new(now.date(), time)
}

/// Dernier état connu d'un service, identifié par le triplet (site, host, process).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub site: String,
    pub host: String,
    pub process: String,
    pub interval_minutes: u32,
    #[serde(with = "minute_stamp")]
    pub last_update: PrimitiveDateTime,
    pub source_address: String,
}

impl ServiceRecord {
    pub fn identity(&self) -> String {
        format!("{}/{}/{}", self.site, self.host, self.process)
    }

    pub fn matches(&self, report: &ReportIn) -> bool {
        self.site == report.site && self.host == report.host && self.process == report.process
    }
}

pub type RecordSet = Vec<ServiceRecord>;

/// Rapport entrant d'un service. L'adresse source vient de la couche transport,
/// jamais du corps du message.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportIn {
    pub site: String,
    pub host: String,
    pub process: String,
    // minutes entre deux rapports, déclaré par le service ("interval" chez les
    // anciens rapporteurs)
    #[serde(alias = "interval")]
    pub interval_minutes: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("interval must be at least 1 minute")]
    BadInterval,
}

impl ReportIn {
    /// Validation avant toute réconciliation : un rapport rejeté ne touche pas au store.
    pub fn validate(&self) -> Result<(), ReportError> {
        for (name, value) in [
            ("site", &self.site),
            ("host", &self.host),
            ("process", &self.process),
        ] {
            if value.trim().is_empty() {
                return Err(ReportError::MissingField(name));
            }
        }
        if self.interval_minutes == 0 {
            return Err(ReportError::BadInterval);
        }
        Ok(())
    }
}
