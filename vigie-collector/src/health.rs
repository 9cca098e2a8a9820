use crate::models::ServiceRecord;
use crate::reconcile;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use time::PrimitiveDateTime;

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectorHealth {
    pub uptime_seconds: u64,
    pub records_tracked: u32,
    pub sites_tracked: u32,
    pub overdue_count: u32,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    pub fn get_health(&self, records: &[ServiceRecord], now: PrimitiveDateTime) -> CollectorHealth {
        let sites: HashSet<&str> = records.iter().map(|r| r.site.as_str()).collect();
        CollectorHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            records_tracked: records.len() as u32,
            sites_tracked: sites.len() as u32,
            overdue_count: records
                .iter()
                .filter(|r| reconcile::is_overdue(r, now))
                .count() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::minute_stamp;

    #[test]
    fn test_health_counts() {
        let records = vec![
            ServiceRecord {
                site: "home".into(),
                host: "server".into(),
                process: "heartbeat".into(),
                interval_minutes: 5,
                last_update: minute_stamp::parse("2022-10-26 11:00").unwrap(),
                source_address: "47.33.18.178".into(),
            },
            ServiceRecord {
                site: "home".into(),
                host: "nas".into(),
                process: "backup".into(),
                interval_minutes: 1440,
                last_update: minute_stamp::parse("2022-10-26 08:00").unwrap(),
                source_address: "47.33.18.178".into(),
            },
        ];
        let now = minute_stamp::parse("2022-10-26 12:00").unwrap();
        let health = HealthTracker::new().get_health(&records, now);
        assert_eq!(health.records_tracked, 2);
        assert_eq!(health.sites_tracked, 1);
        // le heartbeat 5 min est en retard à 12:00, le backup quotidien non
        assert_eq!(health.overdue_count, 1);
    }
}
