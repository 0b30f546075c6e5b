//! Daily domain/hosting expiration scan.
//!
//! Once a day, at local midnight, every client is checked and a notice is sent
//! for each service whose end date is within [`LEAD_TIME_DAYS`]. Nothing is
//! recorded about past notices, so a client keeps being notified on every tick
//! until the date is renewed.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use log::{debug, error, info};

use crate::models::Client;
use crate::notifier::{Notifier, ServiceKind};
use crate::store::{ClientStore, StoreResult};

pub const LEAD_TIME_DAYS: i64 = 10;

/// Services of `client` that are at or inside the lead window at `now`.
pub fn due_services(client: &Client, now: DateTime<Utc>) -> Vec<ServiceKind> {
    let lead = Duration::days(LEAD_TIME_DAYS);
    let mut due = Vec::new();
    if now >= client.domain.end_date - lead {
        due.push(ServiceKind::Domain);
    }
    if now >= client.hosting.end_date - lead {
        due.push(ServiceKind::Hosting);
    }
    due
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub clients: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Runs one scan. Only a failure to load clients is returned; notification
/// failures are logged and counted.
pub async fn run_scan(
    store: &dyn ClientStore,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> StoreResult<ScanSummary> {
    let clients = store.list_clients().await?;
    let mut summary = ScanSummary {
        clients: clients.len(),
        ..ScanSummary::default()
    };

    for client in &clients {
        for service in due_services(client, now) {
            match notifier.notify_expiry(client, service).await {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    summary.failed += 1;
                    error!("Error sending {} expiration email for client {}: {}", service, client.id, e);
                }
            }
        }
    }
    Ok(summary)
}

/// Time left until the next midnight in `now`'s timezone.
pub fn until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let next = now
        .date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest());
    match next {
        Some(next) => next.signed_duration_since(now.clone()),
        None => Duration::days(1),
    }
}

/// Spawns the daily scan on the current runtime.
pub fn spawn_daily(store: Arc<dyn ClientStore>, notifier: Arc<dyn Notifier>) {
    actix_web::rt::spawn(async move {
        loop {
            let wait = until_next_midnight(&Local::now())
                .to_std()
                .unwrap_or(StdDuration::from_secs(60));
            debug!("Next expiration scan in {}s", wait.as_secs());
            tokio::time::sleep(wait).await;

            match run_scan(store.as_ref(), notifier.as_ref(), Utc::now()).await {
                Ok(summary) => info!(
                    "Expiration scan: {} clients, {} notices sent, {} failed",
                    summary.clients, summary.sent, summary.failed
                ),
                Err(e) => error!("Error checking expirations: {}", e),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client::tests::sample_client;
    use crate::notifier::NotifyError;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, ServiceKind)>>,
        fail_hosting: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify_expiry(&self, client: &Client, service: ServiceKind) -> Result<(), NotifyError> {
            if self.fail_hosting && service == ServiceKind::Hosting {
                return Err(NotifyError::Build("smtp down".into()));
            }
            self.sent.lock().unwrap().push((client.id.clone(), service));
            Ok(())
        }
    }

    fn client_ending(now: DateTime<Utc>, domain_days: i64, hosting_days: i64) -> Client {
        let mut client = sample_client(&[]);
        client.domain.end_date = now + Duration::days(domain_days);
        client.hosting.end_date = now + Duration::days(hosting_days);
        client
    }

    #[test]
    fn nine_days_out_is_due_eleven_is_not() {
        let now = Utc::now();
        assert_eq!(due_services(&client_ending(now, 9, 11), now), vec![ServiceKind::Domain]);
        assert_eq!(due_services(&client_ending(now, 11, 9), now), vec![ServiceKind::Hosting]);
        assert!(due_services(&client_ending(now, 11, 11), now).is_empty());
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let now = Utc::now();
        let due = due_services(&client_ending(now, LEAD_TIME_DAYS, LEAD_TIME_DAYS), now);
        assert_eq!(due, vec![ServiceKind::Domain, ServiceKind::Hosting]);
    }

    #[test]
    fn already_expired_services_stay_due() {
        let now = Utc::now();
        assert_eq!(due_services(&client_ending(now, -30, -1), now).len(), 2);
    }

    #[actix_web::test]
    async fn scan_notifies_each_due_service_once() {
        let now = Utc::now();
        let store = MemoryStore::default();
        let soon = client_ending(now, 9, 9);
        let later = client_ending(now, 40, 40);
        store.insert_client(&soon).await.unwrap();
        store.insert_client(&later).await.unwrap();

        let notifier = RecordingNotifier::default();
        let summary = run_scan(&store, &notifier, now).await.unwrap();

        assert_eq!(summary, ScanSummary { clients: 2, sent: 2, failed: 0 });
        let sent = notifier.sent.lock().unwrap();
        assert!(sent.iter().all(|(id, _)| id == &soon.id));
    }

    #[actix_web::test]
    async fn notification_failures_are_counted_not_raised() {
        let now = Utc::now();
        let store = MemoryStore::default();
        store.insert_client(&client_ending(now, 1, 1)).await.unwrap();

        let notifier = RecordingNotifier {
            fail_hosting: true,
            ..RecordingNotifier::default()
        };
        let summary = run_scan(&store, &notifier, now).await.unwrap();
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.failed, 1);
    }

    #[actix_web::test]
    async fn repeated_scans_notify_again() {
        let now = Utc::now();
        let store = MemoryStore::default();
        store.insert_client(&client_ending(now, 5, 30)).await.unwrap();
        let notifier = RecordingNotifier::default();

        run_scan(&store, &notifier, now).await.unwrap();
        run_scan(&store, &notifier, now + Duration::days(1)).await.unwrap();
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn next_midnight_from_mid_afternoon() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap()
            .and_utc();
        assert_eq!(until_next_midnight(&now), Duration::minutes(8 * 60 + 30));
    }

    #[test]
    fn exactly_midnight_waits_a_full_day() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(until_next_midnight(&now), Duration::days(1));
    }
}
