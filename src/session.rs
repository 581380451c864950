//! Per-view session state for the live patient queues: the held list and
//! its id set, the background poller, search debouncing, and ordering of
//! overlapping search responses.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::api::ClinicApi;
use crate::config;
use crate::models::Patient;

/// Outcome of applying a fetched list to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueUpdate {
    Unchanged,
    Changed { added: usize, removed: usize },
}

/// The patient list one dashboard view is showing.
///
/// A fetch is committed only when the set of patient ids differs from the
/// held one; otherwise the held `Arc` is kept so consumers comparing by
/// pointer see no change.
#[derive(Debug, Default)]
pub struct PatientQueueSession {
    patients: Arc<Vec<Patient>>,
    seen: HashSet<String>,
}

impl PatientQueueSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patients(&self) -> Arc<Vec<Patient>> {
        Arc::clone(&self.patients)
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn contains(&self, patient_id: &str) -> bool {
        self.seen.contains(patient_id)
    }

    pub fn apply(&mut self, fetched: Vec<Patient>) -> QueueUpdate {
        let ids: HashSet<String> = fetched.iter().map(|p| p.id.clone()).collect();
        if ids == self.seen {
            return QueueUpdate::Unchanged;
        }
        let added = ids.difference(&self.seen).count();
        let removed = self.seen.difference(&ids).count();
        self.patients = Arc::new(fetched);
        self.seen = ids;
        QueueUpdate::Changed { added, removed }
    }

    /// Drops everything, e.g. when the view closes or the doctor logs out.
    pub fn clear(&mut self) {
        self.patients = Arc::new(Vec::new());
        self.seen.clear();
    }
}

/// Sleep slice so shutdown is noticed well within one interval.
const SLEEP_GRANULARITY: Duration = Duration::from_millis(50);

/// Handle for a background thread that calls a fetch closure right away
/// and then every `interval`. Shuts down on `shutdown()` or on `Drop`.
pub struct Poller {
    shutdown: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn spawn<F>(interval: Duration, mut fetch: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicU64::new(0));
        let flag = Arc::clone(&shutdown);
        let counter = Arc::clone(&ticks);

        let handle = std::thread::spawn(move || {
            tracing::debug!(interval_ms = interval.as_millis() as u64, "Poller started");
            while !flag.load(Ordering::Relaxed) {
                fetch();
                counter.fetch_add(1, Ordering::Relaxed);

                let wake = Instant::now() + interval;
                while Instant::now() < wake {
                    if flag.load(Ordering::Relaxed) {
                        break;
                    }
                    let left = wake.saturating_duration_since(Instant::now());
                    std::thread::sleep(left.min(SLEEP_GRANULARITY));
                }
            }
            tracing::debug!("Poller stopped");
        });

        Self {
            shutdown,
            ticks,
            handle: Some(handle),
        }
    }

    /// Completed fetches so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Request shutdown. A fetch already in flight completes.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Polls today's queue for one doctor into a shared session. Fetch errors
/// are logged and the held list stays as it was.
pub fn spawn_queue_poller<A>(
    api: Arc<A>,
    doctor_id: String,
    session: Arc<Mutex<PatientQueueSession>>,
    interval: Duration,
) -> Poller
where
    A: ClinicApi + Send + Sync + 'static,
{
    Poller::spawn(interval, move || match api.today_patients(&doctor_id) {
        Ok(patients) => {
            let count = patients.len();
            let update = match session.lock() {
                Ok(mut s) => s.apply(patients),
                Err(poisoned) => poisoned.into_inner().apply(patients),
            };
            match update {
                QueueUpdate::Unchanged => tracing::debug!(count, "Queue poll: no change"),
                QueueUpdate::Changed { added, removed } => {
                    tracing::info!(count, added, removed, "Queue updated")
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "Queue poll failed"),
    })
}

/// Coalesces rapid input: a value becomes ready once `delay` has passed
/// since the last push.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(config::SEARCH_DEBOUNCE)
    }
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn ready(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.delay => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Tag for one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Orders overlapping requests: once a response is accepted, any response
/// to an older request is discarded.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: u64,
    accepted: u64,
}

impl RequestSequencer {
    pub fn next(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    pub fn accept(&mut self, ticket: Ticket) -> bool {
        if ticket.0 > self.accepted {
            self.accepted = ticket.0;
            true
        } else {
            tracing::debug!(ticket = ticket.0, latest = self.accepted, "Stale response discarded");
            false
        }
    }

    /// Whether `ticket` is the most recently issued one.
    pub fn is_latest(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::api::{ApiError, MedicinePage, MedicineQuery, PaymentUpdate, PrescriptionSubmission};
    use crate::models::DoctorStats;
    use crate::upload::ProfilePhoto;

    fn patient(id: &str) -> Patient {
        Patient::new(id, format!("Patient {id}"))
    }

    #[test]
    fn same_ids_keep_list_identity() {
        let mut session = PatientQueueSession::new();
        assert_eq!(
            session.apply(vec![patient("a"), patient("b")]),
            QueueUpdate::Changed { added: 2, removed: 0 }
        );
        let held = session.patients();

        // Same ids in a different order, with a changed field.
        let mut reordered = vec![patient("b"), patient("a")];
        reordered[0].disease = Some("Fever".into());
        assert_eq!(session.apply(reordered), QueueUpdate::Unchanged);
        assert!(Arc::ptr_eq(&held, &session.patients()));
    }

    #[test]
    fn id_change_replaces_list() {
        let mut session = PatientQueueSession::new();
        session.apply(vec![patient("a"), patient("b")]);
        let held = session.patients();
        assert_eq!(
            session.apply(vec![patient("b"), patient("c")]),
            QueueUpdate::Changed { added: 1, removed: 1 }
        );
        assert!(!Arc::ptr_eq(&held, &session.patients()));
        assert!(session.contains("c"));
        assert!(!session.contains("a"));
    }

    #[test]
    fn empty_fetch_on_empty_session_is_unchanged() {
        let mut session = PatientQueueSession::new();
        assert_eq!(session.apply(Vec::new()), QueueUpdate::Unchanged);
        session.apply(vec![patient("a")]);
        session.clear();
        assert!(session.is_empty());
        assert_eq!(session.len(), 0);
    }

    #[test]
    fn poller_fetches_immediately_and_stops_on_drop() {
        let calls = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&calls);
        let poller = Poller::spawn(Duration::from_millis(20), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        std::thread::sleep(Duration::from_millis(110));
        assert!(poller.ticks() >= 2);
        drop(poller);

        let after = calls.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(calls.load(Ordering::SeqCst), after);
    }

    #[test]
    fn poller_shutdown_is_prompt_with_long_interval() {
        let poller = Poller::spawn(Duration::from_secs(30), || {});
        let started = Instant::now();
        drop(poller);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    /// `ClinicApi` shared with the poller thread; serves queued today lists
    /// and fails every other call.
    #[derive(Default)]
    struct SharedApi {
        today: Mutex<VecDeque<Result<Vec<Patient>, ApiError>>>,
    }

    impl SharedApi {
        fn serving(batches: Vec<Result<Vec<Patient>, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                today: Mutex::new(batches.into()),
            })
        }

        fn unused<T>() -> Result<T, ApiError> {
            Err(ApiError::HttpClient("not served".into()))
        }
    }

    impl ClinicApi for SharedApi {
        fn today_patients(&self, _doctor_id: &str) -> Result<Vec<Patient>, ApiError> {
            self.today
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ApiError::Timeout(10)))
        }
        fn emergency_patients(&self, _: &str) -> Result<Vec<Patient>, ApiError> {
            Self::unused()
        }
        fn patient_history(&self, _: &str) -> Result<Vec<Patient>, ApiError> {
            Self::unused()
        }
        fn list_patients(&self) -> Result<Vec<Patient>, ApiError> {
            Self::unused()
        }
        fn doctor_stats(&self, _: &str) -> Result<DoctorStats, ApiError> {
            Self::unused()
        }
        fn set_availability(&self, _: &str, _: bool) -> Result<(), ApiError> {
            Self::unused()
        }
        fn set_patient_limit(&self, _: &str, _: u32) -> Result<(), ApiError> {
            Self::unused()
        }
        fn update_payment(&self, _: &str, _: &PaymentUpdate) -> Result<(), ApiError> {
            Self::unused()
        }
        fn save_prescription(&self, _: &str, _: &PrescriptionSubmission) -> Result<(), ApiError> {
            Self::unused()
        }
        fn search_medicines(&self, _: &MedicineQuery) -> Result<MedicinePage, ApiError> {
            Self::unused()
        }
        fn medicine_suggestions(&self, _: &str) -> Result<Vec<String>, ApiError> {
            Self::unused()
        }
        fn export_inventory(&self) -> Result<Vec<u8>, ApiError> {
            Self::unused()
        }
        fn upload_profile_image(&self, _: &str, _: &ProfilePhoto) -> Result<String, ApiError> {
            Self::unused()
        }
        fn remove_profile_image(&self, _: &str) -> Result<(), ApiError> {
            Self::unused()
        }
    }

    fn seeded_session(ids: &[&str]) -> Arc<Mutex<PatientQueueSession>> {
        let mut session = PatientQueueSession::new();
        session.apply(ids.iter().map(|id| patient(id)).collect());
        Arc::new(Mutex::new(session))
    }

    /// Runs a queue poller until it has completed `ticks` fetches.
    fn poll_queue(api: Arc<SharedApi>, session: &Arc<Mutex<PatientQueueSession>>, ticks: u64) {
        let poller = spawn_queue_poller(
            api,
            "doc-1".into(),
            Arc::clone(session),
            Duration::from_millis(10),
        );
        let deadline = Instant::now() + Duration::from_secs(2);
        while poller.ticks() < ticks && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(poller.ticks() >= ticks, "poller stalled at {} ticks", poller.ticks());
    }

    fn held(session: &Mutex<PatientQueueSession>) -> Arc<Vec<Patient>> {
        session.lock().unwrap_or_else(|e| e.into_inner()).patients()
    }

    #[test]
    fn queue_poller_keeps_identity_for_same_ids() {
        let session = seeded_session(&["a", "b"]);
        let before = held(&session);
        let api = SharedApi::serving(vec![Ok(vec![patient("b"), patient("a")])]);

        poll_queue(Arc::clone(&api), &session, 2);

        assert!(api.today.lock().unwrap().is_empty());
        assert!(Arc::ptr_eq(&before, &held(&session)));
    }

    #[test]
    fn queue_poller_error_keeps_held_list() {
        let session = seeded_session(&["a", "b"]);
        let before = held(&session);
        let api = SharedApi::serving(vec![Err(ApiError::Connection("http://localhost:5000".into()))]);

        poll_queue(api, &session, 2);

        let after = held(&session);
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn queue_poller_commits_new_ids() {
        let session = seeded_session(&["a"]);
        let api = SharedApi::serving(vec![Ok(vec![patient("a"), patient("c")])]);

        poll_queue(api, &session, 2);

        let guard = session.lock().unwrap();
        assert_eq!(guard.len(), 2);
        assert!(guard.contains("c"));
    }

    #[test]
    fn queue_poller_updates_through_poisoned_lock() {
        let session = seeded_session(&["a"]);
        let holder = Arc::clone(&session);
        let _ = std::thread::spawn(move || {
            let _guard = holder.lock().unwrap();
            panic!("view thread crashed while holding the queue");
        })
        .join();
        assert!(session.is_poisoned());

        let api = SharedApi::serving(vec![Ok(vec![patient("x"), patient("y")])]);
        poll_queue(api, &session, 2);

        let guard = session.lock().unwrap_or_else(|e| e.into_inner());
        assert_eq!(guard.len(), 2);
        assert!(guard.contains("x") && !guard.contains("a"));
    }

    #[test]
    fn debouncer_waits_for_quiet_period() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(400));
        debouncer.push("p", t0);
        debouncer.push("pa", t0 + Duration::from_millis(100));
        debouncer.push("para", t0 + Duration::from_millis(200));

        assert_eq!(debouncer.ready(t0 + Duration::from_millis(500)), None);
        assert_eq!(debouncer.ready(t0 + Duration::from_millis(600)), Some("para"));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.ready(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn debouncer_cancel_and_default_delay() {
        let t0 = Instant::now();
        let mut debouncer: Debouncer<String> = Debouncer::default();
        debouncer.push("x".into(), t0);
        assert_eq!(debouncer.ready(t0 + Duration::from_millis(399)), None);
        debouncer.cancel();
        assert_eq!(debouncer.ready(t0 + Duration::from_secs(1)), None);
    }

    #[test]
    fn sequencer_discards_stale_responses() {
        let mut seq = RequestSequencer::default();
        let first = seq.next();
        let second = seq.next();
        assert!(seq.is_latest(second));
        assert!(!seq.is_latest(first));

        // Second response arrives first; the late first one is dropped.
        assert!(seq.accept(second));
        assert!(!seq.accept(first));
        assert!(!seq.accept(second));

        let third = seq.next();
        assert!(seq.accept(third));
    }
}
