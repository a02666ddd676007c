//! Driving monitoring screens: running fetches and keeping one screen per viewer.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use uuid::Uuid;

use crate::{
    Error,
    monitoring::{
        aggregate::AggregateFetcher,
        period::QueryPeriod,
        screen::{ApplyOutcome, FetchTicket, MonitoringScreen},
    },
};

/// A monitoring screen together with the fetcher that loads its data.
///
/// The screen lock is only held to issue a ticket and to apply a result,
/// never while waiting on the backend.
#[derive(Debug)]
pub struct MonitoringSession {
    screen: Mutex<MonitoringScreen>,
    fetcher: Arc<dyn AggregateFetcher>,
}

impl MonitoringSession {
    pub fn new(fetcher: Arc<dyn AggregateFetcher>, period: QueryPeriod) -> Self {
        Self {
            screen: Mutex::new(MonitoringScreen::new(period)),
            fetcher,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MonitoringScreen>, Error> {
        self.screen.lock().map_err(|error| {
            tracing::error!("could not acquire monitoring screen lock: {error}");
            Error::ScreenLockError
        })
    }

    /// Select `period`, fetch it and apply the result.
    ///
    /// When another period is selected while this fetch is outstanding, this
    /// fetch's result is discarded and [ApplyOutcome::Superseded] is returned.
    ///
    /// The fetch runs on its own task so that it is applied even if the
    /// caller stops waiting, e.g. when the viewer's request is dropped.
    pub async fn change_period(
        self: &Arc<Self>,
        period: QueryPeriod,
    ) -> Result<ApplyOutcome, Error> {
        let ticket = self.lock()?.select_period(period);
        let session = Arc::clone(self);

        tokio::spawn(async move { session.complete(ticket).await })
            .await
            .map_err(|error| {
                tracing::error!("monitoring fetch for {period} did not finish: {error}");
                Error::FetchTaskError
            })?
    }

    /// Fetch the data for `ticket` and apply it if the ticket is still current.
    pub async fn complete(&self, ticket: FetchTicket) -> Result<ApplyOutcome, Error> {
        {
            let screen = self.lock()?;
            if screen.is_closed() {
                return Ok(ApplyOutcome::Closed);
            }
            if !screen.is_current(&ticket) {
                return Ok(ApplyOutcome::Superseded);
            }
        }

        let result = self.fetcher.fetch(ticket.period()).await;

        Ok(self.lock()?.apply(ticket, result))
    }

    /// Run `f` with the screen locked.
    pub fn with_screen<T>(&self, f: impl FnOnce(&mut MonitoringScreen) -> T) -> Result<T, Error> {
        let mut screen = self.lock()?;

        Ok(f(&mut screen))
    }

    /// Close the screen, discarding any fetch still in flight.
    pub fn close(&self) {
        match self.screen.lock() {
            Ok(mut screen) => screen.close(),
            // A poisoned screen is unusable anyway, closing it still has to stick.
            Err(poisoned) => poisoned.into_inner().close(),
        }
    }
}

/// Identifies a viewer's screen, stored in the viewer's cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenId(Uuid);

impl ScreenId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug)]
struct Entry {
    session: Arc<MonitoringSession>,
    last_seen: Instant,
}

/// The open monitoring screens, one per viewer.
#[derive(Debug)]
pub struct ScreenRegistry {
    fetcher: Arc<dyn AggregateFetcher>,
    idle_timeout: Duration,
    entries: Mutex<HashMap<ScreenId, Entry>>,
}

impl ScreenRegistry {
    /// Create an empty registry whose screens load data with `fetcher` and
    /// are closed after `idle_timeout` without use.
    pub fn new(fetcher: Arc<dyn AggregateFetcher>, idle_timeout: Duration) -> Self {
        Self {
            fetcher,
            idle_timeout,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ScreenId, Entry>>, Error> {
        self.entries.lock().map_err(|error| {
            tracing::error!("could not acquire screen registry lock: {error}");
            Error::ScreenLockError
        })
    }

    /// Get the viewer's open screen, or open a new one showing `period`.
    ///
    /// The returned flag is `true` when the screen was newly opened and has
    /// not fetched anything yet.
    pub fn open(
        &self,
        id: Option<ScreenId>,
        period: QueryPeriod,
    ) -> Result<(ScreenId, Arc<MonitoringSession>, bool), Error> {
        self.purge_idle()?;
        let mut entries = self.lock()?;
        let now = Instant::now();

        if let Some(known) = id {
            if let Some(entry) = entries.get_mut(&known) {
                entry.last_seen = now;
                return Ok((known, entry.session.clone(), false));
            }
        }

        let id = ScreenId::new_random();
        let session = Arc::new(MonitoringSession::new(self.fetcher.clone(), period));
        tracing::debug!("opening monitoring screen {id}");
        entries.insert(
            id,
            Entry {
                session: session.clone(),
                last_seen: now,
            },
        );

        Ok((id, session, true))
    }

    /// Get the viewer's open screen without opening a new one.
    pub fn get(&self, id: ScreenId) -> Result<Option<Arc<MonitoringSession>>, Error> {
        let mut entries = self.lock()?;

        Ok(entries.get_mut(&id).map(|entry| {
            entry.last_seen = Instant::now();
            entry.session.clone()
        }))
    }

    /// Close and forget the viewer's screen, e.g. when they leave the monitoring page.
    pub fn close(&self, id: ScreenId) -> Result<(), Error> {
        if let Some(entry) = self.lock()?.remove(&id) {
            tracing::debug!("closing monitoring screen {id}");
            entry.session.close();
        }

        Ok(())
    }

    /// Close every screen that has not been used within the idle timeout.
    pub fn purge_idle(&self) -> Result<usize, Error> {
        let mut entries = self.lock()?;
        let before = entries.len();

        entries.retain(|id, entry| {
            let keep = entry.last_seen.elapsed() < self.idle_timeout;
            if !keep {
                tracing::debug!("closing idle monitoring screen {id}");
                entry.session.close();
            }
            keep
        });

        Ok(before - entries.len())
    }

    /// The number of open screens.
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |entries| entries.len())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use crate::{
        backend::FetchError,
        monitoring::{
            aggregate::{AggregateFetcher, PartnerPeriodAggregate},
            period::{MonthSelection, QueryPeriod},
            screen::{ApplyOutcome, LoadState, TableContent},
        },
    };

    use super::{MonitoringSession, ScreenId, ScreenRegistry};

    type Response = Result<Vec<PartnerPeriodAggregate>, FetchError>;

    /// A fetcher whose responses are released by the test, one channel per call.
    #[derive(Debug, Default)]
    struct ScriptedFetcher {
        pending: Mutex<VecDeque<oneshot::Receiver<Response>>>,
    }

    impl ScriptedFetcher {
        fn expect_call(&self) -> oneshot::Sender<Response> {
            let (sender, receiver) = oneshot::channel();
            self.pending.lock().unwrap().push_back(receiver);
            sender
        }
    }

    #[async_trait]
    impl AggregateFetcher for ScriptedFetcher {
        async fn fetch(&self, _period: QueryPeriod) -> Response {
            let receiver = self
                .pending
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected fetch");

            receiver.await.unwrap_or(Err(FetchError::Transport("dropped".to_owned())))
        }
    }

    fn year(year: i32) -> QueryPeriod {
        QueryPeriod::new(year, MonthSelection::All)
    }

    fn partner(name: &str) -> Vec<PartnerPeriodAggregate> {
        vec![PartnerPeriodAggregate::new("1", name).with_income(1.0)]
    }

    #[tokio::test]
    async fn later_period_wins_when_earlier_response_arrives_last() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let first_response = fetcher.expect_call();
        let second_response = fetcher.expect_call();
        let session = Arc::new(MonitoringSession::new(fetcher, year(2025)));

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.change_period(year(2024)).await }
        });
        // Wait until the first fetch has been issued before selecting the second period.
        while session
            .with_screen(|screen| screen.period() != year(2024))
            .unwrap()
        {
            tokio::task::yield_now().await;
        }

        let second = tokio::spawn({
            let session = session.clone();
            async move { session.change_period(year(2023)).await }
        });
        while session
            .with_screen(|screen| screen.period() != year(2023))
            .unwrap()
        {
            tokio::task::yield_now().await;
        }

        second_response.send(Ok(partner("Tahun 2023"))).unwrap();
        assert_eq!(second.await.unwrap(), Ok(ApplyOutcome::Applied));

        first_response.send(Ok(partner("Tahun 2024"))).unwrap();
        assert_eq!(first.await.unwrap(), Ok(ApplyOutcome::Superseded));

        let shown = session
            .with_screen(|screen| screen.batch().map(|batch| batch.records.clone()))
            .unwrap();
        assert_eq!(shown, Some(partner("Tahun 2023")));
    }

    #[tokio::test]
    async fn closing_while_fetch_pending_discards_result() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let response = fetcher.expect_call();
        let session = Arc::new(MonitoringSession::new(fetcher, year(2025)));

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.change_period(year(2025)).await }
        });
        while session
            .with_screen(|screen| matches!(screen.state(), LoadState::Idle))
            .unwrap()
        {
            tokio::task::yield_now().await;
        }

        session.close();
        response.send(Ok(partner("Siti"))).unwrap();

        assert_eq!(pending.await.unwrap(), Ok(ApplyOutcome::Closed));
        assert!(session.with_screen(|screen| screen.batch().is_none()).unwrap());
    }

    #[tokio::test]
    async fn fetch_is_applied_after_caller_stops_waiting() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        fetcher
            .expect_call()
            .send(Ok(partner("Tahun 2025")))
            .unwrap();
        let slow_response = fetcher.expect_call();
        let session = Arc::new(MonitoringSession::new(fetcher, year(2025)));
        assert_eq!(
            session.change_period(year(2025)).await,
            Ok(ApplyOutcome::Applied)
        );

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), session.change_period(year(2024)))
                .await;
        assert!(abandoned.is_err());
        assert!(
            session
                .with_screen(|screen| matches!(screen.state(), LoadState::Loading(_)))
                .unwrap()
        );

        slow_response.send(Ok(partner("Tahun 2024"))).unwrap();
        while session
            .with_screen(|screen| matches!(screen.state(), LoadState::Loading(_)))
            .unwrap()
        {
            tokio::task::yield_now().await;
        }

        let view = session.with_screen(|screen| screen.project(10)).unwrap();
        assert_eq!(view.batch_period, Some(year(2024)));
        assert_eq!(view.content, TableContent::Rows);
        assert_eq!(view.rows[0].aggregate.full_name, "Tahun 2024");
    }

    #[tokio::test]
    async fn completing_stale_ticket_skips_fetch() {
        // No call is scripted, so a fetch would panic.
        let fetcher = Arc::new(ScriptedFetcher::default());
        let session = MonitoringSession::new(fetcher, year(2025));

        let stale = session.with_screen(|screen| screen.select_period(year(2024))).unwrap();
        session.with_screen(|screen| screen.select_period(year(2023))).unwrap();

        assert_eq!(session.complete(stale).await, Ok(ApplyOutcome::Superseded));
    }

    #[tokio::test]
    async fn failed_fetch_is_reported() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        fetcher
            .expect_call()
            .send(Err(FetchError::SessionExpired))
            .unwrap();
        let session = Arc::new(MonitoringSession::new(fetcher, year(2025)));

        assert_eq!(
            session.change_period(year(2025)).await,
            Ok(ApplyOutcome::Failed)
        );
    }

    #[test]
    fn registry_reuses_screen_for_known_id() {
        let registry = ScreenRegistry::new(
            Arc::new(ScriptedFetcher::default()),
            Duration::from_secs(60),
        );

        let (id, first, is_new) = registry.open(None, year(2025)).unwrap();
        let (same_id, second, is_second_new) = registry.open(Some(id), year(2025)).unwrap();

        assert!(is_new);
        assert!(!is_second_new);
        assert_eq!(id, same_id);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_opens_new_screen_for_unknown_id() {
        let registry = ScreenRegistry::new(
            Arc::new(ScriptedFetcher::default()),
            Duration::from_secs(60),
        );
        let unknown = ScreenId::new_random();

        let (id, _, is_new) = registry.open(Some(unknown), year(2025)).unwrap();

        assert!(is_new);
        assert_ne!(id, unknown);
    }

    #[test]
    fn closing_removes_and_closes_screen() {
        let registry = ScreenRegistry::new(
            Arc::new(ScriptedFetcher::default()),
            Duration::from_secs(60),
        );
        let (id, session, _) = registry.open(None, year(2025)).unwrap();

        registry.close(id).unwrap();

        assert!(registry.get(id).unwrap().is_none());
        assert!(session.with_screen(|screen| screen.is_closed()).unwrap());
    }

    #[test]
    fn idle_screens_are_closed() {
        let registry = ScreenRegistry::new(Arc::new(ScriptedFetcher::default()), Duration::ZERO);
        let (_, session, _) = registry.open(None, year(2025)).unwrap();

        assert_eq!(registry.purge_idle(), Ok(1));
        assert_eq!(registry.len(), 0);
        assert!(session.with_screen(|screen| screen.is_closed()).unwrap());
    }

    #[test]
    fn screen_id_parses_its_own_display() {
        let id = ScreenId::new_random();

        assert_eq!(ScreenId::parse(&id.to_string()), Some(id));
        assert_eq!(ScreenId::parse("bukan-uuid"), None);
    }
}
