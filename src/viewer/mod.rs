use std::time::{Duration, Instant};

use log::{log, Level};
use rand::Rng;

use crate::schema::db::Quote;

pub mod config;
pub mod error;
pub mod fallback;
pub mod feed;
pub mod likes;

use self::{
    error::ViewerError,
    fallback::fallback_quotes,
    feed::{ExternalQuote, QuoteFeed},
    likes::LikeOverrides,
};

pub const AUTOPLAY_INTERVAL: Duration = Duration::from_millis(3500);
pub const LOCAL_PAGE: i64 = 1;
pub const LOCAL_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Local,
    External,
}

impl Source {
    pub fn toggled(self) -> Self {
        match self {
            Source::Local => Source::External,
            Source::External => Source::Local,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    ReadyWithFallback,
}

/// Identifies one issued fetch. Only the most recently issued ticket is
/// accepted by [`Viewer::finish_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    source: Source,
}

impl LoadTicket {
    pub fn source(&self) -> Source {
        self.source
    }
}

#[derive(Debug)]
pub enum Fetched {
    Local(Vec<Quote>),
    External(Vec<ExternalQuote>),
}

#[derive(Debug)]
pub struct FetchResult {
    pub ticket: LoadTicket,
    pub result: Result<Fetched, ViewerError>,
}

/// Performs the fetch described by `ticket`.
pub async fn fetch(feed: &dyn QuoteFeed, ticket: LoadTicket) -> FetchResult {
    let result = match ticket.source {
        Source::Local => feed
            .fetch_local(LOCAL_PAGE, LOCAL_LIMIT)
            .await
            .map(Fetched::Local),
        Source::External => feed.fetch_external().await.map(Fetched::External),
    };
    FetchResult { ticket, result }
}

/// What a like needs after the viewer has accepted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    /// Send the increment to the quote service, then call [`Viewer::finish_like`].
    Remote(i32),
    /// Recorded locally; carries the new count.
    Recorded(i32),
}

pub struct Viewer {
    overrides: LikeOverrides,
    source: Source,
    /// Source of the list currently in `quotes`.
    loaded_source: Option<Source>,
    /// `quotes` is the built-in set and likes are kept locally.
    showing_fallback: bool,
    quotes: Vec<Quote>,
    cursor: usize,
    autoplay: bool,
    armed_at: Option<Instant>,
    state: LoadState,
    generation: u64,
}

impl Viewer {
    pub fn new(overrides: LikeOverrides) -> Self {
        Self {
            overrides,
            source: Source::Local,
            loaded_source: None,
            showing_fallback: false,
            quotes: Vec::new(),
            cursor: 0,
            autoplay: true,
            armed_at: None,
            state: LoadState::Idle,
            generation: 0,
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    pub fn current(&self) -> Option<&Quote> {
        self.quotes.get(self.cursor)
    }

    /// Starts a fetch for the current source. Any fetch still in flight
    /// becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.state = LoadState::Loading;
        LoadTicket {
            generation: self.generation,
            source: self.source,
        }
    }

    pub fn toggle_source(&mut self, now: Instant) -> LoadTicket {
        self.source = self.source.toggled();
        self.set_cursor(0, now);
        self.begin_load()
    }

    /// Applies a fetch result. Returns `false` when the result was stale and
    /// has been dropped.
    pub fn finish_load(&mut self, fetched: FetchResult, now: Instant) -> bool {
        if fetched.ticket.generation != self.generation {
            log!(
                Level::Debug,
                "Dropping stale {:?} result (generation {}, latest {})",
                fetched.ticket.source,
                fetched.ticket.generation,
                self.generation
            );
            return false;
        }

        let quotes = match fetched.result {
            Ok(Fetched::Local(items)) if !items.is_empty() => Some(items),
            Ok(Fetched::Local(_)) => {
                log!(Level::Info, "Quote service returned no quotes, using fallback set");
                None
            }
            Ok(Fetched::External(items)) => Some(self.map_external(items)),
            Err(e) => {
                log!(Level::Warn, "Failed to load quotes: {e}");
                None
            }
        };

        match quotes {
            Some(mut quotes) => {
                // Counts served by the quote service are authoritative.
                if fetched.ticket.source == Source::External {
                    self.overrides.apply(&mut quotes);
                }
                self.quotes = quotes;
                self.showing_fallback = false;
                self.state = LoadState::Ready;
            }
            None => {
                let mut quotes = fallback_quotes();
                self.overrides.apply(&mut quotes);
                self.quotes = quotes;
                self.showing_fallback = true;
                self.state = LoadState::ReadyWithFallback;
            }
        }
        self.loaded_source = Some(fetched.ticket.source);
        self.set_cursor(0, now);
        true
    }

    fn map_external(&self, items: Vec<ExternalQuote>) -> Vec<Quote> {
        let mut rng = rand::thread_rng();
        items
            .into_iter()
            .enumerate()
            .map(|(i, q)| q.into_quote(i, rng.gen_range(1..=50)))
            .collect()
    }

    fn set_cursor(&mut self, cursor: usize, now: Instant) {
        self.cursor = cursor;
        self.rearm(now);
    }

    fn rearm(&mut self, now: Instant) {
        self.armed_at = self.autoplay.then_some(now);
    }

    pub fn next(&mut self, now: Instant) {
        if self.quotes.is_empty() {
            return;
        }
        self.set_cursor((self.cursor + 1) % self.quotes.len(), now);
    }

    pub fn previous(&mut self, now: Instant) {
        if self.quotes.is_empty() {
            return;
        }
        let len = self.quotes.len();
        self.set_cursor((self.cursor + len - 1) % len, now);
    }

    /// A click on the viewing area.
    pub fn click(&mut self, now: Instant) {
        self.next(now);
    }

    pub fn set_autoplay(&mut self, on: bool, now: Instant) {
        self.autoplay = on;
        self.rearm(now);
    }

    pub fn toggle_autoplay(&mut self, now: Instant) {
        self.set_autoplay(!self.autoplay, now);
    }

    /// When autoplay will next advance, if it is running.
    pub fn deadline(&self) -> Option<Instant> {
        if !self.autoplay || self.quotes.is_empty() {
            return None;
        }
        self.armed_at.map(|t| t + AUTOPLAY_INTERVAL)
    }

    /// Advances once if the autoplay deadline has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if deadline <= now => {
                self.next(now);
                true
            }
            _ => false,
        }
    }

    /// Checks whether quote `id` can be liked and records the like locally
    /// when the quote service is not the source of truth.
    pub fn prepare_like(&mut self, id: i32) -> Result<LikeAction, ViewerError> {
        let position = self
            .quotes
            .iter()
            .position(|q| q.id == id)
            .ok_or(ViewerError::UnknownQuote(id))?;
        if self.showing_fallback {
            let quote = &mut self.quotes[position];
            quote.likes = self.overrides.increment(id, quote.likes);
            return Ok(LikeAction::Recorded(quote.likes));
        }
        match self.loaded_source {
            Some(Source::External) => Err(ViewerError::LikesUnavailable),
            _ => Ok(LikeAction::Remote(id)),
        }
    }

    /// Adopts the count returned by the quote service.
    pub fn finish_like(
        &mut self,
        id: i32,
        result: Result<i32, ViewerError>,
    ) -> Result<i32, ViewerError> {
        let likes = result.map_err(|e| {
            log!(Level::Warn, "Failed to like quote {id}: {e}");
            e
        })?;
        self.overrides.set(id, likes);
        if self.loaded_source == Some(Source::Local) && !self.showing_fallback {
            if let Some(quote) = self.quotes.iter_mut().find(|q| q.id == id) {
                quote.likes = likes;
            }
        }
        Ok(likes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::viewer::likes::{KeyValueStore, MemoryKeyValueStore, LIKES_KEY};

    fn quote(id: i32, likes: i32) -> Quote {
        Quote {
            id,
            text: format!("text {id}"),
            author_name: "author".into(),
            book_title: "book".into(),
            likes,
            created_at: Utc::now(),
        }
    }

    fn external(n: usize) -> Vec<ExternalQuote> {
        (0..n)
            .map(|i| ExternalQuote {
                quote: format!("external {i}"),
                author: "someone".into(),
                book: "somewhere".into(),
                created_at: None,
            })
            .collect()
    }

    fn viewer() -> Viewer {
        Viewer::new(LikeOverrides::new(Box::<MemoryKeyValueStore>::default()))
    }

    fn viewer_with_overrides(map: &str) -> Viewer {
        let store = MemoryKeyValueStore::default();
        store.set(LIKES_KEY, map).unwrap();
        Viewer::new(LikeOverrides::new(Box::new(store)))
    }

    fn loaded(quotes: Vec<Quote>) -> Viewer {
        let mut v = viewer();
        let ticket = v.begin_load();
        assert!(v.finish_load(
            FetchResult {
                ticket,
                result: Ok(Fetched::Local(quotes)),
            },
            Instant::now(),
        ));
        v
    }

    #[test]
    fn starts_idle_then_loads() {
        let mut v = viewer();
        assert_eq!(v.state(), LoadState::Idle);
        let ticket = v.begin_load();
        assert_eq!(v.state(), LoadState::Loading);
        assert_eq!(ticket.source(), Source::Local);
        v.finish_load(
            FetchResult {
                ticket,
                result: Ok(Fetched::Local(vec![quote(10, 1), quote(11, 2)])),
            },
            Instant::now(),
        );
        assert_eq!(v.state(), LoadState::Ready);
        assert_eq!(v.cursor(), 0);
        assert_eq!(v.current().map(|q| q.id), Some(10));
    }

    #[test]
    fn wraps_around() {
        let now = Instant::now();
        let mut v = loaded((1..=3).map(|id| quote(id, 0)).collect());
        v.previous(now);
        assert_eq!(v.cursor(), 2);
        v.next(now);
        assert_eq!(v.cursor(), 0);
        v.click(now);
        assert_eq!(v.cursor(), 1);
    }

    #[test]
    fn empty_list_navigation_is_noop() {
        let now = Instant::now();
        let mut v = viewer();
        v.next(now);
        v.previous(now);
        v.click(now);
        assert_eq!(v.cursor(), 0);
        assert_eq!(v.current(), None);
        assert_eq!(v.deadline(), None);
        assert!(!v.tick(now + AUTOPLAY_INTERVAL));
    }

    #[test]
    fn empty_or_failed_local_uses_fallback() {
        for result in [
            Ok(Fetched::Local(Vec::new())),
            Err(ViewerError::Upstream("connection refused".into())),
        ] {
            let mut v = viewer_with_overrides(r#"{"2": 99}"#);
            let ticket = v.begin_load();
            v.finish_load(FetchResult { ticket, result }, Instant::now());
            assert_eq!(v.state(), LoadState::ReadyWithFallback);
            let likes: Vec<(i32, i32)> = v.quotes().iter().map(|q| (q.id, q.likes)).collect();
            assert_eq!(likes, vec![(1, 12), (2, 99), (3, 9), (4, 7), (5, 5)]);
        }
    }

    #[test]
    fn service_counts_win_over_overrides() {
        let mut v = viewer_with_overrides(r#"{"7": 9, "8": 40}"#);
        let ticket = v.begin_load();
        v.finish_load(
            FetchResult {
                ticket,
                result: Ok(Fetched::Local(vec![quote(7, 15), quote(8, 2)])),
            },
            Instant::now(),
        );
        let likes: Vec<i32> = v.quotes().iter().map(|q| q.likes).collect();
        assert_eq!(likes, vec![15, 2]);
    }

    #[test]
    fn toggle_resets_cursor_and_issues_one_ticket() {
        let now = Instant::now();
        let mut v = loaded((1..=4).map(|id| quote(id, 0)).collect());
        v.next(now);
        v.next(now);
        let ticket = v.toggle_source(now);
        assert_eq!(v.cursor(), 0);
        assert_eq!(v.source(), Source::External);
        assert_eq!(ticket.source(), Source::External);
        assert_eq!(v.state(), LoadState::Loading);
    }

    #[test]
    fn stale_results_are_dropped() {
        let now = Instant::now();
        let mut v = viewer();
        let local = v.begin_load();
        let external_ticket = v.toggle_source(now);

        assert!(v.finish_load(
            FetchResult {
                ticket: external_ticket,
                result: Ok(Fetched::External(external(3))),
            },
            now,
        ));
        assert!(!v.finish_load(
            FetchResult {
                ticket: local,
                result: Ok(Fetched::Local(vec![quote(1, 0)])),
            },
            now,
        ));
        assert_eq!(v.state(), LoadState::Ready);
        assert!(v.quotes().iter().all(|q| q.id >= 1000));
    }

    #[test]
    fn external_quotes_get_offset_ids_and_placeholder_likes() {
        let mut v = viewer_with_overrides(r#"{"1001": 3}"#);
        v.toggle_source(Instant::now());
        let ticket = v.begin_load();
        v.finish_load(
            FetchResult {
                ticket,
                result: Ok(Fetched::External(external(3))),
            },
            Instant::now(),
        );
        let ids: Vec<i32> = v.quotes().iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1000, 1001, 1002]);
        assert_eq!(v.quotes()[1].likes, 3);
        assert!((1..=50).contains(&v.quotes()[0].likes));
        assert!((1..=50).contains(&v.quotes()[2].likes));
    }

    #[test]
    fn external_quotes_reject_likes() {
        let mut v = viewer();
        let ticket = v.toggle_source(Instant::now());
        v.finish_load(
            FetchResult {
                ticket,
                result: Ok(Fetched::External(external(2))),
            },
            Instant::now(),
        );
        assert_eq!(v.prepare_like(1000), Err(ViewerError::LikesUnavailable));
        assert_eq!(
            ViewerError::LikesUnavailable.to_string(),
            "likes unavailable for external quotes"
        );
    }

    #[test]
    fn local_like_adopts_service_count() {
        let mut v = loaded(vec![quote(2, 3)]);
        assert_eq!(v.prepare_like(2), Ok(LikeAction::Remote(2)));
        assert_eq!(v.finish_like(2, Ok(9)), Ok(9));
        assert_eq!(v.quotes()[0].likes, 9);

        // Remembered for when the service goes away.
        let ticket = v.begin_load();
        v.finish_load(
            FetchResult {
                ticket,
                result: Err(ViewerError::Upstream("down".into())),
            },
            Instant::now(),
        );
        assert_eq!(v.state(), LoadState::ReadyWithFallback);
        assert_eq!(v.quotes()[1].likes, 9);
    }

    #[test]
    fn failed_remote_like_leaves_count() {
        let mut v = loaded(vec![quote(7, 3)]);
        let err = ViewerError::Upstream("503".into());
        assert_eq!(v.finish_like(7, Err(err.clone())), Err(err));
        assert_eq!(v.quotes()[0].likes, 3);
    }

    #[test]
    fn fallback_likes_are_local() {
        let mut v = viewer();
        let ticket = v.begin_load();
        v.finish_load(
            FetchResult {
                ticket,
                result: Err(ViewerError::Upstream("down".into())),
            },
            Instant::now(),
        );
        assert_eq!(v.prepare_like(2), Ok(LikeAction::Recorded(19)));
        assert_eq!(v.prepare_like(2), Ok(LikeAction::Recorded(20)));

        let ticket = v.begin_load();
        v.finish_load(
            FetchResult {
                ticket,
                result: Ok(Fetched::Local(Vec::new())),
            },
            Instant::now(),
        );
        assert_eq!(v.quotes()[1].likes, 20);
    }

    #[test]
    fn unknown_quote_like() {
        let mut v = loaded(vec![quote(1, 0)]);
        assert_eq!(v.prepare_like(42), Err(ViewerError::UnknownQuote(42)));
    }

    #[test]
    fn autoplay_advances_after_interval() {
        let start = Instant::now();
        let mut v = viewer();
        let ticket = v.begin_load();
        v.finish_load(
            FetchResult {
                ticket,
                result: Ok(Fetched::Local(vec![quote(1, 0), quote(2, 0)])),
            },
            start,
        );
        assert_eq!(v.deadline(), Some(start + AUTOPLAY_INTERVAL));
        assert!(!v.tick(start + Duration::from_millis(3499)));
        assert!(v.tick(start + AUTOPLAY_INTERVAL));
        assert_eq!(v.cursor(), 1);
        assert_eq!(v.deadline(), Some(start + AUTOPLAY_INTERVAL * 2));
    }

    #[test]
    fn manual_navigation_rearms_timer() {
        let start = Instant::now();
        let mut v = loaded(vec![quote(1, 0), quote(2, 0), quote(3, 0)]);
        let later = start + Duration::from_secs(2);
        v.next(later);
        assert_eq!(v.deadline(), Some(later + AUTOPLAY_INTERVAL));
    }

    #[test]
    fn autoplay_off_stops_timer_and_restart_is_full_interval() {
        let start = Instant::now();
        let mut v = loaded(vec![quote(1, 0), quote(2, 0)]);
        v.set_autoplay(false, start);
        assert_eq!(v.deadline(), None);
        assert!(!v.tick(start + AUTOPLAY_INTERVAL * 10));

        let resumed = start + Duration::from_secs(60);
        v.toggle_autoplay(resumed);
        assert!(v.autoplay());
        assert_eq!(v.deadline(), Some(resumed + AUTOPLAY_INTERVAL));
    }

    struct CountingFeed {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuoteFeed for CountingFeed {
        async fn fetch_local(&self, page: i64, limit: i64) -> Result<Vec<Quote>, ViewerError> {
            assert_eq!((page, limit), (LOCAL_PAGE, LOCAL_LIMIT));
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![quote(1, 0)])
        }

        async fn fetch_external(&self) -> Result<Vec<ExternalQuote>, ViewerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ViewerError::Upstream("unreachable".into()))
        }

        async fn like(&self, _id: i32) -> Result<i32, ViewerError> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn fetch_follows_ticket_source() {
        let feed = Arc::new(CountingFeed {
            calls: AtomicUsize::new(0),
        });
        let mut v = viewer();
        let now = Instant::now();

        let ticket = v.begin_load();
        let result = fetch(feed.as_ref(), ticket).await;
        assert!(matches!(result.result, Ok(Fetched::Local(_))));
        v.finish_load(result, now);
        assert_eq!(v.state(), LoadState::Ready);

        let ticket = v.toggle_source(now);
        let result = fetch(feed.as_ref(), ticket).await;
        v.finish_load(result, now);
        assert_eq!(v.state(), LoadState::ReadyWithFallback);
        assert_eq!(v.quotes().len(), 5);
        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);
    }
}
