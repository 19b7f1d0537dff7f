use crate::crawlers::frontier::{Availability, Claim, Frontier};
use crate::crawlers::renderer::{Renderer, RendererLauncher};
use crate::crawlers::{Crawler, Visit};
use crate::results::{CrawlOutcome, ErrorRecord, PageRecord};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Crawl state shared by all workers. Every mutation goes through one lock.
struct Shared {
    state: Mutex<State>,
    notify: Notify,
}

struct State {
    frontier: Frontier,
    pages: Vec<PageRecord>,
    errors: Vec<ErrorRecord>,
    aborted: Option<String>,
    cancelled: bool,
}

/// A claimed URL. Dropping it unsettled counts as a failure and aborts the crawl.
struct InFlight {
    shared: Arc<Shared>,
    url: String,
    settled: bool,
}

enum Ticket {
    Fetch(InFlight),
    Wait,
    Done,
}

impl Shared {
    fn new(frontier: Frontier) -> Self {
        Self {
            state: Mutex::new(State {
                frontier,
                pages: Vec::new(),
                errors: Vec::new(),
                aborted: None,
                cancelled: false,
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn claim(self: &Arc<Self>) -> Ticket {
        let claim = self.lock().frontier.claim();
        match claim {
            Claim::Fetch(url) => Ticket::Fetch(InFlight {
                shared: Arc::clone(self),
                url,
                settled: false,
            }),
            Claim::Wait => Ticket::Wait,
            Claim::Done => Ticket::Done,
        }
    }

    fn availability(&self) -> Availability {
        self.lock().frontier.availability()
    }

    /// Stop handing out URLs; in-flight pages still complete
    fn cancel(&self) {
        {
            let mut state = self.lock();
            state.cancelled = true;
            state.frontier.close();
        }
        self.notify.notify_waiters();
    }

    /// Stop handing out URLs because something went unrecoverably wrong
    fn abort(&self, reason: String) {
        {
            let mut state = self.lock();
            state.aborted.get_or_insert(reason);
            state.frontier.close();
        }
        self.notify.notify_waiters();
    }

    fn outcome(&self) -> CrawlOutcome {
        let mut state = self.lock();
        CrawlOutcome {
            pages: std::mem::take(&mut state.pages),
            errors: std::mem::take(&mut state.errors),
            visited: state.frontier.visited().to_vec(),
            aborted: state.aborted.take(),
            cancelled: state.cancelled,
        }
    }
}

impl InFlight {
    fn url(&self) -> &str {
        &self.url
    }

    /// Records the page and queues its links, keeping their page order
    fn scraped(mut self, record: PageRecord, links: Vec<String>) {
        {
            let mut state = self.shared.lock();
            let queued = state.frontier.complete(links);
            ::log::debug!("Queued {} new links from {}", queued, self.url);
            state.pages.push(record);
        }
        self.settled = true;
        self.shared.notify.notify_waiters();
    }

    fn failed(mut self, record: ErrorRecord) {
        {
            let mut state = self.shared.lock();
            state.frontier.fail();
            state.errors.push(record);
        }
        self.settled = true;
        self.shared.notify.notify_waiters();
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let reason = format!("worker stopped while processing {}", self.url);
        {
            let mut state = self.shared.lock();
            state.frontier.fail();
            state
                .errors
                .push(ErrorRecord::new(&self.url, format!("Error scraping {}: {}", self.url, reason)));
            state.aborted.get_or_insert(reason);
            state.frontier.close();
        }
        self.shared.notify.notify_waiters();
    }
}

/// Concurrent crawl: `crawler.workers` tasks, each with its own renderer session.
///
/// The first worker reuses the session opened by the caller; the others open
/// theirs lazily once there is work for them. Claiming a URL and marking it
/// visited is a single locked step, so a URL is fetched at most once no matter
/// how many pages link to it.
pub(super) async fn run(
    crawler: &Crawler,
    first_session: Box<dyn Renderer>,
    launcher: Arc<dyn RendererLauncher>,
) -> CrawlOutcome {
    let shared = Arc::new(Shared::new(Frontier::new(crawler.seed(), crawler.budget)));

    let watcher = {
        let shared = Arc::clone(&shared);
        let mut cancel = crawler.cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            ::log::info!("Cancellation requested, letting in-flight pages finish");
            shared.cancel();
        })
    };

    let mut first_session = Some(first_session);
    let handles: Vec<_> = (0..crawler.workers)
        .map(|worker_id| {
            tokio::spawn(worker(
                worker_id,
                crawler.clone(),
                Arc::clone(&shared),
                Arc::clone(&launcher),
                first_session.take(),
            ))
        })
        .collect();

    for (worker_id, handle) in handles.into_iter().enumerate() {
        if let Err(e) = handle.await {
            ::log::error!("Worker {} terminated abnormally: {}", worker_id, e);
            shared.abort(format!("worker {} terminated abnormally: {}", worker_id, e));
        }
    }
    watcher.abort();

    shared.outcome()
}

async fn worker(
    worker_id: usize,
    crawler: Crawler,
    shared: Arc<Shared>,
    launcher: Arc<dyn RendererLauncher>,
    mut session: Option<Box<dyn Renderer>>,
) {
    ::log::trace!("Spawning worker {}", worker_id);
    let mut cancel = crawler.cancel.clone();

    loop {
        // Registered before inspecting the state so no wakeup is missed
        let notified = shared.notify.notified();

        if session.is_none() {
            match shared.availability() {
                Availability::Done => break,
                Availability::Wait => {
                    notified.await;
                    continue;
                }
                Availability::Ready => {}
            }
            match launcher.launch().await {
                Ok(fresh) => {
                    ::log::debug!("Worker {} opened a renderer session", worker_id);
                    session = Some(fresh);
                }
                Err(e) => {
                    ::log::warn!("Worker {} could not open a renderer session: {}", worker_id, e);
                    break;
                }
            }
            continue;
        }

        let ticket = match shared.claim() {
            Ticket::Fetch(ticket) => ticket,
            Ticket::Wait => {
                notified.await;
                continue;
            }
            Ticket::Done => break,
        };
        ::log::trace!("Worker {} processing: {}", worker_id, ticket.url());

        match crawler
            .visit(&mut session, launcher.as_ref(), ticket.url())
            .await
        {
            Visit::Scraped(record) => {
                let links = crawler.links_to_follow(&record);
                ticket.scraped(record, links);
            }
            Visit::Failed(record) => ticket.failed(record),
            Visit::Fatal { record, reason } => {
                ticket.failed(record);
                shared.abort(reason);
                break;
            }
        }

        if shared.availability() == Availability::Done {
            break;
        }
        if !crawler.pause(&mut cancel).await {
            shared.cancel();
            break;
        }
    }

    if let Some(session) = session {
        session.close().await;
    }
    ::log::debug!("Worker {} shutting down", worker_id);
}
