use crate::crawlers::frontier::{Availability, Claim, Frontier};
use crate::crawlers::renderer::{Renderer, RendererLauncher};
use crate::crawlers::{Crawler, Visit};
use crate::results::CrawlOutcome;

/// Single-worker crawl: one fetch in flight, strict breadth-first order.
///
/// The loop is the only sequencing authority. The session is closed on every
/// exit path, and whatever was collected before an abort is returned.
pub(super) async fn run(
    crawler: &Crawler,
    session: Box<dyn Renderer>,
    launcher: &dyn RendererLauncher,
) -> CrawlOutcome {
    let mut frontier = Frontier::new(crawler.seed(), crawler.budget);
    let mut session = Some(session);
    let mut cancel = crawler.cancel.clone();
    let mut outcome = CrawlOutcome::default();

    loop {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            break;
        }
        let url = match frontier.claim() {
            Claim::Fetch(url) => url,
            Claim::Wait | Claim::Done => break,
        };

        match crawler.visit(&mut session, launcher, &url).await {
            Visit::Scraped(record) => {
                let queued = frontier.complete(crawler.links_to_follow(&record));
                ::log::debug!("Queued {} new links from {}", queued, url);
                outcome.pages.push(record);
            }
            Visit::Failed(record) => {
                frontier.fail();
                outcome.errors.push(record);
            }
            Visit::Fatal { record, reason } => {
                frontier.fail();
                outcome.errors.push(record);
                outcome.aborted = Some(reason);
                break;
            }
        }

        if frontier.availability() == Availability::Done {
            break;
        }
        if !crawler.pause(&mut cancel).await {
            outcome.cancelled = true;
            break;
        }
    }

    if let Some(session) = session {
        session.close().await;
    }
    outcome.visited = frontier.into_visited();
    outcome
}
