use std::collections::{HashSet, VecDeque};

/// What a worker should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The URL now belongs to the caller; it is already marked visited
    Fetch(String),
    /// Nothing to claim right now, but in-flight pages may still discover more
    Wait,
    /// The crawl is over
    Done,
}

/// Whether a claim would succeed, without claiming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Ready,
    Wait,
    Done,
}

/// Visited set plus pending queue.
///
/// URLs enter `pending` at most once and are marked visited in the same step
/// that removes them from it, so `visited` and `pending` never overlap.
#[derive(Debug)]
pub struct Frontier {
    visited: HashSet<String>,
    visit_order: Vec<String>,
    pending: VecDeque<String>,
    queued: HashSet<String>,
    in_flight: usize,
    scraped: usize,
    failed: usize,
    budget: Option<usize>,
    closed: bool,
}

impl Frontier {
    /// A frontier holding only the seed
    pub fn new(seed: impl Into<String>, budget: Option<usize>) -> Self {
        let seed = seed.into();
        Self {
            visited: HashSet::new(),
            visit_order: Vec::new(),
            pending: VecDeque::from([seed.clone()]),
            queued: HashSet::from([seed]),
            in_flight: 0,
            scraped: 0,
            failed: 0,
            budget,
            closed: false,
        }
    }

    /// Dequeues the next URL and marks it visited in one step
    pub fn claim(&mut self) -> Claim {
        loop {
            match self.availability() {
                Availability::Done => return Claim::Done,
                Availability::Wait => return Claim::Wait,
                Availability::Ready => {}
            }
            let Some(url) = self.pending.pop_front() else {
                continue;
            };
            self.queued.remove(&url);
            if !self.visited.insert(url.clone()) {
                ::log::trace!("Skipping already visited: {}", url);
                continue;
            }
            self.visit_order.push(url.clone());
            self.in_flight += 1;
            return Claim::Fetch(url);
        }
    }

    pub fn availability(&self) -> Availability {
        if self.closed {
            return Availability::Done;
        }
        let budget_spent = self
            .budget
            .is_some_and(|budget| self.scraped + self.in_flight >= budget);
        if budget_spent || self.pending.is_empty() {
            if self.in_flight == 0 {
                Availability::Done
            } else {
                Availability::Wait
            }
        } else {
            Availability::Ready
        }
    }

    /// Settles a claimed URL whose page was scraped, queueing its links in order.
    ///
    /// Returns how many links were newly queued.
    pub fn complete<I>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        self.settle();
        self.scraped += 1;
        links
            .into_iter()
            .filter(|link| self.enqueue(link))
            .count()
    }

    /// Settles a claimed URL that failed; it contributes no links
    pub fn fail(&mut self) {
        self.settle();
        self.failed += 1;
    }

    /// Stops handing out URLs; in-flight pages may still settle
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn settle(&mut self) {
        debug_assert!(self.in_flight > 0, "settled a URL that was never claimed");
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    fn enqueue(&mut self, link: &str) -> bool {
        if self.visited.contains(link) || self.queued.contains(link) {
            return false;
        }
        self.queued.insert(link.to_string());
        self.pending.push_back(link.to_string());
        true
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.queued.contains(url)
    }

    /// Claimed URLs in claim order
    pub fn visited(&self) -> &[String] {
        &self.visit_order
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn scraped(&self) -> usize {
        self.scraped
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn into_visited(self) -> Vec<String> {
        self.visit_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|url| url.to_string()).collect()
    }

    #[test]
    fn test_claim_marks_visited_and_removes_from_pending() {
        let mut frontier = Frontier::new("http://a.test/", None);
        assert!(frontier.is_pending("http://a.test/"));

        assert_eq!(frontier.claim(), Claim::Fetch("http://a.test/".to_string()));
        assert!(frontier.is_visited("http://a.test/"));
        assert!(!frontier.is_pending("http://a.test/"));
        assert_eq!(frontier.in_flight(), 1);
        assert_eq!(frontier.claim(), Claim::Wait);
    }

    #[test]
    fn test_links_are_queued_once_in_discovery_order() {
        let mut frontier = Frontier::new("http://a.test/", None);
        frontier.claim();
        let queued = frontier.complete(links(&[
            "http://a.test/y",
            "http://a.test/x",
            "http://a.test/",
            "http://a.test/y",
        ]));
        assert_eq!(queued, 2);

        assert_eq!(frontier.claim(), Claim::Fetch("http://a.test/y".to_string()));
        // Rediscovering a pending URL does not queue it twice
        assert_eq!(frontier.complete(links(&["http://a.test/x", "http://a.test/z"])), 1);
        assert_eq!(frontier.claim(), Claim::Fetch("http://a.test/x".to_string()));
        frontier.fail();
        assert_eq!(frontier.claim(), Claim::Fetch("http://a.test/z".to_string()));
        frontier.complete(Vec::new());
        assert_eq!(frontier.claim(), Claim::Done);

        assert_eq!(
            frontier.visited(),
            links(&[
                "http://a.test/",
                "http://a.test/y",
                "http://a.test/x",
                "http://a.test/z"
            ])
        );
        assert_eq!(frontier.scraped() + frontier.failed(), frontier.visited().len());
    }

    #[test]
    fn test_budget_counts_scraped_and_in_flight_pages() {
        let mut frontier = Frontier::new("http://a.test/", Some(2));
        frontier.claim();
        frontier.complete(links(&["http://a.test/1", "http://a.test/2", "http://a.test/3"]));

        assert!(matches!(frontier.claim(), Claim::Fetch(_)));
        // One scraped plus one in flight fills the budget
        assert_eq!(frontier.claim(), Claim::Wait);

        // A failure frees the slot again
        frontier.fail();
        assert!(matches!(frontier.claim(), Claim::Fetch(_)));
        frontier.complete(Vec::new());
        assert_eq!(frontier.claim(), Claim::Done);
        assert_eq!(frontier.scraped(), 2);
        assert_eq!(frontier.pending_len(), 1);
    }

    #[test]
    fn test_zero_budget_claims_nothing() {
        let mut frontier = Frontier::new("http://a.test/", Some(0));
        assert_eq!(frontier.claim(), Claim::Done);
        assert!(frontier.visited().is_empty());
    }

    #[test]
    fn test_close_stops_claims_but_lets_in_flight_settle() {
        let mut frontier = Frontier::new("http://a.test/", None);
        frontier.claim();
        frontier.close();
        assert_eq!(frontier.availability(), Availability::Done);
        assert_eq!(frontier.complete(links(&["http://a.test/x"])), 1);
        assert_eq!(frontier.claim(), Claim::Done);
        assert_eq!(frontier.scraped(), 1);
    }
}
