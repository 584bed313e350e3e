//! Stargazer timeline fetching.
//!
//! GitHub lists stargazers page by page. The page count is derived from the
//! repository's stargazer count, every page is fetched conditionally and
//! cached under `<repo>_<page>`, and at most [`PAGE_CONCURRENCY`] pages are
//! in flight at once. The timeline is sorted once every page has arrived.

use std::ops::RangeInclusive;
use std::sync::Arc;

use starchart_protocol::{Repository, StarEvent, sort_timeline};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::client::GitHubClient;
use crate::error::{Error, Result};
use crate::http::HttpRequest;

/// Maximum number of page requests in flight for one repository.
pub const PAGE_CONCURRENCY: usize = 4;

/// Media type that makes GitHub include `starred_at` in stargazer listings.
pub const STAR_MEDIA_TYPE: &str = "application/vnd.github.v3.star+json";

/// Pages to request for a repository.
///
/// The plan always asks for one page past the last full one. When the
/// stargazer count is an exact multiple of the page size, that extra page
/// comes back empty and ends the listing.
///
/// # Examples
///
/// ```
/// use starchart_github::PagePlan;
///
/// let plan = PagePlan::new(250, 100, 400).unwrap();
/// assert_eq!(plan.pages(), 1..=3);
///
/// assert!(PagePlan::new(40_100, 100, 400).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    /// Pages completely filled by the stargazer count.
    pub full_pages: u64,
    /// Pages that will be requested.
    pub page_count: u64,
}

impl PagePlan {
    /// Plans the listing of `stargazers` entries in pages of `page_size`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManyStargazers`] if more than `max_pages` full
    /// pages would be needed.
    pub fn new(stargazers: u64, page_size: u32, max_pages: u32) -> Result<Self> {
        let full_pages = stargazers / u64::from(page_size.max(1));
        if full_pages > u64::from(max_pages) {
            return Err(Error::TooManyStargazers {
                stargazers,
                pages: full_pages,
                max_pages,
            });
        }
        Ok(Self {
            full_pages,
            page_count: full_pages + 1,
        })
    }

    /// Page numbers to request, starting at 1.
    #[must_use]
    pub fn pages(&self) -> RangeInclusive<u64> {
        1..=self.page_count
    }
}

impl GitHubClient {
    /// Fetches every stargazer of `repo`, sorted by the time the star was
    /// given.
    ///
    /// All admitted pages run to completion even if one of them fails; the
    /// first failure observed is then returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManyStargazers`] before sending any request when
    /// the repository is too large to list, and otherwise the first error
    /// raised by a page fetch.
    #[instrument(skip(self, cancel, repo), fields(repo = %repo.full_name, stars = repo.stargazers_count))]
    pub async fn fetch_stargazers(
        &self,
        cancel: &CancellationToken,
        repo: &Repository,
    ) -> Result<Vec<StarEvent>> {
        let plan = PagePlan::new(
            repo.stargazers_count,
            self.inner.page_size,
            self.inner.max_pages,
        )?;
        debug!(pages = plan.page_count, "planned stargazer pages");

        let semaphore = Arc::new(Semaphore::new(PAGE_CONCURRENCY));
        let timeline = Arc::new(Mutex::new(Vec::new()));
        let mut tasks = JoinSet::new();

        for page in plan.pages() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| Error::Task(e.to_string()))?;
            let client = self.clone();
            let cancel = cancel.clone();
            let name = repo.full_name.clone();
            let timeline = Arc::clone(&timeline);

            tasks.spawn(async move {
                let _permit = permit;
                let events = client.fetch_page(&cancel, &name, page).await?;
                if !events.is_empty() {
                    timeline.lock().await.extend(events);
                }
                Ok::<_, Error>(())
            });
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|e| Error::Task(e.to_string())).and_then(|r| r);
            if let Err(err) = outcome {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    debug!(error = %err, "additional page failure");
                }
            }
        }
        if let Some(err) = first_error {
            warn!(error = %err, "stargazer fetch failed");
            return Err(err);
        }

        let mut events = std::mem::take(&mut *timeline.lock().await);
        sort_timeline(&mut events);
        info!(events = events.len(), "fetched stargazers");
        Ok(events)
    }

    /// Fetches one page; an empty list means the listing is over.
    #[instrument(level = "debug", skip(self, cancel))]
    async fn fetch_page(
        &self,
        cancel: &CancellationToken,
        name: &str,
        page: u64,
    ) -> Result<Vec<StarEvent>> {
        let url = self.url(&format!(
            "/repos/{name}/stargazers?page={page}&per_page={}",
            self.inner.page_size
        ));
        let request = HttpRequest::get(url).with_header("Accept", STAR_MEDIA_TYPE);
        let key = format!("{name}_{page}");

        let events = self
            .inner
            .fetcher
            .fetch::<Vec<StarEvent>>(&key, request, cancel)
            .await?
            .unwrap_or_default();
        debug!(events = events.len(), "fetched page");
        Ok(events)
    }
}
