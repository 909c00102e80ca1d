// Paginated issue collector: count query, bounded page fan-out, ordered flatten.

use futures::{StreamExt, TryStreamExt, stream};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::progress::ProgressReporter;
use crate::types::Issue;

use super::traits::{SonarApi, decode};

pub const ISSUES_PATH: &str = "/api/issues/search";

/// Paging knobs for [`fetch_issues`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueFetchOptions {
    /// Issues requested per page (`ps`).
    pub page_size: u32,
    /// Maximum pages in flight at once.
    pub concurrency: usize,
}

impl Default for IssueFetchOptions {
    fn default() -> Self {
        Self {
            page_size: 300,
            concurrency: 4,
        }
    }
}

/// Number of pages needed to cover `total` issues. `page_size` must be non-zero.
pub fn page_count(total: u64, page_size: u32) -> u64 {
    total.div_ceil(u64::from(page_size))
}

/// Collect every issue of `project_key`.
///
/// One `ps=1` request reads the declared total, then pages `1..=n` are
/// fetched concurrently and concatenated in page order. If the server total
/// moves between the count and the page requests, issues can be missed or
/// repeated.
#[instrument(skip_all, name = "fetch_issues", fields(project = %project_key))]
pub async fn fetch_issues(
    api: &dyn SonarApi,
    project_key: &str,
    options: IssueFetchOptions,
    progress: &dyn ProgressReporter,
) -> crate::error::Result<Vec<Issue>> {
    let head = fetch_page(api, project_key, 1, 1).await?;
    let pages = page_count(head.total, options.page_size);
    info!(total = head.total, pages, "Collecting issues");

    if pages == 0 {
        return Ok(Vec::new());
    }

    progress.start("Fetching issue pages", Some(pages));
    let fetched: crate::error::Result<Vec<Vec<Issue>>> = stream::iter(1..=pages)
        .map(|page| async move {
            let resp = fetch_page(api, project_key, options.page_size, page).await?;
            debug!(page, count = resp.issues.len(), "Issue page fetched");
            progress.advance(1);
            Ok::<_, crate::error::ReportError>(resp.issues)
        })
        .buffered(options.concurrency.max(1))
        .try_collect()
        .await;
    progress.finish();

    let issues: Vec<Issue> = fetched?.into_iter().flatten().collect();
    info!(issues = issues.len(), "Issues collected");
    Ok(issues)
}

async fn fetch_page(
    api: &dyn SonarApi,
    project_key: &str,
    page_size: u32,
    page: u64,
) -> crate::error::Result<IssuesResponse> {
    let body = api
        .get_json(
            ISSUES_PATH,
            &[
                ("componentKeys", project_key.to_string()),
                ("ps", page_size.to_string()),
                ("p", page.to_string()),
            ],
        )
        .await?;
    decode(ISSUES_PATH, body)
}

#[derive(Debug, Default, Deserialize)]
struct IssuesResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    issues: Vec<Issue>,
}
