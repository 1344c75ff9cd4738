//! Progress notifications from the harvest loop

use harvest_core::RepoRef;
use tracing::info;

/// Width of the logged progress bar
const BAR_WIDTH: usize = 50;

/// Receives progress events; every method defaults to doing nothing
pub trait HarvestObserver: Send + Sync {
    /// A discussion page and all of its comments were fetched
    fn page_completed(&self, _repo: &RepoRef, _page: u32, _total_pages: u32) {}

    /// A batch of `written` records reached storage after `page`
    fn batch_flushed(&self, _repo: &RepoRef, _page: u32, _written: usize, _final_flush: bool) {}
}

/// Ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl HarvestObserver for NoopObserver {}

/// Logs a progress bar at every 10% checkpoint and every flush
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

/// Tenths of the way through, capped at 10
fn decile(page: u32, total_pages: u32) -> u32 {
    if total_pages == 0 {
        return 10;
    }
    (page.saturating_mul(10) / total_pages).min(10)
}

fn progress_bar(page: u32, total_pages: u32) -> String {
    let filled = if total_pages == 0 {
        BAR_WIDTH
    } else {
        (BAR_WIDTH * page as usize / total_pages as usize).min(BAR_WIDTH)
    };
    format!("{}{}", "=".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

impl HarvestObserver for LoggingObserver {
    fn page_completed(&self, repo: &RepoRef, page: u32, total_pages: u32) {
        if page == 1 || decile(page, total_pages) > decile(page - 1, total_pages) {
            info!(
                repo = %repo,
                "[{}] page {}/{}",
                progress_bar(page, total_pages),
                page,
                total_pages
            );
        }
    }

    fn batch_flushed(&self, repo: &RepoRef, page: u32, written: usize, final_flush: bool) {
        info!(repo = %repo, page, written, final_flush, "Flushed discussions to storage");
    }
}
