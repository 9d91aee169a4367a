//! Generate static files

use anyhow::Result;

use crate::Blog;

/// Render the listing, every post and the not-found page to `public/`
pub async fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let report = blog.generate().await?;

    if !report.skipped.is_empty() {
        tracing::warn!(
            "Skipped {} posts that could not be found: {}",
            report.skipped.len(),
            report.skipped.join(", ")
        );
    }

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} posts and {} listing pages in {:.2}s",
        report.posts,
        report.listing_pages,
        duration.as_secs_f64()
    );

    Ok(())
}
