//! List the posts available in the CMS

use anyhow::Result;

use crate::pages::ListingState;
use crate::Blog;

/// Walk the whole listing and print one line per post
pub async fn run(blog: &Blog) -> Result<()> {
    let renderer = blog.renderer()?;
    let formatter = renderer.formatter();
    let api = blog.api.as_ref();

    let state = ListingState::load(api, &blog.config.cms, None, formatter)
        .await?
        .load_all(api, formatter)
        .await?;

    println!("Posts ({}):", state.posts().len());
    for post in state.posts() {
        println!("  {} - {} [{}]", post.date, post.title, post.path);
    }

    Ok(())
}
