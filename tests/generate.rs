//! End-to-end static generation from a freshly initialized site

use ignite_blog::cms::{parse_date, Document, MemoryApi};
use ignite_blog::commands::init::init_site;
use ignite_blog::config::SiteConfig;
use ignite_blog::Blog;
use std::sync::Arc;

fn post(uid: &str, date: &str) -> Document {
    Document {
        id: format!("id-{}", uid),
        uid: Some(uid.to_string()),
        doc_type: "posts".to_string(),
        first_publication_date: parse_date(date),
        last_publication_date: parse_date(date),
        data: serde_json::json!({ "title": format!("Post {}", uid), "author": "Danilo Vieira" }),
    }
}

/// The `data-src` of the load-more button, unescaped
fn load_more_target(html: &str) -> Option<String> {
    let start = html.find(r#"data-src=""#)? + r#"data-src=""#.len();
    let end = start + html[start..].find('"')?;
    Some(html[start..end].replace("&#x2F;", "/").replace("&amp;", "&"))
}

#[tokio::test]
async fn test_generate_from_sample_fixtures() {
    let dir = tempfile::tempdir().unwrap();
    init_site(dir.path()).unwrap();

    let blog = Blog::from_fixtures(dir.path(), dir.path().join("fixtures.json")).unwrap();
    let report = blog.generate().await.unwrap();
    assert_eq!(report.posts, 1);
    assert!(report.skipped.is_empty());

    let public = dir.path().join("public");
    let index = std::fs::read_to_string(public.join("index.html")).unwrap();
    assert!(index.contains("Hello World"));
    assert!(index.contains("15 Mar 2021"));
    assert!(!index.contains("Carregar mais posts"));

    let post = std::fs::read_to_string(public.join("post/hello-world/index.html")).unwrap();
    assert!(post.contains("<h1>Hello World</h1>"));
    assert!(post.contains("<strong>"));
    assert!(post.contains("utteranc.es/client.js"));

    let not_found = std::fs::read_to_string(public.join("404.html")).unwrap();
    assert!(not_found.contains("Post não encontrado"));
}

#[test]
fn test_missing_endpoint_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::env::remove_var("PRISMIC_API_ENDPOINT");
    let err = Blog::new(dir.path()).err().unwrap();
    assert!(err.to_string().contains("No CMS endpoint configured"));
}

#[tokio::test]
async fn test_load_more_target_exists_in_static_site() {
    let dir = tempfile::tempdir().unwrap();
    let api = MemoryApi::new(vec![
        post("um", "2021-01-01T10:00:00+0000"),
        post("dois", "2021-02-01T10:00:00+0000"),
        post("tres", "2021-03-01T10:00:00+0000"),
    ]);
    let config = SiteConfig::default();
    assert_eq!(config.cms.page_size, 2);
    let blog = Blog::with_api(dir.path(), config, Arc::new(api));
    blog.generate().await.unwrap();

    let public = dir.path().join("public");
    let index = std::fs::read_to_string(public.join("index.html")).unwrap();
    assert!(index.contains("Post tres"));
    assert!(!index.contains("Post um"));

    let target = load_more_target(&index).expect("load more button");
    assert!(target.starts_with('/'));
    let file = public.join(target.trim_start_matches('/'));
    assert!(file.exists(), "{:?} is missing", file);

    let page: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
    assert_eq!(page["results"][0]["title"], "Post um");
    assert_eq!(page["results"][0]["path"], "/post/um");
    assert!(page["next_url"].is_null());
}
