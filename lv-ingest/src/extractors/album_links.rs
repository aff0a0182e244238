//! Listing page → album pages

use super::{collect_links, Extraction, SiteSelectors};
use scraper::Html;
use url::Url;

/// Album page URLs from the listing's thumbnails
pub fn extract_album_links(doc: &Html, base: &Url, selectors: &SiteSelectors) -> Extraction<Url> {
    collect_links(doc.select(&selectors.album_links), base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_links_deduplicated() {
        let html = r#"
            <article>
              <div class="post-thumbnail"><a href="https://isaiminisong.com/kaththi/"><img></a></div>
              <h2><a href="https://isaiminisong.com/kaththi/">Kaththi</a></h2>
            </article>
            <article>
              <div class="post-thumbnail"><a href="/theri/"><img></a></div>
            </article>
            <article>
              <div class="post-thumbnail"><a href="https://isaiminisong.com/kaththi/"><img></a></div>
            </article>
        "#;
        let doc = Html::parse_document(html);
        let base = Url::parse("https://isaiminisong.com/songs/tamil-2014-songs/page/1").unwrap();

        let extraction = extract_album_links(&doc, &base, &SiteSelectors::default());
        let urls: Vec<&str> = extraction.items.iter().map(Url::as_str).collect();
        assert_eq!(
            urls,
            vec!["https://isaiminisong.com/kaththi/", "https://isaiminisong.com/theri/"]
        );
    }
}
