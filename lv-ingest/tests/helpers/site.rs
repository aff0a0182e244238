//! Fixture catalog
//!
//! ```text
//! /songs                         years 2014, 2015, 1999 (1999 is a 404)
//! /songs/tamil-2014-songs/       pagination 1, 2, Next
//!   page/1                       kaththi, jilla
//!   page/2                       theri, kaththi (again)
//! /songs/tamil-2015-songs/       no pagination
//!   page/1                       vedalam
//! ```
//!
//! Five songs have download links; jilla has one entry without a link.

pub struct FixturePage {
    pub path: &'static str,
    pub html: String,
}

fn page(path: &'static str, html: String) -> FixturePage {
    FixturePage { path, html }
}

fn listing(albums: &[&str]) -> String {
    let articles: String = albums
        .iter()
        .map(|a| format!(r#"<article><div class="post-thumbnail"><a href="/{a}/"><img alt="{a}"></a></div></article>"#))
        .collect();
    format!("<html><body>{articles}</body></html>")
}

fn album(details: &[(&str, &str)], songs: &[(&str, Option<&str>)]) -> String {
    let details: String = details
        .iter()
        .map(|(label, value)| format!("<strong>{label}:</strong> {value}<br>"))
        .collect();
    let entries: String = songs
        .iter()
        .map(|(name, href)| {
            let link = match href {
                Some(href) => format!(r#"<a href="{href}">Download</a>"#),
                None => "<a>Coming soon</a>".to_string(),
            };
            format!(
                r#"<div class="ringtones"><span class="songname">{name}</span><div class="downloadinfo">{link}</div></div>"#
            )
        })
        .collect();
    format!(r#"<html><body><p class="has-text-align-left">{details}</p>{entries}</body></html>"#)
}

pub fn catalog_site() -> Vec<FixturePage> {
    vec![
        page(
            "/songs",
            r#"<html><body><div id="block-8"><ul>
                <li><a href="/songs/tamil-2014-songs/">2014</a></li>
                <li><a href="/songs/tamil-2015-songs/">2015</a></li>
                <li><a href="/songs/tamil-1999-songs/">1999</a></li>
            </ul></div></body></html>"#
                .to_string(),
        ),
        page(
            "/songs/tamil-2014-songs/",
            r#"<html><body><div class="page-pagination">
                <a href="/songs/tamil-2014-songs/page/1">1</a>
                <a href="/songs/tamil-2014-songs/page/2">2</a>
                <a href="/songs/tamil-2014-songs/page/2">Next</a>
            </div></body></html>"#
                .to_string(),
        ),
        page("/songs/tamil-2014-songs/page/1", listing(&["kaththi", "jilla"])),
        page("/songs/tamil-2014-songs/page/2", listing(&["theri", "kaththi"])),
        page(
            "/songs/tamil-2015-songs/",
            "<html><body><p>One page only</p></body></html>".to_string(),
        ),
        page("/songs/tamil-2015-songs/page/1", listing(&["vedalam"])),
        page(
            "/kaththi/",
            album(
                &[
                    ("Movie", "Kaththi"),
                    ("Cast and Crew", "Vijay, Samantha"),
                    ("Music", "Anirudh Ravichander"),
                    ("Year", "2014"),
                    ("Language", "Tamil"),
                ],
                &[
                    ("Selfie Pulla", Some("/dl/kaththi/selfie-pulla.mp3")),
                    ("Pakkam Vanthu", Some("/dl/kaththi/pakkam-vanthu.mp3")),
                ],
            ),
        ),
        page(
            "/jilla/",
            album(
                &[("Movie", "Jilla"), ("Music", "D. Imman"), ("Year", "2014")],
                &[
                    ("Kandangi Kandangi", Some("/dl/jilla/kandangi.mp3")),
                    ("Paattu Onnu", None),
                ],
            ),
        ),
        page(
            "/theri/",
            album(
                &[("Movie", "Theri"), ("Music", "G. V. Prakash Kumar"), ("Year", "2016")],
                &[("Eena Meena Teeka", Some("/dl/theri/eena-meena-teeka.mp3"))],
            ),
        ),
        page(
            "/vedalam/",
            album(
                &[("Movie", "Vedalam"), ("Music", "Anirudh Ravichander"), ("Year", "2015")],
                &[("Aaluma Doluma", Some("/dl/vedalam/aaluma-doluma.mp3"))],
            ),
        ),
    ]
}
