//! Text cleanup for speech.
//!
//! Chat messages carry plenty that is worthless read aloud: URLs, custom
//! emoji escapes, pictographs. [`sanitize`] turns a raw message into
//! something a voice can actually say. Pure and deterministic; callers are
//! expected to run it before enqueueing.

use std::sync::OnceLock;

use regex::Regex;

/// Spoken stand-in for a URL.
const URL_PLACEHOLDER: &str = "リンク";

fn custom_emoji_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<a?:\w+:\d+>").expect("static pattern compiles"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("static pattern compiles"))
}

fn emoji_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Pictographs plus the variation selector and ZWJ that glue emoji
        // sequences together.
        Regex::new(r"[\p{Extended_Pictographic}\u{FE0F}\u{200D}]+")
            .expect("static pattern compiles")
    })
}

/// Reduce a chat message to readable text.
///
/// Custom emoji escapes (`<:name:id>` / `<a:name:id>`) are dropped, URLs
/// become a spoken placeholder, unicode pictographs are stripped, and all
/// whitespace (including newlines) collapses to single spaces. May return
/// an empty string; the pipeline drops empty utterances.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let text = custom_emoji_re().replace_all(text, "");
    let text = url_re().replace_all(&text, URL_PLACEHOLDER);
    let text = emoji_re().replace_all(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
