//! URL construction helpers for the VOICEVOX engine API.
//!
//! Pure functions building the six engine endpoints from a base URL, so
//! every call site constructs URLs the same way.

use url::Url;

use crate::models::StyleId;

/// Resolve an endpoint path against the engine base URL.
fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let full = format!("{}/{path}", url.path().trim_end_matches('/'));
    url.set_path(&full);
    url
}

/// Build the `POST /audio_query` URL for the given text and style.
pub fn audio_query_url(base: &Url, text: &str, style_id: StyleId) -> Url {
    let mut url = endpoint(base, "audio_query");
    url.set_query(Some(&format!(
        "speaker={style_id}&text={}",
        urlencoding::encode(text)
    )));
    url
}

/// Build the `POST /synthesis` URL for the given style.
pub fn synthesis_url(base: &Url, style_id: StyleId) -> Url {
    let mut url = endpoint(base, "synthesis");
    url.set_query(Some(&format!("speaker={style_id}")));
    url
}

/// Build the `GET /speakers` catalog URL.
pub fn speakers_url(base: &Url) -> Url {
    endpoint(base, "speakers")
}

/// Build the `GET /speaker_info` URL for one speaker.
pub fn speaker_info_url(base: &Url, speaker_uuid: &str) -> Url {
    let mut url = endpoint(base, "speaker_info");
    url.set_query(Some(&format!(
        "speaker_uuid={}",
        urlencoding::encode(speaker_uuid)
    )));
    url
}

/// Build the `GET /is_initialized_speaker` URL for one style.
pub fn is_initialized_speaker_url(base: &Url, style_id: StyleId) -> Url {
    let mut url = endpoint(base, "is_initialized_speaker");
    url.set_query(Some(&format!("speaker={style_id}")));
    url
}

/// Build the `POST /initialize_speaker` URL for one style.
pub fn initialize_speaker_url(base: &Url, style_id: StyleId) -> Url {
    let mut url = endpoint(base, "initialize_speaker");
    url.set_query(Some(&format!("speaker={style_id}")));
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://127.0.0.1:50021").unwrap()
    }

    #[test]
    fn audio_query_url_encodes_text() {
        let url = audio_query_url(&base(), "こんにちは 世界", 3);
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:50021/audio_query?speaker=3&text=%E3%81%93%E3%82%93%E3%81%AB%E3%81%A1%E3%81%AF%20%E4%B8%96%E7%95%8C"
        );
    }

    #[test]
    fn synthesis_url_carries_style_id() {
        let url = synthesis_url(&base(), 3);
        assert_eq!(url.as_str(), "http://127.0.0.1:50021/synthesis?speaker=3");
    }

    #[test]
    fn speakers_url_has_no_query() {
        let url = speakers_url(&base());
        assert_eq!(url.as_str(), "http://127.0.0.1:50021/speakers");
    }

    #[test]
    fn speaker_info_url_encodes_uuid() {
        let url = speaker_info_url(&base(), "388f246b-8c41-4ac1-8e2d-5d79f3ff56d9");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:50021/speaker_info?speaker_uuid=388f246b-8c41-4ac1-8e2d-5d79f3ff56d9"
        );
    }

    #[test]
    fn initialization_urls() {
        assert_eq!(
            is_initialized_speaker_url(&base(), 8).as_str(),
            "http://127.0.0.1:50021/is_initialized_speaker?speaker=8"
        );
        assert_eq!(
            initialize_speaker_url(&base(), 8).as_str(),
            "http://127.0.0.1:50021/initialize_speaker?speaker=8"
        );
    }

    #[test]
    fn base_url_with_path_prefix_is_respected() {
        let base = Url::parse("http://tts.example.net/engine/").unwrap();
        let url = speakers_url(&base);
        assert_eq!(url.as_str(), "http://tts.example.net/engine/speakers");
    }
}
