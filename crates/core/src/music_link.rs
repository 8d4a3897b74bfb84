//! NetEase Cloud Music share-link parsing.
//!
//! Characters attach a music link to their status messages. Users paste
//! whatever the app or the website gave them; this module recognises the
//! known shapes and rewrites them into the outchain player URL that the
//! frontend embeds. Only the two fixed prefixes below plus a digit-only id
//! are ever constructed, so arbitrary user text never reaches the iframe.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Embed prefix for single songs (`type=2`).
pub const SONG_EMBED_PREFIX: &str = "https://music.163.com/outchain/player?type=2&id=";

/// Embed prefix for radio programs / podcast episodes (`type=3`).
pub const PROGRAM_EMBED_PREFIX: &str = "https://music.163.com/outchain/player?type=3&id=";

/// Appended to every constructed embed URL.
pub const AUTOPLAY_SUFFIX: &str = "&auto=1&height=66";

/// Song link shapes, in priority order.
static SONG_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        // https://music.163.com/#/song?id=185868
        r"#/(?:m/)?song\?(?:[^#]*&)?id=(\d+)",
        // https://music.163.com/song/185868, https://y.music.163.com/m/song/185868
        r"/song/(\d+)",
        // https://music.163.com/song?id=185868&userid=1, https://y.music.163.com/m/song?id=185868
        r"/song\?(?:[^#]*&)?id=(\d+)",
        // orpheus://song/185868 (desktop / mobile app deep link)
        r"orpheus://song/(\d+)",
    ])
});

/// Program link shapes, in priority order.
static PROGRAM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"#/(?:m/)?program\?(?:[^#]*&)?id=(\d+)",
        r"/program/(\d+)",
        r"/program\?(?:[^#]*&)?id=(\d+)",
        r"orpheus://program/(\d+)",
    ])
});

/// Last-resort heuristic for songs: the word `song` followed somewhere by a
/// run of at least five digits.
static LOOSE_SONG_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"song.*?(\d{5,})").expect("valid regex"));

/// An already-canonical embed URL: a fixed prefix, a digit-only id and any
/// number of plain `&key=value` player parameters (`&auto=0&height=32` from
/// the site's own outchain generator, for one). Quotes, spaces, slashes and
/// other URL syntax never match.
static CANONICAL_EMBED: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"^(?:{}|{})\d+(?:&[A-Za-z0-9_]+=[A-Za-z0-9_]*)*$",
        regex::escape(SONG_EMBED_PREFIX),
        regex::escape(PROGRAM_EMBED_PREFIX),
    );
    Regex::new(&pattern).expect("valid regex")
});

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which embed type a link resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCategory {
    Song,
    Program,
}

impl LinkCategory {
    /// Classify a link. Anything mentioning `/program` or `program?` is a
    /// program; everything else is treated as a song.
    pub fn detect(link: &str) -> Self {
        if link.contains("/program") || link.contains("program?") {
            LinkCategory::Program
        } else {
            LinkCategory::Song
        }
    }

    pub fn embed_prefix(self) -> &'static str {
        match self {
            LinkCategory::Song => SONG_EMBED_PREFIX,
            LinkCategory::Program => PROGRAM_EMBED_PREFIX,
        }
    }

    fn patterns(self) -> &'static [Regex] {
        match self {
            LinkCategory::Song => &SONG_PATTERNS,
            LinkCategory::Program => &PROGRAM_PATTERNS,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a user-supplied share link into a canonical embed URL.
///
/// Returns `None` both for empty input and for input that matches no known
/// shape; callers that need to tell the two apart should use
/// [`validate_music_link`]. Canonical URLs are returned unchanged, so the
/// function is idempotent on its own output. A string that merely starts
/// with an embed prefix but carries anything beyond the id and plain player
/// parameters is not passed through.
pub fn parse_music_link(link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }

    if CANONICAL_EMBED.is_match(link) {
        return Some(link.to_string());
    }

    let category = LinkCategory::detect(link);
    let id = extract_id(link, category)?;

    Some(format!("{}{id}{AUTOPLAY_SUFFIX}", category.embed_prefix()))
}

/// `true` when [`parse_music_link`] produces a URL.
pub fn is_valid_music_link(link: &str) -> bool {
    parse_music_link(link).is_some()
}

/// Edit-time check for a configured music link.
///
/// - empty / whitespace-only input means "no link configured": `Ok(None)`
/// - a recognised link yields its canonical URL: `Ok(Some(url))`
/// - anything else is a user mistake and yields `CoreError::Validation`
pub fn validate_music_link(link: &str) -> Result<Option<String>, CoreError> {
    if link.trim().is_empty() {
        return Ok(None);
    }
    parse_music_link(link).map(Some).ok_or_else(|| {
        CoreError::Validation(format!("Unrecognised music link: {}", link.trim()))
    })
}

fn extract_id(link: &str, category: LinkCategory) -> Option<&str> {
    let structured = category
        .patterns()
        .iter()
        .find_map(|re| re.captures(link).and_then(|c| c.get(1)));

    match (structured, category) {
        (Some(m), _) => Some(m.as_str()),
        (None, LinkCategory::Song) => LOOSE_SONG_ID
            .captures(link)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str()),
        (None, LinkCategory::Program) => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn song_url(id: &str) -> String {
        format!("{SONG_EMBED_PREFIX}{id}{AUTOPLAY_SUFFIX}")
    }

    fn program_url(id: &str) -> String {
        format!("{PROGRAM_EMBED_PREFIX}{id}{AUTOPLAY_SUFFIX}")
    }

    // -- recognised shapes ------------------------------------------------

    #[test]
    fn hash_routed_song() {
        let url = parse_music_link("https://music.163.com/#/song?id=185868").unwrap();
        assert_eq!(url, song_url("185868"));
        assert!(url.contains("type=2&id=185868"));
    }

    #[test]
    fn path_style_song() {
        assert_eq!(
            parse_music_link("https://music.163.com/song/185868").as_deref(),
            Some(song_url("185868").as_str())
        );
    }

    #[test]
    fn query_style_song_with_share_params() {
        assert_eq!(
            parse_music_link("https://music.163.com/song?id=185868&userid=42").unwrap(),
            song_url("185868")
        );
    }

    #[test]
    fn id_after_other_params() {
        assert_eq!(
            parse_music_link("https://music.163.com/#/song?userid=42&id=185868").unwrap(),
            song_url("185868")
        );
    }

    #[test]
    fn mobile_song_links() {
        assert_eq!(
            parse_music_link("https://y.music.163.com/m/song?id=185868&uct=abc").unwrap(),
            song_url("185868")
        );
        assert_eq!(
            parse_music_link("https://y.music.163.com/m/song/185868/").unwrap(),
            song_url("185868")
        );
        assert_eq!(
            parse_music_link("orpheus://song/185868").unwrap(),
            song_url("185868")
        );
    }

    #[test]
    fn share_text_around_link() {
        let pasted = "分享歌曲: 晴天 https://music.163.com/song?id=186016&userid=1 (来自网易云音乐)";
        assert_eq!(parse_music_link(pasted).unwrap(), song_url("186016"));
    }

    #[test]
    fn hash_routed_program() {
        let url = parse_music_link("https://music.163.com/#/program?id=999").unwrap();
        assert_eq!(url, program_url("999"));
        assert!(url.contains("type=3&id=999"));
    }

    #[test]
    fn path_and_mobile_programs() {
        assert_eq!(
            parse_music_link("https://music.163.com/program/2058335550").unwrap(),
            program_url("2058335550")
        );
        assert_eq!(
            parse_music_link("https://y.music.163.com/m/program?id=2058335550").unwrap(),
            program_url("2058335550")
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            parse_music_link("  https://music.163.com/song/185868 \n").unwrap(),
            song_url("185868")
        );
    }

    // -- loose fallback ---------------------------------------------------

    #[test]
    fn loose_song_fallback_takes_first_long_digit_run() {
        assert_eq!(
            parse_music_link("song: 12 then 1859001 later").unwrap(),
            song_url("1859001")
        );
    }

    #[test]
    fn loose_fallback_requires_five_digits() {
        assert_eq!(parse_music_link("song 1234"), None);
    }

    #[test]
    fn program_has_no_loose_fallback() {
        assert_eq!(
            parse_music_link("https://music.163.com/program/latest?song=1234567"),
            None
        );
    }

    // -- rejection --------------------------------------------------------

    #[test]
    fn garbage_and_empty_are_none() {
        assert_eq!(parse_music_link("not a url at all"), None);
        assert_eq!(parse_music_link(""), None);
        assert_eq!(parse_music_link("   "), None);
        assert!(!is_valid_music_link("https://example.com/track/123456"));
    }

    #[test]
    fn non_digit_ids_are_rejected() {
        assert_eq!(
            parse_music_link("https://music.163.com/#/song?id=<script>"),
            None
        );
    }

    // -- idempotence ------------------------------------------------------

    #[test]
    fn canonical_output_parses_to_itself() {
        let inputs = [
            "https://music.163.com/#/song?id=185868",
            "https://music.163.com/song/185868",
            "https://y.music.163.com/m/program?id=77",
            "song 7777777",
        ];
        for input in inputs {
            let once = parse_music_link(input).unwrap();
            assert_eq!(parse_music_link(&once).as_deref(), Some(once.as_str()), "{input}");
        }
    }

    #[test]
    fn canonical_prefix_with_trailing_text_is_rejected() {
        let bare = format!("{SONG_EMBED_PREFIX}185868");
        assert_eq!(parse_music_link(&bare).as_deref(), Some(bare.as_str()));

        let tampered = format!("{}\" onload=\"alert(1)", song_url("185868"));
        assert_eq!(parse_music_link(&tampered), None);
        assert_eq!(
            parse_music_link(&format!("{PROGRAM_EMBED_PREFIX}12&next=https://evil.test/")),
            None
        );
        assert_eq!(parse_music_link(&format!("{SONG_EMBED_PREFIX}12&auto=1 x")), None);
    }

    #[test]
    fn generated_player_links_pass_through_unchanged() {
        let compact = format!("{SONG_EMBED_PREFIX}185868&auto=0&height=32");
        assert_eq!(parse_music_link(&compact).as_deref(), Some(compact.as_str()));

        let program = format!("  {PROGRAM_EMBED_PREFIX}999&auto=1&height=66&extra=  ");
        assert_eq!(
            parse_music_link(&program).as_deref(),
            Some(program.trim())
        );
    }

    #[test]
    fn category_detection() {
        assert_eq!(LinkCategory::detect("x/program/1"), LinkCategory::Program);
        assert_eq!(LinkCategory::detect("djprogram?id=1"), LinkCategory::Program);
        assert_eq!(LinkCategory::detect("/song?id=1"), LinkCategory::Song);
    }

    // -- validate_music_link ---------------------------------------------

    #[test]
    fn validate_distinguishes_empty_from_invalid() {
        assert_matches!(validate_music_link(""), Ok(None));
        assert_matches!(validate_music_link("  "), Ok(None));
        assert_matches!(validate_music_link("hello"), Err(CoreError::Validation(_)));
        assert_eq!(
            validate_music_link("https://music.163.com/song/1").unwrap(),
            Some(song_url("1"))
        );
    }
}
