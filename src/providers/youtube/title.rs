use std::sync::LazyLock;

use regex::Regex;

/// Bracketed upload noise that makes video titles useless as search queries.
static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*[\(\[](?:official\s+)?(?:music\s+)?(?:video|audio|lyrics?|lyric\s+video|visualizer|hd|4k)[\)\]]",
    )
    .unwrap()
});

/// Strip uploader noise like "(Official Video)" or "[Lyrics]" from a video
/// title so it can be used as a track search query.
pub fn clean_track_title(title: &str) -> String {
    let cleaned = NOISE.replace_all(title, "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_official_video_markers() {
        assert_eq!(
            clean_track_title("Six Minutes (Official Video)"),
            "Six Minutes"
        );
        assert_eq!(
            clean_track_title("Six Minutes [Official Music Video]"),
            "Six Minutes"
        );
        assert_eq!(clean_track_title("Six Minutes (Lyrics)"), "Six Minutes");
        assert_eq!(
            clean_track_title("Six Minutes (Official Audio) [HD]"),
            "Six Minutes"
        );
    }

    #[test]
    fn test_keeps_meaningful_brackets() {
        assert_eq!(
            clean_track_title("Concerto in A (Allegro)"),
            "Concerto in A (Allegro)"
        );
    }

    #[test]
    fn test_collapses_leftover_whitespace() {
        assert_eq!(
            clean_track_title("Six  Minutes   (Official Video)  "),
            "Six Minutes"
        );
    }
}
