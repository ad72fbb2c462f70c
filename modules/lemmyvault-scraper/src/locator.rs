// Media URL extraction. Pure functions over a post's URL fields.

use lemmy_client::PostView;

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".svg"];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".mov", ".avi", ".mkv", ".m4v", ".flv"];

/// Hosts that serve media directly even when the URL carries no extension.
const MEDIA_HOSTS: &[&str] = &[
    "i.imgur.com",
    "i.redd.it",
    "v.redd.it",
    "preview.redd.it",
    "external-preview.redd.it",
    "lemmy.world/pictrs",
    "lemmy.ml/pictrs",
    "pictrs",
];

/// Candidate media URLs for a post, highest quality first.
///
/// The primary URL wins outright; an embedded video is a second, distinct
/// asset and rides along with it. The thumbnail is a server-generated preview
/// and is only used when nothing better qualifies.
pub fn extract_media_urls(post: &PostView) -> Vec<String> {
    let primary = post.post.url.as_deref().unwrap_or("");
    let embed = post.post.embed_video_url.as_deref().unwrap_or("");
    let thumbnail = post.post.thumbnail_url.as_deref().unwrap_or("");

    let mut urls = Vec::new();

    if !primary.is_empty() && is_media_url(primary) {
        urls.push(primary.to_string());
        if !embed.is_empty() && embed != primary && is_media_url(embed) {
            urls.push(embed.to_string());
        }
        return urls;
    }

    if !embed.is_empty() && is_media_url(embed) {
        urls.push(embed.to_string());
        return urls;
    }

    if !thumbnail.is_empty() && is_media_url(thumbnail) {
        urls.push(thumbnail.to_string());
    }

    urls
}

/// Is this string plausibly a direct link to a media resource?
pub fn is_media_url(url: &str) -> bool {
    let url = url.to_lowercase();

    if IMAGE_EXTENSIONS.iter().any(|ext| url.contains(ext)) {
        return true;
    }
    if VIDEO_EXTENSIONS.iter().any(|ext| url.contains(ext)) {
        return true;
    }
    MEDIA_HOSTS.iter().any(|host| url.contains(host))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::post_view;

    #[test]
    fn qualifying_primary_only() {
        let post = post_view(1, Some("https://example.com/cat.jpg"), None, None);
        assert_eq!(
            extract_media_urls(&post),
            vec!["https://example.com/cat.jpg"]
        );
    }

    #[test]
    fn primary_and_embedded_video_coexist() {
        let post = post_view(
            1,
            Some("https://example.com/cat.jpg"),
            Some("https://v.redd.it/abc/clip.mp4"),
            Some("https://example.com/thumb.png"),
        );
        assert_eq!(
            extract_media_urls(&post),
            vec![
                "https://example.com/cat.jpg",
                "https://v.redd.it/abc/clip.mp4"
            ]
        );
    }

    #[test]
    fn embedded_video_alone_when_primary_does_not_qualify() {
        let post = post_view(
            1,
            Some("https://example.com/article"),
            Some("https://example.com/clip.webm"),
            Some("https://example.com/thumb.png"),
        );
        assert_eq!(extract_media_urls(&post), vec!["https://example.com/clip.webm"]);
    }

    #[test]
    fn thumbnail_is_last_resort() {
        let post = post_view(1, None, None, Some("https://example.com/thumb.png"));
        assert_eq!(extract_media_urls(&post), vec!["https://example.com/thumb.png"]);
    }

    #[test]
    fn thumbnail_never_preferred_over_primary() {
        let post = post_view(
            1,
            Some("https://i.imgur.com/full"),
            None,
            Some("https://example.com/thumb.png"),
        );
        assert_eq!(extract_media_urls(&post), vec!["https://i.imgur.com/full"]);
    }

    #[test]
    fn nothing_qualifying_yields_empty() {
        let post = post_view(1, Some("https://example.com/article"), None, None);
        assert!(extract_media_urls(&post).is_empty());
    }

    #[test]
    fn identical_primary_and_embed_are_not_duplicated() {
        let post = post_view(
            1,
            Some("https://example.com/clip.mp4"),
            Some("https://example.com/clip.mp4"),
            None,
        );
        assert_eq!(extract_media_urls(&post), vec!["https://example.com/clip.mp4"]);
    }

    #[test]
    fn classifier_matches_extensions_and_hosts() {
        assert!(is_media_url("https://example.com/A.JPG"));
        assert!(is_media_url("https://i.redd.it/xyz"));
        assert!(is_media_url("https://lemmy.world/pictrs/image/xyz"));
        assert!(!is_media_url("https://example.com/blog/post"));
    }
}
