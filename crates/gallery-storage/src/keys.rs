//! Object key layout.
//!
//! Primary blobs are keyed by the bare file code in the primary bucket.
//! Derivatives live in the service bucket: `thumb/<code>.jpg` and
//! everything under `hls/<code>/`.

pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";
pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
pub const SEGMENT_CONTENT_TYPE: &str = "video/MP2T";

pub fn primary_key(file_code: &str) -> String {
    file_code.to_string()
}

pub fn thumbnail_key(file_code: &str) -> String {
    format!("thumb/{file_code}.jpg")
}

/// Prefix shared by every HLS object of a file, trailing slash included.
pub fn hls_prefix(file_code: &str) -> String {
    format!("hls/{file_code}/")
}

pub fn hls_object_key(file_code: &str, file_name: &str) -> String {
    format!("hls/{file_code}/{file_name}")
}

pub fn hls_playlist_name(file_code: &str) -> String {
    format!("{file_code}.m3u8")
}

pub fn hls_playlist_key(file_code: &str) -> String {
    hls_object_key(file_code, &hls_playlist_name(file_code))
}

pub fn hls_segment_name(index: u32) -> String {
    format!("segment-{index}.ts")
}

pub fn hls_segment_key(file_code: &str, index: u32) -> String {
    hls_object_key(file_code, &hls_segment_name(index))
}

/// Content type for a file produced by HLS segmentation, by extension.
pub fn hls_content_type(file_name: &str) -> Option<&'static str> {
    if file_name.ends_with(".m3u8") {
        Some(PLAYLIST_CONTENT_TYPE)
    } else if file_name.ends_with(".ts") {
        Some(SEGMENT_CONTENT_TYPE)
    } else {
        None
    }
}
