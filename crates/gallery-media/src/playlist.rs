//! HLS playlist rewriting.
//!
//! The segmenter writes media playlists referencing `segment-<n>.ts` next
//! to the playlist. Clients fetch segments through the API instead, so every
//! segment URI becomes `<prefix>/<file_code>/segments/<n>`.

/// Rewrite every `segment-<n>.ts` URI line of `playlist`.
///
/// Tag and comment lines (starting with `#`) and unrecognised URIs are kept
/// verbatim.
pub fn rewrite_segment_uris(playlist: &str, url_prefix: &str, file_code: &str) -> String {
    let prefix = url_prefix.trim_end_matches('/');
    let mut out = String::with_capacity(playlist.len() + 64);

    for line in playlist.lines() {
        let trimmed = line.trim();
        match segment_index(trimmed).filter(|_| !trimmed.starts_with('#')) {
            Some(index) => {
                out.push_str(&format!("{prefix}/{file_code}/segments/{index}"));
            }
            None => out.push_str(line),
        }
        out.push('\n');
    }

    out
}

/// Parse `segment-<n>.ts` (optionally behind a directory) into `n`.
pub fn segment_index(uri: &str) -> Option<u32> {
    let name = uri.rsplit('/').next()?;
    name.strip_prefix("segment-")?
        .strip_suffix(".ts")?
        .parse()
        .ok()
}
