//! URL construction for backends without native request signing.
//!
//! The local and memory providers hand out plain URLs under the configured
//! public base URL. The expiry and response overrides are carried as query
//! parameters using the S3 names so a serving layer can honor them.

use chrono::Utc;
use url::Url;

use gallery_core::error::{AppError, ErrorKind};
use gallery_core::result::AppResult;
use gallery_core::traits::object_store::PresignOptions;

/// Query parameter holding the Unix timestamp after which the URL is invalid.
pub const EXPIRES_PARAM: &str = "X-Gallery-Expires";

/// Build `<base>/<bucket>/<key>?X-Gallery-Expires=..&response-...`.
pub fn unsigned_url(
    base: &str,
    bucket: &str,
    key: &str,
    options: &PresignOptions,
) -> AppResult<String> {
    let mut url = Url::parse(base).map_err(|e| {
        AppError::with_source(
            ErrorKind::Configuration,
            format!("Invalid public base URL: {base}"),
            e,
        )
    })?;

    url.path_segments_mut()
        .map_err(|_| AppError::configuration(format!("Public base URL cannot be a base: {base}")))?
        .pop_if_empty()
        .push(bucket)
        .extend(key.split('/'));

    let expires_at = Utc::now().timestamp() + options.expires_in.as_secs() as i64;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair(EXPIRES_PARAM, &expires_at.to_string());
        if let Some(disposition) = &options.response_content_disposition {
            query.append_pair("response-content-disposition", disposition);
        }
        if let Some(content_type) = &options.response_content_type {
            query.append_pair("response-content-type", content_type);
        }
    }

    Ok(url.to_string())
}
