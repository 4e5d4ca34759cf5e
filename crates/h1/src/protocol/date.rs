//! Cached value of the `Date` response header.
//!
//! Formatting an HTTP date on every response is wasteful, so the formatted
//! value is kept in an [`ArcSwap`] and only refreshed when the wall clock has
//! moved on to the next second.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;
use bytes::Bytes;
use http::HeaderValue;
use once_cell::sync::Lazy;

struct CachedDate {
    second: u64,
    value: HeaderValue,
}

static CURRENT_DATE: Lazy<ArcSwap<CachedDate>> =
    Lazy::new(|| ArcSwap::from_pointee(CachedDate { second: unix_second(), value: format_date() }));

/// Returns the current date formatted as an IMF-fixdate header value.
pub fn http_date() -> HeaderValue {
    let now = unix_second();
    let cached = CURRENT_DATE.load();
    if cached.second == now {
        return cached.value.clone();
    }

    let value = format_date();
    CURRENT_DATE.store(Arc::new(CachedDate { second: now, value: value.clone() }));
    value
}

fn unix_second() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|elapsed| elapsed.as_secs()).unwrap_or_default()
}

fn format_date() -> HeaderValue {
    let mut buf = faf_http_date::get_date_buff_no_key();
    faf_http_date::get_date_no_key(&mut buf);
    let bytes = Bytes::from_owner(buf);
    // SAFETY: faf_http_date only writes visible ASCII characters and spaces into the buffer
    unsafe { HeaderValue::from_maybe_shared_unchecked(bytes) }
}
