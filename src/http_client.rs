use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::tls::Version;
use std::time::Duration;
use tiered_server::headers::JSON;

const USER_AGENT: HeaderValue = HeaderValue::from_static(concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION")
));

// The spreadsheet web app answers every call with a redirect to the content host.
const MAX_REDIRECTS: usize = 5;

pub(crate) fn json_client(timeout: Duration) -> reqwest::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, JSON);
    headers.insert(CONTENT_TYPE, JSON);
    Client::builder()
        .https_only(true)
        .use_rustls_tls()
        .min_tls_version(Version::TLS_1_3)
        .user_agent(USER_AGENT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .default_headers(headers)
        .deflate(true)
        .gzip(true)
        .brotli(true)
        .zstd(true)
        .connect_timeout(Duration::from_secs(3))
        .timeout(timeout)
        .build()
}
