//! libcurl range GET: one Easy handle per request, body collected in memory.

use std::time::Duration;

use super::{FetchError, RangeFetcher};
use crate::range::ByteRange;

/// Per-request curl settings.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Abort when throughput stays below this many bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    /// Hard wall-clock limit per request.
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            timeout: Duration::from_secs(600),
            user_agent: None,
        }
    }
}

/// Fetches ranges of one URL with libcurl. Cheap to share across workers.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    url: String,
    options: CurlOptions,
}

impl CurlFetcher {
    pub fn new(url: impl Into<String>, options: CurlOptions) -> Self {
        Self {
            url: url.into(),
            options,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn configure(&self, easy: &mut curl::easy::Easy, range: ByteRange) -> Result<(), curl::Error> {
        easy.url(&self.url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.options.connect_timeout)?;
        easy.low_speed_limit(self.options.low_speed_limit)?;
        easy.low_speed_time(self.options.low_speed_time)?;
        easy.timeout(self.options.timeout)?;
        if let Some(ua) = &self.options.user_agent {
            easy.useragent(ua)?;
        }
        easy.range(&range.curl_range())?;
        Ok(())
    }
}

impl RangeFetcher for CurlFetcher {
    fn fetch(&self, range: ByteRange) -> Result<Vec<u8>, FetchError> {
        let expected = range.len();
        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, range)?;

        let mut body: Vec<u8> = Vec::with_capacity(expected as usize);
        let mut received = 0u64;
        let mut overflow = false;
        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                received += data.len() as u64;
                // Stop early instead of buffering a full body the server sent
                // in place of the requested range.
                if received > expected {
                    overflow = true;
                    return Ok(0);
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()
        };

        let code = easy.response_code()?;
        if let Err(e) = performed {
            if !(overflow && e.is_write_error()) {
                return Err(FetchError::Curl(e));
            }
        }
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        if code != 206 && !(range.start == 0 && !overflow) {
            return Err(FetchError::RangeIgnored(code));
        }
        if overflow {
            return Err(FetchError::PartialTransfer { expected, received });
        }

        tracing::trace!(range = %range, code, "range fetched");
        Ok(body)
    }
}
