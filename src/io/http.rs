use reqwest::Client;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

use anyhow::{Result, anyhow, bail};

/// HTTP Range reader for remote ZIP files.
///
/// Exposes the remote object as a blocking `Read + Seek` source so it can
/// be handed to the parser like a local file. Each `read` issues one Range
/// request; wrap it in a `BufReader` to coalesce small header reads.
pub struct HttpRangeReader {
    runtime: Runtime,
    client: Client,
    url: String,
    size: u64,
    position: u64,
    transferred_bytes: AtomicU64,
    max_retry: u32,
}

impl HttpRangeReader {
    /// Create a new HTTP Range reader
    ///
    /// This will send a HEAD request to verify Range support and get file size
    pub fn new(url: String) -> Result<Self> {
        install_crypto_provider();
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let resp = runtime.block_on(client.head(&url).send())?;

        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        let accept_ranges = resp
            .headers()
            .get("accept-ranges")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");

        if !accept_ranges.contains("bytes") {
            bail!("Remote server does not support Range requests");
        }

        let size = resp
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))?;

        log::debug!("remote archive {} is {} bytes", url, size);

        Ok(Self {
            runtime,
            client,
            url,
            size,
            position: 0,
            transferred_bytes: AtomicU64::new(0),
            max_retry: 10,
        })
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// Total size of the remote object.
    pub fn size(&self) -> u64 {
        self.size
    }

    fn fetch_range(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let expected_size = (end - offset + 1) as usize;

        let mut received = 0;
        let mut retry_count = 0;

        while received < expected_size {
            let current_start = offset + received as u64;
            let range = format!("bytes={}-{}", current_start, end);

            let result = self.runtime.block_on(async {
                let resp = self
                    .client
                    .get(&self.url)
                    .header("Range", &range)
                    .send()
                    .await?;
                if resp.status() != reqwest::StatusCode::PARTIAL_CONTENT {
                    return Ok::<_, reqwest::Error>(Err(resp.status()));
                }
                resp.bytes().await.map(Ok)
            });

            match result {
                Ok(Ok(bytes)) => {
                    if bytes.is_empty() {
                        bail!("Server returned an empty body for range {}", range);
                    }
                    let chunk_len = bytes.len().min(expected_size - received);
                    buf[received..received + chunk_len].copy_from_slice(&bytes[..chunk_len]);
                    received += chunk_len;

                    self.transferred_bytes
                        .fetch_add(chunk_len as u64, Ordering::Relaxed);
                }
                Ok(Err(status)) => bail!("HTTP request failed with status: {}", status),
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        bail!("Max retries exceeded");
                    }
                    log::warn!(
                        "Connection error, retry {}/{}: {}",
                        retry_count,
                        self.max_retry,
                        e
                    );
                    std::thread::sleep(Duration::from_millis(500 * retry_count as u64));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(received)
    }
}

/// Install ring as the process-wide TLS crypto provider, matching the
/// backend `reqwest` is built with. Later calls are no-ops.
fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok()
    {
        log::debug!("installed ring TLS crypto provider");
    }
}

/// Resolve a seek request against the current position and object size.
///
/// Returns `None` for targets before the start or beyond `u64::MAX`.
/// Targets past the end are allowed, as for files; reads there return 0.
fn seek_target(pos: SeekFrom, position: u64, size: u64) -> Option<u64> {
    match pos {
        SeekFrom::Start(offset) => Some(offset),
        SeekFrom::End(delta) => size.checked_add_signed(delta),
        SeekFrom::Current(delta) => position.checked_add_signed(delta),
    }
}

impl Read for HttpRangeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self
            .fetch_range(self.position, buf)
            .map_err(io::Error::other)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for HttpRangeReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match seek_target(pos, self.position, self.size) {
            Some(offset) => {
                self.position = offset;
                Ok(offset)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}
