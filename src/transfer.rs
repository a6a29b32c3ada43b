use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::console::{ProgressSink, Throttle};
use crate::error::SetupError;

const CHUNK_SIZE: usize = 8 * 1024;
const REDRAW_INTERVAL: Duration = Duration::from_millis(100);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct TransferReport {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

pub trait TransferClient: Send + Sync {
    type Source: Read;

    fn open(&self, url: &str) -> Result<TransferStream<Self::Source>, SetupError>;
}

/// An opened response body plus its declared length. Declared length 0 means
/// the server did not announce one; progress rendering is skipped in that
/// case rather than showing a made-up percentage.
pub struct TransferStream<R: Read> {
    reader: R,
    total_bytes: u64,
}

impl<R: Read> TransferStream<R> {
    pub fn new(reader: R, total_bytes: u64) -> Self {
        Self {
            reader,
            total_bytes,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn stream_to(
        mut self,
        destination: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<TransferReport, SetupError> {
        let mut file = File::create(destination).map_err(|err| {
            SetupError::Filesystem(format!("create {}: {err}", destination.display()))
        })?;

        let mut transferred = 0u64;
        let mut buf = [0u8; CHUNK_SIZE];
        let started = Instant::now();
        let mut throttle = Throttle::new(REDRAW_INTERVAL);

        loop {
            let read = self
                .reader
                .read(&mut buf)
                .map_err(|err| SetupError::Http(err.to_string()))?;
            if read == 0 {
                break;
            }
            file.write_all(&buf[..read])
                .map_err(|err| SetupError::Filesystem(err.to_string()))?;
            transferred += read as u64;

            let finished = self.total_bytes > 0 && transferred >= self.total_bytes;
            if finished || throttle.ready() {
                let label = speed_label(transferred, started.elapsed());
                sink.on_progress(transferred, self.total_bytes, &label);
            }
        }

        Ok(TransferReport {
            bytes_transferred: transferred,
            total_bytes: self.total_bytes,
        })
    }
}

#[derive(Clone)]
pub struct HttpTransferClient {
    client: Client,
}

impl HttpTransferClient {
    pub fn new() -> Result<Self, SetupError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("prism-setup/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| SetupError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| SetupError::Http(err.to_string()))?;
        Ok(Self { client })
    }
}

impl TransferClient for HttpTransferClient {
    type Source = reqwest::blocking::Response;

    fn open(&self, url: &str) -> Result<TransferStream<Self::Source>, SetupError> {
        let url = normalize_share_url(url);
        tracing::debug!(%url, "requesting dependency bundle");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| SetupError::Http(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "download request failed".to_string());
            return Err(SetupError::HttpStatus { status, message });
        }
        let total_bytes = response.content_length().unwrap_or(0);
        Ok(TransferStream::new(response, total_bytes))
    }
}

/// Rewrites a sharing-style link so it serves the file bytes instead of an
/// HTML landing page: `dl=0` becomes `dl=1`, and the parameter is appended
/// when absent.
pub fn normalize_share_url(url: &str) -> String {
    if url.contains("dl=0") {
        url.replace("dl=0", "dl=1")
    } else if url.contains("dl=1") {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&dl=1")
    } else {
        format!("{url}?dl=1")
    }
}

fn speed_label(transferred: u64, elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        let mb_per_sec = transferred as f64 / seconds / (1024.0 * 1024.0);
        format!("Downloading ({mb_per_sec:.2} MB/s)")
    } else {
        "Downloading".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        updates: Mutex<Vec<(u64, u64)>>,
    }

    impl ProgressSink for RecordingSink {
        fn on_progress(&self, current: u64, total: u64, _label: &str) {
            self.updates.lock().unwrap().push((current, total));
        }
    }

    #[test]
    fn rewrites_view_link_to_direct_download() {
        assert_eq!(
            normalize_share_url("https://host/f/bundle.zip?rlkey=abc&dl=0"),
            "https://host/f/bundle.zip?rlkey=abc&dl=1"
        );
    }

    #[test]
    fn appends_parameter_when_absent() {
        assert_eq!(
            normalize_share_url("https://host/f/bundle.zip"),
            "https://host/f/bundle.zip?dl=1"
        );
        assert_eq!(
            normalize_share_url("https://host/f/bundle.zip?rlkey=abc"),
            "https://host/f/bundle.zip?rlkey=abc&dl=1"
        );
    }

    #[test]
    fn leaves_direct_link_untouched() {
        let url = "https://host/f/bundle.zip?dl=1";
        assert_eq!(normalize_share_url(url), url);
    }

    #[test]
    fn streams_every_byte_to_disk() {
        let temp = tempfile::tempdir().unwrap();
        let destination = temp.path().join("bundle.zip");
        let payload: Vec<u8> = (0..100_000u32).map(|value| value as u8).collect();
        let total = payload.len() as u64;

        let stream = TransferStream::new(Cursor::new(payload.clone()), total);
        let sink = RecordingSink::default();
        let report = stream.stream_to(&destination, &sink).unwrap();

        assert_eq!(report.bytes_transferred, total);
        assert_eq!(report.total_bytes, total);
        assert_eq!(std::fs::read(&destination).unwrap(), payload);

        let updates = sink.updates.lock().unwrap();
        let mut last = 0u64;
        for (current, reported_total) in updates.iter() {
            assert!(*current >= last, "progress went backwards");
            assert!(*current <= *reported_total);
            last = *current;
        }
        assert_eq!(last, total, "final update must land on the total");
    }

    #[test]
    fn unknown_length_still_transfers() {
        let temp = tempfile::tempdir().unwrap();
        let destination = temp.path().join("bundle.zip");
        let payload = vec![7u8; 20_000];

        let stream = TransferStream::new(Cursor::new(payload.clone()), 0);
        let sink = RecordingSink::default();
        let report = stream.stream_to(&destination, &sink).unwrap();

        assert_eq!(report.bytes_transferred, payload.len() as u64);
        assert_eq!(report.total_bytes, 0);
        assert_eq!(std::fs::read(&destination).unwrap().len(), payload.len());
    }
}
