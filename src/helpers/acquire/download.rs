//! Single-source downloads
//!
//! Fetches one URL to one file. No retry here; fallback across sources lives
//! in `fallback`.

use crate::core::config::HttpSettings;
use crate::core::error::{Result, SetupError};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use super::super::internal::fs_utils;
use super::super::internal::progress::{self, ProgressGuard, upgrade_to_bytes};

/// Smallest chunk written per iteration when the body size is known (1 MiB).
const MIN_CHUNK_SIZE: u64 = 1024 * 1024;

/// Fetches a URL into a local file.
pub trait Downloader {
    /// Download `url` to `dest`, creating parent directories and overwriting
    /// any existing file. Returns the number of bytes written.
    ///
    /// On error, `dest` may hold partial content; the caller removes it.
    fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Chunk size for a body of `total` bytes: `max(total / 1000, 1 MiB)`.
///
/// `None` when the size is unknown, meaning the body is written in one go.
pub fn chunk_size(total: Option<u64>) -> Option<usize> {
    total.map(|t| (t / 1000).max(MIN_CHUNK_SIZE) as usize)
}

/// Blocking HTTP(S) downloader.
pub struct HttpDownloader {
    agent: ureq::Agent,
}

impl HttpDownloader {
    pub fn new(settings: &HttpSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(settings.connect_timeout)
            .timeout_read(settings.read_timeout)
            .user_agent(&settings.user_agent)
            .build();
        Self { agent }
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        fs_utils::ensure_parent_dir(dest)?;

        let filename = dest
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "download".to_string());
        let pb = progress::create_spinner(&format!("downloading {}", filename));
        let _guard = ProgressGuard::new(&pb);

        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, e))?;

        let total = response
            .header("content-length")
            .and_then(|s| s.trim().parse::<u64>().ok());

        let mut reader = response.into_reader();
        let mut file = File::create(dest)?;

        let written = match (total, chunk_size(total)) {
            (Some(total), Some(chunk)) => {
                upgrade_to_bytes(&pb, total);
                // The reader fails on a body shorter than its Content-Length.
                stream_chunks(&mut reader, &mut file, chunk, |n| pb.set_position(n))
                    .map_err(|e| e.with_url(url))?
            }
            _ => {
                let mut body = Vec::new();
                reader
                    .read_to_end(&mut body)
                    .map_err(|e| transport(url, &e))?;
                file.write_all(&body)?;
                body.len() as u64
            }
        };

        file.flush()?;
        Ok(written)
    }
}

/// Failure while streaming: either side of the copy.
enum StreamError {
    Read(std::io::Error),
    Write(std::io::Error),
}

impl StreamError {
    fn with_url(self, url: &str) -> SetupError {
        match self {
            Self::Read(e) => transport(url, &e),
            Self::Write(e) => SetupError::Io(e),
        }
    }
}

/// Copy `reader` to `writer` in chunks of `chunk` bytes, reporting the
/// running total after each write.
fn stream_chunks(
    reader: &mut impl Read,
    writer: &mut impl Write,
    chunk: usize,
    mut on_progress: impl FnMut(u64),
) -> std::result::Result<u64, StreamError> {
    let mut buffer = vec![0u8; chunk];
    let mut total = 0u64;

    loop {
        let mut filled = 0;
        while filled < chunk {
            let n = reader
                .read(&mut buffer[filled..])
                .map_err(StreamError::Read)?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            break;
        }

        writer
            .write_all(&buffer[..filled])
            .map_err(StreamError::Write)?;
        total += filled as u64;
        on_progress(total);

        if filled < chunk {
            break;
        }
    }

    Ok(total)
}

fn transport(url: &str, e: &std::io::Error) -> SetupError {
    SetupError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    }
}

fn map_ureq_error(url: &str, e: ureq::Error) -> SetupError {
    match e {
        ureq::Error::Status(status, _) => SetupError::HttpStatus {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(t) => SetupError::Transport {
            url: url.to_string(),
            message: t.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_chunk_size_floor_is_one_mib() {
        assert_eq!(chunk_size(Some(10)), Some(1024 * 1024));
        assert_eq!(chunk_size(Some(500 * 1024 * 1024)), Some(1024 * 1024));
    }

    #[test]
    fn test_chunk_size_scales_with_total() {
        let total = 4_000_000_000u64;
        assert_eq!(chunk_size(Some(total)), Some(4_000_000));
    }

    #[test]
    fn test_chunk_size_unknown_total() {
        assert_eq!(chunk_size(None), None);
    }

    #[test]
    fn test_stream_chunks_copies_everything() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut reader = Cursor::new(data.clone());
        let mut out = Vec::new();
        let mut reports = Vec::new();

        let total = stream_chunks(&mut reader, &mut out, 4096, |n| reports.push(n)).ok();

        assert_eq!(total, Some(10_000));
        assert_eq!(out, data);
        assert_eq!(reports, vec![4096, 8192, 10_000]);
    }

    #[test]
    fn test_stream_chunks_empty_body() {
        let mut reader = Cursor::new(Vec::<u8>::new());
        let mut out = Vec::new();
        let total = stream_chunks(&mut reader, &mut out, 1024, |_| {}).ok();
        assert_eq!(total, Some(0));
        assert!(out.is_empty());
    }

    mod mock_tests {
        use super::*;
        use crate::core::config::BROWSER_USER_AGENT;
        use tempfile::tempdir;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn downloader() -> HttpDownloader {
            HttpDownloader::new(&HttpSettings::default())
        }

        #[tokio::test]
        async fn test_download_writes_body_and_parents() {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/SDL2-devel-2.26.5-VC.zip"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04fake".to_vec()))
                .mount(&mock_server)
                .await;

            let temp = tempdir().unwrap();
            let dest = temp.path().join("external/SDL2-2.26.5.zip");
            let url = format!("{}/SDL2-devel-2.26.5-VC.zip", mock_server.uri());

            let written = downloader().download(&url, &dest).unwrap();

            assert_eq!(written, 8);
            assert_eq!(std::fs::read(&dest).unwrap(), b"PK\x03\x04fake");
        }

        #[tokio::test]
        async fn test_download_sends_browser_user_agent() {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
                .mount(&mock_server)
                .await;

            let temp = tempdir().unwrap();
            let url = format!("{}/SDL2_ttf-devel-2.20.2-VC.zip", mock_server.uri());
            downloader()
                .download(&url, &temp.path().join("SDL2_ttf-2.20.2.zip"))
                .unwrap();

            // Compared as a whole: the value contains commas.
            let requests = mock_server.received_requests().await.unwrap();
            assert_eq!(requests.len(), 1);
            let user_agent = requests[0]
                .headers
                .get("user-agent")
                .and_then(|v| v.to_str().ok());
            assert_eq!(user_agent, Some(BROWSER_USER_AGENT));
        }

        #[tokio::test]
        async fn test_download_overwrites_existing_file() {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/lib.zip"))
                .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
                .mount(&mock_server)
                .await;

            let temp = tempdir().unwrap();
            let dest = temp.path().join("lib.zip");
            std::fs::write(&dest, "stale partial content from a killed run").unwrap();

            let url = format!("{}/lib.zip", mock_server.uri());
            downloader().download(&url, &dest).unwrap();

            assert_eq!(std::fs::read_to_string(&dest).unwrap(), "fresh");
        }

        #[tokio::test]
        async fn test_download_status_error() {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/missing.zip"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&mock_server)
                .await;

            let temp = tempdir().unwrap();
            let dest = temp.path().join("missing.zip");
            let url = format!("{}/missing.zip", mock_server.uri());

            let err = downloader().download(&url, &dest).unwrap_err();
            assert!(matches!(err, SetupError::HttpStatus { status: 404, .. }));
        }

        #[test]
        fn test_download_transport_error() {
            // Bind then drop to get a local port nobody is listening on.
            let port = std::net::TcpListener::bind("127.0.0.1:0")
                .unwrap()
                .local_addr()
                .unwrap()
                .port();

            let temp = tempdir().unwrap();
            let dest = temp.path().join("lib.zip");
            let url = format!("http://127.0.0.1:{}/lib.zip", port);

            let err = downloader().download(&url, &dest).unwrap_err();
            assert!(matches!(err, SetupError::Transport { .. }));
            assert!(err.is_source_failure());
        }

        #[test]
        fn test_download_short_body_is_transport_error() {
            use std::io::{BufRead, BufReader, Write};

            // Promises 100 bytes, sends 10, then hangs up.
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            let port = listener.local_addr().unwrap().port();
            let server = std::thread::spawn(move || {
                let (stream, _) = listener.accept().unwrap();
                let mut request = BufReader::new(stream);
                let mut line = String::new();
                while request.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                    line.clear();
                }
                let mut stream = request.into_inner();
                stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\n0123456789")
                    .unwrap();
            });

            let temp = tempdir().unwrap();
            let dest = temp.path().join("SDL2_image-2.6.3.zip");
            let url = format!("http://127.0.0.1:{}/SDL2_image-devel-2.6.3-VC.zip", port);

            let err = downloader().download(&url, &dest).unwrap_err();
            server.join().unwrap();

            assert!(matches!(err, SetupError::Transport { .. }));
            assert!(err.is_source_failure());
        }
    }
}
