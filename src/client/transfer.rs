//! Artifact retrieval: streaming download with ranged resume.
//!
//! Artifacts can be multi-gigabyte grid files, so the body is streamed to
//! disk chunk by chunk and never buffered whole. The byte count is verified
//! against the size the service reported; a short transfer is an error the
//! caller must act on, never a silent success.

use super::GridFetchClient;
use crate::error::{Error, Result};
use crate::log_sink::format_bytes;
use crate::transport::classify_send_error;
use crate::types::{Job, ResultDescriptor};
use futures::StreamExt;
use reqwest::header;
use std::path::Path;
use std::time::Instant;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

impl GridFetchClient {
    /// Download a completed job's artifact to `dest`, creating or
    /// truncating the file, and return the number of bytes written.
    ///
    /// The count is verified against the service-reported size when one is
    /// present; a mismatch is [`Error::DownloadIncomplete`]. No automatic
    /// retry is performed; the caller decides whether to
    /// [`resume`](GridFetchClient::resume).
    pub async fn download(
        &self,
        job: &mut Job,
        result: &ResultDescriptor,
        dest: &Path,
    ) -> Result<u64> {
        job.offset = 0;
        let file = tokio::fs::File::create(dest).await?;
        self.transfer(job, result, dest, file).await
    }

    /// Resume a partial download, appending to `dest` from `job.offset` via
    /// a ranged request. Used only on explicit retry by the caller.
    pub async fn resume(
        &self,
        job: &mut Job,
        result: &ResultDescriptor,
        dest: &Path,
    ) -> Result<u64> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(dest)
            .await?;
        self.transfer(job, result, dest, file).await
    }

    async fn transfer(
        &self,
        job: &mut Job,
        result: &ResultDescriptor,
        dest: &Path,
        mut file: tokio::fs::File,
    ) -> Result<u64> {
        self.check_cancelled()?;
        let url = self.transport.resolve(&result.location)?;

        let mut request = self.transport.authed(self.transport.http().get(url.clone()));
        if job.offset > 0 {
            request = request.header(header::RANGE, format!("bytes={}-", job.offset));
        }

        match result.size {
            Some(size) => self.sink.emit(&format!(
                "transferring {} to {}",
                format_bytes(size.saturating_sub(job.offset)),
                dest.display()
            )),
            None => self
                .sink
                .emit(&format!("transferring to {}", dest.display())),
        }
        self.sink.emit(&format!("from {url}"));
        tracing::info!(%url, offset = job.offset, "starting transfer");

        let response = request.send().await.map_err(classify_send_error)?;
        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let message = format!("artifact fetch failed: HTTP {code}");
            return if status.is_server_error() || code == 429 {
                Err(Error::TransientTransport {
                    status: Some(code),
                    message,
                })
            } else {
                Err(Error::Transport {
                    status: Some(code),
                    message,
                })
            };
        }

        let started = Instant::now();
        let mut transferred: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            self.check_cancelled()?;
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            transferred += chunk.len() as u64;
            job.offset += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        let elapsed = started.elapsed();
        if !elapsed.is_zero() && transferred > 0 {
            let rate = (transferred as f64 / elapsed.as_secs_f64()) as u64;
            self.sink
                .emit(&format!("transfer rate {}/s", format_bytes(rate)));
        }

        let written = job.offset;
        if let Some(expected) = result.size
            && written != expected
        {
            let error = Error::DownloadIncomplete { expected, written };
            self.sink.emit(&format!("ERROR: {error}"));
            return Err(error);
        }
        tracing::info!(bytes = written, ?elapsed, "transfer complete");
        Ok(written)
    }
}
