use crate::error::GatewayError;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Maximum audio input size for transcoding (10 MiB). Prevents OOM from
/// oversized payloads.
const MAX_AUDIO_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for ffmpeg execution.
const TRANSCODE_TIMEOUT: Duration = Duration::from_secs(60);

/// Transcodes browser-recorded audio (typically WebM/Opus) into a 16 kHz
/// mono WAV suitable for the transcription endpoint.
///
/// The input is written to a temporary file because container demuxing needs
/// seekable input; the file is removed on every exit path when the
/// [`tempfile::NamedTempFile`] guard drops. Output is read from ffmpeg's
/// stdout, so no decoded artifact ever touches disk.
pub async fn transcode_to_wav(input: &[u8]) -> Result<Vec<u8>, GatewayError> {
    if input.len() > MAX_AUDIO_INPUT_BYTES {
        return Err(GatewayError::Transcode(format!(
            "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
            input.len(),
            MAX_AUDIO_INPUT_BYTES
        )));
    }

    let temp = tempfile::NamedTempFile::new()
        .map_err(|e| GatewayError::Transcode(format!("failed to create temp file: {}", e)))?;
    tokio::fs::write(temp.path(), input)
        .await
        .map_err(|e| GatewayError::Transcode(format!("failed to write temp file: {}", e)))?;

    let child = Command::new("ffmpeg")
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(temp.path())
        .arg("-f")
        .arg("wav")
        .arg("-ar")
        .arg("16000")
        .arg("-ac")
        .arg("1")
        .arg("pipe:1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| GatewayError::Transcode(format!("failed to spawn ffmpeg: {}", e)))?;

    let output = tokio::time::timeout(TRANSCODE_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| {
            GatewayError::Transcode(format!(
                "ffmpeg timed out after {} seconds",
                TRANSCODE_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| GatewayError::Transcode(format!("failed to wait for ffmpeg: {}", e)))?;

    // The guard lives until here so the input file exists for the whole run.
    drop(temp);

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GatewayError::Transcode(format!(
            "ffmpeg failed: {}",
            stderr
        )));
    }

    Ok(output.stdout)
}
