//! ffmpeg-based compression, clipping and segmentation.

use super::{file_size_mb, size_limit_seconds, AudioSegment, MediaTools, EMERGENCY_BITRATE};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Container used when re-encoding a file for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Mp3,
    Wav,
}

impl UploadFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            UploadFormat::Mp3 => "mp3",
            UploadFormat::Wav => "wav",
        }
    }
}

/// Plan fixed-length segments covering `duration` seconds.
///
/// Returns `(index, start, end)` triples; the last segment may be shorter.
pub fn segment_plan(duration: f64, segment_seconds: f64) -> Vec<(usize, f64, f64)> {
    if duration <= 0.0 || segment_seconds <= 0.0 {
        return Vec::new();
    }

    let count = (duration / segment_seconds).ceil() as usize;
    (0..count)
        .map(|i| {
            let start = i as f64 * segment_seconds;
            let end = (start + segment_seconds).min(duration);
            (i, start, end)
        })
        .collect()
}

impl MediaTools {
    /// Compress to mono 16 kHz MP3 at the given bitrate.
    #[instrument(skip(self))]
    pub async fn compress_audio(&self, input: &Path, output: &Path, bitrate: &str) -> Result<()> {
        info!("Compressing audio at {}", bitrate);
        self.ffmpeg(
            &[
                "-i",
                &path_arg(input),
                "-vn",
                "-ac",
                "1",
                "-ar",
                "16000",
                "-b:a",
                bitrate,
                &path_arg(output),
            ],
            "Audio compression",
        )
        .await
    }

    /// Keep only the first `seconds` of the audio.
    #[instrument(skip(self))]
    pub async fn clip_audio(
        &self,
        input: &Path,
        output: &Path,
        seconds: f64,
        bitrate: &str,
    ) -> Result<()> {
        info!("Clipping audio to {:.0}s", seconds);
        self.ffmpeg(
            &[
                "-i",
                &path_arg(input),
                "-t",
                &format!("{:.3}", seconds),
                "-ac",
                "1",
                "-ar",
                "16000",
                "-b:a",
                bitrate,
                &path_arg(output),
            ],
            "Audio clipping",
        )
        .await
    }

    /// Bring a file under the upload limit.
    ///
    /// Files more than twice the limit are first re-encoded at a very low
    /// bitrate; if that is still too large the audio is clipped to the longest
    /// duration that fits at `bitrate`. Returns the path to upload.
    #[instrument(skip(self))]
    pub async fn trim_to_size_limit(
        &self,
        input: &Path,
        output: &Path,
        bitrate: &str,
        max_mb: u32,
    ) -> Result<PathBuf> {
        let size_mb = file_size_mb(input)?;
        let max = f64::from(max_mb);

        if size_mb <= max {
            return Ok(input.to_path_buf());
        }

        if size_mb > max * 2.0 {
            warn!(
                "Audio is {:.1}MB, re-encoding at {} before clipping",
                size_mb, EMERGENCY_BITRATE
            );
            self.compress_audio(input, output, EMERGENCY_BITRATE).await?;

            let reduced_mb = file_size_mb(output)?;
            if reduced_mb <= max {
                info!("Low-bitrate encode fits at {:.1}MB", reduced_mb);
                return Ok(output.to_path_buf());
            }
        }

        let limit = size_limit_seconds(bitrate, max_mb)?;
        warn!(
            "Audio exceeds {}MB, keeping only the first {} seconds",
            max_mb, limit
        );
        self.clip_audio(input, output, limit as f64, bitrate).await?;

        Ok(output.to_path_buf())
    }

    /// Cut a single planned segment out of the source audio.
    pub async fn extract_segment(
        &self,
        input: &Path,
        segment: &AudioSegment,
        bitrate: &str,
    ) -> Result<()> {
        let length = segment.end_seconds - segment.start_seconds;
        self.ffmpeg(
            &[
                "-ss",
                &format!("{:.3}", segment.start_seconds),
                "-i",
                &path_arg(input),
                "-t",
                &format!("{:.3}", length),
                "-ac",
                "1",
                "-ar",
                "16000",
                "-b:a",
                bitrate,
                &path_arg(&segment.path),
            ],
            "Segment extraction",
        )
        .await
    }

    /// Re-encode a file into a widely accepted upload format.
    #[instrument(skip(self))]
    pub async fn reencode_for_upload(
        &self,
        input: &Path,
        output: &Path,
        format: UploadFormat,
    ) -> Result<()> {
        let input_arg = path_arg(input);
        let output_arg = path_arg(output);

        match format {
            UploadFormat::Mp3 => {
                self.ffmpeg(
                    &[
                        "-i",
                        &input_arg,
                        "-vn",
                        "-ac",
                        "1",
                        "-ar",
                        "16000",
                        "-codec:a",
                        "libmp3lame",
                        "-b:a",
                        "64k",
                        &output_arg,
                    ],
                    "MP3 re-encode",
                )
                .await
            }
            UploadFormat::Wav => {
                self.ffmpeg(
                    &[
                        "-i",
                        &input_arg,
                        "-vn",
                        "-ac",
                        "1",
                        "-ar",
                        "16000",
                        "-codec:a",
                        "pcm_s16le",
                        &output_arg,
                    ],
                    "WAV re-encode",
                )
                .await
            }
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
