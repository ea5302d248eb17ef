//! Audio download through yt-dlp.

use super::{tool_error, MediaTools};
use crate::error::{AssistantError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

impl MediaTools {
    /// Download the audio track of a video as MP3.
    ///
    /// Browser cookies are used when configured; a cookie failure falls back to
    /// an anonymous download. An existing file for the key is reused.
    #[instrument(skip(self, output_dir))]
    pub async fn download_audio(&self, url: &str, key: &str, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let target_path = output_dir.join(format!("{}.mp3", key));
        if target_path.exists() {
            info!("Using cached audio file");
            return Ok(target_path);
        }

        info!("Downloading audio from {}", url);
        let template = output_dir.join(format!("{}.%(ext)s", key));

        match self.run_ytdlp(url, &template, self.cookies_browser.as_deref()).await {
            Ok(()) => {}
            Err(AssistantError::AudioDownload(msg))
                if self.cookies_browser.is_some() && mentions_cookies(&msg) =>
            {
                warn!("Cookie extraction failed, retrying without browser cookies");
                self.run_ytdlp(url, &template, None).await?;
            }
            Err(e) => return Err(e),
        }

        let downloaded = find_audio_file(output_dir, key)
            .ok_or_else(|| AssistantError::AudioNotFound(url.to_string()))?;

        if downloaded != target_path {
            std::fs::rename(&downloaded, &target_path)?;
        }

        // A zero-length or truncated file fails here rather than at the API
        self.probe_duration(&target_path).await.map_err(|e| {
            let _ = std::fs::remove_file(&target_path);
            AssistantError::AudioDownload(format!("Downloaded audio is not readable: {}", e))
        })?;

        debug!("Audio saved to {:?}", target_path);
        Ok(target_path)
    }

    async fn run_ytdlp(&self, url: &str, template: &Path, cookies: Option<&str>) -> Result<()> {
        let mut command = Command::new(&self.ytdlp);
        command
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg("0")
            .arg("--output")
            .arg(template)
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings");

        if let Some(browser) = cookies {
            command.arg("--cookies-from-browser").arg(browser);
        }

        let output = command
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| tool_error(&self.ytdlp, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AssistantError::AudioDownload(format!(
                "yt-dlp failed: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }
}

fn mentions_cookies(message: &str) -> bool {
    message.to_lowercase().contains("cookie")
}

/// Locate a downloaded audio file by key.
fn find_audio_file(dir: &Path, key: &str) -> Option<PathBuf> {
    for ext in ["mp3", "m4a", "opus", "webm", "ogg"] {
        let candidate = dir.join(format!("{}.{}", key, ext));
        if candidate.exists() {
            return Some(candidate);
        }
    }

    std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().starts_with(key))
                .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_cookies() {
        assert!(mentions_cookies(
            "yt-dlp failed: ERROR: could not find chrome Cookies database"
        ));
        assert!(!mentions_cookies("yt-dlp failed: HTTP Error 403"));
    }

    #[test]
    fn test_find_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_audio_file(dir.path(), "abc").is_none());

        std::fs::write(dir.path().join("abc.m4a"), b"audio").unwrap();
        assert_eq!(
            find_audio_file(dir.path(), "abc"),
            Some(dir.path().join("abc.m4a"))
        );
    }

    #[tokio::test]
    async fn test_cached_download_reused() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("abc.mp3");
        std::fs::write(&existing, b"audio").unwrap();

        let tools = MediaTools {
            ffmpeg: "ffmpeg".into(),
            ffprobe: "ffprobe".into(),
            ytdlp: "yt-dlp-does-not-exist".into(),
            cookies_browser: None,
        };

        let path = tools
            .download_audio("https://youtu.be/abc", "abc", dir.path())
            .await
            .unwrap();
        assert_eq!(path, existing);
    }
}
