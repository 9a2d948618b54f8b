use anyhow::{Context, Result, anyhow};
use log::{debug, error};
use serde_json::{Value, from_str};
use std::fs;
use std::path::Path;
use tokio::process::Command;

// @module: ffmpeg/ffprobe wrappers for audio extraction and probing

/// Sample rate the recognizer expects
pub const SAMPLE_RATE: u32 = 16_000;

/// Basic facts about a media file's audio
#[derive(Debug, Clone)]
pub struct MediaInfo {
    /// Duration of the media in seconds
    pub duration_secs: f64,
    /// Size of the media file in bytes
    pub file_size: u64,
}

/// Probe a media file for duration and size
pub async fn probe_media<P: AsRef<Path>>(path: P) -> Result<MediaInfo> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(anyhow!("Media file not found: {:?}", path));
    }

    let ffprobe_future = Command::new("ffprobe")
        .args([
            "-v", "error",
            "-show_entries", "format=duration",
            "-of", "json",
            path.to_str().unwrap_or_default(),
        ])
        .output();

    let timeout_duration = std::time::Duration::from_secs(60);
    let output = tokio::select! {
        result = ffprobe_future => {
            result.map_err(|e| anyhow!("Failed to execute ffprobe command: {}", e))?
        },
        _ = tokio::time::sleep(timeout_duration) => {
            return Err(anyhow!("ffprobe command timed out after 60 seconds"));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("ffprobe failed: {}", stderr);
        return Err(anyhow!("ffprobe command failed: {}", stderr));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: Value = from_str(&stdout).context("Failed to parse ffprobe JSON output")?;

    let duration_secs = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| d.as_str())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| anyhow!("ffprobe output has no duration for {:?}", path))?;

    let file_size = fs::metadata(path)?.len();

    Ok(MediaInfo {
        duration_secs,
        file_size,
    })
}

/// Extract the audio track as raw 16 kHz mono signed 16-bit PCM.
///
/// The raw stream (no container) keeps loading trivial: every 2 bytes are
/// one sample.
pub async fn extract_audio<P1: AsRef<Path>, P2: AsRef<Path>>(video_path: P1, audio_path: P2) -> Result<()> {
    let video_path = video_path.as_ref();
    let audio_path = audio_path.as_ref();

    if !video_path.exists() {
        return Err(anyhow!("Video file not found: {:?}", video_path));
    }

    let ffmpeg_future = Command::new("ffmpeg")
        .args([
            "-y",                       // Overwrite existing file
            "-i", video_path.to_str().unwrap_or_default(),
            "-vn",                      // No video
            "-acodec", "pcm_s16le",     // PCM 16-bit
            "-ar", "16000",             // 16kHz sample rate
            "-ac", "1",                 // Mono
            "-f", "s16le",              // Raw output, no container
            audio_path.to_str().unwrap_or_default(),
        ])
        .output();

    let timeout_duration = std::time::Duration::from_secs(300);
    let result = tokio::select! {
        result = ffmpeg_future => {
            result.map_err(|e| anyhow!("Failed to execute ffmpeg command for audio extraction: {}", e))?
        },
        _ = tokio::time::sleep(timeout_duration) => {
            return Err(anyhow!("ffmpeg command timed out after 5 minutes"));
        }
    };

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        let filtered = filter_ffmpeg_stderr(&stderr);
        error!("Audio extraction failed: {}", filtered);
        return Err(anyhow!("ffmpeg extraction failed: {}", filtered));
    }

    let size = fs::metadata(audio_path).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err(anyhow!("Audio extraction produced an empty file"));
    }

    debug!("Extracted {} bytes of raw audio", size);
    Ok(())
}

/// Load raw s16le samples into the f32 buffer the recognizer consumes
pub fn load_samples<P: AsRef<Path>>(audio_path: P) -> Result<Vec<f32>> {
    let bytes = fs::read(audio_path.as_ref())
        .with_context(|| format!("Failed to read audio file: {:?}", audio_path.as_ref()))?;

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32_768.0)
        .collect();

    Ok(samples)
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let dominated_prefixes = [
        "ffmpeg version",
        "  built with",
        "  configuration:",
        "  lib",
        "Input #",
        "  Metadata:",
        "  Duration:",
        "  Stream #",
        "      Metadata:",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return false;
            }
            !dominated_prefixes.iter().any(|p| line.starts_with(p))
        })
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
