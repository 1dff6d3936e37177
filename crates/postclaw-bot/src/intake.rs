//! Media intake validation.

use postclaw_core::MediaKind;
use postclaw_core::config::IntakeConfig;
use thiserror::Error;

const MIB: u64 = 1024 * 1024;

/// Reasons a submission is refused before a session moves on.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Video can't be longer than {max} seconds (got {secs}s). Please send a shorter one.")]
    VideoTooLong { secs: u32, max: u32 },

    #[error("Video can't be larger than {} MB (got {} MB).", .max / MIB, .bytes.div_ceil(MIB))]
    VideoTooLarge { bytes: u64, max: u64 },

    #[error("Could not download media: {0}")]
    Download(String),

    #[error("Upload failed: {0}")]
    Upload(String),
}

/// Checks on what the transport reported, run before anything is fetched.
pub fn check_reported(
    kind: MediaKind,
    duration_secs: Option<u32>,
    size_bytes: Option<u64>,
    limits: &IntakeConfig,
) -> Result<(), IntakeError> {
    if kind != MediaKind::Video {
        return Ok(());
    }
    if let Some(secs) = duration_secs
        && secs > limits.max_video_duration_secs
    {
        return Err(IntakeError::VideoTooLong {
            secs,
            max: limits.max_video_duration_secs,
        });
    }
    if let Some(bytes) = size_bytes {
        check_size(bytes, limits)?;
    }
    Ok(())
}

/// Size check on the downloaded payload.
pub fn check_payload(
    kind: MediaKind,
    payload: &[u8],
    limits: &IntakeConfig,
) -> Result<(), IntakeError> {
    match kind {
        MediaKind::Video => check_size(payload.len() as u64, limits),
        MediaKind::Image => Ok(()),
    }
}

fn check_size(bytes: u64, limits: &IntakeConfig) -> Result<(), IntakeError> {
    if bytes > limits.max_video_bytes {
        return Err(IntakeError::VideoTooLarge {
            bytes,
            max: limits.max_video_bytes,
        });
    }
    Ok(())
}
