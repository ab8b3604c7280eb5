// crates/stinger-media/src/helpers/seek.rs
//
// Rewind helper for restarting a stinger from its first frame.
//
// `avformat_seek_file(max_ts = 0)` returns EPERM on Windows for some
// freshly-opened contexts, and some containers refuse random access
// entirely. The caller decides what to do on failure; the decode session
// reopens the container, which always lands on frame 0.

use tracing::warn;

use ffmpeg_the_third as ffmpeg;

/// Seek `ictx` to the keyframe at or before position 0.
///
/// Returns `false` when the demuxer refused the seek.
pub fn rewind(ictx: &mut ffmpeg::format::context::Input, label: &str) -> bool {
    match ictx.seek(0, ..=0) {
        Ok(()) => true,
        Err(e) => {
            warn!("[seek] rewind refused in {label}: {e}");
            false
        }
    }
}
