// crates/stinger-media/src/helpers/hw.rs
//
// Hardware decode device setup and surface download.
//
// The device reference is handed straight to the codec context, which owns
// it from then on and releases it with the decoder. With `hw_device_ctx`
// set, FFmpeg's default get_format picks the hardware surface format when
// the codec supports the device, and software frames otherwise, so callers
// must check every frame with `is_hw_frame`.

use std::ptr;
use tracing::{debug, warn};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::ffi;
use ffmpeg::util::frame::video::Video as VideoFrame;

use stinger_core::error::{Result, StingerError};

#[cfg(windows)]
const DEVICE_TYPE: ffi::AVHWDeviceType = ffi::AVHWDeviceType::AV_HWDEVICE_TYPE_D3D11VA;
#[cfg(target_os = "macos")]
const DEVICE_TYPE: ffi::AVHWDeviceType = ffi::AVHWDeviceType::AV_HWDEVICE_TYPE_VIDEOTOOLBOX;
#[cfg(not(any(windows, target_os = "macos")))]
const DEVICE_TYPE: ffi::AVHWDeviceType = ffi::AVHWDeviceType::AV_HWDEVICE_TYPE_VAAPI;

/// Create the platform device and attach it to `ctx` before the decoder opens.
///
/// Returns `false` (and leaves `ctx` untouched) when no device is available;
/// the session then decodes in software.
pub fn attach_device(ctx: &mut ffmpeg::codec::context::Context) -> bool {
    let mut device: *mut ffi::AVBufferRef = ptr::null_mut();
    let ret = unsafe {
        ffi::av_hwdevice_ctx_create(&mut device, DEVICE_TYPE, ptr::null(), ptr::null_mut(), 0)
    };
    if ret < 0 || device.is_null() {
        warn!("[decode] {DEVICE_TYPE:?} unavailable ({}), decoding in software", ffmpeg::Error::from(ret));
        return false;
    }
    unsafe {
        (*ctx.as_mut_ptr()).hw_device_ctx = device;
    }
    debug!("[decode] attached {DEVICE_TYPE:?} device");
    true
}

/// True when `frame` lives in GPU memory and must be downloaded first.
pub fn is_hw_frame(frame: &VideoFrame) -> bool {
    unsafe { !(*frame.as_ptr()).hw_frames_ctx.is_null() }
}

/// Copy a hardware surface into a system-memory frame (usually NV12).
pub fn download(frame: &VideoFrame) -> Result<VideoFrame> {
    let mut sw = VideoFrame::empty();
    let ret = unsafe { ffi::av_hwframe_transfer_data(sw.as_mut_ptr(), frame.as_ptr(), 0) };
    if ret < 0 {
        return Err(StingerError::Decode(format!(
            "hardware frame transfer: {}",
            ffmpeg::Error::from(ret)
        )));
    }
    Ok(sw)
}
