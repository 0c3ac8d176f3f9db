//! Internal utility functions.
//!
//! Helpers for pixel-data copying and timestamp conversion shared by the
//! decoder and encoder.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// `bytes_per_pixel` is the number of bytes per pixel for the frame's format
/// (4 for RGBA).
pub fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Copy a tightly-packed buffer into plane 0 of an FFmpeg frame, honouring
/// the frame's stride.
pub fn buffer_to_frame(
    buffer: &[u8],
    video_frame: &mut VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) {
    let stride = video_frame.stride(0);
    let row_len = (width as usize) * bytes_per_pixel;
    let data = video_frame.data_mut(0);
    for row in 0..(height as usize) {
        let src_start = row * row_len;
        let dst_start = row * stride;
        data[dst_start..dst_start + row_len].copy_from_slice(&buffer[src_start..src_start + row_len]);
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator().max(1) as f64
}

/// Frames per second from a rational rate, or `0.0` when undefined.
pub fn rational_to_fps(rate: Rational) -> f64 {
    if rate.denominator() != 0 && rate.numerator() > 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    }
}
