use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::shared::frame::Frame;
use crate::video::domain::image_reader::ImageReader;

/// Decodes still images (JPEG, PNG) through ffmpeg into RGB24 frames.
///
/// ffmpeg is noticeably faster than the pure-Rust decoders on large photos.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No image data found")?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(format!("Image {} has no pixels", path.display()).into());
        }

        let mut scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )?;

        decode_first_frame(&mut ictx, &mut decoder, &mut scaler, stream_index)
    }
}

fn decode_first_frame(
    ictx: &mut Input,
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut scaling::Context,
    stream_index: usize,
) -> Result<Frame, Box<dyn std::error::Error>> {
    for (stream, packet) in ictx.packets() {
        if stream.index() != stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        if let Some(frame) = try_receive_frame(decoder, scaler)? {
            return Ok(frame);
        }
    }

    // Some formats only release their single frame on flush.
    let _ = decoder.send_eof();
    try_receive_frame(decoder, scaler)?.ok_or_else(|| "Failed to decode image".into())
}

fn try_receive_frame(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut scaling::Context,
) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
    let mut decoded = Video::empty();
    if decoder.receive_frame(&mut decoded).is_err() {
        return Ok(None);
    }
    let mut rgb = Video::empty();
    scaler.run(&decoded, &mut rgb)?;
    let (width, height) = (rgb.width(), rgb.height());
    Ok(Some(Frame::new(
        packed_rgb_pixels(&rgb),
        width,
        height,
        3,
        0,
    )))
}

/// Strips per-row stride padding from an RGB24 ffmpeg frame.
pub(crate) fn packed_rgb_pixels(rgb: &Video) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_bytes = rgb.width() as usize * 3;
    let h = rgb.height() as usize;

    let mut pixels = Vec::with_capacity(row_bytes * h);
    for row in 0..h {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
