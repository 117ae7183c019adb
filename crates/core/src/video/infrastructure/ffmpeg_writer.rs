use std::path::{Path, PathBuf};

use ffmpeg_next::Rational;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::{AudioClip, VideoWriter};

const FALLBACK_FPS: f64 = 30.0;

/// Encodes RGB frames with ffmpeg-next and remuxes a slice of the source's
/// audio into the result on close.
///
/// Prefers libx264 when the linked ffmpeg has it, MPEG-4 Part 2 otherwise.
pub struct FfmpegWriter {
    output_path: Option<PathBuf>,
    audio: Option<AudioClip>,
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    time_base: Rational,
    frame_count: usize,
    video_stream_index: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            output_path: None,
            audio: None,
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            time_base: Rational(1, 30),
            frame_count: 0,
            video_stream_index: 0,
        }
    }

    fn drain_packets(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Err("FfmpegWriter: not opened".into());
        };
        let ost_time_base = octx
            .stream(self.video_stream_index)
            .ok_or("FfmpegWriter: output stream missing")?
            .time_base();

        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.video_stream_index);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn select_codec() -> Result<ffmpeg_next::codec::Codec, Box<dyn std::error::Error>> {
    if let Some(codec) = ffmpeg_next::encoder::find_by_name("libx264") {
        return Ok(codec);
    }
    log::debug!("libx264 unavailable, encoding with MPEG-4");
    ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
        .ok_or_else(|| "No usable video encoder found".into())
}

fn frame_rate(fps: f64) -> Rational {
    let fps = if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        FALLBACK_FPS
    };
    Rational::from(fps)
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
        audio: Option<AudioClip>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut octx = ffmpeg_next::format::output(path)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = select_codec()?;
        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        let rate = frame_rate(metadata.fps);
        let time_base = rate.invert();

        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(rate));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        let video_stream_index = ost.index();

        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        self.width = metadata.width;
        self.height = metadata.height;
        self.time_base = time_base;
        self.output_path = Some(path.to_path_buf());
        self.audio = audio;
        self.video_stream_index = video_stream_index;
        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.frame_count = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if self.encoder.is_none() {
            return Err("FfmpegWriter: not opened".into());
        }
        if frame.width() != self.width || frame.height() != self.height || frame.channels() != 3 {
            return Err(format!(
                "Frame {} is {}x{}x{}, writer expects {}x{}x3",
                frame.index(),
                frame.width(),
                frame.height(),
                frame.channels(),
                self.width,
                self.height
            )
            .into());
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );
        let stride = rgb_frame.stride(0);
        let row_bytes = self.width as usize * 3;
        let dst = rgb_frame.data_mut(0);
        for (row, src_row) in frame.data().chunks_exact(row_bytes).enumerate() {
            dst[row * stride..row * stride + row_bytes].copy_from_slice(src_row);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .as_mut()
            .ok_or("FfmpegWriter: not opened")?
            .run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.frame_count as i64));

        self.encoder
            .as_mut()
            .ok_or("FfmpegWriter: not opened")?
            .send_frame(&yuv_frame)?;
        self.drain_packets()?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_eof()?;
            self.drain_packets()?;
            if let Some(octx) = self.octx.as_mut() {
                octx.write_trailer()?;
            }
        }

        self.octx = None;
        self.encoder = None;
        self.scaler = None;

        if let (Some(clip), Some(output_path)) = (self.audio.take(), self.output_path.take()) {
            mux_audio(&clip, &output_path)?;
        }

        Ok(())
    }
}

/// Remuxes `clip`'s audio packets into `video_output`, shifted so the clip
/// starts at zero. Does nothing when the source has no audio stream.
fn mux_audio(clip: &AudioClip, video_output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut ictx_source = ffmpeg_next::format::input(&clip.source)?;
    let Some(audio_stream) = ictx_source.streams().best(ffmpeg_next::media::Type::Audio) else {
        return Ok(());
    };
    let audio_index = audio_stream.index();
    let audio_time_base = audio_stream.time_base();
    let audio_parameters = audio_stream.parameters();

    let mut ictx_video = ffmpeg_next::format::input(video_output)?;

    let ext = video_output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    let temp_path = video_output.with_extension(format!("mux.{ext}"));

    let result = (|| -> Result<(), Box<dyn std::error::Error>> {
        let mut octx = ffmpeg_next::format::output(&temp_path)?;

        let video_stream = ictx_video
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("Encoded output has no video stream")?;
        let video_in_index = video_stream.index();
        let video_time_base = video_stream.time_base();

        let mut ost = octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
        ost.set_parameters(video_stream.parameters());
        unsafe {
            (*ost.parameters().as_mut_ptr()).codec_tag = 0;
        }
        let video_out_index = ost.index();

        let mut ost = octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
        ost.set_parameters(audio_parameters);
        unsafe {
            (*ost.parameters().as_mut_ptr()).codec_tag = 0;
        }
        let audio_out_index = ost.index();

        octx.write_header()?;

        let video_out_tb = octx
            .stream(video_out_index)
            .ok_or("Muxer dropped the video stream")?
            .time_base();
        for (stream, mut packet) in ictx_video.packets() {
            if stream.index() != video_in_index {
                continue;
            }
            packet.rescale_ts(video_time_base, video_out_tb);
            packet.set_position(-1);
            packet.set_stream(video_out_index);
            packet.write_interleaved(&mut octx)?;
        }

        let audio_out_tb = octx
            .stream(audio_out_index)
            .ok_or("Muxer dropped the audio stream")?
            .time_base();
        let tb_seconds = f64::from(audio_time_base);
        let offset = if tb_seconds > 0.0 {
            (clip.start / tb_seconds).round() as i64
        } else {
            0
        };
        for (stream, mut packet) in ictx_source.packets() {
            if stream.index() != audio_index {
                continue;
            }
            let Some(ts) = packet.pts().or(packet.dts()) else {
                continue;
            };
            let seconds = ts as f64 * tb_seconds;
            if seconds < clip.start || seconds >= clip.end {
                continue;
            }
            packet.set_pts(packet.pts().map(|p| p - offset));
            packet.set_dts(packet.dts().map(|d| d - offset));
            packet.rescale_ts(audio_time_base, audio_out_tb);
            packet.set_position(-1);
            packet.set_stream(audio_out_index);
            packet.write_interleaved(&mut octx)?;
        }

        octx.write_trailer()?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            std::fs::rename(&temp_path, video_output)?;
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::domain::video_reader::VideoReader;
    use crate::video::infrastructure::ffmpeg_reader::test_support::{
        create_test_audio, create_test_video,
    };
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;

    fn metadata(w: u32, h: u32, fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: w,
            height: h,
            fps,
            total_frames: 0,
            duration: 0.0,
            codec: String::new(),
            source_path: None,
        }
    }

    fn solid_frame(index: usize, w: u32, h: u32, value: u8) -> Frame {
        Frame::new(vec![value; (w * h * 3) as usize], w, h, 3, index)
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0), None).unwrap();
        for i in 0..3 {
            writer.write(&solid_frame(i, 160, 120, 128)).unwrap();
        }
        writer.close().unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_open_creates_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0), None).unwrap();
        writer.write(&solid_frame(0, 160, 120, 10)).unwrap();
        writer.close().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_write_without_open_returns_error() {
        let mut writer = FfmpegWriter::new();
        assert!(writer.write(&solid_frame(0, 160, 120, 128)).is_err());
    }

    #[test]
    fn test_write_rejects_mismatched_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0), None).unwrap();
        assert!(writer.write(&solid_frame(0, 80, 60, 0)).is_err());
        writer.close().unwrap();
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0), None).unwrap();
        writer.write(&solid_frame(0, 160, 120, 128)).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_roundtrip_preserves_resolution_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0), None).unwrap();
        for i in 0..3 {
            writer.write(&solid_frame(i, 160, 120, 128)).unwrap();
        }
        writer.close().unwrap();

        let mut reader = FfmpegReader::new();
        let read_meta = reader.open(&path).unwrap();
        assert_eq!((read_meta.width, read_meta.height), (160, 120));

        let frames: Vec<_> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 3);

        // Lossy codec, so only the overall brightness is checked.
        let first = &frames[0];
        let avg: f64 =
            first.data().iter().map(|&b| b as f64).sum::<f64>() / first.data().len() as f64;
        assert!((avg - 128.0).abs() < 40.0, "average {avg} should be near 128");
    }

    #[test]
    fn test_silent_source_audio_clip_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("silent.mp4");
        create_test_video(&source, 10, 160, 120, 30);

        let path = dir.path().join("out.mp4");
        let clip = AudioClip {
            source: source.clone(),
            start: 0.0,
            end: f64::INFINITY,
        };
        let mut writer = FfmpegWriter::new();
        writer
            .open(&path, &metadata(160, 120, 30.0), Some(clip))
            .unwrap();
        writer.write(&solid_frame(0, 160, 120, 50)).unwrap();
        writer.close().unwrap();

        let ictx = ffmpeg_next::format::input(&path).unwrap();
        assert!(ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .is_none());
    }

    /// Timestamps in seconds of every audio packet in `path`, as `(pts, duration)`.
    fn audio_packet_times(path: &Path) -> Vec<(f64, f64)> {
        let mut ictx = ffmpeg_next::format::input(path).unwrap();
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .expect("output has no audio stream");
        let index = stream.index();
        let tb = f64::from(stream.time_base());
        ictx.packets()
            .filter(|(stream, _)| stream.index() == index)
            .filter_map(|(_, packet)| {
                packet
                    .pts()
                    .map(|pts| (pts as f64 * tb, packet.duration() as f64 * tb))
            })
            .collect()
    }

    #[test]
    fn test_windowed_audio_is_cut_and_shifted_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("tone.mp4");
        create_test_audio(&source, 3.0, 44_100);

        let path = dir.path().join("out.mp4");
        let clip = AudioClip {
            source,
            start: 1.0,
            end: 2.0,
        };
        let mut writer = FfmpegWriter::new();
        writer
            .open(&path, &metadata(160, 120, 30.0), Some(clip))
            .unwrap();
        for i in 0..30 {
            writer.write(&solid_frame(i, 160, 120, 90)).unwrap();
        }
        writer.close().unwrap();

        let times = audio_packet_times(&path);
        assert!(!times.is_empty());
        let (first, _) = times[0];
        let (last, last_duration) = times[times.len() - 1];
        assert!(first.abs() < 0.05, "first audio packet at {first}s");
        let span = last + last_duration - first;
        assert!((span - 1.0).abs() < 0.1, "audio spans {span}s, expected ~1s");

        // The video stream survives the remux untouched.
        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        assert_eq!(reader.frames().count(), 30);
    }

    #[test]
    fn test_open_ended_clip_keeps_all_audio() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("tone.mp4");
        create_test_audio(&source, 2.0, 44_100);

        let path = dir.path().join("out.mp4");
        let clip = AudioClip {
            source,
            start: 0.0,
            end: f64::INFINITY,
        };
        let mut writer = FfmpegWriter::new();
        writer
            .open(&path, &metadata(160, 120, 30.0), Some(clip))
            .unwrap();
        writer.write(&solid_frame(0, 160, 120, 90)).unwrap();
        writer.close().unwrap();

        let times = audio_packet_times(&path);
        let (last, last_duration) = times[times.len() - 1];
        assert!(last + last_duration > 1.9, "audio ends at {last}s");
        assert!(!dir.path().join("out.mux.mp4").exists());
    }

    #[test]
    fn test_missing_audio_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        let clip = AudioClip {
            source: dir.path().join("gone.mp4"),
            start: 0.0,
            end: 1.0,
        };
        let mut writer = FfmpegWriter::new();
        writer
            .open(&path, &metadata(160, 120, 30.0), Some(clip))
            .unwrap();
        writer.write(&solid_frame(0, 160, 120, 50)).unwrap();
        assert!(writer.close().is_err());
    }
}
