use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{AnimError, AnimResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::surface::FrameRGBA;

/// Lowest accepted video bitrate.
pub const MIN_BITRATE_KBPS: u32 = 5_000;

/// Output container and its codec.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// WebM with VP9.
    #[default]
    Webm,
    /// MP4 with H.264.
    Mp4,
}

impl Container {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
        }
    }

    fn codec_args(self) -> &'static [&'static str] {
        match self {
            Self::Webm => &[
                "-c:v",
                "libvpx-vp9",
                "-pix_fmt",
                "yuv420p",
                "-deadline",
                "realtime",
                "-row-mt",
                "1",
                "-f",
                "webm",
            ],
            Self::Mp4 => &[
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
                "-f",
                "mp4",
            ],
        }
    }
}

/// Encoder settings from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Output container.
    pub container: Container,
    /// Target video bitrate in kbit/s.
    pub bitrate_kbps: u32,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            container: Container::Webm,
            bitrate_kbps: 8_000,
        }
    }
}

impl EncoderSettings {
    /// Validate the bitrate floor.
    pub fn validate(&self) -> AnimResult<()> {
        if self.bitrate_kbps < MIN_BITRATE_KBPS {
            return Err(AnimError::validation(format!(
                "encoder bitrate_kbps must be >= {MIN_BITRATE_KBPS}, got {}",
                self.bitrate_kbps
            )));
        }
        Ok(())
    }
}

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Final output path.
    pub out_path: PathBuf,
    /// Container and bitrate.
    pub encoder: EncoderSettings,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    /// Options for writing to `out_path` with default encoder settings.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            encoder: EncoderSettings::default(),
            bg_rgba: [255, 255, 255, 255],
        }
    }

    /// Path frames are written to until the encoder finishes.
    pub fn partial_path(&self) -> PathBuf {
        let mut name = self.out_path.clone().into_os_string();
        name.push(".partial");
        PathBuf::from(name)
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to stdin.
///
/// Output goes to a `.partial` file that is renamed into place only after `ffmpeg` exits
/// successfully; `abort` and every failure path remove it.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    fn discard_partial(&self) {
        let partial = self.opts.partial_path();
        if partial.exists()
            && let Err(e) = std::fs::remove_file(&partial)
        {
            tracing::warn!(path = %partial.display(), error = %e, "failed to remove partial output");
        }
    }

    fn fail(&mut self, err: AnimError) -> AnimError {
        self.abort();
        err
    }
}

/// Arguments passed to `ffmpeg` for a session writing to `out`.
pub fn ffmpeg_args(cfg: &SinkConfig, encoder: &EncoderSettings, out: &Path) -> Vec<String> {
    let mut args: Vec<String> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect();
    args.push(format!("{}x{}", cfg.width, cfg.height));
    args.extend(input_fps_args(cfg.fps));
    args.extend(["-i".to_owned(), "pipe:0".to_owned(), "-an".to_owned()]);
    args.extend(encoder.container.codec_args().iter().map(|s| (*s).to_owned()));
    args.extend(["-b:v".to_owned(), format!("{}k", encoder.bitrate_kbps)]);
    args.push(out.display().to_string());
    args
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> AnimResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(AnimError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(AnimError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(AnimError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }
        self.opts.encoder.validate()?;

        ensure_parent_dir(&self.opts.out_path)?;
        if !is_ffmpeg_on_path() {
            return Err(AnimError::encoder(
                "ffmpeg is required for video export, but was not found on PATH",
            ));
        }

        let partial = self.opts.partial_path();
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args(ffmpeg_args(&cfg, &self.opts.encoder, &partial));

        let mut child = cmd.spawn().map_err(|e| {
            AnimError::encoder(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AnimError::encoder("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AnimError::encoder("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(path = %partial.display(), container = ?self.opts.encoder.container, "ffmpeg started");
        self.scratch = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> AnimResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| AnimError::encoder("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(self.fail(AnimError::encoder(
                "ffmpeg sink received out-of-order frame index",
            )));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(self.fail(AnimError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            ))));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(self.fail(AnimError::validation(
                "frame.data size mismatch with width*height*4",
            )));
        }

        if frame.premultiplied {
            flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;
        } else {
            self.scratch.copy_from_slice(&frame.data);
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(AnimError::encoder("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        if let Err(e) = stdin.write_all(&self.scratch) {
            return Err(self.fail(AnimError::encoder(format!(
                "failed to write frame to ffmpeg stdin: {e}"
            ))));
        }
        Ok(())
    }

    fn end(&mut self) -> AnimResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| AnimError::encoder("ffmpeg sink not started"))?;

        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => {
                return Err(self.fail(AnimError::encoder(format!(
                    "failed to wait for ffmpeg to finish: {e}"
                ))));
            }
        };
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle.join().ok().and_then(Result::ok).unwrap_or_default(),
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(self.fail(AnimError::encoder(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            ))));
        }

        let partial = self.opts.partial_path();
        if let Err(e) = std::fs::rename(&partial, &self.opts.out_path) {
            return Err(self.fail(AnimError::encoder(format!(
                "failed to move '{}' into place: {e}",
                partial.display()
            ))));
        }

        self.cfg = None;
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "ffmpeg already exited");
            }
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        self.cfg = None;
        self.discard_partial();
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

fn input_fps_args(fps: Fps) -> [String; 2] {
    // For rawvideo input, `-r` before `-i` sets the input frame rate.
    ["-r".to_owned(), format!("{}/{}", fps.num, fps.den)]
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> AnimResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(AnimError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> AnimResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
