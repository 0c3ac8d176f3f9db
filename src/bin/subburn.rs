use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use subburn::{
    BurnJob, BurnOptions, Cue, Effect, EncoderOptions, FfmpegLogLevel, FileEncoderFactory,
    FontSource, FrameSource, MediaSource, Paint, ProgressCallback, ProgressInfo, SubtitleStyle,
    VideoCodec, extract_embedded_cues_with_options, find_active_cue, format_srt, format_timecode,
    format_vtt, parse_srt, parse_timecode,
};
use tracing_subscriber::EnvFilter;

const CLI_AFTER_HELP: &str = "Examples:\n  subburn burn input.mp4 --subs captions.srt --out output.mp4 --progress\n  subburn burn input.mkv --embedded --out output.webm --effect glow\n  subburn probe input.mp4 --json\n  subburn cues captions.srt --at 00:01:02,500\n  subburn extract-subs input.mkv --out captions.vtt\n  subburn completions zsh > _subburn";

#[derive(Debug, Parser)]
#[command(
    name = "subburn",
    version,
    about = "Burn subtitles permanently into video frames",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Default, clap::Args)]
struct StyleArgs {
    /// JSON style file; the flags below override its fields.
    #[arg(long)]
    style: Option<PathBuf>,
    /// Font file to draw text with instead of a system font.
    #[arg(long)]
    font: Option<PathBuf>,
    /// CSS-style font family list, e.g. "Inter, Arial, sans-serif".
    #[arg(long)]
    font_family: Option<String>,
    /// Font size in pixels at 600 px frame height.
    #[arg(long)]
    font_size: Option<f32>,
    /// Text colour (#rrggbb, rgba(...), named colour).
    #[arg(long)]
    color: Option<String>,
    /// Background box colour, or "transparent" for none.
    #[arg(long)]
    background: Option<String>,
    /// Text effect (outline, shadow, glow, none).
    #[arg(long)]
    effect: Option<String>,
    /// Baseline distance from the bottom edge, in percent of frame height.
    #[arg(long)]
    position: Option<f32>,
    /// Overlay opacity from 0 to 1.
    #[arg(long)]
    opacity: Option<f32>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Burn subtitles into a video.
    #[command(
        about = "Burn subtitles into a video",
        after_help = "Examples:\n  subburn burn input.mp4 --subs captions.srt --out output.mp4\n  subburn burn input.mp4 --subs captions.vtt --out output.mp4 --codec h264 --bitrate 8000000"
    )]
    Burn {
        /// Input video path.
        input: PathBuf,
        /// SubRip or WebVTT file with the cues to burn.
        #[arg(long, conflicts_with = "embedded", required_unless_present = "embedded")]
        subs: Option<PathBuf>,
        /// Burn the input's own text subtitle stream.
        #[arg(long)]
        embedded: bool,
        /// Output video path; the container follows the extension.
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        style_args: StyleArgs,
        /// Comma-separated codec preference (h265, h264, vp9, vp8, mpeg4).
        #[arg(long)]
        codec: Option<String>,
        /// Target bitrate in bits per second.
        #[arg(long)]
        bitrate: Option<usize>,
        /// Output frame rate.
        #[arg(long)]
        fps: Option<u32>,
        /// Constant Rate Factor for encoders that support it.
        #[arg(long)]
        crf: Option<u32>,
    },

    /// Print source metadata.
    #[command(about = "Print video metadata", visible_alias = "info")]
    Probe {
        /// Input video path.
        input: PathBuf,
        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// List cues, or show the cue active at a time.
    #[command(
        about = "List subtitle cues",
        after_help = "Examples:\n  subburn cues captions.srt\n  subburn cues captions.srt --at 1:02.5 --json"
    )]
    Cues {
        /// SubRip or WebVTT file.
        subs: PathBuf,
        /// Timecode to resolve the active cue at.
        #[arg(long)]
        at: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write a media file's embedded text subtitles to SRT or WebVTT.
    #[command(about = "Extract embedded subtitles")]
    ExtractSubs {
        /// Input media path.
        input: PathBuf,
        /// Output path; `.vtt` writes WebVTT, anything else SubRip.
        #[arg(long)]
        out: PathBuf,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global.verbose);
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        subburn::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn parse_codec_list(value: &str) -> Result<Vec<VideoCodec>, Box<dyn std::error::Error>> {
    let codecs = value
        .split(',')
        .filter(|name| !name.trim().is_empty())
        .map(|name| {
            VideoCodec::from_name(name).ok_or_else(|| format!("unsupported codec: {}", name.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if codecs.is_empty() {
        return Err("--codec needs at least one codec".into());
    }
    Ok(codecs)
}

fn build_style(args: &StyleArgs) -> Result<SubtitleStyle, Box<dyn std::error::Error>> {
    let mut style = match &args.style {
        Some(path) => SubtitleStyle::from_json(&fs::read_to_string(path)?)?,
        None => SubtitleStyle::default(),
    };
    if let Some(family) = &args.font_family {
        style.font_family = family.clone();
    }
    if let Some(size) = args.font_size {
        style.font_size_px = size;
    }
    if let Some(color) = &args.color {
        style.color = Paint::parse(color)?;
    }
    if let Some(background) = &args.background {
        style.background_color = Paint::parse(background)?;
    }
    if let Some(effect) = &args.effect {
        style.effect = Effect::from_descriptor(effect);
    }
    if let Some(position) = args.position {
        style.position_percent = position;
    }
    if let Some(opacity) = args.opacity {
        style.opacity = opacity;
    }
    style.validate()?;
    Ok(style)
}

fn read_cues(path: &Path) -> Result<Vec<Cue>, Box<dyn std::error::Error>> {
    Ok(parse_srt(&fs::read_to_string(path)?)?)
}

fn is_vtt_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("vtt"))
}

fn cue_json(cue: &Cue) -> serde_json::Value {
    json!({
        "id": cue.id,
        "startTime": cue.start_time,
        "endTime": cue.end_time,
        "text": cue.text,
    })
}

/// Feeds burn progress into an indicatif bar.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos:>3}% {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(u64::from(info.percent));
        if let Some(remaining) = info.estimated_remaining {
            self.bar.set_message(format!("~{}s left", remaining.as_secs()));
        }
        if info.percent == 100 {
            self.bar.finish_with_message("done");
        }
    }

    fn on_failure(&self, message: &str) {
        self.bar.abandon_with_message(format!("failed: {message}"));
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Burn {
            input,
            subs,
            embedded,
            out,
            style_args,
            codec,
            bitrate,
            fps,
            crf,
        } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let subtitle_style = build_style(&style_args)?;

            let mut options = BurnOptions::new();
            if cli.global.progress {
                options = options.with_progress(Arc::new(BarProgress::new()?));
            }

            let cues = match subs {
                Some(path) => read_cues(&path)?,
                None if embedded => extract_embedded_cues_with_options(&input, &BurnOptions::new())?,
                None => return Err("either --subs or --embedded is required".into()),
            };
            if cues.is_empty() {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    "no cues found; the video will be re-encoded unchanged".yellow()
                );
            }

            let mut encoder = EncoderOptions::default();
            if let Some(list) = &codec {
                encoder = encoder.with_codec_preference(parse_codec_list(list)?);
            }
            if let Some(bitrate) = bitrate {
                encoder = encoder.with_bitrate(bitrate);
            }
            if let Some(fps) = fps {
                encoder = encoder.with_fps(fps);
            }
            if let Some(crf) = crf {
                encoder = encoder.with_crf(crf);
            }
            options = options.with_encoder(encoder);
            if let Some(font) = style_args.font {
                options = options.with_font(FontSource::Path(font));
            }

            let cue_count = cues.len();
            let mut job = BurnJob::new(
                MediaSource::new(&input),
                FileEncoderFactory::new(&out),
                cues,
                subtitle_style,
                options,
            );
            let artifact = job.run()?;

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "burned {cue_count} cues into {} frames -> {} ({}, {} bytes)",
                    artifact.frame_count,
                    artifact.path.display(),
                    artifact.media_type,
                    artifact.byte_size,
                )
                .green()
            );
        }
        Commands::Probe { input, json } => {
            let mut source = MediaSource::new(&input);
            let metadata = source.open()?;
            source.close();
            if json {
                let payload = json!({
                    "width": metadata.width,
                    "height": metadata.height,
                    "durationSeconds": metadata.duration_seconds(),
                    "framesPerSecond": metadata.frames_per_second,
                    "codec": metadata.codec,
                    "format": metadata.format,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("File: {}", input.display());
                println!("Format: {}", metadata.format);
                println!("Duration: {}", format_timecode(metadata.duration_seconds()));
                println!(
                    "Video: {}x{} @ {:.2} fps ({})",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec
                );
            }
        }
        Commands::Cues { subs, at, json } => {
            let cues = read_cues(&subs)?;
            match at {
                Some(timecode) => {
                    let time = parse_timecode(&timecode);
                    let active = find_active_cue(&cues, time);
                    if json {
                        let payload = json!({
                            "time": time,
                            "cue": active.map(cue_json),
                        });
                        println!("{}", serde_json::to_string_pretty(&payload)?);
                    } else {
                        match active {
                            Some(cue) => println!("{}", cue.text),
                            None => eprintln!(
                                "{} {}",
                                "warning:".yellow().bold(),
                                format!("no cue active at {}", format_timecode(time)).yellow()
                            ),
                        }
                    }
                }
                None if json => {
                    let payload: Vec<_> = cues.iter().map(cue_json).collect();
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                None => {
                    for cue in &cues {
                        println!(
                            "{:>4}  {} --> {}  {}",
                            cue.id,
                            format_timecode(cue.start_time),
                            format_timecode(cue.end_time),
                            cue.text.replace('\n', " / "),
                        );
                    }
                }
            }
        }
        Commands::ExtractSubs { input, out } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let cues = extract_embedded_cues_with_options(&input, &BurnOptions::new())?;
            let text = if is_vtt_path(&out) {
                format_vtt(&cues)
            } else {
                format_srt(&cues)
            };
            fs::write(&out, text)?;
            println!(
                "{} {}",
                "success:".green().bold(),
                format!("wrote {} cues to {}", cues.len(), out.display()).green()
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "subburn", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{StyleArgs, build_style, is_vtt_path, parse_codec_list};
    use subburn::{Effect, Paint, VideoCodec};

    #[test]
    fn parse_codec_list_aliases() {
        let codecs = parse_codec_list("hevc, h264,vp9").unwrap();
        assert_eq!(codecs, vec![VideoCodec::H265, VideoCodec::H264, VideoCodec::Vp9]);
        assert!(parse_codec_list("prores").is_err());
        assert!(parse_codec_list(" , ").is_err());
    }

    #[test]
    fn style_flags_override_defaults() {
        let args = StyleArgs {
            font_size: Some(32.0),
            color: Some("#ff0".to_string()),
            background: Some("transparent".to_string()),
            effect: Some("soft glow".to_string()),
            ..StyleArgs::default()
        };
        let style = build_style(&args).unwrap();
        assert_eq!(style.font_size_px, 32.0);
        assert_eq!(style.color, Paint::Rgba([255, 255, 0, 255]));
        assert!(style.background_color.is_transparent());
        assert_eq!(style.effect, Effect::Glow);
    }

    #[test]
    fn style_flags_are_validated() {
        let args = StyleArgs {
            opacity: Some(1.5),
            ..StyleArgs::default()
        };
        assert!(build_style(&args).is_err());
    }

    #[test]
    fn vtt_output_detection() {
        assert!(is_vtt_path(Path::new("captions.VTT")));
        assert!(!is_vtt_path(Path::new("captions.srt")));
        assert!(!is_vtt_path(Path::new("captions")));
    }
}
