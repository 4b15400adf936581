use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use dropmerge::{
    AnalysisCallback, AnalysisReport, AnalyzerConfig, FrameClass, FrameSource, NoOpCallback,
    VideoAnalyzer, VideoSource,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  dropmerge probe input.mp4 --json\n  dropmerge analyze input.mp4 --progress\n  dropmerge analyze input.mp4 --json --max-frames 150\n  dropmerge analyze input.mp4 --annotate-dir flagged --overwrite";

#[derive(Debug, Parser)]
#[command(
    name = "dropmerge",
    version,
    about = "Detect dropped and merged frames in video files",
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
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the stream properties the analyzer will work from.
    #[command(
        about = "Print video stream properties",
        visible_alias = "info",
        after_help = "Examples:\n  dropmerge probe input.mp4\n  dropmerge probe input.mp4 --json"
    )]
    Probe {
        /// Input video path or URL.
        input: String,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Analyze a video for frame drops and merges.
    #[command(
        about = "Detect frame drops and merges",
        after_help = "Examples:\n  dropmerge analyze input.mp4 --progress\n  dropmerge analyze input.mp4 --json > report.json\n  dropmerge analyze input.mp4 --annotate-dir flagged"
    )]
    Analyze {
        /// Input video path or URL.
        input: String,

        /// Output the full report as machine-readable JSON.
        #[arg(long)]
        json: bool,

        /// Cap on the number of sampled frames.
        #[arg(long, default_value_t = 300)]
        max_frames: usize,

        /// Directory to write annotated images of flagged frames into.
        #[arg(long)]
        annotate_dir: Option<PathBuf>,
    },
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}

impl AnalysisCallback for TerminalProgress {
    fn on_progress(&self, processed: usize, total: usize, current_class: FrameClass) {
        if self.bar.length() != Some(total as u64) {
            self.bar.set_length(total as u64);
        }
        self.bar.set_position(processed as u64);
        if current_class != FrameClass::Normal {
            self.bar.set_message(current_class.to_string());
        }
    }

    fn on_complete(&self, _report: &AnalysisReport) {}

    fn on_error(&self, _message: &str) {}
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Probe { input, json } => {
            let source = VideoSource::open(&input)?;
            if json {
                let payload = json!({
                    "video": source.identifier(),
                    "duration_seconds": source.duration().as_secs_f64(),
                    "fps": source.declared_fps(),
                    "frame_count": source.frame_count(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Video: {}", source.identifier());
                println!("Duration: {:?}", source.duration());
                match source.declared_fps() {
                    Some(fps) => println!("Frame rate: {fps:.2} fps"),
                    None => println!("Frame rate: not declared"),
                }
                if let Some(count) = source.frame_count() {
                    println!("Frames: {count}");
                }
            }
        }
        Commands::Analyze {
            input,
            json,
            max_frames,
            annotate_dir,
        } => {
            if let Some(dir) = &annotate_dir {
                if dir.exists() && !cli.global.overwrite {
                    return Err(format!(
                        "output directory already exists: {} (use --overwrite)",
                        dir.display()
                    )
                    .into());
                }
                fs::create_dir_all(dir)?;
            }

            let config = AnalyzerConfig::new()
                .with_max_frames(max_frames)
                .with_annotations(annotate_dir.is_some());

            let mut source = VideoSource::open(&input)?;
            let analyzer = VideoAnalyzer::new(config);

            let report = if cli.global.progress && !json {
                let observer = TerminalProgress::new()?;
                let report = analyzer.analyze(&mut source, &observer)?;
                observer.finish();
                report
            } else {
                analyzer.analyze(&mut source, &NoOpCallback)?
            };

            if let Some(dir) = &annotate_dir {
                let mut written = 0_usize;
                for frame in report.defects() {
                    if let Some(image) = &frame.annotated {
                        let output_path = dir.join(format!("frame_{:06}.png", frame.index));
                        image.save(&output_path)?;
                        written += 1;
                        if cli.global.verbose {
                            eprintln!("saved overlay {} -> {}", frame.index, output_path.display());
                        }
                    }
                }
                eprintln!(
                    "{} {} overlay(s) written to {}",
                    "annotate".cyan().bold(),
                    written,
                    dir.display()
                );
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
            } else {
                print_summary(&report, cli.global.verbose);
            }
        }
    }

    Ok(())
}

fn report_json(report: &AnalysisReport) -> serde_json::Value {
    json!({
        "video": report.video,
        "fps": report.fps,
        "duration_seconds": report.duration.as_secs_f64(),
        "total_frames": report.total_frames,
        "drop_count": report.drop_count,
        "merge_count": report.merge_count,
        "normal_count": report.normal_count,
        "defect_ratio": report.defect_ratio(),
        "processing_seconds": report.processing_time.as_secs_f64(),
        "frames": report.frames.iter().map(|frame| json!({
            "index": frame.index,
            "timestamp_ms": frame.timestamp_ms,
            "classification": frame.classification.to_string(),
            "mean_abs_diff": frame.mean_abs_diff,
            "motion_magnitude": frame.motion_magnitude,
            "ssim_neighbor": frame.ssim_neighbor,
            "ssim_synthetic": frame.ssim_synthetic,
            "edge_count": frame.edge_count,
            "reason": frame.reason,
        })).collect::<Vec<_>>(),
    })
}

fn print_summary(report: &AnalysisReport, verbose: bool) {
    println!("Video: {}", report.video);
    println!(
        "Analyzed {} frames @ {:.2} fps in {:.2}s",
        report.total_frames,
        report.fps,
        report.processing_time.as_secs_f64()
    );
    println!(
        "{} {}   {} {}   {} {}",
        "drops:".red().bold(),
        report.drop_count,
        "merges:".yellow().bold(),
        report.merge_count,
        "normal:".green().bold(),
        report.normal_count,
    );

    if report.defect_count() == 0 {
        println!("{}", "No temporal defects detected".green());
        return;
    }

    for frame in report.defects() {
        let label = match frame.classification {
            FrameClass::FrameDrop => "FRAME_DROP".red().bold(),
            FrameClass::FrameMerge => "FRAME_MERGE".yellow().bold(),
            FrameClass::Normal => continue,
        };
        println!(
            "  frame {:>4} @ {:>8}ms  {}  {}",
            frame.index, frame.timestamp_ms, label, frame.reason
        );
    }

    if verbose {
        println!(
            "defect ratio: {:.1}%",
            report.defect_ratio() * 100.0
        );
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
