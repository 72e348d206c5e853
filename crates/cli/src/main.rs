use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};

use face_landmarks_core::detection::domain::landmark_detector::LandmarkDetector;
use face_landmarks_core::detection::domain::model_provider::ModelProvider;
use face_landmarks_core::detection::infrastructure::model_resolver::CachedModelProvider;
use face_landmarks_core::detection::infrastructure::onnx_blazeface_locator::{
    OnnxBlazefaceLocator, DEFAULT_MIN_DETECTION_SCORE,
};
use face_landmarks_core::detection::infrastructure::onnx_face_mesh_detector::{
    OnnxFaceMeshDetector, DEFAULT_MIN_FACE_SCORE,
};
use face_landmarks_core::pipeline::extract_landmarks_use_case::ExtractLandmarksUseCase;
use face_landmarks_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use face_landmarks_core::shared::constants::{
    BUNDLED_MODEL_DIR, DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_PROGRESS_INTERVAL,
    FACE_DETECTOR_MODEL_NAME, FACE_MESH_MODEL_NAME, IMAGE_EXTENSIONS,
};
use face_landmarks_core::tracking::domain::result_store::ResultStore;
use face_landmarks_core::tracking::domain::tracking_result::TrackingResult;
use face_landmarks_core::tracking::infrastructure::json_result_store::JsonResultStore;
use face_landmarks_core::video::domain::video_reader::VideoReader;
use face_landmarks_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use face_landmarks_core::video::infrastructure::image_file_reader::ImageFileReader;

/// Per-frame facial landmark extraction for videos and images.
///
/// Needs two ONNX models: the MediaPipe face landmark model (468 points,
/// 192x192) and the MediaPipe short-range face detector (128x128), both
/// converted from their published TFLite files (e.g. with tf2onnx, or taken
/// from PINTO0309's model zoo). Each is looked up as an explicit path, then
/// in the cache directory, then in a `models/` directory next to the
/// executable, and downloaded only when a URL is given.
#[derive(Parser)]
#[command(name = "face-landmarks", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract landmarks from every frame and write them as JSON.
    Extract(ExtractArgs),
    /// Print metadata and statistics of a landmark file.
    Inspect(InspectArgs),
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Input video or image file.
    #[arg(default_value = DEFAULT_INPUT_PATH)]
    input: PathBuf,

    /// Output JSON file.
    #[arg(default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Face landmark model file to use instead of the cached copy.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Download the face landmark model from this URL when it is not found locally.
    #[arg(long)]
    model_url: Option<String>,

    /// Face detector model file to use instead of the cached copy.
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Download the face detector model from this URL when it is not found locally.
    #[arg(long)]
    detector_model_url: Option<String>,

    /// Minimum face-presence probability reported by the landmark model (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_MIN_FACE_SCORE)]
    min_face_score: f64,

    /// Minimum face detector confidence (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_MIN_DETECTION_SCORE)]
    min_detection_score: f64,

    /// Report progress every N frames.
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    progress_interval: usize,
}

#[derive(clap::Args)]
struct InspectArgs {
    /// Landmark file written by `extract`.
    json: PathBuf,

    /// Also print the record of this frame (1-based).
    #[arg(long)]
    frame: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Extract(args) => run_extract(args),
        Command::Inspect(args) => run_inspect(args),
    };
    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_extract(args: ExtractArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate(&args)?;

    // Fail on a missing input before touching the network
    if !args.input.exists() {
        return Err(format!("Input file not found: {}", args.input.display()).into());
    }

    let detector = build_detector(&args)?;
    let reader = open_reader(&args.input);
    let logger = Box::new(StdoutPipelineLogger::new(args.progress_interval));

    let mut use_case = ExtractLandmarksUseCase::new(reader, detector, logger);
    let outcome = use_case.execute(&args.input)?;

    if let Some(failure) = &outcome.decode_failure {
        log::warn!("Output is partial: {failure}");
    }
    report_and_save(&outcome.result, &JsonResultStore::new(), &args.output, &mut io::stdout())
}

/// Prints the summary, then persists. The summary is out even if the write fails.
fn report_and_save(
    result: &TrackingResult,
    store: &dyn ResultStore,
    output: &Path,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    print_summary(result, out)?;
    store.save(result, output)?;
    writeln!(out, "Output: {}", output.display())?;
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let result = JsonResultStore::new().load(&args.json)?;
    print_summary(&result, &mut io::stdout())?;

    if let Some(n) = args.frame {
        let record = result
            .frame(n)
            .ok_or_else(|| format!("No record for frame {n} in {}", args.json.display()))?;
        println!();
        println!("Frame {}:", record.frame_number);
        println!("  Timestamp: {:.3}s", record.timestamp);
        println!("  Landmarks: {}", record.num_landmarks);
        for (i, point) in record.landmarks.iter().enumerate() {
            println!("  {i:>4}: ({:.2}, {:.2})", point.x, point.y);
        }
    }
    Ok(())
}

fn build_detector(args: &ExtractArgs) -> Result<Box<dyn LandmarkDetector>, Box<dyn std::error::Error>> {
    let bundled_dir = bundled_model_dir();

    let detector_path = resolve_model(model_provider(
        FACE_DETECTOR_MODEL_NAME,
        args.detector_model.as_ref(),
        args.detector_model_url.as_ref(),
        bundled_dir.as_ref(),
    ))?;
    let mesh_path = resolve_model(model_provider(
        FACE_MESH_MODEL_NAME,
        args.model.as_ref(),
        args.model_url.as_ref(),
        bundled_dir.as_ref(),
    ))?;

    let locator = OnnxBlazefaceLocator::new(&detector_path, args.min_detection_score)?;
    Ok(Box::new(OnnxFaceMeshDetector::new(
        &mesh_path,
        Box::new(locator),
        args.min_face_score,
    )?))
}

/// `models/` beside the running executable, where release archives ship models.
fn bundled_model_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(BUNDLED_MODEL_DIR))
}

fn model_provider(
    name: &str,
    explicit: Option<&PathBuf>,
    url: Option<&String>,
    bundled_dir: Option<&PathBuf>,
) -> CachedModelProvider {
    let mut provider = CachedModelProvider::new(name).with_progress(download_progress);
    if let Some(path) = explicit {
        provider = provider.with_explicit_path(path.clone());
    }
    if let Some(url) = url {
        provider = provider.with_url(url.as_str());
    }
    if let Some(dir) = bundled_dir {
        provider = provider.with_bundled_dir(dir.clone());
    }
    provider
}

fn resolve_model(provider: CachedModelProvider) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let outcome = provider.ensure_available();
    // Terminate the carriage-return progress line
    if DOWNLOAD_STARTED.swap(false, Ordering::Relaxed) {
        eprintln!();
    }
    let path = outcome?;
    log::info!("Using model {}", path.display());
    Ok(path)
}

fn validate(args: &ExtractArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&args.min_face_score) {
        return Err(format!(
            "Minimum face score must be between 0.0 and 1.0, got {}",
            args.min_face_score
        )
        .into());
    }
    if !(0.0..=1.0).contains(&args.min_detection_score) {
        return Err(format!(
            "Minimum detection score must be between 0.0 and 1.0, got {}",
            args.min_detection_score
        )
        .into());
    }
    if args.progress_interval == 0 {
        return Err("Progress interval must be at least 1".into());
    }
    Ok(())
}

fn print_summary(result: &TrackingResult, out: &mut dyn Write) -> io::Result<()> {
    let stats = result.statistics();
    writeln!(out, "Video: {}", result.metadata.video_path)?;
    writeln!(out, "Total frames: {}", stats.total_frames)?;
    writeln!(out, "Frames with face: {}", stats.frames_with_face)?;
    writeln!(out, "Detection rate: {:.1}%", stats.detection_rate * 100.0)?;
    writeln!(
        out,
        "Average landmarks per frame: {:.1}",
        stats.average_landmarks_per_frame
    )?;
    writeln!(out, "FPS: {:.2}", result.metadata.fps)?;
    writeln!(out, "Duration: {:.2}s", result.metadata.duration_seconds)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn open_reader(input: &Path) -> Box<dyn VideoReader> {
    if is_image(input) {
        Box::new(ImageFileReader::new())
    } else {
        Box::new(FfmpegReader::new())
    }
}

/// Set once a progress line has been drawn for the current download.
static DOWNLOAD_STARTED: AtomicBool = AtomicBool::new(false);

fn download_progress(downloaded: u64, total: u64) {
    DOWNLOAD_STARTED.store(true, Ordering::Relaxed);
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use face_landmarks_core::tracking::domain::frame_record::{FrameRecord, LandmarkPoint};
    use face_landmarks_core::tracking::domain::run_metadata::RunMetadata;

    fn parse_extract(args: &[&str]) -> ExtractArgs {
        let mut argv = vec!["face-landmarks", "extract"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Extract(args) => args,
            Command::Inspect(_) => panic!("expected extract"),
        }
    }

    #[test]
    fn test_extract_defaults() {
        let args = parse_extract(&[]);
        assert_eq!(args.input, PathBuf::from(DEFAULT_INPUT_PATH));
        assert_eq!(args.output, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert!(args.model_url.is_none());
        assert!(args.detector_model.is_none());
        assert!(args.detector_model_url.is_none());
        assert_eq!(args.min_face_score, DEFAULT_MIN_FACE_SCORE);
        assert_eq!(args.min_detection_score, DEFAULT_MIN_DETECTION_SCORE);
        assert_eq!(args.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert!(args.model.is_none());
        assert!(validate(&args).is_ok());
    }

    #[test]
    fn test_extract_rejects_out_of_range_score() {
        let args = parse_extract(&["in.mp4", "out.json", "--min-face-score", "1.5"]);
        assert!(validate(&args).is_err());
    }

    #[test]
    fn test_extract_rejects_out_of_range_detection_score() {
        let args = parse_extract(&["--min-detection-score", "-0.1"]);
        assert!(validate(&args).is_err());
    }

    #[test]
    fn test_extract_accepts_model_sources() {
        let args = parse_extract(&[
            "--model",
            "mesh.onnx",
            "--detector-model-url",
            "https://host/detector.onnx",
        ]);
        assert_eq!(args.model, Some(PathBuf::from("mesh.onnx")));
        assert_eq!(args.detector_model_url.as_deref(), Some("https://host/detector.onnx"));
    }

    #[test]
    fn test_resolve_model_clears_progress_line_flag() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("mesh.onnx");
        std::fs::write(&model, b"model").unwrap();

        download_progress(10, 100);
        assert!(DOWNLOAD_STARTED.load(Ordering::Relaxed));

        let provider = model_provider(FACE_MESH_MODEL_NAME, Some(&model), None, None);
        assert_eq!(resolve_model(provider).unwrap(), model);
        assert!(!DOWNLOAD_STARTED.load(Ordering::Relaxed));
    }

    #[test]
    fn test_bundled_model_dir_is_next_to_executable() {
        let dir = bundled_model_dir().unwrap();
        assert!(dir.ends_with(BUNDLED_MODEL_DIR));
        assert_eq!(dir.parent(), std::env::current_exe().unwrap().parent());
    }

    fn finished_result() -> TrackingResult {
        let frames = [
            FrameRecord::new(1, 25.0, vec![LandmarkPoint::new(3.0, 4.0)]),
            FrameRecord::new(2, 25.0, Vec::new()),
        ]
        .into_iter()
        .map(|r| (r.key(), r))
        .collect();
        TrackingResult {
            metadata: RunMetadata::new("clip.mp4", 2, 25.0, 1),
            frames,
        }
    }

    #[test]
    fn test_summary_survives_failed_save() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("out.json");
        let mut out = Vec::new();

        let saved = report_and_save(&finished_result(), &JsonResultStore::new(), &output, &mut out);

        assert!(saved.is_err());
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Total frames: 2"));
        assert!(printed.contains("Frames with face: 1"));
        assert!(!printed.contains("Output:"));
    }

    #[test]
    fn test_summary_then_output_path_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.json");
        let mut out = Vec::new();

        report_and_save(&finished_result(), &JsonResultStore::new(), &output, &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Detection rate: 50.0%"));
        assert!(printed.trim_end().ends_with(&format!("Output: {}", output.display())));
        assert!(output.exists());
    }

    #[test]
    fn test_extract_rejects_zero_progress_interval() {
        let args = parse_extract(&["--progress-interval", "0"]);
        assert!(validate(&args).is_err());
    }

    #[test]
    fn test_inspect_requires_json_path() {
        assert!(Cli::try_parse_from(["face-landmarks", "inspect"]).is_err());
        let cli = Cli::try_parse_from(["face-landmarks", "inspect", "out.json", "--frame", "7"]).unwrap();
        match cli.command {
            Command::Inspect(args) => {
                assert_eq!(args.json, PathBuf::from("out.json"));
                assert_eq!(args.frame, Some(7));
            }
            Command::Extract(_) => panic!("expected inspect"),
        }
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("face.PNG")));
        assert!(is_image(Path::new("dir/face.jpeg")));
        assert!(!is_image(Path::new("clip.mp4")));
        assert!(!is_image(Path::new("noext")));
    }
}
