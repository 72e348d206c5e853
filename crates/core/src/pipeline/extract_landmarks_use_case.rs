use std::path::Path;
use std::time::Instant;

use crate::detection::domain::face_landmarks::extract_landmarks;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::tracking_error::{DecodeFailure, TrackingError};
use crate::tracking::domain::accumulator::TrackingAccumulator;
use crate::tracking::domain::tracking_result::TrackingResult;
use crate::video::domain::video_reader::VideoReader;

/// What a run produced: the result, plus why decoding stopped early if it did.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub result: TrackingResult,
    pub decode_failure: Option<DecodeFailure>,
}

/// Runs one video through the detector, one frame at a time, and returns
/// a per-frame landmark record for every decoded frame.
///
/// No state survives between calls: each `execute` builds its own accumulator
/// and hands back an owned [`TrackingResult`].
pub struct ExtractLandmarksUseCase {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn LandmarkDetector>,
    logger: Box<dyn PipelineLogger>,
}

impl ExtractLandmarksUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn LandmarkDetector>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            detector,
            logger,
        }
    }

    pub fn execute(&mut self, video_path: &Path) -> Result<ExtractionOutcome, TrackingError> {
        if !video_path.exists() {
            return Err(TrackingError::VideoNotFound(video_path.to_path_buf()));
        }

        let metadata = self
            .reader
            .open(video_path)
            .map_err(|source| TrackingError::VideoOpen {
                path: video_path.to_path_buf(),
                source,
            })?;

        self.logger.info(&format!("Processing video: {}", video_path.display()));
        self.logger.info(&format!("Total frames: {}", metadata.total_frames));
        self.logger.info(&format!("FPS: {}", metadata.fps));

        let scan = scan_frames(
            self.reader.as_mut(),
            self.detector.as_mut(),
            self.logger.as_mut(),
            metadata.fps,
            metadata.total_frames,
        );
        self.reader.close();
        let (accumulator, decode_failure) = scan?;

        if let Some(failure) = &decode_failure {
            log::warn!("{failure}; keeping {} decoded frames", accumulator.frames_recorded());
        }
        self.logger.info(&format!(
            "Processing complete. {} frames processed.",
            accumulator.frames_recorded()
        ));
        self.logger.summary();

        Ok(ExtractionOutcome {
            result: accumulator.finish(video_path.display().to_string()),
            decode_failure,
        })
    }
}

/// Decode, detect, and record until the stream ends or a frame fails to decode.
fn scan_frames(
    reader: &mut dyn VideoReader,
    detector: &mut dyn LandmarkDetector,
    logger: &mut dyn PipelineLogger,
    fps: f64,
    total_hint: usize,
) -> Result<(TrackingAccumulator, Option<DecodeFailure>), TrackingError> {
    let mut accumulator = TrackingAccumulator::new(fps);
    let mut frames = reader.frames();

    loop {
        let decode_start = Instant::now();
        let frame = match frames.next() {
            None => return Ok((accumulator, None)),
            Some(Err(e)) => {
                let failure = DecodeFailure {
                    frame_number: accumulator.next_frame_number(),
                    message: e.to_string(),
                };
                return Ok((accumulator, Some(failure)));
            }
            Some(Ok(frame)) => frame.into_rgb(),
        };
        logger.timing("decode", elapsed_ms(decode_start));

        let frame_number = accumulator.next_frame_number();
        let detect_start = Instant::now();
        let mesh = detector
            .detect(&frame)
            .map_err(|source| TrackingError::Detection {
                frame_number,
                source,
            })?;
        logger.timing("detect", elapsed_ms(detect_start));

        let landmarks = extract_landmarks(mesh.as_ref(), frame.width(), frame.height());
        let record = accumulator.push(landmarks);
        log::trace!(
            "Frame {}: {} landmarks",
            record.frame_number,
            record.num_landmarks
        );

        logger.progress(accumulator.frames_recorded() as usize, total_hint);
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
