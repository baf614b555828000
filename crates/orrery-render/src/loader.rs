//! Background texture loading: offloads image file decoding to worker
//! threads using channels for result delivery.
//!
//! The main thread submits [`TextureLoadTask`]s via [`submit`], draws with
//! placeholder textures in the meantime, and collects [`TextureLoadResult`]s
//! each frame via [`drain_results`]. Decoding never blocks the main thread,
//! and failures travel down the same result channel so the caller can log
//! them and leave the placeholder bound.
//!
//! [`submit`]: TextureLoadPipeline::submit
//! [`drain_results`]: TextureLoadPipeline::drain_results

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

/// A self-contained decode task that can run on any thread.
pub struct TextureLoadTask {
    /// The texture name this image is for (used to match results to bodies).
    pub name: String,
    /// Path of the image file to read and decode.
    pub path: PathBuf,
}

/// The result of a completed decode task.
pub struct TextureLoadResult {
    /// The texture name this image is for.
    pub name: String,
    /// Decoded RGBA8 pixels, or the failure that prevented decoding.
    pub outcome: Result<DecodedImage, TextureLoadError>,
}

/// An image decoded to tightly packed RGBA8 pixels, ready for GPU upload.
pub struct DecodedImage {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// `width * height * 4` bytes, row-major.
    pub pixels: Vec<u8>,
}

/// Errors that can occur while reading and decoding an image file.
///
/// Delivered through the result channel rather than returned from `submit`;
/// the submitting side decides how to react (typically: warn and keep the
/// placeholder).
#[derive(Debug, thiserror::Error)]
pub enum TextureLoadError {
    /// Reading the image file from disk failed.
    #[error("failed to read image file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file contents could not be decoded as a supported image format.
    #[error("failed to decode image file {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Read an image file and decode it to RGBA8.
fn decode_image_file(path: &Path) -> Result<DecodedImage, TextureLoadError> {
    let bytes = std::fs::read(path).map_err(|source| TextureLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|source| TextureLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Asynchronous texture loading pipeline backed by worker threads.
///
/// The render loop never waits on a decode: bodies draw with their
/// placeholder textures until a drained result supplies the real pixels.
pub struct TextureLoadPipeline {
    /// Channel sender for submitting tasks to workers.
    task_sender: Option<crossbeam_channel::Sender<TextureLoadTask>>,
    /// Channel receiver for collecting completed results on the main thread.
    result_receiver: crossbeam_channel::Receiver<TextureLoadResult>,
    /// Handles to the worker threads (for shutdown).
    worker_handles: Vec<JoinHandle<()>>,
    /// Maximum number of tasks that can be in-flight simultaneously.
    budget: usize,
    /// Current number of in-flight tasks.
    in_flight: Arc<AtomicUsize>,
}

impl TextureLoadPipeline {
    /// Creates a new texture loading pipeline with the given number of
    /// worker threads and task budget.
    ///
    /// `worker_count` is the number of OS threads to spawn for decoding;
    /// `budget` caps the number of in-flight tasks.
    pub fn new(worker_count: usize, budget: usize) -> Self {
        let (task_tx, task_rx) = crossbeam_channel::bounded(budget);
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let rx: crossbeam_channel::Receiver<TextureLoadTask> = task_rx.clone();
            let tx = result_tx.clone();
            let flight = Arc::clone(&in_flight);

            handles.push(std::thread::spawn(move || {
                while let Ok(task) = rx.recv() {
                    let outcome = decode_image_file(&task.path);
                    let _ = tx.send(TextureLoadResult {
                        name: task.name,
                        outcome,
                    });
                    flight.fetch_sub(1, Ordering::Relaxed);
                }
            }));
        }

        Self {
            task_sender: Some(task_tx),
            result_receiver: result_rx,
            worker_handles: handles,
            budget,
            in_flight,
        }
    }

    /// Submit a decode task. Returns `false` if the budget is exhausted
    /// or the pipeline has been shut down.
    pub fn submit(&self, task: TextureLoadTask) -> bool {
        let sender = match &self.task_sender {
            Some(s) => s,
            None => return false,
        };
        if self.in_flight.load(Ordering::Relaxed) >= self.budget {
            return false;
        }
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        if sender.send(task).is_err() {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Drain all completed results. Called once per frame on the main thread.
    pub fn drain_results(&self) -> Vec<TextureLoadResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_receiver.try_recv() {
            results.push(result);
        }
        results
    }

    /// Number of tasks currently being processed or queued by workers.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Shut down all worker threads gracefully.
    ///
    /// Drops the task sender to signal workers to exit, then joins all threads.
    pub fn shutdown(&mut self) {
        // Drop sender to close the channel, causing workers to exit.
        self.task_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for TextureLoadPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_png(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();
        path
    }

    /// A submitted decode task should produce RGBA8 pixels on the channel.
    #[test]
    fn test_decoded_pixels_arrive_via_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(&dir, "earth.png");
        let pipeline = TextureLoadPipeline::new(1, 4);

        assert!(pipeline.submit(TextureLoadTask {
            name: "earth".to_string(),
            path,
        }));

        let start = std::time::Instant::now();
        loop {
            let results = pipeline.drain_results();
            if !results.is_empty() {
                assert_eq!(results[0].name, "earth");
                let image = results[0].outcome.as_ref().unwrap();
                assert_eq!((image.width, image.height), (2, 2));
                assert_eq!(image.pixels.len(), 2 * 2 * 4);
                assert_eq!(&image.pixels[0..4], &[10, 20, 30, 255]);
                break;
            }
            assert!(
                start.elapsed().as_secs() < 5,
                "Timed out waiting for decode result"
            );
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    /// A missing file should surface as an IO error on the channel.
    #[test]
    fn test_missing_file_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = TextureLoadPipeline::new(1, 4);

        assert!(pipeline.submit(TextureLoadTask {
            name: "missing".to_string(),
            path: dir.path().join("no-such-file.png"),
        }));

        let start = std::time::Instant::now();
        loop {
            let results = pipeline.drain_results();
            if !results.is_empty() {
                assert!(matches!(
                    results[0].outcome,
                    Err(TextureLoadError::Io { .. })
                ));
                break;
            }
            assert!(start.elapsed().as_secs() < 5, "Timed out");
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    /// Unparseable file contents should surface as a decode error.
    #[test]
    fn test_corrupt_file_reports_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.png");
        std::fs::write(&path, b"not an image at all").unwrap();
        let pipeline = TextureLoadPipeline::new(1, 4);

        assert!(pipeline.submit(TextureLoadTask {
            name: "corrupt".to_string(),
            path,
        }));

        let start = std::time::Instant::now();
        loop {
            let results = pipeline.drain_results();
            if !results.is_empty() {
                assert!(matches!(
                    results[0].outcome,
                    Err(TextureLoadError::Decode { .. })
                ));
                break;
            }
            assert!(start.elapsed().as_secs() < 5, "Timed out");
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    /// Multiple concurrent loads should not interfere with each other.
    #[test]
    fn test_concurrent_loads_do_not_interfere() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = TextureLoadPipeline::new(2, 8);

        let names = ["sun", "earth", "moon", "mars"];
        for name in &names {
            let path = write_test_png(&dir, &format!("{name}.png"));
            assert!(pipeline.submit(TextureLoadTask {
                name: name.to_string(),
                path,
            }));
        }

        let mut received = Vec::new();
        let start = std::time::Instant::now();
        while received.len() < names.len() {
            received.extend(pipeline.drain_results());
            assert!(start.elapsed().as_secs() < 10, "Timed out");
            std::thread::sleep(std::time::Duration::from_millis(1));
        }

        let mut received_names: Vec<_> = received.iter().map(|r| r.name.clone()).collect();
        received_names.sort();
        let mut expected: Vec<_> = names.iter().map(|n| n.to_string()).collect();
        expected.sort();
        assert_eq!(received_names, expected);
        assert!(received.iter().all(|r| r.outcome.is_ok()));
    }

    /// The budget should prevent submitting more tasks than allowed.
    #[test]
    fn test_budget_limits_active_tasks() {
        let dir = tempfile::tempdir().unwrap();
        // No workers, so nothing drains and submissions stay in flight.
        let pipeline = TextureLoadPipeline::new(0, 2);

        let mut submitted = 0;
        for i in 0..10 {
            let path = dir.path().join(format!("image-{i}.png"));
            if pipeline.submit(TextureLoadTask {
                name: format!("image-{i}"),
                path,
            }) {
                submitted += 1;
            }
        }

        assert_eq!(submitted, 2, "Budget should cap in-flight submissions");
        assert_eq!(pipeline.in_flight_count(), 2);
    }
}
