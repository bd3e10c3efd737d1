use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, info, instrument, warn};

use crate::config::PipelineParams;
use crate::detection::perspective::Rectifier;
use crate::detection::{bubbles, document, grid, selection};
use crate::error::{GradeError, Result};
use crate::grading;
use crate::models::{Answer, AnswerKey, GradeReport, Question};

/// Intermediate images produced while grading, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// Canny edge map of the photo.
    Edges,
    /// Rectified color sheet.
    Paper,
    /// Rectified grayscale sheet.
    Warped,
    /// Inverted Otsu binarization of the rectified sheet.
    Thresh,
    /// Rectified sheet with each selected bubble outlined.
    Annotated,
}

impl Artifact {
    pub const ALL: [Artifact; 5] = [
        Artifact::Edges,
        Artifact::Paper,
        Artifact::Warped,
        Artifact::Thresh,
        Artifact::Annotated,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Artifact::Edges => "edges",
            Artifact::Paper => "paper",
            Artifact::Warped => "warped",
            Artifact::Thresh => "thresh",
            Artifact::Annotated => "annotated",
        }
    }

    /// Debug filename, e.g. `03_warped.png`.
    pub fn filename(self) -> String {
        format!("{:02}_{}.png", self as usize + 1, self.name())
    }
}

/// Receives intermediate images as the pipeline produces them.
pub trait ArtifactObserver {
    fn observe(&mut self, artifact: Artifact, image: &DynamicImage) -> Result<()>;

    /// When false the pipeline skips building artifacts altogether.
    fn enabled(&self) -> bool {
        true
    }
}

impl<F> ArtifactObserver for F
where
    F: FnMut(Artifact, &DynamicImage) -> Result<()>,
{
    fn observe(&mut self, artifact: Artifact, image: &DynamicImage) -> Result<()> {
        self(artifact, image)
    }
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl ArtifactObserver for NoopObserver {
    fn observe(&mut self, _artifact: Artifact, _image: &DynamicImage) -> Result<()> {
        Ok(())
    }

    fn enabled(&self) -> bool {
        false
    }
}

/// Writes every artifact as a PNG into a debug directory.
#[derive(Clone, Debug)]
pub struct DebugDirObserver {
    output_dir: PathBuf,
}

impl DebugDirObserver {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let mut entries = std::fs::read_dir(&output_dir)
                .map_err(|e| GradeError::Artifact(format!("{}: {}", output_dir.display(), e)))?;
            if entries.next().is_some() {
                return Err(GradeError::Artifact(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)
                .map_err(|e| GradeError::Artifact(format!("{}: {}", output_dir.display(), e)))?;
        }

        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl ArtifactObserver for DebugDirObserver {
    fn observe(&mut self, artifact: Artifact, image: &DynamicImage) -> Result<()> {
        let path = self.output_dir.join(artifact.filename());
        image
            .save(&path)
            .map_err(|e| GradeError::Artifact(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Saved debug artifact");
        Ok(())
    }
}

fn emit(
    observer: &mut dyn ArtifactObserver,
    artifact: Artifact,
    make: impl FnOnce() -> DynamicImage,
) -> Result<()> {
    if observer.enabled() {
        observer.observe(artifact, &make())
    } else {
        Ok(())
    }
}

/// Decode an in-memory image, e.g. an uploaded file.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| GradeError::InvalidImage(e.to_string()))
}

/// Read and decode an image file.
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .map_err(|e| GradeError::InvalidImage(format!("{}: {}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| GradeError::InvalidImage(format!("{}: {}", path.display(), e)))?
        .decode()
        .map_err(|e| GradeError::InvalidImage(format!("{}: {}", path.display(), e)))
}

const CORRECT_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
const WRONG_COLOR: Rgb<u8> = Rgb([220, 0, 0]);

/// Outline each selected bubble: green when it matches the key, red otherwise.
fn annotate(
    paper: &RgbImage,
    questions: &[Question],
    report: &GradeReport,
    key: &AnswerKey,
) -> RgbImage {
    let mut canvas = paper.clone();
    for (q, (question, answer)) in questions.iter().zip(&report.answers).enumerate() {
        let Answer::Marked(choice) = *answer else {
            continue;
        };
        let Some(bubble) = question.bubbles.get(choice.index()) else {
            continue;
        };

        let color = if grading::is_correct(*answer, key, q) {
            CORRECT_COLOR
        } else {
            WRONG_COLOR
        };
        let b = bubble.bbox;
        draw_hollow_rect_mut(&mut canvas, Rect::at(b.x, b.y).of_size(b.width, b.height), color);
        if b.width > 2 && b.height > 2 {
            let inner = Rect::at(b.x + 1, b.y + 1).of_size(b.width - 2, b.height - 2);
            draw_hollow_rect_mut(&mut canvas, inner, color);
        }
    }
    canvas
}

/// Locate, rectify, segment, group, select and grade, in one pass.
#[derive(Debug, Clone, Default)]
pub struct GradingPipeline {
    params: PipelineParams,
}

impl GradingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(mut self, params: PipelineParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn grade(
        &self,
        image: &DynamicImage,
        key: &AnswerKey,
        num_questions: usize,
    ) -> Result<GradeReport> {
        self.grade_with_observer(image, key, num_questions, &mut NoopObserver)
    }

    /// Grade an encoded image held in memory.
    pub fn grade_bytes(
        &self,
        bytes: &[u8],
        key: &AnswerKey,
        num_questions: usize,
    ) -> Result<GradeReport> {
        let image = decode_image(bytes)?;
        self.grade(&image, key, num_questions)
    }

    pub fn grade_path(
        &self,
        path: &Path,
        key: &AnswerKey,
        num_questions: usize,
    ) -> Result<GradeReport> {
        let image = open_image(path)?;
        self.grade(&image, key, num_questions)
    }

    #[instrument(skip_all, fields(num_questions = num_questions, width = image.width(), height = image.height()))]
    pub fn grade_with_observer(
        &self,
        image: &DynamicImage,
        key: &AnswerKey,
        num_questions: usize,
        observer: &mut dyn ArtifactObserver,
    ) -> Result<GradeReport> {
        if num_questions == 0 {
            return Err(GradeError::InvalidConfig(
                "number of questions must be at least 1".to_string(),
            ));
        }
        if key.question_count() > num_questions {
            warn!(
                keyed = key.question_count(),
                num_questions, "Answer key covers more questions than graded"
            );
        }

        let gray = image.to_luma8();

        let located = document::locate_document(&gray, &self.params.locator)?;
        emit(observer, Artifact::Edges, || {
            DynamicImage::ImageLuma8(located.edges.clone())
        })?;

        let rectifier = Rectifier::new(&located.outline)?;
        let paper = observer
            .enabled()
            .then(|| rectifier.warp_rgb(&image.to_rgb8()));
        let warped = rectifier.warp_gray(&gray);
        if let Some(paper) = &paper {
            emit(observer, Artifact::Paper, || DynamicImage::ImageRgb8(paper.clone()))?;
        }
        emit(observer, Artifact::Warped, || DynamicImage::ImageLuma8(warped.clone()))?;

        let sheet = bubbles::segment_sheet(&warped, &self.params.segmenter)?;
        emit(observer, Artifact::Thresh, || {
            DynamicImage::ImageLuma8(sheet.thresh.clone())
        })?;

        let questions = grid::group_questions(sheet.bubbles, num_questions);
        let answers: Vec<Answer> = questions
            .iter()
            .map(|q| selection::select_answer(&sheet.thresh, q))
            .collect();

        let report = grading::grade_answers(answers, key);

        if let Some(paper) = &paper {
            emit(observer, Artifact::Annotated, || {
                DynamicImage::ImageRgb8(annotate(paper, &questions, &report, key))
            })?;
        }

        info!(
            correct = report.correct,
            total = report.total_questions(),
            "Sheet graded"
        );
        Ok(report)
    }
}
