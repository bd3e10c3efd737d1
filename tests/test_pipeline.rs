mod common;

use common::*;
use image::DynamicImage;

fn scenario_key() -> AnswerKey {
    AnswerKey::from_indices([(0, 1), (1, 4), (2, 0), (3, 3), (4, 1)]).unwrap()
}

#[test]
fn test_all_answers_correct() -> anyhow::Result<()> {
    let photo = SheetBuilder::new(5).answers(&[1, 4, 0, 3, 1]).render_photo();

    let report = GradingPipeline::new().grade(&photo, &scenario_key(), 5)?;

    assert_eq!(report.letters(), vec!["B", "E", "A", "D", "B"]);
    assert_eq!(report.correct, 5);
    Ok(())
}

#[test]
fn test_one_wrong_answer() -> anyhow::Result<()> {
    let photo = SheetBuilder::new(5).answers(&[1, 4, 2, 3, 1]).render_photo();

    let report = GradingPipeline::new().grade(&photo, &scenario_key(), 5)?;

    assert_eq!(report.correct, 4);
    assert_eq!(report.answers[2].as_str(), "C");
    Ok(())
}

#[test]
fn test_skewed_photo_is_rectified() -> anyhow::Result<()> {
    let choices = [3, 0, 4, 1, 2, 2];
    let photo = SheetBuilder::new(6).answers(&choices).skew(18).render_photo();
    let key = AnswerKey::from_indices(choices.iter().copied().enumerate())?;

    let report = GradingPipeline::new().grade(&photo, &key, 6)?;

    assert_eq!(report.letters(), vec!["D", "A", "E", "B", "C", "C"]);
    assert_eq!(report.correct, 6);
    Ok(())
}

#[test]
fn test_grading_is_deterministic() -> anyhow::Result<()> {
    let photo = SheetBuilder::new(5).answers(&[0, 1, 2, 3, 4]).skew(10).render_photo();
    let pipeline = GradingPipeline::new();

    let first = pipeline.grade(&photo, &scenario_key(), 5)?;
    let second = pipeline.grade(&photo, &scenario_key(), 5)?;

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_missing_bubble_only_affects_its_question() -> anyhow::Result<()> {
    let photo = SheetBuilder::new(5)
        .answers(&[1, 4, 0, 3, 1])
        .omit(2, 3)
        .render_photo();

    let report = GradingPipeline::new().grade(&photo, &scenario_key(), 5)?;

    assert_eq!(report.answers[2], Answer::Unanswered);
    assert_eq!(report.letters(), vec!["B", "E", "N/A", "D", "B"]);
    assert_eq!(report.correct, 4);
    Ok(())
}

#[test]
fn test_question_count_pads_and_truncates() -> anyhow::Result<()> {
    let photo = SheetBuilder::new(5).answers(&[1, 4, 0, 3, 1]).render_photo();
    let pipeline = GradingPipeline::new();

    let fewer = pipeline.grade(&photo, &scenario_key(), 3)?;
    assert_eq!(fewer.letters(), vec!["B", "E", "A"]);
    assert_eq!(fewer.correct, 3);

    let more = pipeline.grade(&photo, &scenario_key(), 7)?;
    assert_eq!(more.letters(), vec!["B", "E", "A", "D", "B", "N/A", "N/A"]);
    assert_eq!(more.correct, 5);
    Ok(())
}

#[test]
fn test_blank_photo_has_no_document() {
    let blank = DynamicImage::new_rgb8(300, 300);

    let result = GradingPipeline::new().grade(&blank, &scenario_key(), 5);

    assert!(matches!(result, Err(GradeError::DocumentNotFound)));
}

#[test]
fn test_sheet_without_bubbles() {
    let photo = SheetBuilder::new(0).render_photo();

    let result = GradingPipeline::new().grade(&photo, &scenario_key(), 5);

    assert!(matches!(result, Err(GradeError::NoBubblesFound)));
}

#[test]
fn test_grade_uploaded_bytes() -> anyhow::Result<()> {
    let photo = SheetBuilder::new(5).answers(&[1, 4, 0, 3, 1]).render_photo();
    let bytes = png_bytes(&photo);

    let report = GradingPipeline::new().grade_bytes(&bytes, &scenario_key(), 5)?;

    assert_eq!(report.correct, 5);
    Ok(())
}

#[test]
fn test_grade_from_file() -> anyhow::Result<()> {
    let photo = SheetBuilder::new(5).answers(&[1, 4, 0, 3, 1]).render_photo();
    let file = write_temp_png(&photo);

    let report = GradingPipeline::new().grade_path(file.path(), &scenario_key(), 5)?;

    assert_eq!(report.correct, 5);
    Ok(())
}

#[test]
fn test_unreadable_file_is_invalid_image() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("scan.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    let result = GradingPipeline::new().grade_path(&path, &scenario_key(), 5);
    assert!(matches!(result, Err(GradeError::InvalidImage(_))));

    let missing = GradingPipeline::new().grade_path(&dir.path().join("gone.png"), &scenario_key(), 5);
    assert!(matches!(missing, Err(GradeError::InvalidImage(_))));
}
