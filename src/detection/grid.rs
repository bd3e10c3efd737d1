use tracing::{debug, warn};

use crate::models::{Bubble, CHOICES_PER_QUESTION, Question};

/// Split bubbles into rows, top to bottom.
///
/// Bubbles are sorted by the top of their bounding box. A bubble joins the
/// current row while its top lies within half a bubble height of the
/// previous bubble's top, so a row may drift gradually across the sheet.
pub fn group_rows(mut bubbles: Vec<Bubble>) -> Vec<Vec<Bubble>> {
    bubbles.sort_by_key(|b| b.bbox.y);

    let mut rows: Vec<Vec<Bubble>> = Vec::new();

    for bubble in bubbles {
        let previous = rows.last().and_then(|row| row.last());
        let same_row = previous.is_some_and(|prev| {
            let tolerance = prev.bbox.height.max(bubble.bbox.height) as i32 / 2;
            bubble.bbox.y - prev.bbox.y <= tolerance
        });

        if same_row {
            if let Some(row) = rows.last_mut() {
                row.push(bubble);
            }
        } else {
            rows.push(vec![bubble]);
        }
    }

    rows
}

/// Order bubbles into questions of [`CHOICES_PER_QUESTION`] choices.
///
/// Each row is sorted left to right and cut into chunks of five. A short
/// chunk still becomes a question so later questions keep their position.
/// The result always has exactly `num_questions` entries: extra questions
/// are dropped and missing ones are empty.
pub fn group_questions(bubbles: Vec<Bubble>, num_questions: usize) -> Vec<Question> {
    let mut questions = Vec::with_capacity(num_questions);

    for mut row in group_rows(bubbles) {
        row.sort_by_key(|b| b.bbox.x);

        let mut row = row.into_iter().peekable();
        while row.peek().is_some() {
            let chunk: Vec<Bubble> = row.by_ref().take(CHOICES_PER_QUESTION).collect();
            if chunk.len() < CHOICES_PER_QUESTION {
                warn!(
                    question = questions.len() + 1,
                    found = chunk.len(),
                    "Question has too few bubbles"
                );
            }
            questions.push(Question { bubbles: chunk });
        }
    }

    debug!(detected = questions.len(), expected = num_questions, "Questions grouped");

    questions.resize_with(num_questions, Question::default);
    questions
}
