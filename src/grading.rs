use crate::models::{Answer, AnswerKey, GradeReport};

/// Whether `answer` matches the key entry for `question`.
pub fn is_correct(answer: Answer, key: &AnswerKey, question: usize) -> bool {
    match (answer.choice(), key.get(question)) {
        (Some(selected), Some(expected)) => selected == expected,
        _ => false,
    }
}

/// Count answers that match the key. Unkeyed and unanswered questions never score.
pub fn count_correct(answers: &[Answer], key: &AnswerKey) -> usize {
    answers
        .iter()
        .enumerate()
        .filter(|(q, a)| is_correct(**a, key, *q))
        .count()
}

pub fn grade_answers(answers: Vec<Answer>, key: &AnswerKey) -> GradeReport {
    let correct = count_correct(&answers, key);
    GradeReport { answers, correct }
}
