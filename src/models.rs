use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use imageproc::geometry::{arc_length, contour_area};
use imageproc::point::Point;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::GradeError;

/// Number of answer choices (A through E) printed for every question.
pub const CHOICES_PER_QUESTION: usize = 5;

/// Axis-aligned bounding box, inclusive of both edge pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}

/// Boundary of a connected region, as traced from a binary image.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let Some(first) = self.points.first() else {
            return BoundingBox { x: 0, y: 0, width: 0, height: 0 };
        };

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        BoundingBox {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        }
    }

    /// Enclosed area of the closed polygon through the contour points.
    pub fn area(&self) -> f64 {
        contour_area(&self.points)
    }

    /// Length of the closed curve through the contour points.
    pub fn perimeter(&self) -> f64 {
        arc_length(&self.points, true)
    }
}

/// The answer sheet's outline in the source photo, corners in no particular order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrilateral {
    pub corners: [Point<i32>; 4],
}

/// A bubble candidate on the rectified sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub contour: Contour,
    pub bbox: BoundingBox,
}

impl Bubble {
    pub fn from_contour(contour: Contour) -> Self {
        let bbox = contour.bounding_box();
        Self { contour, bbox }
    }
}

/// The bubbles of one question, ordered left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Question {
    pub bubbles: Vec<Bubble>,
}

impl Question {
    pub fn is_complete(&self) -> bool {
        self.bubbles.len() == CHOICES_PER_QUESTION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Choice {
    A,
    B,
    C,
    D,
    E,
}

impl Choice {
    pub const ALL: [Choice; CHOICES_PER_QUESTION] =
        [Choice::A, Choice::B, Choice::C, Choice::D, Choice::E];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
            Choice::E => "E",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Choice::A),
            "B" => Ok(Choice::B),
            "C" => Ok(Choice::C),
            "D" => Ok(Choice::D),
            "E" => Ok(Choice::E),
            other => Err(GradeError::InvalidConfig(format!(
                "'{other}' is not a choice letter (A-E)"
            ))),
        }
    }
}

impl Serialize for Choice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChoiceRepr {
    Index(usize),
    Letter(String),
}

impl<'de> Deserialize<'de> for Choice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ChoiceRepr::deserialize(deserializer)? {
            ChoiceRepr::Index(i) => Choice::from_index(i)
                .ok_or_else(|| de::Error::custom(format!("choice index {i} out of range 0-4"))),
            ChoiceRepr::Letter(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

/// What was read off the sheet for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Marked(Choice),
    /// The question's bubbles could not all be detected.
    Unanswered,
}

impl Answer {
    pub fn choice(self) -> Option<Choice> {
        match self {
            Answer::Marked(c) => Some(c),
            Answer::Unanswered => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Marked(c) => c.as_str(),
            Answer::Unanswered => "N/A",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Correct choice per 0-based question index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerKey(BTreeMap<usize, Choice>);

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a key from `(question, choice index)` pairs.
    pub fn from_indices(
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, GradeError> {
        let mut key = Self::new();
        for (question, index) in pairs {
            let choice = Choice::from_index(index).ok_or_else(|| {
                GradeError::InvalidConfig(format!(
                    "question {question}: choice index {index} out of range 0-4"
                ))
            })?;
            key.insert(question, choice);
        }
        Ok(key)
    }

    pub fn insert(&mut self, question: usize, choice: Choice) {
        self.0.insert(question, choice);
    }

    pub fn get(&self, question: usize) -> Option<Choice> {
        self.0.get(&question).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// One past the highest keyed question index.
    pub fn question_count(&self) -> usize {
        self.0.keys().next_back().map_or(0, |q| q + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Choice)> + '_ {
        self.0.iter().map(|(q, c)| (*q, *c))
    }
}

impl FromStr for AnswerKey {
    type Err = GradeError;

    /// Parses a letter list such as `B,E,A,D,B`; position gives the question.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut key = AnswerKey::new();
        for (question, token) in s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .enumerate()
        {
            key.insert(question, token.parse()?);
        }
        if key.is_empty() {
            return Err(GradeError::InvalidConfig("answer key is empty".to_string()));
        }
        Ok(key)
    }
}

/// Outcome of grading one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeReport {
    pub answers: Vec<Answer>,
    pub correct: usize,
}

impl GradeReport {
    pub fn total_questions(&self) -> usize {
        self.answers.len()
    }

    /// Answer letters in question order, `N/A` for unanswered questions.
    pub fn letters(&self) -> Vec<&'static str> {
        self.answers.iter().map(|a| a.as_str()).collect()
    }
}
