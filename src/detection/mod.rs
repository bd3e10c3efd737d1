//! Image-processing stages of the grading pipeline, in data-flow order:
//! locate the sheet, rectify it, segment bubbles, group them into questions
//! and select the marked choice.

pub mod preprocessing;
pub mod contours;
pub mod document;
pub mod perspective;
pub mod bubbles;
pub mod grid;
pub mod selection;
