use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

pub const BUBBLE_RADIUS: i32 = 14;
pub const RING_THICKNESS: i32 = 3;
pub const SPACING: i32 = 60;
pub const ORIGIN: (i32, i32) = (80, 60);
pub const PHOTO_MARGIN: u32 = 80;

const PAPER: Rgb<u8> = Rgb([235, 235, 230]);
const INK: Rgb<u8> = Rgb([30, 30, 40]);
const BACKGROUND: Rgb<u8> = Rgb([40, 45, 50]);

/// Synthetic answer sheet: one row of five bubbles per question.
#[derive(Clone, Debug)]
pub struct SheetBuilder {
    questions: usize,
    filled: Vec<(usize, usize)>,
    omitted: Vec<(usize, usize)>,
    skew: i32,
    slant: i32,
}

impl SheetBuilder {
    pub fn new(questions: usize) -> Self {
        Self {
            questions,
            filled: Vec::new(),
            omitted: Vec::new(),
            skew: 0,
            slant: 0,
        }
    }

    /// Fill one bubble per question, `choices[q]` being the choice index.
    pub fn answers(mut self, choices: &[usize]) -> Self {
        for (q, &c) in choices.iter().enumerate() {
            self.filled.push((q, c));
        }
        self
    }

    pub fn fill(mut self, question: usize, choice: usize) -> Self {
        self.filled.push((question, choice));
        self
    }

    /// Leave a bubble off the sheet entirely.
    pub fn omit(mut self, question: usize, choice: usize) -> Self {
        self.omitted.push((question, choice));
        self
    }

    /// Pull the sheet's corners inward by up to `skew` pixels in the photo.
    pub fn skew(mut self, skew: i32) -> Self {
        self.skew = skew;
        self
    }

    /// Print each column `slant` pixels lower than the one to its left.
    pub fn slant(mut self, slant: i32) -> Self {
        self.slant = slant;
        self
    }

    pub fn paper_size(&self) -> (u32, u32) {
        let drop = (4 * self.slant.max(0)) as u32;
        (400, (ORIGIN.1 as u32) * 2 + self.questions as u32 * SPACING as u32 + drop)
    }

    pub fn render_paper(&self) -> RgbImage {
        let (w, h) = self.paper_size();
        let mut paper = RgbImage::from_pixel(w, h, PAPER);

        for q in 0..self.questions {
            for c in 0..5 {
                if self.omitted.contains(&(q, c)) {
                    continue;
                }
                let cx = ORIGIN.0 + c as i32 * SPACING;
                let cy = ORIGIN.1 + q as i32 * SPACING + c as i32 * self.slant;
                let filled = self.filled.contains(&(q, c));
                draw_bubble(&mut paper, cx, cy, filled);
            }
        }
        paper
    }

    /// The sheet photographed on a dark table.
    pub fn render_photo(&self) -> DynamicImage {
        let paper = self.render_paper();
        let (w, h) = paper.dimensions();
        let m = PHOTO_MARGIN as f32;
        let (wf, hf) = ((w - 1) as f32, (h - 1) as f32);
        let s = self.skew as f32;

        let from = [(0.0, 0.0), (wf, 0.0), (wf, hf), (0.0, hf)];
        let to = [
            (m + s, m),
            (m + wf - s / 2.0, m + s),
            (m + wf, m + hf),
            (m, m + hf - s),
        ];
        let projection =
            Projection::from_control_points(from, to).expect("sheet corners are not degenerate");

        let mut photo = RgbImage::from_pixel(w + 2 * PHOTO_MARGIN, h + 2 * PHOTO_MARGIN, BACKGROUND);
        warp_into(&paper, &projection, Interpolation::Bilinear, BACKGROUND, &mut photo);
        DynamicImage::ImageRgb8(photo)
    }
}

fn draw_bubble(img: &mut RgbImage, cx: i32, cy: i32, filled: bool) {
    let inner = (BUBBLE_RADIUS - RING_THICKNESS) * (BUBBLE_RADIUS - RING_THICKNESS);
    let outer = BUBBLE_RADIUS * BUBBLE_RADIUS;
    for y in cy - BUBBLE_RADIUS..=cy + BUBBLE_RADIUS {
        for x in cx - BUBBLE_RADIUS..=cx + BUBBLE_RADIUS {
            let d = (x - cx) * (x - cx) + (y - cy) * (y - cy);
            if d <= outer && (filled || d > inner) {
                img.put_pixel(x as u32, y as u32, INK);
            }
        }
    }
}

/// Encode an image as PNG bytes, as an upload would arrive.
pub fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode test image");
    buf.into_inner()
}

/// Writes the image to a temp PNG; the file is removed when dropped.
pub fn write_temp_png(img: &DynamicImage) -> tempfile::NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), ImageFormat::Png)
        .expect("Failed to save test image");
    file
}
