//! Positioned text from page content streams
//!
//! A small interpreter for the text-related operators: it tracks the CTM,
//! text and line matrices and the text state well enough to place every
//! shown string on the page. Glyph widths are estimated from the font size,
//! since cell detection only needs approximate extents.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use serde::{Deserialize, Serialize};

/// Average glyph advance in text space, as a fraction of the font size
const AVG_GLYPH_WIDTH: f64 = 0.5;

/// One shown string with its position in default user space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    /// Left edge
    pub x: f64,
    /// Baseline
    pub y: f64,
    pub width: f64,
    /// Rendered font size
    pub font_size: f64,
}

impl TextRun {
    pub fn x1(&self) -> f64 {
        self.x + self.width
    }
}

/// Affine transform `[a b c d e f]`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f64; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(tx: f64, ty: f64) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other`
    fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn horizontal_scale(&self) -> f64 {
        (self.0[0] * self.0[0] + self.0[1] * self.0[1]).sqrt()
    }

    fn vertical_scale(&self) -> f64 {
        (self.0[2] * self.0[2] + self.0[3] * self.0[3]).sqrt()
    }
}

#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    ctm: Matrix,
    font_size: f64,
    leading: f64,
    char_spacing: f64,
    word_spacing: f64,
    /// Tz / 100
    horizontal_scaling: f64,
    rise: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            font_size: 0.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            rise: 0.0,
        }
    }
}

#[derive(Default)]
struct Interpreter {
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    runs: Vec<TextRun>,
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(&operands[operands.len() - N..]) {
        *slot = number(obj)?;
    }
    Some(out)
}

/// Decode a PDF string: UTF-16BE with BOM, then UTF-8, then Latin-1
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        if let Ok(s) = String::from_utf16(&units) {
            return s;
        }
    }
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    bytes.iter().map(|&b| b as char).collect()
}

impl Interpreter {
    fn run(&mut self, content: &Content) {
        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => self.stack.push(self.state),
                "Q" => {
                    if let Some(saved) = self.stack.pop() {
                        self.state = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = numbers::<6>(operands) {
                        self.state.ctm = Matrix(m).then(&self.state.ctm);
                    }
                }
                "BT" => {
                    self.text_matrix = Matrix::IDENTITY;
                    self.line_matrix = Matrix::IDENTITY;
                }
                "Tf" => {
                    if let Some([size]) = numbers::<1>(operands) {
                        self.state.font_size = size;
                    }
                }
                "TL" => {
                    if let Some([leading]) = numbers::<1>(operands) {
                        self.state.leading = leading;
                    }
                }
                "Tc" => {
                    if let Some([tc]) = numbers::<1>(operands) {
                        self.state.char_spacing = tc;
                    }
                }
                "Tw" => {
                    if let Some([tw]) = numbers::<1>(operands) {
                        self.state.word_spacing = tw;
                    }
                }
                "Tz" => {
                    if let Some([tz]) = numbers::<1>(operands) {
                        self.state.horizontal_scaling = tz / 100.0;
                    }
                }
                "Ts" => {
                    if let Some([ts]) = numbers::<1>(operands) {
                        self.state.rise = ts;
                    }
                }
                "Td" => {
                    if let Some([tx, ty]) = numbers::<2>(operands) {
                        self.move_line(tx, ty);
                    }
                }
                "TD" => {
                    if let Some([tx, ty]) = numbers::<2>(operands) {
                        self.state.leading = -ty;
                        self.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = numbers::<6>(operands) {
                        self.text_matrix = Matrix(m);
                        self.line_matrix = Matrix(m);
                    }
                }
                "T*" => self.next_line(),
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(bytes);
                    }
                }
                "'" => {
                    self.next_line();
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(bytes);
                    }
                }
                "\"" => {
                    if let [aw, ac, Object::String(bytes, _)] = operands {
                        if let (Some(aw), Some(ac)) = (number(aw), number(ac)) {
                            self.state.word_spacing = aw;
                            self.state.char_spacing = ac;
                        }
                        self.next_line();
                        self.show(bytes);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        for item in items {
                            match item {
                                Object::String(bytes, _) => self.show(bytes),
                                other => {
                                    if let Some(adjust) = number(other) {
                                        let st = self.state;
                                        self.advance(
                                            -adjust / 1000.0 * st.font_size * st.horizontal_scaling,
                                        );
                                    }
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.leading;
        self.move_line(0.0, -leading);
    }

    fn advance(&mut self, tx: f64) {
        self.text_matrix = Matrix::translate(tx, 0.0).then(&self.text_matrix);
    }

    fn show(&mut self, bytes: &[u8]) {
        let text = decode_pdf_string(bytes);
        let st = self.state;

        let advance: f64 = text
            .chars()
            .map(|ch| {
                let spacing = if ch == ' ' { st.word_spacing } else { 0.0 };
                (AVG_GLYPH_WIDTH * st.font_size + st.char_spacing + spacing) * st.horizontal_scaling
            })
            .sum();

        let render = Matrix([
            st.font_size * st.horizontal_scaling,
            0.0,
            0.0,
            st.font_size,
            0.0,
            st.rise,
        ]);
        let device = self.text_matrix.then(&st.ctm);
        let origin = render.then(&device);

        if !text.trim().is_empty() {
            self.runs.push(TextRun {
                text,
                x: origin.0[4],
                y: origin.0[5],
                width: advance * device.horizontal_scale(),
                font_size: (st.font_size * device.vertical_scale()).abs(),
            });
        }

        self.advance(advance);
    }
}

/// Text runs of one page in content-stream order
pub fn page_text_runs(doc: &Document, page_id: ObjectId) -> Vec<TextRun> {
    let Ok(bytes) = doc.get_page_content(page_id) else {
        return Vec::new();
    };
    let Ok(content) = Content::decode(&bytes) else {
        return Vec::new();
    };
    text_runs(&content)
}

/// Text runs of an already-decoded content stream
pub fn text_runs(content: &Content) -> Vec<TextRun> {
    let mut interp = Interpreter::default();
    interp.run(content);
    interp.runs
}
