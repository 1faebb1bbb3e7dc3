/// Dot bit for pixel (x % 2, y % 4) within one braille cell:
/// ```text
/// 0x01 0x08
/// 0x02 0x10
/// 0x04 0x20
/// 0x40 0x80
/// ```
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

const BRAILLE_BASE: u32 = 0x2800;

/// Dot layer over a grid of character cells, each cell a 2x4 braille
/// pattern (U+2800 to U+28FF). Pixel coordinates are braille dots, so a
/// `cols` x `rows` canvas is `cols * 2` x `rows * 4` pixels.
pub struct BrailleCanvas {
    cols: usize,
    rows: usize,
    /// Dot pattern per cell, row-major
    cells: Vec<u8>,
}

impl BrailleCanvas {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![0u8; cols * rows],
        }
    }

    /// Set the dot at pixel (x, y). Pixels off the canvas are dropped.
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let (col, row) = (x / 2, y / 4);
        if col < self.cols && row < self.rows {
            self.cells[row * self.cols + col] |= DOT_BITS[x % 2][y % 4];
        }
    }

    /// Like [`set_pixel`](Self::set_pixel), for coordinates that may be
    /// left of or above the canvas
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Glyph for a character cell, `None` when no dot is set
    pub fn glyph(&self, col: usize, row: usize) -> Option<char> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        match self.cells[row * self.cols + col] {
            0 => None,
            bits => char::from_u32(BRAILLE_BASE + bits as u32),
        }
    }

    #[cfg(test)]
    pub(crate) fn render_rows(&self) -> String {
        (0..self.rows)
            .map(|row| {
                (0..self.cols)
                    .map(|col| self.glyph(col, row).unwrap_or('\u{2800}'))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_dot() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0);
        assert_eq!(canvas.render_rows(), "⠁");
    }

    #[test]
    fn test_full_cell() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y);
            }
        }
        assert_eq!(canvas.render_rows(), "⣿");
    }

    #[test]
    fn test_diagonal_spans_cells() {
        let mut canvas = BrailleCanvas::new(2, 2);
        for i in 0..4 {
            canvas.set_pixel(i, i);
        }
        canvas.set_pixel(0, 4);
        // 0x01 | 0x10, then 0x04 | 0x80; second row holds the lone top-left dot
        assert_eq!(canvas.render_rows(), "⠑⢄\n⠁⠀");
    }

    #[test]
    fn test_glyph_and_clipping() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.set_pixel_signed(-1, 0);
        canvas.set_pixel(100, 0);
        assert_eq!(canvas.glyph(0, 0), None);
        canvas.set_pixel(3, 0);
        assert_eq!(canvas.glyph(1, 0), Some('⠈'));
        assert_eq!(canvas.glyph(5, 5), None);
    }
}
