use crate::percolation::SiteView;
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

pub const OPEN_COLOR: Color = Color::White;
pub const FULL_COLOR: Color = Color::LightBlue;

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// Side length in dots of the square area the grid is drawn into
pub fn square_dots(canvas_width: u16, canvas_height: u16) -> usize {
    (canvas_width as usize * 2).min(canvas_height as usize * 4)
}

/// Render an n-by-n grid of site views to Braille characters.
///
/// The grid is scaled into the largest square of dots that fits the canvas.
/// Open sites are lit dots; a character is drawn in `FULL_COLOR` if any of
/// its dots samples a full site.
pub fn render_to_braille(
    sites: &[SiteView],
    n: usize,
    canvas_width: u16,
    canvas_height: u16,
) -> Vec<BrailleCell> {
    let side = square_dots(canvas_width, canvas_height);
    if n == 0 || side == 0 {
        return Vec::new();
    }

    let mut cells = Vec::with_capacity((canvas_width as usize) * (canvas_height as usize));

    for cy in 0..canvas_height {
        for cx in 0..canvas_width {
            let mut pattern: u8 = 0;
            let mut any_full = false;

            let base_bx = cx as usize * 2;
            let base_by = cy as usize * 4;

            for dx in 0..2 {
                for dy in 0..4 {
                    let braille_x = base_bx + dx;
                    let braille_y = base_by + dy;
                    if braille_x >= side || braille_y >= side {
                        continue;
                    }

                    let col = braille_x * n / side;
                    let row = braille_y * n / side;

                    match sites[row * n + col] {
                        SiteView::Blocked => {}
                        SiteView::Open => pattern |= BRAILLE_DOTS[dx][dy],
                        SiteView::Full => {
                            pattern |= BRAILLE_DOTS[dx][dy];
                            any_full = true;
                        }
                    }
                }
            }

            // Only emit cells that have at least one dot
            if pattern != 0 {
                let braille_char = char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' ');
                cells.push(BrailleCell {
                    x: cx,
                    y: cy,
                    char: braille_char,
                    color: if any_full { FULL_COLOR } else { OPEN_COLOR },
                });
            }
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braille_pattern() {
        assert_eq!(BRAILLE_DOTS[0][0], 0x01); // Top-left
        assert_eq!(BRAILLE_DOTS[1][0], 0x08); // Top-right
        assert_eq!(BRAILLE_DOTS[0][3], 0x40); // Bottom-left
        assert_eq!(BRAILLE_DOTS[1][3], 0x80); // Bottom-right

        let all_dots: u8 = BRAILLE_DOTS[0].iter().sum::<u8>() + BRAILLE_DOTS[1].iter().sum::<u8>();
        assert_eq!(all_dots, 0xFF);
    }

    #[test]
    fn test_square_dots() {
        assert_eq!(square_dots(10, 10), 20);
        assert_eq!(square_dots(40, 2), 8);
        assert_eq!(square_dots(0, 10), 0);
    }

    #[test]
    fn test_blocked_grid_emits_nothing() {
        let sites = vec![SiteView::Blocked; 16];
        assert!(render_to_braille(&sites, 4, 4, 2).is_empty());
    }

    #[test]
    fn test_single_full_site_fills_square() {
        // 4x2 canvas is an 8x8 dot square, all sampling the one site
        let cells = render_to_braille(&[SiteView::Full], 1, 4, 2);
        assert_eq!(cells.len(), 8);
        assert!(cells.iter().all(|c| c.char == '\u{28FF}' && c.color == FULL_COLOR));
    }

    #[test]
    fn test_open_and_full_columns() {
        // 2x2 grid on a 2x1 canvas: 4x4 dots, one character per column pair
        let sites = [
            SiteView::Full,
            SiteView::Blocked,
            SiteView::Full,
            SiteView::Open,
        ];
        let cells = render_to_braille(&sites, 2, 2, 1);
        assert_eq!(cells.len(), 2);

        // Left character: whole 2x4 block is the full left column
        assert_eq!(cells[0].char, '\u{28FF}');
        assert_eq!(cells[0].color, FULL_COLOR);

        // Right character: only the bottom half (rows 2,3) is open
        let bottom_half = char::from_u32(BRAILLE_BASE + 0x04 + 0x40 + 0x20 + 0x80).unwrap();
        assert_eq!(cells[1].char, bottom_half);
        assert_eq!(cells[1].color, OPEN_COLOR);
    }
}
