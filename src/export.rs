use crate::percolation::{Percolation, SiteView};
use crate::stats::open_random_site;
use image::{ImageFormat, Rgb, RgbImage};
use rand::Rng;
use std::borrow::Cow;
use std::fs::File;
use std::path::Path;
use tracing::info;

const BLOCKED_RGB: [u8; 3] = [40, 40, 40];
const OPEN_RGB: [u8; 3] = [255, 255, 255];
const FULL_RGB: [u8; 3] = [107, 174, 214];

/// GIF global palette, indexed by `palette_index`
#[rustfmt::skip]
const PALETTE: [u8; 9] = [
    BLOCKED_RGB[0], BLOCKED_RGB[1], BLOCKED_RGB[2],
    OPEN_RGB[0], OPEN_RGB[1], OPEN_RGB[2],
    FULL_RGB[0], FULL_RGB[1], FULL_RGB[2],
];

/// Largest image side, in pixels, for either output format
const MAX_IMAGE_SIDE: u32 = 16_384;

/// Hundredths of a second between GIF frames
const FRAME_DELAY: u16 = 4;

fn site_rgb(site: SiteView) -> [u8; 3] {
    match site {
        SiteView::Blocked => BLOCKED_RGB,
        SiteView::Open => OPEN_RGB,
        SiteView::Full => FULL_RGB,
    }
}

fn palette_index(site: SiteView) -> u8 {
    match site {
        SiteView::Blocked => 0,
        SiteView::Open => 1,
        SiteView::Full => 2,
    }
}

/// Side in pixels of an n x n grid drawn at `scale` pixels per site
fn image_side(n: usize, scale: u32) -> Result<u32, String> {
    u32::try_from(n)
        .ok()
        .and_then(|n| n.checked_mul(scale.max(1)))
        .filter(|&side| side <= MAX_IMAGE_SIDE)
        .ok_or_else(|| {
            format!(
                "image of {} sites at scale {} exceeds {} pixels per side",
                n, scale, MAX_IMAGE_SIDE
            )
        })
}

/// Render the grid with `scale` x `scale` pixels per site
pub fn render_image(grid: &mut Percolation, scale: u32) -> Result<RgbImage, String> {
    let side = image_side(grid.size(), scale)?;
    let scale = scale.max(1);
    // Fits, since n * scale did
    let n = grid.size() as u32;
    let sites = grid.snapshot().map_err(|e| e.to_string())?;
    Ok(RgbImage::from_fn(side, side, |x, y| {
        let idx = (y / scale) * n + (x / scale);
        Rgb(site_rgb(sites[idx as usize]))
    }))
}

/// Save a PNG snapshot of the grid
pub fn save_png(grid: &mut Percolation, scale: u32, path: &Path) -> Result<(), String> {
    let img = render_image(grid, scale)?;
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|e| format!("Failed to write PNG: {}", e))?;
    info!(path = %path.display(), width = img.width(), "saved grid snapshot");
    Ok(())
}

/// Run one trial on a fresh grid and save the percolated grid as a PNG.
/// Returns the trial's threshold.
pub fn save_trial_png<R: Rng + ?Sized>(
    n: usize,
    scale: u32,
    rng: &mut R,
    path: &Path,
) -> Result<f64, String> {
    image_side(n, scale)?;
    let mut grid = Percolation::new(n).map_err(|e| e.to_string())?;
    while !grid.percolates() {
        if open_random_site(&mut grid, rng)
            .map_err(|e| e.to_string())?
            .is_none()
        {
            break;
        }
    }
    save_png(&mut grid, scale, path)?;
    Ok(grid.number_of_open_sites() as f64 / (n * n) as f64)
}

fn gif_frame(grid: &mut Percolation, scale: usize) -> Result<Vec<u8>, String> {
    let n = grid.size();
    let sites = grid.snapshot().map_err(|e| e.to_string())?;
    let side = n * scale;
    let mut pixels = Vec::with_capacity(side * side);
    for y in 0..side {
        let row = (y / scale) * n;
        for x in 0..side {
            pixels.push(palette_index(sites[row + x / scale]));
        }
    }
    Ok(pixels)
}

/// Run one trial on a fresh grid, recording it as an animated GIF.
///
/// A frame is written every n²/100 openings (at least every opening) and
/// once more when the grid percolates. Returns the trial's threshold.
pub fn record_trial_gif<R: Rng + ?Sized>(
    n: usize,
    scale: u32,
    rng: &mut R,
    path: &Path,
) -> Result<f64, String> {
    let side = image_side(n, scale)?;
    let side = u16::try_from(side)
        .map_err(|_| format!("GIF side of {} pixels is too large", side))?;
    let scale = scale.max(1) as usize;
    let mut grid = Percolation::new(n).map_err(|e| e.to_string())?;

    let file = File::create(path).map_err(|e| format!("Failed to create GIF file: {}", e))?;
    let mut encoder = gif::Encoder::new(file, side, side, &PALETTE)
        .map_err(|e| format!("Failed to start GIF: {}", e))?;
    encoder
        .set_repeat(gif::Repeat::Infinite)
        .map_err(|e| format!("Failed to write GIF header: {}", e))?;

    let mut write_frame = |grid: &mut Percolation| -> Result<(), String> {
        let mut frame = gif::Frame::default();
        frame.width = side;
        frame.height = side;
        frame.delay = FRAME_DELAY;
        frame.buffer = Cow::Owned(gif_frame(grid, scale)?);
        encoder
            .write_frame(&frame)
            .map_err(|e| format!("Failed to write GIF frame: {}", e))
    };

    let every = (n * n / 100).max(1);
    let mut frames = 0usize;
    while !grid.percolates() {
        if open_random_site(&mut grid, rng)
            .map_err(|e| e.to_string())?
            .is_none()
        {
            break;
        }
        if grid.number_of_open_sites() % every == 0 {
            write_frame(&mut grid)?;
            frames += 1;
        }
    }
    write_frame(&mut grid)?;
    frames += 1;

    let threshold = grid.number_of_open_sites() as f64 / (n * n) as f64;
    info!(path = %path.display(), frames, threshold, "saved trial animation");
    Ok(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    #[test]
    fn test_render_image_colors() {
        let mut grid = Percolation::new(2).unwrap();
        grid.open(1, 1).unwrap();
        grid.open(2, 2).unwrap();

        let img = render_image(&mut grid, 3).unwrap();
        assert_eq!(img.dimensions(), (6, 6));
        assert_eq!(img.get_pixel(0, 0).0, FULL_RGB);
        assert_eq!(img.get_pixel(2, 2).0, FULL_RGB);
        assert_eq!(img.get_pixel(3, 0).0, BLOCKED_RGB);
        assert_eq!(img.get_pixel(5, 5).0, OPEN_RGB);
    }

    #[test]
    fn test_save_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid.png");
        let mut grid = Percolation::new(4).unwrap();
        grid.open(1, 2).unwrap();

        save_png(&mut grid, 2, &path).unwrap();

        let loaded = image::open(&path).unwrap();
        assert_eq!(loaded.width(), 8);
        assert_eq!(loaded.height(), 8);
    }

    #[test]
    fn test_save_trial_png_single_site() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("one.png");
        let mut rng = StdRng::seed_from_u64(4);

        let threshold = save_trial_png(1, 5, &mut rng, &path).unwrap();
        assert_eq!(threshold, 1.0);

        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (5, 5));
        assert_eq!(loaded.get_pixel(2, 2).0, FULL_RGB);
    }

    #[test]
    fn test_gif_frame_layout() {
        let mut grid = Percolation::new(2).unwrap();
        grid.open(1, 2).unwrap();
        assert_eq!(gif_frame(&mut grid, 1).unwrap(), vec![0, 2, 0, 0]);
        assert_eq!(gif_frame(&mut grid, 2).unwrap().len(), 16);
    }

    #[test]
    fn test_record_trial_gif() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trial.gif");
        let mut rng = StdRng::seed_from_u64(2);

        let threshold = record_trial_gif(8, 2, &mut rng, &path).unwrap();
        assert!(threshold > 0.0 && threshold <= 1.0);

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
    }

    #[test]
    fn test_gif_too_large() {
        let dir = TempDir::new().unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let result = record_trial_gif(70_000, 1, &mut rng, &dir.path().join("x.gif"));
        assert!(result.is_err());
    }

    #[test]
    fn test_png_too_large() {
        let mut grid = Percolation::new(3).unwrap();
        assert!(render_image(&mut grid, 1 << 31).is_err());
        assert!(render_image(&mut grid, 3_000_000_000).is_err());
        assert!(render_image(&mut grid, MAX_IMAGE_SIDE).is_err());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.png");
        let mut rng = StdRng::seed_from_u64(2);
        assert!(save_trial_png(3, 3_000_000_000, &mut rng, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_image_side_limits() {
        assert_eq!(image_side(3, 0), Ok(3));
        assert_eq!(image_side(4, 4096), Ok(MAX_IMAGE_SIDE));
        assert!(image_side(4, 4097).is_err());
        assert!(image_side(usize::MAX, 1).is_err());
    }
}
