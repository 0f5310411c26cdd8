use crate::error::ExportError;
use image::RgbImage;
use std::path::Path;

/// A4 portrait, in millimetres.
pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;

const MARGIN_MM: f64 = 10.0;
const SECTION_WIDTH_MM: f64 = 190.0;
const SECTION_GAP_MM: f64 = 5.0;
const FIRST_SECTION_Y_MM: f64 = 20.0;
/// Sections may not end below this line.
const LOWEST_SECTION_END_MM: f64 = 295.0 - MARGIN_MM;

pub const DOCUMENT_TITLE: &str = "Anesthesia Monitoring Record";

/// Where one captured section lands in the document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Position of the section in the capture list.
    pub section: usize,
    pub page: usize,
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// The document plan: a centred title on the first page, then every section
/// scaled to the page width and stacked top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct PageLayout {
    pub title: String,
    /// Centre of the title baseline.
    pub title_position: (f64, f64),
    pub placements: Vec<Placement>,
}

impl PageLayout {
    /// Plans sections given their pixel sizes.
    pub fn plan(title: &str, sizes: &[(u32, u32)]) -> Result<Self, ExportError> {
        let mut placements = Vec::with_capacity(sizes.len());
        let mut page = 0;
        let mut y = FIRST_SECTION_Y_MM;

        for (index, &(width, height)) in sizes.iter().enumerate() {
            if width == 0 || height == 0 {
                return Err(ExportError::InvalidSection {
                    index,
                    width,
                    height,
                });
            }
            let height_mm = f64::from(height) * SECTION_WIDTH_MM / f64::from(width);
            let at_page_top = y == MARGIN_MM;
            if y + height_mm > LOWEST_SECTION_END_MM && !at_page_top {
                page += 1;
                y = MARGIN_MM;
            }
            placements.push(Placement {
                section: index,
                page,
                x_mm: MARGIN_MM,
                y_mm: y,
                width_mm: SECTION_WIDTH_MM,
                height_mm,
            });
            y += height_mm + SECTION_GAP_MM;
        }

        Ok(PageLayout {
            title: title.to_string(),
            title_position: (PAGE_WIDTH_MM / 2.0, MARGIN_MM),
            placements,
        })
    }

    pub fn from_captures(title: &str, captures: &[RgbImage]) -> Result<Self, ExportError> {
        let sizes: Vec<(u32, u32)> = captures.iter().map(RgbImage::dimensions).collect();
        PageLayout::plan(title, &sizes)
    }

    pub fn page_count(&self) -> usize {
        self.placements
            .last()
            .map_or(1, |placement| placement.page + 1)
    }

    pub fn on_page(&self, page: usize) -> impl Iterator<Item = &Placement> + '_ {
        self.placements
            .iter()
            .filter(move |placement| placement.page == page)
    }
}

/// Reads a section capture saved as an image file.
pub fn read_capture(path: &Path) -> Result<RgbImage, ExportError> {
    let capture = image::open(path).map_err(|source| ExportError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(capture.into_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    #[test]
    fn title_and_first_section() {
        let layout = PageLayout::plan(DOCUMENT_TITLE, &[(1900, 500)]).unwrap();
        assert_eq!(layout.title_position, (105.0, 10.0));
        assert_eq!(
            layout.placements,
            vec![Placement {
                section: 0,
                page: 0,
                x_mm: 10.0,
                y_mm: 20.0,
                width_mm: 190.0,
                height_mm: 50.0,
            }]
        );
        assert_eq!(layout.page_count(), 1);
    }

    #[test]
    fn sections_stack_with_gap() {
        let layout = PageLayout::plan(DOCUMENT_TITLE, &[(190, 100), (380, 100)]).unwrap();
        assert_eq!(layout.placements[1].y_mm, 20.0 + 100.0 + 5.0);
        assert_eq!(layout.placements[1].height_mm, 50.0);
    }

    #[test]
    fn overflowing_section_starts_a_new_page() {
        // 20 + 200 + 5 = 225; another 100 would end at 325 > 285.
        let sections = [(190, 200), (190, 100), (190, 50)];
        let layout = PageLayout::plan(DOCUMENT_TITLE, &sections).unwrap();
        assert_eq!(layout.placements[1].page, 1);
        assert_eq!(layout.placements[1].y_mm, 10.0);
        assert_eq!(layout.placements[2].page, 1);
        assert_eq!(layout.placements[2].y_mm, 115.0);
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.on_page(1).count(), 2);
    }

    #[test]
    fn oversized_sections_get_a_page_each() {
        let layout = PageLayout::plan(DOCUMENT_TITLE, &[(190, 400), (190, 400)]).unwrap();
        let pages: Vec<usize> = layout.placements.iter().map(|p| p.page).collect();
        assert_eq!(pages, vec![1, 2]);
    }

    #[test]
    fn empty_capture_is_refused() {
        let captures = vec![RgbImage::new(10, 10), RgbImage::new(0, 10)];
        assert!(matches!(
            PageLayout::from_captures(DOCUMENT_TITLE, &captures),
            Err(ExportError::InvalidSection { index: 1, width: 0, height: 10 })
        ));
    }

    #[test]
    fn reads_capture_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vitals.png");
        RgbImage::from_pixel(4, 2, Rgb([255, 255, 255])).save(&path).unwrap();
        let capture = read_capture(&path).unwrap();
        assert_eq!(capture.dimensions(), (4, 2));
        assert_eq!(capture.get_pixel(3, 1), &Rgb([255, 255, 255]));
        assert!(matches!(
            read_capture(&dir.path().join("missing.png")),
            Err(ExportError::Image { .. })
        ));
    }
}
