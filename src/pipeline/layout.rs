//! Page geometry and the fit-and-center placement rule.
//!
//! All lengths are millimetres with the origin at the page's top-left corner,
//! the convention a caller thinks in ("10 mm margin on A4"). Engines convert
//! to their own units; [`mm_to_points`] is provided for PDF-native engines.

use serde::{Deserialize, Serialize};

/// Points per millimetre (72 pt per inch, 25.4 mm per inch).
const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Convert millimetres to PDF points.
pub fn mm_to_points(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Physical page size and the uniform margin kept free on every side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4_portrait()
    }
}

impl PageGeometry {
    /// Margin used by the default page layouts.
    pub const DEFAULT_MARGIN_MM: f32 = 10.0;

    /// A4 portrait (210 × 297 mm) with a 10 mm margin.
    pub fn a4_portrait() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: Self::DEFAULT_MARGIN_MM,
        }
    }

    /// A4 landscape (297 × 210 mm) with a 10 mm margin.
    pub fn a4_landscape() -> Self {
        Self {
            width_mm: 297.0,
            height_mm: 210.0,
            margin_mm: Self::DEFAULT_MARGIN_MM,
        }
    }

    /// Same page with a different margin.
    pub fn with_margin(self, margin_mm: f32) -> Self {
        Self { margin_mm, ..self }
    }

    pub fn content_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn content_height(&self) -> f32 {
        self.height_mm - 2.0 * self.margin_mm
    }

    /// Rectangle covering the whole page.
    pub fn full_page(&self) -> Rect {
        Rect {
            x: 0.0,
            y: 0.0,
            width: self.width_mm,
            height: self.height_mm,
        }
    }

    /// Fit an image of `px_width` × `px_height` into the content rectangle,
    /// preserving its aspect ratio, and center it on the full page.
    ///
    /// A wider-than-content image is constrained by width, anything else by
    /// height. A degenerate (zero-sized) image gets the content rectangle.
    pub fn fit_centered(&self, px_width: u32, px_height: u32) -> Rect {
        let content_w = self.content_width();
        let content_h = self.content_height();

        let (width, height) = if px_width == 0 || px_height == 0 {
            (content_w, content_h)
        } else {
            let image_ratio = px_width as f32 / px_height as f32;
            let content_ratio = content_w / content_h;
            if image_ratio > content_ratio {
                (content_w, content_w / image_ratio)
            } else {
                (content_h * image_ratio, content_h)
            }
        };

        Rect {
            x: (self.width_mm - width) / 2.0,
            y: (self.height_mm - height) / 2.0,
            width,
            height,
        }
    }
}

/// Axis-aligned rectangle in millimetres, `y` measured down from the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Distance of the bottom edge from the page's bottom edge.
    ///
    /// PDF user space grows upwards from the bottom-left corner.
    pub fn bottom_from(&self, page_height: f32) -> f32 {
        page_height - self.y - self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < EPS, "{a} != {b}");
    }

    #[test]
    fn a4_content_rectangle() {
        let page = PageGeometry::a4_portrait();
        assert_close(page.content_width(), 190.0);
        assert_close(page.content_height(), 277.0);
    }

    #[test]
    fn wide_image_is_constrained_by_width() {
        let page = PageGeometry::a4_portrait();
        let rect = page.fit_centered(400, 100);
        assert_close(rect.width, 190.0);
        assert_close(rect.height, 47.5);
        assert_close(rect.x, 10.0);
        assert_close(rect.y, (297.0 - 47.5) / 2.0);
    }

    #[test]
    fn tall_image_is_constrained_by_height() {
        let page = PageGeometry::a4_portrait();
        let rect = page.fit_centered(100, 200);
        assert_close(rect.height, 277.0);
        assert_close(rect.width, 138.5);
        assert_close(rect.y, 10.0);
        assert_close(rect.x, (210.0 - 138.5) / 2.0);
    }

    #[test]
    fn placement_keeps_aspect_ratio_and_is_centered() {
        let page = PageGeometry::a4_portrait();
        for &(w, h) in &[(1, 1), (100, 200), (1920, 1080), (37, 1000), (3000, 2999)] {
            let rect = page.fit_centered(w, h);
            let source = w as f32 / h as f32;
            let placed = rect.width / rect.height;
            assert!((source - placed).abs() / source < 1e-4, "{w}x{h}");

            // Equal margins left/right and top/bottom.
            assert_close(rect.x, page.width_mm - rect.x - rect.width);
            assert_close(rect.y, page.height_mm - rect.y - rect.height);

            assert!(rect.width <= page.content_width() + EPS);
            assert!(rect.height <= page.content_height() + EPS);
        }
    }

    #[test]
    fn landscape_page_and_custom_margin() {
        let page = PageGeometry::a4_landscape().with_margin(0.0);
        let rect = page.fit_centered(297, 210);
        assert_close(rect.width, 297.0);
        assert_close(rect.height, 210.0);
        assert_close(rect.x, 0.0);
    }

    #[test]
    fn degenerate_image_gets_content_rect() {
        let page = PageGeometry::a4_portrait();
        let rect = page.fit_centered(0, 50);
        assert_close(rect.width, 190.0);
        assert_close(rect.height, 277.0);
    }

    #[test]
    fn unit_conversion() {
        assert_close(mm_to_points(25.4), 72.0);
        assert_close(mm_to_points(210.0), 595.2756);
        let rect = Rect {
            x: 0.0,
            y: 10.0,
            width: 5.0,
            height: 20.0,
        };
        assert_close(rect.bottom_from(297.0), 267.0);
    }
}
