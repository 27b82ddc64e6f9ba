//! # Connected Components
//!
//! Bounding-box statistics over binary masks. Line filtering and thickness
//! estimation work on 8-connected components; page-level table detection works
//! on outer contours so that anything nested inside a hole (cell text, inner
//! tables) is never reported as a region of its own.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::geometry::BoundingBox;

/// Label image produced by [`label_components`]; 0 is background.
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// One 8-connected component of a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub label: u32,
    pub bbox: BoundingBox,
    pub pixel_count: u32,
}

/// Labels the nonzero pixels of `mask` into 8-connected components.
///
/// Components are returned in label order, which follows raster order of each
/// component's first pixel.
pub fn label_components(mask: &GrayImage) -> (LabelImage, Vec<Component>) {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    let mut components: Vec<Component> = Vec::new();
    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel[0];
        if label == 0 {
            continue;
        }
        let index = (label - 1) as usize;
        if index >= components.len() {
            components.resize(
                index + 1,
                Component {
                    label: 0,
                    bbox: BoundingBox::new(u32::MAX, u32::MAX, 0, 0),
                    pixel_count: 0,
                },
            );
        }
        let component = &mut components[index];
        component.label = label;
        component.pixel_count += 1;
        component.bbox.x1 = component.bbox.x1.min(x);
        component.bbox.y1 = component.bbox.y1.min(y);
        component.bbox.x2 = component.bbox.x2.max(x + 1);
        component.bbox.y2 = component.bbox.y2.max(y + 1);
    }
    components.retain(|c| c.pixel_count > 0);

    (labels, components)
}

/// Bounding boxes of every 8-connected component of `mask`.
pub fn component_boxes(mask: &GrayImage) -> Vec<BoundingBox> {
    label_components(mask).1.into_iter().map(|c| c.bbox).collect()
}

/// Bounding boxes of first-level outer contours, in discovery order.
///
/// Shapes lying inside a hole of another shape are skipped.
pub fn outer_contour_boxes(mask: &GrayImage) -> Vec<BoundingBox> {
    find_contours::<u32>(mask)
        .into_iter()
        .filter(|contour| matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none())
        .filter_map(|contour| {
            let xs = contour.points.iter().map(|p| p.x);
            let ys = contour.points.iter().map(|p| p.y);
            let x1 = xs.clone().min()?;
            let x2 = xs.max()?;
            let y1 = ys.clone().min()?;
            let y2 = ys.max()?;
            Some(BoundingBox::new(x1, y1, x2 + 1, y2 + 1))
        })
        .collect()
}

/// Keeps only the mask pixels whose component satisfies `keep`.
pub fn retain_components(mask: &GrayImage, keep: impl Fn(&Component) -> bool) -> GrayImage {
    let (labels, components) = label_components(mask);
    let max_label = components.iter().map(|c| c.label).max().unwrap_or(0) as usize;
    let mut kept = vec![false; max_label + 1];
    for component in &components {
        kept[component.label as usize] = keep(component);
    }

    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let label = labels.get_pixel(x, y)[0] as usize;
        if label != 0 && kept.get(label).copied().unwrap_or(false) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}
