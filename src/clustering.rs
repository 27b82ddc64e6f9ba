//! # Grid Position Clustering
//!
//! Collapses the pixel coordinates of a line mask into one position per
//! ruling line. A rule several pixels thick, or one that wobbles slightly,
//! contributes many nearby coordinates; greedy one-dimensional clustering
//! merges them while consecutive values stay within a tolerance.

use std::collections::BTreeSet;

use image::GrayImage;

use crate::geometry::{Axis, GridAxis};

/// Clusters ascending, de-duplicated coordinates into grid positions.
///
/// A coordinate joins the current cluster when its gap to the cluster's last
/// member is at most `tolerance`; otherwise the cluster closes and a new one
/// starts. Each cluster becomes its mean rounded to the nearest integer, so
/// the result is strictly increasing.
pub fn cluster_positions(coords: &[u32], tolerance: u32) -> GridAxis {
    let mut positions = GridAxis::new();
    let mut cluster: Vec<u32> = Vec::new();

    for &coord in coords {
        if let Some(&last) = cluster.last() {
            if coord.saturating_sub(last) > tolerance {
                positions.push(cluster_center(&cluster));
                cluster.clear();
            }
        }
        cluster.push(coord);
    }
    if !cluster.is_empty() {
        positions.push(cluster_center(&cluster));
    }

    positions
}

fn cluster_center(cluster: &[u32]) -> u32 {
    let sum: u64 = cluster.iter().map(|&c| u64::from(c)).sum();
    (sum as f64 / cluster.len() as f64).round() as u32
}

/// Distinct rows (horizontal) or columns (vertical) holding ink, ascending.
pub fn ink_coordinates(mask: &GrayImage, axis: Axis) -> Vec<u32> {
    let coords: BTreeSet<u32> = mask
        .enumerate_pixels()
        .filter(|(_, _, pixel)| pixel[0] > 0)
        .map(|(x, y, _)| match axis {
            Axis::Horizontal => y,
            Axis::Vertical => x,
        })
        .collect();
    coords.into_iter().collect()
}

/// Grid positions of the lines in `mask`, in the mask's local coordinates.
///
/// Horizontal masks yield y positions, vertical masks yield x positions. An
/// empty mask yields an empty axis.
pub fn grid_positions(mask: &GrayImage, axis: Axis, tolerance: u32) -> GridAxis {
    let positions = cluster_positions(&ink_coordinates(mask, axis), tolerance);

    tracing::debug!(
        target: "table_grid",
        axis = axis.as_str(),
        tolerance,
        positions = positions.len(),
        "Clustered grid positions"
    );

    positions
}
