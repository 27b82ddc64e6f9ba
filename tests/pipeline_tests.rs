//! # Grid Extraction Pipeline Tests
//!
//! End-to-end extraction on synthetic pages: region detection, the two-pass
//! line stage, clustering and assembly together.


#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use image::DynamicImage;
    use pdeffer::debug::{DirectorySink, NoopSink};
    use pdeffer::detection::DetectionMode;
    use pdeffer::pipeline::{extract_tables, GridExtractor};
    use pdeffer::{BoundingBox, ExtractionError, GridConfig};
    use tempfile::TempDir;

    /// One 4x3 table with 1px rules comes back as 4 rows of 3 cells
    #[test]
    fn test_four_by_three_table() {
        let tables = extract_tables(&four_by_three_page(), &GridConfig::default())
            .expect("page is readable");

        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.region, BoundingBox::new(50, 40, 351, 241));
        assert_eq!(table.rows.len(), 4);
        for (r, row) in table.rows.iter().enumerate() {
            assert_eq!(row.len(), 3, "row {}", r);
            assert!(row.cells.windows(2).all(|w| w[0].bbox.x1 < w[1].bbox.x1));
            for (c, cell) in row.cells.iter().enumerate() {
                assert_eq!((cell.row, cell.col), (r, c));
                assert!(table.region.contains(&cell.bbox));
            }
        }
        assert!(table.rows.windows(2).all(|w| w[0].top() < w[1].top()));
    }

    /// Cell edges land within clustering tolerance of the drawn rules
    #[test]
    fn test_cell_edges_follow_rules() {
        let config = GridConfig::default();
        let tables = extract_tables(&four_by_three_page(), &config).expect("page is readable");
        let table = &tables[0];

        let lefts: Vec<u32> = table.rows[0].cells.iter().map(|c| c.bbox.x1).collect();
        for (found, expected) in lefts.iter().zip([50u32, 150, 250]) {
            assert!(found.abs_diff(expected) <= config.x_tolerance, "{} vs {}", found, expected);
        }
        let tops: Vec<u32> = table.rows.iter().filter_map(|row| row.top()).collect();
        for (found, expected) in tops.iter().zip([40u32, 90, 140, 190]) {
            assert!(found.abs_diff(expected) <= config.y_tolerance, "{} vs {}", found, expected);
        }
    }

    /// Text inside cells does not change the grid
    #[test]
    fn test_cell_text_is_ignored() {
        let mut page = blank_page(400, 300);
        draw_ruled_table(&mut page, &[50, 150, 250, 350], &[40, 90, 140, 190, 240]);
        for (x, y) in [(70, 60), (170, 110), (270, 210)] {
            draw_word(&mut page, x, y);
        }

        let tables = extract_tables(&DynamicImage::ImageRgb8(page), &GridConfig::default())
            .expect("page is readable");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].cell_count(), 12);
    }

    /// Two disjoint tables yield two independent grids
    #[test]
    fn test_two_disjoint_tables() {
        let tables = extract_tables(&two_table_page(), &GridConfig::default())
            .expect("page is readable");

        assert_eq!(tables.len(), 2);
        assert!(!tables[0].region.intersects(&tables[1].region));
        assert_eq!((tables[0].rows.len(), tables[0].rows[0].len()), (2, 2));
        assert_eq!((tables[1].rows.len(), tables[1].rows[0].len()), (3, 3));
    }

    /// The line-intersection detector reaches the same grid
    #[test]
    fn test_line_intersection_mode() {
        let config = GridConfig::default().with_mode(DetectionMode::LineIntersection);
        let tables = extract_tables(&four_by_three_page(), &config).expect("page is readable");

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].region, BoundingBox::new(50, 40, 351, 241));
        assert_eq!(tables[0].rows.len(), 4);
        assert_eq!(tables[0].cell_count(), 12);
    }

    /// A blank page has no tables and is not an error
    #[test]
    fn test_blank_page() {
        let page = DynamicImage::ImageRgb8(blank_page(300, 200));
        for mode in [DetectionMode::ContourArea, DetectionMode::LineIntersection] {
            let tables = extract_tables(&page, &GridConfig::default().with_mode(mode))
                .expect("blank page is readable");
            assert!(tables.is_empty());
        }
    }

    /// A box of horizontal rules only gives an empty table, not a failure
    #[test]
    fn test_region_without_vertical_rules() {
        let mut page = blank_page(400, 300);
        // outer frame makes the region detectable, inner rules are horizontal
        draw_ruled_table(&mut page, &[50, 350], &[40, 240]);
        for y in [90, 140, 190] {
            imageproc::drawing::draw_line_segment_mut(&mut page, (50.0, y as f32), (350.0, y as f32), INK);
        }
        let page = DynamicImage::ImageRgb8(page);
        let config = GridConfig::default();
        let extractor = GridExtractor::new(&config, &NoopSink);

        let extraction = extractor.extract_page(&page, 0).expect("page is readable");
        assert!(extraction.failures.is_empty());
        assert_eq!(extraction.tables.len(), 1);
        // the frame still gives two vertical rules, so rows come from the inner rules
        assert_eq!(extraction.tables[0].rows.len(), 4);
        assert_eq!(extraction.tables[0].rows[0].len(), 1);

        let only_rules = extractor
            .extract_region(&page, BoundingBox::new(60, 60, 340, 220), "inner")
            .expect("region is inside the page");
        assert!(only_rules.is_empty());
    }

    /// Identical pixels give identical geometry
    #[test]
    fn test_extraction_is_idempotent() {
        let config = GridConfig::default();
        let first = extract_tables(&two_table_page(), &config).expect("page is readable");
        let second = extract_tables(&two_table_page(), &config).expect("page is readable");
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).expect("serialize"),
            serde_json::to_string(&second).expect("serialize")
        );
    }

    /// Debug artifacts are written without changing the result
    #[test]
    fn test_debug_artifacts_do_not_change_geometry() {
        let dir = TempDir::new().expect("temp dir");
        let sink = DirectorySink::create(dir.path()).expect("create sink");
        let config = GridConfig::default();
        let page = four_by_three_page();

        let with_debug = GridExtractor::new(&config, &sink)
            .extract_page(&page, 0)
            .expect("page is readable");
        let without = extract_tables(&page, &config).expect("page is readable");

        assert_eq!(with_debug.tables, without);
        for name in [
            "page1_table1_binary.png",
            "page1_table1_refined_binary.png",
            "page1_table1_horizontal_lines.png",
            "page1_table1_vertical_lines.png",
            "page1_overlay.png",
        ] {
            assert!(dir.path().join(name).exists(), "missing {}", name);
        }
    }

    /// Looser tolerances from configuration reach the clusterer
    #[test]
    fn test_configured_tolerance_merges_close_rules() {
        let mut page = blank_page(400, 300);
        draw_ruled_table(&mut page, &[50, 150, 250, 350], &[40, 90, 140, 190, 240]);
        imageproc::drawing::draw_line_segment_mut(&mut page, (50.0, 146.0), (350.0, 146.0), INK);
        let page = DynamicImage::ImageRgb8(page);

        let tight = GridConfig {
            y_tolerance: 2,
            row_tolerance: 5,
            ..GridConfig::default()
        };
        let loose = GridConfig::default();

        let tight_rows = extract_tables(&page, &tight).expect("readable")[0].rows.len();
        let loose_rows = extract_tables(&page, &loose).expect("readable")[0].rows.len();
        assert_eq!(loose_rows, 4);
        assert_eq!(tight_rows, 5);
    }

    /// Zero-size page buffers fail fast
    #[test]
    fn test_zero_size_page_is_upstream_failure() {
        let page = DynamicImage::new_rgb8(0, 0);
        assert!(matches!(
            extract_tables(&page, &GridConfig::default()),
            Err(ExtractionError::Upstream(_))
        ));
    }
}
