//! # Cell and Row Assembly
//!
//! Turns the two grid axes of a region into a row-major matrix of cells.
//! The cross product of consecutive grid positions gives the candidate cells;
//! rows are then rebuilt by top-edge proximity, since a ruling line that is
//! slightly off on one side of the table must not split a row in two.

use crate::geometry::{BoundingBox, Cell, Row, Table};

/// One cell per pair of consecutive grid positions on each axis.
///
/// `x_axis` and `y_axis` are local to `region`; cells come back in page space,
/// clamped to the region. Fewer than two positions on either axis means no
/// cells.
pub fn build_cells(region: &BoundingBox, x_axis: &[u32], y_axis: &[u32]) -> Vec<Cell> {
    if x_axis.len() < 2 || y_axis.len() < 2 {
        return Vec::new();
    }

    let mut cells = Vec::with_capacity((x_axis.len() - 1) * (y_axis.len() - 1));
    for (row, ys) in y_axis.windows(2).enumerate() {
        for (col, xs) in x_axis.windows(2).enumerate() {
            let bbox = BoundingBox::new(xs[0], ys[0], xs[1], ys[1])
                .offset(region.x1, region.y1)
                .clamp_to(region.x2, region.y2);
            cells.push(Cell { bbox, row, col });
        }
    }
    cells
}

/// Groups cells into rows by top edge.
///
/// Cells are visited by ascending top edge (then left edge); each joins the
/// first row whose first cell's top differs by less than `row_tolerance`,
/// otherwise it opens a new row. Rows are sorted left to right and the cell
/// `row`/`col` indices are rewritten to match the final matrix.
pub fn group_rows(mut cells: Vec<Cell>, row_tolerance: u32) -> Vec<Row> {
    cells.sort_by_key(|cell| (cell.bbox.y1, cell.bbox.x1));

    let mut rows: Vec<Row> = Vec::new();
    for cell in cells {
        let top = cell.bbox.y1;
        match rows
            .iter_mut()
            .find(|row| row.top().is_some_and(|t| t.abs_diff(top) < row_tolerance))
        {
            Some(row) => row.cells.push(cell),
            None => rows.push(Row { cells: vec![cell] }),
        }
    }

    for (row_index, row) in rows.iter_mut().enumerate() {
        row.cells.sort_by_key(|cell| cell.bbox.x1);
        for (col_index, cell) in row.cells.iter_mut().enumerate() {
            cell.row = row_index;
            cell.col = col_index;
        }
    }
    rows
}

/// Builds the table for `region` from its grid axes.
pub fn assemble_table(
    region: BoundingBox,
    x_axis: &[u32],
    y_axis: &[u32],
    row_tolerance: u32,
) -> Table {
    let cells = build_cells(&region, x_axis, y_axis);
    if cells.is_empty() {
        return Table::empty(region);
    }
    Table {
        region,
        rows: group_rows(cells, row_tolerance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> BoundingBox {
        BoundingBox::new(50, 40, 351, 241)
    }

    #[test]
    fn test_cell_count_matches_axes() {
        let x = [0, 100, 200, 300];
        let y = [0, 50, 100, 150, 200];
        let table = assemble_table(region(), &x, &y, 10);

        assert_eq!(table.cell_count(), 12);
        assert_eq!(table.rows.len(), 4);
        for (r, row) in table.rows.iter().enumerate() {
            assert_eq!(row.len(), 3);
            assert!(row.cells.windows(2).all(|w| w[0].bbox.x1 < w[1].bbox.x1));
            assert!(row.cells.iter().all(|c| c.row == r));
        }
    }

    #[test]
    fn test_cells_are_offset_into_page_space() {
        let cells = build_cells(&region(), &[0, 100], &[0, 50]);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].bbox, BoundingBox::new(50, 40, 150, 90));
    }

    #[test]
    fn test_cells_stay_inside_region() {
        let cells = build_cells(&region(), &[0, 400], &[0, 300]);
        assert!(cells.iter().all(|c| region().contains(&c.bbox)));
    }

    #[test]
    fn test_single_line_axis_yields_no_cells() {
        assert!(build_cells(&region(), &[0], &[0, 50, 100]).is_empty());
        assert!(build_cells(&region(), &[0, 100, 200], &[]).is_empty());

        let table = assemble_table(region(), &[0, 100, 200], &[10], 10);
        assert!(table.is_empty());
        assert_eq!(table.region, region());
    }

    #[test]
    fn test_group_rows_tolerates_uneven_tops() {
        let cell = |x1, y1| Cell {
            bbox: BoundingBox::new(x1, y1, x1 + 10, y1 + 10),
            row: 0,
            col: 0,
        };
        let cells = vec![cell(30, 104), cell(10, 100), cell(20, 109), cell(0, 110)];

        let rows = group_rows(cells, 10);
        assert_eq!(rows.len(), 2);
        let xs: Vec<u32> = rows[0].cells.iter().map(|c| c.bbox.x1).collect();
        assert_eq!(xs, vec![10, 20, 30]);
        assert_eq!(rows[1].cells[0].bbox.x1, 0);
        assert_eq!((rows[1].cells[0].row, rows[1].cells[0].col), (1, 0));
    }
}
