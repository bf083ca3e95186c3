// Property-based tests for references and ranges.

use proptest::prelude::*;
use websheet_core::{col_to_letters, letters_to_col, CellRange, CellRef, MAX_COLUMNS, MAX_ROWS};

fn arb_cell() -> impl Strategy<Value = CellRef> {
    (0..MAX_COLUMNS, 0..MAX_ROWS).prop_map(|(col, row)| CellRef::from_coords(col, row).unwrap())
}

/// Cells near the origin, so ranges between them stay small enough to walk.
fn arb_near_cell() -> impl Strategy<Value = CellRef> {
    (0u32..12, 0u32..12).prop_map(|(col, row)| CellRef::from_coords(col, row).unwrap())
}

proptest! {
    #[test]
    fn column_letters_round_trip(col in 0..MAX_COLUMNS) {
        let letters = col_to_letters(col);
        prop_assert_eq!(letters_to_col(&letters).unwrap(), col);
        prop_assert_eq!(letters_to_col(&letters.to_lowercase()).unwrap(), col);
    }

    #[test]
    fn cell_text_round_trip(cell in arb_cell()) {
        prop_assert_eq!(cell.to_string().parse::<CellRef>().unwrap(), cell);
    }

    #[test]
    fn range_ignores_corner_order(a in arb_cell(), b in arb_cell()) {
        let range = CellRange::new(a, b);
        prop_assert_eq!(range, CellRange::new(b, a));
        prop_assert!(range.begin() <= range.end());
        prop_assert!(range.contains(a));
        prop_assert!(range.contains(b));
    }

    #[test]
    fn intersection_is_what_both_contain(
        a in arb_near_cell(), b in arb_near_cell(),
        c in arb_near_cell(), d in arb_near_cell(),
        point in arb_near_cell(),
    ) {
        let left = CellRange::new(a, b);
        let right = CellRange::new(c, d);
        let in_both = left.contains(point) && right.contains(point);
        match left.intersection(&right) {
            Some(overlap) => prop_assert_eq!(overlap.contains(point), in_both),
            None => prop_assert!(!in_both),
        }
        prop_assert_eq!(left.intersects(&right), right.intersects(&left));
    }

    #[test]
    fn cells_walks_every_cell_once(a in arb_near_cell(), b in arb_near_cell()) {
        let range = CellRange::new(a, b);
        let cells: Vec<CellRef> = range.cells().collect();
        prop_assert_eq!(cells.len() as u64, range.cell_count());
        prop_assert!(cells.iter().all(|cell| range.contains(*cell)));
        prop_assert_eq!(cells.first().copied(), Some(range.begin()));
        prop_assert_eq!(cells.last().copied(), Some(range.end()));
    }
}
