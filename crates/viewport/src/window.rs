use websheet_core::{CellRange, CellRef, MAX_COLUMNS, MAX_ROWS};

/// The visible part of the sheet: a home cell plus a size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub home: CellRef,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// `width`/`height` below 1 are raised to 1.
    pub fn new(home: CellRef, width: u32, height: u32) -> Self {
        Self {
            home,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// The range covered, clipped to the sheet.
    pub fn window(&self) -> CellRange {
        let col = self.home.column().value();
        let row = self.home.row().value();
        let end_col = col.saturating_add(self.width - 1).min(MAX_COLUMNS - 1);
        let end_row = row.saturating_add(self.height - 1).min(MAX_ROWS - 1);
        match CellRef::from_coords(end_col, end_row) {
            Some(end) => CellRange::new(self.home, end),
            None => CellRange::single(self.home),
        }
    }

    /// The windows the server answers with when frozen columns and rows are
    /// included: the frozen corner, the frozen rows above the home range,
    /// the frozen columns left of it, and the home range itself. Empty
    /// parts are left out.
    pub fn windows(&self, frozen_columns: u32, frozen_rows: u32) -> Vec<CellRange> {
        let home_col = self.home.column().value().max(frozen_columns);
        let home_row = self.home.row().value().max(frozen_rows);
        let home = CellRef::from_coords(home_col, home_row).unwrap_or(self.home);
        let main = Viewport::new(home, self.width, self.height).window();

        let range = |c1: u32, r1: u32, c2: u32, r2: u32| {
            Some(CellRange::new(CellRef::from_coords(c1, r1)?, CellRef::from_coords(c2, r2)?))
        };
        let (main_begin, main_end) = (main.begin(), main.end());

        let mut windows = Vec::new();
        if frozen_columns > 0 && frozen_rows > 0 {
            windows.extend(range(0, 0, frozen_columns - 1, frozen_rows - 1));
        }
        if frozen_rows > 0 {
            windows.extend(range(
                main_begin.column().value(),
                0,
                main_end.column().value(),
                frozen_rows - 1,
            ));
        }
        if frozen_columns > 0 {
            windows.extend(range(
                0,
                main_begin.row().value(),
                frozen_columns - 1,
                main_end.row().value(),
            ));
        }
        windows.push(main);
        windows
    }

    /// Query string for `GET .../cell/*/force-recompute`.
    pub fn query_params(&self, include_frozen_columns_rows: bool) -> Vec<(&'static str, String)> {
        vec![
            ("home", self.home.to_string()),
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
            ("includeFrozenColumnsRows", include_frozen_columns_rows.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str) -> CellRef {
        text.parse().unwrap()
    }

    #[test]
    fn test_window() {
        let viewport = Viewport::new(cell("B2"), 3, 4);
        assert_eq!(viewport.window().to_string(), "B2:D5");
    }

    #[test]
    fn test_window_clipped_at_sheet_edge() {
        let viewport = Viewport::new(cell("XFC1048575"), 10, 10);
        assert_eq!(viewport.window().to_string(), "XFC1048575:XFD1048576");
    }

    #[test]
    fn test_zero_size_is_one_cell() {
        let viewport = Viewport::new(cell("C3"), 0, 0);
        assert_eq!(viewport.window().to_string(), "C3:C3");
    }

    #[test]
    fn test_windows_with_frozen_columns_and_rows() {
        let viewport = Viewport::new(cell("A1"), 3, 3);
        let windows: Vec<String> = viewport.windows(1, 2).iter().map(|w| w.to_string()).collect();
        assert_eq!(windows, vec!["A1:A2", "B1:D2", "A3:A5", "B3:D5"]);
    }

    #[test]
    fn test_windows_without_frozen() {
        let viewport = Viewport::new(cell("C3"), 2, 2);
        assert_eq!(viewport.windows(0, 0), vec![viewport.window()]);
    }

    #[test]
    fn test_query_params() {
        let params = Viewport::new(cell("B2"), 10, 20).query_params(true);
        assert_eq!(params[0], ("home", "B2".to_string()));
        assert_eq!(params[3], ("includeFrozenColumnsRows", "true".to_string()));
    }
}
