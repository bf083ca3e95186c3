use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use websheet_core::{CellRange, CellRef, LabelName};
use websheet_protocol::{LabelMapping, LabelTarget, SpreadsheetCell, SpreadsheetDelta};

/// Largest number of cells a single range label may expand to when no
/// window bounds the expansion.
pub const MAX_LABEL_EXPANSION: u64 = 1_000_000;

/// A delta the cache refuses to apply. The cache is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportCacheError {
    /// The label maps to another label; chains are not followed.
    UnsupportedLabelTarget { label: LabelName, target: LabelName },
    /// The label maps to a range too large to expand without a window.
    LabelRangeTooLarge { label: LabelName, range: CellRange },
}

impl fmt::Display for ViewportCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewportCacheError::UnsupportedLabelTarget { label, target } => {
                write!(f, "Label {} maps to label {}, label chains are not supported", label, target)
            }
            ViewportCacheError::LabelRangeTooLarge { label, range } => write!(
                f,
                "Label {} maps to {} ({} cells) and no window limits it",
                label,
                range,
                range.cell_count()
            ),
        }
    }
}

impl std::error::Error for ViewportCacheError {}

/// Cells and labels known to the client for the current window.
///
/// Both maps are keyed by [`CellRef`], so iteration is row-major.
#[derive(Debug, Clone, Default)]
pub struct ViewportCache {
    cells: BTreeMap<CellRef, SpreadsheetCell>,
    labels: BTreeMap<CellRef, BTreeSet<LabelName>>,
    windows: Vec<CellRange>,
}

impl ViewportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a server delta.
    ///
    /// Order: window change clears everything, then deletes, then cell
    /// upserts, then labels, then the delta's window becomes current. Label
    /// mappings are checked before any of that, so an `Err` leaves the cache
    /// exactly as it was.
    pub fn apply(&mut self, delta: &SpreadsheetDelta) -> Result<(), ViewportCacheError> {
        let windows: &[CellRange] = if delta.window.is_empty() {
            &self.windows
        } else {
            &delta.window
        };
        let expanded = delta
            .labels
            .iter()
            .map(|mapping| expand_label(mapping, windows))
            .collect::<Result<Vec<_>, _>>()?;

        if !delta.window.is_empty() && delta.window != self.windows {
            log::debug!(
                "viewport window {} -> {}, clearing {} cells",
                format_windows(&self.windows),
                format_windows(&delta.window),
                self.cells.len()
            );
            self.cells.clear();
            self.labels.clear();
        }

        for reference in &delta.deleted_cells {
            self.cells.remove(reference);
        }

        for cell in &delta.cells {
            self.cells.insert(cell.reference, cell.clone());
        }

        for (label, cells) in expanded {
            for cell in cells {
                self.labels.entry(cell).or_default().insert(label.clone());
            }
        }

        if !delta.window.is_empty() {
            self.windows = delta.window.clone();
        }
        Ok(())
    }

    pub fn cell(&self, reference: CellRef) -> Option<&SpreadsheetCell> {
        self.cells.get(&reference)
    }

    /// Labels on `reference`; empty when there are none.
    pub fn labels(&self, reference: CellRef) -> BTreeSet<LabelName> {
        self.labels.get(&reference).cloned().unwrap_or_default()
    }

    /// Every cached cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &SpreadsheetCell> {
        self.cells.values()
    }

    /// Cells carrying `label`, in row-major order.
    pub fn cells_with_label(&self, label: &LabelName) -> Vec<CellRef> {
        self.labels
            .iter()
            .filter(|(_, labels)| labels.contains(label))
            .map(|(cell, _)| *cell)
            .collect()
    }

    pub fn windows(&self) -> &[CellRange] {
        &self.windows
    }

    /// True when `reference` is inside a window, or there is no window.
    pub fn in_window(&self, reference: CellRef) -> bool {
        in_windows(reference, &self.windows)
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.labels.clear();
        self.windows.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.labels.is_empty()
    }
}

fn in_windows(reference: CellRef, windows: &[CellRange]) -> bool {
    windows.is_empty() || windows.iter().any(|window| window.contains(reference))
}

/// The cells a label mapping lands on, limited to `windows`.
fn expand_label(
    mapping: &LabelMapping,
    windows: &[CellRange],
) -> Result<(LabelName, Vec<CellRef>), ViewportCacheError> {
    let label = mapping.label.clone();
    let cells = match &mapping.reference {
        LabelTarget::Cell(cell) => {
            if in_windows(*cell, windows) {
                vec![*cell]
            } else {
                Vec::new()
            }
        }
        LabelTarget::Range(range) if windows.is_empty() => {
            if range.cell_count() > MAX_LABEL_EXPANSION {
                return Err(ViewportCacheError::LabelRangeTooLarge { label, range: *range });
            }
            range.cells().collect()
        }
        LabelTarget::Range(range) => {
            // Windows may overlap; the set removes duplicates.
            let cells: BTreeSet<CellRef> = windows
                .iter()
                .filter_map(|window| window.intersection(range))
                .flat_map(|part| part.cells())
                .collect();
            cells.into_iter().collect()
        }
        LabelTarget::Label(target) => {
            return Err(ViewportCacheError::UnsupportedLabelTarget {
                label,
                target: target.clone(),
            });
        }
    };
    Ok((label, cells))
}

fn format_windows(windows: &[CellRange]) -> String {
    if windows.is_empty() {
        return "(none)".to_string();
    }
    windows
        .iter()
        .map(CellRange::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str) -> CellRef {
        text.parse().unwrap()
    }

    fn range(text: &str) -> CellRange {
        text.parse().unwrap()
    }

    fn label(text: &str) -> LabelName {
        LabelName::new(text).unwrap()
    }

    fn delta(window: &[&str], cells: &[&str]) -> SpreadsheetDelta {
        SpreadsheetDelta {
            cells: cells
                .iter()
                .map(|c| SpreadsheetCell::new(cell(c), format!("={}", c)))
                .collect(),
            window: window.iter().map(|w| range(w)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_upserts_and_windows() {
        let mut cache = ViewportCache::new();
        cache.apply(&delta(&["A1:C3"], &["A1", "B2"])).unwrap();

        assert_eq!(cache.cell(cell("A1")).unwrap().formula.text, "=A1");
        assert!(cache.cell(cell("C3")).is_none());
        assert_eq!(cache.windows(), &[range("A1:C3")]);
        assert!(cache.in_window(cell("C3")));
        assert!(!cache.in_window(cell("D1")));
    }

    #[test]
    fn test_window_change_clears_cache() {
        let mut cache = ViewportCache::new();
        cache.apply(&delta(&["A1:C3"], &["A1", "B2"])).unwrap();
        cache.apply(&delta(&["D1:F3"], &[])).unwrap();

        assert_eq!(cache.cells().count(), 0);
        assert_eq!(cache.windows(), &[range("D1:F3")]);
    }

    #[test]
    fn test_same_window_merges() {
        let mut cache = ViewportCache::new();
        cache.apply(&delta(&["A1:C3"], &["A1"])).unwrap();
        cache.apply(&delta(&["A1:C3"], &["B2"])).unwrap();
        cache.apply(&delta(&[], &["C3"])).unwrap();

        let refs: Vec<String> = cache.cells().map(|c| c.reference.to_string()).collect();
        assert_eq!(refs, vec!["A1", "B2", "C3"]);
    }

    #[test]
    fn test_deleted_cell_is_evicted() {
        let mut cache = ViewportCache::new();
        cache.apply(&delta(&["A1:C3"], &["A1", "B2"])).unwrap();

        let mut deletion = delta(&[], &[]);
        deletion.deleted_cells = vec![cell("A1")];
        cache.apply(&deletion).unwrap();

        assert!(cache.cell(cell("A1")).is_none());
        assert!(cache.cell(cell("B2")).is_some());
    }

    #[test]
    fn test_upsert_wins_over_delete_in_same_delta() {
        let mut cache = ViewportCache::new();
        cache.apply(&delta(&["A1:C3"], &["A1"])).unwrap();

        let mut replace = delta(&[], &["A1"]);
        replace.deleted_cells = vec![cell("A1")];
        cache.apply(&replace).unwrap();
        assert!(cache.cell(cell("A1")).is_some());
    }

    #[test]
    fn test_range_label_expands_inside_window() {
        let mut cache = ViewportCache::new();
        let mut d = delta(&["A1:B2"], &[]);
        d.labels = vec![LabelMapping::new(label("Total"), LabelTarget::Range(range("A1:C1")))];
        cache.apply(&d).unwrap();

        assert!(cache.labels(cell("A1")).contains(&label("Total")));
        assert!(cache.labels(cell("B1")).contains(&label("Total")));
        assert!(cache.labels(cell("C1")).is_empty());
        assert_eq!(cache.cells_with_label(&label("Total")), vec![cell("A1"), cell("B1")]);
    }

    #[test]
    fn test_cell_label_outside_window_is_dropped() {
        let mut cache = ViewportCache::new();
        let mut d = delta(&["A1:B2"], &[]);
        d.labels = vec![
            LabelMapping::new(label("Inside"), LabelTarget::Cell(cell("B2"))),
            LabelMapping::new(label("Outside"), LabelTarget::Cell(cell("Z9"))),
        ];
        cache.apply(&d).unwrap();

        assert_eq!(cache.labels(cell("B2")).len(), 1);
        assert!(cache.labels(cell("Z9")).is_empty());
    }

    #[test]
    fn test_labels_without_window_are_kept() {
        let mut cache = ViewportCache::new();
        let mut d = SpreadsheetDelta::default();
        d.labels = vec![LabelMapping::new(label("Rate"), LabelTarget::Range(range("A1:A3")))];
        cache.apply(&d).unwrap();
        assert_eq!(cache.cells_with_label(&label("Rate")).len(), 3);
    }

    #[test]
    fn test_overlapping_windows_do_not_duplicate() {
        let mut cache = ViewportCache::new();
        let mut d = delta(&["A1:B2", "B1:C2"], &[]);
        d.labels = vec![LabelMapping::new(label("Row1"), LabelTarget::Range(range("A1:C1")))];
        cache.apply(&d).unwrap();
        assert_eq!(
            cache.cells_with_label(&label("Row1")),
            vec![cell("A1"), cell("B1"), cell("C1")]
        );
    }

    #[test]
    fn test_label_to_label_is_rejected_without_changes() {
        let mut cache = ViewportCache::new();
        cache.apply(&delta(&["A1:C3"], &["A1"])).unwrap();

        let mut d = delta(&["D1:F3"], &["D1"]);
        d.labels = vec![LabelMapping::new(label("Alias"), LabelTarget::Label(label("Total")))];
        let err = cache.apply(&d).unwrap_err();

        assert_eq!(
            err,
            ViewportCacheError::UnsupportedLabelTarget {
                label: label("Alias"),
                target: label("Total"),
            }
        );
        assert!(cache.cell(cell("A1")).is_some());
        assert!(cache.cell(cell("D1")).is_none());
        assert_eq!(cache.windows(), &[range("A1:C3")]);
    }

    #[test]
    fn test_huge_unbounded_range_is_rejected() {
        let mut cache = ViewportCache::new();
        let mut d = SpreadsheetDelta::default();
        d.labels = vec![LabelMapping::new(label("Everything"), LabelTarget::Range(range("A1:XFD1048576")))];
        assert!(matches!(
            cache.apply(&d),
            Err(ViewportCacheError::LabelRangeTooLarge { .. })
        ));
    }

    #[test]
    fn test_clear() {
        let mut cache = ViewportCache::new();
        cache.apply(&delta(&["A1:C3"], &["A1"])).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.windows().is_empty());
    }
}
