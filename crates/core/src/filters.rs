//! Numeric range and free-text filtering over a [`ResultTable`].
//!
//! [`apply`] is pure: the same table and [`FilterSet`] always produce the same
//! output, and applying a set to its own output changes nothing.

use crate::table::{CellValue, ResultTable};

/// Closed interval over one numeric column, remembering the column's full
/// observed extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub lo: f64,
    pub hi: f64,
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    #[must_use]
    pub fn full(min: f64, max: f64) -> Self {
        Self {
            lo: min,
            hi: max,
            min,
            max,
        }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && value <= self.hi
    }

    /// True once either bound has moved inside the observed extent.
    #[must_use]
    pub fn is_narrowed(&self) -> bool {
        self.lo > self.min || self.hi < self.max
    }

    /// Sets both bounds, clamped into `[min, max]`. Inverted bounds are swapped.
    pub fn set(&mut self, lo: f64, hi: f64) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self.lo = lo.clamp(self.min, self.max);
        self.hi = hi.clamp(self.min, self.max);
    }

    pub fn reset(&mut self) {
        self.lo = self.min;
        self.hi = self.max;
    }

    /// Moves the range onto a freshly observed extent. A bound still sitting
    /// on the old extent follows the new one; a moved bound is kept, clamped.
    pub fn rebase(&mut self, min: f64, max: f64) {
        let lo = if self.lo <= self.min { min } else { self.lo };
        let hi = if self.hi >= self.max { max } else { self.hi };
        self.min = min;
        self.max = max;
        self.set(lo, hi);
    }

    /// Pulls `value` onto an end of the extent when it lies within
    /// `tolerance` of it, so repeated float steps land back on `min`/`max`.
    fn snap(&self, value: f64, tolerance: f64) -> f64 {
        if (value - self.min).abs() <= tolerance {
            self.min
        } else if (value - self.max).abs() <= tolerance {
            self.max
        } else {
            value
        }
    }

    fn accepts(&self, cell: &CellValue) -> bool {
        match cell.as_f64() {
            Some(value) => self.contains(value),
            None => !self.is_narrowed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRange {
    pub column: String,
    pub range: NumericRange,
}

/// Active filter parameters for the currently loaded table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    schema: Vec<String>,
    ranges: Vec<ColumnRange>,
    search: String,
}

impl FilterSet {
    /// Defaults for `table`: every numeric column at its full range, no search.
    #[must_use]
    pub fn for_table(table: &ResultTable) -> Self {
        let ranges = table
            .numeric_columns()
            .map(|(index, column)| {
                let (min, max) = table.column_bounds(index);
                ColumnRange {
                    column: column.name.clone(),
                    range: NumericRange::full(min, max),
                }
            })
            .collect();

        Self {
            schema: table.schema_key(),
            ranges,
            search: String::new(),
        }
    }

    /// Keeps the current parameters when `table` has the same columns as the
    /// table they were built for, otherwise resets to the table's defaults.
    /// Kept ranges are rebased onto the extent observed in `table`.
    /// Returns true when a reset happened.
    pub fn reconcile(&mut self, table: &ResultTable) -> bool {
        let extents = table
            .numeric_columns()
            .map(|(index, column)| (column.name.clone(), table.column_bounds(index)))
            .collect::<Vec<_>>();
        let same_columns = self.schema == table.schema_key()
            && self.ranges.len() == extents.len()
            && extents.iter().all(|(name, _)| self.range(name).is_some());
        if !same_columns {
            *self = Self::for_table(table);
            return true;
        }

        for (name, (min, max)) in extents {
            if let Some(range) = self.range_mut(&name) {
                range.rebase(min, max);
            }
        }
        false
    }

    pub fn reset_for(&mut self, table: &ResultTable) {
        *self = Self::for_table(table);
    }

    #[must_use]
    pub fn ranges(&self) -> &[ColumnRange] {
        &self.ranges
    }

    #[must_use]
    pub fn range(&self, column: &str) -> Option<&NumericRange> {
        self.ranges
            .iter()
            .find(|entry| entry.column == column)
            .map(|entry| &entry.range)
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Returns false when `column` has no numeric range.
    pub fn set_range(&mut self, column: &str, lo: f64, hi: f64) -> bool {
        match self.range_mut(column) {
            Some(range) => {
                range.set(lo, hi);
                true
            }
            None => false,
        }
    }

    /// Moves one bound by `delta`; the other bound never gets crossed. A bound
    /// ending within half a step of the extent snaps onto it.
    pub fn adjust_range(&mut self, column: &str, bound: Bound, delta: f64) -> bool {
        let Some(range) = self.range_mut(column) else {
            return false;
        };
        let tolerance = delta.abs() / 2.0;
        match bound {
            Bound::Lower => {
                let lo = range.snap(range.lo + delta, tolerance).min(range.hi);
                range.set(lo, range.hi);
            }
            Bound::Upper => {
                let hi = range.snap(range.hi + delta, tolerance).max(range.lo);
                range.set(range.lo, hi);
            }
        }
        true
    }

    pub fn reset_ranges(&mut self) {
        for entry in &mut self.ranges {
            entry.range.reset();
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search.push(ch);
    }

    pub fn pop_search_char(&mut self) -> Option<char> {
        self.search.pop()
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    fn range_mut(&mut self, column: &str) -> Option<&mut NumericRange> {
        self.ranges
            .iter_mut()
            .find(|entry| entry.column == column)
            .map(|entry| &mut entry.range)
    }
}

/// Narrows `table` by every numeric range, then by the search term.
///
/// A null numeric cell passes its column's range only while that range spans
/// the full extent; once narrowed, the interval can no longer contain it.
#[must_use]
pub fn apply(table: &ResultTable, filters: &FilterSet) -> ResultTable {
    let narrowed = apply_ranges(table, filters);
    apply_search(&narrowed, filters.search())
}

fn apply_ranges(table: &ResultTable, filters: &FilterSet) -> ResultTable {
    let active = filters
        .ranges()
        .iter()
        .filter_map(|entry| {
            table
                .column_index(&entry.column)
                .map(|index| (index, entry.range))
        })
        .collect::<Vec<_>>();

    if active.is_empty() {
        return table.clone();
    }

    table.retain_rows(|row| {
        active
            .iter()
            .all(|(index, range)| row.get(*index).is_some_and(|cell| range.accepts(cell)))
    })
}

fn apply_search(table: &ResultTable, search: &str) -> ResultTable {
    if search.is_empty() {
        return table.clone();
    }

    let needle = search.to_lowercase();
    table.retain_rows(|row| {
        row.iter()
            .any(|cell| cell.search_text().to_lowercase().contains(&needle))
    })
}
