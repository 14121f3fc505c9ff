//! Exhaustive (slow, fast) window grid search maximising CAGR.
//!
//! Every cell is evaluated independently into its own slot of a pre-sized
//! surface, optionally on the rayon pool. The optimum is then picked by one
//! sequential pass in canonical order (slow outer, fast inner, each axis in
//! the order given), keeping the first pair on ties, so the result does not
//! depend on evaluation order.

use crate::domain::error::MacrossError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, compute_indicators};
use crate::domain::price::PricePoint;
use crate::domain::returns::ReturnSeries;
use crate::domain::signal::{SignalOutcome, WindowPair, signals_from_indicators};
use crate::domain::simulation::{cagr, simulate};
use log::{debug, info};
use rayon::prelude::*;
use std::collections::HashMap;

/// Inclusive arithmetic range of window lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRange {
    pub start: usize,
    pub end: usize,
    pub step: usize,
}

impl WindowRange {
    pub const DEFAULT_SLOW: WindowRange = WindowRange {
        start: 140,
        end: 250,
        step: 5,
    };
    pub const DEFAULT_FAST: WindowRange = WindowRange {
        start: 5,
        end: 95,
        step: 5,
    };

    pub fn values(&self) -> Vec<usize> {
        if self.step == 0 || self.start > self.end {
            return Vec::new();
        }
        (self.start..=self.end).step_by(self.step).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowGrid {
    pub slow: Vec<usize>,
    pub fast: Vec<usize>,
}

impl WindowGrid {
    /// Axes keep the caller's order; surface indices follow it.
    pub fn new(slow: Vec<usize>, fast: Vec<usize>) -> Self {
        Self { slow, fast }
    }

    pub fn from_ranges(slow: WindowRange, fast: WindowRange) -> Self {
        Self::new(slow.values(), fast.values())
    }

    pub fn cell_count(&self) -> usize {
        self.slow.len() * self.fast.len()
    }

    pub fn pair_at(&self, cell: usize) -> WindowPair {
        let slow_idx = cell / self.fast.len();
        let fast_idx = cell % self.fast.len();
        WindowPair::new(self.slow[slow_idx], self.fast[fast_idx])
    }

    fn distinct_indicators(&self) -> Vec<IndicatorType> {
        let mut windows: Vec<usize> = self.slow.iter().chain(&self.fast).copied().collect();
        windows.sort_unstable();
        windows.dedup();
        windows.into_iter().map(IndicatorType::Sma).collect()
    }
}

impl Default for WindowGrid {
    fn default() -> Self {
        Self::from_ranges(WindowRange::DEFAULT_SLOW, WindowRange::DEFAULT_FAST)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellOutcome {
    Evaluated(f64),
    /// fast >= slow, excluded from the grid.
    Skipped,
    /// No row survived the warm-up trim.
    Insufficient,
    /// Fewer than two simulated points, or a non-finite CAGR.
    Degenerate,
}

impl CellOutcome {
    pub fn cagr(&self) -> Option<f64> {
        match self {
            CellOutcome::Evaluated(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(self, CellOutcome::Evaluated(_))
    }
}

/// CAGR per grid cell, row-major over (slow_idx, fast_idx).
#[derive(Debug, Clone, PartialEq)]
pub struct CagrSurface {
    pub grid: WindowGrid,
    cells: Vec<CellOutcome>,
}

impl CagrSurface {
    fn from_cells(grid: WindowGrid, cells: Vec<CellOutcome>) -> Self {
        debug_assert_eq!(cells.len(), grid.cell_count());
        Self { grid, cells }
    }

    pub fn get(&self, slow_idx: usize, fast_idx: usize) -> Option<CellOutcome> {
        if slow_idx >= self.grid.slow.len() || fast_idx >= self.grid.fast.len() {
            return None;
        }
        self.cells
            .get(slow_idx * self.grid.fast.len() + fast_idx)
            .copied()
    }

    pub fn get_pair(&self, pair: WindowPair) -> Option<CellOutcome> {
        let slow_idx = self.grid.slow.iter().position(|&w| w == pair.slow)?;
        let fast_idx = self.grid.fast.iter().position(|&w| w == pair.fast)?;
        self.get(slow_idx, fast_idx)
    }

    /// Cells in canonical order with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, CellOutcome)> + '_ {
        let width = self.grid.fast.len();
        self.cells
            .iter()
            .enumerate()
            .map(move |(k, &cell)| (k / width, k % width, cell))
    }

    pub fn evaluated_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_evaluated()).count()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Matrix with one row per fast window and one column per slow window.
    pub fn heatmap_rows(&self) -> Vec<Vec<Option<f64>>> {
        (0..self.grid.fast.len())
            .map(|fast_idx| {
                (0..self.grid.slow.len())
                    .map(|slow_idx| self.get(slow_idx, fast_idx).and_then(|c| c.cagr()))
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimalResult {
    pub pair: WindowPair,
    pub cagr: f64,
    pub slow_idx: usize,
    pub fast_idx: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepParams {
    pub initial_balance: f64,
    pub transaction_cost: f64,
    pub years: f64,
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridOutcome {
    pub optimal: OptimalResult,
    pub surface: CagrSurface,
}

pub fn optimize(
    prices: &[PricePoint],
    returns: &ReturnSeries,
    grid: &WindowGrid,
    params: &SweepParams,
) -> Result<GridOutcome, MacrossError> {
    if !(params.years > 0.0 && params.years.is_finite()) {
        return Err(MacrossError::InvalidYears {
            years: params.years,
        });
    }

    let surface = sweep(prices, returns, grid, params);
    let optimal = select_optimal(&surface)?;
    info!(
        "optimal pair {} with CAGR {:.4} ({} of {} cells evaluated)",
        optimal.pair,
        optimal.cagr,
        surface.evaluated_count(),
        surface.len()
    );
    Ok(GridOutcome { optimal, surface })
}

/// Evaluate every cell of the grid. Per-cell failures are recorded, never raised.
pub fn sweep(
    prices: &[PricePoint],
    returns: &ReturnSeries,
    grid: &WindowGrid,
    params: &SweepParams,
) -> CagrSurface {
    let indicators = compute_indicators(prices, &grid.distinct_indicators());
    let cells = grid.cell_count();
    info!(
        "sweeping {} cells ({} slow x {} fast) over {} prices",
        cells,
        grid.slow.len(),
        grid.fast.len(),
        prices.len()
    );

    let evaluate = |cell: usize| {
        evaluate_cell(prices, returns, grid.pair_at(cell), &indicators, params)
    };
    let outcomes: Vec<CellOutcome> = if params.parallel {
        (0..cells).into_par_iter().map(evaluate).collect()
    } else {
        (0..cells).map(evaluate).collect()
    };

    let surface = CagrSurface::from_cells(grid.clone(), outcomes);
    debug!(
        "sweep done: {} evaluated, {} skipped, {} insufficient, {} degenerate",
        surface.evaluated_count(),
        count_cells(&surface, CellOutcome::Skipped),
        count_cells(&surface, CellOutcome::Insufficient),
        count_cells(&surface, CellOutcome::Degenerate),
    );
    surface
}

/// Maximum CAGR in canonical order; the earlier cell wins ties.
pub fn select_optimal(surface: &CagrSurface) -> Result<OptimalResult, MacrossError> {
    let mut best: Option<OptimalResult> = None;

    for (slow_idx, fast_idx, cell) in surface.iter() {
        let Some(value) = cell.cagr() else {
            continue;
        };
        if best.is_none_or(|b| value > b.cagr) {
            best = Some(OptimalResult {
                pair: WindowPair::new(surface.grid.slow[slow_idx], surface.grid.fast[fast_idx]),
                cagr: value,
                slow_idx,
                fast_idx,
            });
        }
    }

    best.ok_or(MacrossError::EmptyGrid {
        evaluated: surface.evaluated_count(),
        cells: surface.len(),
    })
}

fn evaluate_cell(
    prices: &[PricePoint],
    returns: &ReturnSeries,
    pair: WindowPair,
    indicators: &HashMap<IndicatorType, IndicatorSeries>,
    params: &SweepParams,
) -> CellOutcome {
    if !pair.is_admissible() {
        return CellOutcome::Skipped;
    }
    let (Some(slow), Some(fast)) = (
        indicators.get(&IndicatorType::Sma(pair.slow)),
        indicators.get(&IndicatorType::Sma(pair.fast)),
    ) else {
        return CellOutcome::Insufficient;
    };

    let frame = match signals_from_indicators(prices, returns, pair, slow, fast) {
        SignalOutcome::Ready(frame) => frame,
        SignalOutcome::Empty => return CellOutcome::Insufficient,
    };

    let result = simulate(&frame, params.initial_balance, params.transaction_cost);
    match cagr(&result.balance, params.years) {
        Ok(value) if value.is_finite() => CellOutcome::Evaluated(value),
        _ => CellOutcome::Degenerate,
    }
}

fn count_cells(surface: &CagrSurface, kind: CellOutcome) -> usize {
    surface.iter().filter(|(_, _, c)| *c == kind).count()
}
