//! Bottom sheet driven by a vertical drag gesture.
//!
//! Heights are percentages of the viewport. While a drag is active the height
//! follows the pointer, clamped to `[min_height, max_height]`. On release it
//! snaps to one of three canonical states: closed, mid or full.

use thiserror::Error;

use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetConfig {
    pub min_height: f64,
    pub max_height: f64,
    /// Height used when opening and after a mid snap.
    pub mid_height: f64,
    /// Height used after a full snap.
    pub full_height: f64,
    /// Releasing below this closes the sheet.
    pub low_threshold: f64,
    /// Releasing at or above this expands the sheet.
    pub high_threshold: f64,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            min_height: SHEET_MIN_HEIGHT,
            max_height: SHEET_MAX_HEIGHT,
            mid_height: SHEET_MID_HEIGHT,
            full_height: SHEET_MAX_HEIGHT,
            low_threshold: SHEET_LOW_THRESHOLD,
            high_threshold: SHEET_HIGH_THRESHOLD,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SheetConfigError {
    #[error("sheet heights must be finite")]
    NotFinite,
    #[error("min height {0} must be below max height {1}")]
    EmptyRange(f64, f64),
    #[error("{0} height {1} is outside [{2}, {3}]")]
    OutOfRange(&'static str, f64, f64, f64),
    #[error("low threshold {0} must be below high threshold {1}")]
    ThresholdOrder(f64, f64),
}

impl SheetConfig {
    pub fn validate(&self) -> Result<(), SheetConfigError> {
        let values = [
            self.min_height,
            self.max_height,
            self.mid_height,
            self.full_height,
            self.low_threshold,
            self.high_threshold,
        ];
        if values.iter().any(|value| !value.is_finite()) {
            return Err(SheetConfigError::NotFinite);
        }
        if self.min_height >= self.max_height {
            return Err(SheetConfigError::EmptyRange(self.min_height, self.max_height));
        }
        for (name, value) in [("mid", self.mid_height), ("full", self.full_height)] {
            if value < self.min_height || value > self.max_height {
                return Err(SheetConfigError::OutOfRange(
                    name,
                    value,
                    self.min_height,
                    self.max_height,
                ));
            }
        }
        if self.low_threshold >= self.high_threshold {
            return Err(SheetConfigError::ThresholdOrder(
                self.low_threshold,
                self.high_threshold,
            ));
        }
        Ok(())
    }

    pub fn clamp(&self, height: f64) -> f64 {
        height.clamp(self.min_height, self.max_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SheetPhase {
    Closed,
    Settled,
    Dragging {
        pointer_id: u64,
        start_y: f64,
        start_height: f64,
    },
}

/// Where a released drag ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snap {
    Closed,
    Mid,
    Full,
}

/// Read-only view of a sheet, as a consumer renders it.
#[derive(Debug, PartialEq)]
pub struct SheetState<'a, T> {
    pub is_open: bool,
    pub height_percent: f64,
    pub is_dragging: bool,
    pub is_expanded: bool,
    pub selected_payload: Option<&'a T>,
}

#[derive(Debug)]
pub struct DragSheet<T> {
    config: SheetConfig,
    viewport_height: f64,
    phase: SheetPhase,
    height: f64,
    expanded: bool,
    payload: Option<T>,
}

impl<T> DragSheet<T> {
    pub fn new(config: SheetConfig, viewport_height: f64) -> Result<Self, SheetConfigError> {
        config.validate()?;
        Ok(Self {
            height: config.mid_height,
            config,
            viewport_height,
            phase: SheetPhase::Closed,
            expanded: false,
            payload: None,
        })
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    /// Viewport resizes are honoured by the next drag move.
    pub fn set_viewport_height(&mut self, viewport_height: f64) {
        self.viewport_height = viewport_height;
    }

    /// Open with `payload` at `initial_height`. Any drag in progress is dropped.
    pub fn open(&mut self, payload: T, initial_height: f64) {
        let height = if initial_height.is_finite() {
            self.config.clamp(initial_height)
        } else {
            self.config.mid_height
        };
        self.payload = Some(payload);
        self.height = height;
        self.expanded = false;
        self.phase = SheetPhase::Settled;
    }

    pub fn open_mid(&mut self, payload: T) {
        let mid = self.config.mid_height;
        self.open(payload, mid);
    }

    /// Close from any state. The payload is kept until [`DragSheet::clear_payload`].
    pub fn close(&mut self) {
        self.phase = SheetPhase::Closed;
        self.height = self.config.mid_height;
        self.expanded = false;
    }

    pub fn clear_payload(&mut self) -> Option<T> {
        self.payload.take()
    }

    /// Jump to full height and flag the sheet as expanded. Only an open,
    /// settled sheet can expand.
    pub fn expand(&mut self) -> bool {
        if self.phase != SheetPhase::Settled {
            return false;
        }
        self.height = self.config.full_height;
        self.expanded = true;
        true
    }

    /// Begin a drag. Ignored unless the sheet is settled, so a second
    /// pointer cannot take over a drag in progress.
    pub fn drag_start(&mut self, pointer_id: u64, pointer_y: f64) -> bool {
        if self.phase != SheetPhase::Settled || !pointer_y.is_finite() {
            return false;
        }
        self.phase = SheetPhase::Dragging {
            pointer_id,
            start_y: pointer_y,
            start_height: self.height,
        };
        true
    }

    /// Follow the pointer. Returns the new height, or `None` if the event
    /// does not belong to the active drag.
    pub fn drag_move(&mut self, pointer_id: u64, pointer_y: f64) -> Option<f64> {
        let SheetPhase::Dragging {
            pointer_id: active,
            start_y,
            start_height,
        } = self.phase
        else {
            return None;
        };
        if active != pointer_id {
            return None;
        }
        if !pointer_y.is_finite() || !(self.viewport_height > 0.0) {
            return Some(self.height);
        }
        let delta_percent = (start_y - pointer_y) * 100.0 / self.viewport_height;
        let candidate = start_height + delta_percent;
        if candidate.is_finite() {
            self.height = self.config.clamp(candidate);
        } else if candidate > 0.0 {
            self.height = self.config.max_height;
        } else if candidate < 0.0 {
            self.height = self.config.min_height;
        }
        Some(self.height)
    }

    /// Release the drag and snap.
    pub fn drag_end(&mut self, pointer_id: u64) -> Option<Snap> {
        match self.phase {
            SheetPhase::Dragging {
                pointer_id: active, ..
            } if active == pointer_id => {}
            _ => return None,
        }
        let snap = if self.height < self.config.low_threshold {
            self.close();
            Snap::Closed
        } else if self.height < self.config.high_threshold {
            self.phase = SheetPhase::Settled;
            self.height = self.config.mid_height;
            self.expanded = false;
            Snap::Mid
        } else {
            self.phase = SheetPhase::Settled;
            self.height = self.config.full_height;
            self.expanded = true;
            Snap::Full
        };
        tracing::trace!(?snap, height = self.height, "sheet settled");
        Some(snap)
    }

    /// A cancelled pointer releases the drag like a normal pointer up.
    pub fn pointer_cancel(&mut self, pointer_id: u64) -> Option<Snap> {
        self.drag_end(pointer_id)
    }

    pub fn phase(&self) -> SheetPhase {
        self.phase
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn is_open(&self) -> bool {
        self.phase != SheetPhase::Closed
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, SheetPhase::Dragging { .. })
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Whether move/up listeners must be attached. Page scrolling stays
    /// locked for exactly as long.
    pub fn captures_pointer(&self) -> bool {
        self.is_dragging()
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn state(&self) -> SheetState<'_, T> {
        SheetState {
            is_open: self.is_open(),
            height_percent: self.height,
            is_dragging: self.is_dragging(),
            is_expanded: self.expanded,
            selected_payload: self.payload.as_ref(),
        }
    }
}
