use futures::StreamExt;
use thiserror::Error;

use crate::{
    client::Client,
    loader::{self, Arrival, PromotionsLoader, RequestTicket},
    places::Place,
    sheet::{DragSheet, SheetConfig, SheetConfigError, Snap},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no place is selected")]
    NothingSelected,
    #[error("the sheet cannot expand while a drag is in progress")]
    Dragging,
}

/// Result of releasing a drag on the place sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The sheet closed and the place was deselected.
    Closed,
    /// The sheet settled at mid height; promotions are no longer shown.
    Collapsed,
    /// The sheet expanded. `load` is set when promotions must be fetched.
    Expanded { load: Option<RequestTicket> },
}

/// Map marker selection: which place is open in the sheet, and the
/// promotions shown once it is expanded.
#[derive(Debug)]
pub struct PlaceSelection {
    sheet: DragSheet<Place>,
    promotions: PromotionsLoader,
}

impl PlaceSelection {
    pub fn new(config: SheetConfig, viewport_height: f64) -> Result<Self, SheetConfigError> {
        Ok(Self {
            sheet: DragSheet::new(config, viewport_height)?,
            promotions: PromotionsLoader::new(),
        })
    }

    /// Open the sheet at mid height for `place`. Promotions of a previously
    /// selected place are dropped, including any still in flight.
    pub fn select_place(&mut self, place: Place) {
        tracing::debug!(place_id = place.id, "place selected");
        self.promotions.cancel();
        self.sheet.open_mid(place);
    }

    /// Expand the sheet for the selected place. Returns the ticket to fetch
    /// promotions with, or `None` if they are already loading for this place.
    pub fn request_expand(&mut self) -> Result<Option<RequestTicket>, SelectionError> {
        let place_id = self
            .active_place()
            .map(|place| place.id)
            .ok_or(SelectionError::NothingSelected)?;
        let already_loading = self.sheet.is_expanded() && self.promotions.place_id() == Some(place_id);
        if !self.sheet.expand() {
            return Err(SelectionError::Dragging);
        }
        if already_loading {
            return Ok(None);
        }
        Ok(Some(self.promotions.begin(place_id)))
    }

    /// Close the sheet and forget the place.
    pub fn deselect(&mut self) {
        self.sheet.close();
        if let Some(place) = self.sheet.clear_payload() {
            tracing::debug!(place_id = place.id, "place deselected");
        }
        self.promotions.cancel();
    }

    pub fn drag_start(&mut self, pointer_id: u64, pointer_y: f64) -> bool {
        self.sheet.drag_start(pointer_id, pointer_y)
    }

    pub fn drag_move(&mut self, pointer_id: u64, pointer_y: f64) -> Option<f64> {
        self.sheet.drag_move(pointer_id, pointer_y)
    }

    pub fn drag_end(&mut self, pointer_id: u64) -> Option<Transition> {
        let was_loading = self.promotions.place_id();
        let snap = self.sheet.drag_end(pointer_id)?;
        Some(match snap {
            Snap::Closed => {
                self.deselect();
                Transition::Closed
            }
            Snap::Mid => {
                self.promotions.cancel();
                Transition::Collapsed
            }
            Snap::Full => {
                let place_id = self.active_place().map(|place| place.id);
                let load = match place_id {
                    Some(id) if was_loading != Some(id) => Some(self.promotions.begin(id)),
                    _ => None,
                };
                Transition::Expanded { load }
            }
        })
    }

    pub fn pointer_cancel(&mut self, pointer_id: u64) -> Option<Transition> {
        self.drag_end(pointer_id)
    }

    /// Commit a promotions arrival; stale ones are dropped.
    pub fn apply(&mut self, arrival: Arrival) -> bool {
        self.promotions.apply(arrival)
    }

    /// Fetch promotions for `ticket` and commit whatever is still current.
    pub async fn load_promotions(&mut self, client: &Client, ticket: RequestTicket) {
        let mut arrivals = loader::fetch(client, ticket);
        while let Some(arrival) = arrivals.next().await {
            self.apply(arrival);
        }
    }

    /// The selected place, while the sheet shows it.
    pub fn active_place(&self) -> Option<&Place> {
        if self.sheet.is_open() {
            self.sheet.payload()
        } else {
            None
        }
    }

    pub fn sheet(&self) -> &DragSheet<Place> {
        &self.sheet
    }

    pub fn promotions(&self) -> &PromotionsLoader {
        &self.promotions
    }

    /// Promotions are only shown for an expanded sheet.
    pub fn shows_promotions(&self) -> bool {
        self.sheet.is_expanded() && self.promotions.place_id().is_some()
    }
}
