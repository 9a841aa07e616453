//! Interactive map pick with a single movable marker.

use crate::models::Coordinates;

/// Where the picker map is centred when nothing else is known (Lagos).
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    lat: 6.5244,
    lng: 3.3792,
};

/// State of the pick-a-location dialog.
///
/// The picker owns one marker for its whole lifetime: the first click
/// places it, later clicks move it, and closing resets it so nothing leaks
/// into the next opening.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPicker {
    open: bool,
    center: Coordinates,
    marker: Option<Coordinates>,
}

impl Default for MapPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl MapPicker {
    pub fn new() -> Self {
        Self {
            open: false,
            center: DEFAULT_CENTER,
            marker: None,
        }
    }

    /// Open the dialog, optionally pre-placing the marker at a known location.
    pub fn open(&mut self, initial: Option<Coordinates>) {
        self.open = true;
        self.center = initial.unwrap_or(DEFAULT_CENTER);
        self.marker = initial;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn center(&self) -> Coordinates {
        self.center
    }

    /// Place or move the marker. Ignored while closed.
    pub fn click(&mut self, at: Coordinates) {
        if self.open {
            self.marker = Some(at);
        }
    }

    /// The marker waiting for confirmation.
    pub fn pending(&self) -> Option<Coordinates> {
        if self.open {
            self.marker
        } else {
            None
        }
    }

    pub fn can_confirm(&self) -> bool {
        self.pending().is_some()
    }

    /// Discard the marker without side effects.
    pub fn cancel(&mut self) {
        self.close();
    }

    pub(crate) fn close(&mut self) {
        self.open = false;
        self.marker = None;
        self.center = DEFAULT_CENTER;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clicks_move_the_single_marker() {
        let mut picker = MapPicker::new();
        picker.open(None);
        assert!(!picker.can_confirm());

        picker.click(Coordinates::new(6.5, 3.3));
        picker.click(Coordinates::new(6.6, 3.4));
        assert_eq!(picker.pending(), Some(Coordinates::new(6.6, 3.4)));
    }

    #[test]
    fn test_cancel_resets_for_next_open() {
        let mut picker = MapPicker::new();
        picker.open(None);
        picker.click(Coordinates::new(6.5, 3.3));
        picker.cancel();

        assert!(!picker.is_open());
        picker.open(None);
        assert_eq!(picker.pending(), None);
        assert_eq!(picker.center(), DEFAULT_CENTER);
    }

    #[test]
    fn test_clicks_while_closed_are_ignored() {
        let mut picker = MapPicker::new();
        picker.click(Coordinates::new(6.5, 3.3));
        picker.open(None);
        assert_eq!(picker.pending(), None);
    }

    #[test]
    fn test_initial_location_preplaces_marker() {
        let mut picker = MapPicker::new();
        let known = Coordinates::new(9.05, 7.49);
        picker.open(Some(known));
        assert_eq!(picker.center(), known);
        assert_eq!(picker.pending(), Some(known));
    }
}
