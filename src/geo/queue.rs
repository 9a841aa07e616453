//! Queue of partners that still lack coordinates.

use super::{GeoCapture, MapPicker, PositionProvider};
use crate::errors::{ConsoleError, Result};
use crate::models::{Coordinates, ListQuery, Partner, PartnerType};
use crate::scope::Scope;

/// One page of the geo-queue plus the per-row capture actions.
///
/// A row leaves the list only after its location has been saved; a failed
/// save leaves both the row and the total untouched. Saving follows the
/// scope the page was loaded under, so rows listed across all units are
/// read-only.
pub struct GeoQueue {
    capture: GeoCapture,
    scope: Scope,
    page: u32,
    search: String,
    partner_type: Option<PartnerType>,
    items: Vec<Partner>,
    total: u64,
    picker: MapPicker,
    pick_target: Option<u64>,
}

impl GeoQueue {
    pub fn new(capture: GeoCapture) -> Self {
        Self {
            capture,
            scope: Scope::current(),
            page: 1,
            search: String::new(),
            partner_type: None,
            items: Vec::new(),
            total: 0,
            picker: MapPicker::new(),
            pick_target: None,
        }
    }

    pub fn items(&self) -> &[Partner] {
        &self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// A new search starts again from the first page.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    pub fn set_type(&mut self, partner_type: Option<PartnerType>) {
        self.partner_type = partner_type;
        self.page = 1;
    }

    pub fn query(&self) -> ListQuery {
        ListQuery::page(self.page)
            .with_search(self.search.clone())
            .with_type(self.partner_type)
    }

    /// Fetch the current page. A failed load empties the list.
    pub async fn load(&mut self, scope: &Scope) -> Result<()> {
        self.scope = *scope;
        let result = self
            .capture
            .client()
            .list_partners_missing_location(&self.query(), scope)
            .await;

        match result {
            Ok(page) => {
                self.items = page.data;
                self.total = page.total;
                Ok(())
            }
            Err(e) => {
                self.items.clear();
                self.total = 0;
                Err(e)
            }
        }
    }

    /// Capture the device position for a row.
    pub async fn capture_current(
        &mut self,
        partner_id: u64,
        provider: &dyn PositionProvider,
    ) -> Result<Coordinates> {
        self.ensure_listed(partner_id)?;
        self.scope.write_query()?;
        let coordinates = self
            .capture
            .capture_from_device(partner_id, provider)
            .await?;
        self.remove_row(partner_id);
        Ok(coordinates)
    }

    /// Open the map picker for a row.
    pub fn open_picker(&mut self, partner_id: u64) -> Result<&mut MapPicker> {
        self.ensure_listed(partner_id)?;
        self.pick_target = Some(partner_id);
        self.picker.open(None);
        Ok(&mut self.picker)
    }

    pub fn picker(&self) -> &MapPicker {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut MapPicker {
        &mut self.picker
    }

    pub fn cancel_pick(&mut self) {
        self.picker.cancel();
        self.pick_target = None;
    }

    /// Save the picked location for the row the picker was opened for.
    pub async fn confirm_pick(&mut self) -> Result<Coordinates> {
        let partner_id = self
            .pick_target
            .ok_or_else(|| ConsoleError::validation("partner_id", "No partner selected"))?;
        self.scope.write_query()?;
        let coordinates = self
            .capture
            .confirm_pick(partner_id, &mut self.picker)
            .await?;
        self.pick_target = None;
        self.remove_row(partner_id);
        Ok(coordinates)
    }

    fn ensure_listed(&self, partner_id: u64) -> Result<()> {
        if self.items.iter().any(|p| p.id == partner_id) {
            Ok(())
        } else {
            Err(ConsoleError::NotFound(format!(
                "Partner {} is not in the queue",
                partner_id
            )))
        }
    }

    fn remove_row(&mut self, partner_id: u64) {
        let before = self.items.len();
        self.items.retain(|p| p.id != partner_id);
        if self.items.len() < before {
            self.total = self.total.saturating_sub(1);
        }
    }
}
