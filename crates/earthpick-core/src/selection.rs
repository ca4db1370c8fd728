//! Pick decoding and selection state.
//!
//! The pick pass renders the index texture under the cursor into a single
//! pixel. [`decode_index`] turns that pixel back into a country index and
//! [`PickingState::apply_pick`] applies the selection policy, repainting the
//! palette as it goes.

use crate::OCEAN_INDEX;
use crate::dataset::CountryRecord;
use crate::palette::{Palette, PaletteColors};

/// Modifier keys held when the click was released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        meta: false,
    };

    /// Whether any modifier turns the click into an additive toggle.
    #[must_use]
    pub fn any(self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Decode a pick pixel into a country index.
///
/// The index is stored as `R + G * 256`. Anything above `country_count` can
/// only come from a corrupt or mismatched texture and reads as ocean.
#[must_use]
pub fn decode_index(pixel: [u8; 4], country_count: usize) -> u32 {
    let [r, g, _, _] = pixel;
    let index = u32::from(r) | (u32::from(g) << 8);

    if index as usize > country_count {
        tracing::warn!(
            "Decoded pick index {} outside dataset range 0..={}, treating as ocean",
            index,
            country_count
        );
        return OCEAN_INDEX;
    }

    index
}

/// What a resolved pick did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    /// Nothing changed (ocean click with an empty selection).
    Unchanged,
    /// Every selection was dropped.
    Cleared { previous_count: usize },
    /// A country became selected. `exclusive` is set when other selections
    /// were cleared first.
    Selected { index: u32, exclusive: bool },
    /// A country was toggled off.
    Deselected { index: u32 },
}

/// Country records, selection count and the palette that mirrors them.
#[derive(Debug, Clone)]
pub struct PickingState {
    records: Vec<CountryRecord>,
    palette: Palette,
    selected_count: usize,
}

impl PickingState {
    /// Create the state for a freshly loaded dataset. Any `selected` flags on
    /// the incoming records are cleared.
    #[must_use]
    pub fn new(mut records: Vec<CountryRecord>, colors: PaletteColors) -> Self {
        for record in &mut records {
            record.selected = false;
        }
        Self {
            records,
            palette: Palette::new(colors),
            selected_count: 0,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[CountryRecord] {
        &self.records
    }

    /// Look up a record by its 1-based index.
    #[must_use]
    pub fn record(&self, index: u32) -> Option<&CountryRecord> {
        let position = (index as usize).checked_sub(1)?;
        self.records.get(position)
    }

    #[must_use]
    pub fn country_count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected_count
    }

    #[must_use]
    pub fn any_selected(&self) -> bool {
        self.selected_count > 0
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Clear the palette's dirty flag, returning whether it needs uploading.
    pub fn take_palette_dirty(&mut self) -> bool {
        self.palette.take_dirty()
    }

    /// Decode a pick pixel and apply it.
    pub fn apply_pixel(&mut self, pixel: [u8; 4], modifiers: Modifiers) -> SelectionChange {
        let index = decode_index(pixel, self.records.len());
        self.apply_pick(index, modifiers)
    }

    /// Apply a resolved pick.
    ///
    /// A plain click on a country leaves exactly that country selected. With
    /// a modifier held, or when the click turns a country off, the click
    /// toggles just that country. A plain click on the ocean clears
    /// everything.
    pub fn apply_pick(&mut self, index: u32, modifiers: Modifiers) -> SelectionChange {
        let Some(position) = (index as usize).checked_sub(1) else {
            if self.any_selected() {
                let previous_count = self.selected_count;
                self.clear_selection();
                return SelectionChange::Cleared { previous_count };
            }
            return SelectionChange::Unchanged;
        };

        let Some(was_selected) = self.records.get(position).map(|r| r.selected) else {
            return self.apply_pick(OCEAN_INDEX, modifiers);
        };
        let selected = !was_selected;

        let exclusive = selected && !modifiers.any();
        if exclusive {
            self.clear_selection();
        }

        if selected {
            self.selected_count += 1;
        } else {
            self.selected_count -= 1;
        }
        self.records[position].selected = selected;
        self.palette.set_selected(index, selected);

        if selected {
            SelectionChange::Selected { index, exclusive }
        } else {
            SelectionChange::Deselected { index }
        }
    }

    /// Drop every selection and repaint the palette.
    pub fn clear_selection(&mut self) {
        for record in &mut self.records {
            record.selected = false;
        }
        self.selected_count = 0;
        self.palette.reset();
    }
}
