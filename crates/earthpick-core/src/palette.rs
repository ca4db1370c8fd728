//! Selection palette mirrored into a 1-D GPU lookup texture.
//!
//! Slot `k` holds the display color of country index `k`. Slot 0 is the
//! ocean and never changes.

/// Number of palette slots, and so the number of addressable indices
/// (ocean included).
pub const MAX_COUNTRIES: usize = 512;

/// Colors written into the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteColors {
    pub selected: [u8; 3],
    pub unselected: [u8; 3],
    pub ocean: [u8; 3],
}

impl Default for PaletteColors {
    fn default() -> Self {
        Self {
            selected: [0xff, 0xff, 0xff],
            unselected: [0x00, 0x00, 0x00],
            ocean: [0x22, 0x22, 0x22],
        }
    }
}

/// CPU copy of the palette texture.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: PaletteColors,
    slots: Vec<[u8; 3]>,
    dirty: bool,
}

impl Palette {
    /// Create a palette with every country unselected.
    #[must_use]
    pub fn new(colors: PaletteColors) -> Self {
        let mut palette = Self {
            colors,
            slots: vec![colors.unselected; MAX_COUNTRIES],
            dirty: false,
        };
        palette.reset();
        palette
    }

    /// Paint every country slot unselected and slot 0 ocean.
    pub fn reset(&mut self) {
        self.slots.fill(self.colors.unselected);
        self.slots[0] = self.colors.ocean;
        self.dirty = true;
    }

    /// Repaint one country slot. Index 0 and indices past the end are ignored.
    pub fn set_selected(&mut self, index: u32, selected: bool) {
        let slot = index as usize;
        if slot == 0 || slot >= self.slots.len() {
            return;
        }
        self.slots[slot] = if selected {
            self.colors.selected
        } else {
            self.colors.unselected
        };
        self.dirty = true;
    }

    #[must_use]
    pub fn color(&self, index: u32) -> Option<[u8; 3]> {
        self.slots.get(index as usize).copied()
    }

    #[must_use]
    pub fn colors(&self) -> PaletteColors {
        self.colors
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag, returning whether it was set.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Texture bytes in RGBA8 layout, one texel per slot, alpha opaque.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.slots
            .iter()
            .flat_map(|&[r, g, b]| [r, g, b, u8::MAX])
            .collect()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(PaletteColors::default())
    }
}
