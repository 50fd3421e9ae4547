//! Overlay metadata collected while a tile is drawn.
//!
//! Labels and symbols cannot be baked into a tile bitmap because they would
//! be cut at tile borders and overlap their neighbours. The drawing routine
//! records them here instead, and the compositor places them after the tiles
//! of the whole viewport are known.

/// A single overlay element positioned in tile pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoElement {
    /// Text or symbol name
    pub label: String,
    /// Anchor x in target pixels
    pub x: f64,
    /// Anchor y in target pixels
    pub y: f64,
    /// Higher priorities win when elements collide
    pub priority: i32,
}

/// Overlay elements produced for one tile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoLayer {
    elements: Vec<InfoElement>,
}

impl InfoLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an overlay element.
    pub fn add(&mut self, label: impl Into<String>, x: f64, y: f64, priority: i32) {
        self.elements.push(InfoElement {
            label: label.into(),
            x,
            y,
            priority,
        });
    }

    pub fn elements(&self) -> &[InfoElement] {
        &self.elements
    }

    /// Elements ordered from highest to lowest priority.
    ///
    /// The sort is stable, so elements of equal priority keep the order in
    /// which the drawing routine added them.
    pub fn by_priority(&self) -> Vec<&InfoElement> {
        let mut sorted: Vec<&InfoElement> = self.elements.iter().collect();
        sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
        sorted
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }
}
