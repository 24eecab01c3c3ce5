//! Move/resize geometry for a frameless widget.
//!
//! There is no native resize border: edges are hit-tested against the
//! widget rectangle with a fixed tolerance, and a drag session replays the
//! cursor delta against the rectangle captured at button-down.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowGeometry {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Last column inside the rectangle.
    pub fn right(&self) -> i32 {
        self.x + self.width - 1
    }

    /// Last row inside the rectangle.
    pub fn bottom(&self) -> i32 {
        self.y + self.height - 1
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// How close to an edge the cursor must be to grab it, and how small the
/// widget may get.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeTolerance {
    pub margin: i32,
    pub border: i32,
    pub min_size: i32,
}

impl ResizeTolerance {
    pub const DEFAULT_MARGIN: i32 = 0;
    pub const DEFAULT_BORDER: i32 = 1;
    pub const DEFAULT_MIN_SIZE: i32 = 3;

    fn reach(&self) -> i32 {
        self.margin + self.border
    }
}

impl Default for ResizeTolerance {
    fn default() -> Self {
        Self {
            margin: Self::DEFAULT_MARGIN,
            border: Self::DEFAULT_BORDER,
            min_size: Self::DEFAULT_MIN_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeFlags {
    pub left: bool,
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
}

impl EdgeFlags {
    pub fn hit_test(rect: WindowGeometry, p: Point, tol: ResizeTolerance) -> Self {
        let reach = tol.reach();
        Self {
            left: p.x <= rect.x + reach,
            top: p.y <= rect.y + reach,
            right: p.x >= rect.right() - reach,
            bottom: p.y >= rect.bottom() - reach,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.left || self.top || self.right || self.bottom)
    }

    pub fn cursor(&self) -> CursorShape {
        let Self { left: w, top: n, right: e, bottom: s } = *self;
        if (n && w) || (s && e) {
            CursorShape::NwSe
        } else if (n && e) || (s && w) {
            CursorShape::NeSw
        } else if n || s {
            CursorShape::NorthSouth
        } else if w || e {
            CursorShape::WestEast
        } else {
            CursorShape::Default
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Default,
    NorthSouth,
    WestEast,
    NwSe,
    NeSw,
}

impl CursorShape {
    pub fn glyph(&self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::NorthSouth => Some("↕"),
            Self::WestEast => Some("↔"),
            Self::NwSe => Some("⤡"),
            Self::NeSw => Some("⤢"),
        }
    }
}

// ============================================================================
// Drag Session
// ============================================================================

/// Anchor captured at button-down. Every later move is measured from here,
/// never from the live rectangle, so a multi-edge resize cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub start_cursor: Point,
    pub start_rect: WindowGeometry,
}

impl DragSession {
    pub fn new(start_cursor: Point, start_rect: WindowGeometry) -> Self {
        Self { start_cursor, start_rect }
    }

    /// Edges grabbed at button-down; frozen for the whole session.
    pub fn edges(&self, tol: ResizeTolerance) -> EdgeFlags {
        EdgeFlags::hit_test(self.start_rect, self.start_cursor, tol)
    }

    pub fn apply(&self, cursor: Point, tol: ResizeTolerance) -> WindowGeometry {
        let dx = cursor.x - self.start_cursor.x;
        let dy = cursor.y - self.start_cursor.y;
        let start = self.start_rect;
        let edges = self.edges(tol);

        if edges.is_empty() {
            return WindowGeometry { x: start.x + dx, y: start.y + dy, ..start };
        }

        let mut rect = start;
        if edges.left {
            rect.x = start.x + dx;
            rect.width = (start.width - dx).max(tol.min_size);
        }
        if edges.top {
            rect.y = start.y + dy;
            rect.height = (start.height - dy).max(tol.min_size);
        }
        if edges.right {
            rect.width = (start.width + dx).max(tol.min_size);
        }
        if edges.bottom {
            rect.height = (start.height + dy).max(tol.min_size);
        }
        rect
    }
}
