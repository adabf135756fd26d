/// Placeholder syntax a dialect's SQL parser expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// Positional `$1`, `$2`, ... (PostgreSQL).
    IndexedDollar,
    /// Anonymous `?` repeated once per parameter (MySQL).
    Anonymous,
    /// Positional `?1`, `?2`, ... (SQLite).
    IndexedQuestion,
    /// Named `@P1`, `@P2`, ... (SQL Server).
    NamedAt,
}

/// One rendered placeholder: its 0-based parameter slot and the literal
/// token to splice into the SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMarker {
    pub position: usize,
    pub placeholder: String,
}

/// Produces the marker for each parameter slot of one statement render.
///
/// Positional numbering starts at 1 and counts up per call, so a fresh
/// instance is required for every render pass; instances are never shared
/// across statements.
#[derive(Debug)]
pub struct BindMarkers {
    style: MarkerStyle,
    next: usize,
}

impl BindMarkers {
    pub(crate) fn new(style: MarkerStyle) -> Self {
        Self { style, next: 0 }
    }

    /// The marker for the next parameter slot, in declaration order.
    pub fn next(&mut self) -> BindMarker {
        let position = self.next;
        self.next += 1;
        let placeholder = match self.style {
            MarkerStyle::IndexedDollar => format!("${}", position + 1),
            MarkerStyle::Anonymous => "?".to_string(),
            MarkerStyle::IndexedQuestion => format!("?{}", position + 1),
            MarkerStyle::NamedAt => format!("@P{}", position + 1),
        };
        BindMarker {
            position,
            placeholder,
        }
    }

    /// How many markers have been produced so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.next
    }
}
