/// Custom actions for menu items beyond plain edits.
#[derive(Debug, Clone)]
pub enum MenuAction {
    /// Marks the item as orderable or sold out.
    SetAvailable(bool),
}

/// Results from MenuActions - variants match 1:1 with MenuAction
#[derive(Debug, Clone, PartialEq)]
pub enum MenuActionResult {
    /// Whether the flag actually changed
    SetAvailable(bool),
}
