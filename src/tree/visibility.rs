use super::AppState;

impl AppState {
    /// Whether an item shows while an item is maximized.
    ///
    /// The maximized item stays visible together with its ancestors, so the user can find the
    /// way back out, and everything inside it. Unrelated items hide. Without a maximized item
    /// everything is visible.
    pub fn is_visible(&self, id: &str) -> bool {
        let Some(maximized) = self.maximized_item.as_deref() else {
            return true;
        };
        if !self.index.contains(maximized) {
            return true;
        }

        self.index.is_within(id, maximized) || self.index.is_within(maximized, id)
    }
}
