/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    /// 1-based number of the question on screen.
    pub position: usize,
    pub answered: usize,
    pub score: u32,
    pub is_complete: bool,
}
