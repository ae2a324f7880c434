/// Latest-wins slot for inputs that arrive between frames.
///
/// Submitting while a value is pending replaces it; nothing is queued or
/// merged. The frame driver `take`s the slot once at the start of a frame, so
/// a submission made mid-frame is only observed by the next frame.
#[derive(Debug, Clone)]
pub struct Latest<T> {
    pending: Option<T>,
    superseded: u64,
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self {
            pending: None,
            superseded: 0,
        }
    }
}

impl<T> Latest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, discarding any pending one.
    ///
    /// Returns `true` if a pending value was superseded.
    pub fn submit(&mut self, value: T) -> bool {
        let replaced = self.pending.replace(value).is_some();
        if replaced {
            self.superseded += 1;
        }
        replaced
    }

    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Total number of submissions discarded in favor of a newer one.
    pub fn superseded_count(&self) -> u64 {
        self.superseded
    }
}
