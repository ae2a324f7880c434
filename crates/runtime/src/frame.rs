/// Frame-synchronous tick metadata.
///
/// All viewport resolution for a tick happens against the inputs snapshotted
/// when the frame begins; the index lets consumers tell frames apart.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
}

impl Frame {
    pub fn new(index: u64) -> Self {
        Self { index }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1)
    }
}
