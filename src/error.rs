use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HatTrieError {
    /// The computed table layout exceeded the collection's maximum
    /// (usually `isize::MAX` bytes).
    #[error("table capacity overflow")]
    CapacityOverflow,
    /// The allocator failed to produce the requested block.
    #[error("allocation of {size} bytes (align {align}) failed")]
    Alloc { size: usize, align: usize },
    /// Slab record size of zero, or one a single slab cannot hold.
    #[error("invalid slab record size `{0}`")]
    BufSize(usize),
}

pub type Result<T> = std::result::Result<T, HatTrieError>;
