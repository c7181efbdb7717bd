//! Compile-time tunables.

/// The stored word.
///
/// `0` doubles as the not-yet-assigned sentinel for empty-key slots and
/// cleared trie values; presence is tracked by node flags, never by value
/// content.
pub type Value = u64;

cfg_if::cfg_if! {
    if #[cfg(feature = "ascii")] {
        /// Largest byte the trie branches on (7-bit ASCII build).
        pub const TRIE_MAXCHAR: u8 = 0x7f;
    } else {
        /// Largest byte the trie branches on.
        pub const TRIE_MAXCHAR: u8 = 0xff;
    }
}

/// Number of keys a bucket may hold before it is burst.
pub const TRIE_BUCKET_SIZE: usize = 16384;

/// Slot count of a freshly created array hash table.
pub const AHTABLE_INIT_SIZE: usize = 4096;

/// Slab size. Slabs are allocated aligned to this, so a record pointer
/// masked by `!(SLAB_SIZE - 1)` yields the owning slab header.
pub const SLAB_SIZE: usize = 65536;

/// Minimal record size: a free record must hold the free-list link.
pub const SLAB_MIN_BUFLEN: usize = 8;

/// Minimum slack reserved for slab cache coloring.
pub const SLAB_MINCOLOR: usize = 32;
