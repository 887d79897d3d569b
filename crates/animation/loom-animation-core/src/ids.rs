//! Generated snippet names.

/// Monotonic allocator for names of snippets loaded without one.
#[derive(Default, Debug)]
pub struct NameAllocator {
    next: u64,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next `sn_<n>` name not rejected by `taken`.
    pub fn alloc(&mut self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let name = format!("sn_{}", self.next);
            self.next = self.next.wrapping_add(1);
            if !taken(&name) {
                return name;
            }
        }
    }
}
