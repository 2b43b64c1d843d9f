/// A growable bit set over arena indices.
///
/// The printer marks the pair cells on its currently-open path here, so a
/// back-reference is detected as a cycle instead of looping.
#[derive(Clone, Debug, Default)]
pub struct BitSet {
    data: Vec<usize>,
}

impl BitSet {
    /// Creates a new, empty bitset.
    pub fn new() -> Self {
        Default::default()
    }

    const BITS_PER_WORD: usize = std::mem::size_of::<usize>() * 8;

    /// Gets the value of the given bit.
    pub fn get(&self, idx: usize) -> bool {
        let word = idx / Self::BITS_PER_WORD;
        let bit = idx % Self::BITS_PER_WORD;
        if word >= self.data.len() {
            return false;
        }
        self.data[word] & (1 << bit) != 0
    }

    /// Sets the given bit.
    pub fn set(&mut self, idx: usize) {
        let word = idx / Self::BITS_PER_WORD;
        let bit = idx % Self::BITS_PER_WORD;
        if word >= self.data.len() {
            self.data.resize(word + 1, 0);
        }
        self.data[word] |= 1 << bit;
    }

    /// Clears the given bit.
    pub fn clear(&mut self, idx: usize) {
        let word = idx / Self::BITS_PER_WORD;
        let bit = idx % Self::BITS_PER_WORD;
        if word < self.data.len() {
            self.data[word] &= !(1 << bit);
        }
    }
}
