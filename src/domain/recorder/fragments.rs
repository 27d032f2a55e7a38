//! Ordered buffer of captured audio fragments

/// Fragments of one session in capture order.
/// Zero-length fragments are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentBuffer {
    fragments: Vec<Vec<u8>>,
    total_bytes: usize,
}

impl FragmentBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment. Returns false if it was empty and discarded.
    pub fn push(&mut self, fragment: Vec<u8>) -> bool {
        if fragment.is_empty() {
            return false;
        }
        self.total_bytes += fragment.len();
        self.fragments.push(fragment);
        true
    }

    /// Number of stored fragments
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// True if no fragment has been stored
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Total size of all fragments in bytes
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Concatenate all fragments into one blob
    pub fn concat(self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(self.total_bytes);
        for fragment in self.fragments {
            blob.extend_from_slice(&fragment);
        }
        blob
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fragments_are_discarded() {
        let mut buffer = FragmentBuffer::new();
        assert!(buffer.push(vec![1, 2]));
        assert!(!buffer.push(Vec::new()));
        assert!(buffer.push(vec![3]));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.total_bytes(), 3);
    }

    #[test]
    fn concat_keeps_capture_order() {
        let mut buffer = FragmentBuffer::new();
        buffer.push(vec![1, 2, 3]);
        buffer.push(vec![4]);
        buffer.push(vec![5, 6]);
        assert_eq!(buffer.concat(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn new_buffer_is_empty() {
        let buffer = FragmentBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.concat(), Vec::<u8>::new());
    }
}
