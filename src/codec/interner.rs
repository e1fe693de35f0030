//! Path interning for decode. Large projects repeat the same item paths in
//! every configuration; interning makes them share one allocation.

use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct PathInterner {
    paths: HashSet<Rc<str>>,
}

impl PathInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, path: &str) -> Rc<str> {
        if let Some(existing) = self.paths.get(path) {
            return Rc::clone(existing);
        }
        let interned: Rc<str> = Rc::from(path);
        self.paths.insert(Rc::clone(&interned));
        interned
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_path_twice_shares_the_allocation() {
        let mut interner = PathInterner::new();
        let first = interner.intern("src/main.c");
        let second = interner.intern("src/main.c");
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_paths_are_distinct_entries() {
        let mut interner = PathInterner::new();
        interner.intern("a.c");
        interner.intern("b.c");
        assert_eq!(interner.len(), 2);
    }
}
