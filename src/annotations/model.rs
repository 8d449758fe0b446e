//! Committed annotation history

use crate::domain::AnnotationPrimitive;

/// Ordered annotations plus the stack of undone ones
///
/// `list()` is paint order. Undo moves the newest committed primitive onto
/// the undone stack; any commit discards that stack. There is no redo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationModel {
    committed: Vec<AnnotationPrimitive>,
    undone: Vec<AnnotationPrimitive>,
}

impl AnnotationModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit(&mut self, primitive: AnnotationPrimitive) {
        // Truncate any undo history
        self.undone.clear();
        self.committed.push(primitive);
        log::debug!("Committed annotation #{}", self.committed.len());
    }

    /// Returns false when there was nothing to undo
    pub fn undo(&mut self) -> bool {
        match self.committed.pop() {
            Some(primitive) => {
                self.undone.push(primitive);
                true
            }
            None => false,
        }
    }

    pub fn list(&self) -> &[AnnotationPrimitive] {
        &self.committed
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    pub fn undone_len(&self) -> usize {
        self.undone.len()
    }

    pub fn clear(&mut self) {
        self.committed.clear();
        self.undone.clear();
    }
}
