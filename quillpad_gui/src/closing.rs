use std::collections::VecDeque;

use quillpad_core::{DocumentId, DocumentSet};

/// User's answer to the unsaved-changes question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    Save,
    Discard,
    Cancel,
}

/// Closing one or more documents, possibly followed by quitting.
///
/// Every modified target is asked about in tab order. A single cancel aborts
/// the whole plan and nothing is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosePlan {
    targets: Vec<DocumentId>,
    pending: VecDeque<DocumentId>,
    exit: bool,
    cancelled: bool,
}

impl ClosePlan {
    /// Plan for closing `targets`; only modified ones are asked about.
    pub fn for_documents(documents: &DocumentSet, targets: Vec<DocumentId>) -> Self {
        let pending = targets
            .iter()
            .copied()
            .filter(|id| {
                documents
                    .document(*id)
                    .is_some_and(|document| document.is_modified())
            })
            .collect();
        Self {
            targets,
            pending,
            exit: false,
            cancelled: false,
        }
    }

    /// Plan for quitting: every open document is a target.
    pub fn for_exit(documents: &DocumentSet, confirm: bool) -> Self {
        let targets = documents.iter().map(|document| document.id()).collect();
        let mut plan = Self::for_documents(documents, targets);
        if !confirm {
            plan.pending.clear();
        }
        plan.exit = true;
        plan
    }

    /// Turns the plan into a quit: remaining documents join the targets and,
    /// when `confirm` is set, their modified ones are asked about after the
    /// questions already queued.
    pub fn extend_to_exit(&mut self, documents: &DocumentSet, confirm: bool) {
        if self.cancelled {
            *self = Self::for_exit(documents, confirm);
            return;
        }
        for document in documents.iter() {
            let id = document.id();
            if self.targets.contains(&id) {
                continue;
            }
            self.targets.push(id);
            if confirm && document.is_modified() {
                self.pending.push_back(id);
            }
        }
        self.exit = true;
    }

    /// Document whose answer is needed next, if any.
    pub fn next_question(&self) -> Option<DocumentId> {
        if self.cancelled {
            None
        } else {
            self.pending.front().copied()
        }
    }

    /// Records the answer for the document returned by [`ClosePlan::next_question`].
    ///
    /// `Save` must only be passed once the document was actually saved.
    pub fn resolve(&mut self, decision: CloseDecision) {
        match decision {
            CloseDecision::Save | CloseDecision::Discard => {
                self.pending.pop_front();
            }
            CloseDecision::Cancel => {
                self.pending.clear();
                self.cancelled = true;
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// True once every question was answered without a cancel.
    pub fn is_ready(&self) -> bool {
        !self.cancelled && self.pending.is_empty()
    }

    pub fn targets(&self) -> &[DocumentId] {
        &self.targets
    }

    pub fn exits(&self) -> bool {
        self.exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(modified: &[bool]) -> (DocumentSet, Vec<DocumentId>) {
        let mut documents = DocumentSet::new();
        let ids = modified
            .iter()
            .map(|&dirty| {
                let id = documents.create_document();
                if let Some(document) = documents.document_mut(id) {
                    document.set_modified(dirty);
                }
                id
            })
            .collect();
        (documents, ids)
    }

    #[test]
    fn clean_document_closes_without_questions() {
        let (documents, ids) = set_with(&[false]);
        let plan = ClosePlan::for_documents(&documents, vec![ids[0]]);
        assert_eq!(plan.next_question(), None);
        assert!(plan.is_ready());
        assert!(!plan.exits());
    }

    #[test]
    fn exit_asks_about_each_modified_document_in_order() {
        let (documents, ids) = set_with(&[true, false, true]);
        let mut plan = ClosePlan::for_exit(&documents, true);
        assert_eq!(plan.targets(), ids.as_slice());

        assert_eq!(plan.next_question(), Some(ids[0]));
        plan.resolve(CloseDecision::Discard);
        assert_eq!(plan.next_question(), Some(ids[2]));
        plan.resolve(CloseDecision::Save);
        assert!(plan.is_ready());
        assert!(plan.exits());
    }

    #[test]
    fn cancel_aborts_the_whole_plan() {
        let (documents, _) = set_with(&[true, true]);
        let mut plan = ClosePlan::for_exit(&documents, true);
        plan.resolve(CloseDecision::Discard);
        plan.resolve(CloseDecision::Cancel);
        assert!(plan.is_cancelled());
        assert!(!plan.is_ready());
        assert_eq!(plan.next_question(), None);
    }

    #[test]
    fn closing_a_tab_can_turn_into_exit() {
        let (documents, ids) = set_with(&[true, true, false]);
        let mut plan = ClosePlan::for_documents(&documents, vec![ids[1]]);
        assert!(!plan.exits());

        plan.extend_to_exit(&documents, true);
        assert!(plan.exits());
        assert_eq!(plan.targets(), &[ids[1], ids[0], ids[2]]);
        assert_eq!(plan.next_question(), Some(ids[1]));
        plan.resolve(CloseDecision::Discard);
        assert_eq!(plan.next_question(), Some(ids[0]));
        plan.resolve(CloseDecision::Save);
        assert!(plan.is_ready());
    }

    #[test]
    fn exit_after_cancelled_close_starts_over() {
        let (documents, ids) = set_with(&[true]);
        let mut plan = ClosePlan::for_documents(&documents, vec![ids[0]]);
        plan.resolve(CloseDecision::Cancel);

        plan.extend_to_exit(&documents, true);
        assert!(!plan.is_cancelled());
        assert!(plan.exits());
        assert_eq!(plan.next_question(), Some(ids[0]));
    }

    #[test]
    fn exit_without_confirmation_skips_questions() {
        let (documents, _) = set_with(&[true]);
        let plan = ClosePlan::for_exit(&documents, false);
        assert!(plan.is_ready());
        assert_eq!(plan.targets().len(), 1);
    }
}
