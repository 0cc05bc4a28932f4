//! Undo log backing frame rollback.
use alloy_primitives::{Address, B256, U256};

/// A single reversible state change.
#[derive(Debug)]
pub(crate) enum JournalEntry {
    /// A slot was written. `previous` is `None` if the slot was never set.
    StorageChanged { address: Address, key: U256, previous: Option<B256> },
    /// Code was installed at a fresh address.
    AccountCreated { address: Address },
}

/// Position in the journal and log list to roll back to.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Checkpoint {
    pub(crate) journal_len: usize,
    pub(crate) logs_len: usize,
}

/// Ordered record of state changes since the outermost open checkpoint.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn push(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Forgets every entry. Called once nothing can roll them back.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Removes and yields entries newer than `len`, most recent first.
    pub(crate) fn unwind(
        &mut self,
        len: usize,
    ) -> impl Iterator<Item = JournalEntry> + '_ {
        let len = len.min(self.entries.len());
        self.entries.drain(len..).rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwind_yields_newest_first() {
        let mut journal = Journal::default();
        for key in 0..3u64 {
            journal.push(JournalEntry::StorageChanged {
                address: Address::ZERO,
                key: U256::from(key),
                previous: None,
            });
        }

        let keys: Vec<U256> = journal
            .unwind(1)
            .map(|entry| match entry {
                JournalEntry::StorageChanged { key, .. } => key,
                JournalEntry::AccountCreated { .. } => unreachable!(),
            })
            .collect();

        assert_eq!(keys, vec![U256::from(2), U256::from(1)]);
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn clear_drops_everything() {
        let mut journal = Journal::default();
        journal.push(JournalEntry::AccountCreated { address: Address::ZERO });
        journal.clear();
        assert_eq!(journal.len(), 0);
        assert_eq!(journal.unwind(0).count(), 0);
    }

    #[test]
    fn unwind_past_end_is_noop() {
        let mut journal = Journal::default();
        journal.push(JournalEntry::AccountCreated { address: Address::ZERO });
        assert_eq!(journal.unwind(5).count(), 0);
        assert_eq!(journal.len(), 1);
    }
}
