use std::fmt;

/// 註冊監聽器後取得的識別碼，用於之後移除。 / Handle returned on registration, used to remove the listener later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// 取得原始數值。 / Returns the raw numeric value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// 依註冊順序保存監聽器的集合。 / Ordered collection of listeners keyed by [`ListenerId`].
///
/// `H` is the handle type stored per listener, typically `Box<dyn Trait>` for
/// exclusively owned listeners or `Rc<dyn Trait>` for shared ones.
pub struct ListenerRegistry<H> {
    next_id: u64,
    entries: Vec<(ListenerId, H)>,
}

impl<H> ListenerRegistry<H> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// 加入監聽器並回傳其識別碼。 / Adds a listener and returns its handle.
    pub fn add(&mut self, listener: H) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// 移除指定監聽器；若不存在則回傳 `None`。 / Removes the listener, returning it if it was registered.
    pub fn remove(&mut self, id: ListenerId) -> Option<H> {
        let index = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &H> {
        self.entries.iter().map(|(_, listener)| listener)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut H> {
        self.entries.iter_mut().map(|(_, listener)| listener)
    }
}

impl<H: Clone> ListenerRegistry<H> {
    /// 複製目前的監聽器清單，讓通知期間可安全地增刪監聽器。 / Clones the current handles so listeners may (un)register while being notified.
    pub fn snapshot(&self) -> Vec<H> {
        self.entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }
}

impl<H> Default for ListenerRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for ListenerRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut registry: ListenerRegistry<&'static str> = ListenerRegistry::new();
        let first = registry.add("a");
        let second = registry.add("b");
        assert_eq!(registry.remove(first), Some("a"));
        let third = registry.add("c");
        assert_ne!(third, first);
        assert!(registry.contains(second));
        assert_eq!(registry.iter().copied().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn removing_unknown_id_is_a_no_op() {
        let mut registry: ListenerRegistry<u8> = ListenerRegistry::new();
        let id = registry.add(1);
        registry.remove(id);
        assert_eq!(registry.remove(id), None);
        assert!(registry.is_empty());
    }
}
