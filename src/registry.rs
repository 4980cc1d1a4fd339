//! Bookkeeping for managed windows.
//!
//! Every managed client is wrapped in two windows we own: a frame and a
//! titlebar. Events can arrive addressed to any of the three ids, so the
//! registry keeps one owning map (client -> decoration) plus two secondary
//! indexes (frame -> client, title -> client). All mutation goes through
//! the methods here so the three maps stay in step.

use std::collections::HashMap;

use x11rb::protocol::xproto::Window;

/// The three windows that make up one managed client.
///
/// `frame` contains `title` at the top and the reparented `client` below
/// it. The ids are pairwise distinct and fixed for the lifetime of the
/// decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoration {
    pub title: Window,
    pub client: Window,
    pub frame: Window,
}

/// Consistency violations detectable by [`WindowRegistry::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryViolation {
    /// A frame index entry points at a client with no decoration.
    StaleFrameIndex(Window),
    /// A title index entry points at a client with no decoration.
    StaleTitleIndex(Window),
    /// A decoration's frame is missing from the frame index.
    MissingFrameIndex(Window),
    /// A decoration's title is missing from the title index.
    MissingTitleIndex(Window),
    /// The same id appears in more than one index.
    SharedId(Window),
}

/// The three mutually-consistent id indexes.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    clients: HashMap<Window, Decoration>,
    frames: HashMap<Window, Window>,
    titles: HashMap<Window, Window>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of managed clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains_client(&self, client: Window) -> bool {
        self.clients.contains_key(&client)
    }

    pub fn by_client(&self, client: Window) -> Option<&Decoration> {
        self.clients.get(&client)
    }

    pub fn by_frame(&self, frame: Window) -> Option<&Decoration> {
        self.frames.get(&frame).and_then(|c| self.clients.get(c))
    }

    pub fn by_title(&self, title: Window) -> Option<&Decoration> {
        self.titles.get(&title).and_then(|c| self.clients.get(c))
    }

    /// Establish all three index entries for a decoration.
    pub fn insert(&mut self, decoration: Decoration) {
        self.frames.insert(decoration.frame, decoration.client);
        self.titles.insert(decoration.title, decoration.client);
        self.clients.insert(decoration.client, decoration);
    }

    /// Remove a decoration and all three of its index entries.
    pub fn remove_by_client(&mut self, client: Window) -> Option<Decoration> {
        let decoration = self.clients.remove(&client)?;
        self.frames.remove(&decoration.frame);
        self.titles.remove(&decoration.title);
        Some(decoration)
    }

    /// Remove whichever single index contains `id`, leaving the others
    /// untouched.
    ///
    /// This is the DestroyNotify path: the server destroys the three
    /// windows one at a time and notifies us once per window, possibly
    /// after we have already dropped our own records. A decoration whose
    /// client entry is gone but whose frame/title entries linger is
    /// "torn"; the remaining entries are reaped by the notifications for
    /// those ids.
    pub fn remove_id(&mut self, id: Window) -> bool {
        // Only the containing index; the other entries keep their spots
        // until their own destroy notifications arrive.
        if self.clients.remove(&id).is_some() {
            return true;
        }
        if self.frames.remove(&id).is_some() {
            return true;
        }
        self.titles.remove(&id).is_some()
    }

    /// Check the cross-index invariants.
    ///
    /// A clean registry returns an empty list. Torn decorations (mid
    /// destruction) show up as stale secondary entries.
    pub fn validate(&self) -> Vec<RegistryViolation> {
        let mut violations = Vec::new();

        for (&frame, client) in &self.frames {
            match self.clients.get(client) {
                Some(d) if d.frame == frame => {}
                _ => violations.push(RegistryViolation::StaleFrameIndex(frame)),
            }
        }
        for (&title, client) in &self.titles {
            match self.clients.get(client) {
                Some(d) if d.title == title => {}
                _ => violations.push(RegistryViolation::StaleTitleIndex(title)),
            }
        }
        for decoration in self.clients.values() {
            if self.frames.get(&decoration.frame) != Some(&decoration.client) {
                violations.push(RegistryViolation::MissingFrameIndex(decoration.frame));
            }
            if self.titles.get(&decoration.title) != Some(&decoration.client) {
                violations.push(RegistryViolation::MissingTitleIndex(decoration.title));
            }
            for id in [decoration.title, decoration.client, decoration.frame] {
                let in_clients = self.clients.contains_key(&id);
                let in_frames = self.frames.contains_key(&id);
                let in_titles = self.titles.contains_key(&id);
                if [in_clients, in_frames, in_titles].iter().filter(|&&b| b).count() > 1 {
                    violations.push(RegistryViolation::SharedId(id));
                }
            }
        }

        violations
    }

    /// Iterate over all decorations.
    pub fn decorations(&self) -> impl Iterator<Item = &Decoration> {
        self.clients.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoration(n: Window) -> Decoration {
        Decoration {
            title: n,
            client: n + 1,
            frame: n + 2,
        }
    }

    #[test]
    fn test_insert_establishes_all_three_lookups() {
        let mut registry = WindowRegistry::new();
        let d = decoration(10);
        registry.insert(d);

        assert_eq!(registry.by_client(11), Some(&d));
        assert_eq!(registry.by_frame(12), Some(&d));
        assert_eq!(registry.by_title(10), Some(&d));
        assert_eq!(registry.len(), 1);
        assert!(registry.validate().is_empty());
    }

    #[test]
    fn test_lookup_misses_return_none() {
        let mut registry = WindowRegistry::new();
        registry.insert(decoration(10));

        assert!(registry.by_client(10).is_none()); // that's the title id
        assert!(registry.by_frame(11).is_none());
        assert!(registry.by_title(12).is_none());
        assert!(registry.by_client(99).is_none());
    }

    #[test]
    fn test_remove_by_client_clears_all_indexes() {
        let mut registry = WindowRegistry::new();
        let d = decoration(10);
        registry.insert(d);

        assert_eq!(registry.remove_by_client(11), Some(d));
        assert!(registry.by_client(11).is_none());
        assert!(registry.by_frame(12).is_none());
        assert!(registry.by_title(10).is_none());
        assert!(registry.is_empty());
        assert!(registry.validate().is_empty());
    }

    #[test]
    fn test_remove_by_client_is_complete_for_the_right_triple_only() {
        let mut registry = WindowRegistry::new();
        registry.insert(decoration(10));
        registry.insert(decoration(20));

        registry.remove_by_client(11);
        assert_eq!(registry.len(), 1);
        assert!(registry.by_frame(22).is_some());
        assert!(registry.validate().is_empty());
    }

    #[test]
    fn test_remove_id_tears_one_index_at_a_time() {
        let mut registry = WindowRegistry::new();
        registry.insert(decoration(10));

        // Client destroyed first: owning entry goes, secondaries linger.
        assert!(registry.remove_id(11));
        assert!(registry.by_client(11).is_none());
        assert!(registry.by_frame(12).is_none()); // dangling -> no decoration
        assert!(!registry.validate().is_empty());

        // Frame and title notifications reap the rest.
        assert!(registry.remove_id(12));
        assert!(registry.remove_id(10));
        assert!(registry.validate().is_empty());
        assert!(!registry.remove_id(11));
    }

    #[test]
    fn test_remove_id_unknown_window_is_noop() {
        let mut registry = WindowRegistry::new();
        registry.insert(decoration(10));

        assert!(!registry.remove_id(999));
        assert_eq!(registry.len(), 1);
        assert!(registry.validate().is_empty());
    }

    #[test]
    fn test_index_counts_stay_equal() {
        let mut registry = WindowRegistry::new();
        for n in (0..50).step_by(10) {
            registry.insert(decoration(100 + n));
        }
        registry.remove_by_client(121);
        registry.remove_by_client(141);

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.decorations().count(), 3);
        assert!(registry.validate().is_empty());
    }

    #[test]
    fn test_reinsert_same_client_is_stable() {
        let mut registry = WindowRegistry::new();
        let d = decoration(10);
        registry.insert(d);
        registry.insert(d);

        assert_eq!(registry.len(), 1);
        assert!(registry.validate().is_empty());
    }
}
