use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Slot index plus generation; a removed slot bumps its generation so that
/// handles issued before the removal stop resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct GenerationalId {
    pub index: usize,
    pub generation: u32,
}

impl GenerationalId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const NULL: Self = Self {
        index: usize::MAX,
        generation: 0,
    };
}

impl Default for GenerationalId {
    fn default() -> Self {
        Self::NULL
    }
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord,
        )]
        pub struct $name(pub GenerationalId);

        impl $name {
            pub fn index(&self) -> usize {
                self.0.index
            }

            pub fn generation(&self) -> u32 {
                self.0.generation
            }

            pub fn is_null(&self) -> bool {
                self.0.index == usize::MAX
            }
        }

        impl From<GenerationalId> for $name {
            fn from(id: GenerationalId) -> Self {
                Self(id)
            }
        }

        impl From<$name> for GenerationalId {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }
    };
}

define_handle!(
    /// Handle of a body registered in a [`crate::PhysicsWorld`].
    BodyHandle
);

define_handle!(
    /// Handle of a live collision between two bodies.
    CollisionHandle
);

/// Generational arena that hands out stable handles while preventing use-after-free.
///
/// `H` is the typed handle the arena issues, so body and collision handles
/// cannot be mixed up.
#[derive(Debug, Clone)]
pub struct Arena<H, T> {
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: VecDeque<usize>,
    live: usize,
    _handle: std::marker::PhantomData<H>,
}

impl<H, T> Default for Arena<H, T>
where
    H: Copy + From<GenerationalId> + Into<GenerationalId>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<H, T> Arena<H, T>
where
    H: Copy + From<GenerationalId> + Into<GenerationalId>,
{
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: VecDeque::new(),
            live: 0,
            _handle: std::marker::PhantomData,
        }
    }

    pub fn insert(&mut self, item: T) -> H {
        self.live += 1;
        if let Some(index) = self.free_list.pop_front() {
            let generation = self.generations[index];
            self.items[index] = Some(item);
            return GenerationalId::new(index, generation).into();
        }

        let index = self.items.len();
        self.items.push(Some(item));
        self.generations.push(0);
        GenerationalId::new(index, 0).into()
    }

    pub fn get(&self, handle: H) -> Option<&T> {
        let id: GenerationalId = handle.into();
        if self.is_valid(id) {
            self.items.get(id.index).and_then(|slot| slot.as_ref())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        let id: GenerationalId = handle.into();
        if self.is_valid(id) {
            self.items.get_mut(id.index).and_then(|slot| slot.as_mut())
        } else {
            None
        }
    }

    pub fn get2_mut(&mut self, handle_a: H, handle_b: H) -> Option<(&mut T, &mut T)> {
        let id_a: GenerationalId = handle_a.into();
        let id_b: GenerationalId = handle_b.into();
        if id_a.index == id_b.index {
            return None;
        }

        if !self.is_valid(id_a) || !self.is_valid(id_b) {
            return None;
        }

        let (first, second, flipped) = if id_a.index < id_b.index {
            (id_a, id_b, false)
        } else {
            (id_b, id_a, true)
        };

        let (left, right) = self.items.split_at_mut(second.index);
        let first_slot = left.get_mut(first.index).and_then(|slot| slot.as_mut())?;
        let second_slot = right.get_mut(0).and_then(|slot| slot.as_mut())?;

        if flipped {
            Some((second_slot, first_slot))
        } else {
            Some((first_slot, second_slot))
        }
    }

    pub fn remove(&mut self, handle: H) -> Option<T> {
        let id: GenerationalId = handle.into();
        if !self.is_valid(id) {
            return None;
        }
        let slot = self.items.get_mut(id.index)?;
        let item = slot.take()?;
        self.generations[id.index] = self.generations[id.index].wrapping_add(1);
        self.free_list.push_back(id.index);
        self.live -= 1;
        Some(item)
    }

    pub fn contains(&self, handle: H) -> bool {
        self.get(handle).is_some()
    }

    pub fn clear(&mut self) {
        for (index, slot) in self.items.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.generations[index] = self.generations[index].wrapping_add(1);
                self.free_list.push_back(index);
            }
        }
        self.live = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> + '_ {
        self.items.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|item| (GenerationalId::new(index, self.generations[index]).into(), item))
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.items.iter_mut().filter_map(|slot| slot.as_mut())
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn is_valid(&self, id: GenerationalId) -> bool {
        self.generations
            .get(id.index)
            .copied()
            .map(|gen| gen == id.generation)
            .unwrap_or(false)
            && self
                .items
                .get(id.index)
                .map(|slot| slot.is_some())
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_handle_is_rejected_after_slot_reuse() {
        let mut arena: Arena<BodyHandle, &str> = Arena::new();
        let first = arena.insert("a");
        assert_eq!(arena.remove(first), Some("a"));

        let second = arena.insert("b");
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn get2_mut_returns_handles_in_argument_order() {
        let mut arena: Arena<CollisionHandle, i32> = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);

        let (second, first) = arena.get2_mut(b, a).expect("both handles are live");
        assert_eq!((*first, *second), (1, 2));
        assert!(arena.get2_mut(a, a).is_none());
    }

    #[test]
    fn default_handle_is_null() {
        assert!(BodyHandle::default().is_null());
    }
}
