use crate::{
    collision::contact::CollisionSet,
    core::{registry::BodyRegistry, types::BodyKind},
    utils::allocator::BodyHandle,
};

/// Orders dynamic bodies for positional correction.
///
/// Bodies touching static geometry come first, then bodies reached through
/// their collisions, then everything else. Within each group the body with the
/// most static contacts, then the most contacts overall, goes first.
#[derive(Debug, Default, Clone)]
pub struct RepositionScheduler {
    sorted: Vec<BodyHandle>,
    order: Vec<BodyHandle>,
}

impl RepositionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last computed order.
    pub fn order(&self) -> &[BodyHandle] {
        &self.order
    }

    pub fn schedule(&mut self, registry: &mut BodyRegistry, collisions: &CollisionSet) -> &[BodyHandle] {
        self.sorted.clear();
        self.sorted
            .extend_from_slice(registry.of_kind(BodyKind::Dynamic));
        for &handle in &self.sorted {
            if let Some(body) = registry.get_mut(handle) {
                body.scheduled = false;
            }
        }

        // Stable, so equal keys keep registration order.
        self.sorted.sort_by_key(|handle| {
            registry
                .get(*handle)
                .map(|b| (b.static_collision_count, b.collisions.len()))
                .unwrap_or((0, 0))
        });

        self.order.clear();
        let mut cursor = self.sorted.len();
        while cursor > 0 {
            let handle = self.sorted[cursor - 1];
            let anchored = registry
                .get(handle)
                .map(|b| b.static_collision_count > 0)
                .unwrap_or(false);
            if !anchored {
                break;
            }
            Self::enqueue(registry, &mut self.order, handle);
            cursor -= 1;
        }

        let mut index = 0;
        while index < self.order.len() {
            let current = self.order[index];
            let neighbours: Vec<BodyHandle> = registry
                .get(current)
                .map(|body| {
                    body.collisions
                        .iter()
                        .filter_map(|h| collisions.get(*h))
                        .map(|c| c.other(current))
                        .collect()
                })
                .unwrap_or_default();
            for neighbour in neighbours {
                Self::enqueue(registry, &mut self.order, neighbour);
            }
            index += 1;
        }

        for &handle in self.sorted[..cursor].iter().rev() {
            Self::enqueue(registry, &mut self.order, handle);
        }

        &self.order
    }

    /// Appends a dynamic body that is not scheduled yet.
    fn enqueue(registry: &mut BodyRegistry, order: &mut Vec<BodyHandle>, handle: BodyHandle) {
        if let Some(body) = registry.get_mut(handle) {
            if body.kind == BodyKind::Dynamic && !body.scheduled {
                body.scheduled = true;
                order.push(handle);
            }
        }
    }
}
