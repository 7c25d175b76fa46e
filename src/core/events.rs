use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    collision::contact::Collision,
    utils::allocator::BodyHandle,
};

/// Payload delivered to a participant of a solid collision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionInfo {
    pub other: BodyHandle,
    pub normal: Vec2,
    pub point: Vec2,
}

/// Notification addressed to the body in `body` / `trigger`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PhysicsEvent {
    CollisionEnter { body: BodyHandle, info: CollisionInfo },
    CollisionExit { body: BodyHandle, info: CollisionInfo },
    TriggerEnter { trigger: BodyHandle, other: BodyHandle },
    TriggerExit { trigger: BodyHandle, other: BodyHandle },
}

impl PhysicsEvent {
    /// Body the event is addressed to.
    pub fn recipient(&self) -> BodyHandle {
        match *self {
            PhysicsEvent::CollisionEnter { body, .. } | PhysicsEvent::CollisionExit { body, .. } => {
                body
            }
            PhysicsEvent::TriggerEnter { trigger, .. } | PhysicsEvent::TriggerExit { trigger, .. } => {
                trigger
            }
        }
    }

    pub fn is_enter(&self) -> bool {
        matches!(
            self,
            PhysicsEvent::CollisionEnter { .. } | PhysicsEvent::TriggerEnter { .. }
        )
    }
}

/// Events produced by the simulation, drained by the game layer.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<PhysicsEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the begin notifications of `collision`.
    pub fn collision_started(&mut self, collision: &Collision) {
        self.push_pair(collision, true, |_| true);
    }

    /// Queues the end notifications of `collision`.
    pub fn collision_ended(&mut self, collision: &Collision) {
        self.push_pair(collision, false, |_| true);
    }

    /// Queues end notifications for `collision` except those addressed to `removed`.
    pub fn collision_detached(&mut self, collision: &Collision, removed: BodyHandle) {
        self.push_pair(collision, false, |recipient| recipient != removed);
    }

    fn push_pair<F>(&mut self, collision: &Collision, enter: bool, mut deliver: F)
    where
        F: FnMut(BodyHandle) -> bool,
    {
        if collision.is_trigger {
            if deliver(collision.b) {
                let (trigger, other) = (collision.b, collision.a);
                self.events.push(if enter {
                    PhysicsEvent::TriggerEnter { trigger, other }
                } else {
                    PhysicsEvent::TriggerExit { trigger, other }
                });
            }
            return;
        }

        for (body, other) in [(collision.a, collision.b), (collision.b, collision.a)] {
            if !deliver(body) {
                continue;
            }
            let info = CollisionInfo {
                other,
                normal: collision.normal,
                point: collision.point,
            };
            self.events.push(if enter {
                PhysicsEvent::CollisionEnter { body, info }
            } else {
                PhysicsEvent::CollisionExit { body, info }
            });
        }
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, PhysicsEvent> {
        self.events.drain(..)
    }

    pub fn as_slice(&self) -> &[PhysicsEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
