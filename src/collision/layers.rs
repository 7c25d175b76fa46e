use serde::{Deserialize, Serialize};

use crate::config::LAYER_COUNT;
use crate::error::{PhysicsError, Result};

/// Symmetric 32x32 matrix of layer pairs allowed to collide, one bitmask per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMatrix {
    masks: [u32; LAYER_COUNT],
}

impl Default for LayerMatrix {
    fn default() -> Self {
        Self {
            masks: [u32::MAX; LAYER_COUNT],
        }
    }
}

impl LayerMatrix {
    pub fn validate_layer(layer: u8) -> Result<()> {
        if (layer as usize) < LAYER_COUNT {
            Ok(())
        } else {
            Err(PhysicsError::InvalidLayer(layer))
        }
    }

    pub fn set(&mut self, layer_a: u8, layer_b: u8, allowed: bool) -> Result<()> {
        Self::validate_layer(layer_a)?;
        Self::validate_layer(layer_b)?;
        let (a, b) = (layer_a as usize, layer_b as usize);
        if allowed {
            self.masks[a] |= 1 << b;
            self.masks[b] |= 1 << a;
        } else {
            self.masks[a] &= !(1 << b);
            self.masks[b] &= !(1 << a);
        }
        Ok(())
    }

    /// Whether the pair may collide.
    pub fn collides(&self, layer_a: u8, layer_b: u8) -> Result<bool> {
        Self::validate_layer(layer_a)?;
        Self::validate_layer(layer_b)?;
        Ok(self.allows(layer_a, layer_b))
    }

    /// Unchecked lookup; both layers must be below 32.
    #[inline]
    pub(crate) fn allows(&self, layer_a: u8, layer_b: u8) -> bool {
        self.masks[layer_a as usize] & (1 << layer_b) != 0
    }

    pub fn mask(&self, layer: u8) -> Option<u32> {
        self.masks.get(layer as usize).copied()
    }
}
