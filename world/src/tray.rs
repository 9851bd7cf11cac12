//! Fixed set of slots holding the shapes offered to the player.

use marble_smash_core::{ShapeInstance, SlotId, QUEUE_CAPACITY};

/// Queue slots filled by the spawn director and emptied by placements.
#[derive(Clone, Debug, Default)]
pub(crate) struct ShapeTray {
    slots: [Option<ShapeInstance>; QUEUE_CAPACITY],
}

impl ShapeTray {
    /// Stores the shape in the first empty slot.
    pub(crate) fn offer(&mut self, shape: ShapeInstance) -> Option<SlotId> {
        let index = self.slots.iter().position(Option::is_none)?;
        self.slots[index] = Some(shape);
        Some(SlotId::new(index as u8))
    }

    /// Shape held by the slot, if any.
    pub(crate) fn get(&self, slot: SlotId) -> Option<&ShapeInstance> {
        self.slots.get(usize::from(slot.get()))?.as_ref()
    }

    /// Removes and returns the shape held by the slot.
    pub(crate) fn take(&mut self, slot: SlotId) -> Option<ShapeInstance> {
        self.slots.get_mut(usize::from(slot.get()))?.take()
    }

    /// Empties every slot, returning the discarded shapes in slot order.
    pub(crate) fn clear(&mut self) -> Vec<ShapeInstance> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }

    /// Reports whether every slot is empty.
    pub(crate) fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Occupied slots in slot order.
    pub(crate) fn queued(&self) -> impl Iterator<Item = (SlotId, &ShapeInstance)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|shape| (SlotId::new(index as u8), shape)))
    }
}
