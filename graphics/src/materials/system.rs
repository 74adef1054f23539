//! Shared material system: descriptor interning and material id allocation.
//!
//! One [`MaterialSystem`] is owned per scene (or per test) and handed to
//! every [`Material`](super::Material) at construction. Materials with
//! byte-identical descriptors share one reference-counted [`DescriptorId`];
//! ids grow monotonically and are never reused, even after an entry is
//! erased.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::materials::data::PackedMaterialDesc;

/// Interned id of a material descriptor.
///
/// Ids only ever grow; an erased id never comes back for a different
/// descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DescriptorId(u64);

impl DescriptorId {
    /// Raw id value.
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct InternedDescriptor {
    desc: PackedMaterialDesc,
    id: DescriptorId,
    ref_count: u32,
}

#[derive(Debug)]
struct SystemState {
    descriptors: Vec<InternedDescriptor>,
    next_descriptor_id: u64,
    next_material_id: u32,
}

/// Registry shared by all materials of a scene.
///
/// Interior mutability behind a mutex so materials can intern through a
/// shared `Arc`; all operations are short and lock-free to callers.
#[derive(Debug)]
pub struct MaterialSystem {
    state: Mutex<SystemState>,
}

impl Default for MaterialSystem {
    fn default() -> Self {
        Self {
            state: Mutex::new(SystemState {
                descriptors: Vec::new(),
                next_descriptor_id: 0,
                next_material_id: 0,
            }),
        }
    }
}

impl MaterialSystem {
    /// New empty system behind an `Arc`, ready to hand to materials.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, SystemState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Intern a descriptor, returning its shared id.
    ///
    /// A structurally equal descriptor gains a reference; a new shape gets
    /// the next id with a reference count of one.
    pub fn intern(&self, desc: &PackedMaterialDesc) -> DescriptorId {
        let mut state = self.lock();
        let bytes = bytemuck::bytes_of(desc);
        for entry in &mut state.descriptors {
            if bytemuck::bytes_of(&entry.desc) == bytes {
                entry.ref_count += 1;
                return entry.id;
            }
        }
        let id = DescriptorId(state.next_descriptor_id);
        state.next_descriptor_id += 1;
        log::debug!("interned new material descriptor {}", id.value());
        state.descriptors.push(InternedDescriptor {
            desc: *desc,
            id,
            ref_count: 1,
        });
        id
    }

    /// Release one reference to an interned descriptor.
    ///
    /// The entry is erased when the last reference goes away. Releasing an
    /// unknown id is a caller contract violation.
    pub fn release(&self, id: DescriptorId) {
        let mut state = self.lock();
        let Some(index) = state.descriptors.iter().position(|e| e.id == id) else {
            debug_assert!(false, "release of unknown descriptor id {}", id.value());
            log::error!("release of unknown descriptor id {}", id.value());
            return;
        };
        state.descriptors[index].ref_count -= 1;
        if state.descriptors[index].ref_count == 0 {
            log::debug!("erasing material descriptor {}", id.value());
            state.descriptors.remove(index);
        }
    }

    /// Reference count of an interned descriptor, if it is still alive.
    pub fn ref_count(&self, id: DescriptorId) -> Option<u32> {
        self.lock()
            .descriptors
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.ref_count)
    }

    /// Copy of the descriptor behind an id, if it is still alive.
    pub fn resolve(&self, id: DescriptorId) -> Option<PackedMaterialDesc> {
        self.lock()
            .descriptors
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.desc)
    }

    /// Number of live interned descriptors.
    pub fn descriptor_count(&self) -> usize {
        self.lock().descriptors.len()
    }

    /// Allocate the next process-unique material id.
    pub fn allocate_material_id(&self) -> u32 {
        let mut state = self.lock();
        let id = state.next_material_id;
        state.next_material_id += 1;
        id
    }

    /// Reset the material id counter for deterministic session restarts.
    ///
    /// Existing materials keep their ids; only use this when all materials
    /// from the previous session are gone.
    pub fn reset_material_ids(&self) {
        self.lock().next_material_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc_with_type(layer_type: u32) -> PackedMaterialDesc {
        let mut desc = PackedMaterialDesc::default();
        desc.layers[0].layer_type = layer_type;
        desc.layer_count = 1;
        desc
    }

    #[test]
    fn interning_same_shape_shares_id() {
        let system = MaterialSystem::default();
        let desc = desc_with_type(1);

        let a = system.intern(&desc);
        let b = system.intern(&desc);
        assert_eq!(a, b);
        assert_eq!(system.ref_count(a), Some(2));

        system.release(a);
        assert_eq!(system.ref_count(a), Some(1));
        assert!(system.resolve(a).is_some());

        system.release(a);
        assert_eq!(system.ref_count(a), None);
        assert!(system.resolve(a).is_none());
        assert_eq!(system.descriptor_count(), 0);
    }

    #[test]
    fn distinct_shapes_get_distinct_ids() {
        let system = MaterialSystem::default();
        let a = system.intern(&desc_with_type(1));
        let b = system.intern(&desc_with_type(2));
        assert_ne!(a, b);
        assert_eq!(system.descriptor_count(), 2);
    }

    #[test]
    fn ids_never_come_back_after_erasure() {
        let system = MaterialSystem::default();
        let desc = desc_with_type(1);
        let first = system.intern(&desc);
        system.release(first);

        let second = system.intern(&desc);
        assert!(second > first);
    }

    #[test]
    fn material_ids_are_sequential_until_reset() {
        let system = MaterialSystem::default();
        assert_eq!(system.allocate_material_id(), 0);
        assert_eq!(system.allocate_material_id(), 1);
        system.reset_material_ids();
        assert_eq!(system.allocate_material_id(), 0);
    }
}
