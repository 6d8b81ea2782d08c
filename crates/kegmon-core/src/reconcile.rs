// ── List reconciliation ──
//
// Folds a fresh device representation into a caller-owned collection by
// id. Matching entries are overwritten in place; unknown ids are ignored.
// Creating a device is the caller's job (append it to the collection).

use serde::Serialize;
use tracing::trace;

use crate::model::Device;

/// Anything that holds a device inside a reconcilable collection.
pub trait DeviceSlot {
    fn device(&self) -> &Device;
    fn device_mut(&mut self) -> &mut Device;
}

impl DeviceSlot for Device {
    fn device(&self) -> &Device {
        self
    }

    fn device_mut(&mut self) -> &mut Device {
        self
    }
}

/// A device plus front-end state that reconciliation must not touch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceEntry {
    pub device: Device,
    /// Set while a command for this device is outstanding.
    pub processing: bool,
}

impl DeviceEntry {
    pub fn new(device: Device) -> Self {
        Self {
            device,
            processing: false,
        }
    }
}

impl From<Device> for DeviceEntry {
    fn from(device: Device) -> Self {
        Self::new(device)
    }
}

impl DeviceSlot for DeviceEntry {
    fn device(&self) -> &Device {
        &self.device
    }

    fn device_mut(&mut self) -> &mut Device {
        &mut self.device
    }
}

/// Replace the entry whose id matches `updated.id`.
///
/// Returns `false` (and leaves `collection` untouched) when no entry
/// matches. Length, order, and slot-local state are always preserved.
pub fn reconcile<E: DeviceSlot>(collection: &mut [E], updated: &Device) -> bool {
    match collection
        .iter_mut()
        .find(|entry| entry.device().id == updated.id)
    {
        Some(entry) => {
            entry.device_mut().replace_from(updated);
            true
        }
        None => {
            trace!(device = %updated.id, "no entry to reconcile");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::device::fixtures::device;

    #[test]
    fn matching_entry_is_replaced_in_place() {
        let mut list = vec![device("a", 1), device("b", 1), device("c", 1)];
        let mut fresh = device("b", 99);
        fresh.name = "Stout".into();

        assert!(reconcile(&mut list, &fresh));
        assert_eq!(list.len(), 3);
        assert_eq!(list[1], fresh);
        assert_eq!(list[0].id, "a");
        assert_eq!(list[2].id, "c");
    }

    #[test]
    fn unknown_id_is_not_inserted() {
        let mut list = vec![device("a", 1), device("b", 2)];
        let before = list.clone();

        assert!(!reconcile(&mut list, &device("z", 10)));
        assert_eq!(list, before);
    }

    #[test]
    fn empty_collection_stays_empty() {
        let mut list: Vec<Device> = Vec::new();
        assert!(!reconcile(&mut list, &device("a", 1)));
        assert!(list.is_empty());
    }

    #[test]
    fn entry_wrapper_keeps_processing_flag() {
        let mut list: Vec<DeviceEntry> = vec![device("a", 1).into(), device("b", 1).into()];
        list[0].processing = true;

        assert!(reconcile(&mut list, &device("a", 99)));
        assert!(list[0].processing);
        assert_eq!(list[0].device.state_code, 99);
        assert!(!list[1].processing);
    }
}
