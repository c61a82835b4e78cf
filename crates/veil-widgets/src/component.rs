#![forbid(unsafe_code)]

//! Shared component plumbing: naming conventions and the per-element
//! instance table.
//!
//! # Invariants
//!
//! - At most one instance of a component type is bound to an element.
//! - Serials strictly increase, so a handle created for a disposed
//!   instance never matches a later instance on the same element.
//!
//! # Failure Modes
//!
//! - `get()` / `get_mut()` for an unbound element, or with a stale serial,
//!   return `None` (no panic).

use ahash::AHashMap;
use veil_core::ElementId;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Naming and defaults shared by every component type.
pub trait Component {
    /// Short name, e.g. `"modal"`.
    const NAME: &'static str;
    /// Key under which instances are stored, e.g. `"bs.modal"`.
    const DATA_KEY: &'static str;
    /// Suffix for event names, e.g. `".bs.modal"`.
    const EVENT_KEY: &'static str;

    type Options;

    fn default_options() -> Self::Options;

    /// Namespaced event name: `event_name("show")` → `"show.bs.modal"`.
    fn event_name(phase: &str) -> String {
        format!("{phase}{}", Self::EVENT_KEY)
    }
}

/// Generation number distinguishing successive instances on one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceSerial(u64);

impl InstanceSerial {
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Slot<T> {
    serial: InstanceSerial,
    value: T,
}

/// Element → instance table for one component type.
#[derive(Debug)]
pub struct ComponentData<T> {
    slots: AHashMap<ElementId, Slot<T>>,
    next_serial: u64,
}

impl<T> Default for ComponentData<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ComponentData<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: AHashMap::new(),
            next_serial: 1,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn contains(&self, element: ElementId) -> bool {
        self.slots.contains_key(&element)
    }

    /// Bind `value` to `element`, replacing any previous instance.
    pub fn insert(&mut self, element: ElementId, value: T) -> InstanceSerial {
        let serial = InstanceSerial(self.next_serial);
        self.next_serial += 1;
        self.slots.insert(element, Slot { serial, value });
        serial
    }

    /// Serial of the instance currently bound to `element`.
    #[must_use]
    pub fn serial(&self, element: ElementId) -> Option<InstanceSerial> {
        self.slots.get(&element).map(|slot| slot.serial)
    }

    /// Instance bound to `element`, if it still has `serial`.
    #[must_use]
    pub fn get(&self, element: ElementId, serial: InstanceSerial) -> Option<&T> {
        self.slots
            .get(&element)
            .filter(|slot| slot.serial == serial)
            .map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, element: ElementId, serial: InstanceSerial) -> Option<&mut T> {
        self.slots
            .get_mut(&element)
            .filter(|slot| slot.serial == serial)
            .map(|slot| &mut slot.value)
    }

    /// Unbind and return the instance on `element`.
    pub fn remove(&mut self, element: ElementId) -> Option<T> {
        self.slots.remove(&element).map(|slot| slot.value)
    }

    /// Bound elements with their serials, in element order.
    #[must_use]
    pub fn bound(&self) -> Vec<(ElementId, InstanceSerial)> {
        let mut out: Vec<_> = self
            .slots
            .iter()
            .map(|(el, slot)| (*el, slot.serial))
            .collect();
        out.sort_unstable();
        out
    }
}
