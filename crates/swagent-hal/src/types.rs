//! Type-safe hardware object handles.
//!
//! The hardware layer hands out opaque integer handles for packet buffers,
//! counters, queue gports and ports. Wrapping them in distinct types keeps a
//! counter handle from ever being passed where a gport is expected.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

/// Raw hardware handle type.
pub type RawHwHandle = u64;

/// Marker trait for hardware object kinds.
pub trait HwObjectKind: Send + Sync + 'static {
    /// Returns the object kind name for debugging.
    fn type_name() -> &'static str;
}

/// A type-safe hardware handle.
///
/// # Examples
///
/// ```
/// use swagent_hal::{CounterHandle, Gport};
///
/// let counter = CounterHandle::from_raw(7).unwrap();
/// let gport = Gport::from_raw(0x2400_0008).unwrap();
///
/// // Different handle types do not mix:
/// // fn takes_counter(c: CounterHandle) {}
/// // takes_counter(gport);  // Error: expected CounterHandle, found Gport
/// # let _ = (counter, gport);
/// ```
#[derive(Clone, Copy)]
pub struct HwObjectId<T: HwObjectKind> {
    raw: RawHwHandle,
    _marker: PhantomData<T>,
}

impl<T: HwObjectKind> HwObjectId<T> {
    /// The null handle.
    pub const NULL: Self = Self {
        raw: 0,
        _marker: PhantomData,
    };

    /// Creates a handle from a raw value.
    ///
    /// Returns `None` if the raw value is 0 (null handle).
    pub fn from_raw(raw: RawHwHandle) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Self {
                raw,
                _marker: PhantomData,
            })
        }
    }

    /// Creates a handle from a raw value, including null.
    pub const fn from_raw_unchecked(raw: RawHwHandle) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the raw handle value.
    pub const fn as_raw(&self) -> RawHwHandle {
        self.raw
    }

    /// Returns true if this is a null handle.
    pub const fn is_null(&self) -> bool {
        self.raw == 0
    }
}

impl<T: HwObjectKind> fmt::Debug for HwObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#x})", T::type_name(), self.raw)
    }
}

impl<T: HwObjectKind> fmt::Display for HwObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.raw)
    }
}

impl<T: HwObjectKind> PartialEq for HwObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: HwObjectKind> Eq for HwObjectId<T> {}

impl<T: HwObjectKind> PartialOrd for HwObjectId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: HwObjectKind> Ord for HwObjectId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T: HwObjectKind> Hash for HwObjectId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: HwObjectKind> Default for HwObjectId<T> {
    fn default() -> Self {
        Self::NULL
    }
}

macro_rules! define_object_kind {
    ($name:ident, $type_name:literal, $alias:ident) => {
        #[doc = concat!("Marker type for ", $type_name, " handles.")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl HwObjectKind for $name {
            fn type_name() -> &'static str {
                $type_name
            }
        }

        #[doc = concat!("Handle to a hardware ", $type_name, ".")]
        pub type $alias = HwObjectId<$name>;
    };
}

define_object_kind!(BufferKind, "PacketBuffer", BufferHandle);
define_object_kind!(CounterKind, "Counter", CounterHandle);
define_object_kind!(GportKind, "Gport", Gport);
define_object_kind!(PortKind, "Port", PortHandle);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_creation() {
        let counter = CounterHandle::from_raw(7).unwrap();
        assert_eq!(counter.as_raw(), 7);
        assert!(!counter.is_null());
    }

    #[test]
    fn test_null_handle() {
        assert!(CounterHandle::from_raw(0).is_none());
        assert!(CounterHandle::NULL.is_null());
        assert_eq!(Gport::default(), Gport::NULL);
    }

    #[test]
    fn test_handle_debug() {
        let gport = Gport::from_raw(0x2400_0008).unwrap();
        assert_eq!(format!("{:?}", gport), "Gport(0x24000008)");
        assert_eq!(format!("{}", gport), "0x24000008");
    }

    #[test]
    fn test_handle_ordering() {
        let a = CounterHandle::from_raw(3).unwrap();
        let b = CounterHandle::from_raw(9).unwrap();
        assert!(a < b);
        assert_ne!(a, b);
    }
}
