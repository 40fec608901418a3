//! Macros for defining thin newtypes over plain numbers.

/// Conversions and read-only access for a newtype with a single `inner` field.
#[macro_export]
macro_rules! impl_basic {
    ($name: ident, $type: ty) => {
        impl core::convert::From<$type> for $name {
            fn from(value: $type) -> Self {
                $name { inner: value }
            }
        }
        impl core::convert::From<$name> for $type {
            fn from(value: $name) -> $type {
                value.inner
            }
        }

        impl core::ops::Deref for $name {
            type Target = $type;

            fn deref(&self) -> &Self::Target {
                &self.inner
            }
        }

        impl $name {
            pub const fn from_const(value: $type) -> Self {
                $name { inner: value }
            }
            pub const fn into_const(self) -> $type {
                self.inner
            }
        }
    };
}

/// Defines a copyable identifier newtype that prints as `<prefix><number>`.
///
/// ```ignore
/// define_id!(SlotId, usize, "slot ");
/// assert_eq!(format!("{}", SlotId::from(0)), "slot 0");
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta: meta])* $name: ident, $type: ty, $prefix: literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name {
            inner: $type,
        }

        $crate::impl_basic!($name, $type);

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_fmt(format_args!(concat!($prefix, "{}"), self.inner))
            }
        }
    };
}
