/// Declares a transparent newtype over a primitive handle or code.
///
/// The `Debug` output uses the given format string on the inner value.
#[macro_export]
macro_rules! custom_type {
    ($(#[$meta:meta])* $name:ident, $target:ty, $fmt:literal) => {
        $(#[$meta])*
        #[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name($target);

        impl $name {
            pub const fn new(raw: $target) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> $target {
                self.0
            }
        }

        impl From<$target> for $name {
            fn from(value: $target) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $target {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, $fmt, self.0)
            }
        }
    };
    ($(#[$meta:meta])* $name:ident, $target:ty) => {
        $crate::custom_type!($(#[$meta])* $name, $target, "{:?}");
    };
}
