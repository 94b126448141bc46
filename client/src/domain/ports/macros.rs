//! Defines the macro that generates fixed-message domain port error enums.

/// Declare a port error enum whose variants each carry one fixed message.
///
/// Every variant gets a `const` snake-case constructor, so adapters can hold
/// errors in `const` tables and tests can compare them by value.
macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant,
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = concat!("Construct the `", stringify!($variant), "` variant.")]
                    #[must_use]
                    pub const fn [<$variant:snake>]() -> Self {
                        Self::$variant
                    }
                }
            )*
        }
    };
}

pub(crate) use define_port_error;
