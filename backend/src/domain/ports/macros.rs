//! `define_port_error!`, the error enum builder shared by every port.
//!
//! Each variant carries a `thiserror` message and gets a snake-case
//! constructor whose fields accept anything convertible into the declared
//! type, so adapters can write `OutboundQueueError::query(err.to_string())`
//! or `ChatTransportError::rejected(403_u16, "bot was blocked by the user")`.
//!
//! ```ignore
//! define_port_error! {
//!     /// Errors surfaced by outbound queue adapters.
//!     pub enum OutboundQueueError {
//!         /// A stored envelope could not be decoded.
//!         Poisoned { id: i64, message: String } =>
//!             "outbound message {id} could not be decoded: {message}",
//!     }
//! }
//!
//! let error = OutboundQueueError::poisoned(7_i64, "missing payload");
//! ```

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $(#[doc = concat!("`", stringify!($field), "` detail.")] $field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@constructor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };

    (@constructor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("`", stringify!($variant), "` error.")]
            #[must_use]
            pub const fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@fields $variant [] [] $( $field : $ty, )*);
    };

    // Accumulates `impl Into<T>` parameters and `.into()` initialisers.
    (@fields $variant:ident [$($params:tt)*] [$($inits:tt)*] $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @fields
            $variant
            [$($params)* $field: impl Into<$ty>,]
            [$($inits)* $field: $field.into(),]
            $($rest)*
        );
    };

    (@fields $variant:ident [$($params:tt)*] [$($inits:tt)*]) => {
        ::paste::paste! {
            #[doc = concat!("`", stringify!($variant), "` error from its fields.")]
            #[must_use]
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };
}

pub(crate) use define_port_error;
