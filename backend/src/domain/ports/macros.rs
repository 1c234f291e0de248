//! `define_port_error!`: the error enum every port in this crate returns.
//!
//! A declaration such as
//!
//! ```ignore
//! define_port_error! {
//!     pub enum EventBusError {
//!         Closed => "event bus is closed",
//!         Publish { subject: String, message: String } => "publish to {subject} failed: {message}",
//!     }
//! }
//! ```
//!
//! expands to a `Clone + PartialEq` `thiserror` enum plus `EventBusError::closed()`
//! and `EventBusError::publish(subject, message)`. Constructor arguments take
//! `impl Into<T>`, so adapters can pass `&str` or a driver error's `to_string()`.

macro_rules! define_port_error {
    // Unit variant: argumentless constructor.
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    // Fields are consumed one at a time, accumulating parameters and initialisers.
    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

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
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SamplePortError {
            Offline => "backend offline",
            Rejected { subject: String } => "rejected on {subject}",
            Throttled { subject: String, retry_after: u32 } => "throttled on {subject} for {retry_after}s",
        }
    }

    #[test]
    fn unit_variants_get_argumentless_constructors() {
        assert_eq!(SamplePortError::offline(), SamplePortError::Offline);
        assert_eq!(SamplePortError::offline().to_string(), "backend offline");
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = SamplePortError::rejected("application.created");
        assert_eq!(err.to_string(), "rejected on application.created");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = SamplePortError::throttled("application.created", 5_u32);
        assert_eq!(err.to_string(), "throttled on application.created for 5s");
    }
}
