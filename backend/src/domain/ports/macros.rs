//! Helper macro generating port error enums with snake_case constructors.
//!
//! Every variant becomes a `thiserror` variant carrying the given message and
//! gains a constructor accepting `impl Into<T>` for each field, so callers can
//! write `PhonebookRepositoryError::query("boom")`.

macro_rules! define_port_error {
    (@constructor $variant:ident) => {
        ::paste::paste! {
            #[must_use]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[must_use]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:literal
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
                define_port_error!(@constructor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum StorageProbeError {
            Unreachable { host: String } => "cannot reach {host}",
            Timeout { millis: u64 } => "timed out after {millis}ms",
            Rejected { table: String, rows: u32 } => "{table} rejected {rows} rows",
            Closed => "connection closed",
        }
    }

    #[test]
    fn string_fields_accept_str_slices() {
        let err = StorageProbeError::unreachable("db.internal");
        assert_eq!(err.to_string(), "cannot reach db.internal");
    }

    #[test]
    fn numeric_fields_widen_through_into() {
        let err = StorageProbeError::timeout(250_u32);
        assert_eq!(err, StorageProbeError::Timeout { millis: 250 });
    }

    #[test]
    fn mixed_fields_keep_declaration_order() {
        let err = StorageProbeError::rejected("phone_book", 3_u32);
        assert_eq!(err.to_string(), "phone_book rejected 3 rows");
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(StorageProbeError::closed().to_string(), "connection closed");
    }
}
