#[macro_export]
macro_rules! attribute_type_registry_entries {
    ($macro:ident $(, @args $($args:tt)+ )?) => {
        $macro! {
            $(
                @args $($args)+;
            )?
            @entries
            (
                Bool,
                Bool,
                is_quoted_literal = false,
                supports_ordering = false,
                supports_arithmetic = false
            ),
            (
                Double,
                Numeric,
                is_quoted_literal = false,
                supports_ordering = true,
                supports_arithmetic = true
            ),
            (
                Float,
                Numeric,
                is_quoted_literal = false,
                supports_ordering = true,
                supports_arithmetic = true
            ),
            (
                Int,
                Numeric,
                is_quoted_literal = false,
                supports_ordering = true,
                supports_arithmetic = true
            ),
            (
                Long,
                Numeric,
                is_quoted_literal = false,
                supports_ordering = true,
                supports_arithmetic = true
            ),
            (
                Object,
                Object,
                is_quoted_literal = false,
                supports_ordering = false,
                supports_arithmetic = false
            ),
            (
                String,
                Textual,
                is_quoted_literal = true,
                supports_ordering = true,
                supports_arithmetic = false
            ),
        }
    };
}

#[macro_export]
macro_rules! attribute_type_registry {
    ($macro:ident) => {
        $crate::attribute_type_registry_entries!($macro)
    };
    ($macro:ident, $($args:tt)+) => {
        $crate::attribute_type_registry_entries!($macro, @args $($args)+)
    };
}

macro_rules! metadata_from_registry {
    ( @args $ty:expr; @entries $( ($variant:ident, $family:ident, is_quoted_literal = $quoted:expr, supports_ordering = $ordering:expr, supports_arithmetic = $arithmetic:expr) ),* $(,)? ) => {
        match $ty {
            $(
                $crate::AttributeType::$variant => $crate::AttributeMetadata {
                    family: $crate::AttributeFamily::$family,
                    is_quoted_literal: $quoted,
                    supports_ordering: $ordering,
                    supports_arithmetic: $arithmetic,
                },
            )*
        }
    };
}

macro_rules! all_types_from_registry {
    ( @entries $( ($variant:ident, $family:ident, is_quoted_literal = $quoted:expr, supports_ordering = $ordering:expr, supports_arithmetic = $arithmetic:expr) ),* $(,)? ) => {
        [ $( $crate::AttributeType::$variant ),* ]
    };
}
