/// Defines an `as_*`/`is_*` pair of accessors for one variant of a tagged enum.
///
/// Used by `RuntimeObject` and `Value` so each variant gets a cheap borrow-checked
/// accessor without hand-writing the same `match` over and over.
macro_rules! variant_accessors {
    ($enum_name:ident :: $variant:ident ( $inner:ty ) => $as_fn:ident, $is_fn:ident) => {
        #[allow(dead_code)]
        pub fn $as_fn(&self) -> Option<&$inner> {
            match self {
                $enum_name::$variant(ref inner) => Some(inner),
                _ => None,
            }
        }

        #[allow(dead_code)]
        pub fn $is_fn(&self) -> bool {
            matches!(self, $enum_name::$variant(_))
        }
    };
}
