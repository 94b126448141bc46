//! Defines the macro that derives a record's attributes, field descriptors,
//! and validation rules from a single schema definition.

/// Declare a record schema.
///
/// Each entry names the Rust field, its wire name, and the
/// [`FieldDescriptor`](crate::domain::FieldDescriptor) (with its rule) that
/// describes it. The macro emits:
///
/// - a struct with one `String` per entry, serialised under the wire name;
/// - `FIELDS`, the ordered descriptor slice, each bound to its wire name;
/// - `value`, `from_values`, and `to_values` for moving between the struct
///   and [`FormValues`](crate::domain::FormValues).
///
/// Adding an attribute is one new entry; the record shape, descriptor, and
/// rule cannot drift apart.
macro_rules! define_record_schema {
    (
        $(#[$outer:meta])*
        pub struct $name:ident {
            $(
                $field:ident : $wire:literal => $descriptor:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(default)]
        pub struct $name {
            $(
                #[doc = concat!("Value of the `", $wire, "` attribute.")]
                #[serde(rename = $wire)]
                pub $field: String,
            )+
        }

        impl $name {
            /// Ordered descriptors for every attribute, in render order.
            pub const FIELDS: &'static [$crate::domain::FieldDescriptor] = &[
                $( $descriptor.named($wire), )+
            ];

            /// Look up the descriptor for the attribute called `name`.
            #[must_use]
            pub fn descriptor(name: &str) -> Option<&'static $crate::domain::FieldDescriptor> {
                $crate::domain::find_descriptor(Self::FIELDS, name)
            }

            /// Value of the attribute called `name`.
            #[must_use]
            pub fn value(&self, name: &str) -> Option<&str> {
                match name {
                    $( $wire => Some(self.$field.as_str()), )+
                    _ => None,
                }
            }

            /// Build from raw values; absent attributes become empty strings.
            #[must_use]
            pub fn from_values(values: &$crate::domain::FormValues) -> Self {
                Self {
                    $( $field: values.get($wire).unwrap_or_default().to_owned(), )+
                }
            }

            /// Raw values keyed by wire name, one per attribute.
            #[must_use]
            pub fn to_values(&self) -> $crate::domain::FormValues {
                let mut values = $crate::domain::FormValues::default();
                $( values.insert($wire, self.$field.as_str()); )+
                values
            }
        }
    };
}

pub(crate) use define_record_schema;
