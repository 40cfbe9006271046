//! Enums that tolerate values added to the service after this SDK was built.

/// Declare an enum whose unrecognised wire values land in `Unknown(String)`.
///
/// The generated type gets `as_str`, `Display`, `FromStr` (infallible) and
/// serde support that round-trips unknown values unchanged.
///
/// # Examples
///
/// ```
/// ocisdk_model::open_enum! {
///     /// Colour of a thing.
///     pub enum Colour {
///         /// Red.
///         Red => "RED",
///         /// Blue.
///         Blue => "BLUE",
///     }
/// }
///
/// assert_eq!("RED".parse::<Colour>().unwrap(), Colour::Red);
/// assert_eq!(Colour::from("TEAL"), Colour::Unknown("TEAL".to_owned()));
/// assert_eq!(Colour::Unknown("TEAL".to_owned()).as_str(), "TEAL");
/// ```
#[macro_export]
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $wire:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
            /// A value not known to this version of the SDK.
            Unknown(String),
        }

        impl $name {
            /// The wire representation.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Unknown(s) => s.as_str(),
                }
            }

            /// Whether this value was not recognised.
            #[must_use]
            pub fn is_unknown(&self) -> bool {
                matches!(self, Self::Unknown(_))
            }
        }

        impl ::std::convert::From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $($wire => Self::$variant,)+
                    other => Self::Unknown(other.to_owned()),
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::std::convert::Infallible;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                Ok(Self::from(s))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S: $crate::__private::serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $name {
            fn deserialize<D: $crate::__private::serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                let s = <::std::string::String as $crate::__private::serde::Deserialize>::deserialize(deserializer)?;
                Ok(Self::from(s.as_str()))
            }
        }
    };
}
