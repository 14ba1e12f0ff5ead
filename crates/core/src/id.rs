//! Strongly-typed, sequential identifiers used across the domain.
//!
//! Each entity kind numbers its instances from 1 and renders them with a fixed
//! prefix and at least four digits (`SO0001`, `PO0012`, `DEL0003`).

use core::marker::PhantomData;

/// An identifier drawn from a per-kind sequence.
pub trait SequentialId: Copy + Ord + core::fmt::Display + core::fmt::Debug {
    /// Rendering prefix (e.g. `"SO"`).
    const PREFIX: &'static str;

    fn from_sequence(n: u32) -> Self;

    fn sequence(&self) -> u32;
}

/// Declare a sequential identifier newtype.
///
/// Generates `Display`/`FromStr` in the `PREFIX0001` form, string-based serde
/// impls and a [`SequentialId`] impl.
#[macro_export]
macro_rules! sequential_id {
    ($(#[$meta:meta])* $vis:vis struct $t:ident => $prefix:literal;) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $t(u32);

        impl $t {
            pub const PREFIX: &'static str = $prefix;

            pub fn new(n: u32) -> Self {
                Self(n)
            }

            pub fn value(&self) -> u32 {
                self.0
            }
        }

        impl $crate::id::SequentialId for $t {
            const PREFIX: &'static str = $prefix;

            fn from_sequence(n: u32) -> Self {
                Self(n)
            }

            fn sequence(&self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}{:04}", $prefix, self.0)
            }
        }

        impl core::str::FromStr for $t {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $crate::id::parse_sequence(s, $prefix).map(Self)
            }
        }

        impl $crate::__private::serde::Serialize for $t {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                let raw = <String as $crate::__private::serde::Deserialize>::deserialize(deserializer)?;
                raw.parse()
                    .map_err(<D::Error as $crate::__private::serde::de::Error>::custom)
            }
        }
    };
}

/// Parse `PREFIX<digits>` into the sequence number (must be >= 1).
pub fn parse_sequence(s: &str, prefix: &str) -> Result<u32, crate::DomainError> {
    let digits = s
        .trim()
        .strip_prefix(prefix)
        .ok_or_else(|| crate::DomainError::invalid_id(format!("{s:?}: expected prefix {prefix}")))?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(crate::DomainError::invalid_id(format!(
            "{s:?}: expected digits after {prefix}"
        )));
    }

    match digits.parse::<u32>() {
        Ok(0) => Err(crate::DomainError::invalid_id(format!(
            "{s:?}: sequence numbers start at 1"
        ))),
        Ok(n) => Ok(n),
        Err(e) => Err(crate::DomainError::invalid_id(format!("{s:?}: {e}"))),
    }
}

/// Allocator for one identifier kind.
///
/// `peek` hands out the next identifier without consuming it; `commit` consumes
/// it once the operation that used it has succeeded. After `u32::MAX` has been
/// committed the sequence is exhausted and `peek` fails.
#[derive(Debug, Clone)]
pub struct IdSequence<I> {
    next: Option<u32>,
    _kind: PhantomData<I>,
}

impl<I: SequentialId> IdSequence<I> {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    fn starting_at(next: u32) -> Self {
        Self {
            next: Some(next),
            _kind: PhantomData,
        }
    }

    pub fn peek(&self) -> crate::DomainResult<I> {
        self.next
            .map(I::from_sequence)
            .ok_or_else(|| crate::DomainError::validation("identifier sequence is exhausted"))
    }

    pub fn commit(&mut self, used: I) {
        debug_assert_eq!(Some(used.sequence()), self.next, "committed id out of order");
        self.next = used.sequence().checked_add(1);
    }
}

impl<I: SequentialId> Default for IdSequence<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::sequential_id! {
        /// Test identifier.
        pub struct WidgetId => "WG";
    }

    #[test]
    fn display_pads_to_four_digits() {
        assert_eq!(WidgetId::new(1).to_string(), "WG0001");
        assert_eq!(WidgetId::new(123).to_string(), "WG0123");
        assert_eq!(WidgetId::new(12345).to_string(), "WG12345");
    }

    #[test]
    fn parses_back_from_display_form() {
        let id: WidgetId = "WG0042".parse().unwrap();
        assert_eq!(id, WidgetId::new(42));
        assert_eq!(" WG7 ".parse::<WidgetId>().unwrap(), WidgetId::new(7));
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for bad in ["", "WG", "XX0001", "WG00a1", "WG0000", "WG-1"] {
            let err = bad.parse::<WidgetId>().unwrap_err();
            assert!(
                matches!(err, crate::DomainError::InvalidId(_)),
                "expected InvalidId for {bad:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn serializes_as_display_string() {
        let json = serde_json::to_string(&WidgetId::new(3)).unwrap();
        assert_eq!(json, "\"WG0003\"");

        let back: WidgetId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, WidgetId::new(3));
        assert!(serde_json::from_str::<WidgetId>("\"nope\"").is_err());
    }

    #[test]
    fn sequence_only_advances_on_commit() {
        let mut seq: IdSequence<WidgetId> = IdSequence::new();
        assert_eq!(seq.peek().unwrap(), WidgetId::new(1));
        assert_eq!(seq.peek().unwrap(), WidgetId::new(1));

        let id = seq.peek().unwrap();
        seq.commit(id);
        assert_eq!(seq.peek().unwrap(), WidgetId::new(2));
    }

    #[test]
    fn sequence_is_exhausted_after_the_last_number() {
        let mut seq: IdSequence<WidgetId> = IdSequence::starting_at(u32::MAX);
        let last = seq.peek().unwrap();
        assert_eq!(last, WidgetId::new(u32::MAX));

        seq.commit(last);
        let err = seq.peek().unwrap_err();
        assert!(matches!(err, crate::DomainError::Validation(msg) if msg.contains("exhausted")));
    }
}
