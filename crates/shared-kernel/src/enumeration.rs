//! Enumeration support for small closed sets such as statuses.

/// A closed set of named values with stable numeric ids.
///
/// Implementors list every variant in [`Enumeration::all`]; lookups by id
/// and by name come for free.
pub trait Enumeration: Copy + PartialEq + 'static {
    /// Every variant, in id order.
    fn all() -> &'static [Self];

    /// Stable numeric id of this variant.
    fn id(&self) -> i32;

    /// Display name of this variant.
    fn name(&self) -> &'static str;

    /// Looks up a variant by id.
    fn from_id(id: i32) -> Option<Self> {
        Self::all().iter().copied().find(|v| v.id() == id)
    }

    /// Looks up a variant by name, ignoring ASCII case.
    fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Comma-separated list of names, for error messages.
    fn names() -> String {
        Self::all()
            .iter()
            .map(|v| v.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
