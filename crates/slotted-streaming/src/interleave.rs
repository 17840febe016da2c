//! Zipping literal fragments with interpolated values.

use slotted_core::RenderError;

/// One element of an interleaved template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<T> {
    /// Literal text from the template itself.
    Literal(String),
    /// An interpolated value.
    Value(T),
}

/// Interleave literals with interpolations.
///
/// Element `2i` is `literals[i]`, element `2i + 1` is `interpolations[i]`,
/// and the sequence ends with the last literal. There must be exactly one
/// more literal than interpolations.
pub fn interleave<T>(
    literals: Vec<String>,
    interpolations: Vec<T>,
) -> Result<Vec<Segment<T>>, RenderError> {
    if literals.len() != interpolations.len() + 1 {
        return Err(RenderError::arity(literals.len(), interpolations.len()));
    }
    Ok(zip_segments(literals, interpolations))
}

/// Interleave without checking arity. Callers uphold the invariant.
pub(crate) fn zip_segments<T>(literals: Vec<String>, interpolations: Vec<T>) -> Vec<Segment<T>> {
    let mut segments = Vec::with_capacity(literals.len() + interpolations.len());
    let mut literals = literals.into_iter();

    for value in interpolations {
        if let Some(literal) = literals.next() {
            segments.push(Segment::Literal(literal));
        }
        segments.push(Segment::Value(value));
    }
    segments.extend(literals.map(Segment::Literal));

    segments
}
