//! Static types as seen by runtime type tests.
//!
//! A small closed lattice: nominal class types, applied generics, unions,
//! intersections and a few shapes the backend cannot test, which are treated
//! as always satisfied.

use crate::{Name, SymbolId};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StaticType {
    /// Instances of a class or module (or of a singleton class).
    Class(SymbolId),
    /// A generic class applied to type arguments, e.g. `Array[Integer]`.
    Applied { class: SymbolId, args: Vec<StaticType> },
    /// `T.any(left, right)`
    Union(Box<StaticType>, Box<StaticType>),
    /// `T.all(left, right)`
    Intersection(Box<StaticType>, Box<StaticType>),
    /// `T.untyped` and anything erased before codegen.
    Dynamic,
    /// A generic method or class parameter.
    TypeParameter(Name),
    /// `T.self_type`
    SelfType,
}

impl StaticType {
    pub fn class(class: SymbolId) -> Self {
        StaticType::Class(class)
    }

    pub fn applied(class: SymbolId, args: Vec<StaticType>) -> Self {
        StaticType::Applied { class, args }
    }

    pub fn union(left: StaticType, right: StaticType) -> Self {
        StaticType::Union(Box::new(left), Box::new(right))
    }

    pub fn intersection(left: StaticType, right: StaticType) -> Self {
        StaticType::Intersection(Box::new(left), Box::new(right))
    }

    /// `T.nilable(inner)`, i.e. `T.any(inner, NilClass)`.
    pub fn nilable(inner: StaticType) -> Self {
        Self::union(inner, StaticType::Class(SymbolId::NIL_CLASS))
    }

    /// Union of all `types`, folded to the right. An empty list is
    /// `Dynamic`.
    pub fn any_of(types: impl IntoIterator<Item = StaticType>) -> Self {
        let mut types: Vec<StaticType> = types.into_iter().collect();
        let Some(mut acc) = types.pop() else {
            return StaticType::Dynamic;
        };
        while let Some(next) = types.pop() {
            acc = Self::union(next, acc);
        }
        acc
    }
}

#[cfg(test)]
mod tests;
