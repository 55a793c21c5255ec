use pretty_assertions::assert_eq;

use super::*;

#[test]
fn nilable_is_a_union_with_nil() {
    let ty = StaticType::nilable(StaticType::class(SymbolId::STRING));
    assert_eq!(
        ty,
        StaticType::union(
            StaticType::Class(SymbolId::STRING),
            StaticType::Class(SymbolId::NIL_CLASS)
        )
    );
}

#[test]
fn any_of_folds_right_and_keeps_order() {
    let ty = StaticType::any_of([
        StaticType::class(SymbolId::INTEGER),
        StaticType::class(SymbolId::FLOAT),
        StaticType::class(SymbolId::RATIONAL),
    ]);
    assert_eq!(
        ty,
        StaticType::union(
            StaticType::class(SymbolId::INTEGER),
            StaticType::union(
                StaticType::class(SymbolId::FLOAT),
                StaticType::class(SymbolId::RATIONAL)
            )
        )
    );
}

#[test]
fn any_of_nothing_is_dynamic() {
    assert_eq!(StaticType::any_of(Vec::<StaticType>::new()), StaticType::Dynamic);
    assert_eq!(
        StaticType::any_of([StaticType::SelfType]),
        StaticType::SelfType
    );
}
