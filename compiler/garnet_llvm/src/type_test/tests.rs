use garnet_ir::{MethodShape, StaticType};
use pretty_assertions::assert_eq;

use super::*;
use crate::tests::{compile_method, end_method, with_state, Fixture};

/// IR of `Foo#bar` returning the boxed result of testing `self` against
/// `ty`.
fn type_test_ir(fixture: &Fixture, ty: &StaticType) -> String {
    compile_method(fixture, &fixture.bar_shape(), |state, ctx| {
        let result = state.type_test(ctx.args().receiver, ty);
        state.bool_to_value(result)
    })
}

#[test]
fn fast_predicates_cover_core_classes() {
    assert_eq!(fast_type_test(SymbolId::INTEGER), Some("garnet_isa_Integer"));
    assert_eq!(fast_type_test(SymbolId::NIL_CLASS), Some("garnet_isa_NilClass"));
    assert_eq!(fast_type_test(SymbolId::UNTYPED), Some("garnet_isa_untyped"));
    assert_eq!(fast_type_test(SymbolId::ROOT_SINGLETON), Some("garnet_isa_RootSingleton"));
    assert_eq!(fast_type_test(SymbolId::OBJECT), None);
    assert_eq!(fast_type_test(SymbolId::PROC0), None);
}

#[test]
fn core_class_uses_its_fast_predicate() {
    let fixture = Fixture::new();
    let ir = type_test_ir(&fixture, &StaticType::class(SymbolId::INTEGER));
    assert!(ir.contains("%isa = call i1 @garnet_isa_Integer(i64 %selfRaw)"), "IR:\n{ir}");
    assert!(!ir.contains("garnet_get_class"), "IR:\n{ir}");
}

#[test]
fn user_class_uses_generic_isa() {
    let fixture = Fixture::new();
    let ir = type_test_ir(&fixture, &StaticType::class(fixture.foo));
    assert!(ir.contains("%const = call i64 @garnet_get_class(ptr @str.Foo, i64 3)"), "IR:\n{ir}");
    assert!(ir.contains("%isa = call i1 @garnet_isa(i64 %selfRaw, i64 %const)"), "IR:\n{ir}");
}

#[test]
fn singleton_class_tests_class_of_attached() {
    let fixture = Fixture::new();
    let ir = type_test_ir(&fixture, &StaticType::class(fixture.foo_singleton));
    assert!(ir.contains("call i64 @garnet_get_class(ptr @str.Foo, i64 3)"), "IR:\n{ir}");
    assert!(
        ir.contains("%isaClassOf = call i1 @garnet_isa_class_of(i64 %selfRaw, i64 %const)"),
        "IR:\n{ir}"
    );
}

#[test]
fn numbered_proc_is_tested_as_proc() {
    let fixture = Fixture::new();
    let proc2 = SymbolId::numbered_proc(2).unwrap();
    let ir = type_test_ir(&fixture, &StaticType::class(proc2));
    assert!(ir.contains("call i64 @garnet_get_class(ptr @str.Proc, i64 4)"), "IR:\n{ir}");
    assert!(ir.contains("call i1 @garnet_isa(i64 %selfRaw, i64 %const)"), "IR:\n{ir}");
    assert!(!ir.contains("Proc2"), "IR:\n{ir}");
}

#[test]
fn applied_type_tests_only_its_class() {
    let fixture = Fixture::new();
    let ty = StaticType::applied(SymbolId::ARRAY, vec![StaticType::class(SymbolId::INTEGER)]);
    let ir = type_test_ir(&fixture, &ty);
    assert!(ir.contains("call i1 @garnet_isa_Array(i64 %selfRaw)"), "IR:\n{ir}");
    assert!(!ir.contains("garnet_isa_Integer"), "IR:\n{ir}");
}

#[test]
fn untestable_types_hold() {
    let fixture = Fixture::new();
    let name = fixture.program.interner.intern("T");
    for ty in [StaticType::Dynamic, StaticType::TypeParameter(name), StaticType::SelfType] {
        let ir = type_test_ir(&fixture, &ty);
        assert!(ir.contains("call i64 @garnet_bool_box(i1 true)"), "{ty:?}:\n{ir}");
        assert!(!ir.contains("call i1 @garnet_isa"), "{ty:?}:\n{ir}");
    }
}

#[test]
fn union_short_circuits_on_left_success() {
    let fixture = Fixture::new();
    let ty = StaticType::nilable(StaticType::class(SymbolId::INTEGER));
    let ir = type_test_ir(&fixture, &ty);

    assert!(ir.contains("br i1 %isa, label %orContinue, label %orRight"), "IR:\n{ir}");
    assert!(ir.contains("\norRight:"), "IR:\n{ir}");
    assert!(ir.contains("\norContinue:"), "IR:\n{ir}");

    let phi = ir
        .lines()
        .find(|line| line.contains("%orTypeTest = phi i1"))
        .unwrap_or_else(|| panic!("no phi in:\n{ir}"));
    assert!(phi.contains("[ %isa, %body ]"), "{phi}");
    assert!(phi.contains(", %orRight ]"), "{phi}");

    // The left test runs before the right one.
    let integer = ir.find("@garnet_isa_Integer(i64 %selfRaw)").unwrap();
    let nil = ir.find("@garnet_isa_NilClass(i64 %selfRaw)").unwrap();
    assert!(integer < nil);
}

#[test]
fn intersection_short_circuits_on_left_failure() {
    let fixture = Fixture::new();
    let ty = StaticType::intersection(StaticType::class(SymbolId::INTEGER), StaticType::class(fixture.foo));
    let ir = type_test_ir(&fixture, &ty);

    assert!(ir.contains("br i1 %isa, label %andRight, label %andContinue"), "IR:\n{ir}");
    let phi = ir
        .lines()
        .find(|line| line.contains("%andTypeTest = phi i1"))
        .unwrap_or_else(|| panic!("no phi in:\n{ir}"));
    assert!(phi.contains("[ %isa, %body ]"), "{phi}");
    assert!(phi.contains(", %andRight ]"), "{phi}");
}

#[test]
fn nested_union_merges_from_inner_continuation() {
    let fixture = Fixture::new();
    let ty = StaticType::any_of([
        StaticType::class(SymbolId::INTEGER),
        StaticType::class(SymbolId::STRING),
        StaticType::class(SymbolId::NIL_CLASS),
    ]);
    let ir = type_test_ir(&fixture, &ty);

    assert_eq!(ir.matches("= phi i1").count(), 2, "IR:\n{ir}");
    for predicate in ["garnet_isa_Integer", "garnet_isa_String", "garnet_isa_NilClass"] {
        assert!(ir.contains(&format!("call i1 @{predicate}(i64 %selfRaw)")), "IR:\n{ir}");
    }
    // The outer merge's right edge comes from the inner merge block.
    let outer_phi = ir
        .lines()
        .find(|line| line.contains("= phi i1") && line.contains("%body ]"))
        .unwrap_or_else(|| panic!("no outer phi in:\n{ir}"));
    assert!(outer_phi.contains(", %orContinue"), "{outer_phi}");
    assert!(!outer_phi.contains(", %orRight ]"), "{outer_phi}");
}

#[test]
fn type_tests_work_in_singleton_methods() {
    let fixture = Fixture::new();
    let shape = MethodShape::new(fixture.build);
    let ir = compile_method(&fixture, &shape, |state, ctx| {
        let result = state.type_test(ctx.args().receiver, &StaticType::class(fixture.foo_singleton));
        state.bool_to_value(result)
    });
    assert!(ir.contains("define i64 @func_Foo.build("), "IR:\n{ir}");
    assert!(ir.contains("@garnet_isa_class_of"), "IR:\n{ir}");
}

#[test]
fn nested_tests_branch_within_the_method() {
    let fixture = Fixture::new();
    let ty = StaticType::any_of([
        StaticType::class(SymbolId::INTEGER),
        StaticType::intersection(StaticType::class(SymbolId::STRING), StaticType::class(SymbolId::SYMBOL)),
        StaticType::class(SymbolId::NIL_CLASS),
    ]);
    with_state(&fixture, |state| {
        let mut ctx = state.begin_method(&fixture.bar_shape());
        let functions = state.irb.function_count();

        let result = state.type_test(ctx.args().receiver, &ty);
        assert_eq!(state.irb.function_count(), functions);
        assert_eq!(state.irb.current_function(), Some(ctx.function()));

        let boxed = state.bool_to_value(result);
        end_method(state, &mut ctx, boxed);
        state.finish().unwrap();
    });
}
