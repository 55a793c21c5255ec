//! Compiled methods executed against the runtime doubles.

use garnet_ir::{Loc, MethodShape, ParamSpec, SourceBlockId, StaticType, SymbolId};
use inkwell::execution_engine::ExecutionEngine;
use pretty_assertions::assert_eq;

use super::runtime::{self, int, ArityError, FrameRecord, FALSE, NIL, TRUE, UNDEF};
use super::{end_method, jit, with_state, Fixture};

type MethodFn = unsafe extern "C" fn(i32, *const i64, i64) -> i64;

fn call(ee: &ExecutionEngine<'_>, name: &str, args: &[i64], receiver: i64) -> i64 {
    // SAFETY: every `func_*` symbol is defined with the method signature.
    let func = unsafe { ee.get_function::<MethodFn>(name) }
        .unwrap_or_else(|err| panic!("no JIT function `{name}`: {err:?}"));
    unsafe { func.call(args.len() as i32, args.as_ptr(), receiver) }
}

#[test]
fn method_prologue_and_locals_round_trip() {
    runtime::reset();
    let fixture = Fixture::new();
    let x = fixture.local("x");
    let shape = fixture
        .bar_shape()
        .with_params(ParamSpec::positional(1, 1))
        .with_local(x);

    with_state(&fixture, |state| {
        let mut ctx = state.begin_method(&shape);
        state.set_stack_frame(&mut ctx);
        let argc = ctx.args().argc;
        state.check_arity(&ctx, crate::ArgCount::Dynamic(argc));
        let value = state.box_int(41);
        state.var_set(&mut ctx, x, value, SourceBlockId::MAIN);
        state.set_line_number(&mut ctx, Loc::line(fixture.file, 5));
        let result = state.var_get(&mut ctx, x, SourceBlockId::MAIN);
        end_method(state, &mut ctx, result);

        let ee = jit(state);
        // The frame descriptor is built by the module initializer.
        assert_eq!(runtime::log().frames.len(), 1);
        assert_eq!(runtime::log().frame_sets, 0);

        assert_eq!(call(&ee, "func_Foo#bar", &[int(7)], NIL), int(41));
        let log = runtime::log();
        assert_eq!(
            log.frames,
            vec![FrameRecord {
                owner: "Foo".to_owned(),
                name: "bar".to_owned(),
                name_id: "bar".to_owned(),
                file: "app/models/foo.rb".to_owned(),
                start_line: 3,
                end_line: 9,
            }]
        );
        assert_eq!(log.frame_sets, 1);
        assert_eq!(log.line_offsets, vec![2]);

        assert_eq!(call(&ee, "func_Foo#bar", &[int(8)], NIL), int(41));
        let log = runtime::log();
        assert_eq!(log.frames.len(), 1);
        assert_eq!(log.frame_sets, 2);
        assert_eq!(log.line_offsets, vec![2, 2]);
    });
}

#[test]
fn arity_errors_reach_the_runtime() {
    runtime::reset();
    let fixture = Fixture::new();
    let shape = fixture.bar_shape().with_params(ParamSpec::positional(1, 1));

    with_state(&fixture, |state| {
        let mut ctx = state.begin_method(&shape);
        let argc = ctx.args().argc;
        state.check_arity(&ctx, crate::ArgCount::Dynamic(argc));
        let result = state.box_int(1);
        end_method(state, &mut ctx, result);

        let ee = jit(state);
        assert_eq!(call(&ee, "func_Foo#bar", &[NIL], NIL), int(1));

        let address = ee.get_function_address("func_Foo#bar").unwrap();
        let call_with = |args: Vec<i64>| {
            runtime::catch_arity_error(move || {
                // SAFETY: `address` is the JIT entry point of `func_Foo#bar`,
                // which stays mapped while `ee` is alive.
                let func = unsafe { std::mem::transmute::<usize, MethodFn>(address) };
                unsafe { func(args.len() as i32, args.as_ptr(), NIL) };
            })
        };

        assert_eq!(
            call_with(vec![]),
            Some(ArityError {
                argc: 0,
                min: 1,
                max: 1
            })
        );
        assert_eq!(
            call_with(vec![NIL, NIL]),
            Some(ArityError {
                argc: 2,
                min: 1,
                max: 1
            })
        );
        assert_eq!(call_with(vec![NIL]), None);
    });
}

#[test]
fn captured_locals_live_in_the_closure_env() {
    runtime::reset();
    let fixture = Fixture::new();
    let y = fixture.local("y");
    let z = fixture.local("z");
    let shape = fixture.bar_shape().with_escaped(y).with_escaped(z);

    with_state(&fixture, |state| {
        let mut ctx = state.begin_method(&shape);
        state.alloc_closure_env(&mut ctx);
        let five = state.box_int(5);
        state.var_set(&mut ctx, y, five, SourceBlockId::MAIN);
        let six = state.box_int(6);
        state.var_set(&mut ctx, z, six, SourceBlockId::MAIN);
        let result = state.var_get(&mut ctx, y, SourceBlockId::MAIN);
        end_method(state, &mut ctx, result);

        let ee = jit(state);
        assert_eq!(call(&ee, "func_Foo#bar", &[], NIL), int(5));
    });
}

#[test]
fn union_and_intersection_tests_evaluate() {
    runtime::reset();
    let fixture = Fixture::new();
    let union = StaticType::nilable(StaticType::class(SymbolId::INTEGER));
    let intersection = StaticType::intersection(
        StaticType::class(SymbolId::INTEGER),
        StaticType::class(SymbolId::STRING),
    );

    with_state(&fixture, |state| {
        for (shape, ty) in [
            (fixture.bar_shape(), &union),
            (MethodShape::new(fixture.build), &intersection),
        ] {
            let mut ctx = state.begin_method(&shape);
            let receiver = ctx.args().receiver;
            let test = state.type_test(receiver, ty);
            let result = state.bool_to_value(test);
            end_method(state, &mut ctx, result);
        }

        let ee = jit(state);
        assert_eq!(call(&ee, "func_Foo#bar", &[], int(3)), TRUE);
        assert_eq!(call(&ee, "func_Foo#bar", &[], NIL), TRUE);
        assert_eq!(call(&ee, "func_Foo#bar", &[], FALSE), FALSE);

        assert_eq!(call(&ee, "func_Foo.build", &[], int(3)), FALSE);
        assert_eq!(call(&ee, "func_Foo.build", &[], NIL), FALSE);
    });
}

#[test]
fn cached_values_are_computed_once_per_process() {
    runtime::reset();
    let fixture = Fixture::new();

    with_state(&fixture, |state| {
        let mut ctx = state.begin_method(&fixture.bar_shape());
        let first = state.interned_id(ctx.entry_mut(), "count");
        let again = state.interned_id(ctx.entry_mut(), "count");
        assert_eq!(first, again);
        state.frozen_string(ctx.entry_mut(), "hello");
        end_method(state, &mut ctx, first);

        let ee = jit(state);
        let id = call(&ee, "func_Foo#bar", &[], NIL);
        assert_eq!(call(&ee, "func_Foo#bar", &[], NIL), id);

        let log = runtime::log();
        assert_eq!(log.intern_calls, 1);
        assert_eq!(log.ids, vec!["count".to_owned()]);
        assert_eq!(log.strings, vec![("hello".to_owned(), true)]);
    });
}

#[test]
fn immediates_come_from_the_runtime() {
    runtime::reset();
    let fixture = Fixture::new();

    with_state(&fixture, |state| {
        let mut bar = state.begin_method(&fixture.bar_shape());
        let undef = state.undef();
        end_method(state, &mut bar, undef);

        let mut build = state.begin_method(&MethodShape::new(fixture.build));
        let receiver = build.args().receiver;
        let cond = state.is_truthy(receiver);
        let result = state.bool_to_value(cond);
        end_method(state, &mut build, result);

        let ee = jit(state);
        assert_eq!(call(&ee, "func_Foo#bar", &[], NIL), UNDEF);
        assert_eq!(call(&ee, "func_Foo.build", &[], int(0)), TRUE);
        assert_eq!(call(&ee, "func_Foo.build", &[], NIL), FALSE);
        assert_eq!(call(&ee, "func_Foo.build", &[], FALSE), FALSE);
    });
}
