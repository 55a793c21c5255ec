use inkwell::context::Context;

use super::*;

/// Set up a `void f(i1)` function positioned at its `entry` block.
fn setup_builder(irb: &mut IrBuilder<'_, '_>) -> FunctionId {
    let bool_ty = irb.bool_type();
    let i64_ty = irb.i64_type();
    let func = irb.declare_function("test_fn", &[bool_ty], i64_ty);
    let entry = irb.append_block(func, "entry");
    irb.position_at_end(entry);
    irb.set_current_function(Some(func));
    func
}

#[test]
fn internal_global_has_expected_attributes() {
    let ctx = Context::create();
    let scx = SimpleCx::new(&ctx, "globals");
    let mut irb = IrBuilder::new(&scx);

    let i64_ty = irb.i64_type();
    let zero = irb.const_i64(0);
    irb.add_internal_global("cell", i64_ty, zero);

    let ir = scx.llmod.print_to_string().to_string();
    assert!(
        ir.contains("@cell = internal unnamed_addr global i64 0, align 8"),
        "unexpected IR:\n{ir}"
    );
}

#[test]
fn c_string_global_is_private_constant_and_terminated() {
    let ctx = Context::create();
    let scx = SimpleCx::new(&ctx, "cstr");
    let mut irb = IrBuilder::new(&scx);

    irb.add_c_string_global("str.hello", "hello");

    let ir = scx.llmod.print_to_string().to_string();
    assert!(ir.contains("private unnamed_addr constant [6 x i8] c\"hello\\00\""), "unexpected IR:\n{ir}");
}

#[test]
fn global_ctors_list_entries_in_order() {
    let ctx = Context::create();
    let scx = SimpleCx::new(&ctx, "ctors");
    let mut irb = IrBuilder::new(&scx);

    let i64_ty = irb.i64_type();
    let mut entries = Vec::new();
    for name in ["first", "second"] {
        let zero = irb.const_i64(0);
        let data = irb.add_internal_global(name, i64_ty, zero);
        let function = irb.declare_internal_void_function(&format!("init.{name}"));
        let bb = irb.append_block(function, "constr");
        irb.position_at_end(bb);
        irb.ret_void();
        entries.push(CtorEntry {
            priority: 0,
            function,
            data,
        });
    }
    irb.emit_global_ctors(&entries);

    let ir = scx.llmod.print_to_string().to_string();
    assert!(
        ir.contains("@llvm.global_ctors = appending global [2 x { i32, ptr, ptr }]"),
        "unexpected IR:\n{ir}"
    );
    let first = ir.find("ptr @init.first, ptr @first").expect("first entry");
    let second = ir.find("ptr @init.second, ptr @second").expect("second entry");
    assert!(first < second);
    assert!(scx.llmod.verify().is_ok());
}

#[test]
fn no_ctors_means_no_global() {
    let ctx = Context::create();
    let scx = SimpleCx::new(&ctx, "no_ctors");
    let mut irb = IrBuilder::new(&scx);

    irb.emit_global_ctors(&[]);
    assert!(scx.llmod.get_global("llvm.global_ctors").is_none());
}

#[test]
fn expect_wraps_condition() {
    let ctx = Context::create();
    let scx = SimpleCx::new(&ctx, "expect");
    let mut irb = IrBuilder::new(&scx);
    let func = setup_builder(&mut irb);

    let cond = irb.get_param(func, 0);
    let hinted = irb.call_expect_i1(cond, true, "likely");
    let one = irb.const_i64(1);
    let two = irb.const_i64(2);
    let then_bb = irb.append_block(func, "then");
    let else_bb = irb.append_block(func, "else");
    irb.cond_br(hinted, then_bb, else_bb);
    irb.position_at_end(then_bb);
    irb.ret(one);
    irb.position_at_end(else_bb);
    irb.ret(two);

    let ir = scx.llmod.print_to_string().to_string();
    assert!(ir.contains("call i1 @llvm.expect.i1(i1 %0, i1 true)"), "unexpected IR:\n{ir}");
    assert!(scx.llmod.verify().is_ok());
}

#[test]
fn entry_alloca_lands_before_existing_code() {
    let ctx = Context::create();
    let scx = SimpleCx::new(&ctx, "alloca");
    let mut irb = IrBuilder::new(&scx);
    let func = setup_builder(&mut irb);

    let i64_ty = irb.i64_type();
    let seven = irb.const_i64(7);
    let first = irb.create_entry_alloca(func, "first", i64_ty);
    irb.store(seven, first);
    let second = irb.create_entry_alloca(func, "second", i64_ty);
    irb.store(seven, second);
    let loaded = irb.load(i64_ty, second, "value");
    irb.ret(loaded);

    let entry = irb.get_function_value(func).get_first_basic_block().unwrap();
    let first_instr = entry.get_first_instruction().unwrap();
    assert_eq!(
        first_instr.get_opcode(),
        inkwell::values::InstructionOpcode::Alloca
    );
    assert_eq!(
        first_instr.get_next_instruction().unwrap().get_opcode(),
        inkwell::values::InstructionOpcode::Alloca
    );
    assert!(scx.llmod.verify().is_ok());
}

#[test]
fn phi_merges_two_edges() {
    let ctx = Context::create();
    let scx = SimpleCx::new(&ctx, "phi");
    let mut irb = IrBuilder::new(&scx);
    let func = setup_builder(&mut irb);

    let cond = irb.get_param(func, 0);
    let entry = irb.current_block().unwrap();
    let other = irb.append_block(func, "other");
    let merge = irb.append_block(func, "merge");
    let yes = irb.const_bool(true);
    irb.cond_br(cond, merge, other);
    irb.position_at_end(other);
    let no = irb.const_bool(false);
    irb.br(merge);
    assert!(irb.block_has_terminator(other));

    irb.position_at_end(merge);
    let bool_ty = irb.bool_type();
    let phi = irb.phi(bool_ty, "merged");
    irb.add_phi_incoming(phi, &[(yes, entry), (no, other)]);
    let one = irb.const_i64(1);
    irb.ret(one);

    let ir = scx.llmod.print_to_string().to_string();
    assert!(ir.contains("%merged = phi i1 [ true, %entry ], [ false, %other ]"), "unexpected IR:\n{ir}");
    assert!(scx.llmod.verify().is_ok());
}
