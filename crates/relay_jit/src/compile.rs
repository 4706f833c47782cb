//! Cranelift translation of a linked netlist.
//!
//! Two functions are compiled per simulator: `evaluate` performs one
//! combinational sweep over the flat signal array, and `sample` fills the
//! sequential staging array. Both follow the reference evaluator's value
//! semantics instruction for instruction — every node is masked to its
//! width, division guards its divisor, shift amounts clamp to 63 — so the
//! compiled code is bit-exact with the interpreter by construction.

use std::mem;

use cranelift::prelude::*;
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{Linkage, Module};

use relay_harness::{Backend, SimError};
use relay_ir::{mask, BinaryOp, Netlist, Node, UnaryOp};

/// One combinational sweep: `fn(signals: *mut u64, mem_ptrs: *const *const u64)`.
pub type EvaluateFn = unsafe extern "C" fn(*mut u64, *const *const u64);

/// One sequential sample:
/// `fn(signals: *mut u64, staged: *mut u64, mem_ptrs: *const *const u64)`.
pub type SampleFn = unsafe extern "C" fn(*mut u64, *mut u64, *const *const u64);

fn compile_error(e: impl ToString) -> SimError {
    SimError::CompileFailure {
        backend: Backend::Jit,
        reason: e.to_string(),
    }
}

/// Compiles both functions for `netlist`, returning them together with the
/// module that owns the generated code.
pub fn compile(netlist: &Netlist) -> Result<(JITModule, EvaluateFn, SampleFn), SimError> {
    let mut flag_builder = settings::builder();
    flag_builder.set("opt_level", "speed").map_err(compile_error)?;
    flag_builder.set("is_pic", "false").map_err(compile_error)?;
    let isa = cranelift_native::builder()
        .map_err(compile_error)?
        .finish(settings::Flags::new(flag_builder))
        .map_err(compile_error)?;
    let builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
    let mut module = JITModule::new(builder);

    let evaluate_fn = compile_evaluate(&mut module, netlist)?;
    let sample_fn = compile_sample(&mut module, netlist)?;
    Ok((module, evaluate_fn, sample_fn))
}

fn compile_evaluate(module: &mut JITModule, netlist: &Netlist) -> Result<EvaluateFn, SimError> {
    let mut ctx = module.make_context();
    let pointer_type = module.target_config().pointer_type();

    let mut sig = module.make_signature();
    sig.params.push(AbiParam::new(pointer_type));
    sig.params.push(AbiParam::new(pointer_type));
    ctx.func.signature = sig;

    let func_id = module
        .declare_function("evaluate", Linkage::Export, &ctx.func.signature)
        .map_err(compile_error)?;

    let mut builder_ctx = FunctionBuilderContext::new();
    let mut builder = FunctionBuilder::new(&mut ctx.func, &mut builder_ctx);
    let entry = builder.create_block();
    builder.append_block_params_for_function_params(entry);
    builder.switch_to_block(entry);
    builder.seal_block(entry);

    let signals_ptr = builder.block_params(entry)[0];
    let mem_ptrs_base = builder.block_params(entry)[1];
    let mem_ptrs = load_mem_ptrs(&mut builder, pointer_type, mem_ptrs_base, netlist);

    // Assignments arrive already in topological order.
    for assign in netlist.assigns() {
        let cx = Cx {
            netlist,
            signals_ptr,
            mem_ptrs: &mem_ptrs,
        };
        let value = translate(&mut builder, &cx, &assign.node);
        let masked = band_mask(&mut builder, value, netlist.signal(assign.target).width);
        let offset = (assign.target.index() * 8) as i32;
        builder
            .ins()
            .store(MemFlags::trusted(), masked, signals_ptr, offset);
    }

    builder.ins().return_(&[]);
    builder.finalize();

    module.define_function(func_id, &mut ctx).map_err(compile_error)?;
    module.clear_context(&mut ctx);
    module.finalize_definitions().map_err(compile_error)?;

    let code = module.get_finalized_function(func_id);
    Ok(unsafe { mem::transmute::<*const u8, EvaluateFn>(code) })
}

fn compile_sample(module: &mut JITModule, netlist: &Netlist) -> Result<SampleFn, SimError> {
    let mut ctx = module.make_context();
    let pointer_type = module.target_config().pointer_type();

    let mut sig = module.make_signature();
    sig.params.push(AbiParam::new(pointer_type));
    sig.params.push(AbiParam::new(pointer_type));
    sig.params.push(AbiParam::new(pointer_type));
    ctx.func.signature = sig;

    let func_id = module
        .declare_function("sample", Linkage::Export, &ctx.func.signature)
        .map_err(compile_error)?;

    let mut builder_ctx = FunctionBuilderContext::new();
    let mut builder = FunctionBuilder::new(&mut ctx.func, &mut builder_ctx);
    let entry = builder.create_block();
    builder.append_block_params_for_function_params(entry);
    builder.switch_to_block(entry);
    builder.seal_block(entry);

    let signals_ptr = builder.block_params(entry)[0];
    let staged_ptr = builder.block_params(entry)[1];
    let mem_ptrs_base = builder.block_params(entry)[2];
    let mem_ptrs = load_mem_ptrs(&mut builder, pointer_type, mem_ptrs_base, netlist);

    for (i, sa) in netlist.seq_assigns().iter().enumerate() {
        let cx = Cx {
            netlist,
            signals_ptr,
            mem_ptrs: &mem_ptrs,
        };
        let value = translate(&mut builder, &cx, &sa.node);
        let masked = band_mask(&mut builder, value, netlist.signal(sa.target).width);
        let offset = (i * 8) as i32;
        builder
            .ins()
            .store(MemFlags::trusted(), masked, staged_ptr, offset);
    }

    builder.ins().return_(&[]);
    builder.finalize();

    module.define_function(func_id, &mut ctx).map_err(compile_error)?;
    module.clear_context(&mut ctx);
    module.finalize_definitions().map_err(compile_error)?;

    let code = module.get_finalized_function(func_id);
    Ok(unsafe { mem::transmute::<*const u8, SampleFn>(code) })
}

fn load_mem_ptrs(
    builder: &mut FunctionBuilder,
    pointer_type: Type,
    base: Value,
    netlist: &Netlist,
) -> Vec<Value> {
    (0..netlist.memories().len())
        .map(|i| {
            let offset = (i * 8) as i32;
            builder
                .ins()
                .load(pointer_type, MemFlags::trusted(), base, offset)
        })
        .collect()
}

struct Cx<'a> {
    netlist: &'a Netlist,
    signals_ptr: Value,
    mem_ptrs: &'a [Value],
}

fn band_mask(builder: &mut FunctionBuilder, value: Value, width: u32) -> Value {
    let mask_val = builder.ins().iconst(types::I64, mask(width) as i64);
    builder.ins().band(value, mask_val)
}

fn bool_to_i64(builder: &mut FunctionBuilder, b: Value) -> Value {
    builder.ins().uextend(types::I64, b)
}

/// Clamps a shift amount to 63, mirroring the evaluator's `r.min(63)`.
fn clamp_shift(builder: &mut FunctionBuilder, amount: Value) -> Value {
    let c63 = builder.ins().iconst(types::I64, 63);
    let over = builder
        .ins()
        .icmp(IntCC::UnsignedGreaterThan, amount, c63);
    builder.ins().select(over, c63, amount)
}

fn translate(builder: &mut FunctionBuilder, cx: &Cx<'_>, node: &Node) -> Value {
    match node {
        Node::Signal(id) => {
            let offset = (id.index() * 8) as i32;
            builder
                .ins()
                .load(types::I64, MemFlags::trusted(), cx.signals_ptr, offset)
        }
        Node::Const(v) => builder.ins().iconst(types::I64, *v as i64),
        Node::Unary {
            op,
            operand,
            operand_width,
            width,
        } => {
            let src = translate(builder, cx, operand);
            match op {
                UnaryOp::Not => {
                    let inverted = builder.ins().bnot(src);
                    band_mask(builder, inverted, *width)
                }
                UnaryOp::RedAnd => {
                    let op_mask = builder
                        .ins()
                        .iconst(types::I64, mask(*operand_width) as i64);
                    let masked = builder.ins().band(src, op_mask);
                    let all_set = builder.ins().icmp(IntCC::Equal, masked, op_mask);
                    bool_to_i64(builder, all_set)
                }
                UnaryOp::RedOr => {
                    let zero = builder.ins().iconst(types::I64, 0);
                    let any = builder.ins().icmp(IntCC::NotEqual, src, zero);
                    bool_to_i64(builder, any)
                }
                UnaryOp::RedXor => {
                    let ones = builder.ins().popcnt(src);
                    let one = builder.ins().iconst(types::I64, 1);
                    builder.ins().band(ones, one)
                }
            }
        }
        Node::Binary {
            op,
            lhs,
            rhs,
            width,
        } => {
            let l = translate(builder, cx, lhs);
            let r = translate(builder, cx, rhs);
            let raw = match op {
                BinaryOp::And => builder.ins().band(l, r),
                BinaryOp::Or => builder.ins().bor(l, r),
                BinaryOp::Xor => builder.ins().bxor(l, r),
                BinaryOp::Add => builder.ins().iadd(l, r),
                BinaryOp::Sub => builder.ins().isub(l, r),
                BinaryOp::Mul => builder.ins().imul(l, r),
                BinaryOp::Div | BinaryOp::Mod => {
                    let zero = builder.ins().iconst(types::I64, 0);
                    let one = builder.ins().iconst(types::I64, 1);
                    let is_zero = builder.ins().icmp(IntCC::Equal, r, zero);
                    let safe_r = builder.ins().select(is_zero, one, r);
                    let result = match op {
                        BinaryOp::Div => builder.ins().udiv(l, safe_r),
                        _ => builder.ins().urem(l, safe_r),
                    };
                    builder.ins().select(is_zero, zero, result)
                }
                BinaryOp::Shl => {
                    let amount = clamp_shift(builder, r);
                    builder.ins().ishl(l, amount)
                }
                BinaryOp::Shr => {
                    let amount = clamp_shift(builder, r);
                    builder.ins().ushr(l, amount)
                }
                BinaryOp::Eq => {
                    let b = builder.ins().icmp(IntCC::Equal, l, r);
                    bool_to_i64(builder, b)
                }
                BinaryOp::Ne => {
                    let b = builder.ins().icmp(IntCC::NotEqual, l, r);
                    bool_to_i64(builder, b)
                }
                BinaryOp::Lt => {
                    let b = builder.ins().icmp(IntCC::UnsignedLessThan, l, r);
                    bool_to_i64(builder, b)
                }
                BinaryOp::Gt => {
                    let b = builder.ins().icmp(IntCC::UnsignedGreaterThan, l, r);
                    bool_to_i64(builder, b)
                }
                BinaryOp::Le => {
                    let b = builder.ins().icmp(IntCC::UnsignedLessThanOrEqual, l, r);
                    bool_to_i64(builder, b)
                }
                BinaryOp::Ge => {
                    let b = builder.ins().icmp(IntCC::UnsignedGreaterThanOrEqual, l, r);
                    bool_to_i64(builder, b)
                }
            };
            band_mask(builder, raw, *width)
        }
        Node::Mux {
            cond,
            when_true,
            when_false,
            width,
        } => {
            let c = translate(builder, cx, cond);
            let t = translate(builder, cx, when_true);
            let f = translate(builder, cx, when_false);
            let zero = builder.ins().iconst(types::I64, 0);
            let picked_true = builder.ins().icmp(IntCC::NotEqual, c, zero);
            let picked = builder.ins().select(picked_true, t, f);
            band_mask(builder, picked, *width)
        }
        Node::Slice { base, low, width } => {
            let src = translate(builder, cx, base);
            let amount = builder.ins().iconst(types::I64, i64::from(*low));
            let shifted = builder.ins().ushr(src, amount);
            band_mask(builder, shifted, *width)
        }
        Node::Concat { parts, width } => {
            let mut acc = builder.ins().iconst(types::I64, 0);
            for part in parts {
                let value = translate(builder, cx, &part.node);
                let masked = band_mask(builder, value, part.width);
                acc = if part.width >= 64 {
                    masked
                } else {
                    let amount = builder.ins().iconst(types::I64, i64::from(part.width));
                    let shifted = builder.ins().ishl(acc, amount);
                    builder.ins().bor(shifted, masked)
                };
            }
            band_mask(builder, acc, *width)
        }
        Node::MemRead {
            memory,
            addr,
            width,
        } => {
            let depth = cx.netlist.memory(*memory).depth;
            let addr_val = translate(builder, cx, addr);
            let depth_val = builder.ins().iconst(types::I64, depth as i64);
            let bounded = builder.ins().urem(addr_val, depth_val);
            let eight = builder.ins().iconst(types::I64, 8);
            let byte_offset = builder.ins().imul(bounded, eight);
            let elem_ptr = builder.ins().iadd(cx.mem_ptrs[memory.index()], byte_offset);
            let loaded = builder
                .ins()
                .load(types::I64, MemFlags::trusted(), elem_ptr, 0);
            band_mask(builder, loaded, *width)
        }
    }
}
