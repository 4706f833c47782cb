//! Rust source emission for a whole netlist.
//!
//! The generated translation unit carries the complete micro-step algorithm
//! with every index baked in: an inlined combinational sweep in topological
//! order, the sequential sample, the edge-detect/commit loop, and a batched
//! runner with `sub_cycles`, master-clock, sideband, and halt bindings as
//! constants. Value semantics match the reference evaluator formula for
//! formula.

use relay_ir::{mask, BinaryOp, Netlist, Node, SignalId, UnaryOp};

/// Everything baked into a generated module besides the netlist itself.
#[derive(Debug, Clone, Copy)]
pub struct BakedOptions {
    /// Micro-steps per nominal cycle.
    pub sub_cycles: u32,
    /// Master clock pulsed by the batch runner.
    pub master_clock: Option<SignalId>,
    /// Sideband input driven by the batch runner.
    pub sideband: Option<SignalId>,
    /// Halt signal ending batches early.
    pub halt: Option<SignalId>,
}

/// Emits the complete source text for `netlist`.
pub fn generate(netlist: &Netlist, baked: &BakedOptions) -> String {
    let mut out = String::new();
    let n_signals = netlist.signal_count();
    let n_staged = netlist.seq_assigns().len();
    let n_domains = netlist.domains().len();
    let n_mems = netlist.memories().len();

    out.push_str("#![allow(unused_variables, unused_mut, unused_parens, unused_unsafe)]\n\n");
    out.push_str(&format!("const NUM_SIGNALS: usize = {n_signals};\n"));
    out.push_str(&format!("const NUM_STAGED: usize = {n_staged};\n"));
    out.push_str(&format!("const NUM_DOMAINS: usize = {n_domains};\n"));
    out.push_str(&format!("const NUM_MEMS: usize = {n_mems};\n"));
    out.push_str(&format!("const SUB_CYCLES: u64 = {};\n\n", baked.sub_cycles));

    out.push_str("#[inline(always)]\n");
    out.push_str(
        "unsafe fn mem_slices<'a>(mems: *const *const u64) -> [&'a [u64]; NUM_MEMS] {\n    [\n",
    );
    for (i, mem) in netlist.memories().iter().enumerate() {
        out.push_str(&format!(
            "        std::slice::from_raw_parts(*mems.add({i}), {}),\n",
            mem.depth
        ));
    }
    out.push_str("    ]\n}\n\n");

    // Combinational sweep, straight-line in topological order.
    out.push_str("#[inline(always)]\n");
    out.push_str("fn evaluate_inline(s: &mut [u64], mems: &[&[u64]; NUM_MEMS]) {\n");
    for assign in netlist.assigns() {
        let target_mask = mask(netlist.signal(assign.target).width);
        out.push_str(&format!(
            "    s[{}] = ({} & {:#x}u64);\n",
            assign.target.index(),
            render(&assign.node, netlist),
            target_mask
        ));
    }
    out.push_str("}\n\n");

    out.push_str("#[inline(always)]\n");
    out.push_str("fn sample_inline(s: &[u64], staged: &mut [u64], mems: &[&[u64]; NUM_MEMS]) {\n");
    for (i, sa) in netlist.seq_assigns().iter().enumerate() {
        let target_mask = mask(netlist.signal(sa.target).width);
        out.push_str(&format!(
            "    staged[{i}] = ({} & {:#x}u64);\n",
            render(&sa.node, netlist),
            target_mask
        ));
    }
    out.push_str("}\n\n");

    // One micro-step: settle, sample, edge-detect, commit, bounded
    // re-settle for derived clocks, record clock levels.
    out.push_str("#[inline(always)]\n");
    out.push_str(
        "fn tick_inline(s: &mut [u64], staged: &mut [u64], prev: &mut [u64], \
         mems: &[&[u64]; NUM_MEMS]) {\n",
    );
    out.push_str("    evaluate_inline(s, mems);\n");
    out.push_str("    sample_inline(s, staged, mems);\n");
    out.push_str("    let mut committed = [false; NUM_STAGED];\n");
    out.push_str("    let mut edges: [bool; NUM_DOMAINS] = [\n");
    for (d, domain) in netlist.domains().iter().enumerate() {
        out.push_str(&format!(
            "        prev[{d}] == 0 && s[{}] != 0,\n",
            domain.clock.index()
        ));
    }
    out.push_str("    ];\n");
    out.push_str("    let mut iters = 0;\n");
    out.push_str("    while edges.iter().any(|&e| e) {\n");
    for (i, sa) in netlist.seq_assigns().iter().enumerate() {
        out.push_str(&format!(
            "        if edges[{}] && !committed[{i}] {{ s[{}] = staged[{i}]; committed[{i}] = true; }}\n",
            sa.domain,
            sa.target.index()
        ));
    }
    out.push_str("        let before: [u64; NUM_DOMAINS] = [\n");
    for domain in netlist.domains() {
        out.push_str(&format!("            s[{}],\n", domain.clock.index()));
    }
    out.push_str("        ];\n");
    out.push_str("        evaluate_inline(s, mems);\n");
    for (d, domain) in netlist.domains().iter().enumerate() {
        out.push_str(&format!(
            "        edges[{d}] = before[{d}] == 0 && s[{}] != 0;\n",
            domain.clock.index()
        ));
    }
    out.push_str("        iters += 1;\n");
    out.push_str("        if iters >= 10 { break; }\n");
    out.push_str("    }\n");
    for (d, domain) in netlist.domains().iter().enumerate() {
        out.push_str(&format!("    prev[{d}] = s[{}];\n", domain.clock.index()));
    }
    out.push_str("}\n\n");

    out.push_str("#[no_mangle]\n");
    out.push_str(
        "pub unsafe extern \"C\" fn evaluate(s: *mut u64, mems: *const *const u64) {\n\
         \x20   let s = std::slice::from_raw_parts_mut(s, NUM_SIGNALS);\n\
         \x20   let mems = mem_slices(mems);\n\
         \x20   evaluate_inline(s, &mems);\n\
         }\n\n",
    );

    out.push_str("#[no_mangle]\n");
    out.push_str(
        "pub unsafe extern \"C\" fn tick(s: *mut u64, staged: *mut u64, prev: *mut u64, \
         mems: *const *const u64) {\n\
         \x20   let s = std::slice::from_raw_parts_mut(s, NUM_SIGNALS);\n\
         \x20   let staged = std::slice::from_raw_parts_mut(staged, NUM_STAGED);\n\
         \x20   let prev = std::slice::from_raw_parts_mut(prev, NUM_DOMAINS);\n\
         \x20   let mems = mem_slices(mems);\n\
         \x20   tick_inline(s, staged, prev, &mems);\n\
         }\n\n",
    );

    // Batched runner: `cycles` nominal cycles of SUB_CYCLES pulses each.
    // Returns micro-steps actually run.
    out.push_str("#[no_mangle]\n");
    out.push_str(
        "pub unsafe extern \"C\" fn run_batch(s: *mut u64, staged: *mut u64, prev: *mut u64, \
         mems: *const *const u64, cycles: u64, sideband_value: u64, sideband_active: u8) -> u64 {\n",
    );
    out.push_str("    let s = std::slice::from_raw_parts_mut(s, NUM_SIGNALS);\n");
    out.push_str("    let staged = std::slice::from_raw_parts_mut(staged, NUM_STAGED);\n");
    out.push_str("    let prev = std::slice::from_raw_parts_mut(prev, NUM_DOMAINS);\n");
    out.push_str("    let mems = mem_slices(mems);\n");
    if let Some(sb) = baked.sideband {
        let width = netlist.signal(sb).width;
        out.push_str(&format!(
            "    s[{}] = (if sideband_active != 0 {{ sideband_value | {:#x}u64 }} \
             else {{ sideband_value }}) & {:#x}u64;\n",
            sb.index(),
            1u64 << (width - 1),
            mask(width)
        ));
    }
    out.push_str("    let mut run = 0u64;\n");
    out.push_str("    for _ in 0..cycles.saturating_mul(SUB_CYCLES) {\n");
    if let Some(clk) = baked.master_clock {
        out.push_str(&format!("        s[{}] = 0;\n", clk.index()));
        out.push_str("        evaluate_inline(s, &mems);\n");
        for (d, domain) in netlist.domains().iter().enumerate() {
            out.push_str(&format!(
                "        prev[{d}] = s[{}];\n",
                domain.clock.index()
            ));
        }
        out.push_str(&format!("        s[{}] = 1;\n", clk.index()));
    }
    out.push_str("        tick_inline(s, staged, prev, &mems);\n");
    out.push_str("        run += 1;\n");
    if let Some(halt) = baked.halt {
        out.push_str(&format!(
            "        if s[{}] != 0 {{ break; }}\n",
            halt.index()
        ));
    }
    out.push_str("    }\n");
    out.push_str("    run\n");
    out.push_str("}\n");

    out
}

/// Renders one expression as a self-contained Rust sub-expression.
fn render(node: &Node, netlist: &Netlist) -> String {
    match node {
        Node::Signal(id) => format!("s[{}]", id.index()),
        Node::Const(v) => format!("{v:#x}u64"),
        Node::Unary {
            op,
            operand,
            operand_width,
            width,
        } => {
            let x = render(operand, netlist);
            match op {
                UnaryOp::Not => format!("((!{x}) & {:#x}u64)", mask(*width)),
                UnaryOp::RedAnd => {
                    let om = mask(*operand_width);
                    format!("((({x} & {om:#x}u64) == {om:#x}u64) as u64)")
                }
                UnaryOp::RedOr => format!("(({x} != 0) as u64)"),
                UnaryOp::RedXor => format!("(({x}.count_ones() as u64) & 1)"),
            }
        }
        Node::Binary {
            op,
            lhs,
            rhs,
            width,
        } => {
            let l = render(lhs, netlist);
            let r = render(rhs, netlist);
            let m = mask(*width);
            let raw = match op {
                BinaryOp::And => format!("({l} & {r})"),
                BinaryOp::Or => format!("({l} | {r})"),
                BinaryOp::Xor => format!("({l} ^ {r})"),
                BinaryOp::Add => format!("{l}.wrapping_add({r})"),
                BinaryOp::Sub => format!("{l}.wrapping_sub({r})"),
                BinaryOp::Mul => format!("{l}.wrapping_mul({r})"),
                BinaryOp::Div => format!("(if {r} == 0 {{ 0 }} else {{ {l} / {r} }})"),
                BinaryOp::Mod => format!("(if {r} == 0 {{ 0 }} else {{ {l} % {r} }})"),
                BinaryOp::Shl => format!("({l} << {r}.min(63))"),
                BinaryOp::Shr => format!("({l} >> {r}.min(63))"),
                BinaryOp::Eq => format!("(({l} == {r}) as u64)"),
                BinaryOp::Ne => format!("(({l} != {r}) as u64)"),
                BinaryOp::Lt => format!("(({l} < {r}) as u64)"),
                BinaryOp::Gt => format!("(({l} > {r}) as u64)"),
                BinaryOp::Le => format!("(({l} <= {r}) as u64)"),
                BinaryOp::Ge => format!("(({l} >= {r}) as u64)"),
            };
            format!("({raw} & {m:#x}u64)")
        }
        Node::Mux {
            cond,
            when_true,
            when_false,
            width,
        } => format!(
            "((if {} != 0 {{ {} }} else {{ {} }}) & {:#x}u64)",
            render(cond, netlist),
            render(when_true, netlist),
            render(when_false, netlist),
            mask(*width)
        ),
        Node::Slice { base, low, width } => format!(
            "(({} >> {low}) & {:#x}u64)",
            render(base, netlist),
            mask(*width)
        ),
        Node::Concat { parts, width } => {
            let mut acc = String::from("0u64");
            for part in parts {
                let v = format!(
                    "({} & {:#x}u64)",
                    render(&part.node, netlist),
                    mask(part.width)
                );
                acc = if part.width >= 64 {
                    v
                } else {
                    format!("(({acc} << {}) | {v})", part.width)
                };
            }
            format!("({acc} & {:#x}u64)", mask(*width))
        }
        Node::MemRead {
            memory,
            addr,
            width,
        } => {
            let depth = netlist.memory(*memory).depth;
            format!(
                "(mems[{}][({} as usize) % {depth}] & {:#x}u64)",
                memory.index(),
                render(addr, netlist),
                mask(*width)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baked() -> BakedOptions {
        BakedOptions {
            sub_cycles: 14,
            master_clock: None,
            sideband: None,
            halt: None,
        }
    }

    #[test]
    fn generates_expected_shape() {
        let netlist = Netlist::parse(
            br#"{
                "ports": [ { "name": "a", "direction": "in", "width": 8 },
                           { "name": "y", "direction": "out", "width": 8 } ],
                "gates": [ { "target": "y", "expr": { "type": "unary_op", "op": "~",
                    "operand": { "type": "signal", "name": "a", "width": 8 },
                    "width": 8 } } ]
            }"#,
        )
        .unwrap();
        let src = generate(&netlist, &baked());
        assert!(src.contains("const NUM_SIGNALS: usize = 2;"));
        assert!(src.contains("const SUB_CYCLES: u64 = 14;"));
        assert!(src.contains("s[1] = (((!s[0]) & 0xffu64) & 0xffu64);"));
        assert!(src.contains("pub unsafe extern \"C\" fn run_batch"));
    }

    #[test]
    fn identical_inputs_generate_identical_source() {
        let json = br#"{ "nets": [ { "name": "n", "width": 4 } ],
            "gates": [ { "target": "n", "expr":
                { "type": "literal", "value": 5, "width": 4 } } ] }"#;
        let a = generate(&Netlist::parse(json).unwrap(), &baked());
        let b = generate(&Netlist::parse(json).unwrap(), &baked());
        assert_eq!(a, b);
    }

    #[test]
    fn baked_halt_emits_early_exit() {
        let netlist = Netlist::parse(
            br#"{ "ports": [ { "name": "stop", "direction": "in", "width": 1 } ] }"#,
        )
        .unwrap();
        let stop = netlist.lookup("stop").unwrap();
        let src = generate(
            &netlist,
            &BakedOptions {
                halt: Some(stop),
                ..baked()
            },
        );
        assert!(src.contains("if s[0] != 0 { break; }"));
    }
}
