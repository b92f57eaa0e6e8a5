//! Intra-procedural analysis integration tests.
//!
//! These exercise the public API end to end: build a program through
//! `ProgramBuilder`, construct the CFG, run the solvers and check facts at
//! interesting program points.

use irscope::prelude::*;

/// Creates a builder with an int type and a class to hang methods off.
fn fixture() -> (ProgramBuilder, TypeId, ClassId) {
    let mut pb = ProgramBuilder::new();
    let int = pb.primitive(PrimType::Int);
    let class = pb.add_class("Main", None);
    (pb, int, class)
}

fn solve_constants(program: &Program, method: MethodId) -> (Cfg, DataflowResult<CpFact>) {
    let cfg = Cfg::build(program, method);
    let result = DataflowSolver::new(ConstantPropagation::new(program)).solve(&cfg);
    (cfg, result)
}

#[test]
fn test_folding_in_the_presence_of_nac() {
    let (mut pb, int, class) = fixture();
    let m = pb.declare_method(class, "m", &[int], None, MethodFlags::STATIC);
    let mut b = pb.body(m);
    let p = b.param(0);
    let a = b.var("a", int);
    let two = b.var("two", int);
    let c = b.var("c", int);
    let d = b.var("d", int);
    // a = 10; c = a + p; d = a * 2
    b.assign_literal(a, 10);
    b.assign_literal(two, 2);
    b.assign_binary(c, BinaryOp::Add, a, p);
    b.assign_binary(d, BinaryOp::Mul, a, two);
    b.ret(None);
    b.seal().unwrap();
    let program = pb.finish();

    let (cfg, result) = solve_constants(&program, m);
    let exit = result.out_fact(cfg.exit());
    assert_eq!(exit.get(a), Value::Const(10));
    assert_eq!(exit.get(c), Value::Nac);
    assert_eq!(exit.get(d), Value::Const(20));

    // the parameter is NAC from the boundary on
    assert_eq!(result.in_fact(cfg.node_of_index(0)).get(p), Value::Nac);
}

#[test]
fn test_division_by_zero_never_fabricates_a_constant() {
    let (mut pb, int, class) = fixture();
    let m = pb.declare_method(class, "m", &[int], None, MethodFlags::STATIC);
    let mut b = pb.body(m);
    let p = b.param(0);
    let z = b.var("z", int);
    let q = b.var("q", int);
    let r = b.var("r", int);
    // z = 0; q = p / z; r = p % z
    b.assign_literal(z, 0);
    b.assign_binary(q, BinaryOp::Div, p, z);
    b.assign_binary(r, BinaryOp::Rem, p, z);
    b.ret(None);
    b.seal().unwrap();
    let program = pb.finish();

    let (cfg, result) = solve_constants(&program, m);
    let exit = result.out_fact(cfg.exit());
    assert_eq!(exit.get(q), Value::Undef);
    assert_eq!(exit.get(r), Value::Undef);
}

#[test]
fn test_booleans_behave_as_one_bit_integers() {
    let mut pb = ProgramBuilder::new();
    let int = pb.primitive(PrimType::Int);
    let boolean = pb.primitive(PrimType::Boolean);
    let class = pb.add_class("Main", None);
    let m = pb.declare_method(class, "m", &[], None, MethodFlags::STATIC);
    let mut b = pb.body(m);
    let one = b.var("one", int);
    let two = b.var("two", int);
    let lt = b.var("lt", boolean);
    let ge = b.var("ge", boolean);
    b.assign_literal(one, 1);
    b.assign_literal(two, 2);
    b.assign_binary(lt, BinaryOp::Lt, one, two);
    b.assign_binary(ge, BinaryOp::Ge, one, two);
    b.ret(None);
    b.seal().unwrap();
    let program = pb.finish();

    let (cfg, result) = solve_constants(&program, m);
    let exit = result.out_fact(cfg.exit());
    assert_eq!(exit.get(lt), Value::Const(1));
    assert_eq!(exit.get(ge), Value::Const(0));
}

#[test]
fn test_solving_twice_yields_identical_facts() {
    let (mut pb, int, class) = fixture();
    let m = pb.declare_method(class, "m", &[int], None, MethodFlags::STATIC);
    let mut b = pb.body(m);
    let p = b.param(0);
    let x = b.var("x", int);
    let y = b.var("y", int);
    // 0: x = 3
    // 1: if (p < x) goto 4
    // 2: y = x
    // 3: goto 5
    // 4: y = 7
    // 5: return
    b.assign_literal(x, 3);
    b.if_cmp(BinaryOp::Lt, p, x, 4);
    b.copy(y, x);
    b.goto(5);
    b.assign_literal(y, 7);
    b.ret(None);
    b.seal().unwrap();
    let program = pb.finish();

    let cfg = Cfg::build(&program, m);
    let first = DataflowSolver::new(ConstantPropagation::new(&program)).solve(&cfg);
    let second = DataflowSolver::new(ConstantPropagation::new(&program)).solve(&cfg);
    for node in 0..cfg.node_count() {
        assert_eq!(first.in_fact(node), second.in_fact(node));
        assert_eq!(first.out_fact(node), second.out_fact(node));
    }
    // both arms join: y is 3 on one path, 7 on the other
    assert_eq!(first.out_fact(cfg.exit()).get(y), Value::Nac);
}

#[test]
fn test_dead_branch_elimination() {
    let (mut pb, int, class) = fixture();
    let m = pb.declare_method(class, "m", &[], Some(int), MethodFlags::STATIC);
    let mut b = pb.body(m);
    let a = b.var("a", int);
    let c = b.var("c", int);
    let x = b.var("x", int);
    // 0: a = 1
    // 1: c = 2
    // 2: if (a < c) goto 5
    // 3: x = 2          <- dead: the guard folds to true
    // 4: goto 6         <- dead
    // 5: x = 1
    // 6: return x
    b.assign_literal(a, 1);
    b.assign_literal(c, 2);
    b.if_cmp(BinaryOp::Lt, a, c, 5);
    let dead_assign = b.assign_literal(x, 2);
    let dead_goto = b.goto(6);
    let live_assign = b.assign_literal(x, 1);
    b.ret(Some(x));
    b.seal().unwrap();
    let program = pb.finish();

    let cfg = Cfg::build(&program, m);
    let constants = DataflowSolver::new(ConstantPropagation::new(&program)).solve(&cfg);
    let live = DataflowSolver::new(LiveVariableAnalysis::new(&program)).solve(&cfg);
    let dead = DeadCodeDetection::new(&program).find(&cfg, &constants, &live);

    let body = program.method(m).body().unwrap();
    assert!(dead.contains(&body.stmts[dead_assign]));
    assert!(dead.contains(&body.stmts[dead_goto]));
    assert!(!dead.contains(&body.stmts[live_assign]));
}

#[test]
fn test_unused_assignment_detection() {
    let (mut pb, int, class) = fixture();
    let m = pb.declare_method(class, "m", &[], Some(int), MethodFlags::STATIC);
    let mut b = pb.body(m);
    let x = b.var("x", int);
    // 0: x = 1   <- dead: overwritten before any use
    // 1: x = 2
    // 2: return x
    let dead_assign = b.assign_literal(x, 1);
    let live_assign = b.assign_literal(x, 2);
    b.ret(Some(x));
    b.seal().unwrap();
    let program = pb.finish();

    let cfg = Cfg::build(&program, m);
    let constants = DataflowSolver::new(ConstantPropagation::new(&program)).solve(&cfg);
    let live = DataflowSolver::new(LiveVariableAnalysis::new(&program)).solve(&cfg);
    let dead = DeadCodeDetection::new(&program).find(&cfg, &constants, &live);

    let body = program.method(m).body().unwrap();
    assert_eq!(dead, vec![body.stmts[dead_assign]]);
    assert!(!dead.contains(&body.stmts[live_assign]));
}

#[test]
fn test_dead_assignment_with_side_effects_is_kept() {
    let mut pb = ProgramBuilder::new();
    let int = pb.primitive(PrimType::Int);
    let class = pb.add_class("Main", None);
    let c_ty = pb.class_type(class);
    let field = pb.add_field(class, "f", int, false);
    let m = pb.declare_method(class, "m", &[int], None, MethodFlags::STATIC);
    let mut b = pb.body(m);
    let p = b.param(0);
    let o = b.var("o", c_ty);
    let x = b.var("x", int);
    let y = b.var("y", int);
    let z = b.var("z", int);
    // none of x, y, z is ever read, but every right-hand side can trap or
    // touches the heap
    b.new_obj(o, c_ty);
    b.load_field(x, Some(o), field);
    b.assign_binary(y, BinaryOp::Div, p, p);
    b.assign_cast(z, c_ty, p);
    b.ret(None);
    b.seal().unwrap();
    let program = pb.finish();

    let cfg = Cfg::build(&program, m);
    let constants = DataflowSolver::new(ConstantPropagation::new(&program)).solve(&cfg);
    let live = DataflowSolver::new(LiveVariableAnalysis::new(&program)).solve(&cfg);
    let dead = DeadCodeDetection::new(&program).find(&cfg, &constants, &live);
    assert!(dead.is_empty());
}

#[test]
fn test_constant_switch_follows_single_case() {
    let (mut pb, int, class) = fixture();
    let m = pb.declare_method(class, "m", &[], Some(int), MethodFlags::STATIC);
    let mut b = pb.body(m);
    let s = b.var("s", int);
    let x = b.var("x", int);
    // 0: s = 2
    // 1: switch s { 1 -> 2, 2 -> 4, default -> 6 }
    // 2: x = 10          <- dead
    // 3: goto 7          <- dead
    // 4: x = 20
    // 5: goto 7
    // 6: x = 30          <- dead
    // 7: return x
    b.assign_literal(s, 2);
    b.switch(s, &[(1, 2), (2, 4)], 6);
    let case1 = b.assign_literal(x, 10);
    let goto1 = b.goto(7);
    let case2 = b.assign_literal(x, 20);
    b.goto(7);
    let default_case = b.assign_literal(x, 30);
    b.ret(Some(x));
    b.seal().unwrap();
    let program = pb.finish();

    let cfg = Cfg::build(&program, m);
    let constants = DataflowSolver::new(ConstantPropagation::new(&program)).solve(&cfg);
    let live = DataflowSolver::new(LiveVariableAnalysis::new(&program)).solve(&cfg);
    let dead = DeadCodeDetection::new(&program).find(&cfg, &constants, &live);

    let body = program.method(m).body().unwrap();
    assert!(dead.contains(&body.stmts[case1]));
    assert!(dead.contains(&body.stmts[goto1]));
    assert!(dead.contains(&body.stmts[default_case]));
    assert!(!dead.contains(&body.stmts[case2]));
}

#[test]
fn test_results_store_keyed_by_analysis_id() {
    let (mut pb, int, class) = fixture();
    let m = pb.declare_method(class, "m", &[], None, MethodFlags::STATIC);
    let mut b = pb.body(m);
    let x = b.var("x", int);
    b.assign_literal(x, 5);
    b.ret(None);
    b.seal().unwrap();
    let program = pb.finish();

    let cfg = Cfg::build(&program, m);
    let constants = DataflowSolver::new(ConstantPropagation::new(&program)).solve(&cfg);

    let mut store = ResultsStore::new();
    store.store("constprop", constants);
    let restored: &DataflowResult<CpFact> = store.get("constprop").unwrap();
    assert_eq!(restored.out_fact(cfg.exit()).get(x), Value::Const(5));
}
