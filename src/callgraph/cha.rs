//! Class Hierarchy Analysis (CHA) call-graph construction.
//!
//! CHA resolves a virtual or interface call to every concrete method that any
//! subtype of the declared class could dispatch to: the builder closes over
//! direct subclasses, subinterfaces and implementors, dispatching the
//! subsignature from each class in the closure. Static calls resolve to the
//! declared method, special calls dispatch from the declared class.
//! Unresolvable targets (abstract with no concrete override) are discarded.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::{
    callgraph::graph::{CallEdge, CallGraph},
    ir::{CallKind, MethodId, Stmt, StmtId},
    Program,
};

/// Builds a call graph by Class Hierarchy Analysis.
pub struct ChaBuilder<'a> {
    program: &'a Program,
}

impl<'a> ChaBuilder<'a> {
    /// Creates a builder over the given program.
    #[must_use]
    pub const fn new(program: &'a Program) -> Self {
        Self { program }
    }

    /// Builds the call graph reachable from `entry`.
    ///
    /// Traversal order does not affect the result: the reachable set and the
    /// edge set are closures of the resolution relation.
    #[must_use]
    pub fn build(&self, entry: MethodId) -> CallGraph<StmtId, MethodId> {
        let mut cg = CallGraph::new();
        cg.add_entry_method(entry);

        let mut queue: VecDeque<MethodId> = VecDeque::new();
        let mut processed: FxHashSet<MethodId> = FxHashSet::default();
        queue.push_back(entry);

        while let Some(method) = queue.pop_front() {
            if !processed.insert(method) {
                continue;
            }
            cg.add_reachable_method(method);
            let Some(body) = self.program.method(method).body() else {
                continue;
            };
            for &sid in &body.stmts {
                let Stmt::Invoke { kind, .. } = &self.program.stmt(sid).kind else {
                    continue;
                };
                cg.add_callsite(sid, method);
                for callee in self.resolve(sid) {
                    cg.add_edge(CallEdge {
                        kind: *kind,
                        callsite: sid,
                        callee,
                    });
                    queue.push_back(callee);
                }
            }
        }
        cg
    }

    /// Resolves the potential callees of a call site via CHA.
    #[must_use]
    pub fn resolve(&self, callsite: StmtId) -> Vec<MethodId> {
        let Stmt::Invoke {
            kind, method_ref, ..
        } = &self.program.stmt(callsite).kind
        else {
            return Vec::new();
        };

        let mut targets: Vec<MethodId> = Vec::new();
        let mut seen: FxHashSet<MethodId> = FxHashSet::default();
        let mut add = |target: Option<MethodId>, targets: &mut Vec<MethodId>| {
            if let Some(m) = target {
                if seen.insert(m) {
                    targets.push(m);
                }
            }
        };

        match kind {
            CallKind::Static => add(
                self.program
                    .class(method_ref.class)
                    .declared_method(method_ref.subsig),
                &mut targets,
            ),
            CallKind::Special => add(
                self.program.dispatch(method_ref.class, method_ref.subsig),
                &mut targets,
            ),
            CallKind::Virtual | CallKind::Interface => {
                // Closure over the hierarchy below the declared class.
                let mut queue = VecDeque::from([method_ref.class]);
                let mut visited = FxHashSet::default();
                while let Some(class) = queue.pop_front() {
                    if !visited.insert(class) {
                        continue;
                    }
                    add(self.program.dispatch(class, method_ref.subsig), &mut targets);
                    queue.extend(self.program.direct_subinterfaces_of(class));
                    queue.extend(self.program.direct_implementors_of(class));
                    queue.extend(self.program.direct_subclasses_of(class));
                }
            }
            CallKind::Dynamic => {
                log::warn!("dynamic call site {callsite} has no statically known targets");
            }
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{MethodFlags, ProgramBuilder};

    /// Interface I { m() }, class A implements I, class B extends A
    /// overriding m. Returns the program, the call-site-bearing entry and the
    /// two implementations.
    fn diamond() -> (Program, MethodId, MethodId, MethodId) {
        let mut pb = ProgramBuilder::new();
        let i = pb.add_interface("I", &[]);
        let a = pb.add_class("A", None);
        pb.add_implements(a, i);
        let b = pb.add_class("B", Some(a));

        let m_i = pb.declare_method(i, "m", &[], None, MethodFlags::ABSTRACT);
        let m_a = pb.declare_method(a, "m", &[], None, MethodFlags::empty());
        let m_b = pb.declare_method(b, "m", &[], None, MethodFlags::empty());
        for m in [m_a, m_b] {
            let mut body = pb.body(m);
            body.ret(None);
            body.seal().unwrap();
        }

        let main_class = pb.add_class("Main", None);
        let main = pb.declare_method(main_class, "main", &[], None, MethodFlags::STATIC);
        let i_ty = pb.class_type(i);
        let mut body = pb.body(main);
        let recv = body.var("recv", i_ty);
        body.call_instance(None, CallKind::Interface, recv, m_i, &[]);
        body.ret(None);
        body.seal().unwrap();

        (pb.finish(), main, m_a, m_b)
    }

    #[test]
    fn test_interface_call_resolves_all_implementations() {
        let (program, main, m_a, m_b) = diamond();
        let cg = ChaBuilder::new(&program).build(main);

        let callsite = cg.callsites_in(main)[0];
        let mut callees: Vec<_> = cg.callees_of(callsite).collect();
        callees.sort();
        assert_eq!(callees, vec![m_a, m_b]);
        assert!(cg.contains(m_a));
        assert!(cg.contains(m_b));
    }

    #[test]
    fn test_abstract_declarations_are_discarded() {
        let mut pb = ProgramBuilder::new();
        let i = pb.add_interface("I", &[]);
        let a = pb.add_class("A", None);
        pb.add_implements(a, i);
        let b = pb.add_class("B", Some(a));

        let m_i = pb.declare_method(i, "m", &[], None, MethodFlags::ABSTRACT);
        // A keeps m abstract, only B provides a concrete override.
        let _ = pb.declare_method(a, "m", &[], None, MethodFlags::ABSTRACT);
        let m_b = pb.declare_method(b, "m", &[], None, MethodFlags::empty());
        let mut body = pb.body(m_b);
        body.ret(None);
        body.seal().unwrap();

        let main_class = pb.add_class("Main", None);
        let main = pb.declare_method(main_class, "main", &[], None, MethodFlags::STATIC);
        let i_ty = pb.class_type(i);
        let mut body = pb.body(main);
        let recv = body.var("recv", i_ty);
        body.call_instance(None, CallKind::Interface, recv, m_i, &[]);
        body.ret(None);
        body.seal().unwrap();
        let program = pb.finish();

        let cg = ChaBuilder::new(&program).build(main);
        let callsite = cg.callsites_in(main)[0];
        assert_eq!(cg.callees_of(callsite).collect::<Vec<_>>(), vec![m_b]);
    }

    #[test]
    fn test_cha_is_deterministic() {
        let (program, main, _, _) = diamond();
        let cg1 = ChaBuilder::new(&program).build(main);
        let cg2 = ChaBuilder::new(&program).build(main);
        assert_eq!(cg1.reachable_methods(), cg2.reachable_methods());
        assert_eq!(cg1.edge_count(), cg2.edge_count());
    }
}
