//! HookRegistry - hook の登録と実行
//!
//! Hooks live in an arena and refer to their children by [`HookId`], so a
//! hook can be attached under several parents without shared ownership.

use serde::{Deserialize, Serialize};

use super::operation::Operation;
use super::relation::Relation;
use crate::domain::{HookId, HookParams};
use crate::error::HookError;

fn default_max_depth() -> usize {
    64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    /// Maximum nesting of hook invocations before giving up.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

struct HookNode {
    name: String,
    operation: Box<dyn Operation>,
    before: Vec<HookId>,
    instead: Vec<HookId>,
    after: Vec<HookId>,
}

impl HookNode {
    fn new(name: String, operation: Box<dyn Operation>) -> Self {
        Self {
            name,
            operation,
            before: Vec::new(),
            instead: Vec::new(),
            after: Vec::new(),
        }
    }

    fn children(&self, relation: Relation) -> &[HookId] {
        match relation {
            Relation::Before => &self.before,
            Relation::Instead => &self.instead,
            Relation::After => &self.after,
        }
    }

    fn children_mut(&mut self, relation: Relation) -> &mut Vec<HookId> {
        match relation {
            Relation::Before => &mut self.before,
            Relation::Instead => &mut self.instead,
            Relation::After => &mut self.after,
        }
    }
}

/// Arena of hooks.
///
/// # 使用例
/// ```ignore
/// let mut hooks = HookRegistry::new();
/// let save = hooks.add_root("save", infallible(|p| p));
/// hooks.add_child(save, "validate", validate_op, Relation::Before)?;
/// let params = hooks.invoke(save, HookParams::new().with_arg("id", 7))?;
/// ```
///
/// Design:
/// - Built during initialization (`&mut self`), invoked afterwards (`&self`),
///   so a finished registry can be shared behind an `Arc` without locks.
/// - `attach` refuses links that would close a cycle; `invoke` still tracks
///   the active path and a depth limit.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<HookNode>,
    config: HookConfig,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HookConfig) -> Self {
        Self {
            hooks: Vec::new(),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Register a hook with no parent.
    pub fn add_root(&mut self, name: impl Into<String>, operation: impl Operation + 'static) -> HookId {
        let id = HookId(self.hooks.len());
        self.hooks
            .push(HookNode::new(name.into(), Box::new(operation)));
        id
    }

    /// Create a hook and append it to `parent`'s `relation` list.
    pub fn add_child(
        &mut self,
        parent: HookId,
        name: impl Into<String>,
        operation: impl Operation + 'static,
        relation: Relation,
    ) -> Result<HookId, HookError> {
        self.node(parent)?;
        let child = self.add_root(name, operation);
        self.hooks[parent.0].children_mut(relation).push(child);
        Ok(child)
    }

    /// [`add_child`](Self::add_child) with the relation given by name
    /// (`"before"`, `"instead"` or `"after"`).
    pub fn add_child_named(
        &mut self,
        parent: HookId,
        name: impl Into<String>,
        operation: impl Operation + 'static,
        relation: &str,
    ) -> Result<HookId, HookError> {
        let relation = relation.parse::<Relation>()?;
        self.add_child(parent, name, operation, relation)
    }

    /// Link an existing hook under `parent`.
    ///
    /// Fails with [`HookError::Cycle`] if `parent` is reachable from `child`.
    pub fn attach(&mut self, parent: HookId, child: HookId, relation: Relation) -> Result<(), HookError> {
        self.node(parent)?;
        let child_node = self.node(child)?;
        if self.reaches(child, parent) {
            return Err(HookError::Cycle {
                hook: child_node.name.clone(),
            });
        }
        self.hooks[parent.0].children_mut(relation).push(child);
        Ok(())
    }

    /// First hook registered under `name`.
    pub fn find(&self, name: &str) -> Option<HookId> {
        self.hooks
            .iter()
            .position(|node| node.name == name)
            .map(HookId)
    }

    pub fn name(&self, id: HookId) -> Option<&str> {
        self.hooks.get(id.0).map(|node| node.name.as_str())
    }

    pub fn children(&self, id: HookId, relation: Relation) -> Option<&[HookId]> {
        self.hooks.get(id.0).map(|node| node.children(relation))
    }

    /// Run the hook chain rooted at `id`.
    ///
    /// 1. `before` children, folded left, if `params.before`
    /// 2. `instead` children if any (when `params.instead`), otherwise the
    ///    hook's own operation unless skipped
    /// 3. `after` children, folded left, if `params.after`
    ///
    /// Each gate is read from the params as they arrive at that step.
    /// `skip` is a one-shot request aimed at a single hook: the one receiving
    /// the params, or the one whose `before` handlers set it. It is cleared
    /// once consumed, so handlers and later hooks run normally.
    pub fn invoke(&self, id: HookId, params: HookParams) -> Result<HookParams, HookError> {
        let mut path = Vec::new();
        self.run(id, params, &mut path)
    }

    pub fn invoke_named(&self, name: &str, params: HookParams) -> Result<HookParams, HookError> {
        let id = self
            .find(name)
            .ok_or_else(|| HookError::NoSuchName(name.to_string()))?;
        self.invoke(id, params)
    }

    fn node(&self, id: HookId) -> Result<&HookNode, HookError> {
        self.hooks.get(id.0).ok_or(HookError::UnknownHook(id))
    }

    fn run(&self, id: HookId, params: HookParams, path: &mut Vec<HookId>) -> Result<HookParams, HookError> {
        let node = self.node(id)?;
        if path.contains(&id) {
            return Err(HookError::Cycle {
                hook: node.name.clone(),
            });
        }
        if path.len() >= self.config.max_depth {
            return Err(HookError::DepthExceeded {
                depth: self.config.max_depth,
            });
        }

        path.push(id);
        let result = self.run_stages(node, params, path);
        path.pop();
        result
    }

    fn run_stages(
        &self,
        node: &HookNode,
        mut params: HookParams,
        path: &mut Vec<HookId>,
    ) -> Result<HookParams, HookError> {
        // skip targets this hook only; handlers never see it
        let skip_requested = std::mem::take(&mut params.skip);
        if params.before {
            params = self.fold(node, Relation::Before, params, path)?;
        }
        let skip = skip_requested || std::mem::take(&mut params.skip);

        if !node.instead.is_empty() {
            if params.instead {
                params = self.fold(node, Relation::Instead, params, path)?;
            }
        } else if skip {
            tracing::trace!(hook = %node.name, "operation skipped");
        } else {
            tracing::trace!(hook = %node.name, "operation");
            params = node
                .operation
                .apply(params)
                .map_err(|source| HookError::Operation {
                    hook: node.name.clone(),
                    source,
                })?;
        }

        if params.after {
            params = self.fold(node, Relation::After, params, path)?;
        }
        Ok(params)
    }

    fn fold(
        &self,
        node: &HookNode,
        relation: Relation,
        params: HookParams,
        path: &mut Vec<HookId>,
    ) -> Result<HookParams, HookError> {
        let children = node.children(relation);
        if !children.is_empty() {
            tracing::trace!(hook = %node.name, %relation, count = children.len(), "running handlers");
        }
        // a skip raised by an earlier sibling belongs to `node`, not to the next child
        children.iter().try_fold(params, |mut params, &child| {
            let pending = std::mem::take(&mut params.skip);
            let mut params = self.run(child, params, path)?;
            params.skip |= pending;
            Ok(params)
        })
    }

    /// Is `target` reachable from `from` (inclusive)?
    fn reaches(&self, from: HookId, target: HookId) -> bool {
        let mut seen = vec![false; self.hooks.len()];
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            let Some(node) = self.hooks.get(id.0) else {
                continue;
            };
            if std::mem::replace(&mut seen[id.0], true) {
                continue;
            }
            for relation in Relation::ALL {
                stack.extend_from_slice(node.children(relation));
            }
        }
        false
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.hooks.iter().map(|node| node.name.as_str()).collect();
        f.debug_struct("HookRegistry")
            .field("hooks", &names)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::hooks::{fallible, infallible, passthrough};

    fn value(params: &HookParams) -> i64 {
        params.arg_as::<i64>("value").unwrap().unwrap()
    }

    fn add(n: i64) -> impl Operation {
        infallible(move |mut p| {
            let v = value(&p);
            p.set_arg("value", v + n);
            p
        })
    }

    fn double() -> impl Operation {
        infallible(|mut p| {
            let v = value(&p);
            p.set_arg("value", v * 2);
            p
        })
    }

    /// Appends `tag` to the `trace` array argument.
    fn tag(tag: &'static str) -> impl Operation {
        infallible(move |mut p| {
            let mut trace = p.arg_as::<Vec<String>>("trace").unwrap().unwrap_or_default();
            trace.push(tag.to_string());
            p.set_arg("trace", json!(trace));
            p
        })
    }

    fn trace(params: &HookParams) -> Vec<String> {
        params.arg_as("trace").unwrap().unwrap_or_default()
    }

    fn counting(counter: Arc<AtomicUsize>) -> impl Operation {
        infallible(move |p| {
            counter.fetch_add(1, Ordering::SeqCst);
            p
        })
    }

    #[test]
    fn no_handlers_is_the_operation_itself() {
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("double", double());
        let input = HookParams::new().with_arg("value", 21);

        let out = hooks.invoke(root, input.clone()).unwrap();
        let direct = double().apply(input).unwrap();
        assert_eq!(out, direct);
        assert_eq!(value(&out), 42);
    }

    #[test]
    fn before_then_operation() {
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("double", double());
        hooks
            .add_child(root, "increment", add(1), Relation::Before)
            .unwrap();

        let out = hooks
            .invoke(root, HookParams::new().with_arg("value", 5))
            .unwrap();
        assert_eq!(value(&out), 12);
    }

    #[test]
    fn stages_run_in_order_and_fold_left() {
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("op", tag("op"));
        hooks.add_child(root, "b1", tag("b1"), Relation::Before).unwrap();
        hooks.add_child(root, "b2", tag("b2"), Relation::Before).unwrap();
        hooks.add_child(root, "a1", tag("a1"), Relation::After).unwrap();
        hooks.add_child(root, "a2", tag("a2"), Relation::After).unwrap();

        let out = hooks.invoke(root, HookParams::new()).unwrap();
        assert_eq!(trace(&out), vec!["b1", "b2", "op", "a1", "a2"]);
    }

    #[test]
    fn instead_replaces_operation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("op", counting(calls.clone()));
        hooks.add_child(root, "i1", tag("i1"), Relation::Instead).unwrap();
        hooks.add_child(root, "i2", tag("i2"), Relation::Instead).unwrap();

        let out = hooks.invoke(root, HookParams::new()).unwrap();
        assert_eq!(trace(&out), vec!["i1", "i2"]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn closed_instead_gate_runs_neither_instead_nor_operation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("op", counting(calls.clone()));
        hooks.add_child(root, "i", tag("i"), Relation::Instead).unwrap();
        hooks.add_child(root, "a", tag("a"), Relation::After).unwrap();

        let params = HookParams {
            instead: false,
            ..HookParams::new()
        };
        let out = hooks.invoke(root, params).unwrap();
        assert_eq!(trace(&out), vec!["a"]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn closed_before_gate_only_skips_before_chain() {
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("op", tag("op"));
        hooks.add_child(root, "b", tag("b"), Relation::Before).unwrap();
        hooks.add_child(root, "a", tag("a"), Relation::After).unwrap();

        let params = HookParams {
            before: false,
            ..HookParams::new()
        };
        let out = hooks.invoke(root, params).unwrap();
        assert_eq!(trace(&out), vec!["op", "a"]);

        let other = hooks.add_root("other", tag("other"));
        hooks.add_child(other, "b", tag("b"), Relation::Before).unwrap();
        hooks.add_child(other, "i", tag("i"), Relation::Instead).unwrap();
        let params = HookParams {
            before: false,
            ..HookParams::new()
        };
        let out = hooks.invoke(other, params).unwrap();
        assert_eq!(trace(&out), vec!["i"]);
    }

    #[test]
    fn gates_are_read_when_each_stage_starts() {
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("op", tag("op"));
        hooks
            .add_child(
                root,
                "close-after",
                infallible(|mut p| {
                    p.after = false;
                    p
                }),
                Relation::Before,
            )
            .unwrap();
        hooks.add_child(root, "a", tag("a"), Relation::After).unwrap();

        let out = hooks.invoke(root, HookParams::new()).unwrap();
        assert_eq!(trace(&out), vec!["op"]);
        assert!(!out.after);
    }

    #[test]
    fn skip_suppresses_operation_but_not_handlers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("op", counting(calls.clone()));
        hooks
            .add_child(
                root,
                "request-skip",
                infallible(|mut p| {
                    p.skip = true;
                    p
                }),
                Relation::Before,
            )
            .unwrap();
        hooks.add_child(root, "a", tag("a"), Relation::After).unwrap();

        let out = hooks.invoke(root, HookParams::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(trace(&out), vec!["a"]);
        assert!(!out.skip);
    }

    #[test]
    fn skip_from_first_before_handler_reaches_the_parent() {
        let root_calls = Arc::new(AtomicUsize::new(0));
        let sibling_calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("op", counting(root_calls.clone()));
        hooks
            .add_child(
                root,
                "request-skip",
                infallible(|mut p| {
                    p.skip = true;
                    p
                }),
                Relation::Before,
            )
            .unwrap();
        hooks
            .add_child(root, "b2", counting(sibling_calls.clone()), Relation::Before)
            .unwrap();
        hooks.add_child(root, "a", tag("a"), Relation::After).unwrap();

        let out = hooks.invoke(root, HookParams::new()).unwrap();
        assert_eq!(root_calls.load(Ordering::SeqCst), 0);
        assert_eq!(sibling_calls.load(Ordering::SeqCst), 1);
        assert_eq!(trace(&out), vec!["a"]);
        assert!(!out.skip);
    }

    #[test]
    fn skip_on_entry_targets_the_invoked_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("op", counting(calls.clone()));
        hooks.add_child(root, "b", tag("b"), Relation::Before).unwrap();
        hooks.add_child(root, "a", tag("a"), Relation::After).unwrap();

        let params = HookParams::from_record(json!({"skip": true})).unwrap();
        let out = hooks.invoke(root, params).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(trace(&out), vec!["b", "a"]);

        let out = hooks.invoke(root, HookParams::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(trace(&out), vec!["b", "a"]);
    }

    #[test]
    fn hooks_nest() {
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("op", tag("op"));
        let before = hooks.add_child(root, "b", tag("b"), Relation::Before).unwrap();
        hooks
            .add_child(before, "b.before", tag("b.before"), Relation::Before)
            .unwrap();
        hooks
            .add_child(before, "b.after", tag("b.after"), Relation::After)
            .unwrap();

        let out = hooks.invoke(root, HookParams::new()).unwrap();
        assert_eq!(trace(&out), vec!["b.before", "b", "b.after", "op"]);
    }

    #[test]
    fn shared_hook_runs_under_each_parent() {
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("op", passthrough());
        let audit = hooks.add_root("audit", tag("audit"));
        hooks.attach(root, audit, Relation::Before).unwrap();
        hooks.attach(root, audit, Relation::After).unwrap();

        let out = hooks.invoke(root, HookParams::new()).unwrap();
        assert_eq!(trace(&out), vec!["audit", "audit"]);
    }

    #[test]
    fn attach_rejects_cycles() {
        let mut hooks = HookRegistry::new();
        let a = hooks.add_root("a", passthrough());
        let b = hooks.add_child(a, "b", passthrough(), Relation::After).unwrap();
        let c = hooks.add_child(b, "c", passthrough(), Relation::Before).unwrap();

        let err = hooks.attach(c, a, Relation::Instead).unwrap_err();
        assert!(matches!(err, HookError::Cycle { ref hook } if hook == "a"));
        let err = hooks.attach(a, a, Relation::Before).unwrap_err();
        assert!(matches!(err, HookError::Cycle { .. }));
        assert!(hooks.children(c, Relation::Instead).unwrap().is_empty());

        // still a tree, still runs
        hooks.invoke(a, HookParams::new()).unwrap();
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut hooks = HookRegistry::with_config(HookConfig { max_depth: 3 });
        let root = hooks.add_root("0", passthrough());
        let mut parent = root;
        for level in 1..=3 {
            parent = hooks
                .add_child(parent, level.to_string(), passthrough(), Relation::Before)
                .unwrap();
        }

        let err = hooks.invoke(root, HookParams::new()).unwrap_err();
        assert!(matches!(err, HookError::DepthExceeded { depth: 3 }));

        let inner = hooks.find("1").unwrap();
        hooks.invoke(inner, HookParams::new()).unwrap();
    }

    #[test]
    fn operation_error_aborts_chain() {
        let after_calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("op", passthrough());
        hooks
            .add_child(
                root,
                "reject",
                fallible(|_| Err("not allowed".into())),
                Relation::Before,
            )
            .unwrap();
        hooks
            .add_child(root, "a", counting(after_calls.clone()), Relation::After)
            .unwrap();

        let err = hooks.invoke(root, HookParams::new()).unwrap_err();
        match err {
            HookError::Operation { hook, source } => {
                assert_eq!(hook, "reject");
                assert_eq!(source.to_string(), "not allowed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn add_child_named_rejects_unknown_relation() {
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("op", passthrough());
        let err = hooks
            .add_child_named(root, "x", passthrough(), "around")
            .unwrap_err();
        assert!(matches!(err, HookError::UnknownRelation(ref r) if r == "around"));
        assert_eq!(hooks.len(), 1);

        let child = hooks
            .add_child_named(root, "x", passthrough(), "after")
            .unwrap();
        assert_eq!(hooks.children(root, Relation::After).unwrap(), &[child]);
    }

    #[test]
    fn unknown_ids_and_names() {
        let mut hooks = HookRegistry::new();
        let missing = HookId(7);
        assert!(matches!(
            hooks.add_child(missing, "x", passthrough(), Relation::Before),
            Err(HookError::UnknownHook(id)) if id == missing
        ));
        assert!(matches!(
            hooks.invoke(missing, HookParams::new()),
            Err(HookError::UnknownHook(_))
        ));
        assert!(matches!(
            hooks.invoke_named("nope", HookParams::new()),
            Err(HookError::NoSuchName(_))
        ));
        assert!(hooks.is_empty());
    }

    #[test]
    fn invoke_named_uses_first_match() {
        let mut hooks = HookRegistry::new();
        hooks.add_root("save", tag("first"));
        hooks.add_root("save", tag("second"));
        assert_eq!(hooks.find("save"), Some(HookId(0)));
        assert_eq!(hooks.name(HookId(1)), Some("save"));

        let out = hooks.invoke_named("save", HookParams::new()).unwrap();
        assert_eq!(trace(&out), vec!["first"]);
    }

    #[test]
    fn params_from_record_drive_the_chain() {
        let mut hooks = HookRegistry::new();
        let root = hooks.add_root("double", double());
        hooks.add_child(root, "inc", add(1), Relation::Before).unwrap();

        let params = HookParams::from_record(json!({
            "args": {"value": 5},
            "before": false,
        }))
        .unwrap();
        let out = hooks.invoke(root, params).unwrap();
        assert_eq!(value(&out), 10);
    }
}
