// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The realm: module map, job queue and evaluator.

use crate::compiler::{self, Expression, ImportBinding, ModuleUnit, Statement, StatementKind};
use crate::error::{ErrorKind, Exception};
use crate::job::{JobQueue, JobStatus, Promise};
use crate::loader::ModuleLoader;
use crate::module::{ModuleBody, ModuleId, ModuleRecord, ModuleStatus};
use crate::name::ModuleName;
use crate::value::{JsObject, Value};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

/// An isolated script world.
///
/// A realm owns every module record it creates. Records are addressed by
/// [`ModuleId`]; a record becomes visible to imports only once it is
/// registered under a [`ModuleName`], and at most one record is ever
/// registered per name.
pub struct Realm {
    modules: Vec<Option<ModuleRecord>>,
    registry: FxHashMap<ModuleName, ModuleId>,
    jobs: JobQueue,
    globals: JsObject,
    loader: Option<Rc<dyn ModuleLoader>>,
}

/// Whether a queued module body can run yet.
enum Readiness {
    Ready,
    /// A dependency belongs to an evaluation still in flight.
    Wait,
    /// These modules must run first, in order.
    Adopt(Vec<ModuleId>),
}

/// Bindings visible to one module body.
struct Scope<'a> {
    bindings: FxHashMap<String, Value>,
    import_meta: &'a JsObject,
}

impl Realm {
    /// Creates a realm with the standard globals installed.
    pub fn new() -> Self {
        let globals = JsObject::new();
        for kind in ErrorKind::ALL {
            globals.set(kind.name(), error_constructor(kind));
        }
        Self {
            modules: Vec::new(),
            registry: FxHashMap::default(),
            jobs: JobQueue::new(),
            globals,
            loader: None,
        }
    }

    /// Installs the module loader consulted for every unresolved import.
    pub fn set_module_loader(&mut self, loader: Rc<dyn ModuleLoader>) {
        self.loader = Some(loader);
    }

    /// The global object.
    pub fn globals(&self) -> &JsObject {
        &self.globals
    }

    // ========================================================================
    // Module records
    // ========================================================================

    /// Compiles source text into a new, unregistered module.
    pub fn compile_module(
        &mut self,
        name: &ModuleName,
        source: &str,
    ) -> Result<ModuleId, Exception> {
        let unit = compiler::compile(name, source)?;
        Ok(self.insert(ModuleRecord::new(name.clone(), ModuleBody::Source(Rc::new(unit)))))
    }

    /// Creates a new, unregistered module whose exports are fixed values.
    pub fn synthetic_module(
        &mut self,
        name: &ModuleName,
        exports: Vec<(String, Value)>,
    ) -> ModuleId {
        self.insert(ModuleRecord::new(name.clone(), ModuleBody::Synthetic(exports)))
    }

    fn insert(&mut self, record: ModuleRecord) -> ModuleId {
        let id = ModuleId(self.modules.len());
        tracing::trace!(module = %record.name, %id, "module created");
        self.modules.push(Some(record));
        id
    }

    /// Looks up a live module record.
    pub fn module(&self, id: ModuleId) -> Option<&ModuleRecord> {
        self.modules.get(id.0).and_then(Option::as_ref)
    }

    fn record(&self, id: ModuleId) -> Result<&ModuleRecord, Exception> {
        self.module(id)
            .ok_or_else(|| Exception::reference_error(format!("module {} has been released", id)))
    }

    fn record_mut(&mut self, id: ModuleId) -> Result<&mut ModuleRecord, Exception> {
        self.modules
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| Exception::reference_error(format!("module {} has been released", id)))
    }

    /// The module's `import.meta` object.
    pub fn import_meta(&self, id: ModuleId) -> Result<JsObject, Exception> {
        Ok(self.record(id)?.import_meta.clone())
    }

    /// The module's namespace object.
    pub fn namespace(&self, id: ModuleId) -> Result<JsObject, Exception> {
        Ok(self.record(id)?.namespace.clone())
    }

    /// Discards a module that was never registered.
    pub fn release_module(&mut self, id: ModuleId) -> Result<(), Exception> {
        let record = self.record(id)?;
        if record.registered {
            return Err(Exception::type_error(format!(
                "module '{}' is registered and cannot be released",
                record.name
            )));
        }
        tracing::trace!(module = %record.name, %id, "module released");
        self.modules[id.0] = None;
        Ok(())
    }

    /// Makes a module visible to imports under `name`.
    pub fn register_module(&mut self, name: ModuleName, id: ModuleId) -> Result<(), Exception> {
        if self.registry.contains_key(&name) {
            return Err(Exception::type_error(format!("module '{}' is already registered", name)));
        }
        let record = self.record_mut(id)?;
        if record.registered {
            return Err(Exception::type_error(format!(
                "module '{}' is already registered under another name",
                record.name
            )));
        }
        record.registered = true;
        tracing::debug!(module = %name, %id, "module registered");
        self.registry.insert(name, id);
        Ok(())
    }

    /// The module registered under `name`.
    pub fn module_id(&self, name: &ModuleName) -> Option<ModuleId> {
        self.registry.get(name).copied()
    }

    /// Returns true if a module is registered under `name`.
    pub fn has_module(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// Number of registered modules.
    pub fn module_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of records not yet released, registered or not.
    pub fn live_module_count(&self) -> usize {
        self.modules.iter().filter(|slot| slot.is_some()).count()
    }

    /// Resolves `specifier` against `base` and returns the registered module
    /// for the result, loading and registering it first if necessary.
    pub fn resolve_and_load(
        &mut self,
        specifier: &str,
        base: &ModuleName,
    ) -> Result<ModuleId, Exception> {
        let loader = self.loader.clone().ok_or_else(|| {
            Exception::type_error(format!(
                "cannot import '{}': no module loader installed",
                specifier
            ))
        })?;
        let name = loader.resolve(self, base, specifier)?;
        if let Some(id) = self.module_id(&name) {
            return Ok(id);
        }
        let id = loader.load(self, &name)?;
        self.register_module(name, id)?;
        Ok(id)
    }

    // ========================================================================
    // Linking and evaluation
    // ========================================================================

    /// Links `id` and its dependency graph, then schedules evaluation.
    ///
    /// Linking happens synchronously: resolution or missing-export failures
    /// are returned directly. Each module body then runs in its own job,
    /// dependencies first; the returned promise settles once the last body
    /// has run or the first one throws.
    pub fn evaluate(&mut self, id: ModuleId) -> Result<Promise, Exception> {
        self.evaluate_with(id, Value::Undefined)
    }

    /// Dynamic `import()`: resolves, loads and evaluates `specifier`.
    ///
    /// The promise fulfills with the module's namespace object.
    pub fn import(&mut self, specifier: &str, base: &ModuleName) -> Promise {
        let scheduled = self.resolve_and_load(specifier, base).and_then(|id| {
            let namespace = self.namespace(id)?;
            self.evaluate_with(id, Value::Object(namespace))
        });
        scheduled.unwrap_or_else(Promise::rejected)
    }

    fn evaluate_with(&mut self, id: ModuleId, completion: Value) -> Result<Promise, Exception> {
        let mut visited = FxHashSet::default();
        let mut order = Vec::new();
        self.link(id, &mut visited, &mut order)?;

        let mut pending = VecDeque::new();
        for module in order {
            let record = self.record_mut(module)?;
            if matches!(record.status, ModuleStatus::Linked) {
                record.status = ModuleStatus::Evaluating;
                pending.push_back(module);
            }
        }

        let promise = Promise::pending();
        self.schedule(id, pending, promise.clone(), completion);
        Ok(promise)
    }

    fn link(
        &mut self,
        id: ModuleId,
        visited: &mut FxHashSet<ModuleId>,
        order: &mut Vec<ModuleId>,
    ) -> Result<(), Exception> {
        if !visited.insert(id) {
            return Ok(());
        }

        let record = self.record(id)?;
        let name = record.name.clone();
        let unit = match (&record.status, &record.body) {
            (ModuleStatus::Errored(exception), _) => return Err(exception.clone()),
            (ModuleStatus::Evaluating | ModuleStatus::Evaluated, _) => return Ok(()),
            (_, ModuleBody::Synthetic(_)) => {
                order.push(id);
                return Ok(());
            }
            (_, ModuleBody::Source(unit)) => Rc::clone(unit),
        };

        if matches!(record.status, ModuleStatus::Unlinked) {
            let mut dependencies = Vec::with_capacity(unit.imports.len());
            for import in &unit.imports {
                let dependency = self
                    .resolve_and_load(&import.specifier, &name)
                    .map_err(|e| e.with_frame(format!("{}:{}", name, import.line)))?;
                dependencies.push(dependency);
            }
            let record = self.record_mut(id)?;
            record.dependencies = dependencies;
            record.status = ModuleStatus::Linked;
        }

        let dependencies = self.record(id)?.dependencies.clone();
        for (import, &dependency) in unit.imports.iter().zip(&dependencies) {
            self.link(dependency, visited, order)?;

            let target = self.record(dependency)?;
            for binding in &import.bindings {
                let wanted = match binding {
                    ImportBinding::Default(_) => "default",
                    ImportBinding::Named { imported, .. } => imported.as_str(),
                    ImportBinding::Namespace(_) => continue,
                };
                if !target.exports(wanted) {
                    return Err(Exception::syntax_error(format!(
                        "The requested module '{}' does not provide an export named '{}'",
                        import.specifier, wanted
                    ))
                    .with_frame(format!("{}:{}", name, import.line)));
                }
            }
        }

        order.push(id);
        Ok(())
    }

    /// Runs `pending` one body per job, then settles `promise` once `root`
    /// has been evaluated.
    fn schedule(
        &mut self,
        root: ModuleId,
        mut pending: VecDeque<ModuleId>,
        promise: Promise,
        completion: Value,
    ) {
        self.jobs.enqueue(Box::new(move |realm: &mut Realm| {
            let Some(id) = pending.pop_front() else {
                // Nothing left to run here, but another evaluation may own `root`.
                match realm.record(root).map(|record| record.status.clone()) {
                    Ok(ModuleStatus::Evaluating) => {
                        realm.schedule(root, pending, promise, completion)
                    }
                    Ok(ModuleStatus::Linked) => {
                        // Reset by a failed evaluation; run it here instead.
                        if let Ok(record) = realm.record_mut(root) {
                            record.status = ModuleStatus::Evaluating;
                        }
                        pending.push_back(root);
                        realm.schedule(root, pending, promise, completion);
                    }
                    Ok(ModuleStatus::Errored(exception)) | Err(exception) => {
                        promise.reject(exception)
                    }
                    Ok(_) => promise.fulfill(completion),
                }
                return Ok(());
            };
            let result = match realm.readiness(id, &pending) {
                Ok(Readiness::Ready) => realm.run_module(id),
                Ok(Readiness::Wait) => {
                    // Requeue behind the evaluation that owns the dependency.
                    pending.push_front(id);
                    realm.schedule(root, pending, promise, completion);
                    return Ok(());
                }
                Ok(Readiness::Adopt(adopted)) => {
                    pending.push_front(id);
                    for module in adopted.into_iter().rev() {
                        pending.push_front(module);
                    }
                    realm.schedule(root, pending, promise, completion);
                    return Ok(());
                }
                Err(exception) => {
                    pending.push_front(id);
                    Err(exception)
                }
            };
            match result {
                Ok(()) if pending.is_empty() => promise.fulfill(completion),
                Ok(()) => realm.schedule(root, pending, promise, completion),
                Err(exception) => {
                    for rest in pending {
                        if let Ok(record) = realm.record_mut(rest) {
                            record.status = ModuleStatus::Linked;
                        }
                    }
                    promise.reject(exception);
                }
            }
            Ok(())
        }));
    }

    /// Checks whether every dependency of `id` has run.
    ///
    /// `pending` is the rest of the evaluation `id` belongs to. A dependency
    /// still evaluating elsewhere means waiting; one that was reset after a
    /// failed evaluation is linked again and adopted into this one.
    fn readiness(
        &mut self,
        id: ModuleId,
        pending: &VecDeque<ModuleId>,
    ) -> Result<Readiness, Exception> {
        let mut visited = FxHashSet::default();
        let mut adopted = Vec::new();
        for dependency in self.record(id)?.dependencies.clone() {
            match self.record(dependency)?.status.clone() {
                ModuleStatus::Evaluated => {}
                ModuleStatus::Errored(exception) => return Err(exception),
                ModuleStatus::Evaluating if dependency == id || pending.contains(&dependency) => {}
                ModuleStatus::Evaluating => return Ok(Readiness::Wait),
                ModuleStatus::Unlinked | ModuleStatus::Linked => {
                    self.link(dependency, &mut visited, &mut adopted)?;
                }
            }
        }
        if adopted.is_empty() {
            return Ok(Readiness::Ready);
        }

        for &module in &adopted {
            self.record_mut(module)?.status = ModuleStatus::Evaluating;
        }
        Ok(Readiness::Adopt(adopted))
    }

    fn run_module(&mut self, id: ModuleId) -> Result<(), Exception> {
        let record = self.record(id)?;
        let name = record.name.clone();
        let body = record.body.clone();
        let namespace = record.namespace.clone();
        let import_meta = record.import_meta.clone();
        let dependencies = record.dependencies.clone();

        tracing::trace!(module = %name, "evaluating module");
        let result = match body {
            ModuleBody::Synthetic(exports) => {
                for (key, value) in exports {
                    namespace.set(key, value);
                }
                Ok(())
            }
            ModuleBody::Source(unit) => {
                self.run_unit(&name, &unit, &dependencies, &namespace, &import_meta)
            }
        };

        let record = self.record_mut(id)?;
        record.status = match &result {
            Ok(()) => ModuleStatus::Evaluated,
            Err(exception) => ModuleStatus::Errored(exception.clone()),
        };
        result
    }

    fn run_unit(
        &mut self,
        name: &ModuleName,
        unit: &ModuleUnit,
        dependencies: &[ModuleId],
        namespace: &JsObject,
        import_meta: &JsObject,
    ) -> Result<(), Exception> {
        let mut scope = Scope {
            bindings: FxHashMap::default(),
            import_meta,
        };

        for (import, &dependency) in unit.imports.iter().zip(dependencies) {
            let source = self.namespace(dependency)?;
            for binding in &import.bindings {
                let value = match binding {
                    ImportBinding::Default(_) => source.get("default"),
                    ImportBinding::Named { imported, .. } => source.get(imported),
                    ImportBinding::Namespace(_) => Value::Object(source.clone()),
                };
                scope.bindings.insert(binding.local().to_string(), value);
            }
        }

        // `export { a as b }` may precede the declaration of `a`.
        let mut deferred = Vec::new();
        for statement in &unit.body {
            self.run_statement(statement, &mut scope, namespace, &mut deferred)
                .map_err(|e| e.with_frame(format!("{}:{}", name, statement.line)))?;
        }
        for (local, exported) in deferred {
            let value = scope.bindings.get(&local).cloned().unwrap_or_default();
            namespace.set(exported, value);
        }
        Ok(())
    }

    fn run_statement(
        &mut self,
        statement: &Statement,
        scope: &mut Scope<'_>,
        namespace: &JsObject,
        deferred: &mut Vec<(String, String)>,
    ) -> Result<(), Exception> {
        match &statement.kind {
            StatementKind::Const { name, init, exported } => {
                let value = self.eval(init, scope)?;
                if *exported {
                    namespace.set(name.clone(), value.clone());
                }
                scope.bindings.insert(name.clone(), value);
            }
            StatementKind::ExportDefault(expr) => {
                let value = self.eval(expr, scope)?;
                namespace.set("default", value);
            }
            StatementKind::ExportNamed(list) => deferred.extend(list.iter().cloned()),
            StatementKind::Throw(expr) => return Err(Exception::throw(self.eval(expr, scope)?)),
            StatementKind::Expression(expr) => {
                self.eval(expr, scope)?;
            }
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expression, scope: &Scope<'_>) -> Result<Value, Exception> {
        Ok(match expr {
            Expression::Undefined => Value::Undefined,
            Expression::Null => Value::Null,
            Expression::Boolean(b) => Value::Boolean(*b),
            Expression::Number(n) => Value::Number(*n),
            Expression::String(s) => Value::string(s.as_str()),
            Expression::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::array(values)
            }
            Expression::Object(props) => {
                let obj = JsObject::new();
                for (key, value) in props {
                    let value = self.eval(value, scope)?;
                    obj.set(key.clone(), value);
                }
                Value::Object(obj)
            }
            Expression::Identifier(id) => self.lookup(id, scope)?,
            Expression::ImportMeta => Value::Object(scope.import_meta.clone()),
            Expression::Member(object, key) => self.eval(object, scope)?.get(key)?,
            Expression::Call(callee, args) => {
                let function = self.eval(callee, scope)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(&function, &args)?
            }
        })
    }

    fn lookup(&self, id: &str, scope: &Scope<'_>) -> Result<Value, Exception> {
        if let Some(value) = scope.bindings.get(id) {
            return Ok(value.clone());
        }
        if id == "globalThis" {
            return Ok(Value::Object(self.globals.clone()));
        }
        if self.globals.has(id) {
            return Ok(self.globals.get(id));
        }
        Err(Exception::reference_error(format!("{} is not defined", id)))
    }

    /// Calls a function value.
    pub fn call(&mut self, function: &Value, args: &[Value]) -> Result<Value, Exception> {
        match function {
            Value::Function(func) => {
                let func = Arc::clone(func);
                func.call(self, args)
            }
            other => Err(Exception::type_error(format!("{} is not a function", other))),
        }
    }

    // ========================================================================
    // Jobs
    // ========================================================================

    /// Runs the oldest pending job, if any.
    pub fn execute_pending_job(&mut self) -> JobStatus {
        match self.jobs.pop() {
            None => JobStatus::Idle,
            Some(job) => match job(self) {
                Ok(()) => JobStatus::Ran,
                Err(exception) => JobStatus::Failed(exception),
            },
        }
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Realm {
    fn drop(&mut self) {
        tracing::debug!(
            modules = self.registry.len(),
            pending_jobs = self.jobs.len(),
            "realm destroyed"
        );
    }
}

impl std::fmt::Debug for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Realm")
            .field("modules", &self.registry.len())
            .field("jobs", &self.jobs)
            .finish()
    }
}

fn error_constructor(kind: ErrorKind) -> Value {
    Value::native(kind.name(), move |_, args| {
        let message = match args.first() {
            None | Some(Value::Undefined) => String::new(),
            Some(value) => value.to_string(),
        };
        Ok(Value::Object(JsObject::error(kind, message)))
    })
}
