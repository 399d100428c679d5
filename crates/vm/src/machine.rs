//! Interpreter state: globals, call stack, instance heap, registries.

use std::sync::Arc;

use indexmap::IndexMap;
use lingo_common::{Datum, InstanceHeap, InstanceId, ScriptLibrary, ScriptRef};

use crate::ancestor;
use crate::builtins::{BuiltinFn, BuiltinRegistry};
use crate::config::VmConfig;
use crate::error::VmError;
use crate::resolver::{CastLibProvider, HandlerLocation};
use crate::scope::Scope;
use crate::trace::TraceListener;

/// Handlers that only run when no other error handler is active.
pub const ERROR_HANDLER_NAMES: [&str; 2] = ["alertHook", "errorHandler"];

/// A Lingo interpreter for one movie or session.
pub struct LingoVM {
    pub(crate) config: VmConfig,
    pub(crate) globals: IndexMap<String, Datum>,
    pub(crate) call_stack: Vec<Scope>,
    pub(crate) heap: InstanceHeap,
    pub(crate) builtins: BuiltinRegistry,
    pub(crate) provider: Option<Box<dyn CastLibProvider>>,
    /// The primary movie's scripts, searched before the provider.
    pub(crate) movie: Option<Arc<ScriptLibrary>>,
    pub(crate) trace: Option<Box<dyn TraceListener>>,
    /// Set when a contained script error stops execution.
    pub(crate) error_state: bool,
    /// Active calls to handlers in [`ERROR_HANDLER_NAMES`].
    pub(crate) error_handler_depth: usize,
    pub(crate) pass_callback: Option<Box<dyn FnMut()>>,
    /// Host-visible movie properties (`the <name>`).
    pub(crate) movie_props: IndexMap<String, Datum>,
}

impl Default for LingoVM {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LingoVM {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LingoVM")
            .field("config", &self.config)
            .field("globals", &self.globals)
            .field("call_depth", &self.call_stack.len())
            .field("instances", &self.heap.len())
            .field("error_state", &self.error_state)
            .finish_non_exhaustive()
    }
}

impl LingoVM {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            config,
            globals: IndexMap::new(),
            call_stack: Vec::new(),
            heap: InstanceHeap::new(),
            builtins: BuiltinRegistry::with_defaults(),
            provider: None,
            movie: None,
            trace: None,
            error_state: false,
            error_handler_depth: 0,
            pass_callback: None,
            movie_props: IndexMap::new(),
        }
    }

    // ---- Configuration ----

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut VmConfig {
        &mut self.config
    }

    pub fn step_limit(&self) -> u64 {
        self.config.step_limit
    }

    pub fn set_step_limit(&mut self, limit: u64) {
        self.config.step_limit = limit;
    }

    pub fn item_delimiter(&self) -> char {
        self.config.item_delimiter
    }

    pub fn set_item_delimiter(&mut self, delimiter: char) {
        self.config.item_delimiter = delimiter;
    }

    pub fn set_movie(&mut self, library: ScriptLibrary) {
        self.movie = Some(Arc::new(library));
    }

    pub fn movie(&self) -> Option<&Arc<ScriptLibrary>> {
        self.movie.as_ref()
    }

    pub fn set_provider(&mut self, provider: Box<dyn CastLibProvider>) {
        self.provider = Some(provider);
    }

    pub fn provider(&self) -> Option<&dyn CastLibProvider> {
        self.provider.as_deref()
    }

    pub fn provider_mut(&mut self) -> Option<&mut (dyn CastLibProvider + 'static)> {
        self.provider.as_deref_mut()
    }

    pub fn set_trace_listener(&mut self, listener: Option<Box<dyn TraceListener>>) {
        self.trace = listener;
    }

    /// Install the callback `pass` invokes.
    pub fn set_pass_callback(&mut self, callback: impl FnMut() + 'static) {
        self.pass_callback = Some(Box::new(callback));
    }

    // ---- Globals and movie properties ----

    pub fn global(&self, name: &str) -> Datum {
        self.globals.get(name).cloned().unwrap_or_default()
    }

    pub fn set_global(&mut self, name: &str, value: Datum) {
        if let Some(trace) = self.trace.as_mut() {
            trace.on_variable_set("global", name, &value);
        }
        self.globals.insert(name.to_string(), value);
    }

    pub fn globals(&self) -> &IndexMap<String, Datum> {
        &self.globals
    }

    pub fn movie_prop(&self, name: &str) -> Datum {
        self.movie_props
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    pub fn set_movie_prop(&mut self, name: &str, value: Datum) {
        if name.eq_ignore_ascii_case("itemDelimiter") {
            if let Some(c) = value.to_lingo_string().chars().next() {
                self.config.item_delimiter = c;
            }
            return;
        }
        let key = self
            .movie_props
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| name.to_string());
        self.movie_props.insert(key, value);
    }

    // ---- Error state ----

    pub fn error_state(&self) -> bool {
        self.error_state
    }

    /// The host clears this once per frame or event cycle; the VM never does.
    pub fn set_error_state(&mut self, error: bool) {
        self.error_state = error;
    }

    /// Drop globals, instances, movie properties and any error state.
    pub fn reset(&mut self) {
        self.globals.clear();
        self.call_stack.clear();
        self.heap.clear();
        self.movie_props.clear();
        self.error_state = false;
        self.error_handler_depth = 0;
    }

    // ---- Instances and scopes ----

    pub fn heap(&self) -> &InstanceHeap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut InstanceHeap {
        &mut self.heap
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn current_scope(&self) -> Option<&Scope> {
        self.call_stack.last()
    }

    pub fn current_scope_mut(&mut self) -> Option<&mut Scope> {
        self.call_stack.last_mut()
    }

    pub(crate) fn push(&mut self, value: Datum) {
        if let Some(scope) = self.call_stack.last_mut() {
            scope.push(value);
        }
    }

    pub(crate) fn pop(&mut self) -> Datum {
        self.call_stack
            .last_mut()
            .map(Scope::pop)
            .unwrap_or_default()
    }

    /// Receiver of the running handler, or void.
    pub(crate) fn receiver(&self) -> Datum {
        self.call_stack
            .last()
            .map(|s| s.receiver().clone())
            .unwrap_or_default()
    }

    /// Name of the running handler, for error reports.
    pub(crate) fn current_handler_name(&self) -> String {
        self.call_stack
            .last()
            .map(|s| s.location().name())
            .unwrap_or_default()
    }

    /// Own property of an instance, or void.
    pub fn instance_prop(&self, id: InstanceId, name: &str) -> Datum {
        self.heap
            .get(id)
            .and_then(|inst| inst.properties.get(name).cloned())
            .unwrap_or_default()
    }

    /// Set an instance's own property, bypassing the ancestor chain.
    pub fn set_instance_prop(&mut self, id: InstanceId, name: &str, value: Datum) {
        if let Some(inst) = self.heap.get_mut(id) {
            inst.properties.insert(name.to_string(), value);
        }
    }

    // ---- Name resolution ----

    /// Identifier `id` in the running handler's library.
    pub fn resolve_name(&self, id: i32) -> String {
        match self.call_stack.last() {
            Some(scope) => scope.library().names.name_or_placeholder(id),
            None => format!("<name:{id}>"),
        }
    }

    /// Factor the running handler's variable-slot arguments are scaled by.
    /// Outside any handler it is 1.
    pub fn variable_multiplier(&self) -> i32 {
        self.call_stack
            .last()
            .map(|s| s.library().variable_multiplier())
            .unwrap_or(1)
    }

    // ---- Handler lookup ----

    /// A handler by name: the movie's scripts first, then the provider.
    pub fn find_handler(&self, name: &str) -> Option<HandlerLocation> {
        self.movie
            .as_ref()
            .and_then(|movie| HandlerLocation::find_in_library(movie, name))
            .or_else(|| self.provider.as_ref()?.find_handler(name))
    }

    /// A handler in one script member.
    pub fn find_handler_in_script(&self, script: ScriptRef, name: &str) -> Option<HandlerLocation> {
        if let Some(movie) = self.movie.as_ref().filter(|m| m.number == script.cast_lib) {
            if let Some(found) = movie
                .script_by_member(script.member)
                .and_then(|s| HandlerLocation::find(s, movie, name))
            {
                return Some(found);
            }
        }
        self.provider
            .as_ref()?
            .find_handler_in_script(script.cast_lib, script.member, name)
    }

    /// First handler called `name` on the scripts of `start` and its ancestors.
    pub fn find_instance_handler(&self, start: InstanceId, name: &str) -> Option<HandlerLocation> {
        ancestor::chain(&self.heap, start).find_map(|id| {
            let script = self.heap.get(id)?.script?;
            self.find_handler_in_script(script, name)
        })
    }

    /// Resolve a script member by name to a script reference.
    ///
    /// A member's `script` property may pack the library into the high half
    /// (`castLib << 16 | member`); other integers are members of the member's
    /// own library.
    pub fn script_ref_by_name(&self, name: &str) -> Option<ScriptRef> {
        if let Some(movie) = &self.movie {
            if let Some(script) = movie.script_by_name(name) {
                return Some(ScriptRef::new(movie.number, script.member));
            }
        }
        let provider = self.provider.as_ref()?;
        let Datum::CastMember { cast_lib, member } = provider.member_by_name(0, name) else {
            return None;
        };
        Some(match provider.member_prop(cast_lib, member, "script") {
            Datum::Script(r) => r,
            Datum::Int(v) if v > 0xFFFF => ScriptRef::new(v >> 16, v & 0xFFFF),
            Datum::Int(v) if v > 0 => ScriptRef::new(cast_lib, v),
            _ => ScriptRef::new(cast_lib, member),
        })
    }

    /// Declared property names of a script.
    pub fn script_property_names(&self, script: ScriptRef) -> Vec<String> {
        if let Some(movie) = self.movie.as_ref().filter(|m| m.number == script.cast_lib) {
            if let Some(s) = movie.script_by_member(script.member) {
                return movie.property_names(s);
            }
        }
        self.provider
            .as_ref()
            .map(|p| p.script_property_names(script.cast_lib, script.member))
            .unwrap_or_default()
    }

    // ---- Builtins ----

    pub fn has_builtin(&self, name: &str) -> bool {
        self.builtins.contains(name)
    }

    /// Register or replace a builtin.
    pub fn register_builtin(
        &mut self,
        name: &str,
        f: impl Fn(&mut LingoVM, &[Datum]) -> Result<Datum, VmError> + 'static,
    ) {
        self.builtins.register(name, f);
    }

    /// Call a builtin by name. Unknown names yield void.
    pub fn invoke_builtin(&mut self, name: &str, args: &[Datum]) -> Result<Datum, VmError> {
        let f: Option<BuiltinFn> = self.builtins.get(name);
        match f {
            Some(f) => f(self, args),
            None => Ok(Datum::Void),
        }
    }

    /// Run the host's `pass` callback, if any.
    pub(crate) fn pass(&mut self) {
        if let Some(callback) = self.pass_callback.as_mut() {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StaticCastLibs;
    use lingo_common::{Handler, Script, ScriptKind};

    fn library(number: i32, script_name: &str, handler: &str) -> ScriptLibrary {
        let mut lib = ScriptLibrary::new(number, "lib", 1200);
        let id = lib.names.intern(handler);
        let mut script = Script::new(1, ScriptKind::Parent);
        script.name = script_name.into();
        script.handlers.push(Handler::new(id, vec![], vec![], vec![]));
        lib.scripts.push(Arc::new(script));
        lib
    }

    #[test]
    fn movie_is_searched_before_provider() {
        let mut vm = LingoVM::new();
        vm.set_movie(library(1, "Main", "go"));
        vm.set_provider(Box::new(StaticCastLibs::new([library(2, "Other", "go")])));
        assert_eq!(vm.find_handler("go").unwrap().library().number, 1);

        let other = vm.find_handler_in_script(ScriptRef::new(2, 1), "GO").unwrap();
        assert_eq!(other.library().number, 2);
        assert!(vm.find_handler("stop").is_none());
    }

    #[test]
    fn script_refs_resolve_by_member_name() {
        let mut vm = LingoVM::new();
        vm.set_provider(Box::new(StaticCastLibs::new([library(3, "Walker", "new")])));
        assert_eq!(vm.script_ref_by_name("walker"), Some(ScriptRef::new(3, 1)));
        assert_eq!(vm.script_ref_by_name("runner"), None);
    }

    #[test]
    fn multiplier_defaults_to_one_outside_handlers() {
        let vm = LingoVM::new();
        assert_eq!(vm.variable_multiplier(), 1);
        assert_eq!(vm.resolve_name(3), "<name:3>");
    }

    #[test]
    fn movie_props_and_item_delimiter() {
        let mut vm = LingoVM::new();
        vm.set_movie_prop("itemDelimiter", Datum::string(";"));
        assert_eq!(vm.item_delimiter(), ';');
        vm.set_movie_prop("exitLock", Datum::Int(1));
        vm.set_movie_prop("EXITLOCK", Datum::Int(0));
        assert_eq!(vm.movie_prop("exitlock"), Datum::Int(0));
        assert_eq!(vm.movie_props.len(), 1);
    }

    #[test]
    fn reset_clears_session_state() {
        let mut vm = LingoVM::new();
        vm.set_global("gScore", Datum::Int(10));
        vm.set_error_state(true);
        vm.heap_mut().alloc(None, Default::default());
        vm.reset();
        assert_eq!(vm.global("gScore"), Datum::Void);
        assert!(!vm.error_state());
        assert!(vm.heap().is_empty());
    }

    #[test]
    fn instances_from_before_a_reset_stay_dead() {
        let mut vm = LingoVM::new();
        let old = vm.heap_mut().alloc(None, Default::default());
        vm.set_instance_prop(old, "pOwner", Datum::string("old"));
        vm.reset();

        let new = vm.heap_mut().alloc(None, Default::default());
        vm.set_instance_prop(new, "pOwner", Datum::string("new"));
        vm.set_instance_prop(old, "pOwner", Datum::string("stale write"));

        assert_eq!(vm.instance_prop(old, "pOwner"), Datum::Void);
        assert_eq!(vm.instance_prop(new, "pOwner"), Datum::string("new"));
    }

    #[test]
    fn pass_runs_the_callback() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut vm = LingoVM::new();
        vm.pass();
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        vm.set_pass_callback(move || seen.set(seen.get() + 1));
        vm.pass();
        assert_eq!(hits.get(), 1);
    }
}
