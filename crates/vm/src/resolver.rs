//! Handler lookup across cast libraries.
//!
//! The VM searches its own movie library first and then asks an injected
//! [`CastLibProvider`]. A found handler comes back as a [`HandlerLocation`]
//! that keeps the owning library alongside the script, because literal and
//! name indices inside the handler are library-relative.

use std::collections::HashMap;
use std::sync::Arc;

use lingo_common::{Datum, Handler, Script, ScriptLibrary, ScriptRef};

/// A resolved handler: script, handler index and owning library.
#[derive(Debug, Clone)]
pub struct HandlerLocation {
    script: Arc<Script>,
    handler: usize,
    library: Arc<ScriptLibrary>,
}

impl HandlerLocation {
    /// Returns `None` when `handler` is not an index into `script.handlers`.
    pub fn new(script: Arc<Script>, handler: usize, library: Arc<ScriptLibrary>) -> Option<Self> {
        (handler < script.handlers.len()).then_some(Self {
            script,
            handler,
            library,
        })
    }

    /// Look `name` up in one script.
    pub fn find(script: &Arc<Script>, library: &Arc<ScriptLibrary>, name: &str) -> Option<Self> {
        let index = script.handler_by_name(&library.names, name)?;
        Self::new(Arc::clone(script), index, Arc::clone(library))
    }

    /// Look `name` up in every script of a library, in order.
    pub fn find_in_library(library: &Arc<ScriptLibrary>, name: &str) -> Option<Self> {
        library
            .scripts
            .iter()
            .find_map(|script| Self::find(script, library, name))
    }

    pub fn script(&self) -> &Arc<Script> {
        &self.script
    }

    pub fn library(&self) -> &Arc<ScriptLibrary> {
        &self.library
    }

    pub fn handler_index(&self) -> usize {
        self.handler
    }

    pub fn handler(&self) -> &Handler {
        &self.script.handlers[self.handler]
    }

    /// Handler name resolved through the owning library's name table.
    pub fn name(&self) -> String {
        self.library
            .names
            .name_or_placeholder(self.handler().name_id)
    }

    /// The script this handler belongs to, as a script reference.
    pub fn script_ref(&self) -> ScriptRef {
        ScriptRef::new(self.library.number, self.script.member)
    }
}

/// Cross-library services the host supplies to the VM.
///
/// Every method has a neutral default, so a host only implements what its
/// movie needs.
pub trait CastLibProvider {
    /// Search every attached library for a handler.
    fn find_handler(&self, _name: &str) -> Option<HandlerLocation> {
        None
    }

    /// Search one script member.
    fn find_handler_in_script(
        &self,
        _cast_lib: i32,
        _member: i32,
        _name: &str,
    ) -> Option<HandlerLocation> {
        None
    }

    /// A member reference by name. `cast_lib` 0 searches every library.
    fn member_by_name(&self, _cast_lib: i32, _name: &str) -> Datum {
        Datum::Void
    }

    fn member_prop(&self, _cast_lib: i32, _member: i32, _prop: &str) -> Datum {
        Datum::Void
    }

    /// Returns false when the property could not be set.
    fn set_member_prop(&mut self, _cast_lib: i32, _member: i32, _prop: &str, _value: Datum) -> bool {
        false
    }

    /// Declared `property` names of a script member.
    fn script_property_names(&self, _cast_lib: i32, _member: i32) -> Vec<String> {
        Vec::new()
    }

    /// `number` when a library with that number exists, else 0.
    fn cast_lib_by_number(&self, _number: i32) -> i32 {
        0
    }

    /// Number of the library called `name`, else 0.
    fn cast_lib_by_name(&self, _name: &str) -> i32 {
        0
    }

    fn cast_lib_count(&self) -> i32 {
        0
    }

    fn cast_lib_prop(&self, _number: i32, _prop: &str) -> Datum {
        Datum::Void
    }

    fn set_cast_lib_prop(&mut self, _number: i32, _prop: &str, _value: Datum) -> bool {
        false
    }

    /// Text of a field member addressed by name or number.
    fn field_value(&self, _cast_id: &Datum, _field: &Datum) -> Option<String> {
        None
    }

    fn member_count(&self, _cast_lib: i32) -> i32 {
        0
    }
}

#[derive(Debug, Clone)]
struct Field {
    cast_lib: i32,
    member: i32,
    name: String,
    text: String,
}

/// A provider over a fixed set of decoded libraries.
#[derive(Debug, Clone, Default)]
pub struct StaticCastLibs {
    libraries: Vec<Arc<ScriptLibrary>>,
    member_props: HashMap<(i32, i32, String), Datum>,
    fields: Vec<Field>,
}

impl StaticCastLibs {
    pub fn new(libraries: impl IntoIterator<Item = ScriptLibrary>) -> Self {
        Self {
            libraries: libraries.into_iter().map(Arc::new).collect(),
            ..Self::default()
        }
    }

    pub fn add_library(&mut self, library: ScriptLibrary) {
        self.libraries.push(Arc::new(library));
    }

    pub fn libraries(&self) -> &[Arc<ScriptLibrary>] {
        &self.libraries
    }

    /// Register a text field member.
    pub fn set_field(&mut self, cast_lib: i32, member: i32, name: &str, text: &str) {
        self.fields.retain(|f| !(f.cast_lib == cast_lib && f.member == member));
        self.fields.push(Field {
            cast_lib,
            member,
            name: name.to_string(),
            text: text.to_string(),
        });
    }

    fn library(&self, number: i32) -> Option<&Arc<ScriptLibrary>> {
        self.libraries.iter().find(|l| l.number == number)
    }

    fn script(&self, cast_lib: i32, member: i32) -> Option<&Arc<Script>> {
        self.library(cast_lib)?.script_by_member(member)
    }

    fn member_exists(&self, cast_lib: i32, member: i32) -> bool {
        self.script(cast_lib, member).is_some()
            || self
                .fields
                .iter()
                .any(|f| f.cast_lib == cast_lib && f.member == member)
    }
}

impl CastLibProvider for StaticCastLibs {
    fn find_handler(&self, name: &str) -> Option<HandlerLocation> {
        self.libraries
            .iter()
            .find_map(|lib| HandlerLocation::find_in_library(lib, name))
    }

    fn find_handler_in_script(
        &self,
        cast_lib: i32,
        member: i32,
        name: &str,
    ) -> Option<HandlerLocation> {
        let library = self.library(cast_lib)?;
        let script = library.script_by_member(member)?;
        HandlerLocation::find(script, library, name)
    }

    fn member_by_name(&self, cast_lib: i32, name: &str) -> Datum {
        let in_scope = |number: i32| cast_lib == 0 || cast_lib == number;
        let script = self
            .libraries
            .iter()
            .filter(|lib| in_scope(lib.number))
            .find_map(|lib| lib.script_by_name(name).map(|s| (lib.number, s.member)));
        let field = || {
            self.fields
                .iter()
                .find(|f| in_scope(f.cast_lib) && f.name.eq_ignore_ascii_case(name))
                .map(|f| (f.cast_lib, f.member))
        };
        match script.or_else(field) {
            Some((cast_lib, member)) => Datum::CastMember { cast_lib, member },
            None => Datum::Void,
        }
    }

    fn member_prop(&self, cast_lib: i32, member: i32, prop: &str) -> Datum {
        let key = (cast_lib, member, prop.to_ascii_lowercase());
        if let Some(value) = self.member_props.get(&key) {
            return value.clone();
        }
        if let Some(script) = self.script(cast_lib, member) {
            return match key.2.as_str() {
                "name" => Datum::string(script.name.as_str()),
                "type" => Datum::symbol("script"),
                "scripttype" => Datum::symbol(script.kind.name()),
                "script" => Datum::Script(ScriptRef::new(cast_lib, member)),
                _ => Datum::Void,
            };
        }
        match self
            .fields
            .iter()
            .find(|f| f.cast_lib == cast_lib && f.member == member)
        {
            Some(field) => match key.2.as_str() {
                "name" => Datum::string(field.name.as_str()),
                "type" => Datum::symbol("field"),
                "text" => Datum::string(field.text.as_str()),
                _ => Datum::Void,
            },
            None => Datum::Void,
        }
    }

    fn set_member_prop(&mut self, cast_lib: i32, member: i32, prop: &str, value: Datum) -> bool {
        if !self.member_exists(cast_lib, member) {
            return false;
        }
        if prop.eq_ignore_ascii_case("text") {
            if let Some(field) = self
                .fields
                .iter_mut()
                .find(|f| f.cast_lib == cast_lib && f.member == member)
            {
                field.text = value.to_lingo_string();
                return true;
            }
        }
        self.member_props
            .insert((cast_lib, member, prop.to_ascii_lowercase()), value);
        true
    }

    fn script_property_names(&self, cast_lib: i32, member: i32) -> Vec<String> {
        match (self.library(cast_lib), self.script(cast_lib, member)) {
            (Some(library), Some(script)) => library.property_names(script),
            _ => Vec::new(),
        }
    }

    fn cast_lib_by_number(&self, number: i32) -> i32 {
        self.library(number).map(|l| l.number).unwrap_or(0)
    }

    fn cast_lib_by_name(&self, name: &str) -> i32 {
        self.libraries
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
            .map(|l| l.number)
            .unwrap_or(0)
    }

    fn cast_lib_count(&self) -> i32 {
        self.libraries.len() as i32
    }

    fn cast_lib_prop(&self, number: i32, prop: &str) -> Datum {
        let Some(library) = self.library(number) else {
            return Datum::Void;
        };
        match prop.to_ascii_lowercase().as_str() {
            "name" => Datum::string(library.name.as_str()),
            "number" => Datum::Int(library.number),
            "filename" => Datum::string(""),
            _ => Datum::Void,
        }
    }

    fn field_value(&self, cast_id: &Datum, field: &Datum) -> Option<String> {
        let cast_lib = match cast_id {
            Datum::Int(n) if *n > 0 => Some(*n),
            Datum::CastLib(n) => Some(*n),
            Datum::Str(name) => Some(self.cast_lib_by_name(name)),
            _ => None,
        };
        let in_scope = |f: &&Field| cast_lib.map_or(true, |c| c == f.cast_lib);
        let found = match field {
            Datum::Str(name) => self
                .fields
                .iter()
                .filter(in_scope)
                .find(|f| f.name.eq_ignore_ascii_case(name)),
            Datum::CastMember { cast_lib, member } => self
                .fields
                .iter()
                .find(|f| f.cast_lib == *cast_lib && f.member == *member),
            other => {
                let member = other.to_int();
                self.fields.iter().filter(in_scope).find(|f| f.member == member)
            }
        };
        found.map(|f| f.text.clone())
    }

    fn member_count(&self, cast_lib: i32) -> i32 {
        let Some(library) = self.library(cast_lib) else {
            return 0;
        };
        let fields = self.fields.iter().filter(|f| f.cast_lib == cast_lib).count();
        (library.scripts.len() + fields) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_common::ScriptKind;

    fn library(number: i32, name: &str) -> ScriptLibrary {
        let mut lib = ScriptLibrary::new(number, name, 1200);
        let greet = lib.names.intern("greet");
        let prop = lib.names.intern("pName");
        let mut script = Script::new(4, ScriptKind::Parent);
        script.name = "Greeter".into();
        script.property_name_ids.push(prop);
        script.handlers.push(Handler::new(greet, vec![], vec![], vec![]));
        lib.scripts.push(Arc::new(script));
        lib
    }

    #[test]
    fn finds_handlers_across_libraries() {
        let libs = StaticCastLibs::new([library(1, "Internal"), library(2, "External")]);
        let found = libs.find_handler("GREET").unwrap();
        assert_eq!(found.library().number, 1);
        assert_eq!(found.name(), "greet");
        assert_eq!(found.script_ref(), ScriptRef::new(1, 4));

        let in_second = libs.find_handler_in_script(2, 4, "greet").unwrap();
        assert_eq!(in_second.library().number, 2);
        assert!(libs.find_handler_in_script(2, 5, "greet").is_none());
        assert!(libs.find_handler("missing").is_none());
    }

    #[test]
    fn member_lookup_and_props() {
        let mut libs = StaticCastLibs::new([library(1, "Internal")]);
        assert_eq!(
            libs.member_by_name(0, "greeter"),
            Datum::CastMember {
                cast_lib: 1,
                member: 4
            }
        );
        assert_eq!(libs.member_by_name(2, "greeter"), Datum::Void);
        assert_eq!(
            libs.member_prop(1, 4, "script"),
            Datum::Script(ScriptRef::new(1, 4))
        );
        assert_eq!(libs.member_prop(1, 4, "name"), Datum::string("Greeter"));
        assert!(libs.set_member_prop(1, 4, "pTag", Datum::Int(3)));
        assert_eq!(libs.member_prop(1, 4, "PTAG"), Datum::Int(3));
        assert!(!libs.set_member_prop(1, 99, "pTag", Datum::Int(3)));
        assert_eq!(libs.script_property_names(1, 4), vec!["pName".to_string()]);
    }

    #[test]
    fn cast_libs_and_fields() {
        let mut libs = StaticCastLibs::new([library(1, "Internal"), library(2, "Sounds")]);
        assert_eq!(libs.cast_lib_count(), 2);
        assert_eq!(libs.cast_lib_by_name("sounds"), 2);
        assert_eq!(libs.cast_lib_by_number(7), 0);
        assert_eq!(libs.cast_lib_prop(2, "name"), Datum::string("Sounds"));

        libs.set_field(1, 10, "status", "ready");
        assert_eq!(
            libs.field_value(&Datum::Void, &Datum::string("STATUS")),
            Some("ready".to_string())
        );
        assert_eq!(
            libs.field_value(&Datum::Int(1), &Datum::Int(10)),
            Some("ready".to_string())
        );
        assert_eq!(libs.field_value(&Datum::Int(2), &Datum::string("status")), None);
        assert!(libs.set_member_prop(1, 10, "text", Datum::string("done")));
        assert_eq!(libs.member_prop(1, 10, "text"), Datum::string("done"));
        assert_eq!(libs.member_count(1), 2);
    }
}
