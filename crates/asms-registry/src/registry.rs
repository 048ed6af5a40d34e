use asms_core::{ArcCommand, ArcQuery, UnitError, UnitKind, UnitMeta};
use rustc_hash::FxHashMap;

/// Builds a [`Registry`] during startup. Registration can fail
/// (`already_registered`, `invalid_unit`); once `build()` is called the
/// registry is immutable and lookups take no lock — write-once before
/// serving, read-only afterward.
#[derive(Default)]
pub struct RegistryBuilder {
    commands: FxHashMap<String, ArcCommand>,
    queries: FxHashMap<String, ArcQuery>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_command(&mut self, unit: ArcCommand) -> Result<(), UnitError> {
        let meta = unit.meta();
        self.check_name(meta)?;
        self.commands.insert(meta.name.clone(), unit.clone());
        Ok(())
    }

    pub fn register_query(&mut self, unit: ArcQuery) -> Result<(), UnitError> {
        let meta = unit.meta();
        self.check_name(meta)?;
        self.queries.insert(meta.name.clone(), unit.clone());
        Ok(())
    }

    fn check_name(&self, meta: &UnitMeta) -> Result<(), UnitError> {
        if !meta.is_well_formed() {
            return Err(UnitError::invalid_unit(&meta.name));
        }
        if self.commands.contains_key(&meta.name) || self.queries.contains_key(&meta.name) {
            return Err(UnitError::already_registered(&meta.name));
        }
        Ok(())
    }

    pub fn build(self) -> Registry {
        Registry {
            commands: self.commands,
            queries: self.queries,
        }
    }
}

/// Immutable after construction: no mutation happens past `build()`, so
/// `get_command`/`get_query`/`list_units` need no synchronization.
pub struct Registry {
    commands: FxHashMap<String, ArcCommand>,
    queries: FxHashMap<String, ArcQuery>,
}

impl Registry {
    pub fn get_command(&self, name: &str) -> Option<ArcCommand> {
        self.commands.get(name).cloned()
    }

    pub fn get_query(&self, name: &str) -> Option<ArcQuery> {
        self.queries.get(name).cloned()
    }

    /// Which namespace (if any) `name` resolves in — used by the MCP
    /// Adapter to infer command-vs-query for a dispatched tool call.
    pub fn kind_of(&self, name: &str) -> Option<UnitKind> {
        if self.commands.contains_key(name) {
            Some(UnitKind::Command)
        } else if self.queries.contains_key(name) {
            Some(UnitKind::Query)
        } else {
            None
        }
    }

    /// All registered units, optionally filtered by domain. Ordering is
    /// not guaranteed.
    pub fn list_units(&self, domain: Option<&str>) -> Vec<UnitMeta> {
        let matches = |meta: &UnitMeta| domain.map(|d| meta.domain == d).unwrap_or(true);
        self.commands
            .values()
            .map(|u| u.meta().clone())
            .filter(matches)
            .chain(self.queries.values().map(|u| u.meta().clone()).filter(matches))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len() + self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use asms_core::{SchemaNode, UnitContext};
    use serde_json::{json, Value};

    struct Stub {
        meta: UnitMeta,
    }

    #[async_trait]
    impl asms_core::CommandUnit for Stub {
        fn meta(&self) -> &UnitMeta {
            &self.meta
        }
        async fn execute(&self, _ctx: UnitContext, _input: Value) -> Result<Value, UnitError> {
            Ok(json!({}))
        }
    }

    #[async_trait]
    impl asms_core::QueryUnit for Stub {
        fn meta(&self) -> &UnitMeta {
            &self.meta
        }
        async fn execute(&self, _ctx: UnitContext, _input: Value) -> Result<Value, UnitError> {
            Ok(json!({}))
        }
    }

    fn stub_command(name: &str) -> ArcCommand {
        std::sync::Arc::new(Stub {
            meta: UnitMeta::new(name, "model", "stub").with_input_schema(SchemaNode::object()),
        })
    }

    fn stub_query(name: &str) -> ArcQuery {
        std::sync::Arc::new(Stub {
            meta: UnitMeta::new(name, "model", "stub"),
        })
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.register_command(stub_command("model.create")).unwrap();
        let err = builder.register_command(stub_command("model.create")).unwrap_err();
        assert_eq!(err.code, "already_registered");
    }

    #[test]
    fn name_without_dot_is_rejected() {
        let mut builder = RegistryBuilder::new();
        let err = builder.register_command(stub_command("bogus")).unwrap_err();
        assert_eq!(err.code, "invalid_unit");
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut builder = RegistryBuilder::new();
        let err = builder.register_command(stub_command("")).unwrap_err();
        assert_eq!(err.code, "invalid_unit");
    }

    #[test]
    fn lookup_returns_registered_unit_until_process_exit() {
        let mut builder = RegistryBuilder::new();
        builder.register_query(stub_query("model.list")).unwrap();
        let registry = builder.build();

        assert!(registry.get_query("model.list").is_some());
        assert!(registry.get_query("model.list").is_some()); // repeatable
        assert!(registry.get_command("model.list").is_none()); // disjoint namespace
    }

    #[test]
    fn list_units_filters_by_domain() {
        let mut builder = RegistryBuilder::new();
        builder.register_command(stub_command("model.create")).unwrap();
        builder
            .register_command(std::sync::Arc::new(Stub {
                meta: UnitMeta::new("engine.start", "engine", "stub"),
            }))
            .unwrap();
        let registry = builder.build();

        let model_units = registry.list_units(Some("model"));
        assert_eq!(model_units.len(), 1);
        assert_eq!(registry.list_units(None).len(), 2);
    }

    #[test]
    fn kind_of_matches_the_namespace_a_name_resolved_in() {
        let mut builder = RegistryBuilder::new();
        builder.register_command(stub_command("model.create")).unwrap();
        builder.register_query(stub_query("model.list")).unwrap();
        let registry = builder.build();

        assert_eq!(registry.kind_of("model.create"), Some(UnitKind::Command));
        assert_eq!(registry.kind_of("model.list"), Some(UnitKind::Query));
        assert_eq!(registry.kind_of("model.unknown"), None);
    }
}
