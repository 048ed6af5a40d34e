use asms_core::{Resource, ResourceFactory, UnitError};
use regex::Regex;
use std::sync::Arc;

/// Resolves static resources and parameterized factories by URI.
/// Factories are never pre-enumerated, only resolved lazily.
#[derive(Default)]
pub struct ResourceRegistry {
    static_resources: Vec<Arc<dyn Resource>>,
    factories: Vec<Arc<dyn ResourceFactory>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_static(&mut self, resource: Arc<dyn Resource>) {
        self.static_resources.push(resource);
    }

    pub fn register_factory(&mut self, factory: Arc<dyn ResourceFactory>) {
        self.factories.push(factory);
    }

    /// Resolve a concrete `Resource` for `uri`: an exact match among
    /// static resources first, then the first factory whose template
    /// matches.
    pub fn resolve(&self, uri: &str) -> Result<Arc<dyn Resource>, UnitError> {
        if let Some(found) = self.static_resources.iter().find(|r| r.uri() == uri) {
            return Ok(found.clone());
        }
        for factory in &self.factories {
            if let Some(resource) = factory.resolve(uri) {
                return Ok(resource);
            }
        }
        Err(UnitError::new("resource_not_found", format!("no resource matches uri '{}'", uri)))
    }

    /// List registered URIs: exact ones for static resources, templates
    /// (e.g. `asms://skill/{id}`) for factories — never expanded.
    pub fn list_templates(&self) -> Vec<String> {
        self.static_resources
            .iter()
            .map(|r| r.uri().to_string())
            .chain(self.factories.iter().map(|f| f.uri_template().to_string()))
            .collect()
    }

    /// Like [`Self::list_templates`] but carries domain and template-vs-
    /// concrete status, for surfaces (MCP) that need to distinguish them.
    pub fn list_descriptors(&self) -> Vec<(String, String, bool)> {
        self.static_resources
            .iter()
            .map(|r| (r.uri().to_string(), r.domain().to_string(), false))
            .chain(
                self.factories
                    .iter()
                    .map(|f| (f.uri_template().to_string(), f.domain().to_string(), true)),
            )
            .collect()
    }
}

/// Compile a `{param}`-templated URI into a matching regex.
pub fn compile_uri_template(template: &str) -> Result<(Regex, Vec<String>), UnitError> {
    let mut pattern = String::from("^");
    let mut param_names = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '{' {
            let mut param_name = String::new();
            while let Some(&next_ch) = chars.peek() {
                if next_ch == '}' {
                    chars.next();
                    break;
                }
                param_name.push(chars.next().unwrap());
            }
            if param_name.is_empty() {
                return Err(UnitError::new("invalid_unit", "empty parameter name in uri template"));
            }
            param_names.push(param_name);
            if chars.peek() == Some(&'/') {
                pattern.push_str("([^/]+)");
            } else {
                pattern.push_str("(.+)");
            }
        } else {
            if ".*+?^$[](){}|\\".contains(ch) {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
    }
    pattern.push('$');

    let regex = Regex::new(&pattern)
        .map_err(|e| UnitError::new("invalid_unit", format!("invalid uri template regex: {}", e)))?;
    Ok((regex, param_names))
}
