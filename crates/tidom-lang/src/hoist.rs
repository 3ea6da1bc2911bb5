use itertools::Itertools;
use rustc_hash::FxHashMap;
use smol_str::{SmolStr, format_smolstr};

const STATICS_PREFIX: &str = "hoisted";

/// Declarations shared by every call of the compiled function.
///
/// Static attribute arrays are deduplicated by their canonical text, so two elements with the
/// same statics reference one array. Captured literal lines follow the declarations.
#[derive(Debug, Clone, Default)]
pub struct HoistPool {
    identifiers: FxHashMap<String, SmolStr>,
    declarations: Vec<(SmolStr, String)>,
    literals: Vec<String>,
}

impl HoistPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.identifiers.clear();
        self.declarations.clear();
        self.literals.clear();
    }

    pub fn add_statics(&mut self, serialized: &str) -> SmolStr {
        if let Some(identifier) = self.identifiers.get(serialized) {
            return identifier.clone();
        }

        let identifier = format_smolstr!("{}{}", STATICS_PREFIX, self.declarations.len() + 1);
        self.identifiers
            .insert(serialized.to_string(), identifier.clone());
        self.declarations
            .push((identifier.clone(), serialized.to_string()));
        identifier
    }

    pub fn add_literal(&mut self, text: impl Into<String>) {
        self.literals.push(text.into());
    }

    pub fn build(&self) -> String {
        self.declarations
            .iter()
            .map(|(identifier, value)| format!("var {} = {}", identifier, value))
            .chain(self.literals.iter().cloned())
            .join("\n")
    }
}
