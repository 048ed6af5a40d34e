//! Skill collaborator: selectively injects text bodies into the system
//! prompt, either unconditionally (`always_on`) or when a user message
//! matches one of the skill's keywords.

use asms_core::UnitError;
use dashmap::DashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub id: String,
    pub body: String,
    pub always_on: bool,
    pub keywords: Vec<String>,
    pub builtin: bool,
}

impl Skill {
    fn matches(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(&k.to_lowercase()))
    }
}

pub trait SkillStore: Send + Sync {
    fn always_on(&self) -> Vec<Skill>;
    fn matching(&self, message: &str) -> Vec<Skill>;
    fn get(&self, id: &str) -> Option<Skill>;
    fn list(&self) -> Vec<Skill>;
    fn upsert(&self, skill: Skill) -> Result<(), UnitError>;
    fn remove(&self, id: &str) -> Result<(), UnitError>;
}

/// In-memory implementation seeded with a fixed set of built-in skills
/// that cannot be overwritten or deleted (`builtin_skill_immutable`).
pub struct InMemorySkillStore {
    skills: DashMap<String, Skill>,
}

impl InMemorySkillStore {
    pub fn new() -> Self {
        let store = Self { skills: DashMap::new() };
        for skill in default_builtin_skills() {
            store.skills.insert(skill.id.clone(), skill);
        }
        store
    }
}

impl Default for InMemorySkillStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillStore for InMemorySkillStore {
    fn always_on(&self) -> Vec<Skill> {
        self.skills.iter().filter(|s| s.always_on).map(|s| s.clone()).collect()
    }

    fn matching(&self, message: &str) -> Vec<Skill> {
        self.skills
            .iter()
            .filter(|s| !s.always_on && s.matches(message))
            .map(|s| s.clone())
            .collect()
    }

    fn get(&self, id: &str) -> Option<Skill> {
        self.skills.get(id).map(|s| s.clone())
    }

    fn list(&self) -> Vec<Skill> {
        self.skills.iter().map(|s| s.clone()).collect()
    }

    fn upsert(&self, skill: Skill) -> Result<(), UnitError> {
        if let Some(existing) = self.skills.get(&skill.id) {
            if existing.builtin {
                return Err(UnitError::builtin_skill_immutable(&skill.id));
            }
        }
        self.skills.insert(skill.id.clone(), skill);
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), UnitError> {
        match self.skills.get(id) {
            None => Err(UnitError::skill_not_found(id)),
            Some(skill) if skill.builtin => Err(UnitError::builtin_skill_immutable(id)),
            Some(_) => {
                self.skills.remove(id);
                Ok(())
            }
        }
    }
}

fn default_builtin_skills() -> Vec<Skill> {
    vec![
        Skill {
            id: "core-identity".to_string(),
            body: "You are the control-plane agent for an AI inference platform. \
                   You operate units through tool calls and never fabricate results."
                .to_string(),
            always_on: true,
            keywords: Vec::new(),
            builtin: true,
        },
        Skill {
            id: "model-ops".to_string(),
            body: "When asked about models, prefer the model.* tools over free-text \
                   answers; list before you create, to avoid duplicate registrations."
                .to_string(),
            always_on: false,
            keywords: vec!["model".to_string(), "inference".to_string(), "catalog".to_string()],
            builtin: true,
        },
        Skill {
            id: "device-ops".to_string(),
            body: "Device state is authoritative from device.* queries; never assume a \
                   device is healthy without checking."
                .to_string(),
            always_on: false,
            keywords: vec!["device".to_string(), "gpu".to_string(), "hardware".to_string()],
            builtin: true,
        },
    ]
}
