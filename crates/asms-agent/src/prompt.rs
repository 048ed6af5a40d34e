//! System prompt assembly: base instructions + always-on skill bodies +
//! message-matched skill bodies, deduped by id.

use crate::skill::SkillStore;

const BASE_INSTRUCTIONS: &str = "Respond concisely. Use tools for anything that touches live \
state; never invent data a tool could have returned.";

pub fn build_system_prompt(skills: &dyn SkillStore, user_message: &str) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut sections = vec![BASE_INSTRUCTIONS.to_string()];

    for skill in skills.always_on().into_iter().chain(skills.matching(user_message)) {
        if seen.insert(skill.id.clone()) {
            sections.push(skill.body);
        }
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::InMemorySkillStore;

    #[test]
    fn always_on_skill_is_included_even_with_no_keyword_match() {
        let store = InMemorySkillStore::new();
        let prompt = build_system_prompt(&store, "totally unrelated question");
        assert!(prompt.contains("control-plane agent"));
    }

    #[test]
    fn matched_skill_is_appended_once() {
        let store = InMemorySkillStore::new();
        let prompt = build_system_prompt(&store, "please list my models and models again");
        let occurrences = prompt.matches("model.* tools").count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn unmatched_skill_is_absent() {
        let store = InMemorySkillStore::new();
        let prompt = build_system_prompt(&store, "what's the weather");
        assert!(!prompt.contains("device.* queries"));
    }
}
