//! Prompt templates and the context blocks rendered into them.

use storybook_core::{FinalScript, StoryArc, StoryBible};

/// A prompt with `{{name}}` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate(&'static str);

pub(crate) const BIBLE: PromptTemplate = PromptTemplate(include_str!("../prompts/bible.md"));
pub(crate) const ARC: PromptTemplate = PromptTemplate(include_str!("../prompts/arc.md"));
pub(crate) const DRAFT: PromptTemplate = PromptTemplate(include_str!("../prompts/draft.md"));
pub(crate) const CLASSIFY: PromptTemplate = PromptTemplate(include_str!("../prompts/classify.md"));
pub(crate) const ANSWER: PromptTemplate = PromptTemplate(include_str!("../prompts/answer.md"));
pub(crate) const REWRITE: PromptTemplate = PromptTemplate(include_str!("../prompts/rewrite.md"));
pub(crate) const PLAIN_REWRITE: PromptTemplate =
    PromptTemplate(include_str!("../prompts/plain_rewrite.md"));

impl PromptTemplate {
    /// Wrap a template string.
    pub const fn new(template: &'static str) -> Self {
        Self(template)
    }

    /// Substitute every `{{key}}` with its value in a single pass.
    ///
    /// Placeholders without a value are left untouched. Substituted text is
    /// never scanned again, so a value containing `{{key}}` stays literal.
    ///
    /// ```
    /// use storybook_generator::PromptTemplate;
    ///
    /// let template = PromptTemplate::new("Idea: {{user_input}} ({{user_input}}) {{other}}");
    /// assert_eq!(
    ///     template.render(&[("user_input", "a dragon")]),
    ///     "Idea: a dragon (a dragon) {{other}}"
    /// );
    /// ```
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut rendered = String::with_capacity(self.0.len());
        let mut rest = self.0;
        while let Some(open) = rest.find("{{") {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let value = after.find("}}").and_then(|close| {
                values
                    .iter()
                    .find(|(key, _)| *key == &after[..close])
                    .map(|(_, value)| (*value, close))
            });
            match value {
                Some((value, close)) => {
                    rendered.push_str(value);
                    rest = &after[close + 2..];
                }
                None => {
                    rendered.push_str("{{");
                    rest = after;
                }
            }
        }
        rendered.push_str(rest);
        rendered
    }
}

/// Bible summary used as context by later stages. Empty when there is no bible.
pub fn bible_context(bible: Option<&StoryBible>) -> String {
    let Some(bible) = bible else {
        return String::new();
    };
    let characters = bible
        .characters
        .iter()
        .map(|c| format!("{} ({})", c.character_name, c.description))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Characters: {}\nSetting: {} - {}\nTime period: {}\nWorld rules: {}\nTheme: {}\nConflict: {}\nResolution: {}",
        characters,
        bible.name,
        bible.description,
        bible.time_period,
        bible.world_rules,
        bible.main_theme,
        bible.main_conflict,
        bible.conflict_resolution,
    )
}

/// Act and spread outline used as draft context. Empty when there is no arc.
pub fn arc_context(arc: Option<&StoryArc>) -> String {
    let Some(arc) = arc else {
        return String::new();
    };
    let acts = arc
        .acts
        .iter()
        .map(|act| format!("Act {}: {} - {}", act.act_number, act.act_name, act.description));
    let spreads = arc
        .spreads
        .iter()
        .map(|spread| format!("Spread {}: {}", spread.spread_number, spread.description));
    format!(
        "3-Act Structure:\n{}\n\n14-Spread Structure:\n{}",
        acts.collect::<Vec<_>>().join("\n"),
        spreads.collect::<Vec<_>>().join("\n"),
    )
}

/// One line per spread, for answering questions about a script.
pub fn script_context(script: &FinalScript) -> String {
    script
        .spreads
        .iter()
        .map(|s| format!("Spread {}: Left='{}' | Right='{}'", s.spread_number, s.script_1, s.script_2))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Spread-by-spread listing of a script, for rewrites.
pub(crate) fn formatted_spreads(script: &FinalScript) -> String {
    script
        .spreads
        .iter()
        .map(|s| {
            format!(
                "Spread {}:\n  Left Page (script_1): {}\n  Right Page (script_2): {}",
                s.spread_number, s.script_1, s.script_2
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use storybook_core::{Act, ArcSpread, BibleCharacter, SpreadScript};

    #[test]
    fn every_template_has_its_placeholders() {
        assert!(BIBLE.0.contains("{{preset_characters}}") && BIBLE.0.contains("{{user_input}}"));
        assert!(ARC.0.contains("{{story_bible}}"));
        for key in ["{{story_bible}}", "{{story_arc}}", "{{character_context}}"] {
            assert!(DRAFT.0.contains(key), "draft template lacks {key}");
        }
        assert!(CLASSIFY.0.contains("{{message}}"));
        assert!(ANSWER.0.contains("{{story_context}}") && ANSWER.0.contains("{{question}}"));
        for key in ["{{formatted_spreads}}", "{{edit_request}}", "{{character_context}}"] {
            assert!(REWRITE.0.contains(key), "rewrite template lacks {key}");
        }
        assert!(PLAIN_REWRITE.0.contains("{{original_text}}"));
    }

    #[test]
    fn substituted_text_is_not_expanded_again() {
        let template = PromptTemplate::new("Idea: {{user_input}}\nArc: {{story_arc}}");
        let rendered = template.render(&[
            ("user_input", "a fox {{story_arc}}"),
            ("story_arc", "SECRET-ARC"),
        ]);
        assert_eq!(rendered, "Idea: a fox {{story_arc}}\nArc: SECRET-ARC");
    }

    #[test]
    fn unmatched_braces_are_kept() {
        let template = PromptTemplate::new("{{ {{x}} }} {{open");
        assert_eq!(template.render(&[("x", "1")]), "{{ 1 }} {{open");
    }

    #[test]
    fn missing_artifacts_render_empty_context() {
        assert_eq!(bible_context(None), "");
        assert_eq!(arc_context(None), "");
    }

    #[test]
    fn bible_context_lists_characters_and_setting() {
        let bible = StoryBible {
            characters: vec![BibleCharacter {
                character_name: "Ember".into(),
                description: "a shy dragon".into(),
                visual_features: "green scales".into(),
            }],
            name: "Mossy Hollow".into(),
            time_period: "long ago".into(),
            location_type: "forest".into(),
            description: "a quiet valley".into(),
            world_rules: "dragons are small".into(),
            main_theme: "friendship".into(),
            main_conflict: "shyness".into(),
            conflict_resolution: "a brave hello".into(),
        };
        let context = bible_context(Some(&bible));
        assert!(context.starts_with("Characters: Ember (a shy dragon)\n"));
        assert!(context.contains("Setting: Mossy Hollow - a quiet valley"));
        assert!(context.contains("Theme: friendship"));
    }

    #[test]
    fn arc_context_lists_acts_then_spreads() {
        let arc = StoryArc {
            acts: vec![Act {
                act_number: 1,
                act_name: "Hello".into(),
                description: "meet Ember".into(),
                start_spread: 1,
                end_spread: 14,
            }],
            spreads: vec![ArcSpread {
                spread_number: 1,
                act_number: 1,
                description: "Ember hides".into(),
            }],
        };
        assert_eq!(
            arc_context(Some(&arc)),
            "3-Act Structure:\nAct 1: Hello - meet Ember\n\n14-Spread Structure:\nSpread 1: Ember hides"
        );
    }

    #[test]
    fn script_renderings() {
        let script = FinalScript {
            storybook_id: "sb".into(),
            user_id: "u".into(),
            spreads: vec![SpreadScript {
                spread_number: 1,
                script_1: "Left".into(),
                script_2: "Right".into(),
            }],
        };
        assert_eq!(script_context(&script), "Spread 1: Left='Left' | Right='Right'");
        assert_eq!(
            formatted_spreads(&script),
            "Spread 1:\n  Left Page (script_1): Left\n  Right Page (script_2): Right"
        );
    }
}
