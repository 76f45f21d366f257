//! Fixture builders for stage outputs and records.

use chrono::Utc;
use serde_json::{Value, json};
use storybook_core::{Character, FinalScript};

/// A valid bible with one character per name.
pub fn bible_json(names: &[&str]) -> Value {
    let characters: Vec<Value> = names
        .iter()
        .map(|name| {
            json!({
                "character_name": name,
                "description": format!("{} is kind", name),
                "visual_features": format!("{} wears a red scarf", name),
            })
        })
        .collect();
    let mut bible = setting_json();
    bible["characters"] = json!(characters);
    bible
}

/// A valid setting-only reply.
pub fn setting_json() -> Value {
    json!({
        "name": "Ember Hollow",
        "time_period": "Once upon a time",
        "location_type": "volcanic valley",
        "description": "A warm valley of glowing stones",
        "world_rules": "Dragons can talk",
        "main_theme": "friendship",
        "main_conflict": "Ember is too shy to say hello",
        "conflict_resolution": "Ember shares a warm stone"
    })
}

/// A valid arc: acts over spreads 1-4, 5-11 and 12-14.
pub fn arc_json() -> Value {
    let spreads: Vec<Value> = (1..=14)
        .map(|n| {
            let act = if n <= 4 {
                1
            } else if n <= 11 {
                2
            } else {
                3
            };
            json!({ "spread_number": n, "act_number": act, "description": format!("beat {}", n) })
        })
        .collect();
    json!({
        "acts": [
            { "act_number": 1, "act_name": "Setup", "description": "Ember hides", "start_spread": 1, "end_spread": 4 },
            { "act_number": 2, "act_name": "Trouble", "description": "Ember tries", "start_spread": 5, "end_spread": 11 },
            { "act_number": 3, "act_name": "Home", "description": "Ember belongs", "start_spread": 12, "end_spread": 14 }
        ],
        "spreads": spreads
    })
}

/// A fourteen-spread script.
pub fn script_json(storybook_id: &str, user_id: &str) -> Value {
    let spreads: Vec<Value> = (1..=14)
        .map(|n| {
            json!({
                "spread_number": n,
                "script_1": format!("Spread {} left.", n),
                "script_2": format!("Spread {} right.", n),
            })
        })
        .collect();
    json!({ "storybook_id": storybook_id, "user_id": user_id, "spreads": spreads })
}

/// [`script_json`] as a typed script.
pub fn script(storybook_id: &str, user_id: &str) -> FinalScript {
    serde_json::from_value(script_json(storybook_id, user_id)).unwrap()
}

/// A fourteen-spread rewrite with a change summary.
pub fn rewrite_json(storybook_id: &str, user_id: &str, summary: &str) -> Value {
    let mut value = script_json(storybook_id, user_id);
    for spread in value["spreads"].as_array_mut().unwrap() {
        let left = spread["script_1"].as_str().unwrap().replace("left", "happier left");
        spread["script_1"] = json!(left);
    }
    value["change_summary"] = json!(summary);
    value
}

/// A classification reply.
pub fn classification_json(action: &str) -> Value {
    json!({ "action": action })
}

/// A character record.
pub fn character(id: &str, owner: Option<&str>, name: &str, preset: bool) -> Character {
    let now = Utc::now();
    Character {
        id: id.to_string(),
        user_id: owner.map(str::to_string),
        character_name: name.to_string(),
        description: Some(format!("{} the brave", name)),
        visual_features: format!("{} has round glasses", name),
        image_url: None,
        personality_traits: vec!["curious".to_string()],
        likes: vec!["berries".to_string()],
        additional_info: json!({}),
        is_preset: preset,
        created_at: now,
        updated_at: now,
    }
}
