use serde_json::{Value, json};
use storybook_core::{
    FinalRewrite, FinalScript, PipelineState, SettingOnly, StoryArc, StoryBible, Validate,
    validate_value,
};

fn script_json(spreads: usize) -> Value {
    let spreads: Vec<Value> = (1..=spreads)
        .map(|n| json!({ "spread_number": n, "script_1": format!("left {}", n), "script_2": format!("right {}", n) }))
        .collect();
    json!({ "storybook_id": "sb-1", "user_id": "user_1", "spreads": spreads })
}

fn arc_json() -> Value {
    let spreads: Vec<Value> = (1..=14)
        .map(|n| {
            let act = if n <= 4 { 1 } else if n <= 11 { 2 } else { 3 };
            json!({ "spread_number": n, "act_number": act, "description": format!("beat {}", n) })
        })
        .collect();
    json!({
        "acts": [
            { "act_number": 1, "act_name": "Setup", "description": "a", "start_spread": 1, "end_spread": 4 },
            { "act_number": 2, "act_name": "Trouble", "description": "b", "start_spread": 5, "end_spread": 11 },
            { "act_number": 3, "act_name": "Home", "description": "c", "start_spread": 12, "end_spread": 14 }
        ],
        "spreads": spreads
    })
}

fn bible_json(characters: Value) -> Value {
    json!({
        "characters": characters,
        "name": "Ember Hollow",
        "time_period": "Once upon a time",
        "location_type": "volcanic valley",
        "description": "A warm valley of glowing stones",
        "world_rules": "Dragons can talk",
        "main_theme": "friendship",
        "main_conflict": "Pip is too shy to say hello",
        "conflict_resolution": "Pip shares a warm stone"
    })
}

#[test]
fn fourteen_spread_script_validates() {
    let script: FinalScript = validate_value(script_json(14)).unwrap();
    assert_eq!(script.spreads.len(), 14);
    let pages = script.page_texts();
    assert_eq!(pages.len(), 28);
    assert_eq!(pages[0], (1, "left 1"));
    assert_eq!(pages[27], (28, "right 14"));
}

#[test]
fn script_with_thirteen_spreads_is_rejected() {
    let err = validate_value::<FinalScript>(script_json(13)).unwrap_err();
    assert_eq!(err.path, "spreads");
    assert!(err.message.contains("14"));
}

#[test]
fn script_with_fifteen_spreads_is_rejected() {
    assert!(validate_value::<FinalScript>(script_json(15)).is_err());
}

#[test]
fn out_of_order_spreads_name_the_offending_entry() {
    let mut value = script_json(14);
    value["spreads"][5]["spread_number"] = json!(7);
    let err = validate_value::<FinalScript>(value).unwrap_err();
    assert_eq!(err.path, "spreads[5].spread_number");
}

#[test]
fn missing_page_text_names_the_field() {
    let mut value = script_json(14);
    value["spreads"][2].as_object_mut().unwrap().remove("script_2");
    let err = validate_value::<FinalScript>(value).unwrap_err();
    assert_eq!(err.path, "spreads[2]");
    assert!(err.message.contains("missing field `script_2`"));
}

#[test]
fn wrong_field_type_is_rejected() {
    let mut value = script_json(14);
    value["spreads"][0]["spread_number"] = json!("one");
    let err = validate_value::<FinalScript>(value).unwrap_err();
    assert_eq!(err.path, "spreads[0].spread_number");
    assert!(err.message.starts_with("final_script: invalid type"));
}

#[test]
fn unknown_fields_are_rejected() {
    let mut value = script_json(14);
    value["title"] = json!("extra");
    let err = validate_value::<FinalScript>(value).unwrap_err();
    assert!(err.message.contains("unknown field `title`"));
}

#[test]
fn typed_script_validate_catches_wrong_count() {
    let mut script: FinalScript = validate_value(script_json(14)).unwrap();
    script.spreads.pop();
    assert!(script.validate().is_err());
}

#[test]
fn rewrite_requires_change_summary() {
    let mut value = script_json(14);
    value["change_summary"] = json!("   ");
    let err = validate_value::<FinalRewrite>(value).unwrap_err();
    assert_eq!(err.path, "change_summary");
}

#[test]
fn arc_validates_and_maps_spreads_to_acts() {
    let arc: StoryArc = validate_value(arc_json()).unwrap();
    assert_eq!(arc.acts.len(), 3);
    assert!(arc.acts[1].covers(5));
    assert!(!arc.acts[1].covers(12));
}

#[test]
fn arc_with_spread_in_wrong_act_is_rejected() {
    let mut value = arc_json();
    value["spreads"][4]["act_number"] = json!(1);
    let err = validate_value::<StoryArc>(value).unwrap_err();
    assert_eq!(err.path, "spreads[4].act_number");
}

#[test]
fn arc_with_gap_between_acts_is_rejected() {
    let mut value = arc_json();
    value["acts"][1]["start_spread"] = json!(6);
    let err = validate_value::<StoryArc>(value).unwrap_err();
    assert_eq!(err.path, "acts[1].start_spread");
}

#[test]
fn arc_with_two_acts_is_rejected() {
    let mut value = arc_json();
    value["acts"].as_array_mut().unwrap().pop();
    assert!(validate_value::<StoryArc>(value).is_err());
}

#[test]
fn bible_requires_at_least_one_character() {
    let err = validate_value::<StoryBible>(bible_json(json!([]))).unwrap_err();
    assert_eq!(err.path, "characters");
}

#[test]
fn bible_with_character_validates() {
    let bible: StoryBible = validate_value(bible_json(json!([
        { "character_name": "Pip", "description": "a shy dragon", "visual_features": "small, green" }
    ])))
    .unwrap();
    assert_eq!(bible.character_names(), vec!["Pip"]);
}

#[test]
fn setting_only_rejects_characters() {
    let err = validate_value::<SettingOnly>(bible_json(json!([]))).unwrap_err();
    assert!(err.message.starts_with("story_setting: unknown field `characters`"));
}

#[test]
fn pipeline_state_keeps_empty_artifacts_as_objects() {
    let state = PipelineState::new("A shy dragon");
    let value = state.to_value().unwrap();
    assert_eq!(value["bible"], json!({}));
    assert_eq!(value["arc"], json!({}));
    assert_eq!(PipelineState::from_value(value).unwrap(), state);
}

#[test]
fn pipeline_state_rejects_invalid_stored_bible() {
    let value = json!({ "prompt": "x", "bible": bible_json(json!([])), "arc": {} });
    let err = PipelineState::from_value(value).unwrap_err();
    assert_eq!(err.path, "creation_params.bible.characters");
}

#[test]
fn pipeline_state_round_trips_artifacts() {
    let mut state = PipelineState::new("A shy dragon");
    state.arc = Some(validate_value(arc_json()).unwrap());
    let restored = PipelineState::from_value(state.to_value().unwrap()).unwrap();
    assert_eq!(restored.arc, state.arc);
}
