//! Rewrites derived schemas into the strict structured-output dialect.
//!
//! Subschemas are inlined, every object is closed with all properties
//! required, and keywords strict mode rejects (`$schema`, `format`) are
//! dropped. `oneOf` becomes `anyOf`.

use schemars::JsonSchema;
use schemars::generate::SchemaSettings;
use serde_json::Value;

/// Derived schema for `T` in strict form.
pub(crate) fn strict_schema<T: JsonSchema + ?Sized>() -> Value {
    let generator = SchemaSettings::draft2020_12()
        .with(|settings| settings.inline_subschemas = true)
        .into_generator();
    let mut value = generator.into_root_schema_for::<T>().to_value();
    if let Value::Object(root) = &mut value {
        root.remove("$schema");
    }
    tighten(&mut value);
    value
}

fn tighten(schema: &mut Value) {
    let Value::Object(object) = schema else {
        return;
    };

    object.remove("format");
    if let Some(variants) = object.remove("oneOf") {
        object.insert("anyOf".to_string(), variants);
    }

    if let Some(Value::Object(properties)) = object.get_mut("properties") {
        for property in properties.values_mut() {
            tighten(property);
        }
        let required: Vec<Value> = properties.keys().cloned().map(Value::String).collect();
        object.insert("required".to_string(), Value::Array(required));
        object.insert("additionalProperties".to_string(), Value::Bool(false));
    }

    if let Some(items) = object.get_mut("items") {
        tighten(items);
    }
    if let Some(Value::Array(variants)) = object.get_mut("anyOf") {
        variants.iter_mut().for_each(tighten);
    }
    if let Some(Value::Object(definitions)) = object.get_mut("$defs") {
        definitions.values_mut().for_each(tighten);
    }
}
